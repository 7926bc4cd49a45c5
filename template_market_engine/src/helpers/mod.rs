pub mod pricing;

pub use pricing::{price_order, Pricing, PLATFORM_FEE_PERCENT};
