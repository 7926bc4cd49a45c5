mod money;
mod secret;

pub use money::{Money, MoneyConversionError, INR_CURRENCY_CODE, INR_CURRENCY_CODE_LOWER};
pub use secret::Secret;
