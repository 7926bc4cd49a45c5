mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{CapturedPaymentEntity, RemoteOrder, RemoteOrderRequest, WebhookEvent, PAYMENT_CAPTURED_EVENT};
pub use error::RazorpayApiError;
