use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body for `POST /api/checkout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub order_id: i64,
}

/// Body for `POST /api/payments/fail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailPaymentParams {
    pub payment_id: i64,
    pub reason: String,
}

/// Response for the download-authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanDownloadResult {
    pub can_download: bool,
}
