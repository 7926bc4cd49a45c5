use serde::{Deserialize, Serialize};

use crate::db_types::LicenseType;

/// A buyer's purchase intent for a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub template_id: i64,
    pub license_type: LicenseType,
}
