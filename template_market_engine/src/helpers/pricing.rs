//! Derives the price, platform fee and seller earning for an order from the template's price tiers.

use serde::{Deserialize, Serialize};
use tmg_common::Money;

use crate::db_types::{LicenseType, Template};

/// The platform's cut of every sale, as a percentage of the sale price.
pub const PLATFORM_FEE_PERCENT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub price: Money,
    pub platform_fee: Money,
    pub seller_earning: Money,
}

/// Computes the pricing breakdown for purchasing `template` under the given license.
///
/// The fee is rounded half-up; the seller earning absorbs the remainder, so
/// `platform_fee + seller_earning == price` holds exactly for every price.
pub fn price_order(template: &Template, license_type: LicenseType) -> Pricing {
    let price = template.price_for(license_type);
    let platform_fee = Money::from((price.value() * PLATFORM_FEE_PERCENT + 50) / 100);
    let seller_earning = price - platform_fee;
    Pricing { price, platform_fee, seller_earning }
}
