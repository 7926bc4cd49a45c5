use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tmg_common::Money;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------       UserId        ---------------------------------------------------------
/// A lightweight wrapper around the opaque user id issued by the identity service.
#[derive(Clone, Debug, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Role         ---------------------------------------------------------
/// The roles the identity service can grant a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Seller,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------     LicenseType     ---------------------------------------------------------
/// Which of a template's two price tiers the buyer is purchasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Personal,
    Commercial,
}

impl Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseType::Personal => write!(f, "Personal"),
            LicenseType::Commercial => write!(f, "Commercial"),
        }
    }
}

impl FromStr for LicenseType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" | "Personal" => Ok(Self::Personal),
            "commercial" | "Commercial" => Ok(Self::Commercial),
            s => Err(ConversionError(format!("Invalid license type: {s}"))),
        }
    }
}

impl From<String> for LicenseType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid license type in database: {value}. But this conversion cannot fail. Defaulting to Personal");
            LicenseType::Personal
        })
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
/// The payment-side status of an order. Correlated with, but stored independently of, [`OrderStatusType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No settled payment exists for the order yet.
    Pending,
    /// A payment for the order was captured in full.
    Success,
    /// The payment failed or was cancelled.
    Failed,
    /// The captured payment was subsequently refunded.
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and no payment has settled yet.
    Created,
    /// The order has been paid in full and the download grant is active.
    Completed,
    /// The order was cancelled before settlement, or its payment failed.
    Cancelled,
    /// The order was refunded after settlement.
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "Created"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Created");
            OrderStatusType::Created
        })
    }
}

//--------------------------------------    PaymentState     ---------------------------------------------------------
/// The lifecycle state of a payment record.
///
/// Every state other than `Created` is terminal; a terminal payment is immutable except for the
/// `Success` → `Refunded` transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentState {
    #[default]
    Created,
    Success,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentState {
    /// Whether the payment has reached a terminal state and must not transition again.
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentState::Created)
    }
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Created => write!(f, "Created"),
            PaymentState::Success => write!(f, "Success"),
            PaymentState::Failed => write!(f, "Failed"),
            PaymentState::Refunded => write!(f, "Refunded"),
            PaymentState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment state: {s}"))),
        }
    }
}

impl From<String> for PaymentState {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid payment state: {value}. But this conversion cannot fail. Defaulting to Created");
            PaymentState::Created
        })
    }
}

//--------------------------------------      Template       ---------------------------------------------------------
/// A template listing as the engine sees it. Catalog management beyond this snapshot lives with the catalog service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub seller_id: UserId,
    pub title: String,
    pub slug: String,
    pub version: String,
    pub personal_price: Money,
    pub commercial_price: Money,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// The price tier that applies to the given license type.
    pub fn price_for(&self, license_type: LicenseType) -> Money {
        match license_type {
            LicenseType::Personal => self.personal_price,
            LicenseType::Commercial => self.commercial_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub seller_id: UserId,
    pub title: String,
    pub slug: String,
    pub version: String,
    pub personal_price: Money,
    pub commercial_price: Money,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub template_id: i64,
    /// Snapshot of the template at purchase time, frozen so later template edits cannot rewrite history.
    pub template_title: String,
    pub template_slug: String,
    pub template_version: String,
    pub price: Money,
    pub currency: String,
    pub platform_fee: Money,
    pub seller_earning: Money,
    pub license_type: LicenseType,
    pub payment_status: PaymentStatus,
    pub status: OrderStatusType,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    /// Back-reference to the payment that settled the order, once one has.
    pub payment_id: Option<i64>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub template_id: i64,
    pub template_title: String,
    pub template_slug: String,
    pub template_version: String,
    pub price: Money,
    pub currency: String,
    pub platform_fee: Money,
    pub seller_earning: Money,
    pub license_type: LicenseType,
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub user_id: UserId,
    pub gateway: String,
    /// The remote intent id assigned by the gateway when checkout created a remote order.
    pub gateway_order_id: Option<String>,
    /// The remote capture id, recorded when the payment settles.
    pub transaction_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentState,
    pub failure_reason: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    /// Verbatim snapshot of the last gateway callback, retained for dispute resolution.
    pub raw_webhook_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub user_id: UserId,
    pub gateway: String,
    pub amount: Money,
    pub currency: String,
}

//--------------------------------------  EarningsSummary    ---------------------------------------------------------
/// Aggregate over a seller's successfully settled orders.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub total_sales: Money,
    pub total_earnings: Money,
    pub total_orders: i64,
}
