use crate::{
    db_types::{NewTemplate, Template},
    traits::SettlementError,
};

/// Read access to the template catalog, plus the upsert the catalog service uses to publish listings.
///
/// Catalog management (search, review moderation, asset uploads) is owned by other services; the engine only needs a
/// template's price tiers, seller and snapshot fields at purchase time.
#[allow(async_fn_in_trait)]
pub trait TemplateCatalog: Clone {
    async fn fetch_template(&self, template_id: i64) -> Result<Option<Template>, SettlementError>;

    async fn upsert_template(&self, template: NewTemplate) -> Result<Template, SettlementError>;
}
