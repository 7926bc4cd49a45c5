use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTemplate, Template},
    traits::SettlementError,
};

pub async fn fetch_template(id: i64, conn: &mut SqliteConnection) -> Result<Option<Template>, SettlementError> {
    let template = sqlx::query_as("SELECT * FROM templates WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(template)
}

/// Inserts or replaces the listing for the template's slug. Price edits never touch existing orders, which carry
/// their own frozen snapshot.
pub async fn upsert_template(template: NewTemplate, conn: &mut SqliteConnection) -> Result<Template, SettlementError> {
    let template: Template = sqlx::query_as(
        r#"
            INSERT INTO templates (seller_id, title, slug, version, personal_price, commercial_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO UPDATE SET
                title = excluded.title,
                version = excluded.version,
                personal_price = excluded.personal_price,
                commercial_price = excluded.commercial_price,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(template.seller_id)
    .bind(template.title)
    .bind(template.slug)
    .bind(template.version)
    .bind(template.personal_price)
    .bind(template.commercial_price)
    .fetch_one(conn)
    .await?;
    debug!("🗂️ Template [{}] upserted with id {}", template.slug, template.id);
    Ok(template)
}
