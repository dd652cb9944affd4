//! Admin mutation façade: the restricted catalog-editing surface.
//!
//! Every operation checks the calling session's role before touching the
//! store, validates its input before any mutation is attempted, and
//! reports failure as an [`AppError`] the UI can show directly.
//!
//! Item mutations rely on the change feed to reach the local view (never
//! a direct write), so a result appears exactly once however the event
//! and the response interleave.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use crafty_spinx_core::{Category, Item, ItemDraft, ItemId, ItemPatch, Price};

use crate::catalog;
use crate::error::AppError;
use crate::session::Session;
use crate::store::ItemStore;
use crate::view::SharedView;

/// Suspend-for-confirmation hook for destructive operations.
///
/// The embedding UI implements this with its confirmation dialog; tests
/// answer directly. The operation suspends until the user answers and
/// proceeds only on `true`.
#[async_trait]
pub trait ConfirmAction: Send + Sync {
    /// Present the prompt and resolve to the user's answer.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Structural problems found in an import payload.
///
/// Collected per entry before anything is written; an import that fails
/// validation leaves the store untouched.
#[derive(Debug, Error)]
#[error("import rejected: {}", problems.join("; "))]
pub struct ImportError {
    pub problems: Vec<String>,
}

/// The restricted set of catalog mutations available to admin sessions.
pub struct AdminFacade {
    store: Arc<dyn ItemStore>,
    view: SharedView,
}

impl AdminFacade {
    pub(crate) fn new(store: Arc<dyn ItemStore>, view: SharedView) -> Self {
        Self { store, view }
    }

    fn authorize(session: &Session) -> Result<(), AppError> {
        if session.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Add one item to the catalog.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] for non-admin sessions,
    /// [`AppError::Validation`] before any store call when the draft is
    /// invalid, or the store's failure.
    #[instrument(skip(self, session, draft), fields(name = %draft.name))]
    pub async fn add_item(&self, session: &Session, draft: ItemDraft) -> Result<Item, AppError> {
        Self::authorize(session)?;
        check_draft(&draft)?;

        let item = self.store.insert_item(draft).await?;
        info!(item = %item.id, "item added");
        Ok(item)
    }

    /// Patch an existing item.
    ///
    /// The cart shows the edited record immediately: cart entries hold
    /// identities and join against the reconciled item list.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`], [`AppError::Validation`], or the
    /// store's failure (notably `NotFound`).
    #[instrument(skip(self, session, patch), fields(item = %id))]
    pub async fn edit_item(
        &self,
        session: &Session,
        id: ItemId,
        patch: ItemPatch,
    ) -> Result<Item, AppError> {
        Self::authorize(session)?;
        check_patch(&patch)?;

        let item = self.store.update_item(id, patch).await?;
        info!(item = %item.id, "item edited");
        Ok(item)
    }

    /// Delete an item after an explicit confirmation.
    ///
    /// Returns `false` without mutating anything when the user declines.
    /// On success the store drops the item's cart/wishlist rows and the
    /// delete event cascades the same removal through the local view.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] or the store's failure.
    #[instrument(skip(self, session, confirm), fields(item = %id))]
    pub async fn delete_item(
        &self,
        session: &Session,
        id: ItemId,
        confirm: &dyn ConfirmAction,
    ) -> Result<bool, AppError> {
        Self::authorize(session)?;

        if !confirm
            .confirm("Permanently delete this item? This cannot be undone.")
            .await
        {
            info!(item = %id, "delete declined");
            return Ok(false);
        }

        self.store.delete_item(id).await?;
        info!(item = %id, "item deleted");
        Ok(true)
    }

    /// Replace the catalog with an externally supplied JSON item list.
    ///
    /// The payload is schema-validated up front; nothing is written
    /// unless every entry passes.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`], [`AppError::Import`] listing each
    /// structural problem, or the store's failure - a failure between the
    /// replace steps surfaces as the distinct partial-replace state.
    #[instrument(skip(self, session, json))]
    pub async fn import_items(&self, session: &Session, json: &str) -> Result<Vec<Item>, AppError> {
        Self::authorize(session)?;

        let drafts = parse_import(json)?;
        let count = drafts.len();

        let items = self.store.replace_all(drafts).await?;
        info!(count, "catalog imported");
        Ok(items)
    }

    /// Replace the catalog with the built-in defaults, after an explicit
    /// confirmation. Returns `false` when the user declines.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] or the store's failure.
    #[instrument(skip(self, session, confirm))]
    pub async fn reset_catalog(
        &self,
        session: &Session,
        confirm: &dyn ConfirmAction,
    ) -> Result<bool, AppError> {
        Self::authorize(session)?;

        if !confirm
            .confirm("Reset the catalog to the factory defaults? All local changes will be lost.")
            .await
        {
            info!("reset declined");
            return Ok(false);
        }

        self.store.replace_all(catalog::default_drafts()).await?;
        info!("catalog reset to defaults");
        Ok(true)
    }

    /// Serialize the current view's item list, exactly as displayed.
    /// The output round-trips through [`AdminFacade::import_items`].
    ///
    /// # Errors
    ///
    /// [`AppError::Internal`] when serialization fails.
    pub fn export_items(&self) -> Result<String, AppError> {
        let items = self.view.read(|view| view.items().to_vec());
        serde_json::to_string_pretty(&items).map_err(|err| AppError::Internal(err.to_string()))
    }
}

fn check_draft(draft: &ItemDraft) -> Result<(), AppError> {
    if draft.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if draft.price.is_negative() {
        return Err(AppError::Validation(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn check_patch(patch: &ItemPatch) -> Result<(), AppError> {
    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if patch.price.is_some_and(|price| price.is_negative()) {
        return Err(AppError::Validation(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Import parsing
// =============================================================================

/// One entry of an import file. Only `name` and `description` are
/// required; the rest defaults. The camelCase aliases accept files
/// written by earlier releases.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default, alias = "imageUrl")]
    image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "modelUrl")]
    model_url: Option<String>,
}

/// Validate an import payload into drafts, collecting every structural
/// problem rather than stopping at the first.
fn parse_import(json: &str) -> Result<Vec<ItemDraft>, ImportError> {
    let records: Vec<ImportRecord> = serde_json::from_str(json).map_err(|err| ImportError {
        problems: vec![format!("not a JSON item list: {err}")],
    })?;

    let mut drafts = Vec::with_capacity(records.len());
    let mut problems = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match convert_record(record) {
            Ok(draft) => drafts.push(draft),
            Err(errors) => {
                problems.extend(errors.into_iter().map(|problem| format!("entry {index}: {problem}")));
            }
        }
    }

    if problems.is_empty() {
        Ok(drafts)
    } else {
        Err(ImportError { problems })
    }
}

fn convert_record(record: ImportRecord) -> Result<ItemDraft, Vec<String>> {
    let mut errors = Vec::new();

    let name = record.name.unwrap_or_default();
    if name.trim().is_empty() {
        errors.push("missing name".to_string());
    }

    let description = record.description.unwrap_or_default();
    if description.trim().is_empty() {
        errors.push("missing description".to_string());
    }

    let price = match record.price.as_ref().map(parse_price) {
        None => Price::zero(),
        Some(Ok(price)) => {
            if price.is_negative() {
                errors.push("price must not be negative".to_string());
            }
            price
        }
        Some(Err(problem)) => {
            errors.push(problem);
            Price::zero()
        }
    };

    let category = match record.category.as_deref().map(str::parse::<Category>) {
        None => Category::default(),
        Some(Ok(category)) => category,
        Some(Err(problem)) => {
            errors.push(problem);
            Category::default()
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ItemDraft {
        name,
        description,
        price,
        image_url: record
            .image_url
            .unwrap_or_else(|| catalog::PLACEHOLDER_IMAGE.to_string()),
        category,
        model_url: record.model_url,
    })
}

/// Accept a price as a JSON number, a decimal string, or the object form
/// our own export writes.
fn parse_price(value: &serde_json::Value) -> Result<Price, String> {
    match value {
        serde_json::Value::Object(_) => serde_json::from_value(value.clone())
            .map_err(|err| format!("unreadable price object: {err}")),
        serde_json::Value::Number(number) => number
            .to_string()
            .parse::<Decimal>()
            .map(Price::usd)
            .map_err(|_| format!("unreadable price {number}")),
        serde_json::Value::String(text) => text
            .parse::<Decimal>()
            .map(Price::usd)
            .map_err(|_| format!("unreadable price {text:?}")),
        other => Err(format!("price must be a number, string, or object, got {other}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_accepts_minimal_entries() {
        let drafts = parse_import(
            r#"[{"name": "Barnaby the Bear", "description": "A classic, cuddly friend."}]"#,
        )
        .unwrap();

        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.price, Price::zero());
        assert_eq!(draft.category, Category::Random);
        assert_eq!(draft.image_url, catalog::PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_parse_import_lists_each_problem() {
        let err = parse_import(
            r#"[
                {"name": "ok", "description": "fine"},
                {"name": "no description"},
                {"description": "no name", "price": -5}
            ]"#,
        )
        .unwrap_err();

        assert_eq!(
            err.problems,
            vec![
                "entry 1: missing description".to_string(),
                "entry 2: missing name".to_string(),
                "entry 2: price must not be negative".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_import_rejects_non_list() {
        let err = parse_import(r#"{"name": "not a list"}"#).unwrap_err();
        assert_eq!(err.problems.len(), 1);
        assert!(err.problems[0].starts_with("not a JSON item list"));
    }

    #[test]
    fn test_parse_price_forms() {
        let number = serde_json::json!(350.5);
        assert_eq!(
            parse_price(&number).unwrap(),
            Price::usd("350.5".parse().unwrap())
        );

        let string = serde_json::json!("280");
        assert_eq!(
            parse_price(&string).unwrap(),
            Price::usd("280".parse().unwrap())
        );

        let object = serde_json::json!({"amount": "120", "currency_code": "GBP"});
        let price = parse_price(&object).unwrap();
        assert_eq!(price.currency_code, crafty_spinx_core::CurrencyCode::GBP);

        assert!(parse_price(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_parse_import_accepts_camel_case_aliases() {
        let drafts = parse_import(
            r#"[{
                "name": "Willow the Whale",
                "description": "A gentle giant.",
                "imageUrl": "https://example.com/whale.jpg",
                "modelUrl": "https://example.com/whale.glb",
                "category": "Crochet",
                "price": 450
            }]"#,
        )
        .unwrap();

        assert_eq!(drafts[0].image_url, "https://example.com/whale.jpg");
        assert_eq!(
            drafts[0].model_url.as_deref(),
            Some("https://example.com/whale.glb")
        );
        assert_eq!(drafts[0].category, Category::Crochet);
    }

    #[test]
    fn test_check_patch_rejects_blank_name() {
        let patch = ItemPatch {
            name: Some("   ".to_string()),
            ..ItemPatch::default()
        };
        assert!(matches!(
            check_patch(&patch),
            Err(AppError::Validation(_))
        ));
        assert!(check_patch(&ItemPatch::default()).is_ok());
    }
}
