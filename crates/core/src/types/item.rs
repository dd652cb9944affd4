//! Catalog item records and their draft/patch forms.

use serde::{Deserialize, Serialize};

use crate::types::id::ItemId;
use crate::types::price::Price;

/// Product category.
///
/// The catalog recognizes a fixed set; imports that omit a category fall
/// back to [`Category::Random`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Decor,
    Crochet,
    #[default]
    Random,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decor => write!(f, "Decor"),
            Self::Crochet => write!(f, "Crochet"),
            Self::Random => write!(f, "Random"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Decor" => Ok(Self::Decor),
            "Crochet" => Ok(Self::Crochet),
            "Random" => Ok(Self::Random),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// A catalog product record.
///
/// Identity is assigned by the item store and stable across updates; the
/// rest of the fields are mutable via [`ItemPatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// URL of the product photo.
    pub image_url: String,
    pub category: Category,
    /// Optional URL of a 3D model for the in-browser viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

impl Item {
    /// Merge the set fields of a patch into this item. Unset fields are
    /// left unchanged.
    pub fn apply_patch(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url.clone_from(image_url);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(model_url) = &patch.model_url {
            self.model_url = Some(model_url.clone());
        }
    }

    /// Strip the identity, leaving the insertable form.
    #[must_use]
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            category: self.category,
            model_url: self.model_url,
        }
    }
}

/// A catalog item without an assigned identity.
///
/// This is what insert, import, and replace operations carry; the store
/// assigns the identity and returns the full [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

impl ItemDraft {
    /// Attach a store-assigned identity.
    #[must_use]
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            category: self.category,
            model_url: self.model_url,
        }
    }
}

/// A partial update for an existing item.
///
/// `None` fields are left unchanged by [`Item::apply_patch`]. There is no
/// way to clear `model_url` through a patch; edits that need to drop the
/// 3D model replace it with a new URL instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

impl ItemPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category.is_none()
            && self.model_url.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn bear() -> Item {
        Item {
            id: ItemId::new(1),
            name: "Barnaby the Bear".to_string(),
            description: "A classic, cuddly friend.".to_string(),
            price: Price::usd(Decimal::new(35000, 2)),
            image_url: "https://example.com/bear.jpg".to_string(),
            category: Category::Crochet,
            model_url: None,
        }
    }

    #[test]
    fn test_apply_patch_merges_set_fields() {
        let mut item = bear();
        item.apply_patch(&ItemPatch {
            price: Some(Price::usd(Decimal::new(15000, 2))),
            category: Some(Category::Decor),
            ..ItemPatch::default()
        });

        assert_eq!(item.price, Price::usd(Decimal::new(15000, 2)));
        assert_eq!(item.category, Category::Decor);
        // Untouched fields survive
        assert_eq!(item.name, "Barnaby the Bear");
        assert_eq!(item.description, "A classic, cuddly friend.");
    }

    #[test]
    fn test_apply_empty_patch_is_identity() {
        let mut item = bear();
        let before = item.clone();
        let patch = ItemPatch::default();
        assert!(patch.is_empty());
        item.apply_patch(&patch);
        assert_eq!(item, before);
    }

    #[test]
    fn test_draft_roundtrip_preserves_fields() {
        let item = bear();
        let draft = item.clone().into_draft();
        assert_eq!(draft.into_item(ItemId::new(1)), item);
    }

    #[test]
    fn test_category_display_fromstr() {
        for category in [Category::Decor, Category::Crochet, Category::Random] {
            let parsed: Category = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("Pottery".parse::<Category>().is_err());
    }

    #[test]
    fn test_item_serde_omits_absent_model_url() {
        let json = serde_json::to_string(&bear()).unwrap();
        assert!(!json.contains("model_url"));

        let parsed: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model_url, None);
    }
}
