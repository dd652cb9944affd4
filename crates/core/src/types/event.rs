//! Change events delivered by an item feed subscription.

use serde::{Deserialize, Serialize};

use crate::types::item::Item;

/// What happened to an item in the watched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single change to the watched item collection.
///
/// Events carry the full item (the post-image for inserts and updates, the
/// last known record for deletes) and arrive in the order the backend
/// emitted them. No ordering is guaranteed across kinds beyond arrival
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEvent {
    pub kind: ChangeKind,
    pub item: Item,
}

impl ItemEvent {
    #[must_use]
    pub const fn insert(item: Item) -> Self {
        Self {
            kind: ChangeKind::Insert,
            item,
        }
    }

    #[must_use]
    pub const fn update(item: Item) -> Self {
        Self {
            kind: ChangeKind::Update,
            item,
        }
    }

    #[must_use]
    pub const fn delete(item: Item) -> Self {
        Self {
            kind: ChangeKind::Delete,
            item,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::ItemId;
    use crate::types::item::Category;
    use crate::types::price::Price;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::Insert).unwrap(),
            "\"insert\""
        );
        assert_eq!(
            serde_json::from_str::<ChangeKind>("\"delete\"").unwrap(),
            ChangeKind::Delete
        );
    }

    #[test]
    fn test_event_roundtrip() {
        let event = ItemEvent::update(Item {
            id: ItemId::new(3),
            name: "Oliver the Owl".to_string(),
            description: "Wise beyond his years.".to_string(),
            price: Price::default(),
            image_url: "https://example.com/owl.jpg".to_string(),
            category: Category::Crochet,
            model_url: None,
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: ItemEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
