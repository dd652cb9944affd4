//! Local view of the catalog, cart, and wishlist.
//!
//! [`ViewState`] is a pure data container: an eventually-consistent
//! reflection of the authoritative item collection plus the signed-in
//! user's cart and wishlist, with the derived views the UI renders from.
//! Cart and wishlist hold item *identities* only and join against the
//! item list, so an item edit is immediately visible in the cart and a
//! delete leaves nothing stale behind.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;

use crafty_spinx_core::{ChangeKind, CurrencyCode, Item, ItemEvent, ItemId, Price};

/// In-memory reflection of the catalog, cart, and wishlist.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    items: Vec<Item>,
    cart: Vec<ItemId>,
    wishlist: HashSet<ItemId>,
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Merge one change event.
    ///
    /// Insert/Update is an identity-keyed upsert; an Update for an unknown
    /// identity self-heals into an Insert. Delete removes the item and, in
    /// the same pass, any cart or wishlist entry referencing it; deleting
    /// an absent identity is a no-op. Last write wins by arrival order.
    pub fn apply(&mut self, event: &ItemEvent) {
        match event.kind {
            ChangeKind::Insert | ChangeKind::Update => self.upsert(event.item.clone()),
            ChangeKind::Delete => self.remove(event.item.id),
        }
    }

    fn upsert(&mut self, item: Item) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            *existing = item;
        } else {
            // New arrivals surface at the top of the catalog
            self.items.insert(0, item);
        }
    }

    fn remove(&mut self, id: ItemId) {
        self.items.retain(|item| item.id != id);
        self.cart.retain(|&entry| entry != id);
        self.wishlist.remove(&id);
    }

    /// Replace the item list wholesale (bulk fetch or fallback load),
    /// pruning cart and wishlist entries that no longer resolve.
    pub fn replace_items(&mut self, items: Vec<Item>) {
        self.items = items;
        let known: HashSet<ItemId> = self.items.iter().map(|item| item.id).collect();
        self.cart.retain(|id| known.contains(id));
        self.wishlist.retain(|id| known.contains(id));
    }

    /// Load the cart membership for the current identity, deduplicating
    /// and dropping identities that do not resolve to a known item.
    pub fn set_cart(&mut self, ids: Vec<ItemId>) {
        self.cart.clear();
        for id in ids {
            self.add_cart_entry(id);
        }
    }

    /// Load the wishlist membership for the current identity.
    pub fn set_wishlist(&mut self, ids: Vec<ItemId>) {
        let known: HashSet<ItemId> = self.items.iter().map(|item| item.id).collect();
        self.wishlist = ids.into_iter().filter(|id| known.contains(id)).collect();
    }

    /// Record a confirmed cart add. Returns `false` (and leaves the cart
    /// untouched) for duplicates or identities with no known item.
    pub fn add_cart_entry(&mut self, id: ItemId) -> bool {
        if self.cart.contains(&id) || self.item(id).is_none() {
            return false;
        }
        self.cart.push(id);
        true
    }

    /// Record a confirmed cart removal.
    pub fn remove_cart_entry(&mut self, id: ItemId) {
        self.cart.retain(|&entry| entry != id);
    }

    /// Record a confirmed cart clear (inquiry submitted).
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Record a confirmed wishlist toggle result.
    pub fn set_wishlisted(&mut self, id: ItemId, wishlisted: bool) {
        if wishlisted {
            if self.item(id).is_some() {
                self.wishlist.insert(id);
            }
        } else {
            self.wishlist.remove(&id);
        }
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// The catalog, in display order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Look up one item by identity.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Cart membership in insertion order.
    #[must_use]
    pub fn cart_ids(&self) -> &[ItemId] {
        &self.cart
    }

    /// Cart entries joined to their current item records, in insertion
    /// order.
    #[must_use]
    pub fn cart_items(&self) -> Vec<&Item> {
        self.cart.iter().filter_map(|&id| self.item(id)).collect()
    }

    /// Catalog items the user has wishlisted, in catalog order.
    #[must_use]
    pub fn wishlist_items(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| self.wishlist.contains(&item.id))
            .collect()
    }

    #[must_use]
    pub fn is_in_cart(&self, id: ItemId) -> bool {
        self.cart.contains(&id)
    }

    #[must_use]
    pub fn is_wishlisted(&self, id: ItemId) -> bool {
        self.wishlist.contains(&id)
    }

    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.cart.len()
    }

    #[must_use]
    pub fn wishlist_count(&self) -> usize {
        self.wishlist.len()
    }

    /// Sum of the *current* prices of the items in the cart, recomputed
    /// from membership on every call so price edits show up without a
    /// cart refresh.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        let mut total = Decimal::ZERO;
        let mut currency = CurrencyCode::default();
        for (index, item) in self.cart_items().into_iter().enumerate() {
            if index == 0 {
                currency = item.price.currency_code;
            }
            total += item.price.amount;
        }
        Price::new(total, currency)
    }
}

/// Cheaply cloneable shared handle over the view state.
///
/// The UI reads through [`SharedView::read`]; only the sync slice writes.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    inner: Arc<RwLock<ViewState>>,
}

impl SharedView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure over the current view.
    pub fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Clone the current state (exports, tests).
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.read(Clone::clone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use crafty_spinx_core::Category;

    use super::*;

    fn item(id: i64, name: &str, dollars: i64) -> Item {
        Item {
            id: ItemId::new(id),
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::usd(Decimal::new(dollars, 0)),
            image_url: "https://example.com/photo.jpg".to_string(),
            category: Category::Random,
            model_url: None,
        }
    }

    fn ids(view: &ViewState) -> Vec<i64> {
        let mut ids: Vec<i64> = view.items().iter().map(|i| i.id.as_i64()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_latest_event_per_identity_wins() {
        // The surviving set depends only on each identity's latest event,
        // not on how events interleave with the bulk load.
        let events = [
            ItemEvent::insert(item(1, "a", 10)),
            ItemEvent::update(item(2, "b", 20)),
            ItemEvent::delete(item(1, "a", 10)),
            ItemEvent::insert(item(3, "c", 30)),
            ItemEvent::update(item(3, "c2", 30)),
            ItemEvent::delete(item(4, "never seen", 40)),
        ];

        // Events before the bulk load
        let mut early = ViewState::new();
        for event in &events {
            early.apply(event);
        }
        assert_eq!(ids(&early), vec![2, 3]);

        // Bulk load first, then the same events
        let mut late = ViewState::new();
        late.replace_items(vec![item(1, "a", 10), item(2, "b", 20)]);
        for event in &events {
            late.apply(event);
        }
        assert_eq!(ids(&late), vec![2, 3]);
        assert_eq!(late.item(ItemId::new(3)).unwrap().name, "c2");
    }

    #[test]
    fn test_update_for_unknown_identity_self_heals() {
        let mut view = ViewState::new();
        view.apply(&ItemEvent::update(item(7, "late arrival", 70)));
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.item(ItemId::new(7)).unwrap().name, "late arrival");
    }

    #[test]
    fn test_delete_absent_identity_is_noop() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 10)]);
        view.apply(&ItemEvent::delete(item(2, "ghost", 20)));
        assert_eq!(ids(&view), vec![1]);
    }

    #[test]
    fn test_delete_cascades_cart_and_wishlist_in_one_pass() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 10), item(2, "b", 20)]);
        view.add_cart_entry(ItemId::new(1));
        view.add_cart_entry(ItemId::new(2));
        view.set_wishlisted(ItemId::new(1), true);

        view.apply(&ItemEvent::delete(item(1, "a", 10)));

        assert_eq!(ids(&view), vec![2]);
        assert_eq!(view.cart_ids(), &[ItemId::new(2)]);
        assert!(!view.is_wishlisted(ItemId::new(1)));
    }

    #[test]
    fn test_duplicate_cart_entry_is_rejected() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 10)]);

        assert!(view.add_cart_entry(ItemId::new(1)));
        assert!(!view.add_cart_entry(ItemId::new(1)));
        assert_eq!(view.cart_count(), 1);
    }

    #[test]
    fn test_cart_entry_requires_known_item() {
        let mut view = ViewState::new();
        assert!(!view.add_cart_entry(ItemId::new(9)));
        assert_eq!(view.cart_count(), 0);
    }

    #[test]
    fn test_wishlist_toggle_twice_roundtrips() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 10)]);

        view.set_wishlisted(ItemId::new(1), true);
        assert!(view.is_wishlisted(ItemId::new(1)));
        view.set_wishlisted(ItemId::new(1), false);
        assert!(!view.is_wishlisted(ItemId::new(1)));
        assert_eq!(view.wishlist_count(), 0);
    }

    #[test]
    fn test_cart_total_follows_price_edits() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 100), item(2, "b", 200)]);
        view.add_cart_entry(ItemId::new(1));
        view.add_cart_entry(ItemId::new(2));
        assert_eq!(view.cart_total(), Price::usd(Decimal::new(300, 0)));

        // A reconciled price edit changes the total with no cart refresh
        view.apply(&ItemEvent::update(item(2, "b", 150)));
        assert_eq!(view.cart_total(), Price::usd(Decimal::new(250, 0)));
    }

    #[test]
    fn test_replace_items_prunes_dangling_references() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(1, "a", 10), item(2, "b", 20)]);
        view.add_cart_entry(ItemId::new(1));
        view.set_wishlisted(ItemId::new(2), true);

        view.replace_items(vec![item(2, "b", 20)]);

        assert_eq!(view.cart_count(), 0);
        assert!(view.is_wishlisted(ItemId::new(2)));
    }

    #[test]
    fn test_wishlist_items_follow_catalog_order() {
        let mut view = ViewState::new();
        view.replace_items(vec![item(3, "c", 30), item(1, "a", 10), item(2, "b", 20)]);
        view.set_wishlist(vec![ItemId::new(2), ItemId::new(3)]);

        let names: Vec<&str> = view
            .wishlist_items()
            .into_iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }
}
