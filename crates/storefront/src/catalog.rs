//! Built-in default catalog.
//!
//! Loaded when the item store cannot be reached (the catalog is never
//! left empty) and written back by the admin reset operation.

use rust_decimal::Decimal;

use crafty_spinx_core::{Category, Item, ItemDraft, ItemId, Price};

/// Placeholder photo shared by the default items.
pub const PLACEHOLDER_IMAGE: &str = "https://i.ibb.co/8M3b106/pyramid.jpg";

fn item(id: i64, name: &str, description: &str, dollars: i64, category: Category) -> Item {
    Item {
        id: ItemId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        price: Price::usd(Decimal::new(dollars, 0)),
        image_url: PLACEHOLDER_IMAGE.to_string(),
        category,
        model_url: None,
    }
}

/// The factory catalog.
#[must_use]
pub fn default_catalog() -> Vec<Item> {
    vec![
        // Crochet
        item(
            1,
            "Barnaby the Bear",
            "A classic, cuddly friend with a heart of gold. Barnaby loves picnics and long naps in sunny spots.",
            350,
            Category::Crochet,
        ),
        item(
            2,
            "Oliver the Owl",
            "Wise beyond his years, Oliver is a night owl who loves telling bedtime stories. His big eyes have seen many wonders.",
            280,
            Category::Crochet,
        ),
        item(
            3,
            "Penelope the Pink Puppy",
            "Full of wags and wiggles, Penelope is a playful pup with adorable spotty paws. She's always ready for a game of fetch.",
            320,
            Category::Crochet,
        ),
        item(
            4,
            "Frederick the Frog",
            "A friendly frog with long, lanky legs perfect for hopping adventures. Frederick is a champion jumper.",
            300,
            Category::Crochet,
        ),
        item(
            5,
            "Ellie the Elephant Snuggly",
            "Part blanket, part best friend. Ellie is super soft and provides endless comfort during naptime.",
            400,
            Category::Crochet,
        ),
        item(
            6,
            "Dapper Rabbit",
            "A sophisticated bunny with a handmade bowtie and suspenders. He's ready for any formal occasion or tea party.",
            380,
            Category::Crochet,
        ),
        item(
            7,
            "Willow the Whale",
            "A gentle giant of the yarn sea. Willow is a great listener and gives the best, biggest hugs.",
            450,
            Category::Crochet,
        ),
        // Decor
        item(
            8,
            "Granny Square Cardigan",
            "A cozy, colorful cardigan made from classic granny squares. A warm and stylish statement piece.",
            850,
            Category::Decor,
        ),
        item(
            9,
            "Floral Granny Square Blanket",
            "A beautiful cream-colored blanket adorned with vibrant, multi-colored floral granny squares.",
            950,
            Category::Decor,
        ),
        item(
            10,
            "Rainbow Stripe Blanket",
            "Brighten any room with this cheerful blanket featuring diagonal stripes in a rainbow of colors.",
            900,
            Category::Decor,
        ),
        item(
            11,
            "Pink & White Patchwork Blanket",
            "An elegant and intricate blanket with a variety of pink and white granny square patterns.",
            1100,
            Category::Decor,
        ),
        item(
            12,
            "Wavy Ripple Blanket",
            "A soothing blanket with a wavy ripple pattern in shades of teal, grey, and cream.",
            800,
            Category::Decor,
        ),
        // Random
        item(
            13,
            "Mosaic Pebble Cat",
            "A charming cat silhouette decorated with a mosaic of colorful pebbles. A unique piece of wall art for any cat lover.",
            250,
            Category::Random,
        ),
        item(
            14,
            "Money Tree Coin Art",
            "A mixed-media art piece featuring a tree with coins for leaves. A beautiful symbol of prosperity.",
            300,
            Category::Random,
        ),
        item(
            15,
            "Musical Memories Tray",
            "A decoupaged tray featuring sheet music, vintage photos, and musical instruments. Perfect for serving or display.",
            450,
            Category::Random,
        ),
        item(
            16,
            "Christmas Gnome",
            "A festive gnome with a big fluffy nose and a tall grey hat, ready to bring holiday cheer to your home.",
            200,
            Category::Crochet,
        ),
    ]
}

/// The id-less form `replace_all` takes; identities are reassigned by the
/// store on reset.
#[must_use]
pub fn default_drafts() -> Vec<ItemDraft> {
    default_catalog().into_iter().map(Item::into_draft).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crafty_spinx_core::ItemId;

    use super::*;

    #[test]
    fn test_default_catalog_shape() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 16);

        let ids: HashSet<ItemId> = catalog.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), catalog.len(), "identities must be unique");

        for item in &catalog {
            assert!(!item.name.trim().is_empty());
            assert!(!item.description.trim().is_empty());
            assert!(!item.price.is_negative());
        }
    }

    #[test]
    fn test_default_drafts_match_catalog() {
        let catalog = default_catalog();
        let drafts = default_drafts();
        assert_eq!(drafts.len(), catalog.len());
        for (draft, item) in drafts.iter().zip(&catalog) {
            assert_eq!(draft.name, item.name);
            assert_eq!(draft.price, item.price);
        }
    }
}
