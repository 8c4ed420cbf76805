//! Mapping from free-text detection labels to wardrobe categories

use crate::types::ClothingCategory;

/// Person and body-part terms. A label containing any of these never
/// becomes a clothing item, whatever garment keyword it also contains.
///
/// Matching is by substring, so some garment labels are lost as well:
/// "Footwear" (`foot`), "Handbag" (`hand`), "Leggings" (`leg`) and
/// "Headwear" (`head`) all map to no category.
pub const EXCLUDED_TERMS: &[&str] = &[
    "person", "people", "human", "man", "woman", "boy", "girl", "face", "head", "body", "hand",
    "leg", "arm", "foot",
];

/// Keyword table scanned in order; the first substring match wins.
pub const CATEGORY_KEYWORDS: &[(&str, ClothingCategory)] = &[
    // Tops
    ("shirt", ClothingCategory::Top),
    ("blouse", ClothingCategory::Top),
    ("sweater", ClothingCategory::Top),
    ("hoodie", ClothingCategory::Top),
    ("tank top", ClothingCategory::Top),
    ("polo", ClothingCategory::Top),
    ("jersey", ClothingCategory::Top),
    ("top", ClothingCategory::Top),
    // Bottoms
    ("pants", ClothingCategory::Bottom),
    ("jeans", ClothingCategory::Bottom),
    ("skirt", ClothingCategory::Bottom),
    ("shorts", ClothingCategory::Bottom),
    ("trousers", ClothingCategory::Bottom),
    // Dresses
    ("dress", ClothingCategory::Dress),
    ("gown", ClothingCategory::Dress),
    ("jumpsuit", ClothingCategory::Dress),
    ("romper", ClothingCategory::Dress),
    // Outerwear
    ("jacket", ClothingCategory::Outerwear),
    ("coat", ClothingCategory::Outerwear),
    ("blazer", ClothingCategory::Outerwear),
    ("cardigan", ClothingCategory::Outerwear),
    ("parka", ClothingCategory::Outerwear),
    ("vest", ClothingCategory::Outerwear),
    // Shoes
    ("shoe", ClothingCategory::Shoes),
    ("boot", ClothingCategory::Shoes),
    ("sneaker", ClothingCategory::Shoes),
    ("sandal", ClothingCategory::Shoes),
    ("heels", ClothingCategory::Shoes),
    ("loafer", ClothingCategory::Shoes),
    ("slipper", ClothingCategory::Shoes),
    // Accessories
    ("hat", ClothingCategory::Accessories),
    ("cap", ClothingCategory::Accessories),
    ("bag", ClothingCategory::Accessories),
    ("purse", ClothingCategory::Accessories),
    ("scarf", ClothingCategory::Accessories),
    ("belt", ClothingCategory::Accessories),
    ("glasses", ClothingCategory::Accessories),
    ("watch", ClothingCategory::Accessories),
    ("necklace", ClothingCategory::Accessories),
    ("bracelet", ClothingCategory::Accessories),
    ("earring", ClothingCategory::Accessories),
    ("glove", ClothingCategory::Accessories),
    ("tie", ClothingCategory::Accessories),
];

/// Whether a label names a person or body part
#[must_use]
pub fn is_excluded_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    EXCLUDED_TERMS.iter().any(|term| lower.contains(term))
}

/// Map a detection label to a wardrobe category.
///
/// Returns `None` for person/body-part labels and for labels with no
/// garment keyword.
#[must_use]
pub fn map_label_to_category(label: &str) -> Option<ClothingCategory> {
    let lower = label.to_lowercase();

    if is_excluded_label(&lower) {
        tracing::trace!(label, "label excluded as person/body part");
        return None;
    }

    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| *category)
}
