//! # Catalog Lookup Rules
//!
//! Two read paths share these rules:
//!
//! - **Lookup** resolves a typed query to a single product:
//!   exact barcode, then exact name, then first partial name match.
//! - **Suggestions** list products whose name contains the query, ranked
//!   exact name, then prefix, then substring, then alphabetically.
//!
//! The database layer runs both as SQL `ORDER BY CASE` queries; the pure
//! versions here define the ordering and are used on in-memory lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Suggestions shown while typing at the counter.
pub const BILLING_SUGGESTION_LIMIT: i64 = 8;

/// Suggestions shown by catalog search.
pub const DEFAULT_SUGGESTION_LIMIT: i64 = 10;

/// Which tier a product matched a query on. Lower tiers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Barcode,
    ExactName,
    Partial,
}

/// Classifies how `product` matches `query` for single-product lookup.
///
/// Name comparisons ignore ASCII case; barcodes must match exactly.
pub fn classify(product: &Product, query: &str) -> Option<MatchKind> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if product.barcode == query {
        Some(MatchKind::Barcode)
    } else if product.name.eq_ignore_ascii_case(query) {
        Some(MatchKind::ExactName)
    } else if contains_ignore_case(&product.name, query) {
        Some(MatchKind::Partial)
    } else {
        None
    }
}

/// Picks the best single match from `products`.
pub fn best_match<'a>(products: &'a [Product], query: &str) -> Option<&'a Product> {
    products
        .iter()
        .filter_map(|p| classify(p, query).map(|kind| (kind, p)))
        .min_by_key(|(kind, _)| *kind)
        .map(|(_, p)| p)
}

/// Suggestion rank of a name: 1 exact, 2 prefix, 3 substring.
pub fn suggestion_rank(name: &str, query: &str) -> Option<u8> {
    let name_lower = name.to_lowercase();
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return None;
    }

    if name_lower == query_lower {
        Some(1)
    } else if name_lower.starts_with(&query_lower) {
        Some(2)
    } else if name_lower.contains(&query_lower) {
        Some(3)
    } else {
        None
    }
}

/// Ranks and truncates suggestions from an in-memory list.
pub fn rank_suggestions<'a>(products: &'a [Product], query: &str, limit: usize) -> Vec<&'a Product> {
    let mut ranked: Vec<(u8, &Product)> = products
        .iter()
        .filter_map(|p| suggestion_rank(&p.name, query).map(|rank| (rank, p)))
        .collect();

    ranked.sort_by(|(ra, a), (rb, b)| match ra.cmp(rb) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });

    ranked.into_iter().take(limit).map(|(_, p)| p).collect()
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
///
/// ```rust
/// use kade_core::search::escape_like;
///
/// assert_eq!(escape_like("50%_off"), "50\\%\\_off");
/// ```
pub fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitType;
    use chrono::Utc;

    fn product(name: &str, barcode: &str) -> Product {
        Product {
            id: 0,
            name: name.to_string(),
            barcode: barcode.to_string(),
            price_cents: 100,
            marked_price_cents: 0,
            quantity_milli: 0,
            unit_type: UnitType::Unit,
            unit_measure: "pieces".to_string(),
            category: None,
            supplier: None,
            description: None,
            reorder_level_milli: 10_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_barcode_beats_name() {
        let products = vec![
            product("Milk 123", "999"),
            product("123", "555"),
            product("Bread", "123"),
        ];
        assert_eq!(best_match(&products, "123").map(|p| p.name.as_str()), Some("Bread"));
    }

    #[test]
    fn test_exact_name_beats_partial() {
        let products = vec![product("Sugar Brown", "1"), product("sugar", "2")];
        assert_eq!(best_match(&products, "Sugar").map(|p| p.barcode.as_str()), Some("2"));
        assert!(best_match(&products, "salt").is_none());
        assert!(best_match(&products, "  ").is_none());
    }

    #[test]
    fn test_suggestion_ordering() {
        let products = vec![
            product("Brown Rice", "1"),
            product("Rice Flour", "2"),
            product("Rice", "3"),
            product("Basmati Rice", "4"),
            product("Soap", "5"),
        ];

        let names: Vec<&str> = rank_suggestions(&products, "rice", 10)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Rice", "Rice Flour", "Basmati Rice", "Brown Rice"]);

        assert_eq!(rank_suggestions(&products, "rice", 2).len(), 2);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
