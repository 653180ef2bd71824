//! Category counts, category filtering and pagination over a result set.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::analysis::{Category, Opportunity};

/// Opportunities shown per page.
pub const PAGE_SIZE: usize = 50;

/// Label of the catch-all category option.
pub const ALL_LABEL: &str = "All";

/// Category chosen in the filter control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySelection {
    /// No filtering.
    #[default]
    All,
    /// Only markets in this category.
    Only(Category),
}

impl FromStr for CategorySelection {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_LABEL) {
            return Ok(CategorySelection::All);
        }
        Category::from_str(s).map(CategorySelection::Only)
    }
}

/// Per-category totals for the filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    /// Number of opportunities overall.
    pub all: usize,
    /// Categories present, sorted by label.
    pub by_category: Vec<(Category, usize)>,
}

impl CategoryCounts {
    /// Count for a single category, zero when absent.
    pub fn get(&self, category: Category) -> usize {
        self.by_category
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Count opportunities per category.
pub fn category_counts(opportunities: &[Opportunity]) -> CategoryCounts {
    let mut counts: BTreeMap<String, (Category, usize)> = BTreeMap::new();
    for opp in opportunities {
        let category = opp.market.category;
        counts
            .entry(category.to_string())
            .or_insert((category, 0))
            .1 += 1;
    }

    CategoryCounts {
        all: opportunities.len(),
        by_category: counts.into_values().collect(),
    }
}

/// Opportunities matching the selection, in their original order.
pub fn filter_by_category(
    opportunities: &[Opportunity],
    selection: CategorySelection,
) -> Vec<&Opportunity> {
    opportunities
        .iter()
        .filter(|opp| match selection {
            CategorySelection::All => true,
            CategorySelection::Only(category) => opp.market.category == category,
        })
        .collect()
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Current page, 1-based.
    pub page: usize,
    /// Items per page.
    pub page_size: usize,
    /// Number of pages; at least 1.
    pub total_pages: usize,
    /// Number of items across all pages.
    pub total_items: usize,
    /// Items on this page.
    pub items: Vec<T>,
}

/// Slice out one page. `page` is clamped to `[1, total_pages]` and a zero
/// `page_size` falls back to [`PAGE_SIZE`].
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = if page_size == 0 { PAGE_SIZE } else { page_size };
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Page {
        page,
        page_size,
        total_pages,
        total_items: items.len(),
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, NormalizedMarket};
    use rust_decimal_macros::dec;

    fn opp(id: usize, category: Category) -> Opportunity {
        analyze(NormalizedMarket {
            id: id.to_string(),
            question: format!("Question {id}"),
            slug: None,
            event_slug: None,
            category,
            yes_price: dec!(0.45),
            no_price: dec!(0.55),
            volume: dec!(100000),
            liquidity: dec!(0),
            updated_at: None,
            time_left_ms: 0,
            market_url: String::new(),
        })
    }

    #[test]
    fn counts_per_category_sorted_by_label() {
        let opps = vec![
            opp(1, Category::Crypto),
            opp(2, Category::ClimateScience),
            opp(3, Category::Crypto),
            opp(4, Category::Culture),
        ];

        let counts = category_counts(&opps);

        assert_eq!(counts.all, 4);
        assert_eq!(
            counts.by_category,
            vec![
                (Category::ClimateScience, 1),
                (Category::Crypto, 2),
                (Category::Culture, 1),
            ]
        );
        assert_eq!(counts.get(Category::Crypto), 2);
        assert_eq!(counts.get(Category::Sports), 0);
    }

    #[test]
    fn filter_keeps_order() {
        let opps = vec![
            opp(1, Category::Crypto),
            opp(2, Category::Sports),
            opp(3, Category::Crypto),
        ];

        let crypto = filter_by_category(&opps, CategorySelection::Only(Category::Crypto));
        let ids: Vec<&str> = crypto.iter().map(|o| o.market.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        assert_eq!(filter_by_category(&opps, CategorySelection::All).len(), 3);
    }

    #[test]
    fn selection_parses_labels() {
        assert_eq!("All".parse::<CategorySelection>().unwrap(), CategorySelection::All);
        assert_eq!("".parse::<CategorySelection>().unwrap(), CategorySelection::All);
        assert_eq!(
            "Climate & Science".parse::<CategorySelection>().unwrap(),
            CategorySelection::Only(Category::ClimateScience)
        );
        assert!("Astrology".parse::<CategorySelection>().is_err());
    }

    #[test]
    fn pagination_clamps_page() {
        let items: Vec<usize> = (0..120).collect();

        let first = paginate(&items, 1, PAGE_SIZE);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 50);
        assert_eq!(first.items[0], 0);

        let last = paginate(&items, 99, PAGE_SIZE);
        assert_eq!(last.page, 3);
        assert_eq!(last.items, (100..120).collect::<Vec<_>>());

        let zero = paginate(&items, 0, 0);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.page_size, PAGE_SIZE);
    }

    #[test]
    fn empty_input_has_one_empty_page() {
        let page = paginate::<usize>(&[], 3, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
