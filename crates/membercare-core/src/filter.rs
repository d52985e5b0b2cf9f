//! List filtering and search.
//!
//! Filtering never reorders: it only drops entries that fail the category or
//! query test. An empty result is a valid outcome the screen renders as
//! "no results".

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the category selector entry that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Category selector value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    All,
    Named(String),
}

impl Category {
    pub fn named(name: impl Into<String>) -> Self {
        Category::from(name.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Category::All)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        if value == ALL_CATEGORIES {
            Category::All
        } else {
            Category::Named(value)
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => f.write_str(ALL_CATEGORIES),
            Category::Named(name) => f.write_str(name),
        }
    }
}

/// Which attributes a screen searches and which one holds the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    search_fields: Vec<String>,
    category_field: String,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            search_fields: vec!["title".to_string()],
            category_field: "category".to_string(),
        }
    }
}

impl ListFilter {
    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_category_field(mut self, field: impl Into<String>) -> Self {
        self.category_field = field.into();
        self
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn category_field(&self) -> &str {
        &self.category_field
    }

    /// Returns the records that pass both the category and the query test,
    /// in their original order.
    ///
    /// The query is matched literally (no trimming) as a case-insensitive
    /// substring of any configured search field.
    pub fn filter(&self, collection: &[Record], query: &str, category: &Category) -> Vec<Record> {
        let needle = query.to_lowercase();
        collection
            .iter()
            .filter(|record| self.in_category(record, category) && self.matches_query(record, &needle))
            .cloned()
            .collect()
    }

    /// Distinct category values in first-seen order, led by `All`.
    pub fn categories(&self, collection: &[Record]) -> Vec<Category> {
        let mut categories = vec![Category::All];
        for record in collection {
            if let Some(name) = record.text(&self.category_field) {
                let category = Category::Named(name.to_string());
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
        categories
    }

    fn in_category(&self, record: &Record, category: &Category) -> bool {
        match category {
            Category::All => true,
            Category::Named(name) => record.text(&self.category_field) == Some(name.as_str()),
        }
    }

    fn matches_query(&self, record: &Record, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.search_fields.iter().any(|field| {
            record
                .get(field)
                .and_then(|value| value.search_text())
                .map(|text| text.to_lowercase().contains(needle))
                .unwrap_or(false)
        })
    }
}

/// Read-only snapshot of the last fetched collection.
///
/// Each fetch replaces the snapshot wholesale; items are never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSnapshot {
    items: Vec<Record>,
}

impl ListSnapshot {
    pub fn new(items: Vec<Record>) -> Self {
        Self { items }
    }

    pub fn replace(&mut self, items: Vec<Record>) {
        self.items = items;
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloads() -> Vec<Record> {
        vec![
            Record::new()
                .with_id("1")
                .with("category", "Legal")
                .with("title", "Terms"),
            Record::new()
                .with_id("2")
                .with("category", "Forms")
                .with("title", "Onboarding"),
        ]
    }

    fn catalog() -> Vec<Record> {
        vec![
            Record::new().with("category", "Forms").with("title", "Claim Form").with("description", "Reimbursement"),
            Record::new().with("category", "Legal").with("title", "Privacy Policy").with("description", "Data use"),
            Record::new().with("category", "Forms").with("title", "Nominee update").with("description", "CLAIM support"),
            Record::new().with("category", "Guides").with("title", "Wellness guide"),
            Record::new().with("title", "Uncategorised claim"),
        ]
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.id().map(|id| id.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_downloads_scenario() {
        let filter = ListFilter::new(["title"]);
        let list = downloads();

        let by_query = filter.filter(&list, "term", &Category::All);
        assert_eq!(ids(&by_query), vec!["1"]);

        let by_category = filter.filter(&list, "", &Category::named("Forms"));
        assert_eq!(ids(&by_category), vec!["2"]);
    }

    #[test]
    fn test_empty_query_and_all_is_identity() {
        let filter = ListFilter::new(["title", "description"]);
        let list = catalog();
        assert_eq!(filter.filter(&list, "", &Category::All), list);
    }

    #[test]
    fn test_query_matches_any_field_case_insensitively() {
        let filter = ListFilter::new(["title", "description"]);
        let list = catalog();
        let result = filter.filter(&list, "ClAiM", &Category::All);
        let titles: Vec<&str> = result.iter().filter_map(|r| r.text("title")).collect();
        assert_eq!(titles, vec!["Claim Form", "Nominee update", "Uncategorised claim"]);

        for record in &result {
            let hit = ["title", "description"].iter().any(|field| {
                record
                    .text(field)
                    .map(|t| t.to_lowercase().contains("claim"))
                    .unwrap_or(false)
            });
            assert!(hit);
        }
    }

    #[test]
    fn test_category_is_exact_and_preserves_order() {
        let filter = ListFilter::new(["title"]);
        let list = catalog();
        let result = filter.filter(&list, "", &Category::named("Forms"));
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.text("category") == Some("Forms")));
        assert_eq!(result[0].text("title"), Some("Claim Form"));
        assert_eq!(result[1].text("title"), Some("Nominee update"));

        assert!(filter.filter(&list, "", &Category::named("forms")).is_empty());
    }

    #[test]
    fn test_query_and_category_combine() {
        let filter = ListFilter::new(["title", "description"]);
        let result = filter.filter(&catalog(), "claim", &Category::named("Forms"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let filter = ListFilter::new(["title"]);
        assert!(filter.filter(&catalog(), "dental", &Category::All).is_empty());
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let filter = ListFilter::new(["title"]);
        let list = vec![Record::new().with("title", "Terms")];
        assert!(filter.filter(&list, " terms", &Category::All).is_empty());
    }

    #[test]
    fn test_numeric_fields_are_searchable() {
        let filter = ListFilter::new(["ticket_no"]);
        let list = vec![Record::new().with("ticket_no", 40213i64)];
        assert_eq!(filter.filter(&list, "402", &Category::All).len(), 1);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let filter = ListFilter::new(["title"]);
        let categories = filter.categories(&catalog());
        assert_eq!(
            categories,
            vec![
                Category::All,
                Category::named("Forms"),
                Category::named("Legal"),
                Category::named("Guides"),
            ]
        );
    }

    #[test]
    fn test_category_from_label() {
        assert_eq!(Category::from("All"), Category::All);
        assert_eq!(Category::from("Legal").to_string(), "Legal");
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut snapshot = ListSnapshot::new(catalog());
        snapshot.replace(downloads());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.items(), downloads().as_slice());
    }
}
