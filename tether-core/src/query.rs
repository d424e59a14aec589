//! Query option and result types shared by models, stores and proxies.

use crate::{merge::deep_merge, Conditions, Document, DocumentId, QueryError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options accepted by finders: conditions plus ordering and windowing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindOptions {
    #[serde(default)]
    pub conditions: Conditions,
    /// Comma separated `field [asc|desc]` clauses.
    pub order: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// Attribute projection. `None` returns every attribute.
    pub fields: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options holding only the given conditions.
    pub fn with_conditions(conditions: Conditions) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    /// Add one equality condition.
    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions.insert(field.into(), value);
        self
    }

    pub fn order(mut self, clause: impl Into<String>) -> Self {
        self.order = Some(clause.into());
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Deep-merge `other` into these options. Conditions are merged
    /// recursively with `other` winning on collisions; any windowing option
    /// set in `other` replaces the one here.
    pub fn merge(mut self, other: FindOptions) -> Self {
        deep_merge(&mut self.conditions, other.conditions);
        if other.order.is_some() {
            self.order = other.order;
        }
        if other.skip.is_some() {
            self.skip = other.skip;
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.fields.is_some() {
            self.fields = other.fields;
        }
        self
    }

    /// Parse the order clause, if any.
    pub fn sort_keys(&self) -> Result<Vec<SortKey>, QueryError> {
        match &self.order {
            Some(clause) => parse_order(clause),
            None => Ok(Vec::new()),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// One parsed order clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Parse `"name, age desc"` into sort keys. Direction defaults to ascending.
pub fn parse_order(clause: &str) -> Result<Vec<SortKey>, QueryError> {
    let mut keys = Vec::new();
    for part in clause.split(',') {
        let mut words = part.split_whitespace();
        let Some(field) = words.next() else {
            return Err(QueryError::InvalidOrder {
                clause: clause.to_string(),
                reason: "empty sort field".to_string(),
            });
        };
        let direction = match words.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(QueryError::InvalidOrder {
                    clause: clause.to_string(),
                    reason: format!("unknown direction '{}'", other),
                })
            }
        };
        if words.next().is_some() {
            return Err(QueryError::InvalidOrder {
                clause: clause.to_string(),
                reason: format!("trailing tokens after '{}'", part.trim()),
            });
        }
        keys.push(SortKey {
            field: field.to_string(),
            direction,
        });
    }
    Ok(keys)
}

/// Which documents a find call selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finder {
    First,
    Last,
    All,
    /// Single id lookup; strict.
    Id(DocumentId),
    /// Multiple id lookup; strict, every id must match.
    Ids(Vec<DocumentId>),
}

/// Result of a find call, shaped by its [`Finder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    One(Option<Document>),
    Many(Vec<Document>),
}

impl Found {
    /// True when a single-result find matched nothing. An empty `Many`
    /// is a valid (empty) result, not an absent one.
    pub fn is_absent(&self) -> bool {
        matches!(self, Found::One(None))
    }

    pub fn len(&self) -> usize {
        match self {
            Found::One(doc) => usize::from(doc.is_some()),
            Found::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single document, or the first of many.
    pub fn into_one(self) -> Option<Document> {
        match self {
            Found::One(doc) => doc,
            Found::Many(docs) => docs.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Document> {
        match self {
            Found::One(doc) => doc.into_iter().collect(),
            Found::Many(docs) => docs,
        }
    }
}

/// Page selection for paginated finds. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page == 0 {
            return Err(QueryError::InvalidPage {
                reason: "page must be >= 1".to_string(),
            });
        }
        if self.per_page == 0 {
            return Err(QueryError::InvalidPage {
                reason: "per_page must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    /// Number of documents preceding this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of documents plus the totals needed to navigate.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Document>,
    pub page: u64,
    pub per_page: u64,
    pub total_entries: u64,
}

impl Page {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_entries.div_ceil(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_order_defaults_to_asc() {
        let keys = parse_order("name, age desc").unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey { field: "name".into(), direction: Direction::Asc },
                SortKey { field: "age".into(), direction: Direction::Desc },
            ]
        );
    }

    #[test]
    fn test_parse_order_rejects_unknown_direction() {
        let err = parse_order("name sideways").unwrap_err();
        assert!(matches!(err, QueryError::InvalidOrder { .. }));
        assert!(parse_order("name asc extra").is_err());
        assert!(parse_order("name,").is_err());
    }

    #[test]
    fn test_merge_right_wins_in_conditions() {
        let left = FindOptions::new()
            .where_eq("name", json!("Ann"))
            .where_eq("room_id", json!("other"))
            .order("name");
        let right = FindOptions::new().where_eq("room_id", json!("mine")).limit(3);

        let merged = left.merge(right);
        assert_eq!(merged.conditions.get("name"), Some(&json!("Ann")));
        assert_eq!(merged.conditions.get("room_id"), Some(&json!("mine")));
        assert_eq!(merged.order.as_deref(), Some("name"));
        assert_eq!(merged.limit, Some(3));
    }

    #[test]
    fn test_found_absent_only_for_single_miss() {
        assert!(Found::One(None).is_absent());
        assert!(!Found::Many(vec![]).is_absent());
        assert!(Found::Many(vec![]).is_empty());
    }

    #[test]
    fn test_page_request_validation_and_offset() {
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_page_total_pages_rounds_up() {
        let page = Page {
            items: vec![],
            page: 1,
            per_page: 10,
            total_entries: 21,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }

    #[test]
    fn test_find_options_deserialize_from_json() {
        let options: FindOptions = serde_json::from_value(json!({
            "conditions": {"name": "Ann"},
            "order": "age desc",
            "limit": 2
        }))
        .unwrap();
        assert_eq!(options.conditions.get("name"), Some(&json!("Ann")));
        assert_eq!(options.limit, Some(2));
        assert!(options.skip.is_none());
    }
}
