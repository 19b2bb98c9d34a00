//! Field catalogs: every key and dot path reachable in a JSON document.

use serde_json::Value;
use std::collections::HashSet;

/// Set of field names and full dot paths discovered in one document.
///
/// Membership has set semantics; iteration follows first insertion so that
/// suggestions derived from a catalog are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        catalog.extend(fields);
        catalog
    }

    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.seen.contains(&field) {
            return false;
        }
        self.seen.insert(field.clone());
        self.entries.push(field);
        true
    }

    pub fn extend<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.insert(field);
        }
    }

    pub fn merge(&mut self, other: &FieldCatalog) {
        for field in other.iter() {
            self.insert(field);
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.seen.contains(field)
    }

    /// True when `field` names an entry exactly or is the last dot segment(s)
    /// of one (`id` matches `user.id`).
    pub fn matches(&self, field: &str) -> bool {
        if self.contains(field) {
            return true;
        }
        let suffix = format!(".{field}");
        self.entries.iter().any(|entry| entry.ends_with(&suffix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks `value` and records every object key both bare and as its dot path
/// from the root. Arrays contribute only their first element.
pub fn extract_catalog(value: &Value) -> FieldCatalog {
    let mut catalog = FieldCatalog::new();
    collect_fields(value, "", &mut catalog);
    catalog
}

fn collect_fields(value: &Value, path: &str, catalog: &mut FieldCatalog) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let full_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                catalog.insert(key.as_str());
                catalog.insert(full_path.as_str());
                collect_fields(child, &full_path, catalog);
            }
        }
        Value::Array(items) => {
            if let Some(first) = items.first() {
                collect_fields(first, path, catalog);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_are_recorded_bare_and_as_paths() {
        let catalog = extract_catalog(&json!({"a": {"b": 1}}));
        assert!(catalog.contains("a"));
        assert!(catalog.contains("b"));
        assert!(catalog.contains("a.b"));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn arrays_only_walk_the_first_element() {
        let catalog = extract_catalog(&json!({
            "items": [{"sku": "x"}, {"price": 3}]
        }));
        assert!(catalog.contains("items.sku"));
        assert!(catalog.contains("sku"));
        assert!(!catalog.contains("price"));
    }

    #[test]
    fn top_level_array_paths_have_no_index_segment() {
        let catalog = extract_catalog(&json!([{"id": 1, "user": {"name": "n"}}]));
        let entries: Vec<&str> = catalog.iter().collect();
        assert_eq!(entries, vec!["id", "user", "name", "user.name"]);
    }

    #[test]
    fn scalars_and_null_yield_empty_catalogs() {
        assert!(extract_catalog(&Value::Null).is_empty());
        assert!(extract_catalog(&json!(42)).is_empty());
        assert!(extract_catalog(&json!("text")).is_empty());
        assert!(extract_catalog(&json!([])).is_empty());
    }

    #[test]
    fn suffix_matching_requires_a_dot_boundary() {
        let catalog = FieldCatalog::with_fields(["user", "user.id", "userid"]);
        assert!(catalog.matches("id"));
        assert!(catalog.matches("user.id"));
        assert!(!catalog.matches("rid"));
        assert!(!catalog.matches("ser.id"));
    }

    #[test]
    fn duplicate_inserts_keep_first_position() {
        let mut catalog = FieldCatalog::with_fields(["url", "method"]);
        assert!(!catalog.insert("url"));
        catalog.insert("body");
        assert_eq!(catalog.as_slice(), ["url", "method", "body"]);
    }
}
