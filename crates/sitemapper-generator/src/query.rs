//! Query execution.
//!
//! Records come from the site's data layer through a query. The executor is
//! a collaborator behind [`QueryExecutor`]; [`SnapshotExecutor`] answers
//! queries from a JSON export of that data layer.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

/// Query returning every built page plus the site URL.
pub const DEFAULT_QUERY: &str = r#"{
  allSitePage {
    edges {
      node {
        id
        slug: path
        url: path
      }
    }
  }
  site {
    siteMetadata {
      siteUrl
    }
  }
}"#;

/// Query data keyed by source alias.
pub type QueryData = Map<String, Value>;

/// Query errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The executor reported errors.
    #[error("query failed: {0}")]
    Failed(String),

    /// IO error reading a snapshot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON.
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Response of a query: data plus any errors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: QueryData,

    #[serde(default)]
    pub errors: Vec<String>,
}

impl QueryResponse {
    pub fn ok(data: QueryData) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            data: QueryData::new(),
            errors,
        }
    }
}

/// Executes a query string against the site's data layer.
pub trait QueryExecutor {
    fn execute(&self, query: &str) -> QueryResponse;
}

impl<F> QueryExecutor for F
where
    F: Fn(&str) -> QueryResponse,
{
    fn execute(&self, query: &str) -> QueryResponse {
        self(query)
    }
}

/// Run a query; any reported error fails the run.
pub fn run_query(executor: &dyn QueryExecutor, query: &str) -> Result<QueryData> {
    let response = executor.execute(query);

    if !response.errors.is_empty() {
        let message = response.errors.join(", ");
        error!(errors = %message, "query returned errors");
        return Err(QueryError::Failed(message));
    }

    debug!(sources = response.data.len(), "query complete");
    Ok(response.data)
}

/// A top-level selection: the alias results are returned under and the
/// field it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub alias: String,
    pub field: String,
}

/// Extract the top-level field selections of a query.
///
/// Handles `alias: field`, arguments, comments and string literals;
/// operation keywords before the first `{` are skipped. Directives,
/// fragment spreads and `fragment` definitions select nothing.
pub fn top_level_selections(query: &str) -> Vec<Selection> {
    let bytes = query.as_bytes();
    let mut selections: Vec<Selection> = Vec::new();
    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut after_colon = false;
    let mut fragment_pending = false;
    let mut in_fragment = false;
    // Names still to skip after `...`: the spread name, or `on` and its type.
    let mut skip_names = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'{' => {
                if depth == 0 {
                    in_fragment = fragment_pending;
                    fragment_pending = false;
                }
                depth += 1;
                skip_names = 0;
            }
            b'}' => depth = depth.saturating_sub(1),
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'@' | b'$' => {
                i += 1;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                continue;
            }
            b'.' if depth == 1 && parens == 0 => skip_names = 1,
            b':' if depth == 1 && parens == 0 => after_colon = true,
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                let name = &query[start..i];

                if parens > 0 {
                    continue;
                }

                if depth == 0 {
                    if name == "fragment" {
                        fragment_pending = true;
                    }
                } else if depth == 1 && !in_fragment {
                    if skip_names > 0 {
                        skip_names -= 1;
                        if name == "on" {
                            skip_names = 1;
                        }
                    } else {
                        match selections.last_mut() {
                            Some(last) if after_colon => last.field = name.to_string(),
                            _ => selections.push(Selection {
                                alias: name.to_string(),
                                field: name.to_string(),
                            }),
                        }
                    }
                    after_colon = false;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    selections
}

fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Answers queries from a JSON snapshot of the site's data layer.
///
/// The snapshot is an object keyed by top-level field name (optionally
/// wrapped in `{ "data": ... }`). A query returns the fields it selects,
/// under their aliases; nested selections are not applied.
#[derive(Debug, Clone, Default)]
pub struct SnapshotExecutor {
    data: QueryData,
}

impl SnapshotExecutor {
    pub fn new(data: QueryData) -> Self {
        Self { data }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut data: QueryData = serde_json::from_str(json)?;

        if data.len() == 1
            && data.get("data").is_some_and(Value::is_object)
            && let Some(Value::Object(inner)) = data.remove("data")
        {
            data = inner;
        }

        Ok(Self::new(data))
    }

    /// Read a snapshot file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl QueryExecutor for SnapshotExecutor {
    fn execute(&self, query: &str) -> QueryResponse {
        let selections = top_level_selections(query);
        if selections.is_empty() {
            return QueryResponse::failed(vec!["query selects no fields".to_string()]);
        }

        let mut data = QueryData::new();
        let mut errors = Vec::new();

        for Selection { alias, field } in selections {
            match self.data.get(&field) {
                Some(value) => {
                    data.insert(alias, value.clone());
                }
                None => errors.push(format!(
                    "Cannot query field \"{field}\" on type \"Query\""
                )),
            }
        }

        QueryResponse { data, errors }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot() -> SnapshotExecutor {
        SnapshotExecutor::from_json(
            &json!({
                "site": { "siteMetadata": { "siteUrl": "https://example.com" } },
                "allSitePage": { "edges": [] },
                "allMarkdownRemark": { "edges": [{ "node": { "fields": { "slug": "/a/" } } }] }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_query_selections() {
        let selections = top_level_selections(DEFAULT_QUERY);
        let fields: Vec<_> = selections.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, vec!["allSitePage", "site"]);
    }

    #[test]
    fn test_aliases_and_arguments() {
        let query = r#"
            query Sitemap {
              # pages first
              posts: allMarkdownRemark(filter: { draft: { eq: false } }, sort: "date") {
                edges { node { id } }
              }
              site { siteMetadata { siteUrl } }
            }
        "#;

        let selections = top_level_selections(query);

        assert_eq!(
            selections,
            vec![
                Selection {
                    alias: "posts".into(),
                    field: "allMarkdownRemark".into()
                },
                Selection {
                    alias: "site".into(),
                    field: "site".into()
                },
            ]
        );
    }

    #[test]
    fn test_directives_and_fragments_select_nothing() {
        let query = r#"
            query Sitemap($withTags: Boolean!) @cached {
              allMarkdownRemark @include(if: $withTags) {
                edges { node { ...PostFields } }
              }
              ...SiteFields
              ... on Query { allGhostTag { edges { node { slug } } } }
            }

            fragment SiteFields on Query {
              site { siteMetadata { siteUrl } }
            }

            fragment PostFields on MarkdownRemark { id }
        "#;

        let fields: Vec<_> = top_level_selections(query)
            .into_iter()
            .map(|s| s.field)
            .collect();

        assert_eq!(fields, vec!["allMarkdownRemark"]);
    }

    #[test]
    fn test_snapshot_ignores_fragment_fields() {
        let query = "{ allMarkdownRemark { edges { node { ...F } } } } fragment F on X { id slug }";
        let response = snapshot().execute(query);

        assert!(response.errors.is_empty());
        assert_eq!(response.data.len(), 1);
    }

    #[test]
    fn test_snapshot_returns_selected_fields() {
        let response = snapshot().execute("{ allMarkdownRemark { edges { node { id } } } }");

        assert!(response.errors.is_empty());
        assert_eq!(response.data.len(), 1);
        assert!(response.data.contains_key("allMarkdownRemark"));
    }

    #[test]
    fn test_snapshot_unknown_field_is_error() {
        let response = snapshot().execute("{ allGhostPost { edges { node { id } } } }");
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].contains("allGhostPost"));
    }

    #[test]
    fn test_snapshot_unwraps_data() {
        let executor = SnapshotExecutor::from_json(r#"{ "data": { "site": {} } }"#).unwrap();
        let response = executor.execute("{ site { siteMetadata { siteUrl } } }");
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_run_query_fails_on_errors() {
        let executor = |_: &str| QueryResponse::failed(vec!["boom".into(), "bang".into()]);
        let err = run_query(&executor, DEFAULT_QUERY).unwrap_err();
        assert_eq!(err.to_string(), "query failed: boom, bang");
    }

    #[test]
    fn test_run_query_returns_data() {
        let data = run_query(&snapshot(), DEFAULT_QUERY).unwrap();
        assert!(data.contains_key("site"));
        assert!(data.contains_key("allSitePage"));
    }

    #[test]
    fn test_invalid_snapshot() {
        assert!(matches!(
            SnapshotExecutor::from_json("not json"),
            Err(QueryError::Snapshot(_))
        ));
    }
}
