//! Record normalization.
//!
//! Query results come back in whatever shape their source declares. Each
//! node is tagged with its [`SourceKind`] and normalized into a
//! [`ContentRecord`] with flat metadata.

use serde_json::{Map, Value};
use sitemapper_core::{ContentRecord, Metadata, SourceKind};
use thiserror::Error;

/// Frontmatter fields promoted to top-level metadata on markdown nodes.
const PROMOTED_FRONTMATTER: [&str; 2] = ["published_at", "feature_image"];

/// Normalization errors.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The slug field is missing or not a string.
    #[error("`{field}` is a required field on `{source_name}` records")]
    MissingSlug {
        source_name: String,
        field: &'static str,
    },
}

/// Result type for normalization.
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// A query result node tagged with its record shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Markdown content node.
    Markdown(Map<String, Value>),
    /// Any other node.
    Generic(Map<String, Value>),
}

impl RawRecord {
    /// Tag a node. Returns `None` for null or non-object nodes.
    pub fn from_node(kind: SourceKind, node: &Value) -> Option<Self> {
        let map = node.as_object()?.clone();
        Some(match kind {
            SourceKind::Markdown => Self::Markdown(map),
            SourceKind::Generic => Self::Generic(map),
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Markdown(_) => SourceKind::Markdown,
            Self::Generic(_) => SourceKind::Generic,
        }
    }

    /// The declared slug, read from the location this shape keeps it.
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Markdown(node) => node.get("fields")?.get("slug")?.as_str(),
            Self::Generic(node) => node.get("slug")?.as_str(),
        }
    }
}

/// Normalize a raw node from `source` into a content record.
pub fn normalize(source: &str, raw: RawRecord) -> Result<ContentRecord> {
    let missing = |kind: SourceKind| NormalizeError::MissingSlug {
        source_name: source.to_string(),
        field: kind.slug_field(),
    };

    match raw {
        RawRecord::Markdown(mut node) => {
            let mut fields = take_object(&mut node, "fields");
            let slug = match fields.remove("slug") {
                Some(Value::String(slug)) if !slug.is_empty() => slug,
                _ => return Err(missing(SourceKind::Markdown)),
            };

            let mut frontmatter = take_object(&mut node, "frontmatter");
            let mut metadata = Metadata::new();

            for key in PROMOTED_FRONTMATTER {
                if let Some(value) = frontmatter.remove(key)
                    && is_scalar(&value)
                {
                    metadata.insert(key.to_string(), value);
                }
            }

            flatten_into(&mut metadata, "", node);
            flatten_into(&mut metadata, "fields.", fields);
            flatten_into(&mut metadata, "frontmatter.", frontmatter);

            Ok(ContentRecord {
                slug,
                path: None,
                metadata,
            })
        }
        RawRecord::Generic(mut node) => {
            let slug = match node.remove("slug") {
                Some(Value::String(slug)) if !slug.is_empty() => slug,
                _ => return Err(missing(SourceKind::Generic)),
            };

            let mut metadata = Metadata::new();
            flatten_into(&mut metadata, "", node);

            Ok(ContentRecord {
                path: Some(slug.clone()),
                slug,
                metadata,
            })
        }
    }
}

fn take_object(node: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match node.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// Copy scalar values into `metadata`, keys prefixed with `prefix`.
/// Existing keys are kept.
fn flatten_into(metadata: &mut Metadata, prefix: &str, map: Map<String, Value>) {
    for (key, value) in map {
        if is_scalar(&value) {
            metadata.entry(format!("{prefix}{key}")).or_insert(value);
        }
    }
}
