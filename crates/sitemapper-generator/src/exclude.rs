//! Path exclusion.
//!
//! Records whose slug contains a configured path fragment are left out of
//! every sitemap.

use tracing::warn;

/// Strip one leading and one trailing `/`.
pub(crate) fn strip_separators(s: &str) -> &str {
    let s = s.strip_prefix('/').unwrap_or(s);
    s.strip_suffix('/').unwrap_or(s)
}

/// Filter that drops records matching any exclusion fragment.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<String>,
}

impl ExclusionFilter {
    /// Build a filter from configured path fragments.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| {
                let stripped = strip_separators(p.as_ref());
                if stripped.is_empty() {
                    warn!(pattern = p.as_ref(), "ignoring empty exclude pattern");
                    None
                } else {
                    Some(stripped.to_string())
                }
            })
            .collect();

        Self { patterns }
    }

    /// Whether a record with this slug is kept.
    ///
    /// Matching is a case-sensitive substring test on the stripped slug.
    pub fn is_included(&self, slug: &str) -> bool {
        let slug = strip_separators(slug);
        !self.patterns.iter().any(|p| slug.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
