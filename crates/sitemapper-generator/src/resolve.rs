//! Output path resolution.
//!
//! The generator may route content somewhere other than its declared slug,
//! so the built page list decides where a record actually lives. Records no
//! built page claims keep a path derived from the slug.

use sitemapper_core::{BuiltPage, ContentRecord};
use tracing::trace;

fn strip_trailing_separator(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

/// ASCII case-insensitive suffix test.
fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    let (haystack, suffix) = (haystack.as_bytes(), suffix.as_bytes());
    haystack.len() >= suffix.len()
        && haystack[haystack.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Join a path prefix and a slug with a single separator between them.
pub fn join_path(prefix: &str, slug: &str) -> String {
    if prefix.is_empty() {
        return slug.to_string();
    }

    let prefix = prefix.trim_end_matches('/');
    let slug = slug.trim_start_matches('/');
    if slug.is_empty() {
        format!("{prefix}/")
    } else {
        format!("{prefix}/{slug}")
    }
}

/// Find the first built page whose path ends with `slug`.
///
/// Trailing separators are ignored on both sides. A root slug only matches
/// the root page.
pub fn find_built_page<'a>(slug: &str, pages: &'a [BuiltPage]) -> Option<&'a BuiltPage> {
    let matcher = strip_trailing_separator(slug);

    pages.iter().find(|page| {
        let path = strip_trailing_separator(&page.path);
        if matcher.is_empty() {
            path.is_empty()
        } else {
            ends_with_ignore_case(path, matcher)
        }
    })
}

/// Set the record's output path from the built page list, falling back to
/// `join_path(path_prefix, slug)`.
pub fn resolve(mut record: ContentRecord, pages: &[BuiltPage], path_prefix: &str) -> ContentRecord {
    let path = match find_built_page(&record.slug, pages) {
        Some(page) => {
            trace!(slug = %record.slug, path = %page.path, "resolved from built page");
            page.path.clone()
        }
        None => join_path(path_prefix, &record.slug),
    };

    record.path = Some(path);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(paths: &[&str]) -> Vec<BuiltPage> {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| BuiltPage::new(format!("page-{i}"), *p))
            .collect()
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/about/"), "/about/");
        assert_eq!(join_path("/blog", "/about/"), "/blog/about/");
        assert_eq!(join_path("/blog/", "about"), "/blog/about");
        assert_eq!(join_path("/blog", "/"), "/blog/");
    }

    #[test]
    fn test_built_page_overrides_slug() {
        let built = pages(&["/", "/2024/03/hello-world/"]);
        let record = resolve(ContentRecord::new("/hello-world/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/2024/03/hello-world/"));
    }

    #[test]
    fn test_suffix_not_substring() {
        let built = pages(&["/about-us/"]);
        let record = resolve(ContentRecord::new("/about/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/about/"));
    }

    #[test]
    fn test_first_match_wins() {
        let built = pages(&["/en/post/", "/de/post/", "/post/"]);
        let record = resolve(ContentRecord::new("/post/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/en/post/"));
    }

    #[test]
    fn test_fallback_uses_prefix() {
        let record = resolve(ContentRecord::new("/dynamic/"), &pages(&["/a/"]), "/blog");
        assert_eq!(record.path.as_deref(), Some("/blog/dynamic/"));
    }

    #[test]
    fn test_trailing_separator_ignored() {
        let built = pages(&["/docs/intro"]);
        let record = resolve(ContentRecord::new("/intro/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/docs/intro"));
    }

    #[test]
    fn test_match_ignores_ascii_case() {
        let built = pages(&["/Guides/Setup/"]);
        let record = resolve(ContentRecord::new("/setup/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/Guides/Setup/"));
    }

    #[test]
    fn test_root_slug_matches_only_root() {
        let built = pages(&["/about/", "/"]);
        assert_eq!(find_built_page("/", &built).map(|p| p.path.as_str()), Some("/"));
        assert!(find_built_page("/", &pages(&["/about/"])).is_none());
    }

    #[test]
    fn test_non_ascii_paths_do_not_panic() {
        let built = pages(&["/日本語/ページ/"]);
        assert!(find_built_page("/ジ/", &built).is_none());
        let record = resolve(ContentRecord::new("/ページ/"), &built, "");
        assert_eq!(record.path.as_deref(), Some("/日本語/ページ/"));
    }
}
