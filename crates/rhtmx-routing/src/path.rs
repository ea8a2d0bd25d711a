/// Path and URL string utilities
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+\-.]*://").unwrap());

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//`
/// - Must not end with `/` (except root `/`)
///
/// # Examples
///
/// ```
/// use rhtmx_routing::path::is_canonical;
///
/// assert!(is_canonical("/"));
/// assert!(is_canonical("/posts/view/1"));
///
/// assert!(!is_canonical(""));
/// assert!(!is_canonical("posts"));
/// assert!(!is_canonical("/posts/"));
/// assert!(!is_canonical("/posts//view"));
/// ```
pub fn is_canonical(path: &str) -> bool {
    if !path.starts_with('/') || path.contains("//") {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already canonical.
///
/// - Repeated slashes: `/posts//view` → `/posts/view`
/// - Trailing slash: `/posts/` → `/posts`
/// - Missing leading slash: `posts` → `/posts`
/// - Empty: `` → `/`
///
/// # Examples
///
/// ```
/// use rhtmx_routing::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/posts"), Cow::Borrowed("/posts")));
/// assert_eq!(normalize_path("/posts//view/"), "/posts/view");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_canonical(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Collapses every run of slashes into one, keeping leading/trailing slashes
pub fn collapse_slashes(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        out.push(c);
    }
    Cow::Owned(out)
}

/// True for scheme-qualified URLs such as `https://example.com/`
pub fn has_scheme(url: &str) -> bool {
    SCHEME_REGEX.is_match(url)
}

/// Percent-decodes a path, leaving it untouched if it isn't valid UTF-8 once decoded
pub fn decode(value: &str) -> Cow<'_, str> {
    urlencoding::decode(value).unwrap_or(Cow::Borrowed(value))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set
pub fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// A query string: either already built, or key/value pairs to encode
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Raw(String),
    Pairs(Vec<(String, String)>),
}

impl Query {
    pub fn is_empty(&self) -> bool {
        match self {
            Query::Raw(raw) => raw.is_empty(),
            Query::Pairs(pairs) => pairs.is_empty(),
        }
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Query::Raw(raw.to_string())
    }
}

impl From<Vec<(String, String)>> for Query {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Query::Pairs(pairs)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Query {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Query::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

fn form_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Builds a `?`-prefixed query string from `query` plus `extra` pairs
///
/// A raw query is kept as-is and the pairs are appended to it. `escape` joins
/// with `&amp;` for embedding in HTML.
///
/// # Examples
///
/// ```
/// use rhtmx_routing::path::{query_string, Query};
///
/// let q = Query::from([("page", "2"), ("sort", "title asc")]);
/// assert_eq!(query_string(Some(&q), &[], false).unwrap(), "?page=2&sort=title+asc");
///
/// let raw = Query::from("a=1");
/// let extra = [("b".to_string(), "2".to_string())];
/// assert_eq!(query_string(Some(&raw), &extra, true).unwrap(), "?a=1&amp;b=2");
///
/// assert_eq!(query_string(None, &[], false), None);
/// ```
pub fn query_string(
    query: Option<&Query>,
    extra: &[(String, String)],
    escape: bool,
) -> Option<String> {
    if query.map_or(true, Query::is_empty) && extra.is_empty() {
        return None;
    }
    let join = if escape { "&amp;" } else { "&" };

    let (mut out, pairs): (String, Vec<&(String, String)>) = match query {
        Some(Query::Pairs(pairs)) => (String::new(), pairs.iter().chain(extra).collect()),
        Some(Query::Raw(raw)) => (raw.clone(), extra.iter().collect()),
        None => (String::new(), extra.iter().collect()),
    };

    let addition = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", form_encode(key), form_encode(value)))
        .collect::<Vec<_>>()
        .join(join);

    if !out.is_empty() && !addition.is_empty() && !out.ends_with(join) {
        out.push_str(join);
    }
    out.push_str(&addition);

    if !out.is_empty() && !out.starts_with('?') {
        out.insert(0, '?');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("/"));
        assert!(is_canonical("/about"));
        assert!(is_canonical("/users/123"));

        assert!(!is_canonical(""));
        assert!(!is_canonical("about"));
        assert!(!is_canonical("/about/"));
        assert!(!is_canonical("/about//page"));
    }

    #[test]
    fn test_normalize_path_valid() {
        let path = normalize_path("/about");
        assert!(matches!(path, Cow::Borrowed("/about")));

        let path = normalize_path("/");
        assert!(matches!(path, Cow::Borrowed("/")));
    }

    #[test]
    fn test_normalize_path_trailing_and_double_slash() {
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("/path///to////page"), "/path/to/page");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn test_collapse_slashes_keeps_trailing() {
        assert_eq!(collapse_slashes("//posts//index/"), "/posts/index/");
        assert!(matches!(collapse_slashes("/posts"), Cow::Borrowed("/posts")));
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("http://example.com"));
        assert!(has_scheme("svn+ssh://example.com/repo"));
        assert!(!has_scheme("/posts/view"));
        assert!(!has_scheme("mailto:someone@example.com"));
    }

    #[test]
    fn test_decode_and_encode() {
        assert_eq!(decode("/posts/%E2%88%82%E2%88%82"), "/posts/∂∂");
        assert_eq!(decode("/posts/%FF"), "/posts/%FF");
        assert_eq!(encode("word space"), "word%20space");
        assert_eq!(encode("name-of_article.v2~"), "name-of_article.v2~");
    }

    #[test]
    fn test_query_string_raw_with_separator() {
        let raw = Query::from("a=1&");
        let extra = [("b".to_string(), "2".to_string())];
        assert_eq!(query_string(Some(&raw), &extra, false).unwrap(), "?a=1&b=2");

        let raw = Query::from("?already=1");
        assert_eq!(query_string(Some(&raw), &[], false).unwrap(), "?already=1");
    }
}
