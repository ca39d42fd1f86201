use reqwest::Url;

use crate::error::{Error, Result};

/// Resolves `path` against `base`; absolute `http(s)` links are kept as is.
pub(crate) fn join_url(base: &str, path: &str) -> Result<Url> {
    let joined = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.is_empty() {
        base.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Url::parse(&joined).map_err(|e| Error::Configuration(format!("invalid url {}: {}", joined, e)))
}

/// Copy of `url` with `name=value` set, replacing an existing `name`.
pub(crate) fn with_query_key(url: &Url, name: &str, value: &str) -> Url {
    let mut out = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    out.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(name, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_slashes_and_absolute_links() {
        let u = join_url("https://api.example.test/", "/field-finder").unwrap();
        assert_eq!(u.as_str(), "https://api.example.test/field-finder");

        let u = join_url("https://api.example.test", "https://other.test/field-facts/1").unwrap();
        assert_eq!(u.as_str(), "https://other.test/field-facts/1");

        assert!(join_url("::nope", "x").is_err());
    }

    #[test]
    fn query_key_is_appended_once() {
        let url = Url::parse("https://api.example.test/x?a=1&subscription-key=old").unwrap();
        let keyed = with_query_key(&url, "subscription-key", "new");
        assert_eq!(keyed.as_str(), "https://api.example.test/x?a=1&subscription-key=new");
        assert_eq!(url.query(), Some("a=1&subscription-key=old"));
    }
}
