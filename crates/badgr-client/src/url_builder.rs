//! URL construction for resource calls

use url::Url;

use crate::error::Result;

/// Resolve `path` against `endpoint` and merge `query` into the result.
///
/// Existing pairs are kept as they are, repeated keys included. A supplied key
/// replaces every existing pair with that key, taking the position of the first
/// one; new keys are appended in the order given. The
/// characters `( ) ! *` are percent-encoded afterwards since some servers and
/// CDNs reject them unescaped.
pub fn make_url(endpoint: &Url, path: &str, query: &[(String, String)]) -> Result<String> {
    let mut url = endpoint.join(path)?;

    if !query.is_empty() {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for (key, value) in query {
            match pairs.iter().position(|(k, _)| k == key) {
                Some(first) => {
                    pairs[first].1 = value.clone();
                    let mut index = 0;
                    pairs.retain(|(k, _)| {
                        let keep = index <= first || k != key;
                        index += 1;
                        keep
                    });
                }
                None => pairs.push((key.clone(), value.clone())),
            }
        }

        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }

    Ok(escape_reserved(url.as_str()))
}

fn escape_reserved(url: &str) -> String {
    url.replace('(', "%28")
        .replace(')', "%29")
        .replace('!', "%21")
        .replace('*', "%2A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("https://badgr.example.com/v1/").unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_relative_path_resolution() {
        let url = make_url(&endpoint(), "issuers/abc", &[]).unwrap();
        assert_eq!(url, "https://badgr.example.com/v1/issuers/abc");

        let url = make_url(&endpoint(), "/other", &[]).unwrap();
        assert_eq!(url, "https://badgr.example.com/other");
    }

    #[test]
    fn test_query_merge_keeps_existing_keys() {
        let base = Url::parse("https://x/").unwrap();
        let url = make_url(&base, "y?b=2", &pairs(&[("a", "1")])).unwrap();
        assert_eq!(url, "https://x/y?b=2&a=1");
    }

    #[test]
    fn test_query_merge_overwrites_in_place() {
        let base = Url::parse("https://x/").unwrap();
        let url = make_url(&base, "y?b=2&c=3", &pairs(&[("b", "9"), ("d", "4")])).unwrap();
        assert_eq!(url, "https://x/y?b=9&c=3&d=4");
    }

    #[test]
    fn test_repeated_existing_keys_preserved() {
        let base = Url::parse("https://x/").unwrap();
        let url = make_url(&base, "y?tag=a&tag=b", &pairs(&[("page", "2")])).unwrap();
        assert_eq!(url, "https://x/y?tag=a&tag=b&page=2");
    }

    #[test]
    fn test_supplied_key_replaces_all_repeats() {
        let base = Url::parse("https://x/").unwrap();
        let url = make_url(&base, "y?tag=a&b=1&tag=b", &pairs(&[("tag", "c")])).unwrap();
        assert_eq!(url, "https://x/y?tag=c&b=1");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let url = make_url(&endpoint(), "search", &pairs(&[("q", "a&b=c")])).unwrap();
        assert_eq!(url, "https://badgr.example.com/v1/search?q=a%26b%3Dc");
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let url = make_url(&endpoint(), "badges/(new)!*", &[]).unwrap();
        assert_eq!(url, "https://badgr.example.com/v1/badges/%28new%29%21%2A");
    }

    #[test]
    fn test_reserved_characters_escaped_in_query() {
        let url = make_url(&endpoint(), "search", &pairs(&[("q", "star*")])).unwrap();
        assert_eq!(url, "https://badgr.example.com/v1/search?q=star%2A");
    }

    #[test]
    fn test_no_query_leaves_url_untouched() {
        let url = make_url(&endpoint(), "a?x=1", &[]).unwrap();
        assert_eq!(url, "https://badgr.example.com/v1/a?x=1");
    }
}
