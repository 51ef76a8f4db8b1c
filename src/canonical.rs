//! Canonical query strings for the vendor's signature version 1.0.
//!
//! The vendor signs a sorted, percent-encoded rendering of the request
//! parameters. Encoding follows URI-component rules with three fixups
//! (`+` to `%20`, `*` to `%2A`, `%7E` to `~`); every one of them is needed
//! for the vendor to accept the signature.

pub const SIGNING_METHOD: &str = "GET";
pub const SIGNING_PATH: &str = "/";

/// Percent-encode a single key or value. `None` encodes to the empty string.
pub fn percent_encode(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    uri_component_encode(value)
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

fn uri_component_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        if matches!(byte,
            b'A'..=b'Z'
                | b'a'..=b'z'
                | b'0'..=b'9'
                | b'-'
                | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
        ) {
            encoded.push(byte as char);
        } else {
            encoded.push('%');
            encoded.push_str(&format!("{:02X}", byte));
        }
    }
    encoded
}

/// Build the canonical query string from an unordered parameter mapping.
///
/// Entries without a value are dropped, the rest are sorted by raw key text
/// and joined as `key=value` pairs with `&`.
pub fn canonical_query_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut present: Vec<(K, V)> = params
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect();
    present.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    present
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                percent_encode(Some(key.as_ref())),
                percent_encode(Some(value.as_ref()))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, path: &str, canonical_query: &str) -> String {
    format!(
        "{}&{}&{}",
        method,
        percent_encode(Some(path)),
        percent_encode(Some(canonical_query))
    )
}
