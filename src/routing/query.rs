//! URL query codec.
//!
//! # Responsibilities
//! - Decode `?a=1&b=two+words` into ordered [`Params`]
//! - Encode [`Params`] back into a query component
//!
//! # Design Decisions
//! - An empty chunk (`?a=1&&b=2`, `?&a`, `?`) makes the whole query absent
//!   instead of being skipped; callers see "no query", never an error
//! - `+` decodes to a space before percent-decoding (form encoding)
//! - Malformed percent escapes are kept verbatim rather than rejected

use url::form_urlencoded;

use super::params::Params;

/// Decode a query string that starts with `?`.
///
/// Returns `None` when the input does not start with `?` or contains an
/// empty chunk.
pub fn decode_query(query: &str) -> Option<Params> {
    let body = query.strip_prefix('?')?;

    let mut params = Params::new();
    for chunk in body.split('&') {
        if chunk.is_empty() {
            return None;
        }
        // A chunk holds no '&', so the parser yields exactly one pair split
        // on the first '='.
        let (key, value) = form_urlencoded::parse(chunk.as_bytes()).next()?;
        params.insert(key.into_owned(), value.into_owned());
    }
    Some(params)
}

/// Encode a query component including the leading `?`.
///
/// An empty map encodes to the empty string.
pub fn encode_query(params: &Params) -> String {
    if params.is_empty() {
        return String::new();
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    format!("?{encoded}")
}
