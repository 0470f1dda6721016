//! Cache key construction for memoized GET responses.

use sha2::{Digest, Sha256};

/// Marks response cache keys apart from any other use of the store.
pub const KEY_PREFIX: &str = "__mcache_";

/// Order-independent digest of query parameter values.
///
/// Parameters are sorted by name, their values concatenated, and the result
/// hashed, so `?a=1&b=2` and `?b=2&a=1` produce the same digest.
pub fn query_digest<'a, I>(query: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = query.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));

    let concatenated: String = pairs.iter().map(|(_, value)| *value).collect();
    format!("{:x}", Sha256::digest(concatenated.as_bytes()))
}

/// `<prefix><base_url><path>?q=<digest>`
pub fn key<'a, I>(base_url: &str, path: &str, query: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    format!("{}{}{}?q={}", KEY_PREFIX, base_url, path, query_digest(query))
}
