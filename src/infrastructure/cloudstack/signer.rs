//! CloudStack API request signing
//!
//! CloudStack authenticates a request by recomputing an HMAC-SHA1 over the
//! request's own parameters. The canonical form is: parameters sorted by key,
//! each value percent-encoded with no safe characters, joined as
//! `key=value&...`, then lower-cased. The base64 digest travels as the
//! `signature` parameter and is never part of its own input.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Builds the lower-cased string that gets signed
pub fn canonical_query<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let sorted: BTreeMap<String, String> = params
        .into_iter()
        .map(|(key, value)| (key.as_ref().to_string(), value.as_ref().to_string()))
        .collect();

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
        .to_lowercase()
}

/// Computes the base64 HMAC-SHA1 signature for a parameter set
pub fn sign<I, K, V>(params: I, secret: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let message = canonical_query(params);

    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());

    STANDARD.encode(mac.finalize().into_bytes())
}
