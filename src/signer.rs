use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{ProxyError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Sign a string-to-sign with the account secret.
///
/// The vendor keys the MAC with `secret + "&"` and expects the raw digest
/// Base64 encoded with the padded standard alphabet.
pub fn sign(secret: &str, string_to_sign: &str) -> Result<String> {
    let signing_key = format!("{}&", secret);
    hmac_sha1_base64(signing_key.as_bytes(), string_to_sign.as_bytes())
}

fn hmac_sha1_base64(key: &[u8], message: &[u8]) -> Result<String> {
    let mut mac =
        HmacSha1::new_from_slice(key).map_err(|e| ProxyError::Crypto(e.to_string()))?;
    mac.update(message);
    let digest = mac.finalize().into_bytes();
    Ok(STANDARD.encode(digest))
}
