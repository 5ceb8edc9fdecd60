//! Request signing for `zonai.skland.com`.
//!
//! The signature is `md5(hex(hmac_sha256(sign_token, path + payload + ts + header)))`
//! where `header` is the compact JSON of the public signing headers.

use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use super::error::SklandError;

type HmacSha256 = Hmac<Sha256>;

/// Seconds subtracted from the local clock; the server rejects timestamps
/// slightly ahead of its own.
const CLOCK_SKEW_SECS: i64 = 2;

/// Headers attached to every signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub sign: String,
    pub timestamp: String,
}

impl SignedHeaders {
    pub fn as_pairs<'a>(&'a self, cred: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("cred", cred),
            ("sign", self.sign.as_str()),
            ("platform", ""),
            ("timestamp", self.timestamp.as_str()),
            ("dId", ""),
            ("vName", ""),
        ]
    }
}

pub fn current_timestamp() -> String {
    (chrono::Utc::now().timestamp() - CLOCK_SKEW_SECS).to_string()
}

/// Signs a request for `path`; `payload` is the query string for GET or the
/// JSON body for POST.
pub fn sign_request(
    sign_token: &str,
    path: &str,
    payload: &str,
    timestamp: &str,
) -> Result<SignedHeaders, SklandError> {
    let header = format!(
        r#"{{"platform":"","timestamp":"{timestamp}","dId":"","vName":""}}"#
    );
    let message = format!("{path}{payload}{timestamp}{header}");

    let mut mac = HmacSha256::new_from_slice(sign_token.as_bytes())
        .map_err(|e| SklandError::Sign(e.to_string()))?;
    mac.update(message.as_bytes());
    let hmac_hex = to_hex(&mac.finalize().into_bytes());

    let digest = Md5::digest(hmac_hex.as_bytes());

    Ok(SignedHeaders {
        sign: to_hex(&digest),
        timestamp: timestamp.to_string(),
    })
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
