//! One-shot notices carried across a redirect in a signed cookie.
//!
//! The cookie value is `base64url(json).hex(mac)` where the MAC is a keyed
//! BLAKE3 hash of the encoded payload. Anything that fails to verify or parse
//! is treated as "no notice".

use std::fmt;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the flash cookie.
pub const FLASH_COOKIE: &str = "rollcall_flash";

const KEY_CONTEXT: &str = "rollcall flash cookie v1";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

impl FlashKind {
    /// CSS class used when rendering.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Severity.
    pub kind: FlashKind,
    /// Text shown to the user.
    pub message: String,
}

impl Flash {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Signs and verifies flash cookies.
#[derive(Clone)]
pub struct FlashSigner {
    key: [u8; 32],
}

impl fmt::Debug for FlashSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashSigner").finish_non_exhaustive()
    }
}

impl FlashSigner {
    /// Derive the signing key from a configured secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
        }
    }

    /// Use a random key. Notices do not survive a restart.
    #[must_use]
    pub fn random() -> Self {
        Self {
            key: rand::random(),
        }
    }

    /// Encode and sign `flash` as a cookie value.
    ///
    /// # Errors
    ///
    /// Returns an error if the notice cannot be serialized.
    pub fn encode(&self, flash: &Flash) -> Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(flash)?);
        let mac = blake3::keyed_hash(&self.key, payload.as_bytes());
        Ok(format!("{payload}.{}", mac.to_hex()))
    }

    /// Verify and decode a cookie value.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<Flash> {
        let (payload, mac) = value.split_once('.')?;
        let mac = blake3::Hash::from_hex(mac).ok()?;
        // `Hash` equality is constant time.
        if blake3::keyed_hash(&self.key, payload.as_bytes()) != mac {
            return None;
        }
        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// `Set-Cookie` value carrying `flash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the notice cannot be serialized.
    pub fn set_cookie(&self, flash: &Flash) -> Result<String> {
        Ok(format!(
            "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.encode(flash)?
        ))
    }

    /// Read and verify the flash cookie from request headers.
    #[must_use]
    pub fn take(&self, headers: &HeaderMap) -> Option<Flash> {
        cookie_value(headers, FLASH_COOKIE).and_then(|value| self.decode(value))
    }
}

/// `Set-Cookie` value that deletes the flash cookie.
#[must_use]
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Whether the request carries a flash cookie at all.
#[must_use]
pub fn has_cookie(headers: &HeaderMap) -> bool {
    cookie_value(headers, FLASH_COOKIE).is_some()
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
