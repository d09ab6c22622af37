//! Signed, URL-safe unsubscribe tokens.
//!
//! A token is `base64url(payload) + "." + base64url(HMAC-SHA256(payload))`
//! where `payload` is the JSON document `{"email":"<normalized email>"}`.
//! Both segments are unpadded. Tokens carry no expiry and no nonce: the same
//! email always signs to the same token, and it stays valid for as long as
//! the secret does.
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::normalized_email::normalize_email;

type HmacSha256 = Hmac<Sha256>;

/// URL-safe alphabet, no padding on encode, padding optional on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    email: String,
}

/// Signs and verifies unsubscribe tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl TokenCodec {
    pub fn new(secret: Secret<String>) -> TokenCodec {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .expect("HMAC can take a key of any size");

        TokenCodec { mac }
    }

    /// Normalizes `email` and signs it.
    pub fn sign(&self, email: &str) -> String {
        let payload = TokenPayload {
            email: normalize_email(email),
        };
        // A struct with a single string field always serializes.
        let payload = serde_json::to_vec(&payload).unwrap_or_default();
        let signature = self.signature(&payload);

        format!(
            "{}.{}",
            TOKEN_ENGINE.encode(&payload),
            TOKEN_ENGINE.encode(signature)
        )
    }

    /// Returns the email embedded in `token` when its signature is valid.
    ///
    /// Every failure (bad encoding, bad JSON, missing email, wrong signature)
    /// yields `None` so callers cannot tell them apart.
    pub fn verify(&self, token: &str) -> Option<String> {
        let (payload_segment, signature_segment) = token.split_once('.')?;
        let payload = TOKEN_ENGINE.decode(payload_segment).ok()?;
        let signature = TOKEN_ENGINE.decode(signature_segment).ok()?;
        let parsed: TokenPayload = serde_json::from_slice(&payload).ok()?;

        if parsed.email.is_empty() {
            return None;
        }

        let mut mac = self.mac.clone();
        mac.update(&payload);
        // Constant time, and rejects tags of the wrong length.
        mac.verify_slice(&signature).ok()?;

        Some(parsed.email)
    }

    fn signature(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
