// --- File: crates/paddle_gateway/src/signature.rs ---
//! Webhook signature verification.
//!
//! Paddle signs every webhook: all form fields except `p_signature` are
//! sorted by key, serialized in PHP's `serialize()` format, and signed with
//! the vendor's RSA key over a SHA-1 digest. Both the serialization format
//! and the digest algorithm are fixed by the provider; reproducing them
//! byte-for-byte is what makes verification interoperate.

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use tracing::warn;

/// Field carrying the base64 signature on inbound webhooks.
pub const SIGNATURE_FIELD: &str = "p_signature";

/// Trusted decision about one inbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Signature is cryptographically valid for the received fields.
    Verified,
    /// Signature missing, malformed or wrong; includes verification-engine
    /// errors. Fails closed.
    Unverified,
    /// No vendor public key available. Distinct from `Unverified` so callers
    /// can alert on misconfiguration rather than suspected forgery.
    ConfigurationError,
}

/// One inbound payment notification, split into the signature and the fields
/// it covers.
///
/// The field map is ordered by key, matching PHP's `ksort()` on the signing
/// side regardless of the insertion order of the incoming request.
#[derive(Debug, Clone)]
pub struct WebhookNotification {
    fields: BTreeMap<String, String>,
    signature: Option<String>,
}

impl WebhookNotification {
    /// Builds a notification from decoded form pairs, extracting
    /// `p_signature` out of the field set. Later duplicates of a key win,
    /// like PHP's superglobal parsing.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = BTreeMap::new();
        let mut signature = None;
        for (key, value) in pairs {
            if key == SIGNATURE_FIELD {
                signature = Some(value);
            } else {
                fields.insert(key, value);
            }
        }
        Self { fields, signature }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Canonical byte serialization of the remaining fields (signature
    /// excluded), exactly as the provider signed them.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        php_serialize_fields(&self.fields)
    }
}

/// Serializes a sorted string map in PHP `serialize()` format:
/// `a:N:{s:<len>:"<key>";s:<len>:"<value>";...}` with `<len>` the byte length
/// of the UTF-8 encoding. No escaping; bytes go through verbatim.
pub fn php_serialize_fields(fields: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("a:{}:{{", fields.len()).as_bytes());
    for (key, value) in fields {
        php_serialize_str(&mut out, key);
        php_serialize_str(&mut out, value);
    }
    out.push(b'}');
    out
}

fn php_serialize_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(format!("s:{}:\"", s.len()).as_bytes());
    out.extend_from_slice(s.as_bytes());
    out.extend_from_slice(b"\";");
}

/// Decides whether `notification` genuinely originated from the vendor whose
/// PEM-encoded public key is given.
///
/// Pure function of its inputs; malformed input is an `Unverified` outcome,
/// never a panic.
pub fn verify(notification: &WebhookNotification, vendor_public_key: &str) -> VerificationOutcome {
    if vendor_public_key.trim().is_empty() {
        return VerificationOutcome::ConfigurationError;
    }

    let signature_b64 = match notification.signature() {
        Some(s) => s,
        None => {
            warn!("webhook carried no {} field", SIGNATURE_FIELD);
            return VerificationOutcome::Unverified;
        }
    };
    let signature = match base64_engine.decode(signature_b64) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("webhook signature is not valid base64: {err}");
            return VerificationOutcome::Unverified;
        }
    };

    let public_key = match RsaPublicKey::from_public_key_pem(vendor_public_key) {
        Ok(key) => key,
        Err(err) => {
            warn!("vendor public key did not parse as PEM: {err}");
            return VerificationOutcome::Unverified;
        }
    };

    let digest = Sha1::digest(notification.canonical_bytes());
    match public_key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature) {
        Ok(()) => VerificationOutcome::Verified,
        Err(_) => VerificationOutcome::Unverified,
    }
}
