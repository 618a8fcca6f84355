//! Local classification of bearer tokens.
//!
//! The client never holds the signing secret, so the signature segment is
//! not checked here. The server stays the authority for request-level
//! authorization; this module only answers "is it worth showing a protected
//! view right now".

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Number of `.`-separated segments in a signed token (header, payload, signature)
const TOKEN_SEGMENTS: usize = 3;

/// Name of the expiry claim, in seconds since the Unix epoch
const EXPIRY_CLAIM: &str = "exp";

/// base64url engine that accepts the payload with or without `=` padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Outcome of validating a credential token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// No token at all
    Absent,
    /// Decodes, and either has no expiry or expires in the future
    Valid,
    /// Decodes, but the expiry claim is at or before now
    Expired,
    /// Anything that does not decode into a claims object
    Malformed,
}

impl CredentialStatus {
    pub fn is_valid(self) -> bool {
        self == CredentialStatus::Valid
    }
}

/// Classify `token` against the current wall clock.
pub fn validate(token: &str) -> CredentialStatus {
    validate_at(token, Utc::now())
}

/// Classify `token` against a fixed point in time.
///
/// Total and side-effect free: every decode failure collapses into
/// [`CredentialStatus::Malformed`] instead of an error.
pub fn validate_at(token: &str, now: DateTime<Utc>) -> CredentialStatus {
    if token.is_empty() {
        return CredentialStatus::Absent;
    }

    let Some(claims) = decode_claims(token) else {
        return CredentialStatus::Malformed;
    };

    match claims.get(EXPIRY_CLAIM) {
        None | Some(Value::Null) => CredentialStatus::Valid,
        Some(exp) => match exp.as_f64() {
            Some(exp) if exp <= now_seconds(now) => CredentialStatus::Expired,
            Some(_) => CredentialStatus::Valid,
            None => CredentialStatus::Malformed,
        },
    }
}

/// Decode the payload segment into a JSON object, if it is one.
fn decode_claims(token: &str) -> Option<serde_json::Map<String, Value>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != TOKEN_SEGMENTS {
        return None;
    }

    let decoded = PAYLOAD_ENGINE.decode(segments[1]).ok()?;
    match serde_json::from_slice::<Value>(&decoded).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

fn now_seconds(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

// ============================================================================
// Tests
// ============================================================================
