//! Request pipeline for the backend API.
//!
//! This module provides the `ApiClient`, which attaches the stored credential
//! to every request and turns every response or transport failure into one
//! `ResponseOutcome`. Notifications and forced redirects are emitted as
//! `Effect` values for the application to carry out.
//!
//! The backend authenticates with a raw JWT in the `jwt` header and wraps
//! every payload in a `{code, msg, data}` envelope.

pub mod account;
pub mod client;
pub mod effects;
pub mod envelope;
pub mod error;

pub use account::{LoginResponse, UserProfile};
pub use client::{
    classify_response, ApiClient, FALLBACK_MESSAGE, TOKEN_HEADER, UNREACHABLE_MESSAGE,
};
pub use effects::{effect_channel, Effect, EffectSender, Severity};
pub use envelope::{ResponseEnvelope, SUCCESS_CODE};
pub use error::{ApiError, ResponseOutcome};
