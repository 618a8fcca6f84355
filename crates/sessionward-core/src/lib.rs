//! Client-side session authorization.
//!
//! Decides, for every navigation and every outgoing request, whether the
//! stored credential is present and still usable, and turns every request
//! failure into one notification (plus a forced redirect when the server
//! rejects the credential).
//!
//! - [`auth`]: credential store, durable backends, token validation
//! - [`api`]: the request pipeline and its effect channel
//! - [`routing`]: route table, navigation guard, navigator
//! - [`context`]: wiring of the above around one shared store

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod routing;

pub use api::{ApiClient, ApiError, Effect, ResponseOutcome, Severity};
pub use auth::{CredentialPatch, CredentialRecord, CredentialStatus, CredentialStore};
pub use config::Config;
pub use context::SessionContext;
pub use routing::{GuardDecision, NavigationGuard, Navigator, RouteDescriptor, RouteTable};
