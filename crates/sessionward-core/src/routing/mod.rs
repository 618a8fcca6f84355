//! Navigation gating.
//!
//! This module provides:
//! - `RouteTable`: the declared routes, with per-route `requires_auth` flags
//!   that default to protected
//! - `NavigationGuard`: a pure allow/redirect decision per transition
//! - `Navigator`: the single choke point that runs the guard for every
//!   transition, redirects included

pub mod guard;
pub mod navigator;
pub mod routes;
pub mod table;

pub use guard::{GuardDecision, NavigationGuard};
pub use navigator::{Navigation, NavigationError, Navigator, MAX_REDIRECTS};
pub use routes::{application_routes, application_table, INTRODUCTION};
pub use table::{
    normalize_path, ResolvedRoute, RouteDescriptor, RouteTable, RouteTableError, CATCH_ALL,
};
