use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of a descriptor that matches any location no other descriptor does
pub const CATCH_ALL: &str = "*";

/// One entry of the route table, as declared by the application.
///
/// `requires_auth` left unset means the route is protected. Children do not
/// inherit it from their parent; each descriptor is judged on its own flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDescriptor>,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            requires_auth: None,
            redirect: None,
            children: Vec::new(),
        }
    }

    pub fn catch_all() -> Self {
        Self::new(CATCH_ALL)
    }

    pub fn public(mut self) -> Self {
        self.requires_auth = Some(false);
        self
    }

    pub fn protected(mut self) -> Self {
        self.requires_auth = Some(true);
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteDescriptor>) -> Self {
        self.children = children;
        self
    }

    /// Effective flag, closed by default
    pub fn requires_auth(&self) -> bool {
        self.requires_auth.unwrap_or(true)
    }
}

/// A descriptor flattened to its full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub requires_auth: bool,
    pub redirect: Option<String>,
    depth: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("Fallback route {0} is not declared in the route table")]
    FallbackMissing(String),

    #[error("Fallback route {0} requires authentication, redirects to it would loop")]
    FallbackProtected(String),

    #[error("Fallback route {0} redirects elsewhere")]
    FallbackRedirects(String),
}

/// Lookup structure over a tree of [`RouteDescriptor`]s.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
    catch_all: Option<ResolvedRoute>,
    fallback: String,
}

impl RouteTable {
    /// Build the table, checking that `fallback` is a public, non-redirecting
    /// route so that a guard redirect to it always settles.
    pub fn new(
        descriptors: Vec<RouteDescriptor>,
        fallback: &str,
    ) -> Result<Self, RouteTableError> {
        let mut routes = Vec::new();
        let mut catch_all = None;
        flatten(&descriptors, "", 0, &mut routes, &mut catch_all);

        let table = Self {
            routes,
            catch_all,
            fallback: normalize_path(fallback),
        };

        let route = table
            .find(&table.fallback)
            .ok_or_else(|| RouteTableError::FallbackMissing(table.fallback.clone()))?;
        if route.requires_auth {
            return Err(RouteTableError::FallbackProtected(table.fallback.clone()));
        }
        if route.redirect.is_some() {
            return Err(RouteTableError::FallbackRedirects(table.fallback.clone()));
        }

        Ok(table)
    }

    /// Public destination used when a protected route is denied
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Find the route for `target`, falling back to the catch-all.
    pub fn resolve(&self, target: &str) -> Option<&ResolvedRoute> {
        let path = normalize_path(target);
        self.find(&path).or(self.catch_all.as_ref())
    }

    /// Flag for `target`; locations nothing matches are protected
    pub fn requires_auth(&self, target: &str) -> bool {
        self.resolve(target).map_or(true, |route| route.requires_auth)
    }

    /// All declared routes with their full paths, catch-all excluded
    pub fn routes(&self) -> impl Iterator<Item = &ResolvedRoute> {
        self.routes.iter()
    }

    /// Exact match; the deepest descriptor wins so an empty child path
    /// shadows its parent, otherwise declaration order decides.
    fn find(&self, path: &str) -> Option<&ResolvedRoute> {
        self.routes
            .iter()
            .filter(|route| route.path == path)
            .fold(None, |best: Option<&ResolvedRoute>, route| match best {
                Some(best) if best.depth >= route.depth => Some(best),
                _ => Some(route),
            })
    }
}

fn flatten(
    descriptors: &[RouteDescriptor],
    parent: &str,
    depth: usize,
    routes: &mut Vec<ResolvedRoute>,
    catch_all: &mut Option<ResolvedRoute>,
) {
    for descriptor in descriptors {
        if descriptor.path == CATCH_ALL {
            if catch_all.is_none() {
                *catch_all = Some(ResolvedRoute {
                    path: CATCH_ALL.to_string(),
                    requires_auth: descriptor.requires_auth(),
                    redirect: descriptor.redirect.clone(),
                    depth,
                });
            }
            continue;
        }

        let path = join_path(parent, &descriptor.path);
        routes.push(ResolvedRoute {
            path: path.clone(),
            requires_auth: descriptor.requires_auth(),
            redirect: descriptor.redirect.as_deref().map(normalize_path),
            depth,
        });
        flatten(&descriptor.children, &path, depth + 1, routes, catch_all);
    }
}

/// Resolve a child path against its parent's full path
fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        normalize_path(child)
    } else if child.is_empty() {
        normalize_path(parent)
    } else {
        normalize_path(&format!("{}/{}", parent.trim_end_matches('/'), child))
    }
}

/// Drop query and fragment, force a leading slash, drop a trailing one.
pub fn normalize_path(target: &str) -> String {
    let path = target
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default()
        .trim();

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}
