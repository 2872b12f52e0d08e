//! Explicit route tables.
//!
//! No routes are discovered at runtime: each entity kind builds a
//! [`RouteTable`] in code - a list of (method, path, operation) tuples -
//! and hands it to the host router through [`OperationRouter`]. The host
//! owns path matching and parameter extraction; the engine owns the
//! operations.

use std::fmt;

/// HTTP-shaped method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read one resource or a listing.
    Get,
    /// Create a resource, or run a named task with a `task` query
    /// parameter.
    Post,
    /// Replace a resource wholesale.
    Put,
    /// Patch a resource. Same engine path as Put: full overwrite.
    Patch,
    /// Delete a resource.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// The engine operation a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `EntityEngine::get_all`.
    List,
    /// `EntityEngine::create`, or `EntityEngine::run_task` when the
    /// request carries a `task` query parameter.
    Create,
    /// `EntityEngine::get_by_id`.
    GetById,
    /// `EntityEngine::replace`.
    ReplaceById,
    /// `EntityEngine::patch` (full overwrite).
    PatchById,
    /// `EntityEngine::delete`.
    DeleteById,
    /// `EntityEngine::get_all_links` for one declared link.
    ListLinks {
        /// The link name.
        link: String,
    },
    /// `EntityEngine::link_create`.
    CreateLink {
        /// The link name.
        link: String,
    },
    /// `EntityEngine::link_update`.
    UpdateLink {
        /// The link name.
        link: String,
    },
    /// `EntityEngine::delete_link`.
    DeleteLink {
        /// The link name.
        link: String,
    },
}

/// One bindable route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Method to match.
    pub method: Method,
    /// Path template; `{id}` and `{instance}` are host-extracted
    /// parameters.
    pub path: String,
    /// Operation to dispatch to.
    pub operation: Operation,
}

/// The full route set of one entity kind.
#[derive(Debug, Clone)]
pub struct RouteTable {
    kind: String,
    base: String,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Builds the CRUD routes of a kind under its base path
    /// (`/api/<kind>`).
    #[must_use]
    pub fn crud(kind: &str) -> Self {
        let base = format!("/api/{kind}");
        let routes = vec![
            Route {
                method: Method::Get,
                path: base.clone(),
                operation: Operation::List,
            },
            Route {
                method: Method::Post,
                path: base.clone(),
                operation: Operation::Create,
            },
            Route {
                method: Method::Get,
                path: format!("{base}/{{id}}"),
                operation: Operation::GetById,
            },
            Route {
                method: Method::Put,
                path: format!("{base}/{{id}}"),
                operation: Operation::ReplaceById,
            },
            Route {
                method: Method::Patch,
                path: format!("{base}/{{id}}"),
                operation: Operation::PatchById,
            },
            Route {
                method: Method::Delete,
                path: format!("{base}/{{id}}"),
                operation: Operation::DeleteById,
            },
        ];
        Self {
            kind: kind.to_string(),
            base,
            routes,
        }
    }

    /// Appends the routes addressing one declared link.
    #[must_use]
    pub fn link(mut self, link: &str) -> Self {
        let base = &self.base;
        self.routes.push(Route {
            method: Method::Get,
            path: format!("{base}/{{id}}/{link}"),
            operation: Operation::ListLinks {
                link: link.to_string(),
            },
        });
        for (method, operation) in [
            (
                Method::Post,
                Operation::CreateLink {
                    link: link.to_string(),
                },
            ),
            (
                Method::Put,
                Operation::UpdateLink {
                    link: link.to_string(),
                },
            ),
            (
                Method::Delete,
                Operation::DeleteLink {
                    link: link.to_string(),
                },
            ),
        ] {
            self.routes.push(Route {
                method,
                path: format!("{base}/{{id}}/{link}/{{instance}}"),
                operation,
            });
        }
        self
    }

    /// Returns the kind this table belongs to.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Hands every route to the host router.
    pub fn mount(&self, router: &mut dyn OperationRouter) {
        for route in &self.routes {
            tracing::debug!(kind = %self.kind, method = %route.method, path = %route.path, "mounting");
            router.bind(&self.kind, route);
        }
    }
}

/// The one primitive the engine requires from its host router: bind a
/// handler to a method and path. Parameter extraction and JSON
/// serialization stay on the host side.
pub trait OperationRouter {
    /// Binds one route of one kind.
    fn bind(&mut self, kind: &str, route: &Route);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crud_table_shape() {
        let table = RouteTable::crud("nodes");
        assert_eq!(table.routes().len(), 6);
        assert_eq!(table.routes()[0].path, "/api/nodes");
        assert_eq!(table.routes()[2].path, "/api/nodes/{id}");
        assert_eq!(table.routes()[4].operation, Operation::PatchById);
    }

    #[test]
    fn link_routes_address_one_instance() {
        let table = RouteTable::crud("nodes").link("ref");
        let paths: Vec<_> = table.routes().iter().map(|r| r.path.as_str()).collect();
        assert!(paths.contains(&"/api/nodes/{id}/ref"));
        assert!(paths.contains(&"/api/nodes/{id}/ref/{instance}"));
        assert_eq!(table.routes().len(), 10);
    }

    #[test]
    fn mount_hands_every_route_to_the_host() {
        struct Recorder(Vec<String>);
        impl OperationRouter for Recorder {
            fn bind(&mut self, kind: &str, route: &Route) {
                self.0.push(format!("{} {} {}", kind, route.method, route.path));
            }
        }

        let table = RouteTable::crud("nodes").link("ref");
        let mut recorder = Recorder(Vec::new());
        table.mount(&mut recorder);
        assert_eq!(recorder.0.len(), table.routes().len());
        assert!(recorder.0[0].starts_with("nodes GET /api/nodes"));
    }
}
