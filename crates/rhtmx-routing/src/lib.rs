//! # RHTMX Routing
//!
//! A bidirectional URL routing engine:
//! - Parsing: request path → controller, action, named and passed parameters
//! - Generation: parameters → path, through the same ordered route list
//!
//! ## Route Templates
//!
//! - Literal segments: `/pages`
//! - Placeholders: `/:controller/:action`, with per-name regex constraints
//! - Custom separators between placeholders: `/posts/:id-:title`
//! - Trailing greedy segments: `/pages/*` (segment list) and `/docs/**` (raw remainder)
//! - HTTP method constraints through the `[method]` default
//!
//! ## Router Façade
//!
//! The [`Router`] owns the routes plus prefixes (`admin`), extension parsing,
//! REST resource mapping and the request-context stack used to resolve
//! relative URLs. It is plain data: build one at startup, then share it
//! read-only.
//!
//! ## Example
//!
//! ```
//! use rhtmx_routing::{Params, RouteOptions, Router};
//!
//! let mut router = Router::new();
//! router
//!     .connect("/:controller/:action/:id", Params::new(), RouteOptions::new().with_pattern("id", "ID"))
//!     .unwrap();
//!
//! let params = router.parse("/posts/view/5").unwrap();
//! assert_eq!(params.controller(), Some("posts"));
//! assert_eq!(params.text("id"), Some("5"));
//!
//! let url = Params::new().with("controller", "posts").with("action", "edit").with("id", 5);
//! assert_eq!(router.url(url, false).as_deref(), Some("/posts/edit/5"));
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod collection;
pub mod config;
mod constraint;
mod error;
pub mod path;
pub mod request;
pub mod resource;
pub mod route;
pub mod router;
mod value;

// Re-export public types
pub use collection::{RouteCollection, RouteMatch};
pub use config::{ConfigValue, RouteConfig, RouterConfig};
pub use constraint::{NamedExpressions, ACTION, DAY, ID, MONTH, UUID, YEAR};
pub use error::{Result, RouterError};
pub use path::{normalize_path, query_string, Query};
pub use request::RequestContext;
pub use resource::{default_resource_map, ResourceMapping};
pub use route::{
    CompiledRoute, Greedy, Redirect, RedirectTarget, Route, RouteKind, RouteOptions, METHOD_KEY,
};
pub use router::{
    ResourceOptions, RouteFactory, Router, UrlParams, UrlTarget, REDIRECT_ROUTE_CLASS,
    RESOURCE_ROUTE_CLASS, ROUTE_CLASS,
};
pub use value::{Params, Value};
