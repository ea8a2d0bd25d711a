/// Ordered route collection
///
/// Connection order is match priority, in both directions. Only `promote`
/// reorders.

use tracing::{debug, trace};

use crate::route::{Redirect, Route};
use crate::value::Params;

/// Result of parsing a path: the matched route and its parameters
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Check if the matched route is a redirect
    pub fn is_redirect(&self) -> bool {
        self.route.redirect_target().is_some()
    }

    pub fn redirect(&self) -> Option<&'a Redirect> {
        self.route.redirect_target()
    }
}

/// Routes in match-priority order
///
/// # Examples
///
/// ```
/// use rhtmx_routing::{Params, Route, RouteCollection, RouteOptions};
///
/// let mut routes = RouteCollection::new();
/// routes.add(Route::new("/:controller", Params::new().with("action", "index"), RouteOptions::new()));
/// routes.add(Route::new("/login", Params::new().with("controller", "users").with("action", "login"), RouteOptions::new()));
///
/// assert_eq!(routes.parse("/login", None).unwrap().params.controller(), Some("login"));
///
/// assert!(routes.promote(None));
/// assert_eq!(routes.parse("/login", None).unwrap().params.controller(), Some("users"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Moves the route at `index` (default: the last one) to the front
    ///
    /// Returns `false` and leaves the order alone when `index` is out of range.
    pub fn promote(&mut self, index: Option<usize>) -> bool {
        let index = match index.or_else(|| self.routes.len().checked_sub(1)) {
            Some(index) if index < self.routes.len() => index,
            _ => return false,
        };

        let route = self.routes.remove(index);
        debug!(template = route.template(), from = index, "promoting route");
        self.routes.insert(0, route);
        true
    }

    /// First route that parses `url`
    pub fn parse(&self, url: &str, method: Option<&str>) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.parse(url, method).map(|params| {
                debug!(url, template = route.template(), "parsed");
                RouteMatch { route, params }
            })
        })
    }

    /// First route able to generate a path for `url`
    ///
    /// Each route's persist list is applied against `current` before it is
    /// tried. An `_name` value restricts the search to routes of that name.
    pub fn match_url(&self, url: &Params, current: &Params) -> Option<String> {
        let mut url = url.clone();
        let name = url
            .remove("_name")
            .filter(|name| !name.is_blank())
            .map(|name| name.to_text().into_owned());

        self.routes
            .iter()
            .filter(|route| name.as_deref().map_or(true, |name| route.name() == name))
            .find_map(|route| {
                let candidate = if route.options().persist.is_empty() {
                    url.clone()
                } else {
                    route.persist_params(url.clone(), current)
                };
                match route.match_url(&candidate) {
                    Some(path) => {
                        debug!(template = route.template(), path = %path, "generated");
                        Some(path)
                    }
                    None => {
                        trace!(template = route.template(), "no match");
                        None
                    }
                }
            })
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Names of all routes, in order
    pub fn names(&self) -> Vec<String> {
        self.routes.iter().map(Route::name).collect()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteOptions;

    fn route(template: &str) -> Route {
        Route::new(template, Params::new(), RouteOptions::new())
    }

    #[test]
    fn test_promote_out_of_range() {
        let mut routes = RouteCollection::new();
        assert!(!routes.promote(None));

        routes.add(route("/a"));
        routes.add(route("/b"));
        assert!(!routes.promote(Some(2)));
        assert_eq!(routes.get(0).unwrap().template(), "/a");

        assert!(routes.promote(Some(1)));
        assert_eq!(routes.get(0).unwrap().template(), "/b");
        assert_eq!(routes.get(1).unwrap().template(), "/a");
    }

    #[test]
    fn test_named_generation_skips_other_routes() {
        let mut routes = RouteCollection::new();
        routes.add(Route::new(
            "/:controller/:action",
            Params::new(),
            RouteOptions::new(),
        ));
        routes.add(Route::new(
            "/articles/:action",
            Params::new().with("controller", "posts"),
            RouteOptions::new().with_name("articles"),
        ));

        let url = Params::new().with("controller", "posts").with("action", "view");
        assert_eq!(routes.match_url(&url, &Params::new()).as_deref(), Some("/posts/view"));

        let named = url.clone().with("_name", "articles");
        assert_eq!(routes.match_url(&named, &Params::new()).as_deref(), Some("/articles/view"));

        let unknown = url.with("_name", "missing");
        assert_eq!(routes.match_url(&unknown, &Params::new()), None);
    }
}
