/// Router façade
///
/// Owns the route collection together with everything that shapes how routes
/// are connected and how URLs are built: prefixes, named expressions,
/// extension parsing, the REST resource map, custom route classes and the
/// stack of request contexts. No global state; build one per application (or
/// per test) and pass it to the dispatcher.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use heck::ToSnakeCase;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::collection::{RouteCollection, RouteMatch};
use crate::config::RouterConfig;
use crate::constraint::{NamedExpressions, ID, UUID};
use crate::error::{Result, RouterError};
use crate::path::{collapse_slashes, has_scheme, normalize_path, query_string, Query};
use crate::request::RequestContext;
use crate::resource::{default_resource_map, ResourceMapping};
use crate::route::{RedirectTarget, Route, RouteKind, RouteOptions, METHOD_KEY};
use crate::value::{Params, Value};

/// Built-in route class names
pub const ROUTE_CLASS: &str = "Route";
pub const REDIRECT_ROUTE_CLASS: &str = "RedirectRoute";
pub const RESOURCE_ROUTE_CLASS: &str = "ResourceRoute";

/// Builds a route for a custom route class
pub type RouteFactory = Arc<dyn Fn(&str, Params, RouteOptions) -> Route + Send + Sync>;

static EXTENSION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([0-9a-zA-Z]+)$").unwrap());

static DEFAULT_REQUEST: Lazy<RequestContext> = Lazy::new(RequestContext::default);

/// Keys dropped by `reverse` before regenerating a URL
const REVERSE_IGNORED: [&str; 8] = [
    "paging",
    "models",
    "url",
    "autoRender",
    "bare",
    "requested",
    "return",
    "_Token",
];

/// Parameter target for URL generation, with the non-routing parts split out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlParams {
    pub params: Params,
    pub query: Option<Query>,
    pub fragment: Option<String>,
    pub ext: Option<String>,
    pub full: bool,
}

impl UrlParams {
    pub fn new(params: Params) -> Self {
        Self::from(params)
    }

    pub fn with_query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }
}

/// Splits `ext`, `#`, `?` and `_full` out of a parameter set
impl From<Params> for UrlParams {
    fn from(mut params: Params) -> Self {
        let mut take = |key: &str| {
            params
                .remove(key)
                .filter(|value| !value.is_blank())
                .map(|value| value.to_text().into_owned())
        };
        let ext = take("ext");
        let fragment = take("#");
        let query = take("?").map(Query::Raw);
        let full = take("_full").is_some();

        Self {
            params,
            query,
            fragment,
            ext,
            full,
        }
    }
}

/// What `Router::url` generates from
#[derive(Debug, Clone, PartialEq)]
pub enum UrlTarget {
    /// The current request's path
    Here,
    /// A string URL, resolved without consulting routes
    Path(String),
    /// Parameters matched against the routes
    Params(UrlParams),
}

impl From<&str> for UrlTarget {
    fn from(url: &str) -> Self {
        if url.is_empty() {
            UrlTarget::Here
        } else {
            UrlTarget::Path(url.to_string())
        }
    }
}

impl From<String> for UrlTarget {
    fn from(url: String) -> Self {
        UrlTarget::from(url.as_str())
    }
}

impl From<Params> for UrlTarget {
    fn from(params: Params) -> Self {
        UrlTarget::Params(UrlParams::from(params))
    }
}

impl From<UrlParams> for UrlTarget {
    fn from(params: UrlParams) -> Self {
        UrlTarget::Params(params)
    }
}

/// Options for `Router::map_resources`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceOptions {
    /// URL prefix, e.g. `/api/`; defaults to `/` or `/<plugin>/`
    pub prefix: Option<String>,
    /// Constraint for `:id`; defaults to an integer or UUID
    pub id: Option<String>,
}

/// The routing registry
///
/// # Examples
///
/// ```
/// use rhtmx_routing::{Params, RouteOptions, Router};
///
/// let mut router = Router::new();
/// router.connect("/pages/*", Params::new().with("controller", "pages").with("action", "display"), RouteOptions::new()).unwrap();
/// router.connect("/:controller/:action/*", Params::new(), RouteOptions::new()).unwrap();
///
/// let params = router.parse("/pages/home").unwrap();
/// assert_eq!(params.action(), Some("display"));
/// assert_eq!(params.pass(), ["home".to_string()]);
///
/// let url = Params::new().with("controller", "pages").with("action", "display").with_pass("home");
/// assert_eq!(router.url(url, false).as_deref(), Some("/pages/home"));
/// ```
pub struct Router {
    routes: RouteCollection,
    initial: RouterConfig,
    prefixes: Vec<String>,
    named_expressions: NamedExpressions,
    parse_extensions: bool,
    extensions: Vec<String>,
    full_base_url: Option<String>,
    default_route_class: String,
    factories: HashMap<String, RouteFactory>,
    resource_map: Vec<ResourceMapping>,
    resource_mapped: Vec<String>,
    requests: Vec<RequestContext>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("prefixes", &self.prefixes)
            .field("parse_extensions", &self.parse_extensions)
            .field("extensions", &self.extensions)
            .field("default_route_class", &self.default_route_class)
            .field("route_classes", &self.factories.keys().collect::<Vec<_>>())
            .field("requests", &self.requests.len())
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let mut router = Self {
            routes: RouteCollection::new(),
            initial: RouterConfig::default(),
            prefixes: Vec::new(),
            named_expressions: NamedExpressions::default(),
            parse_extensions: false,
            extensions: Vec::new(),
            full_base_url: None,
            default_route_class: ROUTE_CLASS.to_string(),
            factories: HashMap::new(),
            resource_map: default_resource_map(),
            resource_mapped: Vec::new(),
            requests: Vec::new(),
        };
        router.reload();
        router
    }

    /// Builds a router from configuration and connects its declared routes
    ///
    /// The configuration (minus routes) becomes the `reload` snapshot.
    pub fn from_config(config: RouterConfig) -> Result<Self> {
        let mut router = Self::new();
        router.initial = config.without_routes();
        router.reload();

        if let Some(class) = &config.default_route_class {
            router.set_default_route_class(class)?;
        }

        for route in &config.routes {
            match &route.redirect {
                Some(target) => router.redirect(&route.template, target.as_str(), route.options())?,
                None => router.connect(&route.template, route.defaults(), route.options())?,
            }
        }
        Ok(router)
    }

    /// Resets routes, request stack and settings to the initial snapshot
    ///
    /// Registered route classes survive.
    pub fn reload(&mut self) {
        let initial = &self.initial;
        self.routes.clear();
        self.prefixes = initial.prefixes.clone();
        self.named_expressions = NamedExpressions::default();
        self.parse_extensions = initial.parse_extensions;
        self.extensions = initial.extensions.clone();
        self.full_base_url = initial.full_base_url.clone();
        self.default_route_class = initial
            .default_route_class
            .clone()
            .unwrap_or_else(|| ROUTE_CLASS.to_string());
        self.resource_map = default_resource_map();
        self.resource_mapped.clear();
        self.requests.clear();
    }

    /// Connects a route
    ///
    /// - A truthy prefix flag (`admin = true`) sets `prefix`; a falsy one is dropped
    /// - A new `prefix` is registered
    /// - `plugin` defaults to null, `action` to `index` unless constrained
    /// - Constraints naming a named expression (`"ID"`) are expanded
    pub fn connect(&mut self, template: &str, defaults: Params, options: RouteOptions) -> Result<()> {
        let mut defaults = defaults;
        let flag = self
            .prefixes
            .iter()
            .find(|prefix| defaults.contains(prefix))
            .cloned();
        if let Some(prefix) = flag {
            if defaults.get(&prefix).map_or(false, |value| !value.is_blank()) {
                defaults.insert("prefix", prefix);
            } else {
                defaults.remove(&prefix);
            }
        }
        if let Some(prefix) = defaults.prefix() {
            if !self.prefixes.iter().any(|known| known == prefix) {
                self.prefixes.push(prefix.to_string());
            }
        }
        defaults.insert_if_absent("plugin", Value::Null);
        if options.patterns.get("action").map_or(true, String::is_empty) {
            defaults.insert_if_absent("action", "index");
        }

        let mut options = options;
        options.patterns = options
            .patterns
            .into_iter()
            .map(|(name, pattern)| {
                let expanded = self.named_expressions.expand(&pattern).to_string();
                (name, expanded)
            })
            .collect();

        let class = match &options.route_class {
            Some(class) => class.clone(),
            None if defaults.get("redirect").map_or(false, |value| !value.is_blank()) => {
                REDIRECT_ROUTE_CLASS.to_string()
            }
            None => self.default_route_class.clone(),
        };
        let class = class.split_once('.').map_or(class.as_str(), |(_, name)| name);

        let route = self.build_route(class, template, defaults, options)?;
        debug!(template, class, name = %route.name(), "connected route");
        self.routes.add(route);
        Ok(())
    }

    fn build_route(
        &self,
        class: &str,
        template: &str,
        defaults: Params,
        options: RouteOptions,
    ) -> Result<Route> {
        match class {
            ROUTE_CLASS => Ok(Route::new(template, defaults, options)),
            RESOURCE_ROUTE_CLASS => {
                Ok(Route::new(template, defaults, options).with_kind(RouteKind::Resource))
            }
            REDIRECT_ROUTE_CLASS => {
                let mut defaults = defaults;
                let target = match defaults.remove("redirect") {
                    Some(url) if !url.is_blank() => RedirectTarget::Url(url.to_text().into_owned()),
                    _ => RedirectTarget::Params(defaults.clone()),
                };
                Ok(Route::redirect(template, defaults, options, target))
            }
            custom => self
                .factories
                .get(custom)
                .map(|factory| factory(template, defaults, options))
                .ok_or_else(|| RouterError::UnknownRouteClass(custom.to_string())),
        }
    }

    /// Connects a redirect route
    ///
    /// A string target is sent as-is; a parameter target goes through URL
    /// generation when the redirect is resolved.
    pub fn redirect(
        &mut self,
        template: &str,
        target: impl Into<RedirectTarget>,
        options: RouteOptions,
    ) -> Result<()> {
        let options = options.with_route_class(REDIRECT_ROUTE_CLASS);
        match target.into() {
            RedirectTarget::Url(url) => self.connect(template, Params::new().with("redirect", url), options),
            RedirectTarget::Params(params) => self.connect(template, params, options),
        }
    }

    /// Connects the REST routes for each controller (`Posts` or `Plugin.Posts`)
    ///
    /// Returns every controller mapped so far.
    pub fn map_resources<I, S>(&mut self, controllers: I, options: ResourceOptions) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| format!("{}|{}", ID, UUID));

        for controller in controllers {
            let controller = controller.as_ref();
            let (plugin, name) = match controller.split_once('.') {
                Some((plugin, name)) => (Some(plugin.to_snake_case()), name),
                None => (None, controller),
            };
            let url_name = name.to_snake_case();
            let prefix = match (&options.prefix, &plugin) {
                (Some(prefix), _) => prefix.clone(),
                (None, Some(plugin)) => format!("/{}/", plugin),
                (None, None) => "/".to_string(),
            };

            for mapping in self.resource_map.clone() {
                let template = format!(
                    "{}{}{}",
                    prefix,
                    url_name,
                    if mapping.id { "/:id" } else { "" }
                );
                let defaults = Params::new()
                    .with("plugin", plugin.clone())
                    .with("controller", url_name.as_str())
                    .with("action", mapping.action)
                    .with(METHOD_KEY, mapping.method);
                let route_options = RouteOptions::new()
                    .with_pattern("id", id.as_str())
                    .with_pass(["id"])
                    .with_route_class(RESOURCE_ROUTE_CLASS);
                self.connect(&template, defaults, route_options)?;
            }
            self.resource_mapped.push(url_name);
        }
        Ok(self.resource_mapped.clone())
    }

    /// Parses a path with the current request's method
    pub fn parse(&self, url: &str) -> Option<Params> {
        let method = self.requests.last().and_then(|ctx| ctx.method.as_deref());
        self.parse_route(url, method).map(|matched| matched.params)
    }

    /// Parses a path and returns the matched route with its parameters
    ///
    /// Strips the query string and, when enabled, the extension. A matched
    /// `prefix` turns the action into `<prefix>_<action>`.
    pub fn parse_route(&self, url: &str, method: Option<&str>) -> Option<RouteMatch<'_>> {
        let url = match url.split_once('?') {
            Some((path, _)) => path,
            None => url,
        };
        let url: Cow<'_, str> = if !url.is_empty() && !url.starts_with('/') {
            Cow::Owned(format!("/{}", url))
        } else {
            Cow::Borrowed(url)
        };
        let (path, ext) = self.split_extension(&url);

        let mut matched = self.routes.parse(path, method)?;
        let prefixed = matched
            .params
            .prefix()
            .map(|prefix| format!("{}_{}", prefix, matched.params.action().unwrap_or_default()));
        if let Some(action) = prefixed {
            matched.params.insert("action", action);
        }
        if let Some(ext) = ext {
            matched.params.insert_if_absent("ext", ext);
        }
        Some(matched)
    }

    fn split_extension<'a>(&self, url: &'a str) -> (&'a str, Option<&'a str>) {
        if !self.parse_extensions {
            return (url, None);
        }
        let found = match EXTENSION_REGEX.captures(url).and_then(|caps| caps.get(1)) {
            Some(found) => found,
            None => return (url, None),
        };
        let ext = found.as_str();
        let accepted = self.extensions.is_empty()
            || self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext));
        if accepted {
            (&url[..found.start() - 1], Some(ext))
        } else {
            (url, None)
        }
    }

    /// Enables extension parsing; a non-empty `extensions` replaces the whitelist
    ///
    /// With an empty whitelist any extension is recognised.
    pub fn parse_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_extensions = true;
        let extensions = extensions
            .into_iter()
            .map(Into::into)
            .fold(Vec::new(), |mut list: Vec<String>, ext: String| {
                if !list.contains(&ext) {
                    list.push(ext);
                }
                list
            });
        if !extensions.is_empty() {
            self.extensions = extensions;
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Generates a URL against the current request
    ///
    /// Returns `None` when no route can express the parameters.
    pub fn url(&self, target: impl Into<UrlTarget>, full: bool) -> Option<String> {
        let ctx = self.requests.last().unwrap_or(&DEFAULT_REQUEST);
        self.url_in(ctx, target, full)
    }

    /// Generates a URL against an explicit request context
    pub fn url_in(&self, ctx: &RequestContext, target: impl Into<UrlTarget>, full: bool) -> Option<String> {
        let (output, ext, query, fragment, full) = match target.into() {
            UrlTarget::Here => {
                let here = if ctx.here.is_empty() { "/" } else { ctx.here.as_str() };
                return Some(if full {
                    format!("{}{}", self.full_base(ctx), here)
                } else {
                    here.to_string()
                });
            }
            UrlTarget::Path(path) => {
                if path.contains("://")
                    || path.starts_with("javascript:")
                    || path.starts_with("mailto:")
                    || path.starts_with('#')
                {
                    return Some(path);
                }
                let resolved = self.resolve_path(ctx, &path);
                (collapse_slashes(&resolved).into_owned(), None, None, None, full)
            }
            UrlTarget::Params(target) => {
                let output = self.generate(ctx, target.params)?;
                (output, target.ext, target.query, target.fragment, full || target.full)
            }
        };

        let mut url = if has_scheme(&output) {
            output
        } else {
            let mut url = format!("{}/{}", ctx.base, output.trim_start_matches('/'));
            if full {
                url.insert_str(0, &self.full_base(ctx));
            }
            if ext.is_some() {
                url.truncate(url.trim_end_matches('/').len());
            }
            url
        };

        if let Some(ext) = ext {
            url.push('.');
            url.push_str(&ext);
        }
        if let Some(query) = query_string(query.as_ref(), &[], false) {
            url.push_str(&query);
        }
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(&fragment);
        }
        Some(url)
    }

    fn full_base(&self, ctx: &RequestContext) -> String {
        self.full_base_url
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| ctx.full_base_url())
    }

    /// Resolves a string URL relative to the current prefix, plugin and controller
    fn resolve_path(&self, ctx: &RequestContext, path: &str) -> String {
        if let Some(rooted) = path.strip_prefix('/') {
            return rooted.to_string();
        }

        let params = &ctx.params;
        let mut out = String::new();
        if let Some(prefix) = self
            .prefixes
            .iter()
            .find(|prefix| params.get(prefix).map_or(false, |value| !value.is_blank()))
        {
            out.push_str(prefix);
            out.push('/');
        }
        if let Some(plugin) = params
            .plugin()
            .filter(|plugin| !plugin.is_empty() && Some(*plugin) != params.controller())
        {
            out.push_str(&plugin.to_snake_case());
            out.push('/');
        }
        if let Some(controller) = params.controller().filter(|controller| !controller.is_empty()) {
            out.push_str(&controller.to_snake_case());
            out.push('/');
        }
        out.push_str(path);
        out
    }

    /// Fills in action, prefix flags, controller and plugin from the current
    /// request, then asks the routes
    fn generate(&self, ctx: &RequestContext, mut url: Params) -> Option<String> {
        let current = &ctx.params;

        if url.action().map_or(true, str::is_empty) {
            let same_controller = url
                .controller()
                .map_or(true, |controller| controller.is_empty() || Some(controller) == current.controller());
            let action = if same_controller {
                current.get("action").cloned().unwrap_or_else(|| Value::from("index"))
            } else {
                Value::from("index")
            };
            url.insert("action", action);
        }

        let prefix_given = self.prefixes.iter().any(|prefix| url.contains(prefix));
        for prefix in &self.prefixes {
            let active = current.get(prefix).map_or(false, |value| !value.is_blank());
            if active && !prefix_given {
                url.insert(prefix.clone(), true);
            } else if url.get(prefix).map_or(false, Value::is_blank) {
                url.remove(prefix);
            }

            if url.contains(prefix) {
                let unprefixed = url
                    .action()
                    .and_then(|action| action.strip_prefix(&format!("{}_", prefix)))
                    .map(str::to_string);
                if let Some(action) = unprefixed {
                    url.insert("action", action);
                }
            }
        }

        url.insert_if_absent("controller", current.get("controller").cloned().unwrap_or_default());
        url.insert_if_absent("plugin", current.get("plugin").cloned().unwrap_or_default());

        match self.routes.match_url(&url, current) {
            Some(path) => Some(path.trim_matches('/').to_string()),
            None => {
                debug!(?url, "no route generates url");
                None
            }
        }
    }

    /// Rebuilds a URL from parsed parameters
    pub fn reverse(&self, params: &Params, full: bool) -> Option<String> {
        self.reverse_with_query(params, &[], full)
    }

    /// Rebuilds the URL of a request, including its query string
    pub fn reverse_request(&self, request: &RequestContext, full: bool) -> Option<String> {
        self.reverse_with_query(&request.params, &request.query, full)
    }

    fn reverse_with_query(&self, params: &Params, query: &[(String, String)], full: bool) -> Option<String> {
        let mut params = params.clone();
        for key in REVERSE_IGNORED {
            params.remove(key);
        }
        let mut target = UrlParams::from(params);
        if !query.is_empty() {
            target.query = Some(Query::Pairs(query.to_vec()));
        }
        self.url(target, full)
    }

    /// Strips the base path, collapses slashes and drops a trailing slash
    ///
    /// Scheme-qualified URLs are returned untouched.
    pub fn normalize(&self, url: &str) -> String {
        if has_scheme(url) {
            return url.to_string();
        }
        let base = self.base_path();
        let url = match url.strip_prefix(base) {
            Some(stripped) if !base.is_empty() => stripped,
            _ => url,
        };
        normalize_path(url).into_owned()
    }

    /// Resolves where a matched redirect route sends the client, with its status
    pub fn redirect_location(&self, matched: &RouteMatch<'_>) -> Option<(String, u16)> {
        let redirect = matched.redirect()?;
        let location = match &redirect.target {
            RedirectTarget::Url(url) => self.url(url.as_str(), true)?,
            RedirectTarget::Params(target) if redirect.persist => {
                let mut target = target.clone();
                target.set_pass(matched.params.pass().to_vec());
                self.reverse(&target, true)?
            }
            RedirectTarget::Params(target) => self.url(target.clone(), true)?,
        };
        Some((location, redirect.status))
    }

    /// Pushes a request context
    pub fn set_request_info(&mut self, request: RequestContext) {
        self.requests.push(request);
    }

    pub fn pop_request(&mut self) -> Option<RequestContext> {
        self.requests.pop()
    }

    /// The innermost request when `current`, otherwise the outermost
    pub fn get_request(&self, current: bool) -> Option<&RequestContext> {
        if current {
            self.requests.last()
        } else {
            self.requests.first()
        }
    }

    pub fn get_params(&self, current: bool) -> Option<&Params> {
        self.get_request(current).map(|request| &request.params)
    }

    pub fn get_param(&self, name: &str, current: bool) -> Option<&Value> {
        self.get_params(current).and_then(|params| params.get(name))
    }

    /// Base path of the current request
    pub fn base_path(&self) -> &str {
        self.requests.last().map_or("", |request| request.base.as_str())
    }

    /// Runs `f` with `request` pushed, popping it afterwards
    pub fn with_request<T>(&mut self, request: RequestContext, f: impl FnOnce(&mut Self) -> T) -> T {
        let depth = self.requests.len();
        self.requests.push(request);
        let out = f(self);
        self.requests.truncate(depth);
        out
    }

    pub fn promote(&mut self, index: Option<usize>) -> bool {
        self.routes.promote(index)
    }

    pub fn routes(&self) -> &RouteCollection {
        &self.routes
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn named_expressions(&self) -> &NamedExpressions {
        &self.named_expressions
    }

    pub fn named_expressions_mut(&mut self) -> &mut NamedExpressions {
        &mut self.named_expressions
    }

    pub fn resource_map(&self) -> &[ResourceMapping] {
        &self.resource_map
    }

    /// Replaces the REST table used by later `map_resources` calls
    pub fn set_resource_map(&mut self, map: Vec<ResourceMapping>) {
        self.resource_map = map;
    }

    pub fn default_route_class(&self) -> &str {
        &self.default_route_class
    }

    pub fn set_default_route_class(&mut self, class: &str) -> Result<()> {
        let known = matches!(class, ROUTE_CLASS | REDIRECT_ROUTE_CLASS | RESOURCE_ROUTE_CLASS)
            || self.factories.contains_key(class);
        if !known {
            return Err(RouterError::UnknownRouteClass(class.to_string()));
        }
        self.default_route_class = class.to_string();
        Ok(())
    }

    /// Registers a factory for a custom route class
    pub fn register_route_class<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, Params, RouteOptions) -> Route + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }
}
