/// Route module: a single template-to-parameters rule
///
/// A `Route` keeps its template, defaults and options exactly as declared and
/// compiles a matcher on first use. Both directions go through it:
/// - `parse`: path → parameter set
/// - `match_url`: parameter set → path

pub mod pattern;

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::error::Result;
use crate::path::decode;
use crate::value::{Params, Value};

pub use pattern::{tokenize, CompiledRoute, Greedy, TemplateToken};

/// Default key holding an HTTP method constraint
pub const METHOD_KEY: &str = "[method]";

/// Matching options of a route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOptions {
    /// Per-placeholder regex constraints
    pub patterns: HashMap<String, String>,
    /// Named values re-exposed positionally by `parse`
    pub pass: Vec<String>,
    /// Named values carried over from the current request during generation
    pub persist: Vec<String>,
    /// Explicit route name
    pub name: Option<String>,
    /// Route class requested at connect time
    pub route_class: Option<String>,
    /// Redirect status for redirect routes
    pub status: Option<u16>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(name.into(), pattern.into());
        self
    }

    pub fn with_pass<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pass = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_persist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_route_class(mut self, class: impl Into<String>) -> Self {
        self.route_class = Some(class.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Where a redirect route sends the client
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectTarget {
    /// A literal URL or path
    Url(String),
    /// Parameters resolved through URL generation
    Params(Params),
}

impl From<&str> for RedirectTarget {
    fn from(url: &str) -> Self {
        RedirectTarget::Url(url.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(url: String) -> Self {
        RedirectTarget::Url(url)
    }
}

impl From<Params> for RedirectTarget {
    fn from(params: Params) -> Self {
        RedirectTarget::Params(params)
    }
}

/// Redirect behaviour attached to a route
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub target: RedirectTarget,
    /// HTTP status, always 3xx
    pub status: u16,
    /// Append the parsed pass values to a parameter target
    pub persist: bool,
}

/// Closed set of route behaviours
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RouteKind {
    #[default]
    Standard,
    /// Generated by resource mapping
    Resource,
    /// Parses like a standard route but never generates URLs
    Redirect(Redirect),
    /// Built by a factory registered under this name
    Custom(String),
}

/// A single path template with its defaults and options
///
/// # Examples
///
/// ```
/// use rhtmx_routing::{Params, Route, RouteOptions};
///
/// let route = Route::new(
///     "/:controller/:action/:id",
///     Params::new().with("plugin", None::<String>),
///     RouteOptions::new().with_pattern("id", "[0-9]+"),
/// );
///
/// let params = route.parse("/posts/view/1", None).unwrap();
/// assert_eq!(params.controller(), Some("posts"));
/// assert_eq!(params.text("id"), Some("1"));
///
/// assert_eq!(route.match_url(&params).as_deref(), Some("/posts/view/1"));
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    template: String,
    defaults: Params,
    options: RouteOptions,
    kind: RouteKind,
    compiled: OnceCell<CompiledRoute>,
}

impl Route {
    /// Stores the declaration; compilation happens on first use
    pub fn new(template: impl Into<String>, defaults: Params, options: RouteOptions) -> Self {
        Self {
            template: template.into(),
            defaults,
            options,
            kind: RouteKind::Standard,
            compiled: OnceCell::new(),
        }
    }

    /// Creates a redirect route
    pub fn redirect(
        template: impl Into<String>,
        defaults: Params,
        options: RouteOptions,
        target: impl Into<RedirectTarget>,
    ) -> Self {
        let status = match options.status {
            Some(status) if (300..400).contains(&status) => status,
            Some(status) => {
                warn!(status, "redirect status outside 3xx, using 301");
                301
            }
            None => 301,
        };
        let redirect = Redirect {
            target: target.into(),
            status,
            persist: !options.persist.is_empty(),
        };
        Self::new(template, defaults, options).with_kind(RouteKind::Redirect(redirect))
    }

    pub fn with_kind(mut self, kind: RouteKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Defaults as declared
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    pub fn redirect_target(&self) -> Option<&Redirect> {
        match &self.kind {
            RouteKind::Redirect(redirect) => Some(redirect),
            _ => None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Compiles the template once and returns the cached matcher
    pub fn compile(&self) -> Result<&CompiledRoute> {
        self.compiled.get_or_try_init(|| {
            CompiledRoute::compile(&self.template, &self.defaults, &self.options.patterns)
        })
    }

    fn compiled(&self) -> Option<&CompiledRoute> {
        match self.compile() {
            Ok(compiled) => Some(compiled),
            Err(err) => {
                warn!(template = %self.template, error = %err, "route failed to compile");
                None
            }
        }
    }

    /// Parses a path into parameters
    ///
    /// `method` is the current request method, checked against a `[method]`
    /// default.
    pub fn parse(&self, url: &str, method: Option<&str>) -> Option<Params> {
        let compiled = self.compiled()?;
        let path = decode(url);
        let captures = compiled.captures(&path)?;
        let defaults = compiled.defaults();

        if let Some(required) = defaults.get(METHOD_KEY) {
            let required = required.to_text();
            let allowed = method.map_or(false, |method| {
                required
                    .split('|')
                    .any(|candidate| candidate.eq_ignore_ascii_case(method))
            });
            if !allowed {
                return None;
            }
        }

        let mut params = Params::new();
        for (key, value) in captures.named {
            params.insert(key, value);
        }
        for (key, value) in defaults.named() {
            if !value.is_null() && !params.contains(key) {
                params.insert(key.clone(), value.clone());
            }
        }

        let mut pass = defaults.pass().to_vec();
        if let Some(args) = captures.args {
            pass.extend(
                args.split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(|segment| decode(segment).into_owned()),
            );
        }
        if let Some(trailing) = captures.trailing {
            let trailing = trailing.trim_end_matches('/');
            if !trailing.is_empty() {
                pass.push(trailing.to_string());
            }
        }

        let mut moved: Vec<String> = self
            .options
            .pass
            .iter()
            .filter_map(|name| params.remove(name))
            .map(|value| value.to_text().into_owned())
            .collect();
        moved.extend(pass);
        params.set_pass(moved);

        Some(params)
    }

    /// Generates a path for `params`, or `None` when this route can't express them
    ///
    /// Redirect routes never generate.
    pub fn match_url(&self, params: &Params) -> Option<String> {
        if matches!(self.kind, RouteKind::Redirect(_)) {
            return None;
        }
        let compiled = self.compiled()?;
        let defaults = compiled.defaults();
        let keys = compiled.keys();

        let mut url = params.clone();
        let prefix = defaults.prefix().map(str::to_string);
        if let Some(prefix) = &prefix {
            let marker = format!("{}_", prefix);
            let flagged = url.get(prefix).map_or(false, |flag| !flag.is_blank());
            let active = flagged
                || url.prefix() == Some(prefix.as_str())
                || url.action().map_or(false, |action| action.starts_with(&marker));
            if !active || url.prefix().map_or(false, |given| given != prefix.as_str()) {
                return None;
            }
            url.insert("prefix", prefix.as_str());

            let unprefixed = url
                .action()
                .and_then(|action| action.strip_prefix(&marker))
                .map(str::to_string);
            if let Some(action) = unprefixed {
                url.insert("action", action);
            }
        }

        // Pass-option keys travel positionally; take them back from the head of pass.
        let mut pass = url.pass().to_vec();
        for name in &self.options.pass {
            if url.get(name).map_or(true, Value::is_null) && keys.contains(name) && !pass.is_empty() {
                url.insert(name.clone(), pass.remove(0));
            }
        }

        let missing_key = keys.iter().any(|key| {
            !compiled.is_optional(key) && url.get(key).map_or(true, Value::is_blank)
        });
        if missing_key {
            return None;
        }

        let defaults_agree = defaults
            .named()
            .iter()
            .all(|(key, default)| default.loose_eq(url.get(key).unwrap_or(&Value::Null)));
        if !defaults_agree {
            return None;
        }

        // The flag named after the route's prefix is consumed by the prefix itself.
        let leftover = url.named().iter().any(|(key, value)| {
            !defaults.contains(key)
                && !keys.contains(key)
                && prefix.as_deref() != Some(key.as_str())
                && !value.is_blank()
        });
        if leftover {
            return None;
        }

        let positional = defaults.pass();
        if !pass.starts_with(positional) {
            return None;
        }
        let extra = &pass[positional.len()..];
        if compiled.greedy().is_none() && !extra.is_empty() {
            return None;
        }

        let constrained = url
            .named()
            .iter()
            .filter(|(_, value)| !value.is_null())
            .all(|(key, value)| compiled.allows(key, &value.to_text()));
        if !constrained {
            return None;
        }

        Some(compiled.write(&url, extra))
    }

    /// Copies persisted names from `current` into `url` when `url` leaves them unset
    pub fn persist_params(&self, mut url: Params, current: &Params) -> Params {
        for name in &self.options.persist {
            if let Some(value) = current.get(name) {
                if url.get(name).map_or(true, Value::is_null) {
                    url.insert(name.clone(), value.clone());
                }
            }
        }
        url
    }

    /// Identifier used for named generation
    ///
    /// The explicit name when one was given, otherwise `plugin.controller:action`
    /// built from the defaults, with `_plugin`, `_controller` or `_action` for
    /// slots the template captures. Always lowercase.
    pub fn name(&self) -> String {
        if let Some(name) = &self.options.name {
            return name.clone();
        }

        let keys = pattern::template_keys(&self.template);
        [("plugin", "."), ("controller", ":"), ("action", "")]
            .iter()
            .filter_map(|(slot, glue)| {
                let value = if keys.contains(slot) {
                    Some(format!("_{}", slot))
                } else {
                    self.defaults
                        .get(slot)
                        .filter(|value| !value.is_null())
                        .map(|value| value.to_text().into_owned())
                };
                value.map(|value| format!("{}{}", value, glue))
            })
            .collect::<String>()
            .to_lowercase()
    }
}
