/// Request context consumed by the router
///
/// The router never builds requests itself. A dispatcher hands it the
/// pieces it reads while generating URLs: base path, current path, host,
/// scheme and the parameters the current request was parsed into.

use crate::value::{Params, Value};

/// What the router knows about the request being served
///
/// # Examples
///
/// ```
/// use rhtmx_routing::{Params, RequestContext};
///
/// let ctx = RequestContext::new()
///     .with_base("/app")
///     .with_here("/app/posts/index")
///     .with_params(Params::new().with("controller", "posts").with("action", "index"));
///
/// assert_eq!(ctx.full_base_url(), "http://localhost");
/// assert_eq!(ctx.params.controller(), Some("posts"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Application base path, without a trailing slash
    pub base: String,
    /// Current request path including the base
    pub here: String,
    pub host: String,
    pub port: u16,
    pub scheme: String,
    /// HTTP method, used for `[method]` constraints
    pub method: Option<String>,
    /// Parameters the current request was parsed into
    pub params: Params,
    /// Query string pairs of the current request
    pub query: Vec<(String, String)>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            base: String::new(),
            here: "/".to_string(),
            host: "localhost".to_string(),
            port: 80,
            scheme: "http".to_string(),
            method: None,
            params: Params::new()
                .with("plugin", Value::Null)
                .with("controller", Value::Null)
                .with("action", "index"),
            query: Vec::new(),
        }
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_here(mut self, here: impl Into<String>) -> Self {
        self.here = here.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_query<I, K, V>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = query
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// `scheme://host[:port]`, omitting the default port
    pub fn full_base_url(&self) -> String {
        match self.port {
            80 | 443 => format!("{}://{}", self.scheme, self.host),
            port => format!("{}://{}:{}", self.scheme, self.host, port),
        }
    }
}
