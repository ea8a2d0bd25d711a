/// Routing configuration errors
///
/// Only mistakes in how routes are declared are errors. A path that no route
/// parses, or parameters no route can turn into a URL, are ordinary `None`
/// results.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("route class `{0}` is neither built in nor registered")]
    UnknownRouteClass(String),

    #[error("invalid pattern for route `{template}`: {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid route configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
