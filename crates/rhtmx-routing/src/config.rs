// File: src/config.rs
// Purpose: Router configuration and declarative routes from routes.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::RouterError;
use crate::route::RouteOptions;
use crate::value::{Params, Value};

/// Router configuration
///
/// ```toml
/// prefixes = ["admin"]
/// parse_extensions = true
/// extensions = ["json", "rss"]
///
/// [[route]]
/// template = "/pages/*"
/// defaults = { controller = "pages", action = "display" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouterConfig {
    /// Routing prefixes known up front (e.g. `admin`)
    #[serde(default)]
    pub prefixes: Vec<String>,

    #[serde(default)]
    pub parse_extensions: bool,

    /// Extension whitelist; empty accepts any extension
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Prepended to URLs generated with `full = true`
    #[serde(default)]
    pub full_base_url: Option<String>,

    #[serde(default)]
    pub default_route_class: Option<String>,

    #[serde(default, rename = "route")]
    pub routes: Vec<RouteConfig>,
}

/// A default value in TOML: flag, integer or text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl From<&ConfigValue> for Value {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Bool(flag) => Value::Bool(*flag),
            ConfigValue::Integer(number) => Value::from(*number),
            ConfigValue::Text(text) => Value::from(text),
        }
    }
}

/// One `[[route]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    pub template: String,

    #[serde(default)]
    pub defaults: BTreeMap<String, ConfigValue>,

    /// Positional defaults
    #[serde(default)]
    pub pass_defaults: Vec<ConfigValue>,

    #[serde(default)]
    pub patterns: HashMap<String, String>,

    #[serde(default)]
    pub pass: Vec<String>,

    #[serde(default)]
    pub persist: Vec<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub route_class: Option<String>,

    /// Makes this a redirect route to the given URL
    #[serde(default)]
    pub redirect: Option<String>,

    #[serde(default)]
    pub status: Option<u16>,
}

impl RouteConfig {
    pub fn defaults(&self) -> Params {
        let named = self
            .defaults
            .iter()
            .fold(Params::new(), |params, (key, value)| {
                params.with(key.as_str(), Value::from(value))
            });
        self.pass_defaults
            .iter()
            .fold(named, |params, value| params.with_pass(Value::from(value)))
    }

    pub fn options(&self) -> RouteOptions {
        RouteOptions {
            patterns: self.patterns.clone(),
            pass: self.pass.clone(),
            persist: self.persist.clone(),
            name: self.name.clone(),
            route_class: self.route_class.clone(),
            status: self.status,
        }
    }
}

impl RouterConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content).map_err(|err| RouterError::Config(err.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means no extra configuration
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read routes file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse routes file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./routes.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routes.toml")
    }

    /// The same configuration without declared routes
    pub fn without_routes(&self) -> Self {
        Self {
            routes: Vec::new(),
            ..self.clone()
        }
    }
}
