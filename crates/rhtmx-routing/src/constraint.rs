//! Named expressions for route element constraints
//!
//! Common regex fragments bound to symbolic names. A constraint whose value is
//! exactly one of these names is expanded when the route is connected:
//!
//! ```
//! use rhtmx_routing::{NamedExpressions, ID};
//!
//! let expressions = NamedExpressions::default();
//! assert_eq!(expressions.expand("ID"), ID);
//! assert_eq!(expressions.expand("[a-z]+"), "[a-z]+");
//! ```

use std::collections::HashMap;

pub const ACTION: &str = "index|show|add|create|edit|update|remove|del|delete|view|item";
pub const YEAR: &str = "[12][0-9]{3}";
pub const MONTH: &str = "0[1-9]|1[012]";
pub const DAY: &str = "0[1-9]|[12][0-9]|3[01]";
pub const ID: &str = "[0-9]+";
pub const UUID: &str =
    "[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}";

/// Symbolic name → regex fragment table
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpressions {
    expressions: HashMap<String, String>,
}

impl Default for NamedExpressions {
    fn default() -> Self {
        let expressions = [
            ("Action", ACTION),
            ("Year", YEAR),
            ("Month", MONTH),
            ("Day", DAY),
            ("ID", ID),
            ("UUID", UUID),
        ]
        .into_iter()
        .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
        .collect();

        Self { expressions }
    }
}

impl NamedExpressions {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.expressions.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
        self.expressions.insert(name.into(), pattern.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.expressions
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern.as_str()))
    }

    /// Resolves a symbolic name to its fragment; other patterns pass through
    pub fn expand<'a>(&'a self, pattern: &'a str) -> &'a str {
        self.get(pattern).unwrap_or(pattern)
    }
}
