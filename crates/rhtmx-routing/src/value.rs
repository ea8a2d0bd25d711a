/// Routing parameter values and parameter sets
///
/// Route defaults and generation targets are loosely typed: a value can be
/// null (`plugin` on an application route), a flag (`admin = true`) or text.
/// Comparison between what a route declares and what a caller supplies is
/// loose, so `null`, `false` and `""` all count as "not set".

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A single routing parameter value
///
/// # Examples
///
/// ```
/// use rhtmx_routing::Value;
///
/// assert!(Value::Null.loose_eq(&Value::Bool(false)));
/// assert!(Value::from(true).loose_eq(&Value::from("1")));
/// assert!(!Value::from("posts").loose_eq(&Value::from("nodes")));
/// assert_eq!(Value::from(42).to_text(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// Explicitly unset
    #[default]
    Null,
    /// A flag such as a prefix marker (`admin = true`)
    Bool(bool),
    /// Any textual value; integers are stored as their decimal text
    Text(String),
}

impl Value {
    /// True for `Null`, `false` and the empty string
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(flag) => !flag,
            Value::Text(text) => text.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a `Text` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Textual rendering used when a value is written into a URL
    ///
    /// `Null` and `false` render empty, `true` renders as `"1"`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null | Value::Bool(false) => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("1"),
            Value::Text(text) => Cow::Borrowed(text),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Text(text) => !text.is_empty() && text != "0",
        }
    }

    /// Loose equality between a declared default and a supplied value
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(flag), other) | (other, Value::Bool(flag)) => *flag == other.truthy(),
            (a, b) => a.is_blank() && b.is_blank(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Text(value.to_string())
                }
            }
        )*
    };
}

value_from_integer!(i32, i64, u16, u32, u64, usize);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A routing parameter set: named values plus the ordered `pass` list
///
/// This is both what [`Route::parse`](crate::Route::parse) produces and what
/// URL generation consumes. Positional values live only in `pass`.
///
/// # Examples
///
/// ```
/// use rhtmx_routing::Params;
///
/// let params = Params::new()
///     .with("controller", "pages")
///     .with("action", "display")
///     .with_pass("home");
///
/// assert_eq!(params.controller(), Some("pages"));
/// assert_eq!(params.pass(), ["home".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    named: HashMap<String, Value>,
    pass: Vec<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a named value (builder form)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Appends a positional value (builder form)
    pub fn with_pass(mut self, value: impl Into<Value>) -> Self {
        self.push_pass(value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.named.insert(key.into(), value.into())
    }

    /// Inserts only when the key is not present at all
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.named.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.named.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    /// Text of a named value, if it is textual
    pub fn text(&self, key: &str) -> Option<&str> {
        self.named.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.named.contains_key(key)
    }

    pub fn named(&self) -> &HashMap<String, Value> {
        &self.named
    }

    pub fn pass(&self) -> &[String] {
        &self.pass
    }

    pub fn push_pass(&mut self, value: impl Into<Value>) {
        self.pass.push(value.into().to_text().into_owned());
    }

    pub fn set_pass(&mut self, pass: Vec<String>) {
        self.pass = pass;
    }

    /// True when there are neither named nor positional values
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.pass.is_empty()
    }

    pub fn controller(&self) -> Option<&str> {
        self.text("controller")
    }

    pub fn action(&self) -> Option<&str> {
        self.text("action")
    }

    pub fn plugin(&self) -> Option<&str> {
        self.text("plugin")
    }

    pub fn prefix(&self) -> Option<&str> {
        self.text("prefix")
    }

    pub fn ext(&self) -> Option<&str> {
        self.text("ext")
    }
}
