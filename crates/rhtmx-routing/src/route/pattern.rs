/// Route template compilation
///
/// Turns a template such as `/:controller/:action/*` into an anchored regular
/// expression plus the ordered list of placeholder names ("keys").
/// All functions are **pure**: same template, defaults and constraints always
/// compile to the same matcher.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RouterError};
use crate::path::{collapse_slashes, encode};
use crate::value::Params;

/// Placeholder syntax: `:name`, where the name ends with an alphanumeric
static KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_-]+[A-Za-z0-9])").unwrap());

const ARGS_GROUP: &str = "_args_";
const TRAILING_GROUP: &str = "_trailing_";

/// A piece of a route template
///
/// # Examples
///
/// ```
/// use rhtmx_routing::route::pattern::{tokenize, Greedy, TemplateToken};
///
/// let (tokens, greedy) = tokenize("/posts/:id-:title/*");
/// assert_eq!(
///     tokens,
///     vec![
///         TemplateToken::Literal("/posts/".to_string()),
///         TemplateToken::Key("id".to_string()),
///         TemplateToken::Literal("-".to_string()),
///         TemplateToken::Key("title".to_string()),
///     ]
/// );
/// assert_eq!(greedy, Some(Greedy::Segments));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateToken {
    /// Literal text, matched verbatim
    Literal(String),
    /// A `:name` placeholder
    Key(String),
}

/// Trailing wildcard of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greedy {
    /// `/*`: remaining segments become positional values
    Segments,
    /// `/**`: the raw remainder becomes a single positional value
    Raw,
}

/// Fold accumulator for tokenizing
#[derive(Default)]
struct TokenState {
    tokens: Vec<TemplateToken>,
    cursor: usize,
}

impl TokenState {
    fn with_literal(mut self, text: &str) -> Self {
        if !text.is_empty() {
            self.tokens.push(TemplateToken::Literal(text.to_string()));
        }
        self
    }

    fn with_key(mut self, name: &str, end: usize) -> Self {
        self.tokens.push(TemplateToken::Key(name.to_string()));
        self.cursor = end;
        self
    }
}

/// Splits off the trailing greedy marker, if any
fn split_greedy(template: &str) -> (&str, Option<Greedy>) {
    if let Some(body) = template.strip_suffix("/**") {
        (body, Some(Greedy::Raw))
    } else if let Some(body) = template.strip_suffix("/*") {
        (body, Some(Greedy::Segments))
    } else {
        (template, None)
    }
}

/// Placeholder names of a template in left-to-right order
pub fn template_keys(template: &str) -> Vec<&str> {
    KEY_REGEX
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .collect()
}

/// Breaks a template into literal and placeholder tokens (pure function)
pub fn tokenize(template: &str) -> (Vec<TemplateToken>, Option<Greedy>) {
    let (body, greedy) = split_greedy(template);

    let state = KEY_REGEX
        .find_iter(body)
        .fold(TokenState::default(), |state, found| {
            let literal = &body[state.cursor..found.start()];
            state
                .with_literal(literal)
                .with_key(&found.as_str()[1..], found.end())
        });
    let rest = &body[state.cursor..];
    let state = state.with_literal(rest);

    (state.tokens, greedy)
}

/// Captured values of a successful match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    /// Placeholder values in key order; unmatched optional keys are omitted
    pub named: Vec<(String, String)>,
    /// Raw `/*` remainder
    pub args: Option<String>,
    /// Raw `/**` remainder
    pub trailing: Option<String>,
}

/// The compiled form of a route template
///
/// Holds the matcher, the keys, the defaults that remain once keys are
/// removed, and anchored per-name constraints used during generation.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use rhtmx_routing::{CompiledRoute, Params};
///
/// let patterns = HashMap::from([("id".to_string(), "[0-9]+".to_string())]);
/// let compiled = CompiledRoute::compile("/:controller/:action/:id", &Params::new(), &patterns).unwrap();
///
/// assert_eq!(compiled.keys(), ["controller", "action", "id"]);
/// assert!(compiled.is_match("/posts/view/922"));
/// assert!(!compiled.is_match("/posts/edit/name-of-post"));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    regex: Regex,
    keys: Vec<String>,
    groups: Vec<String>,
    tokens: Vec<TemplateToken>,
    greedy: Option<Greedy>,
    optional: HashSet<String>,
    defaults: Params,
    constraints: Vec<(String, Regex)>,
}

impl CompiledRoute {
    /// Compiles a template against its defaults and per-name constraints
    pub fn compile(
        template: &str,
        defaults: &Params,
        patterns: &HashMap<String, String>,
    ) -> Result<Self> {
        let invalid = |source| RouterError::InvalidPattern {
            template: template.to_string(),
            source,
        };

        let (tokens, greedy) = tokenize(template);
        let keys: Vec<String> = tokens
            .iter()
            .filter_map(|token| match token {
                TemplateToken::Key(name) => Some(name.clone()),
                TemplateToken::Literal(_) => None,
            })
            .collect();

        let mut optional = HashSet::new();
        let source = if template.is_empty() || template == "/" {
            "^/*$".to_string()
        } else {
            let mut source = String::from("^");
            let mut groups = 0;
            for token in &tokens {
                match token {
                    TemplateToken::Literal(text) => source.push_str(&regex::escape(text)),
                    TemplateToken::Key(name) => {
                        let group = format!("k{}", groups);
                        groups += 1;
                        match patterns.get(name) {
                            Some(pattern) => {
                                let opt = if name != "plugin" && defaults.contains(name) {
                                    optional.insert(name.clone());
                                    "?"
                                } else {
                                    ""
                                };
                                let slash = if source.ends_with('/') {
                                    source.pop();
                                    "/"
                                } else {
                                    ""
                                };
                                source.push_str(&format!(
                                    "(?:{}(?P<{}>{}){}){}",
                                    slash, group, pattern, opt, opt
                                ));
                            }
                            None => source.push_str(&format!("(?P<{}>[^/]+?)", group)),
                        }
                    }
                }
            }
            match greedy {
                Some(Greedy::Segments) => {
                    source.push_str(&format!("(?:/(?P<{}>.*))?", ARGS_GROUP))
                }
                Some(Greedy::Raw) => {
                    source.push_str(&format!("(?:/(?P<{}>.*))?", TRAILING_GROUP))
                }
                None => {}
            }
            source.push_str("[/]*$");
            source
        };

        let regex = Regex::new(&source).map_err(invalid)?;

        let mut effective = defaults.clone();
        for key in &keys {
            effective.remove(key);
        }

        let constraints = patterns
            .iter()
            .map(|(name, pattern)| {
                Regex::new(&format!("^(?:{})$", pattern)).map(|regex| (name.clone(), regex))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let groups = (0..keys.len()).map(|index| format!("k{}", index)).collect();

        Ok(Self {
            regex,
            keys,
            groups,
            tokens,
            greedy,
            optional,
            defaults: effective,
            constraints,
        })
    }

    /// The generated regular expression
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    pub fn greedy(&self) -> Option<Greedy> {
        self.greedy
    }

    /// Defaults with every template key removed
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// Keys that may be left out (constrained and defaulted)
    pub fn is_optional(&self, key: &str) -> bool {
        self.optional.contains(key)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// True when every constraint declared for `name` accepts `value`
    pub fn allows(&self, name: &str, value: &str) -> bool {
        self.constraints
            .iter()
            .filter(|(constrained, _)| constrained == name)
            .all(|(_, regex)| regex.is_match(value))
    }

    pub fn captures(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;

        let named = self
            .keys
            .iter()
            .zip(&self.groups)
            .filter_map(|(key, group)| {
                caps.name(group)
                    .map(|value| (key.clone(), value.as_str().to_string()))
            })
            .collect();

        Some(Captures {
            named,
            args: caps.name(ARGS_GROUP).map(|m| m.as_str().to_string()),
            trailing: caps.name(TRAILING_GROUP).map(|m| m.as_str().to_string()),
        })
    }

    /// Writes a path from key values and the greedy remainder
    ///
    /// A blank key that isn't the last element also drops the slash after it.
    /// Values are percent-encoded; a `/**` remainder keeps its slashes. Empty
    /// positional values are skipped, as parsing never produces them.
    pub fn write(&self, values: &Params, pass: &[String]) -> String {
        let last = self.tokens.len().saturating_sub(1);
        let mut out = String::new();
        let mut skip_slash = false;

        for (index, token) in self.tokens.iter().enumerate() {
            match token {
                TemplateToken::Literal(text) => {
                    let text = if skip_slash {
                        text.strip_prefix('/').unwrap_or(text)
                    } else {
                        text
                    };
                    out.push_str(text);
                    skip_slash = false;
                }
                TemplateToken::Key(name) => match values.get(name).filter(|v| !v.is_blank()) {
                    Some(value) => out.push_str(&encode(&value.to_text())),
                    None => skip_slash = index < last || self.greedy.is_some(),
                },
            }
        }

        let mut out = collapse_slashes(&out).into_owned();
        let remainder = match self.greedy {
            Some(Greedy::Segments) => pass
                .iter()
                .filter(|segment| !segment.is_empty())
                .map(|segment| encode(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Some(Greedy::Raw) => pass
                .iter()
                .filter(|segment| !segment.is_empty())
                .map(|segment| encode(segment).replace("%2F", "/"))
                .collect::<Vec<_>>()
                .join("/"),
            None => String::new(),
        };
        if !remainder.is_empty() {
            if !out.ends_with('/') {
                out.push('/');
            }
            out.push_str(&remainder);
        }

        if out.is_empty() {
            out.push('/');
        }
        out
    }
}
