//! Route url compilation.
//!
//! Paths use the Express conventions: `:name` captures one segment,
//! `:name?` makes the segment optional, `*` matches anything. Matching is
//! case-insensitive and tolerates a trailing slash.

use crate::definitions::UrlPattern;
use regex::Regex;
use std::collections::HashMap;

const MOUNT_GROUP: &str = "__mount";

/// Compiled url of a route.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    regex: Regex,
    prefix: bool,
}

/// Captures of a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMatch {
    pub params: HashMap<String, String>,
    /// Matched mount prefix for prefix routes, empty otherwise
    pub base_path: String,
}

impl UrlMatcher {
    /// Compile a url; `prefix` mounts the route on the url and everything below it.
    pub fn compile(pattern: &UrlPattern, prefix: bool) -> Result<Self, regex::Error> {
        let regex = match pattern {
            UrlPattern::Regex { regex } => Regex::new(regex)?,
            UrlPattern::Path(path) => {
                let body = path_to_regex(path);
                let source = if prefix {
                    format!("(?i)^(?P<{MOUNT_GROUP}>{body})(?:/.*)?$")
                } else {
                    format!("(?i)^{body}/?$")
                };
                Regex::new(&source)?
            }
        };
        let prefix = prefix && matches!(pattern, UrlPattern::Path(_));
        Ok(Self { regex, prefix })
    }

    pub fn matches(&self, path: &str) -> Option<UrlMatch> {
        let captures = self.regex.captures(path)?;
        let mut found = UrlMatch::default();
        for name in self.regex.capture_names().flatten() {
            let Some(value) = captures.name(name) else {
                continue;
            };
            if name == MOUNT_GROUP {
                found.base_path = value.as_str().trim_end_matches('/').to_string();
            } else {
                found.params.insert(name.to_string(), value.as_str().to_string());
            }
        }
        if !self.prefix {
            found.base_path.clear();
        }
        Some(found)
    }
}

fn path_to_regex(path: &str) -> String {
    let mut out = String::new();
    for segment in path.trim_start_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        if let Some(name) = optional_param(segment) {
            out.push_str(&format!("(?:/(?P<{name}>[^/]+))?"));
            continue;
        }
        out.push('/');
        out.push_str(&segment_to_regex(segment));
    }
    out
}

/// `:name?` as a whole segment
fn optional_param(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix(':')?.strip_suffix('?')?;
    is_param_name(name).then_some(name)
}

fn segment_to_regex(segment: &str) -> String {
    let mut out = String::new();
    let mut chars = segment.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '*' => out.push_str(".*"),
            ':' => {
                let rest = &segment[idx + 1..];
                let len = rest
                    .char_indices()
                    .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                let name = &rest[..len];
                if is_param_name(name) {
                    out.push_str(&format!("(?P<{name}>[^/]+?)"));
                    for _ in 0..name.chars().count() {
                        chars.next();
                    }
                } else {
                    out.push_str(&regex::escape(":"));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
