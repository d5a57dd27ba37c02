//! Dynamic route patterns
//!
//! A path such as `/user/[id]/posts/[post]` becomes the anchored matcher
//! `^/user/([^/]+)/posts/([^/]+)$` with parameter names `["id", "post"]`.

use regex::Regex;
use std::collections::HashMap;

use crate::error::RouteLoadError;

/// Whether a route path contains a bracket-delimited segment
pub fn is_dynamic(path: &str) -> bool {
    path.split('/').any(|segment| bracket_param(segment).is_some())
}

/// `"[id]"` -> `Some("id")`
fn bracket_param(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|name| !name.is_empty() && !name.contains(['[', ']']))
}

#[derive(Debug, Clone)]
pub struct RoutePattern {
    pattern: String,
    param_names: Vec<String>,
    matcher: Regex,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteLoadError> {
        let mut param_names = Vec::new();
        let mut source = String::from("^");

        for (i, segment) in pattern.split('/').enumerate() {
            if i > 0 {
                source.push('/');
            }
            if let Some(name) = bracket_param(segment) {
                param_names.push(name.to_string());
                source.push_str("([^/]+)");
            } else {
                source.push_str(&regex::escape(segment));
            }
        }
        source.push('$');

        let matcher = Regex::new(&source).map_err(|source| RouteLoadError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            param_names,
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Match a full request path, returning the percent-decoded parameters
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.matcher.captures(path)?;
        Some(
            self.param_names
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, m)| m.map(|m| (name.clone(), decode_segment(m.as_str()))))
                .collect(),
        )
    }
}

/// Undecodable input (invalid UTF-8) is kept as received
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_dynamic() {
        assert!(is_dynamic("/user/[id]"));
        assert!(is_dynamic("/[org]/repos"));
        assert!(!is_dynamic("/user/id"));
        assert!(!is_dynamic("/user/[]"));
        assert!(!is_dynamic("/user/x[id]"));
    }

    #[test]
    fn test_single_segment_capture() {
        let pattern = RoutePattern::parse("/user/[id]").unwrap();
        assert_eq!(pattern.param_names(), ["id".to_string()]);

        let params = pattern.captures("/user/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(pattern.captures("/user/42/extra").is_none());
        assert!(pattern.captures("/user/").is_none());
        assert!(pattern.captures("/user").is_none());
    }

    #[test]
    fn test_params_follow_segment_order() {
        let pattern = RoutePattern::parse("/org/[org]/repo/[repo]").unwrap();
        assert_eq!(pattern.param_names(), ["org".to_string(), "repo".to_string()]);

        let params = pattern.captures("/org/rust-lang/repo/cargo").unwrap();
        assert_eq!(params["org"], "rust-lang");
        assert_eq!(params["repo"], "cargo");
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let pattern = RoutePattern::parse("/files.v1/[name]").unwrap();
        assert!(pattern.captures("/files.v1/a").is_some());
        assert!(pattern.captures("/filesXv1/a").is_none());
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let pattern = RoutePattern::parse("/user/[id]").unwrap();
        let params = pattern.captures("/user/john%20doe").unwrap();
        assert_eq!(params["id"], "john doe");

        // an encoded slash stays inside the segment
        let params = pattern.captures("/user/a%2Fb").unwrap();
        assert_eq!(params["id"], "a/b");

        let params = pattern.captures("/user/%FF").unwrap();
        assert_eq!(params["id"], "%FF");
    }

    #[test]
    fn test_trailing_slash_is_significant() {
        let pattern = RoutePattern::parse("/user/[id]").unwrap();
        assert!(pattern.captures("/user/42/").is_none());
    }
}
