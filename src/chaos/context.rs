//! Request classification.
//!
//! # Design Decisions
//! - Prefix matching is ASCII case-insensitive
//! - No regex, a linear scan over a short prefix list

use std::fmt;

use crate::config::RoutingConfig;

/// Which side of the application a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestContext {
    Api,
    App,
}

impl RequestContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestContext::Api => "api",
            RequestContext::App => "app",
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
    excluded_prefixes: Vec<String>,
}

impl Classifier {
    pub fn new(api_prefix: impl Into<String>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            excluded_prefixes,
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.api_prefix.clone(), config.excluded_prefixes.clone())
    }

    /// `None` if the path must never see chaos, otherwise its context.
    pub fn classify(&self, path: &str) -> Option<RequestContext> {
        if self.is_excluded(path) {
            return None;
        }
        if starts_with_ignore_case(path, &self.api_prefix) {
            Some(RequestContext::Api)
        } else {
            Some(RequestContext::App)
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| starts_with_ignore_case(path, prefix))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && path.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
