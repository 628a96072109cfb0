//! Location pattern matching.
//!
//! # Responsibilities
//! - Classify location paths as exact or subtree patterns
//! - Match request paths against them
//!
//! # Design Decisions
//! - A pattern ending in `/` matches every path below it (subtree)
//! - Any other pattern matches only that exact path
//! - Matching is case-sensitive, with no regex and no normalisation

/// A compiled location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly.
    Exact(String),
    /// Matches the path and everything below it. Always ends with `/`.
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern.ends_with('/') {
            PathPattern::Subtree(pattern.to_string())
        } else {
            PathPattern::Exact(pattern.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Exact(p) | PathPattern::Subtree(p) => p,
        }
    }

    pub fn is_subtree(&self) -> bool {
        matches!(self, PathPattern::Subtree(_))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Subtree(p) => path.starts_with(p.as_str()),
        }
    }
}
