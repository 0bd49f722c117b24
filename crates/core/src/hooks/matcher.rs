//! Tool-name matchers for hook groups
//!
//! A matcher is an exact tool name, a glob (`write_*`), or `|`-separated
//! alternatives of either (`write_file|replace`). Empty and `*` match every
//! tool. Exact equality is checked before the glob.

use glob::Pattern;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[error("invalid matcher pattern '{pattern}': {source}")]
pub struct MatchError {
    pub pattern: String,
    #[source]
    pub source: glob::PatternError,
}

#[derive(Debug, Clone)]
struct Alternative {
    literal: String,
    glob: Option<Pattern>,
}

impl Alternative {
    fn matches(&self, tool_name: &str) -> bool {
        self.literal == tool_name || self.glob.as_ref().is_some_and(|g| g.matches(tool_name))
    }
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Any,
    Alternatives(Vec<Alternative>),
    /// Failed to compile; never matches
    Invalid,
}

/// A matcher pattern compiled once at registry load
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    raw: String,
    kind: MatcherKind,
}

impl CompiledMatcher {
    pub fn compile(pattern: &str) -> Result<Self, MatchError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self {
                raw: pattern.to_string(),
                kind: MatcherKind::Any,
            });
        }

        let mut alternatives = Vec::new();
        for alt in trimmed.split('|').map(str::trim).filter(|a| !a.is_empty()) {
            let glob = if alt.contains(['*', '?', '[']) {
                let compiled = Pattern::new(alt).map_err(|source| MatchError {
                    pattern: pattern.to_string(),
                    source,
                })?;
                Some(compiled)
            } else {
                None
            };
            alternatives.push(Alternative {
                literal: alt.to_string(),
                glob,
            });
        }

        Ok(Self {
            raw: pattern.to_string(),
            kind: MatcherKind::Alternatives(alternatives),
        })
    }

    /// Compile, or log once and fall back to a matcher that never matches
    pub fn compile_or_never(pattern: &str) -> Self {
        Self::compile(pattern).unwrap_or_else(|e| {
            warn!("{}; hooks in this group will never run", e);
            Self {
                raw: pattern.to_string(),
                kind: MatcherKind::Invalid,
            }
        })
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        match &self.kind {
            MatcherKind::Any => true,
            MatcherKind::Alternatives(alts) => alts.iter().any(|a| a.matches(tool_name)),
            MatcherKind::Invalid => false,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.raw
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, MatcherKind::Invalid)
    }
}

/// One-shot match. Invalid patterns never match and are not logged here.
pub fn matches(pattern: &str, tool_name: &str) -> bool {
    CompiledMatcher::compile(pattern).is_ok_and(|m| m.matches(tool_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_star_match_everything() {
        assert!(matches("", "write_file"));
        assert!(matches("   ", "read_file"));
        assert!(matches("*", "anything"));
    }

    #[test]
    fn test_exact() {
        assert!(matches("write_file", "write_file"));
        assert!(!matches("write_file", "write_files"));
        assert!(!matches("write_file", "read_file"));
    }

    #[test]
    fn test_glob() {
        assert!(matches("write_*", "write_file"));
        assert!(matches("*_file", "read_file"));
        assert!(!matches("write_*", "read_file"));
        assert!(matches("read_fil?", "read_file"));
    }

    #[test]
    fn test_exact_takes_precedence_over_glob() {
        // "[x]" as a glob only matches "x", but exact equality wins first
        assert!(matches("tool[x]", "tool[x]"));
        assert!(matches("tool[x]", "toolx"));
    }

    #[test]
    fn test_alternatives() {
        let m = CompiledMatcher::compile("write_file | replace|shell*").unwrap();
        assert!(m.matches("write_file"));
        assert!(m.matches("replace"));
        assert!(m.matches("shell_exec"));
        assert!(!m.matches("read_file"));
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        assert!(CompiledMatcher::compile("write_[").is_err());
        assert!(!matches("write_[", "write_["));

        let m = CompiledMatcher::compile_or_never("write_[");
        assert!(!m.is_valid());
        assert!(!m.matches("write_file"));
        assert_eq!(m.pattern(), "write_[");
    }
}
