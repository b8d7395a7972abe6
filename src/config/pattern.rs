//! Glob pattern sets matched against logical asset paths.

use glob::Pattern;

use super::ConfigError;

/// Compiled list of glob patterns.
///
/// A path matches when any pattern matches either the whole logical path
/// (`js/out/main.js`) or just its file name (`main.js`), so `*.map` and
/// `js/**` both behave as expected.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile `patterns`, reporting the offending config field on failure.
    pub fn compile(field: &'static str, patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| ConfigError::InvalidPattern {
                    field,
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Check a forward-slashed logical path.
    pub fn matches(&self, logical: &str) -> bool {
        let name = logical.rsplit_once('/').map_or(logical, |(_, n)| n);
        self.patterns
            .iter()
            .any(|p| p.matches(logical) || p.matches(name))
    }
}
