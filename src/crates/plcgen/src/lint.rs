//! Optional red-flag scan over generated sources.
//!
//! Heuristic and prone to false positives, so the pipeline only runs it when
//! configuration asks for it.

use crate::error::{PipelineError, Result};
use regex::{Regex, RegexBuilder};

/// Default red-flag patterns. Compiled case-insensitive and multi-line.
pub const DEFAULT_SKELETON_PATTERNS: &[&str] = &[
    r"\bTODO\b",
    r"\bplaceholder\b",
    r"\bskeleton\b",
    r"//\s*Manual control logic\s*$",
    r"//\s*Maintenance routines\s*$",
    r"IF\s+Ready\s+THEN\s+InPosition\s*:=\s*TRUE;",
];

/// Outcome of linting one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintOutcome {
    Pass,
    /// First pattern that matched, with the offending line
    Fail { pattern: String, line: String },
}

impl LintOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, LintOutcome::Pass)
    }
}

/// Compiled list of red-flag patterns.
#[derive(Debug, Clone)]
pub struct SkeletonLint {
    patterns: Vec<Regex>,
}

impl SkeletonLint {
    /// Compile the given patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> std::result::Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Lint with [`DEFAULT_SKELETON_PATTERNS`].
    pub fn with_defaults() -> std::result::Result<Self, regex::Error> {
        Self::new(DEFAULT_SKELETON_PATTERNS)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check one text against every pattern, stopping at the first hit.
    pub fn check(&self, text: &str) -> LintOutcome {
        for pattern in &self.patterns {
            if let Some(m) = pattern.find(text) {
                return LintOutcome::Fail {
                    pattern: pattern.as_str().to_string(),
                    line: line_containing(text, m.start()).trim().to_string(),
                };
            }
        }
        LintOutcome::Pass
    }

    /// Check generated content for `relpath`, turning a hit into `CodeGen`.
    pub fn enforce(&self, relpath: &str, text: &str) -> Result<()> {
        match self.check(text) {
            LintOutcome::Pass => Ok(()),
            LintOutcome::Fail { pattern, line } => Err(PipelineError::CodeGen(format!(
                "skeleton content in {}: pattern {} matched {:?}",
                relpath, pattern, line
            ))),
        }
    }
}

fn line_containing(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    &text[start..end]
}
