// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled `[watch].ignore` patterns.
///
/// Patterns are matched against the *name* of an entry directly under the
/// devices root (e.g. `".staging"`), never against the full path.
#[derive(Clone, Default)]
pub struct IgnorePatterns {
    set: Option<GlobSet>,
    patterns: Vec<String>,
}

impl fmt::Debug for IgnorePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnorePatterns")
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl IgnorePatterns {
    /// Ignore nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::none());
        }
        Ok(Self {
            set: Some(build_globset(patterns)?),
            patterns: patterns.to_vec(),
        })
    }

    /// Returns true if the entry at `path` should be left alone.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        match path.file_name() {
            Some(name) => set.is_match(Path::new(name)),
            None => false,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
