// src/watch/exclude.rs

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::Result;

/// Exclusion filter compiled from the `-x` regular expression.
///
/// The expression is tested against the full path (not just the file name),
/// so `\.git` excludes `/proj/.git` and everything below it. An empty filter
/// excludes nothing.
///
/// Once anchored with [`ExcludeFilter::relative_to`], paths under the watched
/// root are tested as the user spelled the root (`proj/build/x` for `-p proj`),
/// never with the directories above it.
#[derive(Clone, Default)]
pub struct ExcludeFilter {
    pattern: Option<Regex>,
    anchor: Option<Anchor>,
}

/// Canonical watch root and the spelling it was given on the command line.
#[derive(Debug, Clone)]
struct Anchor {
    canonical: PathBuf,
    given: PathBuf,
}

impl ExcludeFilter {
    /// A filter that never matches.
    pub fn none() -> Self {
        Self::default()
    }

    /// Compile `pattern`. An empty string yields [`ExcludeFilter::none`].
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::none());
        }
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
            anchor: None,
        })
    }

    /// Test paths below `canonical` as if they were spelled under `given`.
    pub fn relative_to(
        mut self,
        canonical: impl Into<PathBuf>,
        given: impl Into<PathBuf>,
    ) -> Self {
        self.anchor = Some(Anchor {
            canonical: canonical.into(),
            given: given.into(),
        });
        self
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(re) = &self.pattern else {
            return false;
        };
        match self.shown(path) {
            Some(shown) => re.is_match(&shown.to_string_lossy()),
            None => re.is_match(&path.to_string_lossy()),
        }
    }

    /// The user-facing spelling of `path`, if it lies under the anchor.
    fn shown(&self, path: &Path) -> Option<PathBuf> {
        let anchor = self.anchor.as_ref()?;
        let rel = path.strip_prefix(&anchor.canonical).ok()?;
        let shown = if anchor.given == Path::new(".") || anchor.given.as_os_str().is_empty() {
            rel.to_path_buf()
        } else {
            anchor.given.join(rel)
        };
        if shown.as_os_str().is_empty() {
            Some(PathBuf::from("."))
        } else {
            Some(shown)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

impl fmt::Debug for ExcludeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeFilter")
            .field("pattern", &self.as_str())
            .finish()
    }
}
