//! Append-only history of generated versions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three texts one generation pass produces, before it is named
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TailoredBundle {
    pub suggestion: String,
    pub analysis: String,
    pub cover_letter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub suggestion: String,
    pub analysis: String,
    pub cover_letter: String,
    pub created_at: DateTime<Utc>,
}

/// What the output panes show. A missing version renders as empty panes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionPanes {
    pub suggestion: String,
    pub analysis: String,
    pub cover_letter: String,
}

impl From<&Version> for VersionPanes {
    fn from(version: &Version) -> Self {
        Self {
            suggestion: version.suggestion.clone(),
            analysis: version.analysis.clone(),
            cover_letter: version.cover_letter.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VersionHistory {
    versions: Vec<Version>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the bundle "Version N" (N = position, 1-based) and append it.
    /// Appends need `&mut self`, so names cannot collide.
    pub fn add_version(&mut self, bundle: TailoredBundle) -> &Version {
        let version = Version {
            name: format!("Version {}", self.versions.len() + 1),
            suggestion: bundle.suggestion,
            analysis: bundle.analysis,
            cover_letter: bundle.cover_letter,
            created_at: Utc::now(),
        };
        self.versions.push(version);
        &self.versions[self.versions.len() - 1]
    }

    pub fn select_version(&self, name: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn names(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
