//! Prompt templates: loading from the prompts directory and placeholder substitution

use crate::error::{Result, ResumeTailorError};
use log::{debug, info};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const RESUME: &str = "RESUME";
pub const JOB_DESCRIPTION: &str = "JOB_DESCRIPTION";
pub const RECOMMENDATIONS: &str = "RECOMMENDATIONS";
pub const HTML_CONTENT: &str = "HTML_CONTENT";

/// Placeholder name (without braces) to replacement text
pub type Substitutions<'a> = HashMap<&'a str, &'a str>;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid"))
}

/// Replace every `{KEY}` whose KEY is in `substitutions`.
///
/// Single pass over the template: inserted values are never scanned again, so a
/// résumé that happens to contain `{JOB_DESCRIPTION}` stays literal. Unknown
/// placeholders are left in place.
pub fn render(template: &str, substitutions: &Substitutions<'_>) -> String {
    let mut leaked: Vec<String> = Vec::new();

    let rendered = placeholder_pattern().replace_all(template, |caps: &Captures<'_>| {
        match substitutions.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => {
                leaked.push(caps[0].to_string());
                caps[0].to_string()
            }
        }
    });

    if !leaked.is_empty() {
        debug!("Unfilled placeholders left in prompt: {}", leaked.join(", "));
    }

    rendered.into_owned()
}

/// Generation operations that own a prompt pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Suggestion,
    Analysis,
    CoverLetter,
    Questions,
    Extract,
    Linkedin,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Suggestion,
        Operation::Analysis,
        Operation::CoverLetter,
        Operation::Questions,
        Operation::Extract,
        Operation::Linkedin,
    ];

    /// File name stem under the prompts directory
    pub fn stem(&self) -> &'static str {
        match self {
            Operation::Suggestion => "suggestion",
            Operation::Analysis => "analysis",
            Operation::CoverLetter => "cover_letter",
            Operation::Questions => "questions",
            Operation::Extract => "extract",
            Operation::Linkedin => "linkedin",
        }
    }

    fn defaults(&self) -> (&'static str, &'static str) {
        match self {
            Operation::Suggestion => (
                include_str!("../../prompts/suggestion_system_prompt.md"),
                include_str!("../../prompts/suggestion_user_prompt.md"),
            ),
            Operation::Analysis => (
                include_str!("../../prompts/analysis_system_prompt.md"),
                include_str!("../../prompts/analysis_user_prompt.md"),
            ),
            Operation::CoverLetter => (
                include_str!("../../prompts/cover_letter_system_prompt.md"),
                include_str!("../../prompts/cover_letter_user_prompt.md"),
            ),
            Operation::Questions => (
                include_str!("../../prompts/questions_system_prompt.md"),
                include_str!("../../prompts/questions_user_prompt.md"),
            ),
            Operation::Extract => (
                include_str!("../../prompts/extract_system_prompt.md"),
                include_str!("../../prompts/extract_user_prompt.md"),
            ),
            Operation::Linkedin => (
                include_str!("../../prompts/linkedin_system_prompt.md"),
                include_str!("../../prompts/linkedin_user_prompt.md"),
            ),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    System,
    User,
}

impl PromptKind {
    fn suffix(&self) -> &'static str {
        match self {
            PromptKind::System => "system_prompt.md",
            PromptKind::User => "user_prompt.md",
        }
    }
}

/// System directive and user template for one operation
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct TemplateStatus {
    pub operation: Operation,
    pub system_path: PathBuf,
    pub user_path: PathBuf,
    pub present: bool,
}

/// Prompt templates stored as `<dir>/<stem>_{system,user}_prompt.md`
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, operation: Operation, kind: PromptKind) -> PathBuf {
        self.dir.join(format!("{}_{}", operation.stem(), kind.suffix()))
    }

    /// Read both templates of an operation. A missing or undecodable file is an error,
    /// never an empty prompt.
    pub async fn load(&self, operation: Operation) -> Result<PromptPair> {
        let system = load_template(&self.path(operation, PromptKind::System)).await?;
        let user = load_template(&self.path(operation, PromptKind::User)).await?;
        Ok(PromptPair { system, user })
    }

    /// Write the built-in templates, keeping existing files unless `overwrite`
    pub fn install_defaults(&self, overwrite: bool) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;
        let mut written = Vec::new();

        for operation in Operation::ALL {
            let (system, user) = operation.defaults();
            for (kind, content) in [(PromptKind::System, system), (PromptKind::User, user)] {
                let path = self.path(operation, kind);
                if path.exists() && !overwrite {
                    debug!("Keeping existing template {}", path.display());
                    continue;
                }
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        info!("Installed {} prompt templates into {}", written.len(), self.dir.display());
        Ok(written)
    }

    pub fn list(&self) -> Vec<TemplateStatus> {
        Operation::ALL
            .iter()
            .map(|&operation| {
                let system_path = self.path(operation, PromptKind::System);
                let user_path = self.path(operation, PromptKind::User);
                let present = system_path.is_file() && user_path.is_file();
                TemplateStatus {
                    operation,
                    system_path,
                    user_path,
                    present,
                }
            })
            .collect()
    }
}

async fn load_template(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| ResumeTailorError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|_| ResumeTailorError::TemplateLoad {
        path: path.to_path_buf(),
        reason: "file is not valid UTF-8".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_named_placeholders() {
        let subs = Substitutions::from([(JOB_DESCRIPTION, "Acme Corp"), (RESUME, "Jane Doe, Engineer")]);
        assert_eq!(
            render("Apply to {JOB_DESCRIPTION} using {RESUME}", &subs),
            "Apply to Acme Corp using Jane Doe, Engineer"
        );
    }

    #[test]
    fn test_render_without_substitutions_is_identity() {
        let template = "Resume:\n{RESUME}\n\nJob: {JOB_DESCRIPTION} {not a token} {{double}}";
        assert_eq!(render(template, &Substitutions::new()), template);
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let subs = Substitutions::from([(RESUME, "R")]);
        assert_eq!(render("{RESUME}-{RESUME}-{RESUME}", &subs), "R-R-R");
    }

    #[test]
    fn test_inserted_values_are_not_substituted_again() {
        let subs = Substitutions::from([
            (RESUME, "I once wrote {JOB_DESCRIPTION} in a template"),
            (JOB_DESCRIPTION, "Rust Engineer"),
        ]);
        assert_eq!(
            render("{JOB_DESCRIPTION} / {RESUME}", &subs),
            "Rust Engineer / I once wrote {JOB_DESCRIPTION} in a template"
        );
    }

    #[test]
    fn test_unfilled_placeholder_leaks_literally() {
        let subs = Substitutions::from([(RESUME, "R")]);
        assert_eq!(
            render("{RESUME} vs {RECOMMENDATIONS}", &subs),
            "R vs {RECOMMENDATIONS}"
        );
    }

    #[tokio::test]
    async fn test_missing_template_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path());

        let err = store.load(Operation::Suggestion).await.unwrap_err();
        match err {
            ResumeTailorError::TemplateLoad { path, .. } => {
                assert!(path.ends_with("suggestion_system_prompt.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_utf8_template_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path());
        std::fs::write(store.path(Operation::Questions, PromptKind::System), b"\xff\xfe").unwrap();
        std::fs::write(store.path(Operation::Questions, PromptKind::User), "{JOB_DESCRIPTION}").unwrap();

        let err = store.load(Operation::Questions).await.unwrap_err();
        assert!(matches!(err, ResumeTailorError::TemplateLoad { .. }));
    }

    #[tokio::test]
    async fn test_installed_defaults_load_and_reference_their_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path().join("prompts"));

        let written = store.install_defaults(false).unwrap();
        assert_eq!(written.len(), Operation::ALL.len() * 2);
        assert!(store.list().iter().all(|status| status.present));

        let analysis = store.load(Operation::Analysis).await.unwrap();
        assert!(analysis.user.contains("{RESUME}"));
        assert!(analysis.user.contains("{JOB_DESCRIPTION}"));
        assert!(analysis.user.contains("{RECOMMENDATIONS}"));

        let extract = store.load(Operation::Extract).await.unwrap();
        assert!(extract.user.contains("{HTML_CONTENT}"));

        // A second install keeps what is already there
        assert!(store.install_defaults(false).unwrap().is_empty());
        assert_eq!(store.install_defaults(true).unwrap().len(), Operation::ALL.len() * 2);
    }
}
