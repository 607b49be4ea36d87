//! Session-scoped state: current inputs and the version history they produced
//!
//! A `Session` is created by the UI layer and passed to every operation; nothing
//! here is process-global.

pub mod history;

pub use history::{TailoredBundle, Version, VersionHistory, VersionPanes};

use crate::error::Result;
use crate::input::InputManager;
use crate::llm::client::Completion;
use crate::pipeline::generator::{require_text, Generator};
use log::info;
use std::path::Path;

pub struct Session<C> {
    generator: Generator<C>,
    input: InputManager,
    resume: String,
    job: String,
    history: VersionHistory,
    selected: Option<String>,
}

impl<C: Completion> Session<C> {
    pub fn new(generator: Generator<C>) -> Self {
        Self {
            generator,
            // Files are re-read on every load so edits between commands are picked up
            input: InputManager::new().with_cache(false),
            resume: String::new(),
            job: String::new(),
            history: VersionHistory::new(),
            selected: None,
        }
    }

    pub fn generator(&self) -> &Generator<C> {
        &self.generator
    }

    pub fn resume(&self) -> &str {
        &self.resume
    }

    pub fn set_resume(&mut self, text: impl Into<String>) {
        self.resume = text.into();
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn set_job(&mut self, text: impl Into<String>) {
        self.job = text.into();
    }

    /// Replace the résumé with the text of an uploaded file
    pub async fn load_resume_file(&mut self, path: &Path) -> Result<usize> {
        self.resume = self.input.extract_text(path).await?;
        info!("Loaded resume from {} ({} chars)", path.display(), self.resume.len());
        Ok(self.resume.len())
    }

    pub async fn load_job_file(&mut self, path: &Path) -> Result<usize> {
        self.job = self.input.extract_text(path).await?;
        info!("Loaded job description from {} ({} chars)", path.display(), self.job.len());
        Ok(self.job.len())
    }

    /// Pull the job description from a posting URL. Returns false, leaving the
    /// current job text alone, when no description is available.
    pub async fn load_job_from_url(&mut self, url: &str) -> Result<bool> {
        match self.generator.extract_description(url).await? {
            Some(description) => {
                self.job = description;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Tailor the current résumé, chaining from the latest version when there is one.
    /// On failure the history is left exactly as it was.
    pub async fn generate_version(&mut self) -> Result<Option<&Version>> {
        Generator::<C>::require_inputs(&self.resume, &self.job)?;

        let bundle = self
            .generator
            .tailor(&self.resume, &self.job, self.history.latest())
            .await?;

        match bundle {
            Some(bundle) => {
                let version = self.history.add_version(bundle);
                info!("Created {}", version.name);
                self.selected = Some(version.name.clone());
                Ok(Some(version))
            }
            None => Ok(None),
        }
    }

    /// Select a version by name for display; unknown names give empty panes
    pub fn select(&mut self, name: &str) -> VersionPanes {
        match self.history.select_version(name) {
            Some(version) => {
                self.selected = Some(version.name.clone());
                VersionPanes::from(version)
            }
            None => VersionPanes::default(),
        }
    }

    pub fn selected(&self) -> Option<&Version> {
        self.selected
            .as_deref()
            .and_then(|name| self.history.select_version(name))
    }

    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    /// Version names in creation order
    pub fn versions(&self) -> Vec<&str> {
        self.history.names()
    }

    pub async fn generate_questions(&self) -> Result<String> {
        require_text("job description", &self.job)?;
        self.generator.generate_questions(&self.job).await
    }

    pub async fn generate_linkedin(&self) -> Result<String> {
        require_text("resume text", &self.resume)?;
        self.generator.generate_linkedin(&self.resume).await
    }
}
