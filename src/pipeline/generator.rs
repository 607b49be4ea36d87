//! Generation operations built on prompt templates and a completion backend

use crate::error::{Result, ResumeTailorError};
use crate::llm::client::{Completion, CompletionRequest, TextStream};
use crate::llm::prompts::{
    render, Operation, PromptStore, Substitutions, HTML_CONTENT, JOB_DESCRIPTION, RECOMMENDATIONS,
    RESUME,
};
use crate::session::history::{TailoredBundle, Version};
use crate::web::fetcher::WebFetcher;
use log::{debug, info, warn};

/// Runs each operation as: load prompts, fill the user template, complete with
/// the operation's system prompt. Holds no per-call state.
pub struct Generator<C> {
    completion: C,
    prompts: PromptStore,
    fetcher: WebFetcher,
}

impl<C: Completion> Generator<C> {
    pub fn new(completion: C, prompts: PromptStore, fetcher: WebFetcher) -> Self {
        Self {
            completion,
            prompts,
            fetcher,
        }
    }

    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    async fn prepare(&self, operation: Operation, substitutions: &Substitutions<'_>) -> Result<CompletionRequest> {
        let pair = self.prompts.load(operation).await?;
        let prompt = render(&pair.user, substitutions);
        debug!("Prepared {} prompt ({} chars)", operation, prompt.len());
        Ok(CompletionRequest::user(prompt).with_system(Some(pair.system)))
    }

    pub async fn run_operation(&self, operation: Operation, substitutions: &Substitutions<'_>) -> Result<String> {
        let request = self.prepare(operation, substitutions).await?;
        info!("Running {} generation", operation);
        self.completion.complete(request).await
    }

    pub async fn stream_operation(
        &self,
        operation: Operation,
        substitutions: &Substitutions<'_>,
    ) -> Result<TextStream> {
        let request = self.prepare(operation, substitutions).await?;
        info!("Streaming {} generation", operation);
        self.completion.stream(request).await
    }

    pub async fn generate_suggestion(&self, resume: &str, job: &str) -> Result<String> {
        let subs = Substitutions::from([(RESUME, resume), (JOB_DESCRIPTION, job)]);
        self.run_operation(Operation::Suggestion, &subs).await
    }

    pub async fn generate_analysis(&self, resume: &str, job: &str, recommendations: &str) -> Result<String> {
        let subs = Substitutions::from([
            (RESUME, resume),
            (JOB_DESCRIPTION, job),
            (RECOMMENDATIONS, recommendations),
        ]);
        self.run_operation(Operation::Analysis, &subs).await
    }

    pub async fn generate_cover_letter(&self, resume: &str, job: &str) -> Result<String> {
        let subs = Substitutions::from([(RESUME, resume), (JOB_DESCRIPTION, job)]);
        self.run_operation(Operation::CoverLetter, &subs).await
    }

    pub async fn generate_questions(&self, job: &str) -> Result<String> {
        let subs = Substitutions::from([(JOB_DESCRIPTION, job)]);
        self.run_operation(Operation::Questions, &subs).await
    }

    pub async fn generate_linkedin(&self, resume: &str) -> Result<String> {
        let subs = Substitutions::from([(RESUME, resume)]);
        self.run_operation(Operation::Linkedin, &subs).await
    }

    /// Fetch a posting and have the model clean it up.
    ///
    /// `Ok(None)` means no description is available: empty URL, failed fetch or
    /// empty page. Template and completion failures still propagate.
    pub async fn extract_description(&self, url: &str) -> Result<Option<String>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        let content = match self.fetcher.fetch(url).await {
            Ok(page) => page.to_text(),
            Err(e) if e.is_recoverable_fetch() => {
                warn!("No description available from {}: {}", url, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let subs = Substitutions::from([(HTML_CONTENT, content.as_str())]);
        let description = self.run_operation(Operation::Extract, &subs).await?;
        Ok(Some(description).filter(|d| !d.trim().is_empty()))
    }

    /// One tailoring pass: suggestion, then analysis of the new suggestion (with the
    /// prior version's analysis as recommendations), then a cover letter.
    /// An empty suggestion yields `None` and nothing else is generated.
    pub async fn tailor(&self, resume: &str, job: &str, prior: Option<&Version>) -> Result<Option<TailoredBundle>> {
        let suggestion = self.generate_suggestion(resume, job).await?;
        if suggestion.trim().is_empty() {
            warn!("Model returned an empty suggestion; no version created");
            return Ok(None);
        }

        let recommendations = prior.map(|v| v.analysis.as_str()).unwrap_or("");
        let analysis = self.generate_analysis(&suggestion, job, recommendations).await?;
        let cover_letter = self.generate_cover_letter(&suggestion, job).await?;

        Ok(Some(TailoredBundle {
            suggestion,
            analysis,
            cover_letter,
        }))
    }
}

impl<C> Generator<C> {
    /// Reject blank résumé or job text before spending a completion call
    pub fn require_inputs(resume: &str, job: &str) -> Result<()> {
        require_text("resume text", resume)?;
        require_text("job description", job)
    }
}

pub fn require_text(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ResumeTailorError::InvalidInput(format!("{} is empty", what)));
    }
    Ok(())
}
