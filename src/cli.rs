//! CLI interface for the resume tailor

use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-tailor")]
#[command(about = "AI-assisted resume tailoring, fit analysis and cover letters")]
#[command(long_about = "Tailor a resume to a job posting with a chat-completion model: rewritten resume, fit analysis, cover letter, interview questions and LinkedIn copy, with a version history in interactive sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Where the job description comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct JobSource {
    /// Path to job description file (TXT, MD, DOCX, PDF)
    #[arg(short, long)]
    pub job: Option<PathBuf>,

    /// Job description given inline
    #[arg(long)]
    pub job_text: Option<String>,

    /// Job posting URL; the description is extracted by the model
    #[arg(long)]
    pub job_url: Option<String>,
}

/// Same as `JobSource`, but the interactive session can start without one
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct OptionalJobSource {
    /// Path to job description file (TXT, MD, DOCX, PDF)
    #[arg(short, long)]
    pub job: Option<PathBuf>,

    /// Job description given inline
    #[arg(long)]
    pub job_text: Option<String>,

    /// Job posting URL; the description is extracted by the model
    #[arg(long)]
    pub job_url: Option<String>,
}

impl OptionalJobSource {
    pub fn into_source(self) -> Option<JobSource> {
        if self.job.is_none() && self.job_text.is_none() && self.job_url.is_none() {
            return None;
        }
        Some(JobSource {
            job: self.job,
            job_text: self.job_text,
            job_url: self.job_url,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full tailoring pass: resume, analysis and cover letter
    Generate {
        /// Path to resume file (PDF, DOCX, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        #[command(flatten)]
        job: JobSource,

        /// Number of chained passes; each pass refines the previous one
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
        iterations: u32,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        format: Option<String>,

        /// Save the final version to a file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Tailored resume only
    Suggest {
        #[arg(short, long)]
        resume: PathBuf,

        #[command(flatten)]
        job: JobSource,

        /// Print the answer as it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Fit analysis of a resume against a job description
    Analyze {
        #[arg(short, long)]
        resume: PathBuf,

        #[command(flatten)]
        job: JobSource,

        /// Earlier recommendations to take into account
        #[arg(long)]
        recommendations: Option<PathBuf>,

        #[arg(long)]
        stream: bool,
    },

    /// Cover letter for a resume and job description
    CoverLetter {
        #[arg(short, long)]
        resume: PathBuf,

        #[command(flatten)]
        job: JobSource,

        #[arg(long)]
        stream: bool,
    },

    /// Likely interview questions for a job description
    Questions {
        #[command(flatten)]
        job: JobSource,

        #[arg(long)]
        stream: bool,
    },

    /// LinkedIn headline, summary and post drafted from a resume
    Linkedin {
        #[arg(short, long)]
        resume: PathBuf,

        #[arg(long)]
        stream: bool,
    },

    /// Extract the job description from a posting URL
    Extract {
        #[arg(short, long)]
        url: String,
    },

    /// Print the visible text of a web page
    Fetch {
        #[arg(short, long)]
        url: String,
    },

    /// Print the text extracted from a document
    Read {
        file: PathBuf,
    },

    /// Interactive session with a version history
    Session {
        #[arg(short, long)]
        resume: Option<PathBuf>,

        #[command(flatten)]
        job: OptionalJobSource,
    },

    /// Prompt template management
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// Write the built-in templates into the prompts directory
    Init {
        /// Overwrite templates that already exist
        #[arg(short, long)]
        force: bool,
    },

    /// List templates and whether they exist
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" | "text" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

/// A line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Generate,
    List,
    Select(String),
    Show(Option<String>),
    JobUrl(String),
    Resume(PathBuf),
    Questions,
    Linkedin,
    Export(PathBuf),
    Help,
    Quit,
}

impl SessionCommand {
    /// `None` for a blank line; `Err` carries a message for the user
    pub fn parse(line: &str) -> Option<Result<SessionCommand, String>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let needs_arg = |usage: &str| Err(format!("usage: {}", usage));
        let command = match word.to_lowercase().as_str() {
            "generate" | "g" => Ok(SessionCommand::Generate),
            "list" | "ls" => Ok(SessionCommand::List),
            // Version names contain a space, so the whole remainder is the name
            "select" if rest.is_empty() => needs_arg("select <version name>"),
            "select" => Ok(SessionCommand::Select(rest.to_string())),
            "show" => Ok(SessionCommand::Show(Some(rest.to_string()).filter(|r| !r.is_empty()))),
            "job-url" if rest.is_empty() => needs_arg("job-url <url>"),
            "job-url" => Ok(SessionCommand::JobUrl(rest.to_string())),
            "resume" if rest.is_empty() => needs_arg("resume <file>"),
            "resume" => Ok(SessionCommand::Resume(PathBuf::from(rest))),
            "questions" => Ok(SessionCommand::Questions),
            "linkedin" => Ok(SessionCommand::Linkedin),
            "export" if rest.is_empty() => needs_arg("export <path>"),
            "export" => Ok(SessionCommand::Export(PathBuf::from(rest))),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
            other => Err(format!("unknown command `{}`; type `help`", other)),
        };
        Some(command)
    }
}

pub const SESSION_HELP: &str = "\
Commands:
  generate            tailor the resume (chains from the latest version)
  list                list versions
  select <name>       select a version, e.g. `select Version 2`
  show [pane]         show the selected version (resume, analysis, cover)
  job-url <url>       load the job description from a posting
  resume <file>       load a resume file
  questions           interview questions for the current job
  linkedin            LinkedIn copy for the current resume
  export <path>       save the selected version (.txt, .md, .json, .html)
  help                this message
  quit                leave the session (Ctrl-C at the prompt does the same)

Ctrl-C while a generation runs cancels it; no version is created.";

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_job_sources_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "resume-tailor", "suggest", "-r", "cv.md", "--job", "job.txt", "--job-text", "inline",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["resume-tailor", "suggest", "-r", "cv.md"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["resume-tailor", "session"]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "resume-tailor", "generate", "-r", "cv.pdf", "--job-url", "https://jobs.example/1", "-n", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { iterations, job, .. } => {
                assert_eq!(iterations, 2);
                assert_eq!(job.job_url.as_deref(), Some("https://jobs.example/1"));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD").unwrap(), OutputFormat::Markdown);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_session_help_lists_every_command() {
        for word in ["generate", "list", "select", "show", "job-url", "resume", "questions", "linkedin", "export", "quit"] {
            assert!(SESSION_HELP.contains(word), "help is missing {word}");
            assert!(matches!(SessionCommand::parse(&format!("{word} x")), Some(Ok(_))));
        }
        assert!(SESSION_HELP.contains("Ctrl-C"));
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(SessionCommand::parse("   "), None);
        assert_eq!(
            SessionCommand::parse("select Version 2"),
            Some(Ok(SessionCommand::Select("Version 2".to_string())))
        );
        assert_eq!(SessionCommand::parse("show"), Some(Ok(SessionCommand::Show(None))));
        assert_eq!(
            SessionCommand::parse("show analysis"),
            Some(Ok(SessionCommand::Show(Some("analysis".to_string()))))
        );
        assert!(matches!(SessionCommand::parse("export"), Some(Err(_))));
        assert!(matches!(SessionCommand::parse("dance"), Some(Err(_))));
        assert_eq!(SessionCommand::parse("QUIT"), Some(Ok(SessionCommand::Quit)));
    }
}
