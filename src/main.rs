//! Resume tailor: AI-assisted resume tailoring from the command line

use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_tailor::cli::{self, Cli, Commands, ConfigAction, JobSource, PromptsAction, SessionCommand, SESSION_HELP};
use resume_tailor::config::{Config, OutputFormat};
use resume_tailor::error::{Result, ResumeTailorError};
use resume_tailor::input::InputManager;
use resume_tailor::llm::prompts::{Operation, PromptStore, Substitutions, JOB_DESCRIPTION, RECOMMENDATIONS, RESUME};
use resume_tailor::llm::CompletionClient;
use resume_tailor::output::formatter::{export_version, suggest_filename};
use resume_tailor::output::{Pane, VersionRenderer};
use resume_tailor::pipeline::generator::require_text;
use resume_tailor::pipeline::Generator;
use resume_tailor::session::Session;
use resume_tailor::web::WebFetcher;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

type TailorSession = Session<CompletionClient>;

const RESUME_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md", "markdown"];

#[tokio::main]
async fn main() {
    // Secrets may live in a local .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Generate {
            resume,
            job,
            iterations,
            format,
            save,
        } => {
            // Parse output format
            let format = match format {
                Some(format) => cli::parse_output_format(&format).map_err(ResumeTailorError::InvalidInput)?,
                None => config.output.format,
            };

            println!("🚀 Resume tailoring");
            println!("📄 Resume: {}", resume.display());
            println!("🤖 Model: {}", config.api.model);

            let mut session = open_session(&config, Some(&resume), Some(job)).await?;

            // Each pass chains on the previous version's analysis
            for pass in 1..=iterations {
                let spinner = spinner(&format!("Generating pass {} of {}...", pass, iterations));
                let outcome = session.generate_version().await;
                spinner.finish_and_clear();

                match outcome? {
                    Some(version) => println!("✅ {} created", version.name),
                    None => {
                        println!("⚠️  The model returned an empty resume; stopping");
                        break;
                    }
                }
            }

            let Some(version) = session.selected() else {
                return Err(ResumeTailorError::Upstream("No version was generated".to_string()));
            };

            // Display results
            let renderer = VersionRenderer::new(config.output.color_output);
            println!("\n{}", renderer.render(version, &format)?);

            if let Some(path) = save {
                export_version(version, &path, format)?;
                println!("💾 Saved {} to {}", version.name, path.display());
            }
        }

        Commands::Suggest { resume, job, stream } => {
            let session = open_session(&config, Some(&resume), Some(job)).await?;
            Generator::<CompletionClient>::require_inputs(session.resume(), session.job())?;
            let subs = Substitutions::from([(RESUME, session.resume()), (JOB_DESCRIPTION, session.job())]);
            run_single(session.generator(), Operation::Suggestion, &subs, stream).await?;
        }

        Commands::Analyze {
            resume,
            job,
            recommendations,
            stream,
        } => {
            let session = open_session(&config, Some(&resume), Some(job)).await?;
            Generator::<CompletionClient>::require_inputs(session.resume(), session.job())?;
            let recommendations = match recommendations {
                Some(path) => InputManager::new().extract_text(&path).await?,
                None => String::new(),
            };
            let subs = Substitutions::from([
                (RESUME, session.resume()),
                (JOB_DESCRIPTION, session.job()),
                (RECOMMENDATIONS, recommendations.as_str()),
            ]);
            run_single(session.generator(), Operation::Analysis, &subs, stream).await?;
        }

        Commands::CoverLetter { resume, job, stream } => {
            let session = open_session(&config, Some(&resume), Some(job)).await?;
            Generator::<CompletionClient>::require_inputs(session.resume(), session.job())?;
            let subs = Substitutions::from([(RESUME, session.resume()), (JOB_DESCRIPTION, session.job())]);
            run_single(session.generator(), Operation::CoverLetter, &subs, stream).await?;
        }

        Commands::Questions { job, stream } => {
            let session = open_session(&config, None, Some(job)).await?;
            require_text("job description", session.job())?;
            let subs = Substitutions::from([(JOB_DESCRIPTION, session.job())]);
            run_single(session.generator(), Operation::Questions, &subs, stream).await?;
        }

        Commands::Linkedin { resume, stream } => {
            let session = open_session(&config, Some(&resume), None).await?;
            require_text("resume text", session.resume())?;
            let subs = Substitutions::from([(RESUME, session.resume())]);
            run_single(session.generator(), Operation::Linkedin, &subs, stream).await?;
        }

        Commands::Extract { url } => {
            let generator = build_generator(&config)?;
            let spinner = spinner("Extracting job description...");
            let description = generator.extract_description(&url).await;
            spinner.finish_and_clear();

            match description? {
                Some(description) => println!("{}", description),
                None => println!("⚠️  No description available from {}", url),
            }
        }

        Commands::Fetch { url } => {
            let fetcher = WebFetcher::new(&config.fetch)?;
            let page = fetcher.fetch(&url).await?;
            println!("{}", page.to_text());
        }

        Commands::Read { file } => {
            let text = InputManager::new().extract_text(&file).await?;
            println!("{}", text);
        }

        Commands::Session { resume, job } => {
            let mut session = open_session(&config, resume.as_deref(), job.into_source()).await?;
            run_interactive(&mut session, &config).await?;
        }

        Commands::Prompts { action } => {
            let store = PromptStore::new(&config.prompts.dir);
            match action {
                PromptsAction::Init { force } => {
                    let written = store.install_defaults(force)?;
                    if written.is_empty() {
                        println!("✅ All templates already present in {}", store.dir().display());
                    }
                    for path in written {
                        println!("📝 {}", path.display());
                    }
                }
                PromptsAction::List => {
                    println!("📚 Prompt templates in {}\n", store.dir().display());
                    for status in store.list() {
                        let marker = if status.present { "✅" } else { "❌" };
                        println!("{} {}", marker, status.operation);
                        println!("     {}", status.system_path.display());
                        println!("     {}", status.user_path.display());
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| ResumeTailorError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("⚙️  Current Configuration ({})\n", config_path.display());
                println!("{}", content);
                match config.api_key() {
                    Some(_) => println!("🔑 {} is set", config.api.api_key_env),
                    None => println!("⚠️  {} is not set", config.api.api_key_env),
                }
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(&config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

fn build_generator(config: &Config) -> Result<Generator<CompletionClient>> {
    let client = CompletionClient::from_config(config)?;
    let prompts = PromptStore::new(&config.prompts.dir);
    let fetcher = WebFetcher::new(&config.fetch)?;
    info!("Using model {} with prompts from {}", client.model(), prompts.dir().display());
    Ok(Generator::new(client, prompts, fetcher))
}

/// Build a session and load whichever inputs were given on the command line
async fn open_session(config: &Config, resume: Option<&Path>, job: Option<JobSource>) -> Result<TailorSession> {
    let mut session = Session::new(build_generator(config)?);

    // Validate and extract the resume
    if let Some(path) = resume {
        cli::validate_file_extension(path, RESUME_EXTENSIONS)
            .map_err(|e| ResumeTailorError::InvalidInput(format!("Resume file: {}", e)))?;
        let chars = session.load_resume_file(path).await?;
        println!("📄 Resume loaded ({} characters)", chars);
    }

    if let Some(source) = job {
        load_job(&mut session, source).await?;
    }

    Ok(session)
}

async fn load_job(session: &mut TailorSession, source: JobSource) -> Result<()> {
    if let Some(path) = source.job {
        let chars = session.load_job_file(&path).await?;
        println!("💼 Job description loaded ({} characters)", chars);
    } else if let Some(text) = source.job_text {
        session.set_job(text);
    } else if let Some(url) = source.job_url {
        let spinner = spinner("Extracting job description...");
        let loaded = session.load_job_from_url(&url).await;
        spinner.finish_and_clear();

        if !loaded? {
            return Err(ResumeTailorError::InvalidInput(format!("No description available from {}", url)));
        }
        println!("💼 Job description extracted from {}", url);
    }
    Ok(())
}

/// One operation, printed whole or chunk by chunk
async fn run_single(
    generator: &Generator<CompletionClient>,
    operation: Operation,
    substitutions: &Substitutions<'_>,
    stream: bool,
) -> Result<()> {
    if stream {
        let mut chunks = generator.stream_operation(operation, substitutions).await?;
        let mut stdout = std::io::stdout();
        while let Some(chunk) = chunks.next().await {
            write!(stdout, "{}", chunk?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
    } else {
        let spinner = spinner(&format!("Running {}...", operation));
        let text = generator.run_operation(operation, substitutions).await;
        spinner.finish_and_clear();
        println!("{}", text?);
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn run_interactive(session: &mut TailorSession, config: &Config) -> Result<()> {
    let renderer = VersionRenderer::new(config.output.color_output);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("🧵 Interactive session. Type `help` for commands.");
    loop {
        print!("resume-tailor> ");
        std::io::stdout().flush()?;

        // Ctrl-C at the prompt ends the session, also after a generation installed the handler
        let next = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = next else {
            break;
        };

        let command = match SessionCommand::parse(&line) {
            None => continue,
            Some(Err(message)) => {
                println!("❌ {}", message);
                continue;
            }
            Some(Ok(command)) => command,
        };

        match handle_session_command(session, command, &renderer, config).await {
            Ok(true) => break,
            Ok(false) => {}
            // Prior versions stay available after a failed command
            Err(e) => println!("❌ {}", e),
        }
    }

    println!("👋 Bye");
    Ok(())
}

/// Returns true when the session should end
async fn handle_session_command(
    session: &mut TailorSession,
    command: SessionCommand,
    renderer: &VersionRenderer,
    config: &Config,
) -> Result<bool> {
    match command {
        SessionCommand::Generate => {
            let spinner = spinner("Generating...");
            let outcome = tokio::select! {
                result = session.generate_version() => Some(result.map(|v| v.map(|v| v.name.clone()))),
                _ = tokio::signal::ctrl_c() => None,
            };
            spinner.finish_and_clear();

            match outcome {
                Some(Ok(Some(name))) => {
                    println!("✅ {} created", name);
                    if let Some(version) = session.selected() {
                        println!("{}", renderer.console().format_pane(version, Pane::Resume));
                    }
                }
                Some(Ok(None)) => println!("⚠️  The model returned an empty resume; no version created"),
                Some(Err(e)) => return Err(e),
                None => println!("⏹️  Generation cancelled"),
            }
        }

        SessionCommand::List => {
            let selected = session.selected().map(|v| v.name.clone());
            print!("{}", renderer.console().format_history(session.history(), selected.as_deref()));
        }

        SessionCommand::Select(name) => {
            let panes = session.select(&name);
            if session.history().select_version(&name).is_none() {
                warn!("No version named {}", name);
            }
            print!("{}", renderer.console().format_panes(&name, &panes));
        }

        SessionCommand::Show(pane) => {
            let Some(version) = session.selected() else {
                println!("ℹ️  No version selected yet");
                return Ok(false);
            };
            match pane {
                None => print!("{}", renderer.render(version, &OutputFormat::Console)?),
                Some(name) => match Pane::parse(&name) {
                    Some(pane) => print!("{}", renderer.console().format_pane(version, pane)),
                    None => println!("❌ Unknown pane `{}`; use resume, analysis or cover", name),
                },
            }
        }

        SessionCommand::JobUrl(url) => {
            load_job(
                session,
                JobSource {
                    job: None,
                    job_text: None,
                    job_url: Some(url),
                },
            )
            .await?;
        }

        SessionCommand::Resume(path) => {
            let chars = session.load_resume_file(&path).await?;
            println!("📄 Resume loaded ({} characters)", chars);
        }

        SessionCommand::Questions => {
            let spinner = spinner("Generating interview questions...");
            let questions = session.generate_questions().await;
            spinner.finish_and_clear();
            println!("{}", questions?);
        }

        SessionCommand::Linkedin => {
            let spinner = spinner("Drafting LinkedIn copy...");
            let copy = session.generate_linkedin().await;
            spinner.finish_and_clear();
            println!("{}", copy?);
        }

        SessionCommand::Export(path) => {
            let Some(version) = session.selected() else {
                println!("ℹ️  No version selected yet");
                return Ok(false);
            };
            let path = if path.is_dir() {
                path.join(suggest_filename(&config.output.format, &version.name))
            } else {
                path
            };
            export_version(version, &path, config.output.format)?;
            println!("💾 Saved {} to {}", version.name, path.display());
        }

        SessionCommand::Help => println!("{}", SESSION_HELP),

        SessionCommand::Quit => return Ok(true),
    }

    Ok(false)
}
