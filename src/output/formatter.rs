//! Output formatters for generated versions

use crate::config::OutputFormat;
use crate::error::{Result, ResumeTailorError};
use crate::session::history::{Version, VersionHistory, VersionPanes};
use askama::Template;
use colored::{Color, Colorize};
use pulldown_cmark::{html, Event, Options, Parser};
use std::path::Path;

/// Trait for formatting a generated version
pub trait OutputFormatter {
    fn format_version(&self, version: &Version) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Which of a version's texts to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Resume,
    Analysis,
    CoverLetter,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Resume, Pane::Analysis, Pane::CoverLetter];

    pub fn title(&self) -> &'static str {
        match self {
            Pane::Resume => "Resume",
            Pane::Analysis => "Analysis",
            Pane::CoverLetter => "Cover Letter",
        }
    }

    pub fn text<'a>(&self, version: &'a Version) -> &'a str {
        match self {
            Pane::Resume => &version.suggestion,
            Pane::Analysis => &version.analysis,
            Pane::CoverLetter => &version.cover_letter,
        }
    }

    pub fn parse(name: &str) -> Option<Pane> {
        match name.to_lowercase().as_str() {
            "resume" | "suggestion" => Some(Pane::Resume),
            "analysis" => Some(Pane::Analysis),
            "cover" | "cover-letter" | "letter" => Some(Pane::CoverLetter),
            _ => None,
        }
    }
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
}

/// JSON formatter for scripting
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter;

/// Standalone HTML page; the model's Markdown is rendered to HTML
pub struct HtmlFormatter {
    include_styles: bool,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ name }}</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .pane {
            background: white;
            padding: 30px;
            margin: 25px 0;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .pane h2 {
            color: #007acc;
            border-bottom: 2px solid #e9ecef;
            padding-bottom: 10px;
        }
        .metadata {
            font-size: 0.9em;
            color: #6c757d;
        }
    </style>
    {% endif %}
</head>
<body>
    <h1>{{ name }}</h1>
    <p class="metadata">Generated {{ generated_at }}</p>
    <section class="pane"><h2>Resume</h2>{{ resume_html|safe }}</section>
    <section class="pane"><h2>Analysis</h2>{{ analysis_html|safe }}</section>
    <section class="pane"><h2>Cover Letter</h2>{{ cover_letter_html|safe }}</section>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    name: String,
    generated_at: String,
    resume_html: String,
    analysis_html: String,
    cover_letter_html: String,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        let rule = "─".repeat(title.chars().count().max(40));
        format!("{}\n{}\n", self.colorize(title, Color::Cyan), self.colorize(&rule, Color::BrightBlack))
    }

    /// One pane of a version, as shown by the interactive `show` command
    pub fn format_pane(&self, version: &Version, pane: Pane) -> String {
        let mut output = self.format_header(&format!("{} · {}", version.name, pane.title()));
        output.push_str(&placeholder_if_empty(pane.text(version)));
        output.push('\n');
        output
    }

    /// What `select` shows; an unknown version renders as three empty panes
    pub fn format_panes(&self, title: &str, panes: &VersionPanes) -> String {
        let mut output = format!("{}\n", self.colorize(&format!("📄 {}", title), Color::Green));
        for (pane, text) in [
            (Pane::Resume, &panes.suggestion),
            (Pane::Analysis, &panes.analysis),
            (Pane::CoverLetter, &panes.cover_letter),
        ] {
            output.push_str(&self.format_header(pane.title()));
            output.push_str(&placeholder_if_empty(text));
            output.push_str("\n\n");
        }
        output
    }

    /// Version list with the selected entry marked
    pub fn format_history(&self, history: &VersionHistory, selected: Option<&str>) -> String {
        if history.is_empty() {
            return "No versions yet. Run `generate` to create one.\n".to_string();
        }

        let mut output = String::new();
        for version in history.iter() {
            let marker = if Some(version.name.as_str()) == selected { "▶" } else { " " };
            output.push_str(&format!(
                "{} {} ({})\n",
                marker,
                self.colorize(&version.name, Color::Green),
                version.created_at.format("%H:%M:%S")
            ));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_version(&self, version: &Version) -> Result<String> {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n\n",
            self.colorize(&format!("📄 {}", version.name), Color::Green),
            self.colorize(&version.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(), Color::BrightBlack)
        ));

        for pane in Pane::ALL {
            output.push_str(&self.format_header(pane.title()));
            output.push_str(&placeholder_if_empty(pane.text(version)));
            output.push_str("\n\n");
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_version(&self, version: &Version) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(version)?
        } else {
            serde_json::to_string(version)?
        };
        Ok(json)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_version(&self, version: &Version) -> Result<String> {
        let mut output = format!("# {}\n\n", version.name);
        output.push_str(&format!(
            "*Generated {}*\n\n",
            version.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for pane in Pane::ALL {
            output.push_str(&format!("## {}\n\n", pane.title()));
            output.push_str(pane.text(version).trim());
            output.push_str("\n\n");
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_version(&self, version: &Version) -> Result<String> {
        let template = HtmlTemplate {
            include_styles: self.include_styles,
            name: version.name.clone(),
            generated_at: version.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            resume_html: markdown_to_html(&version.suggestion),
            analysis_html: markdown_to_html(&version.analysis),
            cover_letter_html: markdown_to_html(&version.cover_letter),
        };

        template
            .render()
            .map_err(|e| ResumeTailorError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

/// Render model output (Markdown) to an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    // Raw HTML in model output is shown as text, never emitted as markup
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn placeholder_if_empty(text: &str) -> String {
    if text.trim().is_empty() {
        "(empty)".to_string()
    } else {
        text.trim_end().to_string()
    }
}

/// Coordinates the formatters
pub struct VersionRenderer {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

impl VersionRenderer {
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter,
            html_formatter: HtmlFormatter::new(true),
        }
    }

    pub fn console(&self) -> &ConsoleFormatter {
        &self.console_formatter
    }

    pub fn render(&self, version: &Version, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_version(version),
            OutputFormat::Json => self.json_formatter.format_version(version),
            OutputFormat::Markdown => self.markdown_formatter.format_version(version),
            OutputFormat::Html => self.html_formatter.format_version(version),
        }
    }
}

impl Default for VersionRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn save_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Write a version to `path` in the format its extension names. Files never
/// carry terminal color codes, whatever the console setting is.
pub fn export_version(version: &Version, path: &Path, default: OutputFormat) -> Result<OutputFormat> {
    let format = format_for_path(path, default);
    let content = VersionRenderer::new(false).render(version, &format)?;
    save_to_file(&content, path)?;
    Ok(format)
}

/// Pick the format from a file extension, falling back to `default`
pub fn format_for_path(path: &Path, default: OutputFormat) -> OutputFormat {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("json") => OutputFormat::Json,
        Some("md") | Some("markdown") => OutputFormat::Markdown,
        Some("html") | Some("htm") => OutputFormat::Html,
        Some("txt") => OutputFormat::Console,
        _ => default,
    }
}

pub fn suggest_filename(format: &OutputFormat, version_name: &str) -> String {
    let base_name = version_name.to_lowercase().replace(' ', "_");
    match format {
        OutputFormat::Console => format!("{}.txt", base_name),
        OutputFormat::Json => format!("{}.json", base_name),
        OutputFormat::Markdown => format!("{}.md", base_name),
        OutputFormat::Html => format!("{}.html", base_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::history::TailoredBundle;

    fn version() -> Version {
        let mut history = VersionHistory::new();
        history
            .add_version(TailoredBundle {
                suggestion: "# Jane Doe\n\n- Shipped **Rust** services".to_string(),
                analysis: "Score: 82".to_string(),
                cover_letter: String::new(),
            })
            .clone()
    }

    #[test]
    fn test_console_without_colors_lists_all_panes() {
        let text = ConsoleFormatter::new(false).format_version(&version()).unwrap();
        assert!(text.contains("Version 1"));
        assert!(text.contains("Resume\n"));
        assert!(text.contains("Score: 82"));
        assert!(text.contains("(empty)"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_json_round_trips() {
        let v = version();
        let json = JsonFormatter::new(false).format_version(&v).unwrap();
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_html_renders_markdown() {
        let html = HtmlFormatter::new(false).format_version(&version()).unwrap();
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains("<strong>Rust</strong>"));
        assert!(html.contains("<title>Version 1</title>"));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn test_raw_html_in_model_output_is_escaped() {
        let html = markdown_to_html("Hi <script>alert(1)</script>\n\n<div onclick=\"x()\">block</div>\n");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<div"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_exported_text_has_no_color_codes() {
        colored::control::set_override(true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("version_1.txt");

        let format = export_version(&version(), &path, OutputFormat::Markdown).unwrap();
        colored::control::unset_override();

        assert_eq!(format, OutputFormat::Console);
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("📄 Version 1"));
        assert!(!saved.contains('\u{1b}'));
    }

    #[test]
    fn test_markdown_has_a_section_per_pane() {
        let md = MarkdownFormatter.format_version(&version()).unwrap();
        assert!(md.starts_with("# Version 1\n"));
        assert!(md.contains("## Resume\n\n# Jane Doe"));
        assert!(md.contains("## Analysis\n\nScore: 82"));
        assert!(md.contains("## Cover Letter"));
    }

    #[test]
    fn test_missing_version_panes_are_empty() {
        let text = ConsoleFormatter::new(false).format_panes("Nonexistent", &VersionPanes::default());
        assert_eq!(text.matches("(empty)").count(), 3);
    }

    #[test]
    fn test_history_marks_selection() {
        let mut history = VersionHistory::new();
        history.add_version(TailoredBundle::default());
        history.add_version(TailoredBundle::default());

        let listing = ConsoleFormatter::new(false).format_history(&history, Some("Version 2"));
        let lines: Vec<&str> = listing.lines().collect();
        assert!(lines[0].starts_with("  Version 1"));
        assert!(lines[1].starts_with("▶ Version 2"));
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(format_for_path(Path::new("out/v1.HTML"), OutputFormat::Console), OutputFormat::Html);
        assert_eq!(format_for_path(Path::new("v1.json"), OutputFormat::Console), OutputFormat::Json);
        assert_eq!(format_for_path(Path::new("v1"), OutputFormat::Markdown), OutputFormat::Markdown);
        assert_eq!(suggest_filename(&OutputFormat::Html, "Version 3"), "version_3.html");
    }

    #[test]
    fn test_pane_names() {
        assert_eq!(Pane::parse("Cover"), Some(Pane::CoverLetter));
        assert_eq!(Pane::parse("resume"), Some(Pane::Resume));
        assert_eq!(Pane::parse("salary"), None);
    }
}
