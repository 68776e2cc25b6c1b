//! wordloom CLI - .docx decoding and encoding tool
//!
//! Sniffs input formats, decodes packages (or HTML/MHTML) to HTML or JSON,
//! and encodes HTML back into a .docx package.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use wordloom::render::{report_json, summarize, JsonFormat};
use wordloom::{DecodeOptions, EncodeOptions};

/// Word package decoding to HTML/JSON and HTML encoding to .docx
#[derive(Parser)]
#[command(
    name = "wordloom",
    version,
    about = "Convert .docx packages to HTML or JSON and back",
    long_about = "wordloom - .docx conversion tool.\n\n\
                  Decodes .docx, HTML and MHTML input into HTML or a JSON document model,\n\
                  and encodes HTML into a .docx package. Set RUST_LOG=debug for diagnostics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the detected input format
    Sniff {
        /// Input file path
        input: PathBuf,
    },

    /// Decode a document to HTML or JSON
    Decode {
        /// Input file path
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "html")]
        format: OutputFormat,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decode options as JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Encode an HTML file into a .docx package
    Encode {
        /// Input HTML file path
        input: PathBuf,

        /// Output .docx path
        #[arg(short, long)]
        output: PathBuf,

        /// Encode options as JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Document title (overrides the config)
        #[arg(long)]
        title: Option<String>,
    },

    /// Show document information and diagnostics
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Decode output format
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Canonical HTML
    Html,
    /// HTML and document model as JSON
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sniff { input } => {
            let data = fs::read(&input)?;
            let sniffed = wordloom::sniff(&data, file_name(&input).as_deref());
            let marker = if sniffed.format.is_supported() {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            println!("{} {}: {}", marker, input.display(), sniffed.format.name());
            for warning in &sniffed.warnings {
                println!("  {} {}", "!".yellow().bold(), warning);
            }
        }

        Commands::Decode {
            input,
            format,
            output,
            config,
            compact,
        } => {
            let options = match &config {
                Some(path) => DecodeOptions::from_json(&fs::read_to_string(path)?)?,
                None => DecodeOptions::default(),
            };

            let pb = create_spinner("Decoding document...");
            let decoded = wordloom::decode_file_with_options(&input, &options)?;
            pb.finish_and_clear();
            log::info!(
                "decoded {} with method {:?}",
                input.display(),
                decoded.model.metadata.method
            );

            let rendered = match format {
                OutputFormat::Html => decoded.html.clone(),
                OutputFormat::Json => {
                    let json_format = if compact {
                        JsonFormat::Compact
                    } else {
                        JsonFormat::Pretty
                    };
                    report_json(&decoded.html, &decoded.model, json_format)?
                }
            };
            write_output(output.as_ref(), &rendered)?;

            for warning in decoded.model.metadata.warnings() {
                eprintln!("{} {}", "!".yellow().bold(), warning);
            }
            if let Some(path) = &output {
                println!("{} Decoded to {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Encode {
            input,
            output,
            config,
            title,
        } => {
            let mut options = match &config {
                Some(path) => EncodeOptions::from_json(&fs::read_to_string(path)?)?,
                None => EncodeOptions::default(),
            };
            if let Some(title) = title {
                options = options.with_title(title);
            }

            let pb = create_spinner("Encoding package...");
            let html = fs::read_to_string(&input)?;
            let bytes = wordloom::encode_html(&html, &options)?;
            fs::write(&output, &bytes)?;
            pb.finish_and_clear();

            println!(
                "{} Encoded {} ({} bytes, {})",
                "✓".green().bold(),
                output.display(),
                bytes.len(),
                wordloom::DOCX_MEDIA_TYPE
            );
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing document...");
            let decoded = wordloom::decode_file(&input)?;
            pb.finish_and_clear();

            let summary = summarize(&decoded.model);
            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                file_name(&input).unwrap_or_default()
            );
            if let Some(format) = &summary.format {
                println!("{}: {}", "Format".bold(), format);
            }
            if let Some(method) = &summary.method {
                println!("{}: {}", "Method".bold(), method);
            }
            if let Some(title) = &summary.title {
                println!("{}: {}", "Title".bold(), title);
            }
            if let Some(kind) = summary.letterhead {
                println!("{}: {}", "Letterhead".bold(), kind.as_str());
            }

            println!("\n{}", "Content".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Blocks".bold(), summary.blocks);
            println!("{}: {}", "Headings".bold(), summary.headings);
            println!("{}: {}", "Tables".bold(), summary.tables);
            println!("{}: {}", "Images".bold(), summary.images);
            println!(
                "{}: {} / {}",
                "Footnotes / Endnotes".bold(),
                summary.footnotes,
                summary.endnotes
            );
            println!(
                "{}: {}",
                "Words".bold(),
                decoded.model.plain_text().split_whitespace().count()
            );

            if !summary.corruption.is_empty() || !summary.warnings.is_empty() {
                println!("\n{}", "Diagnostics".cyan().bold());
                println!("{}", "─".repeat(40));
                for flag in &summary.corruption {
                    println!("{} {}", "✗".red().bold(), flag);
                }
                for warning in &summary.warnings {
                    println!("{} {}", "!".yellow().bold(), warning);
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn print_version() {
    println!("{} {}", "wordloom".green().bold(), env!("CARGO_PKG_VERSION"));
    println!(".docx decoding to HTML/JSON and HTML encoding to .docx");
    println!();
    println!("Input formats: DOCX, HTML, MHTML");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_encode_then_decode_json() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("in.html");
        let docx = dir.path().join("out.docx");
        let json = dir.path().join("out.json");
        fs::write(&html, "<h1>Budget</h1><p>Approved.</p>").unwrap();

        run(Cli::parse_from([
            "wordloom",
            "encode",
            html.to_str().unwrap(),
            "-o",
            docx.to_str().unwrap(),
            "--title",
            "Budget",
        ]))
        .unwrap();
        run(Cli::parse_from([
            "wordloom",
            "decode",
            docx.to_str().unwrap(),
            "--format",
            "json",
            "-o",
            json.to_str().unwrap(),
        ]))
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["model"]["metadata"]["title"], "Budget");
        assert_eq!(value["model"]["blocks"][0]["type"], "heading");
        assert!(value["html"].as_str().unwrap().contains("Approved."));
    }

    #[test]
    fn test_decode_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        let config = dir.path().join("decode.json");
        let out = dir.path().join("page.out.html");
        fs::write(&html, "<p>Hello</p>").unwrap();
        fs::write(&config, r#"{"large_file_threshold": 1024}"#).unwrap();

        run(Cli::parse_from([
            "wordloom",
            "decode",
            html.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ]))
        .unwrap();
        assert!(fs::read_to_string(&out).unwrap().contains("Hello"));
    }
}
