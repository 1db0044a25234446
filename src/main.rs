// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};

use animejp::app_config::{self, Config};
use animejp::app_controller::Controller;
use animejp::server;
use animejp::subtitle_processor;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch subtitles, extract study material and write a .nihongocards file
    Analyze {
        /// Video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Anthropic API key (ANTHROPIC_API_KEY takes precedence)
        #[arg(short, long)]
        api_key: Option<String>,

        /// Directory for the .nihongocards file (defaults to the configured one)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Force overwrite of an existing output file
        #[arg(short, long = "force")]
        force_overwrite: bool,
    },

    /// Print the normalized Japanese transcript of a video
    Transcript {
        /// Video URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Print the normalized transcript of a local .vtt or .srt file
    Normalize {
        /// Subtitle file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completions for animejp
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// animejp - Japanese study cards from anime subtitles
///
/// Pulls the Japanese subtitles of a video with yt-dlp, cleans them into a
/// transcript, and asks Claude for N2+ vocabulary and grammar.
#[derive(Parser, Debug)]
#[command(name = "animejp")]
#[command(version)]
#[command(about = "Japanese study cards from anime subtitles")]
#[command(long_about = "animejp fetches Japanese subtitles with yt-dlp and turns them into study cards.

EXAMPLES:
    animejp analyze https://www.youtube.com/watch?v=ID      # Write <title>.nihongocards
    animejp transcript https://www.youtube.com/watch?v=ID   # Print the cleaned transcript
    animejp normalize episode.ja.vtt                        # Clean a local subtitle file
    animejp serve --port 5001                               # Start the web UI
    animejp completions bash > animejp.bash                 # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Symbol and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("✖", "1;31"),
            Level::Warn => ("⚠", "1;33"),
            Level::Info => ("•", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("…", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (symbol, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, symbol, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "animejp", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = Config::load_or_create(&cli.config_path)?;
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, take it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Analyze { url, api_key, output_dir, force_overwrite } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            run_analyze(config, &url, api_key.as_deref(), output_dir, force_overwrite).await
        },
        Commands::Transcript { url } => run_transcript(config, &url).await,
        Commands::Normalize { file } => {
            let transcript = subtitle_processor::parse_subtitle_file(&file)?;
            println!("{}", transcript);
            Ok(())
        },
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.server.effective_port());
            let host = config.server.host.clone();
            let controller = Arc::new(Controller::with_config(config)?);
            server::start_http_server(controller, &host, port).await
        },
        Commands::Completions { .. } => Ok(()),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

async fn run_analyze(config: Config, url: &str, api_key: Option<&str>, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
    let controller = Controller::with_config(config)?;

    let progress = spinner("Fetching subtitles and analyzing");
    let result = controller.analyze(url, api_key).await;
    progress.finish_and_clear();

    let report = result.map_err(|e| anyhow!(e))?;
    info!(
        "\"{}\": {} vocabulary items, {} grammar items",
        report.title,
        report.vocabulary.len(),
        report.grammar.len()
    );

    match Controller::save_cards(&report, &output_dir, force_overwrite)? {
        Some(path) => info!("Success: {:?}", path),
        None => warn!("Nothing written"),
    }

    Ok(())
}

async fn run_transcript(config: Config, url: &str) -> Result<()> {
    let controller = Controller::with_config(config)?;

    let progress = spinner("Fetching subtitles");
    let result = controller.transcript(url).await;
    progress.finish_and_clear();

    let fetched = result.map_err(|e| anyhow!(e))?;
    info!("Title: {} ({} captions)", fetched.title, fetched.source);
    println!("{}", fetched.text);

    Ok(())
}
