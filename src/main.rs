// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use crate::app_config::{Config, LogLevel};
use crate::app_controller::Controller;
use crate::cancellation::CancellationToken;
use crate::translation::RunOutcome;

mod app_config;
mod app_controller;
mod cancellation;
mod chunker;
mod errors;
mod events;
mod file_utils;
mod progress_store;
mod providers;
mod reformat;
mod translation;
mod writer;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for yanta
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// yanta - Yet Another Novel Translator with AI
///
/// Translates large text files chunk by chunk through the Gemini API,
/// concurrently, in original order, resumable after interruption.
#[derive(Parser, Debug)]
#[command(name = "yanta")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered translation for large text files")]
#[command(long_about = "yanta splits a text file into line chunks, translates them concurrently \
through the Gemini API, and reassembles the output in original order. Progress is persisted \
next to the input so an interrupted run resumes where it stopped.

EXAMPLES:
    yanta novel.txt                        # Translate using default config
    yanta -o out.txt novel.txt             # Explicit output path
    yanta -w 16 -c 50 novel.txt            # 16 workers, 50-line chunks
    yanta -m gemini-1.5-pro novel.txt      # Use a specific model
    yanta /books/                          # Translate every .txt in a directory
    yanta completions bash > yanta.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The API key may also come from the
    GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input text file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file path (auto-derived as <name>_TranslateAI<ext> if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key (overrides config file and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Number of concurrent workers (clamped to 1-50)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Chunk size in lines (clamped to 10-500)
    #[arg(short, long)]
    chunk_size: Option<usize>,

    /// Configuration file path
    #[arg(long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip the post-completion paragraph normalization pass
    #[arg(long)]
    no_reformat: bool,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default;
    // the effective level is applied after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "yanta", &mut std::io::stdout());
        return Ok(());
    }

    run_translate(cli).await
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_level));
    }

    let input_path = options
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    // Load or create configuration, then apply CLI overrides
    let config_existed = std::path::Path::new(&options.config_path).exists();
    let mut config = Config::load_or_create(&options.config_path)?;
    if !config_existed {
        warn!(
            "Config file not found at '{}', created a default one.",
            options.config_path
        );
    }

    if let Some(model) = &options.model {
        config.model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(workers) = options.workers {
        config.workers = Some(workers);
    }
    if let Some(chunk_size) = options.chunk_size {
        config.chunk_size_lines = chunk_size;
    }
    if options.no_reformat {
        config.auto_reformat = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.validate()?;

    let controller = Controller::with_config(config)?;

    // Ctrl-C requests cooperative cancellation: in-flight chunks finish,
    // progress stays resumable
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested - finishing in-flight chunks, progress will be saved");
            signal_token.cancel();
        }
    });

    if input_path.is_dir() {
        controller
            .run_folder(input_path, options.force_overwrite, token)
            .await?;
        return Ok(());
    }

    match controller
        .run(input_path, options.output, options.force_overwrite, token)
        .await?
    {
        Some(RunOutcome::Completed { chunks }) => {
            info!("Done: {} chunk(s) translated", chunks);
        }
        Some(RunOutcome::Interrupted { completed, total, .. }) => {
            warn!(
                "Interrupted - resumable: {}/{} chunks done. Run the same command again to continue.",
                completed, total
            );
        }
        None => {}
    }

    Ok(())
}
