// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use srtvoice::app_config::{self, Config, SynthesisProvider};
use srtvoice::file_utils::FileManager;
use srtvoice::{AppError, Controller};

/// CLI Wrapper for SynthesisProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSynthesisProvider {
    Http,
    Command,
}

impl From<CliSynthesisProvider> for SynthesisProvider {
    fn from(cli_provider: CliSynthesisProvider) -> Self {
        match cli_provider {
            CliSynthesisProvider::Http => SynthesisProvider::Http,
            CliSynthesisProvider::Command => SynthesisProvider::Command,
        }
    }
}

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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Narrate a subtitle file or directory (default command)
    #[command(alias = "speak")]
    Narrate(NarrateArgs),

    /// Generate shell completions for srtvoice
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct NarrateArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for the output WAV parts (default: <input>_audio next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Voice or style identifier for the synthesis engine
    #[arg(short, long)]
    voice: Option<String>,

    /// Number of cues per output file
    #[arg(short = 'n', long)]
    chunk_size: Option<usize>,

    /// Synthesis engine to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSynthesisProvider>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Only check that the synthesis engine is reachable
    #[arg(long)]
    check: bool,
}

/// srtvoice - Subtitle narration
///
/// Turns an SRT subtitle track into spoken WAV audio, keeping the original
/// pauses between cues.
#[derive(Parser, Debug)]
#[command(name = "srtvoice")]
#[command(version)]
#[command(about = "Narrate subtitle files with a speech synthesis engine")]
#[command(long_about = "srtvoice synthesizes speech for every subtitle cue, inserts silence for the gaps between cues and writes the result as numbered WAV parts.

EXAMPLES:
    srtvoice movie.srt                          # Narrate using default config
    srtvoice -o out/ movie.srt                  # Choose the output directory
    srtvoice -v v2/en_speaker_3 movie.srt       # Use a different voice
    srtvoice -n 50 movie.srt                    # 50 cues per output file
    srtvoice -p command movie.srt               # Use the local command engine
    srtvoice --check movie.srt                  # Only test the engine connection
    srtvoice --log-level debug /subtitles/      # Process an entire directory
    srtvoice completions bash > srtvoice.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUT:
    Parts are written as output_part_1.wav, output_part_2.wav, ... Each part
    holds the audio of chunk_size consecutive cues (default 100).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory for the output WAV parts (default: <input>_audio next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Voice or style identifier for the synthesis engine
    #[arg(short, long)]
    voice: Option<String>,

    /// Number of cues per output file
    #[arg(short = 'n', long)]
    chunk_size: Option<usize>,

    /// Synthesis engine to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSynthesisProvider>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Only check that the synthesis engine is reachable
    #[arg(long)]
    check: bool,
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

    // @returns: Emoji and ANSI colour for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
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
            let (emoji, colour) = Self::decoration(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {}{}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install with the most verbose level; the effective level is set via set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtvoice", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Narrate(args)) => run_narrate(args).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let narrate_args = NarrateArgs {
                input_path,
                output_dir: cli.output_dir,
                voice: cli.voice,
                chunk_size: cli.chunk_size,
                provider: cli.provider,
                config_path: cli.config_path,
                log_level: cli.log_level,
                check: cli.check,
            };
            run_narrate(narrate_args).await
        }
    }
}

/// Load the config file, creating a default one when it is missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

async fn run_narrate(options: NarrateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    // Missing input is reported before anything else is touched
    if !options.input_path.exists() {
        return Err(AppError::MissingInput(options.input_path.clone()).into());
    }

    let mut config = load_config(&options.config_path)?;

    if let Some(voice) = &options.voice {
        config.voice = voice.clone();
    }
    if let Some(chunk_size) = options.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(provider) = &options.provider {
        config.synthesis.provider = provider.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;

    if options.check {
        controller.test_connection().await
            .context("Synthesis engine check failed")?;
        info!("Synthesis engine is reachable ({})", controller.config().synthesis.provider.display_name());
        return Ok(());
    }

    // Stop between cues on Ctrl-C; the partial chunk is not written
    let cancellation = controller.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current cue");
            cancellation.cancel();
        }
    });

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| FileManager::default_output_dir(&options.input_path));

    if options.input_path.is_dir() {
        let reports = controller.run_folder(&options.input_path, &output_dir).await?;
        let parts: usize = reports.iter().map(|r| r.output_files.len()).sum();
        info!("Audio generation complete: {} file(s), {} part(s) in {:?}", reports.len(), parts, output_dir);
    } else {
        let report = controller.run(&options.input_path, &output_dir).await?;
        info!(
            "Audio generation complete: {} cue(s), {} part(s) in {:?}",
            report.summary.cues_processed,
            report.output_files.len(),
            output_dir
        );
    }

    Ok(())
}
