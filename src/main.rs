// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, anyhow, Context};
use log::{LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::Config;
use crate::style_processor::{EnglishMode, NumberMode, ProfanityMode, RegisterStyle};
use app_controller::Controller;

mod app_config;
mod app_controller;
mod correction;
mod dictionary;
mod errors;
mod numerals;
mod pipeline;
mod segment_merger;
mod style_processor;
mod subtitle;
mod transcript;

/// CLI Wrapper for RegisterStyle to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliRegisterStyle {
    Spoken,
    Semi,
    Written,
}

impl From<CliRegisterStyle> for RegisterStyle {
    fn from(cli_style: CliRegisterStyle) -> Self {
        match cli_style {
            CliRegisterStyle::Spoken => RegisterStyle::Spoken,
            CliRegisterStyle::Semi => RegisterStyle::Semi,
            CliRegisterStyle::Written => RegisterStyle::Written,
        }
    }
}

/// CLI Wrapper for EnglishMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEnglishMode {
    Keep,
    Translate,
    Bilingual,
}

impl From<CliEnglishMode> for EnglishMode {
    fn from(cli_mode: CliEnglishMode) -> Self {
        match cli_mode {
            CliEnglishMode::Keep => EnglishMode::Keep,
            CliEnglishMode::Translate => EnglishMode::Translate,
            CliEnglishMode::Bilingual => EnglishMode::Bilingual,
        }
    }
}

/// CLI Wrapper for NumberMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliNumberMode {
    Arabic,
    Chinese,
}

impl From<CliNumberMode> for NumberMode {
    fn from(cli_mode: CliNumberMode) -> Self {
        match cli_mode {
            CliNumberMode::Arabic => NumberMode::Arabic,
            CliNumberMode::Chinese => NumberMode::Chinese,
        }
    }
}

/// CLI Wrapper for ProfanityMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProfanityMode {
    Keep,
    Mask,
    Mild,
}

impl From<CliProfanityMode> for ProfanityMode {
    fn from(cli_mode: CliProfanityMode) -> Self {
        match cli_mode {
            CliProfanityMode::Keep => ProfanityMode::Keep,
            CliProfanityMode::Mask => ProfanityMode::Mask,
            CliProfanityMode::Mild => ProfanityMode::Mild,
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build subtitles from a transcript and voice activity file (default command)
    #[command(alias = "process")]
    Process(ProcessArgs),

    /// Generate shell completions for cantosub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ProcessArgs {
    /// Transcript JSON file with word-level timing
    #[arg(value_name = "TRANSCRIPT")]
    transcript_path: PathBuf,

    /// Voice activity JSON file with speech intervals
    #[arg(short, long, value_name = "VAD")]
    vad: PathBuf,

    /// Output subtitle file (defaults to the transcript path with .srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Register conversion style
    #[arg(long, value_enum)]
    style: Option<CliRegisterStyle>,

    /// Policy for embedded English text
    #[arg(long, value_enum)]
    english: Option<CliEnglishMode>,

    /// Numeral notation policy
    #[arg(long, value_enum)]
    numbers: Option<CliNumberMode>,

    /// Profanity handling policy
    #[arg(long, value_enum)]
    profanity: Option<CliProfanityMode>,

    /// Re-split lines that exceed the display width
    #[arg(long)]
    split_long: bool,

    /// Enable LLM sentence correction via the configured endpoint
    #[arg(long)]
    correct: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Also write a plain-text transcript next to the subtitle file
    #[arg(long)]
    txt: bool,
}

/// CantoSub - Cantonese Subtitle Builder
///
/// Turns raw speech-to-text output and voice activity detection into
/// display-ready Cantonese subtitles.
#[derive(Parser, Debug)]
#[command(name = "cantosub")]
#[command(author = "CantoSub Team")]
#[command(version = "1.0.0")]
#[command(about = "Cantonese subtitle alignment and styling tool")]
#[command(long_about = "CantoSub merges speech-to-text words with voice activity intervals into subtitle cues, then applies register, profanity, numeral and English transforms.

EXAMPLES:
    cantosub episode.json --vad episode.vad.json          # Process using default config
    cantosub episode.json --vad episode.vad.json -o out.srt
    cantosub --style written episode.json --vad episode.vad.json
    cantosub --profanity mask --numbers arabic episode.json --vad episode.vad.json
    cantosub --correct episode.json --vad episode.vad.json  # With sentence correction
    cantosub --log-level debug episode.json --vad episode.vad.json
    cantosub completions bash > cantosub.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

OUTPUT:
    The default output path replaces the transcript extension with .srt.
    Pass --txt to also write a plain-text transcript next to it.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transcript JSON file with word-level timing
    #[arg(value_name = "TRANSCRIPT")]
    transcript_path: Option<PathBuf>,

    /// Voice activity JSON file with speech intervals
    #[arg(short, long, value_name = "VAD")]
    vad: Option<PathBuf>,

    /// Output subtitle file (defaults to the transcript path with .srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Register conversion style
    #[arg(long, value_enum)]
    style: Option<CliRegisterStyle>,

    /// Policy for embedded English text
    #[arg(long, value_enum)]
    english: Option<CliEnglishMode>,

    /// Numeral notation policy
    #[arg(long, value_enum)]
    numbers: Option<CliNumberMode>,

    /// Profanity handling policy
    #[arg(long, value_enum)]
    profanity: Option<CliProfanityMode>,

    /// Re-split lines that exceed the display width
    #[arg(long)]
    split_long: bool,

    /// Enable LLM sentence correction via the configured endpoint
    #[arg(long)]
    correct: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Also write a plain-text transcript next to the subtitle file
    #[arg(long)]
    txt: bool,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
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

            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;31m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Warn => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;33m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Info => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;32m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Debug => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;36m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Trace => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;35m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "cantosub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Process(args)) => {
            // Use the explicit process subcommand args
            run_process(args).await
        }
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let transcript_path = cli.transcript_path.ok_or_else(|| {
                anyhow!("TRANSCRIPT is required when no subcommand is specified")
            })?;
            let vad = cli.vad.ok_or_else(|| {
                anyhow!("--vad is required when no subcommand is specified")
            })?;

            let process_args = ProcessArgs {
                transcript_path,
                vad,
                output: cli.output,
                style: cli.style,
                english: cli.english,
                numbers: cli.numbers,
                profanity: cli.profanity,
                split_long: cli.split_long,
                correct: cli.correct,
                config_path: cli.config_path,
                log_level: cli.log_level,
                txt: cli.txt,
            };
            run_process(process_args).await
        }
    }
}

async fn run_process(options: ProcessArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    // Load or create configuration
    let mut config = Config::load_or_create(&options.config_path)
        .context(format!("Failed to load config file: {}", options.config_path))?;

    // Override config with CLI options if provided
    if let Some(style) = &options.style {
        config.style.style = style.clone().into();
    }

    if let Some(english) = &options.english {
        config.style.english = english.clone().into();
    }

    if let Some(numbers) = &options.numbers {
        config.style.numbers = numbers.clone().into();
    }

    if let Some(profanity) = &options.profanity {
        config.style.profanity = profanity.clone().into();
    }

    if options.split_long {
        config.style.split_long = true;
    }

    if options.correct {
        config.correction.enabled = true;
    }

    // Update log level in config if specified via command line
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        // Just update the max level without reinitializing the logger
        log::set_max_level(config.log_level.to_level_filter());
    }

    // Default output path sits next to the transcript
    let output_path = options.output
        .unwrap_or_else(|| options.transcript_path.with_extension("srt"));

    // Create controller and run the processing workflow
    let controller = Controller::with_config(config)?;
    controller.run(
        options.transcript_path,
        options.vad,
        output_path,
        options.txt,
    ).await
}
