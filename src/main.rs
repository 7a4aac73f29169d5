// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use app_config::{BackendKind, Config, LogLevel};
use translation::dispatcher::{translate, TaskCallback, TaskDesc, TaskKind, TaskParams};
use translation::glossary::Glossary;
use translation::TranslatorConfig;

mod app_config;
mod errors;
mod language_utils;
mod providers;
mod translation;

/// CLI wrapper for BackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackendKind {
    Webmt,
    Llm,
    Local,
}

impl From<CliBackendKind> for BackendKind {
    fn from(cli_backend: CliBackendKind) -> Self {
        match cli_backend {
            CliBackendKind::Webmt => BackendKind::WebMt,
            CliBackendKind::Llm => BackendKind::Llm,
            CliBackendKind::Local => BackendKind::Local,
        }
    }
}

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate chapter text files using the configured backend (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for noveltrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// Input chapter file or directory of .txt chapters
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackendKind>,

    /// Backend endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Glossary file (JSON object of source -> target terms)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Output directory; defaults to the input file's directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Segment length override for the LLM backend
    #[arg(long)]
    seg_length: Option<usize>,

    /// Previous-context length override for the LLM backend
    #[arg(long)]
    prev_seg_length: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// noveltrans - AI-powered web novel translation
///
/// Translates chapter text files through a web machine-translation service
/// or a specialized fine-tuned LLM served over an OpenAI-compatible API.
#[derive(Parser, Debug)]
#[command(name = "noveltrans")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered web novel translation tool")]
#[command(long_about = "noveltrans translates line-oriented chapter text using AI backends.

EXAMPLES:
    noveltrans chapter.txt                          # Translate using default config
    noveltrans -b llm -e http://localhost:8080 chapter.txt
    noveltrans -g glossary.json chapters/           # Whole directory with glossary
    noveltrans --log-level debug chapter.txt        # Verbose logging
    noveltrans completions bash > noveltrans.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

SUPPORTED BACKENDS:
    webmt - generic web machine-translation service
    llm   - fine-tuned translation model on an OpenAI-compatible server
    local - offline engine embedded in a host application (not usable here)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input chapter file or directory of .txt chapters
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackendKind>,

    /// Backend endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Glossary file (JSON object of source -> target terms)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Output directory; defaults to the input file's directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Segment length override for the LLM backend
    #[arg(long)]
    seg_length: Option<usize>,

    /// Previous-context length override for the LLM backend
    #[arg(long)]
    prev_seg_length: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

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
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Task callback backed by a progress bar
struct CliCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliCallback {
    fn new() -> Self {
        Self { bar: Mutex::new(None) }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
    }
}

impl TaskCallback for CliCallback {
    fn log(&self, message: &str, detail: Option<Vec<String>>) {
        info!("{}", message);
        if let Some(detail) = detail {
            for line in detail {
                log::debug!("    {}", line);
            }
        }
    }

    fn on_progress(&self, translated_segments: usize, total_segments: usize) {
        let mut bar = self.bar.lock();
        let bar = bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total_segments as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} segments")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        bar.set_position(translated_segments as u64);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default, the level is
    // updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "noveltrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let args = TranslateArgs {
                input_path,
                backend: cli.backend,
                endpoint: cli.endpoint,
                glossary: cli.glossary,
                output: cli.output,
                seg_length: cli.seg_length,
                prev_seg_length: cli.prev_seg_length,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Override config with CLI options if provided
    if let Some(backend) = options.backend {
        config.backend = backend.into();
    }
    if let Some(endpoint) = options.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(seg_length) = options.seg_length {
        config.seg_length = Some(seg_length);
    }
    if let Some(prev_seg_length) = options.prev_seg_length {
        config.prev_seg_length = Some(prev_seg_length);
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    // Collect input files
    let input_files = collect_input_files(&options.input_path)?;
    if input_files.is_empty() {
        bail!("No .txt chapter files found at {}", options.input_path.display());
    }

    // Load the glossary if one was given
    let glossary: Glossary = match &options.glossary {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read glossary file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse glossary file: {}", path.display()))?
        }
        None => Glossary::new(),
    };
    if !glossary.is_empty() {
        info!("Loaded glossary with {} terms", glossary.len());
    }

    // Cancellation on Ctrl-C
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing the current request...");
                token.cancel();
            }
        });
    }

    let mut translated_files = 0usize;
    for input in &input_files {
        if token.is_cancelled() {
            break;
        }

        let label = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.display().to_string());
        info!("Translating {}", label);

        let text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {}", input.display()))?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();

        let desc = TaskDesc { kind: TaskKind::Local, label: label.clone() };
        let params = TaskParams { lines, glossary: glossary.clone() };
        let callback = Arc::new(CliCallback::new());

        let result = translate(
            desc,
            params,
            callback.clone(),
            translator_config(&config)?,
            token.clone(),
        )
        .await;
        callback.finish();

        match result {
            Some(lines) if !lines.is_empty() => {
                let output_path = output_path_for(input, options.output.as_deref(), &config);
                std::fs::write(&output_path, lines.join("\n")).with_context(|| {
                    format!("Failed to write output file: {}", output_path.display())
                })?;
                info!("Wrote {}", output_path.display());
                translated_files += 1;
            }
            Some(_) => warn!("No output produced for {}", label),
            None => warn!("Task skipped for {}", label),
        }
    }

    info!("Done, {}/{} files translated", translated_files, input_files.len());
    Ok(())
}

/// Backend selection for one task from the loaded configuration
fn translator_config(config: &Config) -> Result<TranslatorConfig> {
    match config.backend {
        BackendKind::WebMt => Ok(TranslatorConfig::WebMt { endpoint: config.endpoint.clone() }),
        BackendKind::Llm => Ok(TranslatorConfig::Llm {
            endpoint: config.endpoint.clone(),
            seg_length: config.seg_length,
            prev_seg_length: config.prev_seg_length,
        }),
        BackendKind::Local => {
            bail!("The local backend needs an embedded engine and is not usable from the CLI")
        }
    }
}

/// Collect chapter files: the path itself, or .txt files under a directory
fn collect_input_files(input_path: &Path) -> Result<Vec<PathBuf>> {
    if input_path.is_file() {
        return Ok(vec![input_path.to_path_buf()]);
    }
    if !input_path.is_dir() {
        bail!("Input path does not exist: {}", input_path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input_path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Output path: `<stem>.<target>.txt` next to the input or under the output dir
fn output_path_for(input: &Path, output_dir: Option<&Path>, config: &Config) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "translated".to_string());
    let file_name = format!("{}.{}.txt", stem, config.target_language);
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}
