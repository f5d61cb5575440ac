use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, info};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::path::{Path, PathBuf};

use submatch::config::{Config, DEFAULT_CONFIG_FILE};
use submatch::scan::collect_files;
use submatch::{match_paths, report, AssignMode};

#[derive(Parser, Debug)]
#[command(
    name = "submatch",
    version,
    about = "Pair subtitle files with video files by filename similarity"
)]
struct Cli {
    /// Directories holding subtitles (repeatable, default: current directory)
    #[arg(long = "subs")]
    subs: Vec<PathBuf>,

    /// Directories holding videos (repeatable, default: current directory)
    #[arg(long = "videos")]
    videos: Vec<PathBuf>,

    /// Walk subdirectories
    #[arg(short, long, action = ArgAction::SetTrue)]
    recursive: bool,

    /// Minimum score a pair must exceed to be accepted
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Tokens of this many characters or fewer are ignored
    #[arg(long)]
    min_token_length: Option<usize>,

    /// Target assignment mode
    #[arg(long, value_enum)]
    mode: Option<AssignMode>,

    /// Write matches as CSV (subtitle_path,target_path,score)
    #[arg(long = "csv")]
    csv_path: Option<PathBuf>,

    /// Print the report as JSON instead of the summary
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Configuration file (default: submatch.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Score on a single thread
    #[arg(long, action = ArgAction::SetTrue)]
    sequential: bool,

    /// Enable debug logs
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Explicit log file path (enables file logging). Ignored if empty.
    #[arg(long, default_value = "")]
    log_file: String,
}

fn init_logger(cli: &Cli) {
    if cli.debug || !cli.log_file.is_empty() {
        let log_path = if !cli.log_file.is_empty() {
            PathBuf::from(&cli.log_file)
        } else {
            Path::new("logs").join("submatch.log")
        };
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::File::create(&log_path) {
            Ok(file) => {
                let cfg = ConfigBuilder::new()
                    .set_time_format_rfc3339()
                    .set_target_level(LevelFilter::Off)
                    .build();
                if let Err(e) = WriteLogger::init(LevelFilter::Debug, cfg, file) {
                    eprintln!("[warn] file logger init failed: {e}");
                } else {
                    eprintln!("[debug] logs → {:?}", log_path);
                }
            }
            Err(e) => {
                eprintln!("[warn] cannot create log file {:?}: {e}", log_path);
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                    .init();
            }
        }
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) -> Result<()> {
    if cli.recursive {
        cfg.recursive = true;
    }
    if let Some(t) = cli.threshold {
        cfg.threshold = t;
    }
    if let Some(n) = cli.min_token_length {
        cfg.min_token_length = n;
    }
    if let Some(mode) = cli.mode {
        cfg.mode = mode;
    }
    cfg.validate()
}

fn or_cwd(dirs: &[PathBuf]) -> Vec<PathBuf> {
    if dirs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        dirs.to_vec()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli);

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    apply_overrides(&mut cfg, &cli)?;
    debug!("config: {:?}", cfg);

    let subs = collect_files(
        &or_cwd(&cli.subs),
        &cfg.subtitle_extensions,
        cfg.recursive,
        &cfg.blacklist,
    )?;
    let videos = collect_files(
        &or_cwd(&cli.videos),
        &cfg.video_extensions,
        cfg.recursive,
        &cfg.blacklist,
    )?;
    info!("{} subtitles, {} videos", subs.files.len(), videos.files.len());

    let opts = cfg.match_options(!cli.sequential);
    let result = match_paths(&subs.paths(), &videos.paths(), &opts).context("matching failed")?;
    info!(
        "{} matched, {} unmatched subtitles ({:?} mode, threshold {})",
        result.matches.len(),
        result.unmatched_subtitles.len(),
        cfg.mode,
        cfg.threshold
    );

    if cli.json {
        println!("{}", report::to_json(&result)?);
    } else {
        print!("{}", report::summary(&result));
    }
    if let Some(path) = &cli.csv_path {
        report::write_csv_file(&result, path)?;
        info!("CSV written to {:?}", path);
    }
    Ok(())
}
