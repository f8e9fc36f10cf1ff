//! Command-line interface for flight log conversion.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::writers::{write_kml, FlightTrack};
use crate::{ExportConfig, LogReader};

#[derive(Parser)]
#[command(name = "otx-log")]
#[command(about = "Flight telemetry log reader and KML exporter", version)]
pub struct Cli {
    /// Path to YAML export config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the column names of a log
    Header {
        /// CSV flight log
        log_file: PathBuf,
    },

    /// Print log records, one per line
    Dump {
        /// CSV flight log
        log_file: PathBuf,
        /// Only print these columns (comma separated, in this order)
        #[arg(short = 'k', long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Only print the last record
        #[arg(long)]
        last: bool,
    },

    /// Print the LineString coordinate list
    Coords {
        /// CSV flight log
        log_file: PathBuf,
    },

    /// Print timestamped track points
    Track {
        /// CSV flight log
        log_file: PathBuf,
    },

    /// Write a KML document with the flight path and track
    Export {
        /// CSV flight log
        log_file: PathBuf,
        /// Output KML file (defaults to the log name with .kml extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Document name (defaults to config, then the log file name)
        #[arg(long)]
        name: Option<String>,
        /// Skip the timed gx:Track placemark
        #[arg(long)]
        no_track: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match ExportConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                ExportConfig::default()
            }
        },
        None => ExportConfig::default(),
    };

    let result = match cli.command {
        Commands::Header { log_file } => cmd_header(&log_file),
        Commands::Dump { log_file, columns, last } => cmd_dump(&log_file, &columns, last),
        Commands::Coords { log_file } => cmd_coords(&log_file),
        Commands::Track { log_file } => cmd_track(&log_file),
        Commands::Export { log_file, output, name, no_track } => {
            cmd_export(&log_file, output, name, no_track, &config)
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn open_reader(log_file: &Path) -> Result<LogReader> {
    LogReader::open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))
}

fn cmd_header(log_file: &Path) -> Result<()> {
    let reader = open_reader(log_file)?;
    for name in reader.header() {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_dump(log_file: &Path, columns: &[String], last: bool) -> Result<()> {
    let mut reader = open_reader(log_file)?;
    if !columns.is_empty() {
        reader.select_columns(columns)?;
    }

    let format_record = |record: &crate::Record| {
        record
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("\t")
    };

    if last {
        match reader.last_record()? {
            Some(record) => println!("{}", format_record(&record)),
            None => warn!("{} has no records", log_file.display()),
        }
        return Ok(());
    }

    for record in reader.records()? {
        println!("{}", format_record(&record?));
    }
    Ok(())
}

fn cmd_coords(log_file: &Path) -> Result<()> {
    let mut reader = open_reader(log_file)?;
    let coordinates = reader
        .kml_linestring_coordinates()
        .with_context(|| format!("Failed to convert {}", log_file.display()))?;
    println!("{}", coordinates);
    Ok(())
}

fn cmd_track(log_file: &Path) -> Result<()> {
    let mut reader = open_reader(log_file)?;
    let track = FlightTrack::from_reader(&mut reader, true)
        .with_context(|| format!("Failed to convert {}", log_file.display()))?;
    for (when, point) in track.when.iter().zip(&track.points) {
        println!("{}\t{}", when, point);
    }
    Ok(())
}

fn cmd_export(
    log_file: &Path,
    output: Option<PathBuf>,
    name: Option<String>,
    no_track: bool,
    config: &ExportConfig,
) -> Result<()> {
    let start = Instant::now();

    // Default output path to the log name with a .kml extension
    let output_path = output.unwrap_or_else(|| log_file.with_extension("kml"));

    let mut export_config = config.clone();
    if name.is_some() {
        export_config.document_name = name;
    }
    if no_track {
        export_config.include_track = false;
    }

    let fallback_name = log_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Flight".to_string());

    println!("Exporting flight log...");
    println!("Input: {}", log_file.display());
    println!("Output: {}", output_path.display());

    let spinner = create_spinner("Reading log records...");

    let outcome = (|| -> Result<FlightTrack> {
        let mut reader = open_reader(log_file)?;
        let track = FlightTrack::from_reader(&mut reader, export_config.include_track)
            .with_context(|| format!("Failed to convert {}", log_file.display()))?;
        spinner.set_message("Writing KML document...");
        write_kml(&output_path, &track, &fallback_name, &export_config)?;
        Ok(track)
    })();
    spinner.finish_and_clear();
    let track = outcome?;

    print_summary(
        "Export Complete",
        &[
            ("Input file", log_file.display().to_string()),
            ("Output KML", output_path.display().to_string()),
            ("Track points", track.len().to_string()),
            ("Gx track", export_config.include_track.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}
