//! FGDK CLI - Command-line tool for FGDK preload and overlay extraction.
//!
//! This is the main entry point for the `fgdk-export` command-line application.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fgdk::prelude::*;
use fgdk::DEFAULT_OUTPUT_DIR;

/// FGDK - Dog's Life / Project Zoo overlay extraction tool
#[derive(Parser)]
#[command(name = "fgdk-export")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every overlay listed in a preload catalog
    Export {
        /// Path to PRELOAD.DAT
        #[arg(env = "INPUT_PRELOAD")]
        preload: PathBuf,

        /// Output directory (defaults to OVERLAY_unpack beside the preload file)
        #[arg(env = "OUTPUT_FOLDER")]
        output: Option<PathBuf>,

        /// Game target (dogs or zoo); detected from the game directory if omitted
        #[arg(short, long, env = "FGDK_TARGET")]
        target: Option<String>,

        /// Export overlays in parallel
        #[arg(short, long)]
        parallel: bool,

        /// Do not write opaque shape fields as XML comments
        #[arg(long)]
        no_metadata: bool,

        /// Read catalog and segment data as big-endian
        #[arg(long)]
        big_endian: bool,

        /// Reverse the four bone indices of every weighted vertex
        #[arg(long)]
        reverse_bone_order: bool,
    },

    /// List the overlays of a preload catalog
    List {
        /// Path to PRELOAD.DAT
        #[arg(env = "INPUT_PRELOAD")]
        preload: PathBuf,

        /// Game target (dogs or zoo); detected from the game directory if omitted
        #[arg(short, long, env = "FGDK_TARGET")]
        target: Option<String>,

        /// Read the catalog as big-endian
        #[arg(long)]
        big_endian: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Export {
            preload,
            output,
            target,
            parallel,
            no_metadata,
            big_endian,
            reverse_bone_order,
        } => {
            let options = ExportOptions {
                endian: endian(big_endian),
                shape: ShapeOptions { reverse_bone_order },
                write_metadata: !no_metadata,
                parallel,
            };
            cmd_export(&preload, output, target.as_deref(), options)?;
        }
        Commands::List {
            preload,
            target,
            big_endian,
            json,
        } => {
            cmd_list(&preload, target.as_deref(), endian(big_endian), json)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn endian(big_endian: bool) -> Endian {
    if big_endian {
        Endian::Big
    } else {
        Endian::Little
    }
}

/// Use the explicit target, or look for a marker file beside the catalog.
fn resolve_target(preload: &Path, target: Option<&str>) -> Result<Target> {
    if let Some(name) = target {
        let target: Target = name.parse()?;
        tracing::debug!(%target, "using target from arguments");
        return Ok(target);
    }

    let dir = game_dir(preload);
    let target = Target::detect(dir)
        .ok_or_else(|| fgdk::Error::UnknownTarget(dir.to_path_buf()))
        .context("Pass --target dogs or --target zoo")?;
    tracing::info!(%target, dir = %dir.display(), "detected game");
    Ok(target)
}

fn game_dir(preload: &Path) -> &Path {
    match preload.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn cmd_export(
    preload_path: &Path,
    output: Option<PathBuf>,
    target: Option<&str>,
    options: ExportOptions,
) -> Result<()> {
    let target = resolve_target(preload_path, target)?;
    let output = output.unwrap_or_else(|| game_dir(preload_path).join(DEFAULT_OUTPUT_DIR));

    println!("Target: {}", target.title());
    println!("Reading preload catalog: {}", preload_path.display());

    let source = OverlaySource::beside(preload_path).context("Failed to open overlay archive")?;
    tracing::info!(
        preload = %preload_path.display(),
        output = %output.display(),
        archive = source.has_archive(),
        "starting export"
    );
    if source.has_archive() {
        println!("Using OVERLAY.ZIP as fallback for missing overlay files");
    }

    let exporter = PreloadExporter::new(target, source, &output, options);
    let preload = exporter
        .read_preload(preload_path)
        .context("Failed to read preload catalog")?;
    let overlay_count = preload.overlays().len();

    println!(
        "Exporting {} overlays to {}...",
        overlay_count,
        output.display()
    );

    let pb = ProgressBar::new(overlay_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let stats = exporter.export_all(&preload, |done, _| pb.set_position(done as u64));
    pb.finish_with_message("Done");

    tracing::info!(
        overlays = stats.overlays,
        exported = stats.exported,
        failed = stats.failed,
        files = stats.files,
        "export finished"
    );
    println!("Export completed in {:?}", start.elapsed());
    println!(
        "  Segments: {} exported, {} empty, {} not found, {} aborted, {} failed",
        stats.exported, stats.empty, stats.not_found, stats.aborted, stats.failed
    );
    println!("  Files written: {}", stats.files);

    Ok(())
}

#[derive(Serialize)]
struct OverlayListing {
    id: u8,
    segments: Vec<SegmentListing>,
}

#[derive(Serialize)]
struct SegmentListing {
    name: String,
    assets: Vec<AssetListing>,
}

#[derive(Serialize)]
struct AssetListing {
    asset_type: usize,
    name: Option<&'static str>,
    count: u16,
}

fn list_overlay(target: Target, overlay: &Overlay) -> OverlayListing {
    let segments = overlay
        .segments(target.localization_count())
        .into_iter()
        .filter(OverlaySegment::has_assets)
        .map(|segment| SegmentListing {
            assets: segment
                .groups
                .iter()
                .enumerate()
                .filter(|(_, group)| !group.is_empty())
                .map(|(asset_type, group)| AssetListing {
                    asset_type,
                    name: target.asset_type_name(asset_type),
                    count: group.element_count,
                })
                .collect(),
            name: segment.name,
        })
        .collect();

    OverlayListing {
        id: overlay.id,
        segments,
    }
}

fn cmd_list(preload_path: &Path, target: Option<&str>, endian: Endian, json: bool) -> Result<()> {
    let target = resolve_target(preload_path, target)?;
    let data = std::fs::read(preload_path).context("Failed to read preload catalog")?;
    let preload = PreloadFile::parse(&data, target.asset_type_count(), endian)
        .context("Failed to parse preload catalog")?;

    let listings: Vec<OverlayListing> = preload
        .overlays()
        .into_iter()
        .map(|overlay| list_overlay(target, overlay))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for overlay in &listings {
        println!("Overlay {}", overlay.id);
        for segment in &overlay.segments {
            let assets: Vec<String> = segment
                .assets
                .iter()
                .map(|a| match a.name {
                    Some(name) => format!("{name} x{}", a.count),
                    None => format!("type {} x{}", a.asset_type, a.count),
                })
                .collect();
            println!("  {:<8} {}", format!("{}.ovl", segment.name), assets.join(", "));
        }
    }

    println!("\nTotal: {} overlays", listings.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Zoo catalog holding one overlay whose base segment has three texts.
    fn big_endian_catalog() -> Vec<u8> {
        let mut data = vec![0, 0];
        for _ in 0..Target::Zoo.asset_type_count() {
            data.extend_from_slice(&0u16.to_be_bytes());
        }
        data.extend_from_slice(&[0, 1, 0, 5]);
        for kind in 0..4 {
            for asset_type in 0..Target::Zoo.asset_type_count() {
                let count: u16 = if kind == 0 && asset_type == 0 { 3 } else { 0 };
                data.extend_from_slice(&count.to_be_bytes());
                data.extend_from_slice(&0u16.to_be_bytes());
            }
        }
        data
    }

    #[test]
    fn test_list_accepts_big_endian() {
        let cli = Cli::try_parse_from([
            "fgdk-export",
            "list",
            "PRELOAD.DAT",
            "--target",
            "zoo",
            "--big-endian",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                big_endian: true,
                json: false,
                ..
            }
        ));
    }

    #[test]
    fn test_list_big_endian_catalog() {
        let data = big_endian_catalog();
        let preload =
            PreloadFile::parse(&data, Target::Zoo.asset_type_count(), endian(true)).unwrap();
        let overlays = preload.overlays();
        assert_eq!(overlays.len(), 1);

        let listing = list_overlay(Target::Zoo, overlays[0]);
        assert_eq!(listing.id, 5);
        assert_eq!(listing.segments.len(), 1);
        assert_eq!(listing.segments[0].name, "5");
        let asset = &listing.segments[0].assets[0];
        assert_eq!((asset.asset_type, asset.name, asset.count), (0, Some("Text"), 3));
    }

    #[test]
    fn test_resolve_target() {
        let root = tempfile::tempdir().unwrap();
        let preload = root.path().join("PRELOAD.DAT");
        assert!(resolve_target(&preload, None).is_err());

        std::fs::write(root.path().join("DOGS.DGF"), b"").unwrap();
        assert_eq!(resolve_target(&preload, None).unwrap(), Target::Dogs);
        assert_eq!(resolve_target(&preload, Some("ZOO")).unwrap(), Target::Zoo);
        assert!(resolve_target(&preload, Some("cats")).is_err());
    }
}
