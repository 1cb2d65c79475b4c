// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! sdfkit CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Point3;
use sdfkit::{analyze, io, BoundingBox, MeshConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sdfkit")]
#[command(about = "Signed distance field modeling and STL export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene file to STL
    Render {
        /// Input scene file
        input: PathBuf,

        /// Output STL file
        #[arg(short, long)]
        output: PathBuf,

        /// Grid step size
        #[arg(long)]
        step: Option<f64>,

        /// Target grid point count when no step is given
        #[arg(long)]
        samples: Option<usize>,

        /// Worker threads (0 = all cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Sampling bounds as x0,y0,z0,x1,y1,z1
        #[arg(long, value_delimiter = ',', num_args = 6)]
        bounds: Option<Vec<f64>>,

        /// Sample every grid point instead of skipping far blocks
        #[arg(long)]
        dense: bool,

        /// Write ASCII STL instead of binary
        #[arg(long)]
        ascii: bool,

        /// Mesh configuration file (defaults to sdfkit.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print generation statistics as JSON
        #[arg(long)]
        stats: bool,
    },

    /// Parse a scene file and print its node tree
    Parse {
        /// Input scene file
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "sdfkit=info" } else { "sdfkit=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render {
            input,
            output,
            step,
            samples,
            workers,
            bounds,
            dense,
            ascii,
            config,
            stats,
        } => {
            let mut mesh_config = match config {
                Some(path) => MeshConfig::from_file(path)?,
                None => MeshConfig::load()?,
            };
            if step.is_some() {
                mesh_config.step = step;
            }
            if let Some(samples) = samples {
                mesh_config.samples = samples;
            }
            if let Some(workers) = workers {
                mesh_config.workers = workers;
            }
            if let Some(b) = bounds {
                mesh_config.bounds = Some(parse_bounds(&b)?);
            }
            if dense {
                mesh_config.sparse = false;
            }
            mesh_config.verbose = cli.verbose;

            render_command(&input, &output, &mesh_config, ascii, stats)?;
        }
        Commands::Parse { input } => parse_command(&input)?,
        Commands::Version => {
            println!("sdfkit v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn parse_bounds(values: &[f64]) -> Result<BoundingBox> {
    let [x0, y0, z0, x1, y1, z1] = values else {
        bail!("--bounds takes six values, got {}", values.len());
    };
    Ok(BoundingBox::new(
        Point3::new(*x0, *y0, *z0),
        Point3::new(*x1, *y1, *z1),
    ))
}

fn render_command(
    input: &Path,
    output: &Path,
    config: &MeshConfig,
    ascii: bool,
    print_stats: bool,
) -> Result<()> {
    if !input.exists() {
        eprintln!("{} Input file not found: {}", "Error:".red(), input.display());
        std::process::exit(1);
    }

    let field = io::import_scene_file(input)?;
    debug!(nodes = field.node_count(), depth = field.depth(), "Scene loaded");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid progress template")?,
    );
    spinner.set_message(format!("Meshing {}", input.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = field.generate_with_stats(config);
    spinner.finish_and_clear();
    let (mesh, stats) = result.with_context(|| format!("Failed to mesh {}", input.display()))?;

    if ascii {
        io::export_stl_ascii(&mesh, output)?;
    } else {
        io::export_stl(&mesh, output)?;
    }

    if print_stats {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("\n{}", "═".repeat(60).bright_black());
        println!("{}", "Render Summary".bold());
        println!("{}", "═".repeat(60).bright_black());
        println!(
            "  {} {} x {} x {} (step {:.4})",
            "Grid:".bright_black(),
            stats.dims[0],
            stats.dims[1],
            stats.dims[2],
            stats.step
        );
        println!(
            "  {} {} of {} skipped",
            "Blocks:".bright_black(),
            stats.sampling.skipped_blocks.to_string().cyan(),
            stats.sampling.blocks
        );
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            stats.triangles.to_string().cyan()
        );
        println!(
            "  {} {:.2?} sampling, {:.2?} extraction",
            "Time:".bright_black(),
            stats.sample_time,
            stats.extract_time
        );
        let analysis = analyze(&mesh);
        println!(
            "  {} {}",
            "Watertight:".bright_black(),
            if analysis.is_watertight {
                "yes".green()
            } else {
                "no".red()
            }
        );
        println!(
            "  {} {}",
            "Output:".bright_black(),
            output.display().to_string().cyan()
        );
        println!("{}", "═".repeat(60).bright_black());

        if config.verbose {
            analysis.print();
        }
    }

    Ok(())
}

fn parse_command(input: &Path) -> Result<()> {
    if !input.exists() {
        eprintln!("{} Input file not found: {}", "Error:".red(), input.display());
        std::process::exit(1);
    }

    let field = io::import_scene_file(input)?;
    print!("{}", field);
    match field.bounds() {
        Some(b) => println!(
            "{} [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
            "Bounds:".bright_black(),
            b.min.x,
            b.min.y,
            b.min.z,
            b.max.x,
            b.max.y,
            b.max.z
        ),
        None => println!("{} unbounded", "Bounds:".bright_black()),
    }
    Ok(())
}
