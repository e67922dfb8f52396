#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for compiling particle catalogs and running scenes
//! headlessly.

mod frame;
mod manifest;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use sandblaster_core::Catalog;
use sandblaster_world::{Simulation, SimulationConfig};
use tracing::info;

use crate::manifest::Manifest;

#[derive(Parser, Debug)]
#[command(
    name = "sandblaster",
    version,
    about = "Compile particle catalogs and run falling-sand scenes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a scene manifest's particles into the binary catalog format.
    Compile {
        /// Scene manifest declaring the particle catalog.
        manifest: PathBuf,
        /// File receiving the catalog; base64 text goes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write base64 text instead of raw bytes.
        #[arg(long)]
        base64: bool,
    },
    /// Print the particle types and transmutations of a binary catalog.
    Inspect {
        /// Catalog file produced by `compile`.
        catalog: PathBuf,
        /// Treat the file as base64 text.
        #[arg(long)]
        base64: bool,
    },
    /// Run a scene for a number of steps and print the final frame.
    Run {
        /// Scene manifest to install.
        manifest: PathBuf,
        /// Binary catalog replacing the manifest's particle declarations.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Number of steps to simulate.
        #[arg(long, default_value_t = 200)]
        steps: u32,
        /// Grid width overriding the manifest.
        #[arg(long)]
        width: Option<u16>,
        /// Grid height overriding the manifest.
        #[arg(long)]
        height: Option<u16>,
        /// Random seed overriding the manifest.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Entry point for the Sandblaster command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            manifest,
            output,
            base64,
        } => compile(&manifest, output, base64),
        Command::Inspect { catalog, base64 } => inspect(&catalog, base64),
        Command::Run {
            manifest,
            catalog,
            steps,
            width,
            height,
            seed,
        } => run(&manifest, catalog, steps, Overrides { width, height, seed }),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn compile(manifest: &Path, output: Option<PathBuf>, base64: bool) -> Result<()> {
    let catalog = Manifest::load(manifest)?.catalog()?;
    let bytes = catalog.encode();
    info!(particle_types = catalog.len(), bytes = bytes.len(), "compiled catalog");

    match output {
        Some(path) if base64 => fs::write(&path, STANDARD.encode(&bytes))
            .with_context(|| format!("failed to write catalog to {}", path.display())),
        Some(path) => fs::write(&path, &bytes)
            .with_context(|| format!("failed to write catalog to {}", path.display())),
        None => {
            println!("{}", STANDARD.encode(&bytes));
            Ok(())
        }
    }
}

fn read_catalog(path: &Path, base64: bool) -> Result<Catalog> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read catalog at {}", path.display()))?;
    let bytes = if base64 {
        let text = String::from_utf8(raw).context("base64 catalog is not valid UTF-8")?;
        STANDARD
            .decode(text.trim())
            .context("failed to decode base64 catalog")?
    } else {
        raw
    };
    Catalog::decode(&bytes).with_context(|| format!("invalid catalog at {}", path.display()))
}

fn inspect(path: &Path, base64: bool) -> Result<()> {
    let catalog = read_catalog(path, base64)?;
    println!(
        "{:>3}  {:<12} {:>6} {:>10} {:>6} {:>8} {:>9} {:>6} {:>8}",
        "#", "NAME", "ID", "COLOR", "MOBILE", "DENSITY", "VISCOSITY", "DECAY", "LIFETIME"
    );
    for particle in catalog.iter() {
        println!(
            "{:>3}  {:<12} {:>#6x} {:>#10x} {:>6} {:>8.3} {:>9.3} {:>6.3} {:>8}",
            particle.ordinal().get(),
            particle.name(),
            particle.id().get(),
            particle.color().argb(),
            particle.mobile(),
            particle.density(),
            particle.viscosity(),
            particle.decay_probability(),
            particle.lifetime(),
        );
    }
    for agent in catalog.iter() {
        for rule in catalog.rules_for(agent.ordinal()) {
            let target = catalog
                .by_ordinal(rule.target())
                .map_or("?", |particle| particle.name());
            println!(
                "{} turns {} with probability {:.3} into {} candidate(s)",
                agent.name(),
                target,
                rule.probability(),
                rule.products().len()
            );
        }
    }
    Ok(())
}

struct Overrides {
    width: Option<u16>,
    height: Option<u16>,
    seed: Option<u64>,
}

impl Overrides {
    fn apply(&self, base: SimulationConfig) -> SimulationConfig {
        let config = SimulationConfig::new(
            self.width.unwrap_or(base.width()),
            self.height.unwrap_or(base.height()),
        );
        match self.seed.or(base.seed()) {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn run(
    manifest_path: &Path,
    catalog_path: Option<PathBuf>,
    steps: u32,
    overrides: Overrides,
) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let catalog = match catalog_path {
        Some(path) => read_catalog(&path, false)?,
        None => manifest.catalog()?,
    };
    let config = overrides.apply(manifest.simulation());

    let mut simulation = Simulation::new(Arc::new(catalog), config);
    manifest.populate(&mut simulation)?;
    info!(
        width = config.width(),
        height = config.height(),
        steps,
        "running scene"
    );
    for _ in 0..steps {
        simulation.iterate();
    }

    print!("{}", frame::render(&simulation));
    for (name, count) in frame::census(&simulation) {
        println!("{name}: {count}");
    }
    Ok(())
}
