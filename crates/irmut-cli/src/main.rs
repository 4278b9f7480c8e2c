//! `irmut`: mutates SSA programs for differential testing of optimizers.

mod io;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use irmut_core::IrmutConfig;
use irmut_ir::cost::program_costs;
use irmut_ir::{Merger, Mutator, RecipeKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "irmut", version)]
#[command(about = "Mutation engine for SSA programs")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log JSON lines instead of plain text
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print `name: cost` for every defined function
    Cost { input: PathBuf },
    /// Merge a directory of seed programs into one batch of supported functions
    Merge {
        seeds_dir: PathBuf,
        output: PathBuf,
        /// Drop functions that use floating point
        #[arg(long)]
        ignore_fp: bool,
    },
    /// Apply a recipe to every function of a seed program
    Mutate {
        seed: PathBuf,
        output: PathBuf,
        /// correctness, commutative, multi-use, flag-preserving, flag-dropping or canonical-form
        recipe: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => IrmutConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IrmutConfig::default(),
    };
    if cli.log_json {
        config.log.json = true;
    }
    telemetry::init_telemetry(&config.log);

    match cli.command {
        Command::Cost { input } => cost(&input),
        Command::Merge {
            seeds_dir,
            output,
            ignore_fp,
        } => {
            config.merge.ignore_fp |= ignore_fp;
            merge(&config, &seeds_dir, &output)
        }
        Command::Mutate {
            seed,
            output,
            recipe,
        } => mutate(&config, &seed, &output, &recipe),
    }
}

fn cost(input: &Path) -> Result<()> {
    let program = io::read_program(input)?;
    for (name, cost) in program_costs(&program) {
        println!("{}: {}", name, cost);
    }
    Ok(())
}

fn merge(config: &IrmutConfig, seeds_dir: &Path, output: &Path) -> Result<()> {
    let seeds = io::read_seed_dir(seeds_dir)?;
    info!(seeds = seeds.len(), dir = %seeds_dir.display(), "Read seed corpus");

    let merged = Merger::new(config.merge.clone())
        .merge(&seeds, &seeds_dir.display().to_string())
        .context("Failed to merge seeds")?;
    io::write_program(&merged, output)?;

    info!(functions = merged.num_functions(), output = %output.display(), "Wrote merged program");
    Ok(())
}

fn mutate(config: &IrmutConfig, seed: &Path, output: &Path, recipe: &str) -> Result<()> {
    let kind: RecipeKind = recipe.parse()?;
    let mut program = io::read_program(seed)?;

    let mut rng = ChaCha8Rng::from_entropy();
    let report = Mutator::new(config.engine.clone())
        .mutate_program(&mut program, kind, &mut rng)
        .with_context(|| format!("Failed to mutate {}", seed.display()))?;
    io::write_program(&program, output)?;

    info!(
        recipe = %report.recipe,
        kept = report.kept.len(),
        discarded = report.discarded.len(),
        output = %output.display(),
        "Wrote mutated program"
    );
    Ok(())
}
