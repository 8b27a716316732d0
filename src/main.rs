//! YaoXiang IR - CLI

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};
use yxir::middle::ir::dump_modules;
use yxir::middle::schema::{self, tree::ir_tree_schema, Schema};
use yxir::util::config::{load_project_config, Backend, DceConfig, PROJECT_CONFIG_FILE};
use yxir::util::logger::{self, LogLevel};
use yxir::{collect_arena_files, load_arena, save_arena, shake_modules, NAME, VERSION};

/// IR tree tooling: schema resolution and dead code elimination
#[derive(Parser, Debug)]
#[command(name = "yxir")]
#[command(author = "YaoXiang Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a node schema and print element kinds
    Schema {
        /// RON schema file (defaults to the built-in IR tree schema)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Run dead code elimination over serialized arenas
    Dce {
        /// Arena JSON file or a directory of them
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Backend reachability rules (js, wasm, native)
        #[arg(short, long)]
        backend: Option<Backend>,

        /// Print the reachability trace
        #[arg(short, long)]
        trace: bool,

        /// Where to write the pruned arena (a directory when INPUT is one)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Project configuration (defaults to ./yxir.toml)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the tree of every module in an arena
    Dump {
        /// Arena JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_with_level(LogLevel::from_verbosity(args.verbose));

    match args.command {
        Commands::Schema { file } => run_schema(file.as_deref())?,
        Commands::Dce {
            input,
            backend,
            trace,
            output,
            config,
        } => {
            let config_path = config.unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
            let mut dce = load_project_config(&config_path)
                .with_context(|| format!("Failed to load config: {}", config_path.display()))?
                .dce;
            if let Some(backend) = backend {
                dce.backend = backend;
            }
            if trace {
                dce.print_reachability_info = true;
            }
            run_dce(&input, output.as_deref(), &dce)?;
        }
        Commands::Dump { input } => {
            let arena = load_arena(&input)?;
            print!("{}", dump_modules(&arena)?);
        }
    }

    Ok(())
}

fn run_schema(file: Option<&Path>) -> Result<()> {
    let schema = match file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            Schema::from_ron(&text)
                .with_context(|| format!("Failed to parse schema: {}", path.display()))?
        }
        None => ir_tree_schema(),
    };
    let resolved = schema::resolve(&schema).context("Schema resolution failed")?;
    print!("{}", resolved.format());
    eprintln!("{} {} elements", "resolved".green().bold(), resolved.len());
    Ok(())
}

fn run_dce(
    input: &Path,
    output: Option<&Path>,
    config: &DceConfig,
) -> Result<()> {
    let files = collect_arena_files(input)?;
    if files.is_empty() {
        eprintln!("{} no .json arenas under {}", "warning:".yellow().bold(), input.display());
        return Ok(());
    }

    for file in &files {
        let mut arena = load_arena(file)?;
        let outcome = shake_modules(&mut arena, config)
            .with_context(|| format!("Failed to shake: {}", file.display()))?;

        let stats = &outcome.stats;
        eprintln!(
            "{} {} ({}): kept {}, removed {}",
            "dce".cyan().bold(),
            file.display(),
            config.backend,
            stats.reachable,
            stats.removed
        );
        for name in &outcome.report.removed {
            eprintln!("  {} {}", "-".red(), name.dimmed());
        }

        if let Some(output) = output {
            let target = output_path(input, file, output)?;
            save_arena(&target, &arena)?;
            eprintln!("  {} {}", "wrote".green(), target.display());
        }
    }
    Ok(())
}

/// 目录输入时保持相对路径
fn output_path(
    input: &Path,
    file: &Path,
    output: &Path,
) -> Result<PathBuf> {
    if input.is_file() {
        return Ok(output.to_path_buf());
    }
    let relative = file
        .strip_prefix(input)
        .with_context(|| format!("{} is not under {}", file.display(), input.display()))?;
    Ok(output.join(relative))
}
