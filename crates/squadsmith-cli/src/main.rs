// squadsmith command-line entry point.
//
// Subcommands:
//   optimize     pick the best legal squad from a player CSV
//   diff         rarity-weighted similarity of two saved rosters
//   adjustments  write an adjustments file from player availability
//
// Reports go to stdout, logs to stderr (or --log-file).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use squadsmith_core::adjustments;
use squadsmith_core::config::{self, Config, ConfigError};
use squadsmith_core::optimize::optimize;
use squadsmith_core::player::{self, PlayerRecord};
use squadsmith_core::roster;
use squadsmith_core::similarity::similarity;
use squadsmith_core::solver::MilpSolver;

#[derive(Parser)]
#[command(name = "squadsmith")]
#[command(about = "Fantasy football squad optimizer", long_about = None)]
struct Cli {
    /// Configuration file (default: config/squadsmith.toml, seeded from defaults/)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the highest-scoring squad within budget
    Optimize {
        /// Player pool CSV
        #[arg(long)]
        players: Option<PathBuf>,

        /// Adjustments (injury/availability) file
        #[arg(long)]
        adjustments: Option<PathBuf>,

        #[arg(long)]
        budget: Option<f64>,

        /// Score multiplier for substitutes
        #[arg(long)]
        bench_fraction: Option<f64>,

        /// Relative optimality gap accepted from the solver
        #[arg(long)]
        tolerance: Option<f64>,

        /// Player stat to maximize
        #[arg(long)]
        score_field: Option<String>,

        /// Ignore adjustments with a factor at or above this value
        #[arg(long)]
        threshold: Option<f64>,

        /// Also save the roster report here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compare two saved roster reports
    Diff {
        roster_a: PathBuf,

        roster_b: PathBuf,

        /// Player pool CSV holding the rarity stat
        #[arg(long)]
        players: Option<PathBuf>,

        /// Player stat holding ownership fractions
        #[arg(long)]
        rarity_field: Option<String>,
    },

    /// Write an adjustments file for every player not fully available
    Adjustments {
        /// Player pool CSV
        #[arg(long)]
        players: Option<PathBuf>,

        /// Output adjustments file
        #[arg(long)]
        out: PathBuf,

        /// Player stat holding the chance of playing, in [0, 1]
        #[arg(long, default_value = "availability")]
        field: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_deref())?;

    let mut config = load_config(cli.config.as_deref())?;
    info!(
        "Config loaded: season {} from {}, budget {}",
        config.source.season, config.source.source, config.optimizer.budget
    );

    match cli.command {
        Commands::Optimize {
            players,
            adjustments,
            budget,
            bench_fraction,
            tolerance,
            score_field,
            threshold,
            out,
        } => {
            let opt = &mut config.optimizer;
            if let Some(v) = budget {
                opt.budget = v;
            }
            if let Some(v) = bench_fraction {
                opt.bench_fraction = v;
            }
            if let Some(v) = tolerance {
                opt.tolerance = v;
            }
            if let Some(v) = score_field {
                opt.score_field = v;
            }
            if let Some(v) = threshold {
                opt.adjustment_threshold = v;
            }
            config::validate(&config).context("invalid optimizer settings")?;

            let players_path = players_path(players, &config)?;
            let pool = load_pool(&players_path)?;
            info!("Loaded {} players", pool.len());

            let adjustment_entries = match adjustments.or_else(|| config.data.adjustments.clone()) {
                Some(path) => adjustments::load_adjustments(&path).with_context(|| {
                    format!("failed to load adjustments from {}", path.display())
                })?,
                None => Vec::new(),
            };

            let result = optimize(
                &pool,
                &adjustment_entries,
                &config.optimizer,
                &config.squad,
                &MilpSolver::new(),
            )
            .context("optimization failed")?;

            if let Some(path) = out {
                roster::save_report(&path, &result.roster)
                    .with_context(|| format!("failed to save roster to {}", path.display()))?;
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let report = roster::to_report(&result.roster).context("failed to format roster")?;
                print!("{report}");
            }
        }

        Commands::Diff {
            roster_a,
            roster_b,
            players,
            rarity_field,
        } => {
            if let Some(v) = rarity_field {
                config.similarity.rarity_field = v;
            }
            config::validate(&config).context("invalid similarity settings")?;

            let a = roster::load_report(&roster_a)
                .with_context(|| format!("failed to read roster {}", roster_a.display()))?;
            let b = roster::load_report(&roster_b)
                .with_context(|| format!("failed to read roster {}", roster_b.display()))?;

            let players_path = players_path(players, &config)?;
            let pool = load_pool(&players_path)?;

            let score = similarity(&a, &b, &pool, &config.similarity.rarity_field)
                .context("similarity failed")?;

            if cli.json {
                let value = serde_json::json!({
                    "roster_a": roster_a,
                    "roster_b": roster_b,
                    "similarity": score,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{score:.4}");
            }
        }

        Commands::Adjustments { players, out, field } => {
            let players_path = players_path(players, &config)?;
            let pool = load_pool(&players_path)?;

            let entries = adjustments::entries_from_availability(&pool, &field);
            adjustments::save_adjustments(&out, &entries)
                .with_context(|| format!("failed to write adjustments to {}", out.display()))?;
            info!("Wrote {} adjustments to {}", entries.len(), out.display());

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
        }
    }

    Ok(())
}

/// Explicit `--config` must load. Otherwise use config/ under the working
/// directory, falling back to built-in defaults when neither
/// config/squadsmith.toml nor defaults/squadsmith.toml exists there.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return config::load_config_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    match config::load_config() {
        Ok(config) => Ok(config),
        Err(ConfigError::DefaultsCopyError { message }) => {
            warn!("{message}; using built-in defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

fn players_path(flag: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| config.data.players.clone()) {
        Some(path) => Ok(path),
        None => bail!("no player pool given: pass --players or set [data] players in the config"),
    }
}

fn load_pool(path: &Path) -> anyhow::Result<Vec<PlayerRecord>> {
    player::load_players(path)
        .with_context(|| format!("failed to load players from {}", path.display()))
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("squadsmith=info,squadsmith_core=info,warn"));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
        None => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
    }

    Ok(())
}
