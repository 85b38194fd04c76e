//! Alliance SLG - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use slg_core::loader;
use slg_core::resources::Building;
use slg_core::tables::Balance;
use slg_tools::{costs, inspect, probe, validate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "slg-tools")]
#[command(about = "Development tools for the alliance strategy game")]
struct Cli {
    /// Balance file; defaults apply when omitted
    #[arg(long, global = true)]
    balance: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Ladder {
    Draws,
    Farm,
    Bank,
    Quarry,
    Barracks,
    Characters,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "data")]
        path: PathBuf,
    },
    /// Shortest march between two cities
    Path {
        /// Map file (.ron or .json)
        map: PathBuf,
        /// Origin city
        from: String,
        /// Destination city
        to: String,
    },
    /// Print a cost ladder
    Costs {
        /// Which ladder
        #[arg(value_enum)]
        ladder: Ladder,
        /// First draw index (draws only)
        #[arg(long, default_value_t = 1)]
        from: u32,
        /// Number of draws (draws only)
        #[arg(long, default_value_t = 20)]
        count: u32,
    },
    /// Show one player from a repository snapshot
    Inspect {
        /// Snapshot file
        snapshot: PathBuf,
        /// Player user id
        user: String,
    },
}

fn run(cli: Cli) -> slg_tools::Result<String> {
    let balance = match &cli.balance {
        Some(path) => loader::load_balance(path)?,
        None => Balance::default(),
    };

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            let data = validate::validate_data_directory(&path)?;
            Ok(format!("Validation passed\n{data}"))
        }
        Commands::Path { map, from, to } => {
            let map = loader::load_map(&map)?;
            Ok(probe::route(&map, &balance.siege, &from, &to)?.to_string())
        }
        Commands::Costs {
            ladder,
            from,
            count,
        } => {
            let ladder = match ladder {
                Ladder::Draws => costs::draw_ladder(&balance, from, count),
                Ladder::Farm => costs::building_ladder(&balance, Building::Farm),
                Ladder::Bank => costs::building_ladder(&balance, Building::Bank),
                Ladder::Quarry => costs::building_ladder(&balance, Building::Quarry),
                Ladder::Barracks => costs::building_ladder(&balance, Building::Barracks),
                Ladder::Characters => costs::character_ladder(&balance),
            };
            Ok(ladder.to_string())
        }
        Commands::Inspect { snapshot, user } => {
            Ok(inspect::inspect_snapshot(&snapshot, &balance, &user)?.to_string())
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
