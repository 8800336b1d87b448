#![warn(clippy::pedantic)]

mod config;
mod server;

use std::{path::PathBuf, time::Instant};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::eyre;
use config::{Config, SearchSettings};
use env_logger::TimestampPrecision;
use itertools::Itertools;
use log::{LevelFilter, info};
use owo_colors::OwoColorize;
use twophase::{CubieCube, FaceCube, Solution, Tables, TwoPhaseSolver};

/// Solves the 3x3x3 cube with the two-phase algorithm
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file to use, in TOML format.
    #[arg(long, short = 'c', value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory the solver tables are kept in. Defaults to the platform
    /// cache directory.
    #[arg(long, value_name = "DIR")]
    table_dir: Option<PathBuf>,

    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    log_level: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Return the first solution with at most this many moves.
    #[arg(long, short = 'm')]
    max_length: Option<usize>,

    /// Give up looking for a shorter solution after this many seconds.
    #[arg(long, short = 't')]
    timeout: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cube given by its 54 facelets, in the order U R F D L B.
    Solve {
        cube: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Find a move sequence that turns one cube into another.
    Solveto {
        cube: String,
        goal: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Answer solve requests over TCP, one cube definition per line.
    Serve {
        #[arg(long, short = 'p')]
        port: Option<u16>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Print the definition of a uniformly random cube.
    Random {
        /// Also draw the cube as an unfolded net.
        #[arg(long)]
        net: bool,
    },
    /// Solve random cubes and print how long the solutions are.
    Bench {
        /// How many cubes to solve.
        #[arg(long, short = 'n', default_value_t = 100)]
        count: usize,
        /// Seconds to spend on each cube.
        #[arg(long, short = 't', default_value_t = 1.0)]
        timeout: f64,
    },
    /// Build the solver tables, or check that the stored ones load.
    Tables,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    let store = config.table_store(cli.table_dir);
    let load_tables = || {
        info!("Using the tables in {}", store.dir().display());
        let started = Instant::now();
        let tables = Tables::load_or_build(&store);
        info!("Tables ready in {:.2?}", started.elapsed());
        tables
    };

    match cli.command {
        Commands::Solve { cube, search } => {
            let tables = load_tables();
            let solver = solver(&tables, config.search_settings(search.max_length, search.timeout)?);
            print_solution(&solver.solve(&cube)?);
        }
        Commands::Solveto { cube, goal, search } => {
            let tables = load_tables();
            let solver = solver(&tables, config.search_settings(search.max_length, search.timeout)?);
            print_solution(&solver.solve_to(&cube, &goal)?);
        }
        Commands::Serve { port, search } => {
            let settings = config.search_settings(search.max_length, search.timeout)?;
            let tables = load_tables();
            server::serve(config.port(port), &solver(&tables, settings))?;
        }
        Commands::Random { net } => {
            let cube = FaceCube::from(&CubieCube::random());
            println!("{cube}");
            if net {
                println!("{}", cube.to_2d_string());
            }
        }
        Commands::Bench { count, timeout } => {
            if count == 0 {
                return Err(eyre!("Nothing to benchmark with a count of zero"));
            }
            let settings = config.search_settings(Some(0), Some(timeout))?;
            let tables = load_tables();
            bench(&solver(&tables, settings), count)?;
        }
        Commands::Tables => {
            load_tables();
            println!(
                "{} {}",
                "Tables ready in".green(),
                store.dir().display().bold()
            );
        }
    }

    Ok(())
}

fn solver(tables: &Tables, settings: SearchSettings) -> TwoPhaseSolver<'_> {
    TwoPhaseSolver::new(tables)
        .with_max_length(settings.max_length)
        .with_timeout(settings.timeout)
}

fn print_solution(solution: &Solution) {
    println!("{}", solution.bold());
}

/// Solves `count` random cubes, the way the solver is meant to be used: ask
/// for nothing in particular and take the best found within the time limit.
fn bench(solver: &TwoPhaseSolver<'_>, count: usize) -> color_eyre::Result<()> {
    let started = Instant::now();
    let mut lengths = Vec::with_capacity(count);

    for i in 0..count {
        let cube = CubieCube::random();
        let solution = solver.solve_cube(&cube)?;
        info!("Cube {}: {solution}", i + 1);
        lengths.push(solution.len());
    }

    let histogram = lengths.iter().copied().counts();
    for (length, n) in histogram.iter().sorted() {
        println!(
            "{:>2} moves: {:>5} {}",
            length.bold(),
            n,
            "#".repeat((n * 50).div_ceil(count)).cyan()
        );
    }

    #[allow(clippy::cast_precision_loss)]
    let average = lengths.iter().sum::<usize>() as f64 / count as f64;
    println!(
        "{} {:.2} moves over {count} cubes in {:.2?}",
        "Average".green(),
        average,
        started.elapsed()
    );
    Ok(())
}
