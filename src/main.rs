use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use hybsim::log_writer::{LogRecord, SimulationLog};
use hybsim::sweep::{random_configs, read_sweep_table, run_sweep};
use hybsim::{HybsimError, Interval, SimulationConfig, SimulationDriver};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON configuration file; unset values keep the subcommand's defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Number of trials per run
    #[arg(short, long)]
    trials: Option<usize>,
    /// Complementarity threshold in [0, 1]
    #[arg(long)]
    threshold: Option<f64>,
    /// Fragment lengths as MIN-MAX, e.g. 100-1100
    #[arg(long, value_parser = Interval::parse)]
    fragment_lengths: Option<Interval>,
}

impl CommonArgs {
    fn load(&self, defaults: SimulationConfig) -> Result<SimulationConfig, HybsimError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file_over(&defaults, path)?,
            None => defaults,
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(threshold) = self.threshold {
            config.complementarity_threshold = threshold;
        }
        if let Some(lengths) = self.fragment_lengths {
            config.fragmentation.min_length = lengths.start;
            config.fragmentation.max_length = lengths.end;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tally which of a real and a mutated target a fragmented probe hybridizes to
    Hybridize {
        #[command(flatten)]
        common: CommonArgs,
        /// Repeat the experiment with independent random streams and summarize
        #[arg(short, long)]
        repeats: Option<usize>,
    },
    /// Estimate how well probe fragments discriminate real from mutated targets
    Specificity {
        #[command(flatten)]
        common: CommonArgs,
        /// Append the run to this tab-separated log
        #[arg(short, long)]
        log: Option<PathBuf>,
    },
    /// Run the specificity experiment over many configurations
    Sweep {
        #[command(flatten)]
        common: CommonArgs,
        /// Number of randomly sampled configurations
        #[arg(long, required_unless_present = "table", conflicts_with = "table")]
        random: Option<usize>,
        /// Tab-separated table with one configuration per line
        #[arg(long)]
        table: Option<PathBuf>,
        /// Tab-separated log to append results to
        #[arg(short, long, default_value = "Simulation.log")]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Hybridize { common, repeats } => {
            let driver = SimulationDriver::new(common.load(SimulationConfig::default())?)?;
            let json = match repeats {
                Some(repeats) => serde_json::to_string_pretty(&driver.run_repeated(repeats)?)?,
                None => serde_json::to_string_pretty(&driver.run_hybridization()?)?,
            };
            println!("{}", json);
        }
        Commands::Specificity { common, log } => {
            let driver = SimulationDriver::new(common.load(SimulationConfig::specificity())?)?;
            let report = driver.run_specificity()?;
            if let Some(path) = log {
                let mut log = SimulationLog::open(&path)?;
                log.append(&LogRecord::new(driver.config(), &report))?;
                info!("Appended run to {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Sweep {
            common,
            random,
            table,
            log,
        } => {
            let base = common.load(SimulationConfig::specificity())?;
            let configs = match (random, table) {
                (_, Some(table)) => read_sweep_table(&table, &base)?,
                (Some(count), None) => {
                    let mut rng = Xoshiro256PlusPlus::seed_from_u64(base.seed);
                    random_configs(&base, count, &mut rng)
                }
                (None, None) => Vec::new(),
            };
            let mut log = SimulationLog::open(&log)?;
            let results = run_sweep(configs, Some(&mut log))?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
