//! Parameter sweeps over the specificity experiment
//!
//! Configurations come either from random sampling or from a sweep table.
//! A sweep table is tab-separated, one configuration per line, `#` starts a
//! comment:
//!
//! ```text
//! #target_length  gc_content  intron_count  mutated_targets  exon_hdist  intron_hdist  insert_length
//! 2000            0.32        3             2                5           20            1000
//! ```

use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use rand::Rng;
use serde::Serialize;
use tabfile::Tabfile;

use crate::config::SimulationConfig;
use crate::error::{FileError, ParseError};
use crate::log_writer::{LogRecord, SimulationLog};
use crate::mutation::MutationPolicy;
use crate::simulation::{SimulationDriver, SpecificityReport};

const TARGET_LENGTH_IDX: usize = 0;
const GC_CONTENT_IDX: usize = 1;
const INTRON_COUNT_IDX: usize = 2;
const MUTATED_TARGETS_IDX: usize = 3;
const EXON_HDIST_IDX: usize = 4;
const INTRON_HDIST_IDX: usize = 5;
const INSERT_LENGTH_IDX: usize = 6;
const COLUMN_COUNT: usize = 7;

/// Draw `count` configurations from the usual sweep ranges
///
/// Everything not sampled is taken from `base`; every configuration gets a
/// fresh seed drawn from `rng`. Target and insert lengths are drawn
/// independently, so a configuration whose insert is longer than its target
/// fails validation and is skipped by `run_sweep`.
pub fn random_configs<R: Rng + ?Sized>(
    base: &SimulationConfig,
    count: usize,
    rng: &mut R,
) -> Vec<SimulationConfig> {
    (0..count)
        .map(|_| {
            let mut config = base.clone();
            config.target.length = rng.random_range(1000..10000);
            config.target.gc_content = rng.random_range(0.2..0.8);
            config.target.intron_count = rng.random_range(1..=10);
            config.mutated_targets = rng.random_range(1..=10);
            config.mutation = MutationPolicy::HammingDistance {
                exon: rng.random_range(1..10),
                intron: rng.random_range(10..100),
            };
            config.probe.insert_length = Some(rng.random_range(1000..10000));
            config.complementarity_threshold = 0.8;
            config.fragmentation.min_length = 200;
            config.fragmentation.max_length = 600;
            config.seed = rng.random();
            config
        })
        .collect()
}

fn column<T: FromStr>(
    tokens: &[&str],
    idx: usize,
    name: &'static str,
    expected: &'static str,
    line: usize,
) -> Result<T, ParseError> {
    tokens[idx]
        .trim()
        .parse()
        .map_err(|_| ParseError::column(name, line, expected, tokens[idx].to_string()))
}

/// Read one configuration per table line, filling the remaining fields from `base`
pub fn read_sweep_table<P: AsRef<Path>>(
    path: P,
    base: &SimulationConfig,
) -> Result<Vec<SimulationConfig>, FileError> {
    let tabfile = match Tabfile::open(&path) {
        Ok(tf) => tf.comment_character('#'),
        Err(e) => return Err(FileError::io(Some(&path), e)),
    };
    let mut result = Vec::new();
    for record_result in tabfile {
        let record = record_result.map_err(|e| FileError::io(Some(&path), e))?;
        let tokens = record.fields();
        if tokens.len() < COLUMN_COUNT {
            let err = ParseError::file(
                path.as_ref().to_path_buf(),
                record.line_number(),
                "7 columns",
                record.line().to_string(),
            );
            return Err(FileError::parse(Some(&path), err));
        }
        let line = record.line_number();
        let parse = |e| FileError::parse(Some(&path), e);

        let mut config = base.clone();
        config.target.length =
            column(&tokens, TARGET_LENGTH_IDX, "target_length", "a length", line).map_err(parse)?;
        config.target.gc_content =
            column(&tokens, GC_CONTENT_IDX, "gc_content", "a fraction", line).map_err(parse)?;
        config.target.intron_count =
            column(&tokens, INTRON_COUNT_IDX, "intron_count", "a count", line).map_err(parse)?;
        config.mutated_targets =
            column(&tokens, MUTATED_TARGETS_IDX, "mutated_targets", "a count", line).map_err(parse)?;
        config.mutation = MutationPolicy::HammingDistance {
            exon: column(&tokens, EXON_HDIST_IDX, "exon_hdist", "a count", line).map_err(parse)?,
            intron: column(&tokens, INTRON_HDIST_IDX, "intron_hdist", "a count", line).map_err(parse)?,
        };
        config.probe.insert_length = Some(
            column(&tokens, INSERT_LENGTH_IDX, "insert_length", "a length", line).map_err(parse)?,
        );
        result.push(config);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub config: SimulationConfig,
    pub report: SpecificityReport,
}

/// Run the specificity experiment for every configuration
///
/// A configuration that fails to validate or to simulate is reported with
/// `warn!` and skipped. Writing to `log` is not optional once requested, so
/// its errors end the sweep.
pub fn run_sweep<I>(configs: I, mut log: Option<&mut SimulationLog>) -> Result<Vec<SweepResult>, FileError>
where
    I: IntoIterator<Item = SimulationConfig>,
{
    let mut results = Vec::new();
    let mut skipped = 0;
    for (i, config) in configs.into_iter().enumerate() {
        let report = match SimulationDriver::new(config.clone()).and_then(|d| d.run_specificity()) {
            Ok(report) => report,
            Err(e) => {
                warn!("Skipping sweep configuration {}: {}", i + 1, e);
                skipped += 1;
                continue;
            }
        };
        if let Some(log) = log.as_mut() {
            log.append(&LogRecord::new(&config, &report))?;
        }
        results.push(SweepResult { config, report });
    }
    info!("Sweep finished: {} configurations run, {} skipped", results.len(), skipped);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::io::Write;

    fn base() -> SimulationConfig {
        let mut base = SimulationConfig::specificity();
        base.trials = 50;
        base
    }

    #[test]
    fn test_random_configs_follow_sweep_ranges() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(61);
        let configs = random_configs(&base(), 50, &mut rng);
        assert_eq!(configs.len(), 50);
        let mut too_long = 0;
        for config in &configs {
            assert!((1000..10000).contains(&config.target.length));
            assert!((1..=10).contains(&config.target.intron_count));
            assert_eq!(config.trials, 50);
            if config.insert_length() > config.target.length {
                too_long += 1;
                assert!(config.validate().is_err());
            } else {
                assert!(config.validate().is_ok());
            }
        }
        assert!(too_long > 0 && too_long < 50);
    }

    #[test]
    fn test_read_sweep_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "#target_length\tgc\tintrons\tmutants\texon\tintron\tinsert").unwrap();
        writeln!(file, "2000\t0.32\t3\t2\t5\t20\t1000").unwrap();
        writeln!(file, "1500\t0.5\t1\t1\t1\t10\t800").unwrap();
        file.flush().unwrap();

        let configs = read_sweep_table(file.path(), &base()).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].target.length, 2000);
        assert_eq!(configs[0].mutated_targets, 2);
        assert_eq!(configs[0].mutation, MutationPolicy::HammingDistance { exon: 5, intron: 20 });
        assert_eq!(configs[1].target.gc_content, 0.5);
        assert_eq!(configs[1].insert_length(), 800);
        assert_eq!(configs[1].trials, 50);
    }

    #[test]
    fn test_malformed_sweep_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2000\tlots\t3\t2\t5\t20\t1000").unwrap();
        file.flush().unwrap();
        assert!(read_sweep_table(file.path(), &base()).is_err());

        let mut short = tempfile::NamedTempFile::new().unwrap();
        writeln!(short, "2000\t0.32\t3").unwrap();
        short.flush().unwrap();
        assert!(read_sweep_table(short.path(), &base()).is_err());
    }

    #[test]
    fn test_insert_longer_than_target_is_skipped() {
        let mut config = base();
        config.target.length = 1200;
        config.probe.insert_length = Some(1500);
        let results = run_sweep(vec![config, base()], None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].config, base());
    }

    #[test]
    fn test_failing_configs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Simulation.log");
        let mut log = SimulationLog::open(&path).unwrap();

        let good = base();
        let mut bad = base();
        bad.complementarity_threshold = 3.0;
        let results = run_sweep(vec![bad, good.clone()], Some(&mut log)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].config, good);
        assert_eq!(results[0].report.tally.total(), 50);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
