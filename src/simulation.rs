//! Runs whole experiments: builds the targets and the probe once, then
//! repeats independent trials and tallies their outcomes.

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

use crate::classifier::{
    HybridizationClassifier, SpecificityClassifier, SpecificityOutcome, SpecificityTrial, TargetPool,
};
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::probe::Probe;
use crate::tally::{LabelSummary, Tally};
use crate::target::Target;
use crate::Outcome;

/// Result of the four-way hybridization experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridizationReport {
    pub trials: usize,
    pub tally: Tally<Outcome>,
    /// share of trials per label, in `Outcome` order
    pub rates: Vec<(&'static str, f64)>,
    pub introns_in_probe: usize,
}

/// Four-way tallies of several runs with independent random streams
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatedReport {
    pub runs: Vec<Tally<Outcome>>,
    pub summary: Vec<LabelSummary>,
}

/// Result of the specificity experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificityReport {
    pub trials: usize,
    pub tally: Tally<SpecificityOutcome>,
    /// `true_negative / (true_negative + false_positive)`, unset if both are 0
    pub specificity: Option<f64>,
    pub introns_in_probe: usize,
    pub mean_intron_length_in_probe: Option<f64>,
    /// distinct fragments nick translation can cut from the probe
    pub possible_fragments: usize,
}

impl SpecificityReport {
    fn new(trials: usize, tally: Tally<SpecificityOutcome>, probe: &Probe, possible_fragments: usize) -> Self {
        let true_negative = tally.get(SpecificityOutcome::TrueNegative);
        let false_positive = tally.get(SpecificityOutcome::FalsePositive);
        let specificity = match true_negative + false_positive {
            0 => None,
            classified => Some(true_negative as f64 / classified as f64),
        };
        Self {
            trials,
            tally,
            specificity,
            introns_in_probe: probe.intron_count(),
            mean_intron_length_in_probe: probe.mean_intron_length(),
            possible_fragments,
        }
    }
}

pub struct SimulationDriver {
    config: SimulationConfig,
}

impl SimulationDriver {
    /// Fails if any parameter is out of range, before anything is simulated
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn master_rng(&self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(self.config.seed)
    }

    fn real_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Target, SimulationError> {
        let target = &self.config.target;
        Target::generate(
            &self.config.sequence_generator(),
            &self.config.annotator(),
            target.length,
            target.gc_content,
            target.intron_count,
            rng,
        )
    }

    fn probe<R: Rng + ?Sized>(&self, target: &Target, rng: &mut R) -> Result<Probe, SimulationError> {
        let builder = self.config.probe_builder();
        if self.config.probe.require_intron {
            builder.build_probe_spanning_intron(target, self.config.insert_length(), rng)
        } else {
            builder.build_probe(target, self.config.insert_length(), rng)
        }
    }

    /// Four-way experiment seeded from the configured seed
    pub fn run_hybridization(&self) -> Result<HybridizationReport, SimulationError> {
        self.run_hybridization_with(&mut self.master_rng())
    }

    pub fn run_hybridization_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<HybridizationReport, SimulationError> {
        let config = &self.config;
        info!(
            "Hybridization run: {} trials, target {} bp (GC {}, {} introns), threshold {}",
            config.trials,
            config.target.length,
            config.target.gc_content,
            config.target.intron_count,
            config.complementarity_threshold
        );
        let real = self.real_target(rng)?;
        let mutant = config.mutator()?.mutate(&real, rng)?;
        let probe = self.probe(&real, rng)?;
        let engine = config.fragmentation_engine()?;
        let classifier = HybridizationClassifier::new(config.complementarity_threshold)?;

        let mut tally = Tally::new();
        for trial in 0..config.trials {
            // every variant gets its own, freshly fragmented read
            let real_read = engine.fragment(&probe, real.len(), rng)?;
            let mutant_read = engine.fragment(&probe, mutant.len(), rng)?;
            let outcome = classifier.classify(&real_read, &real, &mutant_read, &mutant)?;
            debug!("trial {}: {}", trial, outcome);
            tally.record(outcome);
        }
        info!("Hybridization tally: {}", serde_json::to_string(&tally).unwrap_or_default());

        let rates = tally.iter().map(|(label, _)| (label.as_str(), tally.rate(label))).collect();
        Ok(HybridizationReport {
            trials: config.trials,
            tally,
            rates,
            introns_in_probe: probe.intron_count(),
        })
    }

    /// Repeat the four-way experiment `repeats` times
    ///
    /// Run `i` uses the master stream advanced by `i` xoshiro jumps, so runs
    /// never share random numbers and the first run equals `run_hybridization`.
    pub fn run_repeated(&self, repeats: usize) -> Result<RepeatedReport, SimulationError> {
        if repeats == 0 {
            return Err(SimulationError::invalid("repeats", "must be > 0"));
        }
        let mut stream = self.master_rng();
        let mut runs = Vec::with_capacity(repeats);
        for _ in 0..repeats {
            let mut run_rng = stream.clone();
            stream.jump();
            runs.push(self.run_hybridization_with(&mut run_rng)?.tally);
        }
        let summary = LabelSummary::summarize(&runs);
        Ok(RepeatedReport { runs, summary })
    }

    /// Specificity experiment seeded from the configured seed
    pub fn run_specificity(&self) -> Result<SpecificityReport, SimulationError> {
        self.run_specificity_with(&mut self.master_rng())
    }

    pub fn run_specificity_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SpecificityReport, SimulationError> {
        let config = &self.config;
        if config.fragmentation.max_length > config.target.length {
            return Err(SimulationError::invalid(
                "fragment_max_length",
                format!(
                    "{} exceeds the target length {}",
                    config.fragmentation.max_length, config.target.length
                ),
            ));
        }
        info!(
            "Specificity run: {} trials, {} mutated targets, {} introns, probe insert {} bp",
            config.trials,
            config.mutated_targets,
            config.target.intron_count,
            config.insert_length()
        );
        let real = self.real_target(rng)?;
        let mutator = config.mutator()?;
        let mutants = (0..config.mutated_targets)
            .map(|_| mutator.mutate(&real, rng))
            .collect::<Result<Vec<Target>, SimulationError>>()?;
        let probe = self.probe(&real, rng)?;
        let pool = TargetPool::new(&real, &mutants);
        let engine = config.fragmentation_engine()?;
        let classifier = SpecificityClassifier::new(config.complementarity_threshold)?;

        let mut tally = Tally::new();
        for _ in 0..config.trials {
            let trial = SpecificityTrial::draw(&probe, &pool, &engine, rng)?;
            tally.record(classifier.classify(&trial));
        }
        let report = SpecificityReport::new(config.trials, tally, &probe, engine.possible_fragment_count(&probe));
        info!(
            "Specificity: {:?} ({} introns in probe)",
            report.specificity, report.introns_in_probe
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn test_tally_sums_to_trials() {
        let mut config = SimulationConfig::default();
        config.trials = 25;
        let report = SimulationDriver::new(config).unwrap().run_hybridization().unwrap();
        assert_eq!(report.tally.total(), 25);
        let rate_sum: f64 = report.rates.iter().map(|(_, r)| r).sum();
        assert!((rate_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let driver = SimulationDriver::new(SimulationConfig::default()).unwrap();
        assert_eq!(
            driver.run_hybridization().unwrap(),
            driver.run_hybridization().unwrap()
        );
    }

    #[test]
    fn test_repeated_runs() {
        let driver = SimulationDriver::new(SimulationConfig::default()).unwrap();
        let repeated = driver.run_repeated(3).unwrap();
        assert_eq!(repeated.runs.len(), 3);
        assert_eq!(repeated.runs[0], driver.run_hybridization().unwrap().tally);
        assert_eq!(repeated.summary.len(), 4);
        for summary in &repeated.summary {
            assert_eq!(summary.counts.len(), 3);
        }
        let mean_total: f64 = repeated.summary.iter().map(|s| s.mean).sum();
        assert!((mean_total - 10.0).abs() < 1e-9);
        assert!(driver.run_repeated(0).is_err());
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let mut config = SimulationConfig::default();
        config.complementarity_threshold = 2.0;
        assert!(SimulationDriver::new(config).is_err());
    }

    #[test]
    fn test_specificity() {
        let mut config = SimulationConfig::specificity();
        config.trials = 2000;
        let report = SimulationDriver::new(config).unwrap().run_specificity().unwrap();
        assert_eq!(report.tally.total(), 2000);
        assert!(report.introns_in_probe > 0);
        assert!(report.mean_intron_length_in_probe.unwrap() > 0.0);
        // probe of 2000 bp, fragments of 200..=600 bp: sum of 2001 - len
        let expected: usize = (200..=600).map(|len| 2001 - len).sum();
        assert_eq!(report.possible_fragments, expected);
        if let Some(specificity) = report.specificity {
            assert!((0.0..=1.0).contains(&specificity));
        }
    }

    #[test]
    fn test_specificity_rejects_long_fragments() {
        let mut config = SimulationConfig::default();
        config.fragmentation.max_length = 2000;
        config.probe.insert_length = Some(1000);
        let driver = SimulationDriver::new(config).unwrap();
        assert!(matches!(
            driver.run_specificity(),
            Err(SimulationError::InvalidParameter { .. })
        ));
    }
}
