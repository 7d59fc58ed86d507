use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classifier::SpecificityOutcome;
use crate::config::SimulationConfig;
use crate::error::FileError;
use crate::mutation::MutationPolicy;
use crate::simulation::SpecificityReport;

/// One line of the simulation log: the parameters of a specificity run and
/// what came out of it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub target_length: usize,
    pub gc_content: f64,
    pub intron_count: usize,
    pub mutated_targets: usize,
    pub mutation_policy: &'static str,
    pub exon_mutation: f64,
    pub intron_mutation: f64,
    pub insert_length: usize,
    pub vector_length: usize,
    pub fragment_min_length: usize,
    pub fragment_max_length: usize,
    pub complementarity_threshold: f64,
    pub trials: usize,
    pub seed: u64,
    pub introns_in_probe: usize,
    pub mean_intron_length_in_probe: Option<f64>,
    pub true_negative: usize,
    pub false_positive: usize,
    pub unclassified: usize,
    pub specificity: Option<f64>,
}

impl LogRecord {
    pub fn new(config: &SimulationConfig, report: &SpecificityReport) -> Self {
        let (mutation_policy, exon_mutation, intron_mutation) = match config.mutation {
            MutationPolicy::Divergence { exon, intron } => ("divergence", exon, intron),
            MutationPolicy::HammingDistance { exon, intron } => {
                ("hamming_distance", exon as f64, intron as f64)
            }
        };
        Self {
            target_length: config.target.length,
            gc_content: config.target.gc_content,
            intron_count: config.target.intron_count,
            mutated_targets: config.mutated_targets,
            mutation_policy,
            exon_mutation,
            intron_mutation,
            insert_length: config.insert_length(),
            vector_length: config.probe.vector_length,
            fragment_min_length: config.fragmentation.min_length,
            fragment_max_length: config.fragmentation.max_length,
            complementarity_threshold: config.complementarity_threshold,
            trials: config.trials,
            seed: config.seed,
            introns_in_probe: report.introns_in_probe,
            mean_intron_length_in_probe: report.mean_intron_length_in_probe,
            true_negative: report.tally.get(SpecificityOutcome::TrueNegative),
            false_positive: report.tally.get(SpecificityOutcome::FalsePositive),
            unclassified: report.tally.get(SpecificityOutcome::Unclassified),
            specificity: report.specificity,
        }
    }
}

/// Append-only, tab-separated log of simulation runs
///
/// The header line is written only if the file is new or empty, so a log can
/// be extended by any number of later sessions.
pub struct SimulationLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl SimulationLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FileError::io(Some(&path), e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| FileError::io(Some(&path), e))?
            .len()
            == 0;
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `record` and flush it to disk
    pub fn append(&mut self, record: &LogRecord) -> Result<(), FileError> {
        self.writer
            .serialize(record)
            .map_err(|e| FileError::csv(Some(&self.path), e))?;
        self.writer
            .flush()
            .map_err(|e| FileError::io(Some(&self.path), e))
    }
}
