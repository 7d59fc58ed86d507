use std::collections::hash_map::HashMap;
use std::hash::Hash;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::classifier::SpecificityOutcome;
use crate::Outcome;

/// A closed set of trial labels
pub trait Label: Copy + Eq + Hash + Ord {
    fn name(&self) -> &'static str;
    fn all() -> Vec<Self>;
}

impl Label for Outcome {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn all() -> Vec<Self> {
        Outcome::iter().collect()
    }
}

impl Label for SpecificityOutcome {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn all() -> Vec<Self> {
        SpecificityOutcome::iter().collect()
    }
}

/// Counts per label
///
/// Tallies of independent runs combine by adding their counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally<L: Label> {
    counts: HashMap<L, usize>,
}

impl<L: Label> Default for Tally<L> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<L: Label> Tally<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: L) {
        self.counts.entry(label).and_modify(|c| *c += 1).or_insert(1);
    }

    pub fn get(&self, label: L) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of all recorded trials that carry `label`
    pub fn rate(&self, label: L) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.get(label) as f64 / total as f64,
        }
    }

    pub fn merge(&mut self, other: &Tally<L>) {
        for (label, count) in &other.counts {
            *self.counts.entry(*label).or_insert(0) += count;
        }
    }

    /// Every label in its canonical order, including those never seen
    pub fn iter(&self) -> impl Iterator<Item = (L, usize)> + '_ {
        L::all().into_iter().map(move |label| (label, self.get(label)))
    }
}

impl<L: Label> Serialize for Tally<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let labels = L::all();
        let mut map = serializer.serialize_map(Some(labels.len()))?;
        for label in labels {
            map.serialize_entry(label.name(), &self.get(label))?;
        }
        map.end()
    }
}

/// Counts of one label across repeated runs
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LabelSummary {
    pub label: &'static str,
    pub counts: Vec<usize>,
    pub mean: f64,
    /// population standard deviation
    pub std_dev: f64,
}

impl LabelSummary {
    pub fn summarize<L: Label>(tallies: &[Tally<L>]) -> Vec<LabelSummary> {
        L::all()
            .into_iter()
            .map(|label| {
                let counts: Vec<usize> = tallies.iter().map(|t| t.get(label)).collect();
                let (mean, std_dev) = mean_and_std_dev(&counts);
                LabelSummary {
                    label: label.name(),
                    counts,
                    mean,
                    std_dev,
                }
            })
            .collect()
    }
}

fn mean_and_std_dev(values: &[usize]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = Tally::new();
        a.record(Outcome::Both);
        a.record(Outcome::Both);
        a.record(Outcome::RealOnly);
        let mut b = Tally::new();
        b.record(Outcome::Neither);
        b.record(Outcome::Both);
        a.merge(&b);
        assert_eq!(a.get(Outcome::Both), 3);
        assert_eq!(a.get(Outcome::MutantOnly), 0);
        assert_eq!(a.total(), 5);
        assert!((a.rate(Outcome::Both) - 0.6).abs() < 1e-12);
        let labels: Vec<Outcome> = a.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, Outcome::all());
    }

    #[test]
    fn test_merge_is_commutative() {
        let mut a = Tally::new();
        a.record(SpecificityOutcome::TrueNegative);
        let mut b = Tally::new();
        b.record(SpecificityOutcome::FalsePositive);
        b.record(SpecificityOutcome::TrueNegative);
        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_serialize() {
        let mut tally = Tally::new();
        tally.record(Outcome::RealOnly);
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"real_only":1,"mutant_only":0,"neither":0,"both":0}"#);
    }

    #[test]
    fn test_summarize() {
        let mut runs = Vec::new();
        for both in &[2, 4, 4, 4, 5, 5, 7, 9] {
            let mut tally = Tally::new();
            for _ in 0..*both {
                tally.record(Outcome::Both);
            }
            runs.push(tally);
        }
        let summary = LabelSummary::summarize(&runs);
        let both = summary.iter().find(|s| s.label == "both").unwrap();
        assert_eq!(both.counts, vec![2, 4, 4, 4, 5, 5, 7, 9]);
        assert!((both.mean - 5.0).abs() < 1e-12);
        assert!((both.std_dev - 2.0).abs() < 1e-12);
        let neither = summary.iter().find(|s| s.label == "neither").unwrap();
        assert_eq!(neither.mean, 0.0);
    }
}
