use rand::Rng;

use crate::error::SimulationError;
use crate::fragment_info::{resolve, FragmentInfo};
use crate::interval::Interval;
use crate::sequence::{Sequence, SequenceGenerator};
use crate::structure::{RegionKind, Structure};
use crate::target::Target;

pub const DEFAULT_MIN_VECTOR_LENGTH: usize = 200;
pub const DEFAULT_MIN_INSERT_LENGTH: usize = 4;
pub const DEFAULT_MAX_PROBE_ATTEMPTS: usize = 1000;

/// Name of the synthetic region appended behind the insert
pub const VECTOR_REGION: &str = "vector";

/// A labeled probe: a target fragment (the insert) followed by vector sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub sequence: Sequence,
    /// insert regions in probe coordinates plus a trailing vector region
    pub structure: Structure,
    /// where the insert came from on the target
    pub insert: FragmentInfo,
}

impl Probe {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn insert_length(&self) -> usize {
        self.insert.len()
    }

    pub fn vector_length(&self) -> usize {
        self.len() - self.insert_length()
    }

    pub fn intron_count(&self) -> usize {
        self.structure.intron_count()
    }

    /// Mean length of the (possibly clipped) introns carried by the insert
    pub fn mean_intron_length(&self) -> Option<f64> {
        let introns = self.structure.get_introns();
        if introns.is_empty() {
            return None;
        }
        let total: usize = introns.iter().map(|r| r.len()).sum();
        Some(total as f64 / introns.len() as f64)
    }
}

/// Builds probes from targets
#[derive(Debug, Clone, Copy)]
pub struct ProbeBuilder {
    vector_length: usize,
    vector_gc_content: f64,
    vector_generator: SequenceGenerator,
    min_insert_length: usize,
    max_attempts: usize,
}

impl ProbeBuilder {
    pub fn new(vector_length: usize, vector_gc_content: f64) -> Self {
        Self {
            vector_length,
            vector_gc_content,
            vector_generator: SequenceGenerator::new(DEFAULT_MIN_VECTOR_LENGTH),
            min_insert_length: DEFAULT_MIN_INSERT_LENGTH,
            max_attempts: DEFAULT_MAX_PROBE_ATTEMPTS,
        }
    }

    pub fn min_vector_length(mut self, min_length: usize) -> Self {
        self.vector_generator = SequenceGenerator::new(min_length);
        self
    }

    pub fn min_insert_length(mut self, min_length: usize) -> Self {
        self.min_insert_length = min_length;
        self
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn build_vector<R: Rng + ?Sized>(
        &self,
        length: usize,
        gc_content: f64,
        rng: &mut R,
    ) -> Result<Sequence, SimulationError> {
        self.vector_generator.generate(length, gc_content, rng)
    }

    /// Take a random `insert_length` window of `target` and append fresh vector sequence
    pub fn build_probe<R: Rng + ?Sized>(
        &self,
        target: &Target,
        insert_length: usize,
        rng: &mut R,
    ) -> Result<Probe, SimulationError> {
        self.check_insert_length(target, insert_length)?;
        self.build_unchecked(target, insert_length, rng)
    }

    /// Like `build_probe`, but redraw the insert until it touches at least one intron
    pub fn build_probe_spanning_intron<R: Rng + ?Sized>(
        &self,
        target: &Target,
        insert_length: usize,
        rng: &mut R,
    ) -> Result<Probe, SimulationError> {
        self.check_insert_length(target, insert_length)?;
        if target.structure.intron_count() == 0 {
            return Err(SimulationError::invalid(
                "intron_count",
                "cannot build an intron-spanning probe from an intronless target",
            ));
        }
        for _ in 0..self.max_attempts {
            let probe = self.build_unchecked(target, insert_length, rng)?;
            if probe.insert.spans_intron() {
                return Ok(probe);
            }
        }
        Err(SimulationError::ConstraintUnsatisfiable {
            goal: "build a probe spanning an intron",
            attempts: self.max_attempts,
        })
    }

    fn check_insert_length(&self, target: &Target, insert_length: usize) -> Result<(), SimulationError> {
        if insert_length > target.len() {
            return Err(SimulationError::invalid(
                "insert_length",
                format!("{} exceeds the target length {}", insert_length, target.len()),
            ));
        }
        if insert_length < self.min_insert_length.max(1) {
            return Err(SimulationError::invalid(
                "insert_length",
                format!("{} is below the minimum of {}", insert_length, self.min_insert_length.max(1)),
            ));
        }
        Ok(())
    }

    fn build_unchecked<R: Rng + ?Sized>(
        &self,
        target: &Target,
        insert_length: usize,
        rng: &mut R,
    ) -> Result<Probe, SimulationError> {
        let insert_start = rng.random_range(0..=target.len() - insert_length);
        let insert_range = Interval::new(insert_start, insert_start + insert_length - 1)?;
        let insert = resolve(&target.structure, insert_range.start, insert_range.end)?;
        let vector = self.build_vector(self.vector_length, self.vector_gc_content, rng)?;
        let sequence = target.sequence.sub_sequence(&insert_range).join(&vector);
        let structure = insert
            .local
            .with_region(VECTOR_REGION.to_string(), RegionKind::Vector, vector.len())?;
        Ok(Probe {
            sequence,
            structure,
            insert,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::StructureAnnotator;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn target(rng: &mut Xoshiro256PlusPlus, introns: usize) -> Target {
        Target::generate(
            &SequenceGenerator::default(),
            &StructureAnnotator::default(),
            2000,
            0.32,
            introns,
            rng,
        )
        .unwrap()
    }

    #[test]
    fn test_build_probe() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
        let target = target(&mut rng, 3);
        let builder = ProbeBuilder::new(300, 0.5);
        let probe = builder.build_probe(&target, 1000, &mut rng).unwrap();
        assert_eq!(probe.len(), 1300);
        assert_eq!(probe.insert_length(), 1000);
        assert_eq!(probe.vector_length(), 300);
        assert_eq!(probe.structure.sequence_length(), 1300);
        let vector = probe.structure.get(VECTOR_REGION).unwrap();
        assert_eq!(vector.range, Interval::new(1000, 1299).unwrap());
        assert_eq!(
            &probe.sequence.as_str()[..1000],
            &target.sequence.as_str()[probe.insert.start..=probe.insert.end]
        );
    }

    #[test]
    fn test_whole_target_insert() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(22);
        let target = target(&mut rng, 2);
        let probe = ProbeBuilder::new(200, 0.5).build_probe(&target, 2000, &mut rng).unwrap();
        assert_eq!(probe.insert.start, 0);
        assert_eq!(probe.insert.local, target.structure);
        assert_eq!(probe.intron_count(), 2);
        assert!(probe.mean_intron_length().unwrap() > 0.0);
    }

    #[test]
    fn test_invalid_lengths() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(23);
        let target = target(&mut rng, 1);
        let builder = ProbeBuilder::new(300, 0.5);
        assert!(builder.build_probe(&target, 2001, &mut rng).is_err());
        assert!(builder.build_probe(&target, 3, &mut rng).is_err());
        assert!(ProbeBuilder::new(199, 0.5).build_probe(&target, 100, &mut rng).is_err());
        assert!(builder.build_vector(100, 0.5, &mut rng).is_err());
        assert!(builder.build_vector(250, 1.2, &mut rng).is_err());
    }

    #[test]
    fn test_spanning_intron() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(24);
        let target = target(&mut rng, 4);
        let builder = ProbeBuilder::new(300, 0.5);
        for _ in 0..20 {
            let probe = builder.build_probe_spanning_intron(&target, 50, &mut rng).unwrap();
            assert!(probe.intron_count() > 0);
        }
        let intronless = super::tests::target(&mut rng, 0);
        assert!(builder.build_probe_spanning_intron(&intronless, 50, &mut rng).is_err());
    }

    #[test]
    fn test_spanning_intron_gives_up() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(25);
        let sequence = SequenceGenerator::default().generate(1000, 0.5, &mut rng).unwrap();
        // a single 1 bp intron in the middle of 1000 bp
        let structure = Structure::from_cut_points(1000, &[499, 501]).unwrap();
        let target = Target::new(sequence, structure).unwrap();
        let builder = ProbeBuilder::new(300, 0.5).max_attempts(1);
        let mut failures = 0;
        for _ in 0..50 {
            if let Err(SimulationError::ConstraintUnsatisfiable { attempts, .. }) =
                builder.build_probe_spanning_intron(&target, 4, &mut rng)
            {
                assert_eq!(attempts, 1);
                failures += 1;
            }
        }
        assert!(failures > 0);
    }
}
