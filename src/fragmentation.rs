use rand::seq::SliceRandom;
use rand::Rng;

use crate::complementarity::complement;
use crate::error::SimulationError;
use crate::fragment_info::{resolve, FragmentInfo};
use crate::interval::Interval;
use crate::probe::Probe;
use crate::seq_window_slider::SeqWindowSlider;

/// Placeholder for read positions no fragment covers
pub const GAP: char = 'N';

/// A slice of the probe, in probe coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub sequence: String,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Probe regions this fragment was cut from
    pub fn info(&self, probe: &Probe) -> Result<FragmentInfo, SimulationError> {
        resolve(&probe.structure, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// merged probe fragments and their complement
    Probe { sequence: String, complement: String },
    Gap,
}

/// A run of probe material or of gaps inside a reconstructed read
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// offsets within the read, both inclusive
    pub range: Interval,
    pub kind: BlockKind,
}

impl Block {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_gap(&self) -> bool {
        self.kind == BlockKind::Gap
    }

    pub fn complement(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Probe { complement, .. } => Some(complement),
            BlockKind::Gap => None,
        }
    }
}

/// Probe fragments and gaps laid out over the length of a target
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedRead {
    pub blocks: Vec<Block>,
    /// the fragments that went into the read, in sampling order
    pub fragments: Vec<Fragment>,
}

impl ReconstructedRead {
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn probe_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| !b.is_gap())
    }

    /// The read spelled out, with `GAP` at unresolved positions
    pub fn to_sequence(&self) -> String {
        let mut result = String::with_capacity(self.len());
        for block in &self.blocks {
            match &block.kind {
                BlockKind::Probe { sequence, .. } => result.push_str(sequence),
                BlockKind::Gap => result.extend(std::iter::repeat(GAP).take(block.len())),
            }
        }
        result
    }
}

#[derive(Clone, Copy)]
enum Piece {
    Fragment(usize),
    Gap,
}

/// Cuts probes into random-length pieces, nick-translation style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentationEngine {
    min_length: usize,
    max_length: usize,
}

impl FragmentationEngine {
    pub fn new(min_length: usize, max_length: usize) -> Result<Self, SimulationError> {
        if min_length == 0 {
            return Err(SimulationError::invalid("fragment_min_length", "must be > 0"));
        }
        if max_length < min_length {
            return Err(SimulationError::invalid(
                "fragment_max_length",
                format!("{} is below the minimum length {}", max_length, min_length),
            ));
        }
        Ok(Self {
            min_length,
            max_length,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn check_probe(&self, probe: &Probe) -> Result<(), SimulationError> {
        if self.max_length > probe.len() {
            return Err(SimulationError::invalid(
                "fragment_max_length",
                format!("{} exceeds the probe length {}", self.max_length, probe.len()),
            ));
        }
        Ok(())
    }

    /// One fragment with a uniform length in `[min, max]` at a uniform start where it fits
    pub fn sample_fragment<R: Rng + ?Sized>(&self, probe: &Probe, rng: &mut R) -> Result<Fragment, SimulationError> {
        self.check_probe(probe)?;
        Ok(self.sample_unchecked(probe, rng))
    }

    fn sample_unchecked<R: Rng + ?Sized>(&self, probe: &Probe, rng: &mut R) -> Fragment {
        let length = rng.random_range(self.min_length..=self.max_length);
        let start = rng.random_range(0..=probe.len() - length);
        let end = start + length - 1;
        Fragment {
            start,
            end,
            sequence: probe.sequence.as_str()[start..=end].to_string(),
        }
    }

    /// Build a read of exactly `target_length` positions from probe fragments and gaps
    ///
    /// Fragments are drawn until their total length exceeds `target_length`;
    /// the last one is dropped and the shortfall is filled with single gap
    /// positions. Fragments and gaps are shuffled, then neighbouring pieces of
    /// the same kind are merged into blocks.
    pub fn fragment<R: Rng + ?Sized>(
        &self,
        probe: &Probe,
        target_length: usize,
        rng: &mut R,
    ) -> Result<ReconstructedRead, SimulationError> {
        self.check_probe(probe)?;
        if target_length == 0 {
            return Err(SimulationError::invalid("target_length", "must be > 0"));
        }

        let mut fragments = Vec::new();
        let mut total = 0;
        while total <= target_length {
            let fragment = self.sample_unchecked(probe, rng);
            total += fragment.len();
            fragments.push(fragment);
        }
        if let Some(overshoot) = fragments.pop() {
            total -= overshoot.len();
        }
        let gaps = target_length - total;

        let mut pieces: Vec<Piece> = (0..fragments.len())
            .map(Piece::Fragment)
            .chain(std::iter::repeat(Piece::Gap).take(gaps))
            .collect();
        pieces.shuffle(rng);

        let blocks = merge_pieces(&pieces, &fragments)?;
        Ok(ReconstructedRead { blocks, fragments })
    }

    /// Every window of the probe with a length in `[min, max]`
    pub fn possible_fragments<'a>(&self, probe: &'a Probe) -> impl Iterator<Item = &'a str> + 'a {
        let seq = probe.sequence.as_str();
        (self.min_length..=self.max_length).flat_map(move |length| SeqWindowSlider::new(seq, length))
    }

    pub fn possible_fragment_count(&self, probe: &Probe) -> usize {
        let seq = probe.sequence.as_str();
        (self.min_length..=self.max_length)
            .map(|length| SeqWindowSlider::new(seq, length).window_count())
            .sum()
    }
}

fn merge_pieces(pieces: &[Piece], fragments: &[Fragment]) -> Result<Vec<Block>, SimulationError> {
    let mut blocks = Vec::new();
    let mut offset = 0;
    let mut index = 0;
    while index < pieces.len() {
        let block_start = offset;
        match pieces[index] {
            Piece::Gap => {
                while index < pieces.len() && matches!(pieces[index], Piece::Gap) {
                    offset += 1;
                    index += 1;
                }
                blocks.push(Block {
                    range: Interval::new(block_start, offset - 1)?,
                    kind: BlockKind::Gap,
                });
            }
            Piece::Fragment(_) => {
                let mut sequence = String::new();
                while index < pieces.len() {
                    if let Piece::Fragment(f) = pieces[index] {
                        sequence.push_str(&fragments[f].sequence);
                        index += 1;
                    } else {
                        break;
                    }
                }
                offset += sequence.len();
                blocks.push(Block {
                    range: Interval::new(block_start, offset - 1)?,
                    kind: BlockKind::Probe {
                        complement: complement(&sequence),
                        sequence,
                    },
                });
            }
        }
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeBuilder;
    use crate::sequence::SequenceGenerator;
    use crate::structure::StructureAnnotator;
    use crate::target::Target;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn probe(rng: &mut Xoshiro256PlusPlus) -> Probe {
        let target = Target::generate(
            &SequenceGenerator::default(),
            &StructureAnnotator::default(),
            1100,
            0.32,
            2,
            rng,
        )
        .unwrap();
        ProbeBuilder::new(3000, 0.5).build_probe(&target, 1100, rng).unwrap()
    }

    #[test]
    fn test_read_length_matches_target() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(31);
        let probe = probe(&mut rng);
        let engine = FragmentationEngine::new(100, 1100).unwrap();
        for _ in 0..200 {
            let read = engine.fragment(&probe, 1100, &mut rng).unwrap();
            assert_eq!(read.len(), 1100);
            assert_eq!(read.to_sequence().len(), 1100);
            let fragment_total: usize = read.fragments.iter().map(|f| f.len()).sum();
            assert!(fragment_total <= 1100);
        }
    }

    #[test]
    fn test_blocks_alternate_and_are_contiguous() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(32);
        let probe = probe(&mut rng);
        let engine = FragmentationEngine::new(100, 600).unwrap();
        for _ in 0..100 {
            let read = engine.fragment(&probe, 1100, &mut rng).unwrap();
            let mut expected_start = 0;
            for pair in read.blocks.windows(2) {
                assert_ne!(pair[0].is_gap(), pair[1].is_gap());
            }
            for block in &read.blocks {
                assert_eq!(block.range.start, expected_start);
                expected_start = block.range.end + 1;
                match &block.kind {
                    BlockKind::Probe { sequence, complement: c } => {
                        assert_eq!(sequence.len(), block.len());
                        assert_eq!(*c, complement(sequence));
                        assert_eq!(block.complement(), Some(c.as_str()));
                    }
                    BlockKind::Gap => assert!(block.complement().is_none()),
                }
            }
        }
    }

    #[test]
    fn test_fragments_are_probe_slices() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(33);
        let probe = probe(&mut rng);
        let engine = FragmentationEngine::new(200, 600).unwrap();
        for _ in 0..50 {
            let fragment = engine.sample_fragment(&probe, &mut rng).unwrap();
            assert!(fragment.len() >= 200 && fragment.len() <= 600);
            assert_eq!(fragment.end - fragment.start + 1, fragment.len());
            assert_eq!(fragment.sequence, &probe.sequence.as_str()[fragment.start..=fragment.end]);
            let info = fragment.info(&probe).unwrap();
            assert_eq!(info.len(), fragment.len());
        }
    }

    #[test]
    fn test_invalid_lengths() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(34);
        let probe = probe(&mut rng);
        assert!(FragmentationEngine::new(0, 10).is_err());
        assert!(FragmentationEngine::new(20, 10).is_err());
        let too_long = FragmentationEngine::new(100, probe.len() + 1).unwrap();
        assert!(too_long.fragment(&probe, 1100, &mut rng).is_err());
        let engine = FragmentationEngine::new(100, 200).unwrap();
        assert!(engine.fragment(&probe, 0, &mut rng).is_err());
    }

    #[test]
    fn test_possible_fragments() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(35);
        let probe = probe(&mut rng);
        let engine = FragmentationEngine::new(4000, 4002).unwrap();
        // probe is 4100 long: 101 + 100 + 99 windows
        assert_eq!(engine.possible_fragment_count(&probe), 300);
        let windows: Vec<&str> = engine.possible_fragments(&probe).collect();
        assert_eq!(windows.len(), 300);
        assert_eq!(windows[0], &probe.sequence.as_str()[..4000]);
        assert_eq!(windows[299].len(), 4002);
    }
}
