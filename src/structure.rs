use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::error::SimulationError;
use crate::interval::Interval;

/// How often the annotator redraws cut points before giving up
pub const MAX_ANNOTATION_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Exon,
    Intron,
    Vector,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exon => "exon",
            Self::Intron => "intron",
            Self::Vector => "vector",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named stretch of a sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: String,
    pub kind: RegionKind,
    pub range: Interval,
}

impl Region {
    pub fn new(name: String, kind: RegionKind, range: Interval) -> Self {
        Self { name, kind, range }
    }

    /// `exon1`, `intron1`, ... numbering starts at 1
    pub fn numbered(kind: RegionKind, number: usize, range: Interval) -> Self {
        Self::new(format!("{}{}", kind.as_str(), number), kind, range)
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Ordered region map of one sequence
///
/// Regions are sorted by position, contiguous, non-overlapping and cover
/// `[0, sequence_length - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Structure {
    regions: Vec<Region>,
}

impl Structure {
    pub fn new(regions: Vec<Region>) -> Result<Self, SimulationError> {
        let mut expected_start = 0;
        if regions.is_empty() {
            return Err(SimulationError::invalid(
                "structure",
                "a structure needs at least one region",
            ));
        }
        for region in &regions {
            if region.range.start != expected_start {
                return Err(SimulationError::invalid(
                    "structure",
                    format!(
                        "region {} starts at {} instead of {}",
                        region.name, region.range.start, expected_start
                    ),
                ));
            }
            expected_start = region.range.end + 1;
        }
        Ok(Self { regions })
    }

    /// A single exon spanning the whole sequence
    pub fn intronless(sequence_length: usize) -> Result<Self, SimulationError> {
        if sequence_length == 0 {
            return Err(SimulationError::invalid("length", "sequence is empty"));
        }
        let range = Interval::new(0, sequence_length - 1)?;
        Self::new(vec![Region::numbered(RegionKind::Exon, 1, range)])
    }

    /// Build exon/intron regions from sorted raw cut points
    ///
    /// Cut points pair up into intron boundaries. An intron between cuts `a`
    /// and `b` covers `[a+1, b-1]`; the exons keep the raw cut coordinates.
    ///
    ///   cuts      c1      c2  c3      c4
    ///   exon1 [0..c1] intron1 [c1+1..c2-1] exon2 [c2..c3] ... exonK [c4..len-1]
    ///
    pub fn from_cut_points(sequence_length: usize, cuts: &[usize]) -> Result<Self, SimulationError> {
        if cuts.is_empty() {
            return Self::intronless(sequence_length);
        }
        if cuts.len() % 2 != 0 {
            return Err(SimulationError::invalid(
                "cut_points",
                format!("expected an even number of cut points, got {}", cuts.len()),
            ));
        }
        if cuts.windows(2).any(|w| w[1] < w[0]) || cuts[0] == 0 || cuts[cuts.len() - 1] >= sequence_length {
            return Err(SimulationError::invalid(
                "cut_points",
                "cut points must be sorted and inside [1, length-1]",
            ));
        }

        let mut regions = Vec::with_capacity(cuts.len() + 1);
        let mut exon_start = 0;
        for (i, pair) in cuts.chunks(2).enumerate() {
            let (left, right) = (pair[0], pair[1]);
            if right < left + 2 {
                // the intron would be empty or overlap its flanking exons
                return Err(SimulationError::invalid(
                    "cut_points",
                    format!("degenerate intron between cut points {} and {}", left, right),
                ));
            }
            regions.push(Region::numbered(RegionKind::Exon, i + 1, Interval::new(exon_start, left)?));
            regions.push(Region::numbered(RegionKind::Intron, i + 1, Interval::new(left + 1, right - 1)?));
            exon_start = right;
        }
        regions.push(Region::numbered(
            RegionKind::Exon,
            cuts.len() / 2 + 1,
            Interval::new(exon_start, sequence_length - 1)?,
        ));
        Self::new(regions)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.regions.last().map(|r| r.range.end + 1).unwrap_or(0)
    }

    /// First region (in structural order) that contains `position`
    pub fn find_region(&self, position: usize) -> Option<(usize, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .find(|(_, region)| region.range.contains(position))
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn count(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind == kind).count()
    }

    pub fn exon_count(&self) -> usize {
        self.count(RegionKind::Exon)
    }

    pub fn intron_count(&self) -> usize {
        self.count(RegionKind::Intron)
    }

    pub fn get_introns(&self) -> Vec<&Region> {
        self.regions
            .iter()
            .filter(|r| r.kind == RegionKind::Intron)
            .collect()
    }

    /// Append a region directly after the current last one
    pub fn with_region(&self, name: String, kind: RegionKind, length: usize) -> Result<Self, SimulationError> {
        if length == 0 {
            return Err(SimulationError::invalid("length", "cannot append an empty region"));
        }
        let start = self.sequence_length();
        let mut regions = self.regions.clone();
        regions.push(Region::new(name, kind, Interval::new(start, start + length - 1)?));
        Self::new(regions)
    }
}

/// Splits sequences into alternating exons and introns
#[derive(Debug, Clone, Copy)]
pub struct StructureAnnotator {
    max_attempts: usize,
}

impl Default for StructureAnnotator {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ANNOTATION_ATTEMPTS,
        }
    }
}

impl StructureAnnotator {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Draw `2 * intron_count` cut points uniformly from `[1, length-1]`
    /// and turn them into an exon/intron structure. Draws that would produce
    /// an empty intron are discarded and redrawn.
    pub fn annotate<R: Rng + ?Sized>(
        &self,
        sequence_length: usize,
        intron_count: usize,
        rng: &mut R,
    ) -> Result<Structure, SimulationError> {
        if intron_count == 0 {
            return Structure::intronless(sequence_length);
        }
        // the tightest packing is exon1=[0,1], intron=[2,2], exon=[3,3], ...
        let min_length = 2 * intron_count + 2;
        if sequence_length < min_length {
            return Err(SimulationError::invalid(
                "intron_count",
                format!(
                    "{} introns need a sequence of at least {} bases, got {}",
                    intron_count, min_length, sequence_length
                ),
            ));
        }
        for _ in 0..self.max_attempts {
            let mut cuts: Vec<usize> = (0..2 * intron_count)
                .map(|_| rng.random_range(1..sequence_length))
                .collect();
            cuts.sort_unstable();
            if let Ok(structure) = Structure::from_cut_points(sequence_length, &cuts) {
                return Ok(structure);
            }
        }
        Err(SimulationError::ConstraintUnsatisfiable {
            goal: "place non-degenerate introns",
            attempts: self.max_attempts,
        })
    }
}
