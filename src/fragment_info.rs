use serde::Serialize;

use crate::error::SimulationError;
use crate::interval::Interval;
use crate::structure::{Region, RegionKind, Structure};

/// Regions touched by a fragment `[start, end]` of an annotated sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentInfo {
    pub start: usize,
    pub end: usize,
    /// touched regions in the coordinates of the parent sequence
    pub native: Vec<Region>,
    /// the same regions clipped to the fragment, with position 0 at `start`
    pub local: Structure,
    pub exon_count: usize,
    pub intron_count: usize,
}

impl FragmentInfo {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `(insert_fraction, vector_fraction)` of the fragment
    ///
    /// Fragments without a vector part are pure insert.
    pub fn proportions(&self) -> (f64, f64) {
        let total = self.len() as f64;
        let vector_len: usize = self
            .local
            .regions()
            .iter()
            .filter(|r| r.kind == RegionKind::Vector)
            .map(|r| r.len())
            .sum();
        if vector_len == 0 {
            return (1.0, 0.0);
        }
        let insert_len = self.len() - vector_len;
        (insert_len as f64 / total, vector_len as f64 / total)
    }

    pub fn spans_intron(&self) -> bool {
        self.intron_count > 0
    }
}

/// Find the regions that `[start, end]` (inclusive) overlaps
///
/// This is a pure function of its inputs.
pub fn resolve(structure: &Structure, start: usize, end: usize) -> Result<FragmentInfo, SimulationError> {
    if start > end {
        return Err(SimulationError::invalid(
            "fragment",
            format!("start {} is greater than end {}", start, end),
        ));
    }
    let length = structure.sequence_length();
    let out_of_range = |position| SimulationError::PositionOutOfRange { position, length };
    let (first, _) = structure.find_region(start).ok_or_else(|| out_of_range(start))?;
    let (last, _) = structure.find_region(end).ok_or_else(|| out_of_range(end))?;

    let native: Vec<Region> = structure.regions()[first..=last].to_vec();
    let fragment = Interval::new(start, end)?;
    let mut local_regions = Vec::with_capacity(native.len());
    for region in &native {
        // every touched region overlaps the fragment, so the intersection exists
        let clipped = region
            .range
            .intersection(&fragment)
            .ok_or_else(|| out_of_range(region.range.start))?;
        local_regions.push(Region::new(
            region.name.clone(),
            region.kind,
            clipped.shift_left(start),
        ));
    }
    let exon_count = native.iter().filter(|r| r.kind == RegionKind::Exon).count();
    let intron_count = native.iter().filter(|r| r.kind == RegionKind::Intron).count();
    Ok(FragmentInfo {
        start,
        end,
        native,
        local: Structure::new(local_regions)?,
        exon_count,
        intron_count,
    })
}
