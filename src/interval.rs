use std::cmp::{max, min};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, SimulationError};

/// A range of sequence coordinates
///
/// By convention, start and end are zero-based and both inclusive,
/// so an interval always covers at least one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize, // inclusive
    pub end: usize,   // inclusive
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Result<Interval, SimulationError> {
        if end < start {
            Err(SimulationError::invalid(
                "interval",
                format!("start {} must not exceed end {}", start, end),
            ))
        } else {
            Ok(Interval { start, end })
        }
    }

    /// Parse a `MIN-MAX` pair, e.g. `100-1100`
    pub fn parse(range: &str) -> Result<Interval, ParseError> {
        let parts: Vec<&str> = range.split('-').collect();
        if parts.len() != 2 {
            return Err(ParseError::somewhere("min-max", range.to_string()));
        }
        // we now know for sure that parts is of length 2

        let start = parts[0]
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::somewhere("usize", parts[0].to_string()))?;
        let end = parts[1]
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::somewhere("usize", parts[1].to_string()))?;
        Interval::new(start, end).map_err(|_| ParseError::somewhere("min<=max", range.to_string()))
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        let start = max(self.start, other.start);
        let end = min(self.end, other.end);
        Interval::new(start, end).ok() // this will be None, if there is no intersection
    }

    /// Move the interval `offset` positions to the left
    pub fn shift_left(&self, offset: usize) -> Interval {
        Interval {
            start: self.start - offset,
            end: self.end - offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Interval::parse("100-1100").unwrap(), Interval::new(100, 1100).unwrap());
        assert_eq!(Interval::parse("7-7").unwrap().len(), 1);
        assert!(Interval::parse("10").is_err());
        assert!(Interval::parse("20-10").is_err());
        assert!(Interval::parse("a-10").is_err());
    }

    #[test]
    fn test_intersection() {
        let a = Interval::new(0, 9).unwrap();
        let b = Interval::new(5, 20).unwrap();
        assert_eq!(a.intersection(&b), Some(Interval::new(5, 9).unwrap()));
        let c = Interval::new(10, 20).unwrap();
        assert_eq!(a.intersection(&c), None);
        assert_eq!(a.intersection(&Interval::new(9, 9).unwrap()).unwrap().len(), 1);
    }
}
