//! Message sequence sets (`1:3,5,7:*`).

use std::fmt;
use std::ops::{RangeFrom, RangeInclusive};

/// One end of a range: a number or `*`, the highest message in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqNumber {
    /// Sequence number or UID.
    Number(u32),
    /// `*`.
    Last,
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Last => f.write_str("*"),
        }
    }
}

/// Comma separated list of single numbers and ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSet {
    parts: Vec<(SeqNumber, Option<SeqNumber>)>,
}

impl SequenceSet {
    /// `1:*`, every message in the mailbox.
    #[must_use]
    pub fn all() -> Self {
        Self::from(1..)
    }

    /// `*` alone, the last message.
    #[must_use]
    pub fn last() -> Self {
        Self {
            parts: vec![(SeqNumber::Last, None)],
        }
    }

    /// Builds a set from numbers, merging runs of consecutive ones.
    ///
    /// Handy for feeding SEARCH results back into FETCH. Returns `None`
    /// for an empty list, which has no valid wire form.
    #[must_use]
    pub fn from_numbers(numbers: &[u32]) -> Option<Self> {
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut parts = Vec::new();
        let mut iter = sorted.into_iter();
        let mut start = iter.next()?;
        let mut end = start;
        for n in iter {
            if end.checked_add(1) == Some(n) {
                end = n;
                continue;
            }
            parts.push(span(start, end));
            start = n;
            end = n;
        }
        parts.push(span(start, end));
        Some(Self { parts })
    }

    /// Number of comma separated parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Never true for sets built through the public constructors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn span(start: u32, end: u32) -> (SeqNumber, Option<SeqNumber>) {
    let tail = (start != end).then_some(SeqNumber::Number(end));
    (SeqNumber::Number(start), tail)
}

impl From<u32> for SequenceSet {
    fn from(n: u32) -> Self {
        Self {
            parts: vec![(SeqNumber::Number(n), None)],
        }
    }
}

impl From<RangeInclusive<u32>> for SequenceSet {
    fn from(range: RangeInclusive<u32>) -> Self {
        Self {
            parts: vec![span(*range.start(), *range.end())],
        }
    }
}

impl From<RangeFrom<u32>> for SequenceSet {
    fn from(range: RangeFrom<u32>) -> Self {
        Self {
            parts: vec![(SeqNumber::Number(range.start), Some(SeqNumber::Last))],
        }
    }
}

impl FromIterator<Self> for SequenceSet {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().flat_map(|set| set.parts).collect(),
        }
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (start, end)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{start}")?;
            if let Some(end) = end {
                write!(f, ":{end}")?;
            }
        }
        Ok(())
    }
}
