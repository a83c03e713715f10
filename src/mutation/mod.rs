//! Nucleotide mutations and the set arithmetic used during placement.
//!
//! Positions are stored 0-based. The external notation (`C75T`) is 1-based,
//! as written on Auspice branch attributes.

use crate::error::TreeError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Allele used for deleted positions.
pub const GAP: char = '-';

/// A single nucleotide change. Field order gives the ordering
/// `(position, reference, query)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mutation {
    pub position: usize,
    pub reference: char,
    pub query: char,
}

pub type MutationSet = BTreeSet<Mutation>;

impl Mutation {
    pub fn from_zero_based(position: usize, reference: char, query: char) -> Self {
        Self {
            position,
            reference: reference.to_ascii_uppercase(),
            query: query.to_ascii_uppercase(),
        }
    }

    /// The same change seen from the other end of the branch.
    pub fn revert(&self) -> Self {
        Self {
            position: self.position,
            reference: self.query,
            query: self.reference,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.query == GAP
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.reference, self.position + 1, self.query)
    }
}

impl FromStr for Mutation {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TreeError::malformed(format!("invalid nucleotide mutation '{}'", s));

        let mut chars = s.trim().chars();
        let reference = chars.next().ok_or_else(invalid)?;
        let query = chars.next_back().ok_or_else(invalid)?;
        let digits = chars.as_str();
        if reference.is_ascii_digit() || query.is_ascii_digit() || digits.is_empty() {
            return Err(invalid());
        }

        let position: usize = digits.parse().map_err(|_| invalid())?;
        if position == 0 {
            return Err(invalid());
        }

        Ok(Mutation::from_zero_based(position - 1, reference, query))
    }
}

/// Mutations present in both collections, compared by value.
pub fn shared(a: &MutationSet, b: &MutationSet) -> MutationSet {
    a.intersection(b).copied().collect()
}

/// `a` minus every mutation that also appears in `b`.
pub fn remove(a: &MutationSet, b: &MutationSet) -> MutationSet {
    a.difference(b).copied().collect()
}

pub fn revert_all(mutations: &MutationSet) -> MutationSet {
    mutations.iter().map(Mutation::revert).collect()
}

/// Positions that occur more than once in a set (e.g. `A5G` next to `A5T`).
pub fn duplicate_positions(mutations: &MutationSet) -> Vec<usize> {
    let mut duplicates: Vec<usize> = mutations
        .iter()
        .zip(mutations.iter().skip(1))
        .filter(|(a, b)| a.position == b.position)
        .map(|(a, _)| a.position)
        .collect();
    duplicates.dedup();
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> MutationSet {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn parses_one_based_notation() {
        let m: Mutation = "C75T".parse().unwrap();
        assert_eq!(m.position, 74);
        assert_eq!(m.reference, 'C');
        assert_eq!(m.query, 'T');
        assert_eq!(m.to_string(), "C75T");
    }

    #[test]
    fn parses_deletions() {
        let m: Mutation = "A1-".parse().unwrap();
        assert!(m.is_deletion());
        assert_eq!(m.position, 0);
        assert_eq!(m.revert().to_string(), "-1A");
    }

    #[test]
    fn rejects_malformed_notation() {
        for bad in ["", "C", "CT", "C0T", "75T", "CxyT", "C75"] {
            assert!(bad.parse::<Mutation>().is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn ordering_is_by_position_first() {
        let ordered: Vec<String> = set(&["T9A", "A10G", "A9C"])
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ordered, vec!["A9C", "T9A", "A10G"]);
    }

    #[test]
    fn shared_and_remove() {
        let a = set(&["C75T", "G100A", "A3-"]);
        let b = set(&["G100A", "T20C"]);
        assert_eq!(shared(&a, &b), set(&["G100A"]));
        assert_eq!(remove(&a, &b), set(&["C75T", "A3-"]));
    }

    #[test]
    fn reverted_mutations_do_not_match_forward_ones() {
        let a = set(&["C75T"]);
        assert!(shared(&a, &revert_all(&a)).is_empty());
    }

    #[test]
    fn reports_duplicate_positions() {
        assert_eq!(duplicate_positions(&set(&["A5G", "A5T", "C7G"])), vec![4]);
        assert!(duplicate_positions(&set(&["A5G", "C7G"])).is_empty());
    }
}
