use std::collections::{HashMap, HashSet};

use log::debug;

pub use crate::config::*;
use crate::Dataset;

/// A builder for assembling a dataset row by row.
///
/// The builder is the only way to create a dataset from raw counts: it
/// rejects negative counts, blank names and duplicated results.
/// It also keeps the total of each vote type within a `u64`, so that any sum
/// over a dataset can be computed without overflow.
///
/// ```
/// use election_results::builder::Builder;
/// use election_results::{aggregate, Selection, VoteType};
/// # use election_results::DatasetErrors;
///
/// let mut builder = Builder::new();
/// builder.add_result("Bayern", "CSU", VoteType::Second, 2_963_189)?;
/// builder.add_result("Berlin", "CDU", VoteType::Second, 377_451)?;
/// let dataset = builder.build();
///
/// let view = aggregate(&dataset, &Selection::national(VoteType::Second));
/// assert_eq!(view.total(), 3_340_640);
/// # Ok::<(), DatasetErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    rows: Vec<ElectionResult>,
    seen: HashSet<(String, String, VoteType)>,
    totals: HashMap<VoteType, u64>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds the count of one party in one state for one vote type.
    ///
    /// Names are trimmed. The count is signed so that readers can hand over
    /// what they parsed and let the builder reject negative values.
    pub fn add_result(
        &mut self,
        state: &str,
        party: &str,
        vote_type: VoteType,
        votes: i64,
    ) -> Result<(), DatasetErrors> {
        let state = state.trim();
        let party = party.trim();
        if state.is_empty() {
            return Err(DatasetErrors::EmptyStateName);
        }
        if party.is_empty() {
            return Err(DatasetErrors::EmptyPartyName);
        }
        if votes < 0 {
            return Err(DatasetErrors::NegativeVoteCount(votes));
        }
        let key = (state.to_string(), party.to_string(), vote_type);
        if self.seen.contains(&key) {
            return Err(DatasetErrors::DuplicateResult {
                state: key.0,
                party: key.1,
                vote_type,
            });
        }
        let votes = votes as u64;
        let total = self.totals.get(&vote_type).copied().unwrap_or(0);
        let total = total
            .checked_add(votes)
            .ok_or(DatasetErrors::VoteCountOverflow(vote_type))?;
        self.totals.insert(vote_type, total);
        self.seen.insert(key);
        self.rows.push(ElectionResult {
            state: state.to_string(),
            party: party.to_string(),
            vote_type,
            votes,
        });
        Ok(())
    }

    /// Adds both vote types at once, as found in a wide results table.
    pub fn add_results_wide(
        &mut self,
        state: &str,
        party: &str,
        first_votes: i64,
        second_votes: i64,
    ) -> Result<(), DatasetErrors> {
        self.add_result(state, party, VoteType::First, first_votes)?;
        self.add_result(state, party, VoteType::Second, second_votes)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(self) -> Dataset {
        debug!("build: {} rows", self.rows.len());
        Dataset::from_rows(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_counts() {
        let mut b = Builder::new();
        assert_eq!(
            b.add_result("Berlin", "SPD", VoteType::First, -1),
            Err(DatasetErrors::NegativeVoteCount(-1))
        );
        assert!(b.is_empty());
    }

    #[test]
    fn rejects_blank_names() {
        let mut b = Builder::new();
        assert_eq!(
            b.add_result("  ", "SPD", VoteType::First, 1),
            Err(DatasetErrors::EmptyStateName)
        );
        assert_eq!(
            b.add_result("Berlin", "", VoteType::First, 1),
            Err(DatasetErrors::EmptyPartyName)
        );
    }

    #[test]
    fn rejects_duplicates_after_trimming() {
        let mut b = Builder::new();
        b.add_result("Berlin", "SPD", VoteType::First, 10).unwrap();
        b.add_result("Berlin", "SPD", VoteType::Second, 10).unwrap();
        let err = b
            .add_result(" Berlin ", "SPD ", VoteType::First, 3)
            .unwrap_err();
        assert!(matches!(err, DatasetErrors::DuplicateResult { .. }));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn rejects_totals_beyond_u64() {
        let mut b = Builder::new();
        let big = 9_000_000_000_000_000_000;
        b.add_result("Bayern", "SPD", VoteType::First, big).unwrap();
        b.add_result("Berlin", "SPD", VoteType::First, big).unwrap();
        assert_eq!(
            b.add_result("Hamburg", "SPD", VoteType::First, big),
            Err(DatasetErrors::VoteCountOverflow(VoteType::First))
        );
        // The other vote type has its own total.
        b.add_result("Hamburg", "SPD", VoteType::Second, big).unwrap();
        assert_eq!(b.len(), 3);
        let ds = b.build();
        let view = crate::aggregate(&ds, &Selection::national(VoteType::First));
        assert_eq!(view.total(), 18_000_000_000_000_000_000);
    }

    #[test]
    fn wide_rows_produce_both_vote_types() {
        let mut b = Builder::new();
        b.add_results_wide("Hamburg", "Volt Deutschland", 0, 12_000)
            .unwrap();
        let ds = b.build();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0].vote_type, VoteType::First);
        assert_eq!(ds.rows()[1].votes, 12_000);
    }
}
