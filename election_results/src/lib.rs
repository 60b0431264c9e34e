/*!
Per-state election results and their aggregation.

A [`Dataset`] holds the number of votes of every party in every federal state,
for the first and the second vote. It is assembled once with a
[`builder::Builder`] and then only read. The [`aggregate`] function turns a
[`Selection`] (a state or the whole country, and a vote type) into an
[`AggregatedView`], from which shares and top-N summaries are derived.

See the [`manual`] module for the accepted input files.
*/
mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeSet, HashMap};

pub use crate::config::*;

/// The label used for the parties merged by [`top_n_with_others`].
pub const OTHERS: &str = "Others";

/// Remainders at or below this share (in percentage points) are not shown as
/// a separate `Others` entry.
pub const OTHERS_MIN_SHARE: f64 = 0.05;

/// A read-only table of election results.
///
/// Rows keep the order in which they were added. The set of states is
/// computed once at construction.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<ElectionResult>,
    states: Vec<String>,
}

impl Dataset {
    pub(crate) fn from_rows(rows: Vec<ElectionResult>) -> Dataset {
        let states: BTreeSet<String> = rows.iter().map(|r| r.state.clone()).collect();
        Dataset {
            rows,
            states: states.into_iter().collect(),
        }
    }

    pub fn rows(&self) -> &[ElectionResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The states, in sorted order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.states.binary_search_by(|s| s.as_str().cmp(state)).is_ok()
    }

    /// The parties, in sorted order.
    pub fn parties(&self) -> Vec<String> {
        let parties: BTreeSet<&String> = self.rows.iter().map(|r| &r.party).collect();
        parties.into_iter().cloned().collect()
    }
}

/// The votes per party for one selection.
///
/// Entries are sorted by decreasing number of votes. Parties with the same
/// number of votes are sorted by name so that the order is fully
/// deterministic.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregatedView {
    tally: Vec<(String, u64)>,
}

impl AggregatedView {
    fn from_counts(counts: HashMap<String, u64>) -> AggregatedView {
        let mut tally: Vec<(String, u64)> = counts.into_iter().collect();
        tally.sort_by(|(n1, c1), (n2, c2)| c2.cmp(c1).then_with(|| n1.cmp(n2)));
        AggregatedView { tally }
    }

    pub fn tally(&self) -> &[(String, u64)] {
        &self.tally
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tally.len()
    }

    pub fn get(&self, party: &str) -> Option<u64> {
        self.tally
            .iter()
            .find(|(name, _)| name == party)
            .map(|(_, c)| *c)
    }

    pub fn total(&self) -> u64 {
        self.tally.iter().map(|(_, c)| *c).sum()
    }

    /// The percentage of the total for each party, in the order of the tally.
    ///
    /// When nobody got any vote, all the shares are zero.
    pub fn shares(&self) -> Vec<PartyShare> {
        let total = self.total();
        self.tally
            .iter()
            .map(|(party, votes)| PartyShare {
                party: party.clone(),
                votes: *votes,
                share: percentage(*votes, total),
            })
            .collect()
    }

    /// The party with the most votes, if any vote was cast.
    pub fn winner(&self) -> Option<PartyShare> {
        let total = self.total();
        self.tally
            .first()
            .filter(|(_, votes)| *votes > 0)
            .map(|(party, votes)| PartyShare {
                party: party.clone(),
                votes: *votes,
                share: percentage(*votes, total),
            })
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 / total as f64 * 100.0
    }
}

/// Computes the votes per party for the given selection.
///
/// For [`StateFilter::All`], the votes of each party are summed over all the
/// states. For a single state, the rows of that state are used as they are.
/// A state that is not in the dataset yields an empty view.
pub fn aggregate(dataset: &Dataset, selection: &Selection) -> AggregatedView {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for r in dataset.rows().iter() {
        if r.vote_type != selection.vote_type {
            continue;
        }
        let selected = match &selection.state {
            StateFilter::All => true,
            StateFilter::State(s) => *s == r.state,
        };
        if selected {
            *counts.entry(r.party.clone()).or_insert(0) += r.votes;
        }
    }
    debug!(
        "aggregate: selection {:?}: {} parties",
        selection,
        counts.len()
    );
    AggregatedView::from_counts(counts)
}

/// Keeps the `n` largest parties and merges the rest into an [`OTHERS`] entry.
///
/// The `Others` entry is only added when its share is larger than
/// [`OTHERS_MIN_SHARE`].
pub fn top_n_with_others(view: &AggregatedView, n: usize) -> Vec<PartyShare> {
    let mut top: Vec<PartyShare> = view.shares();
    top.truncate(n);
    let top_share: f64 = top.iter().map(|ps| ps.share).sum();
    let top_votes: u64 = top.iter().map(|ps| ps.votes).sum();
    let others_share = (100.0 - top_share).max(0.0);
    if view.total() > 0 && others_share > OTHERS_MIN_SHARE {
        top.push(PartyShare {
            party: OTHERS.to_string(),
            votes: view.total() - top_votes,
            share: others_share,
        });
    }
    top
}

/// The national winners, computed from the summed counts of all the states.
pub fn national_summary(dataset: &Dataset) -> NationalSummary {
    let first = aggregate(dataset, &Selection::national(VoteType::First));
    let second = aggregate(dataset, &Selection::national(VoteType::Second));
    let res = NationalSummary {
        first_winner: first.winner(),
        second_winner: second.winner(),
        states_covered: dataset.states().len(),
    };
    info!(
        "national_summary: {} states, first vote winner: {:?}, second vote winner: {:?}",
        res.states_covered,
        res.first_winner.as_ref().map(|w| &w.party),
        res.second_winner.as_ref().map(|w| &w.party)
    );
    res
}
