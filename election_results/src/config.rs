// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The two ballot components of a German federal election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum VoteType {
    /// Erststimme: the vote for a direct candidate of the constituency.
    First,
    /// Zweitstimme: the vote for a party list.
    Second,
}

impl VoteType {
    pub const ALL: [VoteType; 2] = [VoteType::First, VoteType::Second];

    /// Lenient parsing of the labels found in result files and query strings.
    pub fn parse(s: &str) -> Option<VoteType> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first_votes" | "1" | "erststimme" => Some(VoteType::First),
            "second" | "second_votes" | "2" | "zweitstimme" => Some(VoteType::Second),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::First => "first",
            VoteType::Second => "second",
        }
    }

    /// Capitalized name, as used in chart titles.
    pub fn title(&self) -> &'static str {
        match self {
            VoteType::First => "First",
            VoteType::Second => "Second",
        }
    }
}

impl Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the results table.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ElectionResult {
    pub state: String,
    pub party: String,
    pub vote_type: VoteType,
    pub votes: u64,
}

/// The state dimension of a selection.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum StateFilter {
    /// National totals: all the states are summed.
    All,
    State(String),
}

impl StateFilter {
    pub const ALL_LABEL: &'static str = "ALL";

    pub fn parse(s: &str) -> StateFilter {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(StateFilter::ALL_LABEL) {
            StateFilter::All
        } else {
            StateFilter::State(s.to_string())
        }
    }
}

impl Display for StateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateFilter::All => write!(f, "{}", StateFilter::ALL_LABEL),
            StateFilter::State(s) => write!(f, "{}", s),
        }
    }
}

/// What the user asked to see.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Selection {
    pub state: StateFilter,
    pub vote_type: VoteType,
}

impl Selection {
    pub fn national(vote_type: VoteType) -> Selection {
        Selection {
            state: StateFilter::All,
            vote_type,
        }
    }

    pub fn state(name: &str, vote_type: VoteType) -> Selection {
        Selection {
            state: StateFilter::State(name.to_string()),
            vote_type,
        }
    }
}

// ******** Output data structures *********

/// A party with its number of votes and its percentage of the total.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyShare {
    pub party: String,
    pub votes: u64,
    pub share: f64,
}

/// The headline numbers of the overview page.
#[derive(PartialEq, Debug, Clone)]
pub struct NationalSummary {
    pub first_winner: Option<PartyShare>,
    pub second_winner: Option<PartyShare>,
    pub states_covered: usize,
}

impl NationalSummary {
    pub fn winner(&self, vote_type: VoteType) -> Option<&PartyShare> {
        match vote_type {
            VoteType::First => self.first_winner.as_ref(),
            VoteType::Second => self.second_winner.as_ref(),
        }
    }
}

/// Errors raised while assembling a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DatasetErrors {
    EmptyStateName,
    EmptyPartyName,
    NegativeVoteCount(i64),
    /// The total of one vote type no longer fits in a `u64`.
    VoteCountOverflow(VoteType),
    DuplicateResult {
        state: String,
        party: String,
        vote_type: VoteType,
    },
}

impl Error for DatasetErrors {}

impl Display for DatasetErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetErrors::EmptyStateName => write!(f, "empty state name"),
            DatasetErrors::EmptyPartyName => write!(f, "empty party name"),
            DatasetErrors::NegativeVoteCount(c) => {
                write!(f, "vote counts must be non-negative, got {}", c)
            }
            DatasetErrors::VoteCountOverflow(vt) => {
                write!(f, "the total of the {} votes is too large", vt)
            }
            DatasetErrors::DuplicateResult {
                state,
                party,
                vote_type,
            } => write!(
                f,
                "duplicate {} vote result for {:?} in {:?}",
                vote_type, party, state
            ),
        }
    }
}
