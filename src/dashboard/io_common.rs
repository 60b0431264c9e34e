// Primitives shared by the CSV and Excel readers.

use std::collections::HashMap;
use std::path::Path;

use election_results::builder::Builder;
use election_results::VoteType;
use log::debug;
use snafu::prelude::*;

use crate::dashboard::*;

/// The column positions of a results table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Layout {
    /// state, party, vote_type, votes
    Long {
        state: usize,
        party: usize,
        vote_type: usize,
        votes: usize,
    },
    /// state, party, first_votes, second_votes (other columns ignored)
    Wide {
        state: usize,
        party: usize,
        first_votes: usize,
        second_votes: usize,
    },
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Finds the layout from the names of the header row.
pub fn detect_layout(path: &str, header: &[String]) -> LoadResult<Layout> {
    let col_names: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header(name), idx))
        .collect();
    let col = |name: &str| col_names.get(name).cloned();

    let layout = match (
        col("state"),
        col("party"),
        col("vote_type"),
        col("votes"),
        col("first_votes"),
        col("second_votes"),
    ) {
        (Some(state), Some(party), Some(vote_type), Some(votes), _, _) => Layout::Long {
            state,
            party,
            vote_type,
            votes,
        },
        (Some(state), Some(party), _, _, Some(first_votes), Some(second_votes)) => Layout::Wide {
            state,
            party,
            first_votes,
            second_votes,
        },
        _ => {
            return UnknownLayoutSnafu {
                path,
                header: header.to_vec(),
            }
            .fail()
        }
    };
    debug!("detect_layout: {}: {:?}", simplify_file_name(path), layout);
    Ok(layout)
}

/// Floats above this magnitude do not hold exact integers.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// The count held by a float, if it is an exact integer.
pub fn float_votes(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT {
        Some(f as i64)
    } else {
        None
    }
}

/// Reads a vote count. Empty cells count as zero. Integral floats such as
/// `1234.0` are accepted since spreadsheet exports often produce them.
pub fn parse_votes(path: &str, lineno: usize, content: &str) -> LoadResult<i64> {
    let s = content.trim();
    if s.is_empty() {
        return Ok(0);
    }
    if let Ok(x) = s.parse::<i64>() {
        return Ok(x);
    }
    match s.parse::<f64>().ok().and_then(float_votes) {
        Some(x) => Ok(x),
        None => ParsingVotesSnafu {
            path,
            lineno,
            content: s,
        }
        .fail(),
    }
}

fn field<'a>(fields: &[&'a str], idx: usize, path: &str, lineno: usize) -> LoadResult<&'a str> {
    fields
        .get(idx)
        .cloned()
        .context(LineTooShortSnafu { path, lineno })
}

/// Adds the results of one line of the table to the builder.
pub fn add_record(
    builder: &mut Builder,
    layout: &Layout,
    path: &str,
    lineno: usize,
    fields: &[&str],
) -> LoadResult<()> {
    debug!("add_record: {}:{} {:?}", simplify_file_name(path), lineno, fields);
    match *layout {
        Layout::Long {
            state,
            party,
            vote_type,
            votes,
        } => {
            let vt_s = field(fields, vote_type, path, lineno)?;
            let vt = VoteType::parse(vt_s).context(UnknownVoteTypeSnafu {
                path,
                lineno,
                content: vt_s,
            })?;
            let count = parse_votes(path, lineno, field(fields, votes, path, lineno)?)?;
            builder
                .add_result(
                    field(fields, state, path, lineno)?,
                    field(fields, party, path, lineno)?,
                    vt,
                    count,
                )
                .context(InvalidRowSnafu { path, lineno })
        }
        Layout::Wide {
            state,
            party,
            first_votes,
            second_votes,
        } => {
            let first = parse_votes(path, lineno, field(fields, first_votes, path, lineno)?)?;
            let second = parse_votes(path, lineno, field(fields, second_votes, path, lineno)?)?;
            builder
                .add_results_wide(
                    field(fields, state, path, lineno)?,
                    field(fields, party, path, lineno)?,
                    first,
                    second,
                )
                .context(InvalidRowSnafu { path, lineno })
        }
    }
}
