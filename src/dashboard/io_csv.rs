// Primitives for reading CSV files.

use std::fs::File;
use std::io::Read;

use election_results::builder::Builder;
use log::{debug, info};
use snafu::prelude::*;

use crate::dashboard::{
    io_common::{add_record, detect_layout, simplify_file_name},
    *,
};

pub fn read_csv_file(path: &str, builder: &mut Builder) -> LoadResult<usize> {
    let f = File::open(path).context(OpeningCsvSnafu { path })?;
    read_csv_results(f, path, builder)
}

/// Reads CSV content from any source. `path` is only used in messages.
pub fn read_csv_results<R: Read>(
    mut reader: R,
    path: &str,
    builder: &mut Builder,
) -> LoadResult<usize> {
    // Results tables are small. Keeping the bytes around gives exact line
    // numbers in the error messages.
    let mut content: Vec<u8> = Vec::new();
    reader
        .read_to_end(&mut content)
        .context(ReadingCsvSnafu { path })?;
    let rdr = reader_builder().from_reader(content.as_slice());
    read_records(rdr, &content, path, builder)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut rb = csv::ReaderBuilder::new();
    // The header is read by hand to detect the layout, and short lines are
    // reported with their line number.
    rb.has_headers(false).flexible(true).trim(csv::Trim::All);
    rb
}

/// The line on which a record starts.
///
/// The reader may report the position of the blank lines that precede the
/// record, they are skipped here.
fn record_line(content: &[u8], pos: &csv::Position) -> usize {
    let start = (pos.byte() as usize).min(content.len());
    let skipped = content[start..]
        .iter()
        .take_while(|b| **b == b'\n' || **b == b'\r')
        .filter(|b| **b == b'\n')
        .count();
    pos.line() as usize + skipped
}

fn read_records<R: Read>(
    rdr: csv::Reader<R>,
    content: &[u8],
    path: &str,
    builder: &mut Builder,
) -> LoadResult<usize> {
    let mut records = rdr.into_records();
    let header: Vec<String> = records
        .next()
        .context(MissingHeaderSnafu { path })?
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_results: header: {:?}", header);
    let layout = detect_layout(path, &header)?;

    let mut count = 0;
    for (idx, line_r) in records.enumerate() {
        let line = line_r.context(CsvLineParseSnafu {
            path,
            lineno: idx + 2,
        })?;
        let lineno = line
            .position()
            .map(|p| record_line(content, p))
            .unwrap_or(idx + 2);
        let fields: Vec<&str> = line.iter().collect();
        add_record(builder, &layout, path, lineno, &fields)?;
        count += 1;
    }
    info!(
        "read_csv_results: {}: {} lines",
        simplify_file_name(path),
        count
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use election_results::{aggregate, DatasetErrors, Selection, VoteType};

    const WIDE: &str = "state,party,first_votes,second_votes,first_share,second_share,date
Bayern,Christlich-Soziale Union in Bayern e.V.,3000,2900,45.0,44.1,2025-02-23
Bayern,Alternative für Deutschland,1400,1300,21.0,19.8,2025-02-23
Berlin,Die Linke,390,400,20.1,19.9,2025-02-23
Berlin,Volt Deutschland,,30,,1.5,2025-02-23
";

    const LONG: &str = "state,party,vote_type,votes
Bayern,Christlich-Soziale Union in Bayern e.V.,first,3000
Bayern,Christlich-Soziale Union in Bayern e.V.,second,2900
Bayern,Alternative für Deutschland,first,1400
Bayern,Alternative für Deutschland,second,1300
Berlin,Die Linke,first,390
Berlin,Die Linke,second,400
Berlin,Volt Deutschland,first,0
Berlin,Volt Deutschland,second,30
";

    fn load(content: &str) -> LoadResult<election_results::Dataset> {
        let mut b = Builder::new();
        read_csv_results(content.as_bytes(), "test.csv", &mut b)?;
        Ok(b.build())
    }

    #[test]
    fn wide_and_long_layouts_agree() {
        let wide = load(WIDE).unwrap();
        let long = load(LONG).unwrap();
        assert_eq!(wide.len(), 8);
        assert_eq!(long.len(), 8);
        for vt in VoteType::ALL {
            for s in wide.states() {
                let sel = Selection::state(s, vt);
                assert_eq!(aggregate(&wide, &sel), aggregate(&long, &sel));
            }
        }
    }

    #[test]
    fn empty_first_votes_count_as_zero() {
        let ds = load(WIDE).unwrap();
        let view = aggregate(&ds, &Selection::state("Berlin", VoteType::First));
        assert_eq!(view.get("Volt Deutschland"), Some(0));
    }

    #[test]
    fn negative_count_fails() {
        let res = load("state,party,vote_type,votes\nBerlin,SPD,first,-5\n");
        assert!(matches!(res, Err(LoadError::InvalidRow { lineno: 2, .. })));
    }

    #[test]
    fn malformed_number_fails() {
        let res = load("state,party,first_votes,second_votes\nBerlin,SPD,10,1O0\n");
        assert!(matches!(res, Err(LoadError::ParsingVotes { lineno: 2, .. })));
    }

    #[test]
    fn duplicate_row_fails() {
        let res = load(
            "state,party,vote_type,votes\nBerlin,SPD,first,5\nBerlin,SPD,first,6\n",
        );
        assert!(matches!(res, Err(LoadError::InvalidRow { lineno: 3, .. })));
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let res = load("state,party,vote_type,votes\n\nBerlin,SPD,first,-5\n");
        assert!(matches!(res, Err(LoadError::InvalidRow { lineno: 3, .. })));
    }

    #[test]
    fn line_numbers_follow_multiline_fields() {
        let res = load(
            "state,party,vote_type,votes\n\"Berlin\nMitte\",SPD,first,5\nBerlin,SPD,first,x\n",
        );
        assert!(matches!(res, Err(LoadError::ParsingVotes { lineno: 4, .. })));
    }

    #[test]
    fn overflowing_totals_fail() {
        let res = load(
            "state,party,vote_type,votes
Bayern,SPD,first,9000000000000000000
Berlin,SPD,first,9000000000000000000
Hamburg,SPD,first,9000000000000000000
",
        );
        assert!(matches!(
            res,
            Err(LoadError::InvalidRow {
                source: DatasetErrors::VoteCountOverflow(VoteType::First),
                lineno: 4,
                ..
            })
        ));
    }

    #[test]
    fn empty_file_fails() {
        assert!(matches!(load(""), Err(LoadError::MissingHeader { .. })));
    }

    #[test]
    fn header_only_is_empty() {
        let ds = load("state,party,vote_type,votes\n").unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn missing_file_fails() {
        let mut b = Builder::new();
        let res = read_csv_file("/nonexistent/results.csv", &mut b);
        assert!(matches!(res, Err(LoadError::OpeningCsv { .. })));
    }
}
