use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use election_results::builder::Builder;
use log::{debug, info};
use snafu::prelude::*;

use crate::dashboard::{
    io_common::{add_record, detect_layout, float_votes, simplify_file_name},
    *,
};

pub fn read_excel_file(
    path: &str,
    worksheet_name: Option<&str>,
    builder: &mut Builder,
) -> LoadResult<usize> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu { path })?;
    let header: Vec<String> = header_row
        .iter()
        .map(|c| cell_to_string(path, 1, c))
        .collect::<LoadResult<Vec<String>>>()?;
    debug!("read_excel_file: header: {:?}", header);
    let layout = detect_layout(path, &header)?;

    let mut count = 0;
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row
            .iter()
            .map(|c| cell_to_string(path, lineno, c))
            .collect::<LoadResult<Vec<String>>>()?;
        // Rows that are entirely blank are common at the bottom of worksheets.
        if cells.iter().all(|s| s.trim().is_empty()) {
            debug!("read_excel_file: skipping blank line {}", lineno);
            continue;
        }
        let fields: Vec<&str> = cells.iter().map(|s| s.as_str()).collect();
        add_record(builder, &layout, path, lineno, &fields)?;
        count += 1;
    }
    info!(
        "read_excel_file: {}: {} lines",
        simplify_file_name(path),
        count
    );
    Ok(count)
}

fn cell_to_string(path: &str, lineno: usize, cell: &DataType) -> LoadResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok(String::new()),
        // Integral numbers are often stored as floats. Other floats keep their
        // text and are rejected when read as a count.
        DataType::Float(f) => match float_votes(*f) {
            Some(x) => Ok(x.to_string()),
            None => Ok(f.to_string()),
        },
        DataType::Error(_) => ExcelWrongCellTypeSnafu {
            path,
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
        x => Ok(x.to_string()),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> LoadResult<Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use election_results::{aggregate, Selection, VoteType};

    #[test]
    fn cells_as_text() {
        assert_eq!(
            cell_to_string("x.xlsx", 2, &DataType::Float(1234.0)).unwrap(),
            "1234"
        );
        assert_eq!(
            cell_to_string("x.xlsx", 2, &DataType::Int(-7)).unwrap(),
            "-7"
        );
        assert_eq!(
            cell_to_string("x.xlsx", 2, &DataType::String("Sachsen".to_string())).unwrap(),
            "Sachsen"
        );
        assert_eq!(cell_to_string("x.xlsx", 2, &DataType::Empty).unwrap(), "");
        assert_eq!(
            cell_to_string("x.xlsx", 2, &DataType::Float(12.5)).unwrap(),
            "12.5"
        );
    }

    #[test]
    fn huge_floats_are_not_clamped() {
        let s = cell_to_string("x.xlsx", 2, &DataType::Float(1e30)).unwrap();
        assert_ne!(s, i64::MAX.to_string());
        assert!(matches!(
            crate::dashboard::io_common::parse_votes("x.xlsx", 2, &s),
            Err(LoadError::ParsingVotes { lineno: 2, .. })
        ));
    }

    #[test]
    fn error_cells_are_rejected() {
        let res = cell_to_string(
            "x.xlsx",
            4,
            &DataType::Error(calamine::CellErrorType::Div0),
        );
        assert!(matches!(
            res,
            Err(LoadError::ExcelWrongCellType { lineno: 4, .. })
        ));
    }

    const RESULTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/results.xlsx");

    #[test]
    fn reads_wide_worksheet_by_default() {
        let mut b = Builder::new();
        // The blank row in the middle of the worksheet is skipped.
        assert_eq!(read_excel_file(RESULTS, None, &mut b).unwrap(), 4);
        let ds = b.build();
        assert_eq!(ds.len(), 8);
        assert_eq!(ds.states(), &["Bayern", "Berlin"]);
        let view = aggregate(&ds, &Selection::state("Berlin", VoteType::First));
        assert_eq!(view.get("Volt Deutschland"), Some(0));
        assert_eq!(view.get("Die Linke"), Some(390));
    }

    #[test]
    fn long_and_wide_worksheets_agree() {
        let mut wide = Builder::new();
        read_excel_file(RESULTS, Some("Wide"), &mut wide).unwrap();
        let mut long = Builder::new();
        assert_eq!(read_excel_file(RESULTS, Some("Long"), &mut long).unwrap(), 8);
        let (wide, long) = (wide.build(), long.build());
        for vt in VoteType::ALL {
            let sel = Selection::national(vt);
            assert_eq!(aggregate(&wide, &sel), aggregate(&long, &sel));
        }
    }

    #[test]
    fn missing_worksheet() {
        let mut b = Builder::new();
        let res = read_excel_file(RESULTS, Some("Ergebnisse"), &mut b);
        assert!(matches!(
            res,
            Err(LoadError::MissingWorksheet { ref name, .. }) if name == "Ergebnisse"
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn missing_workbook() {
        let mut b = Builder::new();
        let res = read_excel_file("/nonexistent/results.xlsx", None, &mut b);
        assert!(matches!(res, Err(LoadError::OpeningExcel { .. })));
    }
}
