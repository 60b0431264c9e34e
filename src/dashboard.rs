use election_results::builder::Builder;
use election_results::*;
use log::{debug, info, warn};
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::dashboard::colors::PartyColors;
use crate::dashboard::config_reader::*;

pub mod colors;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
pub mod render;
pub mod server;

pub const DEFAULT_TITLE: &str = "Germany 2025 Election Dashboard";
pub const DEFAULT_TOP_N: usize = 6;
pub const MIN_TOP_N: usize = 2;
pub const MAX_TOP_N: usize = 6;

/// Errors raised while reading the configuration and the result files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoadError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading CSV file {path}"))]
    ReadingCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Malformed CSV line {lineno} in {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Excel file {path} has no worksheet or no rows"))]
    EmptyExcel { path: String },
    #[snafu(display("Unreadable cell at line {lineno} of {path}: {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("No header row in {path}"))]
    MissingHeader { path: String },
    #[snafu(display("Unknown columns {header:?} in {path}, expected a long or wide layout"))]
    UnknownLayout { path: String, header: Vec<String> },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    LineTooShort { path: String, lineno: usize },
    #[snafu(display("Cannot read vote count {content:?} at line {lineno} of {path}"))]
    ParsingVotes {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Unknown vote type {content:?} at line {lineno} of {path}"))]
    UnknownVoteType {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Invalid result at line {lineno} of {path}"))]
    InvalidRow {
        source: DatasetErrors,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Provider not implemented: {provider:?} (expected csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("The configuration file lists no data source"))]
    NoDataSources {},
    #[snafu(display("No input: pass a configuration file (--config) or a results file (--input)"))]
    NoInput {},
    #[snafu(display("defaultTopN must be between 2 and 6, got {value}"))]
    InvalidTopN { value: usize },
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that stop the program.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DashboardError {
    #[snafu(display("Failed to load the election results"))]
    Load { source: LoadError },
    #[snafu(display("Cannot listen on {addr}"))]
    Bind {
        source: std::io::Error,
        addr: String,
    },
    #[snafu(display("Server error"))]
    Serve { source: std::io::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Where the results come from, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    pub config: Option<String>,
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
}

/// Presentation settings that do not depend on the request.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub title: String,
    pub colors: PartyColors,
    pub default_top_n: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            title: DEFAULT_TITLE.to_string(),
            colors: PartyColors::default(),
            default_top_n: DEFAULT_TOP_N,
        }
    }
}

/// Everything the server needs. It is built once before serving and then
/// shared read-only between the requests.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Dataset,
    pub summary: NationalSummary,
    pub settings: DashboardSettings,
}

impl AppState {
    pub fn new(dataset: Dataset, settings: DashboardSettings) -> AppState {
        let summary = national_summary(&dataset);
        AppState {
            dataset,
            summary,
            settings,
        }
    }
}

/// The two pages of the dashboard.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Mode {
    /// National totals.
    Overview,
    /// Vote shares in one state.
    State,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s.trim() {
            "overall" | "overview" => Some(Mode::Overview),
            "state" | "states" => Some(Mode::State),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Overview => "overview",
            Mode::State => "state",
        }
    }
}

/// The state of the controls of the page, after applying the defaults.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PageRequest {
    pub mode: Mode,
    pub vote_type: VoteType,
    /// Only meaningful in state mode. None when the dataset has no state.
    pub state: Option<String>,
    pub top_n: usize,
}

impl PageRequest {
    /// Builds the request from the raw query values. Missing or invalid values
    /// fall back to the defaults rather than failing.
    pub fn resolve(
        mode: Option<&str>,
        vote_type: Option<&str>,
        state: Option<&str>,
        top_n: Option<&str>,
        app: &AppState,
    ) -> PageRequest {
        let mode = mode.and_then(Mode::parse).unwrap_or(Mode::Overview);
        let vote_type = vote_type
            .and_then(VoteType::parse)
            .unwrap_or(VoteType::Second);
        let state = match state.map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => app.dataset.states().first().cloned(),
        };
        let top_n = match top_n.map(|s| s.trim().parse::<usize>()) {
            Some(Ok(n)) if (MIN_TOP_N..=MAX_TOP_N).contains(&n) => n,
            Some(x) => {
                debug!("PageRequest::resolve: ignoring top_n {:?}", x);
                app.settings.default_top_n
            }
            None => app.settings.default_top_n,
        };
        PageRequest {
            mode,
            vote_type,
            state,
            top_n,
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        match self.mode {
            Mode::Overview => Some(Selection::national(self.vote_type)),
            Mode::State => self
                .state
                .as_ref()
                .map(|s| Selection::state(s, self.vote_type)),
        }
    }
}

fn read_source(root_path: &Path, cfs: &FileSource, builder: &mut Builder) -> LoadResult<usize> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read results file {:?}", p2);
    match cfs.provider()? {
        Provider::Csv => io_csv::read_csv_file(&p2, builder),
        Provider::Xlsx => {
            io_excel::read_excel_file(&p2, cfs.excel_worksheet_name.as_deref(), builder)
        }
    }
}

/// Reads all the configured sources into one dataset.
pub fn load_app_state(opts: &InputOptions) -> LoadResult<AppState> {
    let (config, root_p): (DashboardConfig, PathBuf) = match (&opts.config, &opts.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        (None, Some(input)) => {
            let config = DashboardConfig {
                title: None,
                data_sources: vec![FileSource {
                    provider: opts
                        .input_type
                        .clone()
                        .unwrap_or_else(|| "csv".to_string()),
                    file_path: input.clone(),
                    excel_worksheet_name: opts.excel_worksheet_name.clone(),
                }],
                party_colors: None,
                default_top_n: None,
            };
            (config, PathBuf::new())
        }
        (None, None) => return NoInputSnafu {}.fail(),
    };
    debug!("load_app_state: config: {:?}", config);

    ensure!(!config.data_sources.is_empty(), NoDataSourcesSnafu {});
    let default_top_n = config.default_top_n.unwrap_or(DEFAULT_TOP_N);
    ensure!(
        (MIN_TOP_N..=MAX_TOP_N).contains(&default_top_n),
        InvalidTopNSnafu {
            value: default_top_n
        }
    );

    let mut builder = Builder::new();
    for cfs in config.data_sources.iter() {
        let count = read_source(&root_p, cfs, &mut builder)?;
        info!("Read {} results from {:?}", count, cfs.file_path);
    }
    let dataset = builder.build();
    if dataset.is_empty() {
        warn!("The results files contain no result, the dashboard will be empty");
    }
    info!(
        "Loaded {} results for {} states and {} parties",
        dataset.len(),
        dataset.states().len(),
        dataset.parties().len()
    );

    let settings = DashboardSettings {
        title: config.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        colors: PartyColors::with_overrides(config.party_colors.as_ref()),
        default_top_n,
    };
    Ok(AppState::new(dataset, settings))
}

pub fn party_share_js(ps: &PartyShare) -> JSValue {
    json!({"party": ps.party, "votes": ps.votes, "share": ps.share})
}

pub fn view_to_json(selection: &Selection, view: &AggregatedView) -> JSValue {
    let results: Vec<JSValue> = view.shares().iter().map(party_share_js).collect();
    json!({
        "selection": {
            "state": selection.state.to_string(),
            "voteType": selection.vote_type.as_str(),
        },
        "total": view.total(),
        "results": results,
    })
}

fn tally_js(view: &AggregatedView) -> JSValue {
    let mut tally = serde_json::Map::new();
    for (party, count) in view.tally() {
        tally.insert(party.clone(), json!(count));
    }
    JSValue::Object(tally)
}

/// The national and per-state totals, for both vote types.
pub fn build_summary_js(app: &AppState) -> JSValue {
    let ds = &app.dataset;
    // Shares are written as text so that the summary can be compared verbatim
    // after a round trip through a file.
    let winner_js = |vt: VoteType| match app.summary.winner(vt) {
        Some(w) => json!({"party": w.party, "votes": w.votes, "share": format!("{:.2}", w.share)}),
        None => JSValue::Null,
    };
    let states: Vec<JSValue> = ds
        .states()
        .iter()
        .map(|s| {
            json!({
                "state": s,
                "first": tally_js(&aggregate(ds, &Selection::state(s, VoteType::First))),
                "second": tally_js(&aggregate(ds, &Selection::state(s, VoteType::Second))),
            })
        })
        .collect();
    json!({
        "config": {
            "title": app.settings.title,
            "statesCovered": app.summary.states_covered,
        },
        "national": {
            "first": tally_js(&aggregate(ds, &Selection::national(VoteType::First))),
            "second": tally_js(&aggregate(ds, &Selection::national(VoteType::Second))),
        },
        "winners": {
            "first": winner_js(VoteType::First),
            "second": winner_js(VoteType::Second),
        },
        "states": states,
    })
}

/// Writes the summary and compares it with the reference, if provided.
pub fn run_summary(
    app: &AppState,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> DashboardResult<()> {
    let summary_js = build_summary_js(app);
    let pretty_js_stats =
        serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {})?;

    match out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingOutputSnafu { path })?;
            info!("Summary written to {:?}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p).context(LoadSnafu {})?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
        info!("The summary matches the reference {:?}", summary_p);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_app() -> AppState {
        let mut b = Builder::new();
        let rows = [
            ("Bayern", "Christlich-Soziale Union in Bayern e.V.", 3_000, 2_900),
            ("Bayern", "Alternative für Deutschland", 1_400, 1_300),
            ("Bayern", "Sozialdemokratische Partei Deutschlands", 900, 800),
            ("Berlin", "Die Linke", 390, 400),
            ("Berlin", "Christlich Demokratische Union Deutschlands", 400, 380),
            ("Berlin", "Volt Deutschland", 0, 30),
        ];
        for (state, party, first, second) in rows {
            b.add_results_wide(state, party, first, second).unwrap();
        }
        AppState::new(b.build(), DashboardSettings::default())
    }

    #[test]
    fn resolve_defaults() {
        let app = sample_app();
        let req = PageRequest::resolve(None, None, None, None, &app);
        assert_eq!(req.mode, Mode::Overview);
        assert_eq!(req.vote_type, VoteType::Second);
        assert_eq!(req.state.as_deref(), Some("Bayern"));
        assert_eq!(req.top_n, DEFAULT_TOP_N);
        assert_eq!(req.selection(), Some(Selection::national(VoteType::Second)));
    }

    #[test]
    fn resolve_invalid_values_fall_back() {
        let app = sample_app();
        let req = PageRequest::resolve(
            Some("bogus"),
            Some("third"),
            Some("  "),
            Some("12"),
            &app,
        );
        assert_eq!(req.mode, Mode::Overview);
        assert_eq!(req.vote_type, VoteType::Second);
        assert_eq!(req.state.as_deref(), Some("Bayern"));
        assert_eq!(req.top_n, DEFAULT_TOP_N);
        let req = PageRequest::resolve(None, None, None, Some("x"), &app);
        assert_eq!(req.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn resolve_state_mode() {
        let app = sample_app();
        let req = PageRequest::resolve(
            Some("state"),
            Some("first"),
            Some("Berlin"),
            Some("3"),
            &app,
        );
        assert_eq!(req.top_n, 3);
        assert_eq!(req.selection(), Some(Selection::state("Berlin", VoteType::First)));
    }

    #[test]
    fn summary_contains_national_and_state_totals() {
        let app = sample_app();
        let js = build_summary_js(&app);
        assert_eq!(js["config"]["statesCovered"], json!(2));
        assert_eq!(
            js["national"]["first"]["Christlich-Soziale Union in Bayern e.V."],
            json!(3_000)
        );
        assert_eq!(js["states"][1]["state"], json!("Berlin"));
        assert_eq!(js["states"][1]["second"]["Volt Deutschland"], json!(30));
        assert_eq!(
            js["winners"]["second"]["party"],
            json!("Christlich-Soziale Union in Bayern e.V.")
        );
    }

    #[test]
    fn view_json_lists_shares() {
        let app = sample_app();
        let sel = Selection::state("Berlin", VoteType::Second);
        let js = view_to_json(&sel, &aggregate(&app.dataset, &sel));
        assert_eq!(js["selection"]["state"], json!("Berlin"));
        assert_eq!(js["total"], json!(810));
        assert_eq!(js["results"][0]["party"], json!("Die Linke"));
        assert_eq!(js["results"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn missing_input_is_an_error() {
        let res = load_app_state(&InputOptions::default());
        assert!(matches!(res, Err(LoadError::NoInput {})));
    }

    #[test]
    fn missing_file_is_an_error() {
        let opts = InputOptions {
            input: Some("/nonexistent/elections.csv".to_string()),
            ..Default::default()
        };
        let res = load_app_state(&opts);
        assert!(matches!(res, Err(LoadError::OpeningCsv { .. })));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let opts = InputOptions {
            input: Some("results.parquet".to_string()),
            input_type: Some("parquet".to_string()),
            ..Default::default()
        };
        let res = load_app_state(&opts);
        assert!(matches!(res, Err(LoadError::UnknownProvider { .. })));
    }

    #[test]
    fn loads_config_with_relative_paths() {
        let dir = std::env::temp_dir().join(format!("electiondash-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("results.csv"),
            "state,party,vote_type,votes\nBremen,SPD,second,120\nBremen,CDU,second,80\n",
        )
        .unwrap();
        fs::write(
            dir.join("dashboard.json"),
            r#"{
                "title": "Bremen",
                "dataSources": [{"provider": "csv", "filePath": "results.csv"}],
                "defaultTopN": 3
            }"#,
        )
        .unwrap();
        let opts = InputOptions {
            config: Some(dir.join("dashboard.json").display().to_string()),
            ..Default::default()
        };
        let app = load_app_state(&opts).unwrap();
        assert_eq!(app.settings.title, "Bremen");
        assert_eq!(app.settings.default_top_n, 3);
        assert_eq!(app.dataset.len(), 2);
        assert_eq!(app.summary.second_winner.as_ref().unwrap().party, "SPD");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn summary_reference_mismatch_is_an_error() {
        let app = sample_app();
        let dir = std::env::temp_dir().join(format!("electiondash-ref-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let out = dir.join("summary.json").display().to_string();
        let reference = dir.join("reference.json").display().to_string();

        run_summary(&app, Some(out.clone()), None).unwrap();
        // The output is its own reference.
        run_summary(&app, Some(out.clone()), Some(out.clone())).unwrap();

        fs::write(&reference, r#"{"national": {}}"#).unwrap();
        let res = run_summary(&app, Some(out), Some(reference));
        assert!(matches!(res, Err(DashboardError::ReferenceMismatch { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }
}
