use std::collections::BTreeMap;
use std::fs;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::dashboard::*;

/// The file formats that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn provider(&self) -> LoadResult<Provider> {
        match self.provider.trim().to_lowercase().as_str() {
            "csv" => Ok(Provider::Csv),
            "xlsx" | "excel" => Ok(Provider::Xlsx),
            _ => UnknownProviderSnafu {
                provider: self.provider.clone(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: Option<String>,
    #[serde(rename = "dataSources")]
    pub data_sources: Vec<FileSource>,
    #[serde(rename = "partyColors")]
    pub party_colors: Option<BTreeMap<String, String>>,
    #[serde(rename = "defaultTopN")]
    pub default_top_n: Option<usize>,
}

pub fn read_config(path: &str) -> LoadResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Reads a summary previously written by the `summary` command.
pub fn read_summary(path: &str) -> LoadResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: DashboardConfig = serde_json::from_str(
            r##"{
                "title": "Bundestagswahl 2025",
                "dataSources": [
                    {"provider": "csv", "filePath": "a.csv"},
                    {"provider": "xlsx", "filePath": "b.xlsx", "excelWorksheetName": "Results"}
                ],
                "partyColors": {"Volt Deutschland": "#612095"},
                "defaultTopN": 4
            }"##,
        )
        .unwrap();
        assert_eq!(config.data_sources.len(), 2);
        assert_eq!(config.data_sources[0].provider().unwrap(), Provider::Csv);
        assert_eq!(config.data_sources[1].provider().unwrap(), Provider::Xlsx);
        assert_eq!(
            config.data_sources[1].excel_worksheet_name.as_deref(),
            Some("Results")
        );
        assert_eq!(config.default_top_n, Some(4));
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"dataSources": [{"provider": "CSV", "filePath": "a.csv"}]}"#)
                .unwrap();
        assert_eq!(config.title, None);
        assert_eq!(config.party_colors, None);
        assert_eq!(config.data_sources[0].provider().unwrap(), Provider::Csv);
    }

    #[test]
    fn unknown_provider() {
        let fs = FileSource {
            provider: "dominion".to_string(),
            file_path: "x".to_string(),
            excel_worksheet_name: None,
        };
        assert!(matches!(
            fs.provider(),
            Err(LoadError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn missing_config_file() {
        let res = read_config("/nonexistent/dashboard.json");
        assert!(matches!(res, Err(LoadError::OpeningJson { .. })));
    }
}
