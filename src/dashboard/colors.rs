use std::collections::{BTreeMap, HashMap};

use log::debug;

/// Used for the parties without a color and for the merged `Others` entry.
pub const DEFAULT_OTHER: &str = "#CCCCCC";

// Real-life approximations of the party colors.
const PARTY_COLORS: &[(&str, &str)] = &[
    ("Christlich Demokratische Union Deutschlands", "#000000"),
    ("Christlich-Soziale Union in Bayern e.V.", "#008AC5"),
    ("Sozialdemokratische Partei Deutschlands", "#E3000F"),
    ("BÜNDNIS 90/DIE GRÜNEN", "#1AA037"),
    ("Freie Demokratische Partei", "#FFED00"),
    ("Alternative für Deutschland", "#009EE0"),
    ("Die Linke", "#BE3075"),
    ("Bündnis Sahra Wagenknecht", "#00B5AD"),
    ("Brandenb. Verein. Bürgerbewegungen/Freie Wähler", "#FF7F00"),
    ("Volt Deutschland", "#612095"),
    ("Die Partei", "#E20613"),
    ("Südschleswigscher Wählerverband", "#00A1DE"),
];

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyColors {
    colors: HashMap<String, String>,
}

impl Default for PartyColors {
    fn default() -> Self {
        PartyColors::with_overrides(None)
    }
}

impl PartyColors {
    /// The built-in colors, completed or replaced by the configured ones.
    pub fn with_overrides(overrides: Option<&BTreeMap<String, String>>) -> PartyColors {
        let mut colors: HashMap<String, String> = PARTY_COLORS
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        if let Some(o) = overrides {
            debug!("PartyColors: {} configured colors", o.len());
            for (p, c) in o.iter() {
                colors.insert(p.clone(), c.clone());
            }
        }
        PartyColors { colors }
    }

    pub fn color(&self, party: &str) -> &str {
        self.colors
            .get(party)
            .map(|c| c.as_str())
            .unwrap_or(DEFAULT_OTHER)
    }
}
