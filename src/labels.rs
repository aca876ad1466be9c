// src/labels.rs

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// The four migration-direction buckets used for rate computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowCategory {
    NonMigrant,
    InState,
    OutOfState,
    Foreign,
}

impl FlowCategory {
    pub const ALL: [FlowCategory; 4] = [
        FlowCategory::NonMigrant,
        FlowCategory::InState,
        FlowCategory::OutOfState,
        FlowCategory::Foreign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowCategory::NonMigrant => "non_migrant",
            FlowCategory::InState => "in_state",
            FlowCategory::OutOfState => "out_of_state",
            FlowCategory::Foreign => "foreign",
        }
    }
}

impl fmt::Display for FlowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical spelling of each flow-category row label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLabels {
    pub non_migrant: String,
    pub in_state: String,
    pub out_of_state: String,
    pub foreign: String,
}

impl Default for FlowLabels {
    fn default() -> Self {
        Self {
            non_migrant: "Smith County Non-Migrants".into(),
            in_state: "Smith County Total Migration-Same State".into(),
            out_of_state: "Smith County Total Migration-Different State".into(),
            foreign: "Smith County Total Migration-Foreign".into(),
        }
    }
}

impl FlowLabels {
    pub fn label(&self, category: FlowCategory) -> &str {
        match category {
            FlowCategory::NonMigrant => &self.non_migrant,
            FlowCategory::InState => &self.in_state,
            FlowCategory::OutOfState => &self.out_of_state,
            FlowCategory::Foreign => &self.foreign,
        }
    }
}

/// Historical spellings seen across releases, mapped to the canonical ones.
pub fn default_corrections() -> HashMap<String, String> {
    let flow = FlowLabels::default();
    let pairs: [(&str, &str); 13] = [
        ("Smith County Non-migrants", flow.non_migrant.as_str()),
        ("Smith County Non-Migrant", flow.non_migrant.as_str()),
        ("Smith County Non Migrants", flow.non_migrant.as_str()),
        ("Smith County Tot Mig-Same St", flow.in_state.as_str()),
        ("Smith County Total Mig-Same State", flow.in_state.as_str()),
        ("Smith County Total Migration Same State", flow.in_state.as_str()),
        ("Smith County Tot Mig-Diff St", flow.out_of_state.as_str()),
        ("Smith County Total Mig-Diff State", flow.out_of_state.as_str()),
        ("Smith County Total Migration Different State", flow.out_of_state.as_str()),
        ("Smith County Tot Mig-Foreign", flow.foreign.as_str()),
        ("Smith County Total Mig-Foreign", flow.foreign.as_str()),
        // neighbours whose abbreviated names collide with other states' counties
        ("Gregg Co", "Gregg County"),
        ("Cherokee Co", "Cherokee County"),
    ];
    pairs
        .into_iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect()
}

/// Exact-match label canonicalizer. Unknown labels pass through unchanged.
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    corrections: HashMap<String, String>,
    flow_labels: FlowLabels,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new(default_corrections(), FlowLabels::default())
    }
}

impl LabelNormalizer {
    pub fn new(corrections: HashMap<String, String>, flow_labels: FlowLabels) -> Self {
        Self {
            corrections,
            flow_labels,
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.corrections
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Which flow bucket a canonical label belongs to, if any.
    /// Individual origin-county rows return `None`.
    pub fn classify(&self, canonical: &str) -> Option<FlowCategory> {
        FlowCategory::ALL
            .into_iter()
            .find(|c| self.flow_labels.label(*c) == canonical)
    }

    pub fn flow_labels(&self) -> &FlowLabels {
        &self.flow_labels
    }
}
