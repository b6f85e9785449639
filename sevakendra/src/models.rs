use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Returned by the synthesis stage when the team call produced nothing.
pub const NO_DIAGNOSIS_GENERATED: &str = "No diagnosis generated.";

/// Stands in for a specialist whose call failed.
pub const NO_DIAGNOSIS_PLACEHOLDER: &str = "No diagnosis available from this specialist.";

pub const FINAL_DIAGNOSIS_TITLE: &str = "### Final Diagnosis:\n\n";

/// Plain text of an uploaded medical report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    text: String,
}

impl Report {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistRole {
    Cardiologist,
    Psychologist,
    Pulmonologist,
}

impl SpecialistRole {
    pub const ALL: [SpecialistRole; 3] = [
        SpecialistRole::Cardiologist,
        SpecialistRole::Psychologist,
        SpecialistRole::Pulmonologist,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SpecialistRole::Cardiologist => "Cardiologist",
            SpecialistRole::Psychologist => "Psychologist",
            SpecialistRole::Pulmonologist => "Pulmonologist",
        }
    }
}

impl fmt::Display for SpecialistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of one specialist call. `text` is `None` when the call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistResult {
    pub role: SpecialistRole,
    pub text: Option<String>,
}

impl SpecialistResult {
    pub fn answered(role: SpecialistRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: Some(text.into()),
        }
    }

    pub fn failed(role: SpecialistRole) -> Self {
        Self { role, text: None }
    }
}

/// The joined output of the specialist panel.
///
/// Holds an entry for every role in [`SpecialistRole::ALL`]; a role whose call
/// failed or never reported maps to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelFindings {
    results: BTreeMap<SpecialistRole, Option<String>>,
}

impl PanelFindings {
    pub fn new() -> Self {
        Self {
            results: SpecialistRole::ALL.iter().map(|role| (*role, None)).collect(),
        }
    }

    pub fn record(&mut self, result: SpecialistResult) {
        self.results.insert(result.role, result.text);
    }

    pub fn get(&self, role: SpecialistRole) -> Option<&str> {
        self.results.get(&role).and_then(|text| text.as_deref())
    }

    pub fn text_or_placeholder(&self, role: SpecialistRole) -> &str {
        self.get(role).unwrap_or(NO_DIAGNOSIS_PLACEHOLDER)
    }

    pub fn absent_roles(&self) -> Vec<SpecialistRole> {
        self.results
            .iter()
            .filter(|(_, text)| text.is_none())
            .map(|(role, _)| *role)
            .collect()
    }

    pub fn present_count(&self) -> usize {
        self.results.values().filter(|text| text.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Default for PanelFindings {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<SpecialistResult> for PanelFindings {
    fn from_iter<I: IntoIterator<Item = SpecialistResult>>(iter: I) -> Self {
        let mut findings = PanelFindings::new();
        for result in iter {
            findings.record(result);
        }
        findings
    }
}

/// Final multidisciplinary opinion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub text: String,
}

impl SynthesisResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn not_generated() -> Self {
        Self::new(NO_DIAGNOSIS_GENERATED)
    }

    /// The text block shown to the user and written to the result artifact.
    pub fn format_titled(&self) -> String {
        format!("{}{}", FINAL_DIAGNOSIS_TITLE, self.text)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    pub report_id: String,
    pub diagnosis: String,
    pub answered: Vec<SpecialistRole>,
    pub missing: Vec<SpecialistRole>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}
