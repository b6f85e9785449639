//! Prompt templates for the specialist panel and the multidisciplinary team.
//!
//! Report text is substituted as-is. Callers are responsible for making sure
//! it does not contain anything that breaks the surrounding template.

use crate::models::{PanelFindings, SpecialistRole};

pub const TEAM_PREAMBLE: &str =
    "You are a multidisciplinary medical team combining the opinions of several specialists.";

pub fn preamble(role: SpecialistRole) -> &'static str {
    match role {
        SpecialistRole::Cardiologist => {
            "You are a professional cardiologist reviewing laboratory and diagnostic reports."
        }
        SpecialistRole::Psychologist => {
            "You are a professional psychologist reviewing laboratory reports for mental health markers."
        }
        SpecialistRole::Pulmonologist => {
            "You are an expert pulmonologist reviewing respiratory test reports."
        }
    }
}

pub fn specialist_prompt(role: SpecialistRole, report: &str) -> String {
    match role {
        SpecialistRole::Cardiologist => cardiologist_prompt(report),
        SpecialistRole::Psychologist => psychologist_prompt(report),
        SpecialistRole::Pulmonologist => pulmonologist_prompt(report),
    }
}

fn cardiologist_prompt(report: &str) -> String {
    format!(
        r#"Act as a professional cardiologist analyzing a patient's medical test report.
For every heart-related test you find (e.g. cholesterol, LDL, HDL, triglycerides, ECG, blood pressure), give a detailed but simple summary.
For each test, include:
1. **Test Name**
2. **Normal Range**
3. **Reported Value**
4. **Interpretation**: clearly state whether the result is LOW, NORMAL, or HIGH.
5. **Explanation**: what this could mean for heart health.
6. **Suggestion**: what the person can do (diet, lifestyle, exercise) to improve it.

Example Output:
- Test: Cholesterol
  • Normal Range: 125-200 mg/dL
  • Reported Value: 240 mg/dL
  • Interpretation: HIGH
  • Explanation: Elevated cholesterol, which can increase the risk of heart disease.
  • Suggestion: Avoid fried food, increase fiber intake, and exercise regularly.

Now analyze this report and return structured, human-readable output:
Medical Report: {report}"#
    )
}

fn psychologist_prompt(report: &str) -> String {
    format!(
        r#"Act as a professional psychologist analyzing a patient's medical test report.
Interpret the report in terms of **mental health, mood, and emotional well-being**.
Focus on biomarkers linked to stress, depression, anxiety, sleep disturbance, or cognitive function
(e.g. cortisol, thyroid levels, vitamin B12, vitamin D, blood sugar).
For each relevant test found:
1. **Test Name**
2. **Normal Range**
3. **Reported Value**
4. **Interpretation**: LOW / NORMAL / HIGH
5. **Explanation**: what this result may indicate about the person's mental or emotional health.
6. **Suggestion**: simple, science-backed lifestyle, diet, or behavioral tips.

Example Output:
- Test: Cortisol
  • Normal Range: 6-18 µg/dL (morning)
  • Reported Value: 22 µg/dL
  • Interpretation: HIGH
  • Explanation: Suggests elevated stress levels that might be affecting mood or sleep.
  • Suggestion: Try mindfulness, deep breathing, and regular sleep patterns.

Now analyze this medical report in the same structured format:
Patient's Report: {report}"#
    )
}

fn pulmonologist_prompt(report: &str) -> String {
    format!(
        r#"Act as an expert pulmonologist analyzing a patient's test report.
For each lung-related test (e.g. oxygen saturation, FEV1, FVC, spirometry), provide a detailed summary.
For each test, include:
1. **Test Name**
2. **Normal Range**
3. **Reported Value**
4. **Interpretation**: LOW / NORMAL / HIGH
5. **Explanation**: what this means for respiratory health.
6. **Suggestion**: steps to improve or maintain lung function.

Example Output:
- Test: Oxygen Saturation
  • Normal Range: 95-100%
  • Reported Value: 89%
  • Interpretation: LOW
  • Explanation: May indicate mild respiratory distress or reduced lung efficiency.
  • Suggestion: Practice deep breathing and consult a doctor if it persists.

Now analyze this report and present it in the same structured format:
Patient's Report: {report}"#
    )
}

/// Prompt for the team stage, built from the three specialist outputs.
pub fn team_prompt(findings: &PanelFindings) -> String {
    let cardiologist = findings.text_or_placeholder(SpecialistRole::Cardiologist);
    let psychologist = findings.text_or_placeholder(SpecialistRole::Psychologist);
    let pulmonologist = findings.text_or_placeholder(SpecialistRole::Pulmonologist);

    format!(
        r#"Act as a multidisciplinary medical team analyzing a full health test report.
For each test in the report:
1. Mention the **Test Name**
2. Give its **Normal Range**
3. Mention the **Reported Value**
4. Add an **Interpretation**: whether it is LOW, NORMAL, or HIGH.
5. Write a short **Explanation** in plain language.
6. Add a **Suggestion**: practical advice to help bring it back to the normal range.

Example Output:
- Test: Hemoglobin
  • Normal Range: 13-17 g/dL
  • Reported Value: 10 g/dL
  • Interpretation: LOW
  • Explanation: Indicates anemia or iron deficiency.
  • Suggestion: Eat iron-rich foods like spinach, red meat, or supplements (under guidance).

Now analyze the following specialist reports and respond in the same format:

Cardiologist Report: {cardiologist}
Psychologist Report: {psychologist}
Pulmonologist Report: {pulmonologist}"#
    )
}
