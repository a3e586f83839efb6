use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{Capability, Case};

/// A keyword pattern and the capability it implies.
struct ServiceRule {
    regex: Regex,
    capability: Capability,
}

/// Keyword-to-capability table. Whole words match as words, with an optional
/// plural `s`, so `heart` skips `heartburn` and `arrest` skips `arrested`.
/// Stems stay open at the end, so `ortho` or `burn` also match `orthopedic` or `burns`.
/// Every alternative is anchored at a word start.
static SERVICE_RULES: LazyLock<Vec<ServiceRule>> = LazyLock::new(|| {
    vec![
        rule(&["cardiac", "heart", "pulse", "arrest", "chest"], &[], Capability::Cardiology),
        rule(
            &[
                "bleeding",
                "unconscious",
                r"severe\s+injury",
                r"severe\s+injuries",
                "hemorrhage",
                "hemorrhaged",
            ],
            &["trauma"],
            Capability::Trauma,
        ),
        rule(&["fracture", "fractured", "bone", "broken"], &["ortho"], Capability::Orthopedics),
        rule(&["child", "children", "baby", "babies", "infant"], &["pediatric"], Capability::Pediatrics),
        rule(
            &["brain", "stroke", "coma", r"head\s+injury", r"head\s+injuries"],
            &["neuro"],
            Capability::Neurosurgery,
        ),
        rule(&[], &["burn"], Capability::BurnUnit),
        rule(&["eye", "vision"], &["ophthal"], Capability::Ophthalmology),
    ]
});

/// Case-insensitive pattern: `words` closed at a word end, `stems` left open.
fn keyword_pattern(words: &[&str], stems: &[&str]) -> String {
    let mut alternatives = Vec::with_capacity(stems.len() + 1);
    if !words.is_empty() {
        alternatives.push(format!(r"(?:{})s?\b", words.join("|")));
    }
    alternatives.extend(stems.iter().map(|s| s.to_string()));
    format!(r"(?i)\b(?:{})", alternatives.join("|"))
}

fn rule(words: &[&str], stems: &[&str], capability: Capability) -> ServiceRule {
    ServiceRule {
        regex: Regex::new(&keyword_pattern(words, stems)).expect("Invalid service keyword pattern"),
        capability,
    }
}

/// Lowercased text blob of every patient's symptoms, trauma history and chronic conditions.
fn case_text(case: &Case) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for patient in &case.patients {
        parts.extend(patient.symptoms.iter().map(String::as_str));
        parts.push(patient.trauma_history.as_str());
        parts.extend(patient.chronic_conditions.iter().map(String::as_str));
    }
    parts.join(" ").to_lowercase()
}

/// Capabilities implied by free text. Empty when nothing matches.
pub fn infer_from_text(text: &str) -> BTreeSet<Capability> {
    SERVICE_RULES
        .iter()
        .filter(|r| r.regex.is_match(text))
        .map(|r| r.capability)
        .collect()
}

pub fn required_services(case: &Case) -> BTreeSet<Capability> {
    infer_from_text(&case_text(case))
}

/// Union of required services over a group of cases.
pub fn required_services_for<'a, I>(cases: I) -> BTreeSet<Capability>
where
    I: IntoIterator<Item = &'a Case>,
{
    cases.into_iter().flat_map(required_services).collect()
}
