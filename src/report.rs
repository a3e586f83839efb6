use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::{AmbulanceStatus, Breathing, Case, Consciousness, Patient, Severity};
use crate::error::DispatchError;

/// Patient entry of an incoming report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientReport {
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub severity: Severity,
    #[serde(default)]
    pub consciousness: Consciousness,
    #[serde(default)]
    pub breathing: Breathing,
    #[serde(default)]
    pub trauma_history: String,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub pain_score: u8,
}

/// Incident report as posted by a field unit or upstream feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    pub id: String,
    pub reported_at: Option<DateTime<Utc>>,
    pub place: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub ambulance_status: AmbulanceStatus,
    pub patients: Vec<PatientReport>,
}

/// Validates an incident report
pub fn validate_report(report: &IncidentReport) -> Result<(), DispatchError> {
    if report.id.trim().is_empty() {
        return Err(DispatchError::InvalidReport("Case id is required".to_string()));
    }
    if report.place.trim().is_empty() {
        return Err(DispatchError::InvalidReport("Place is required".to_string()));
    }
    if report.patients.is_empty() {
        return Err(DispatchError::InvalidReport(
            "At least one patient is required".to_string(),
        ));
    }
    for (i, patient) in report.patients.iter().enumerate() {
        if patient.pain_score > 10 {
            return Err(DispatchError::InvalidReport(format!(
                "Patient {}: pain score must be 0-10, got {}",
                i + 1,
                patient.pain_score
            )));
        }
    }
    for (name, value) in [("latitude", report.latitude), ("longitude", report.longitude)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(DispatchError::InvalidReport(format!("Invalid {}", name)));
            }
        }
    }
    Ok(())
}

impl IncidentReport {
    /// Normalizes a validated report into an unassigned case.
    pub fn into_case(self, city_center: (f64, f64)) -> Case {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => city_center,
        };
        let patients = self
            .patients
            .into_iter()
            .map(|p| Patient {
                age: p.age,
                symptoms: p.symptoms,
                severity: p.severity,
                consciousness: p.consciousness,
                breathing: p.breathing,
                trauma_history: p.trauma_history,
                chronic_conditions: p.chronic_conditions,
                pain_score: p.pain_score,
            })
            .collect();
        Case::new(
            self.id.trim(),
            self.reported_at.unwrap_or_else(Utc::now),
            coordinates,
            self.place.trim(),
            patients,
            self.ambulance_status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> IncidentReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn minimal_report_normalizes() {
        let r = report(json!({
            "id": "r-1",
            "place": "Ferry Terminal",
            "patients": [
                {"severity": "severe", "symptoms": ["head injury"]},
                {"severity": "critical", "consciousness": "unresponsive"}
            ]
        }));
        assert!(validate_report(&r).is_ok());

        let case = r.into_case((1.0, 2.0));
        assert_eq!((case.latitude, case.longitude), (1.0, 2.0));
        assert_eq!(case.severity, Severity::Critical);
        assert_eq!(case.victim_count, 2);
        assert_eq!(case.ambulance_status, AmbulanceStatus::Pending);
        assert_eq!(case.patients[1].consciousness, Consciousness::Unresponsive);
    }

    #[test]
    fn rejects_bad_reports() {
        let no_patients = report(json!({"id": "x", "place": "Dock", "patients": []}));
        assert!(validate_report(&no_patients).is_err());

        let no_place = report(json!({"id": "x", "place": " ", "patients": [{"severity": "mild"}]}));
        assert!(validate_report(&no_place).is_err());

        let pain = report(json!({
            "id": "x", "place": "Dock",
            "patients": [{"severity": "mild", "pain_score": 11}]
        }));
        let err = validate_report(&pain).unwrap_err();
        assert!(err.to_string().contains("pain score"));
    }

    #[test]
    fn unknown_severity_fails_to_parse() {
        let parsed: Result<IncidentReport, _> = serde_json::from_value(json!({
            "id": "x", "place": "Dock", "patients": [{"severity": "urgent"}]
        }));
        assert!(parsed.is_err());
    }
}
