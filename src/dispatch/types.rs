use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Urgency tier of a patient or incident. Lower rank is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical = 0,
    Severe = 1,
    Moderate = 2,
    Mild = 3,
}

impl Severity {
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Parses a severity label, defaulting to moderate for anything unrecognized
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "severe" => Severity::Severe,
            "mild" => Severity::Mild,
            _ => Severity::Moderate,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Severe => "severe",
            Severity::Moderate => "moderate",
            Severity::Mild => "mild",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consciousness {
    #[default]
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl Consciousness {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "verbal" | "confused" => Consciousness::Verbal,
            "pain" => Consciousness::Pain,
            "unresponsive" | "unconscious" => Consciousness::Unresponsive,
            _ => Consciousness::Alert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breathing {
    #[default]
    Normal,
    Labored,
    Absent,
}

impl Breathing {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "labored" | "laboured" | "difficult" => Breathing::Labored,
            "absent" | "none" | "not breathing" => Breathing::Absent,
            _ => Breathing::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceStatus {
    #[default]
    Pending,
    Dispatched,
    OnScene,
    Transporting,
}

impl AmbulanceStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace(' ', "_").as_str() {
            "dispatched" | "en_route" => AmbulanceStatus::Dispatched,
            "on_scene" => AmbulanceStatus::OnScene,
            "transporting" => AmbulanceStatus::Transporting,
            _ => AmbulanceStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub age: u32,
    pub symptoms: Vec<String>,
    pub severity: Severity,
    pub consciousness: Consciousness,
    pub breathing: Breathing,
    pub trauma_history: String,
    pub chronic_conditions: Vec<String>,
    pub pain_score: u8,
}

/// One reported incident with its patients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub reported_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub place: String,
    pub patients: Vec<Patient>,
    pub severity: Severity,
    pub victim_count: u32,
    pub ambulance_status: AmbulanceStatus,
    pub assigned_hospital: Option<String>,
}

impl Case {
    /// Builds an unassigned case, deriving aggregate severity and victim count from the patients.
    pub fn new(
        id: impl Into<String>,
        reported_at: DateTime<Utc>,
        (latitude, longitude): (f64, f64),
        place: impl Into<String>,
        patients: Vec<Patient>,
        ambulance_status: AmbulanceStatus,
    ) -> Self {
        let severity = worst_severity_of(patients.iter().map(|p| p.severity));
        let victim_count = patients.len() as u32;
        Case {
            id: id.into(),
            reported_at,
            latitude,
            longitude,
            place: place.into(),
            patients,
            severity,
            victim_count,
            ambulance_status,
            assigned_hospital: None,
        }
    }

    pub fn patient_count(&self) -> u32 {
        self.patients.len() as u32
    }
}

/// Worst (lowest-ranked) severity; mild when there is nothing to rank.
pub fn worst_severity_of<I>(severities: I) -> Severity
where
    I: IntoIterator<Item = Severity>,
{
    severities.into_iter().min().unwrap_or(Severity::Mild)
}

/// Medical service a hospital may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Trauma,
    Cardiology,
    Pediatrics,
    Neurosurgery,
    Radiology,
    Laboratory,
    Pharmacy,
    BurnUnit,
    Orthopedics,
    Ophthalmology,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Trauma,
        Capability::Cardiology,
        Capability::Pediatrics,
        Capability::Neurosurgery,
        Capability::Radiology,
        Capability::Laboratory,
        Capability::Pharmacy,
        Capability::BurnUnit,
        Capability::Orthopedics,
        Capability::Ophthalmology,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Capability::Trauma => "trauma",
            Capability::Cardiology => "cardiology",
            Capability::Pediatrics => "pediatrics",
            Capability::Neurosurgery => "neurosurgery",
            Capability::Radiology => "radiology",
            Capability::Laboratory => "laboratory",
            Capability::Pharmacy => "pharmacy",
            Capability::BurnUnit => "burn_unit",
            Capability::Orthopedics => "orthopedics",
            Capability::Ophthalmology => "ophthalmology",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Service flags declared by a hospital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HospitalServices {
    pub trauma: bool,
    pub cardiology: bool,
    pub pediatrics: bool,
    pub neurosurgery: bool,
    pub radiology: bool,
    pub laboratory: bool,
    pub pharmacy: bool,
    pub burn_unit: bool,
    pub orthopedics: bool,
    pub ophthalmology: bool,
}

impl HospitalServices {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Trauma => self.trauma,
            Capability::Cardiology => self.cardiology,
            Capability::Pediatrics => self.pediatrics,
            Capability::Neurosurgery => self.neurosurgery,
            Capability::Radiology => self.radiology,
            Capability::Laboratory => self.laboratory,
            Capability::Pharmacy => self.pharmacy,
            Capability::BurnUnit => self.burn_unit,
            Capability::Orthopedics => self.orthopedics,
            Capability::Ophthalmology => self.ophthalmology,
        }
    }

    pub fn set(&mut self, capability: Capability, value: bool) {
        let flag = match capability {
            Capability::Trauma => &mut self.trauma,
            Capability::Cardiology => &mut self.cardiology,
            Capability::Pediatrics => &mut self.pediatrics,
            Capability::Neurosurgery => &mut self.neurosurgery,
            Capability::Radiology => &mut self.radiology,
            Capability::Laboratory => &mut self.laboratory,
            Capability::Pharmacy => &mut self.pharmacy,
            Capability::BurnUnit => &mut self.burn_unit,
            Capability::Orthopedics => &mut self.orthopedics,
            Capability::Ophthalmology => &mut self.ophthalmology,
        };
        *flag = value;
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.set(capability, true);
        self
    }

    pub fn satisfies(&self, required: &BTreeSet<Capability>) -> bool {
        required.iter().all(|c| self.has(*c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BedCount {
    pub available: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub emergency_beds: BedCount,
    pub icu_beds: BedCount,
    pub services: HospitalServices,
}

/// Cases sharing one place label, claiming capacity as a unit
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub case_ids: Vec<String>,
    pub total_victims: u32,
    pub required_services: BTreeSet<Capability>,
    pub worst_severity: Severity,
}
