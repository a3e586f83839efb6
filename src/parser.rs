use csv::{Reader, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::dispatch::{
    AmbulanceStatus, BedCount, Breathing, Capability, Case, Consciousness, Hospital,
    HospitalServices, Patient, Severity,
};
use crate::error::DispatchError;

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1"
}

/// Parses a number, returning 0 if empty or invalid
fn parse_number(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

/// Parses a finite coordinate, None if empty or invalid
fn parse_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Splits a `;`-separated list, dropping blanks
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Finds a column whose header contains `name` (case-insensitive)
fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().to_lowercase().contains(name))
}

fn field<'r>(record: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

fn row_number(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Case fields collected while its patient rows are still being read
struct PendingCase {
    id: String,
    reported_at: DateTime<Utc>,
    coordinates: (f64, f64),
    place: String,
    ambulance_status: AmbulanceStatus,
    patients: Vec<Patient>,
}

/// Loads cases from a CSV file with one row per patient
pub fn load_cases<P: AsRef<Path>>(
    csv_path: P,
    city_center: (f64, f64),
) -> Result<Vec<Case>, DispatchError> {
    let file = std::fs::File::open(csv_path)?;
    load_cases_from_reader(file, city_center)
}

/// Loads cases from CSV data.
///
/// Rows sharing a case id are merged into one case; the first row supplies the
/// case-level fields. Missing coordinates fall back to `city_center`.
pub fn load_cases_from_reader<R: Read>(
    source: R,
    city_center: (f64, f64),
) -> Result<Vec<Case>, DispatchError> {
    let mut reader = Reader::from_reader(source);
    let headers = reader.headers()?.clone();
    let loaded_at = Utc::now();

    let id_col = column(&headers, "case_id").or(Some(0));
    let reported_col = column(&headers, "reported_at");
    let place_col = column(&headers, "place");
    let lat_col = column(&headers, "latitude");
    let lon_col = column(&headers, "longitude");
    let ambulance_col = column(&headers, "ambulance");
    let age_col = column(&headers, "age");
    let symptoms_col = column(&headers, "symptom");
    let severity_col = column(&headers, "severity");
    let consciousness_col = column(&headers, "conscious");
    let breathing_col = column(&headers, "breathing");
    let trauma_col = column(&headers, "trauma");
    let chronic_col = column(&headers, "chronic");
    let pain_col = column(&headers, "pain");

    // Track cases by id so later patient rows join the earlier case
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<PendingCase> = Vec::new();

    for result in reader.records() {
        let record = result?;

        let id = field(&record, id_col).to_string();
        let place = field(&record, place_col).to_string();
        if id.is_empty() || place.is_empty() {
            warn!(row = row_number(&record), "Skipping case row without id or place");
            continue;
        }

        let patient = Patient {
            age: parse_number(field(&record, age_col)),
            symptoms: parse_list(field(&record, symptoms_col)),
            severity: Severity::from_label(field(&record, severity_col)),
            consciousness: Consciousness::from_label(field(&record, consciousness_col)),
            breathing: Breathing::from_label(field(&record, breathing_col)),
            trauma_history: field(&record, trauma_col).to_string(),
            chronic_conditions: parse_list(field(&record, chronic_col)),
            pain_score: parse_number(field(&record, pain_col)).min(10) as u8,
        };

        if let Some(&i) = index.get(&id) {
            pending[i].patients.push(patient);
            continue;
        }

        let coordinates = match (
            parse_coordinate(field(&record, lat_col)),
            parse_coordinate(field(&record, lon_col)),
        ) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                warn!(case = %id, "No usable coordinates; using city center");
                city_center
            }
        };

        index.insert(id.clone(), pending.len());
        pending.push(PendingCase {
            id,
            reported_at: parse_timestamp(field(&record, reported_col)).unwrap_or(loaded_at),
            coordinates,
            place,
            ambulance_status: AmbulanceStatus::from_label(field(&record, ambulance_col)),
            patients: vec![patient],
        });
    }

    Ok(pending
        .into_iter()
        .map(|p| Case::new(p.id, p.reported_at, p.coordinates, p.place, p.patients, p.ambulance_status))
        .collect())
}

/// Loads the hospital registry from a CSV file
pub fn load_hospitals<P: AsRef<Path>>(
    csv_path: P,
    city_center: (f64, f64),
) -> Result<Vec<Hospital>, DispatchError> {
    let file = std::fs::File::open(csv_path)?;
    load_hospitals_from_reader(file, city_center)
}

/// Loads hospitals from CSV data. A repeated id replaces the earlier row in place.
///
/// Any occupancy column is ignored; occupancy is always derived from bed counts.
pub fn load_hospitals_from_reader<R: Read>(
    source: R,
    city_center: (f64, f64),
) -> Result<Vec<Hospital>, DispatchError> {
    let mut reader = Reader::from_reader(source);
    let headers = reader.headers()?.clone();

    let exact = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let id_col = exact("id").or(Some(0));
    let name_col = exact("name");
    let lat_col = column(&headers, "latitude");
    let lon_col = column(&headers, "longitude");
    let er_available_col = column(&headers, "emergency_beds_available");
    let er_total_col = column(&headers, "emergency_beds_total");
    let icu_available_col = column(&headers, "icu_beds_available");
    let icu_total_col = column(&headers, "icu_beds_total");
    let capability_cols: Vec<(Capability, Option<usize>)> = Capability::ALL
        .iter()
        .map(|c| (*c, exact(c.key())))
        .collect();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut hospitals: Vec<Hospital> = Vec::new();

    for result in reader.records() {
        let record = result?;

        let id = field(&record, id_col).to_string();
        if id.is_empty() {
            warn!(row = row_number(&record), "Skipping hospital row without id");
            continue;
        }

        let (latitude, longitude) = match (
            parse_coordinate(field(&record, lat_col)),
            parse_coordinate(field(&record, lon_col)),
        ) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                warn!(hospital = %id, "No usable coordinates; using city center");
                city_center
            }
        };

        let mut services = HospitalServices::default();
        for (capability, col) in &capability_cols {
            services.set(*capability, parse_bool(field(&record, *col)));
        }

        let hospital = Hospital {
            id: id.clone(),
            name: field(&record, name_col).to_string(),
            latitude,
            longitude,
            emergency_beds: BedCount {
                available: parse_number(field(&record, er_available_col)),
                total: parse_number(field(&record, er_total_col)),
            },
            icu_beds: BedCount {
                available: parse_number(field(&record, icu_available_col)),
                total: parse_number(field(&record, icu_total_col)),
            },
            services,
        };

        match index.get(&id) {
            Some(&i) => hospitals[i] = hospital,
            None => {
                index.insert(id, hospitals.len());
                hospitals.push(hospital);
            }
        }
    }

    Ok(hospitals)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: (f64, f64) = (40.7128, -74.0060);

    const CASES_CSV: &str = "\
case_id,reported_at,place,latitude,longitude,ambulance_status,age,symptoms,severity,consciousness,breathing,trauma_history,chronic_conditions,pain_score
c1,2024-05-01T10:00:00Z,Harbor Bridge,40.70,-74.00,dispatched,54,chest pain;shortness of breath,critical,verbal,labored,,hypertension,8
c2,2024-05-01T10:05:00Z,Old Market,,,pending,8,broken wrist,moderate,alert,normal,fell from bike,,6
c1,2024-05-01T10:00:00Z,Harbor Bridge,40.70,-74.00,dispatched,31,cut on arm,mild,alert,normal,,,14
,2024-05-01T10:06:00Z,Nowhere,1,1,pending,20,cough,mild,alert,normal,,,1
c3,not a date,Old Market,40.71,-74.01,on scene,70,dizzy,unknown,alert,normal,,diabetes,2
";

    #[test]
    fn merges_patient_rows_by_case_id() {
        let cases = load_cases_from_reader(CASES_CSV.as_bytes(), CENTER).unwrap();
        let ids: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        let c1 = &cases[0];
        assert_eq!(c1.patients.len(), 2);
        assert_eq!(c1.victim_count, 2);
        assert_eq!(c1.severity, Severity::Critical);
        assert_eq!(c1.ambulance_status, AmbulanceStatus::Dispatched);
        assert_eq!(c1.patients[0].symptoms, vec!["chest pain", "shortness of breath"]);
        assert_eq!(c1.patients[0].breathing, Breathing::Labored);
        assert_eq!(c1.patients[0].chronic_conditions, vec!["hypertension"]);
        assert_eq!(c1.patients[1].pain_score, 10);
        assert!(c1.assigned_hospital.is_none());
    }

    #[test]
    fn defaults_for_missing_fields() {
        let cases = load_cases_from_reader(CASES_CSV.as_bytes(), CENTER).unwrap();

        let c2 = &cases[1];
        assert_eq!((c2.latitude, c2.longitude), CENTER);
        assert_eq!(c2.patients[0].trauma_history, "fell from bike");

        let c3 = &cases[2];
        assert_eq!(c3.severity, Severity::Moderate);
        assert_eq!(c3.ambulance_status, AmbulanceStatus::OnScene);
        assert!(c3.reported_at > cases[0].reported_at);
    }

    #[test]
    fn empty_file_has_no_cases() {
        let header = "case_id,place,latitude,longitude\n";
        assert!(load_cases_from_reader(header.as_bytes(), CENTER).unwrap().is_empty());
    }

    const HOSPITALS_CSV: &str = "\
id,name,latitude,longitude,emergency_beds_available,emergency_beds_total,icu_beds_available,icu_beds_total,trauma,cardiology,pediatrics,neurosurgery,radiology,laboratory,pharmacy,burn_unit,orthopedics,ophthalmology,occupancy
H1,Mercy,40.72,-74.01,4,20,1,5,yes,no,no,no,yes,yes,yes,no,yes,no,99
H2,St. Luke,40.75,-73.98,10,10,2,2,no,true,1,no,no,no,no,no,no,no,0
,Ghost,0,0,1,1,0,0,no,no,no,no,no,no,no,no,no,no,0
H1,Mercy East,40.72,-74.01,3,20,1,5,yes,yes,no,no,yes,yes,yes,no,yes,no,5
";

    #[test]
    fn loads_hospitals_and_replaces_repeats() {
        let hospitals = load_hospitals_from_reader(HOSPITALS_CSV.as_bytes(), CENTER).unwrap();
        assert_eq!(hospitals.len(), 2);

        let h1 = &hospitals[0];
        assert_eq!(h1.name, "Mercy East");
        assert_eq!(h1.emergency_beds, BedCount { available: 3, total: 20 });
        assert!(h1.services.trauma && h1.services.cardiology && h1.services.orthopedics);
        assert!(!h1.services.burn_unit);

        let h2 = &hospitals[1];
        assert!(h2.services.cardiology && h2.services.pediatrics);
        assert!(!h2.services.trauma);
        assert_eq!(crate::dispatch::occupancy(h2), 0);
        assert_eq!(crate::dispatch::occupancy(h1), 85);
    }
}
