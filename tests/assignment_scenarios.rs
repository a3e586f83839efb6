use std::collections::{BTreeSet, HashMap};

use chrono::{TimeZone, Utc};
use hospital_dispatch::dispatch::{
    infer_from_text, AmbulanceStatus, AssignmentTier, BedCount, Breathing, Capability, Case,
    Consciousness, Hospital, HospitalServices, Patient, Severity,
};
use hospital_dispatch::{assign, occupancy, run_assignment};

fn patient(severity: Severity, symptoms: &[&str]) -> Patient {
    Patient {
        age: 45,
        symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        severity,
        consciousness: Consciousness::Alert,
        breathing: Breathing::Normal,
        trauma_history: String::new(),
        chronic_conditions: Vec::new(),
        pain_score: 4,
    }
}

fn case(id: &str, place: &str, at: (f64, f64), patients: Vec<Patient>) -> Case {
    let reported = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
    Case::new(id, reported, at, place, patients, AmbulanceStatus::Dispatched)
}

fn hospital(id: &str, at: (f64, f64), available: u32, services: HospitalServices) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: id.to_string(),
        latitude: at.0,
        longitude: at.1,
        emergency_beds: BedCount { available, total: available + 5 },
        icu_beds: BedCount { available: 1, total: 4 },
        services,
    }
}

#[test]
fn cardiology_cluster_skips_nearer_list_order_for_capable_hospital() {
    let cases = vec![
        case(
            "a",
            "Riverside Mall",
            (0.0, 0.0),
            vec![
                patient(Severity::Critical, &["cardiac arrest"]),
                patient(Severity::Severe, &["chest pain"]),
                patient(Severity::Moderate, &["anxiety"]),
            ],
        ),
        case("b", "Bus Depot", (0.0, 0.0), vec![patient(Severity::Mild, &["sprained ankle"])]),
    ];
    let hospitals = vec![
        hospital("H1", (0.0, 0.1), 2, HospitalServices::default()),
        hospital("H2", (0.1, 0.0), 5, HospitalServices::default().with(Capability::Cardiology)),
    ];

    let run = run_assignment(&cases, &hospitals);

    assert_eq!(run.decisions[0].place, "Riverside Mall");
    assert_eq!(run.decisions[0].hospital_id.as_deref(), Some("H2"));
    assert_eq!(run.decisions[0].tier, Some(AssignmentTier::Preferred));
    assert_eq!(run.cases[0].assigned_hospital.as_deref(), Some("H2"));
    assert_eq!(run.cases[1].assigned_hospital.as_deref(), Some("H1"));
}

#[test]
fn critical_cluster_claims_last_bed_and_mild_is_forced() {
    // Mild cluster is listed first; severity decides who claims the bed.
    let cases = vec![
        case("mild", "Park", (0.0, 0.0), vec![patient(Severity::Mild, &["bruise"])]),
        case("crit", "Plaza", (0.0, 0.0), vec![patient(Severity::Critical, &["collapsed"])]),
    ];
    let hospitals = vec![hospital("only", (0.0, 0.05), 1, HospitalServices::default())];

    let run = run_assignment(&cases, &hospitals);

    assert_eq!(run.decisions[0].place, "Plaza");
    assert_eq!(run.decisions[0].tier, Some(AssignmentTier::Preferred));
    assert_eq!(run.decisions[1].place, "Park");
    assert_eq!(run.decisions[1].tier, Some(AssignmentTier::Nearest));
    assert!(run
        .cases
        .iter()
        .all(|c| c.assigned_hospital.as_deref() == Some("only")));
    assert_eq!(run.committed_to("only"), 2);
    assert_eq!(run.forced_count(), 1);
}

#[test]
fn empty_hospital_list_leaves_every_case_unassigned() {
    let cases = vec![
        case("1", "A", (0.0, 0.0), vec![patient(Severity::Critical, &["stroke"])]),
        case("2", "B", (1.0, 1.0), vec![patient(Severity::Mild, &["cough"])]),
        case("3", "A", (0.0, 0.0), vec![patient(Severity::Severe, &["fracture"])]),
    ];
    let out = assign(&cases, &[]);
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|c| c.assigned_hospital.is_none()));
}

#[test]
fn symptom_text_infers_cardiology_and_trauma() {
    assert_eq!(
        infer_from_text("Cardiac arrest, severe bleeding"),
        BTreeSet::from([Capability::Cardiology, Capability::Trauma])
    );
}

#[test]
fn assignment_is_idempotent() {
    let cases: Vec<Case> = (0..12)
        .map(|i| {
            let place = format!("Block {}", i % 5);
            let severity = [Severity::Critical, Severity::Severe, Severity::Moderate, Severity::Mild][i % 4];
            let at = (0.01 * (i % 5) as f64, -0.01 * (i % 3) as f64);
            case(&format!("c{i}"), &place, at, vec![patient(severity, &["bleeding"]); 1 + i % 3])
        })
        .collect();
    let hospitals = vec![
        hospital("A", (0.0, 0.0), 4, HospitalServices::default().with(Capability::Trauma)),
        hospital("B", (0.03, 0.0), 6, HospitalServices::default()),
        hospital("C", (0.05, -0.02), 3, HospitalServices::default().with(Capability::Trauma)),
    ];

    let first = assign(&cases, &hospitals);
    let second = assign(&cases, &hospitals);
    assert_eq!(first, second);
}

#[test]
fn non_forced_assignments_always_fit_remaining_capacity() {
    let cases: Vec<Case> = (0..20)
        .map(|i| {
            let severity = [Severity::Mild, Severity::Critical, Severity::Severe][i % 3];
            case(
                &format!("c{i}"),
                &format!("Site {}", i % 7),
                (0.02 * (i % 4) as f64, 0.01 * (i % 6) as f64),
                vec![patient(severity, &["broken leg"]); 1 + i % 4],
            )
        })
        .collect();
    let hospitals = vec![
        hospital("N", (0.0, 0.0), 5, HospitalServices::default().with(Capability::Orthopedics)),
        hospital("E", (0.0, 0.05), 7, HospitalServices::default()),
        hospital("S", (-0.04, 0.0), 2, HospitalServices::default().with(Capability::Orthopedics)),
    ];
    let available: HashMap<&str, u32> = hospitals
        .iter()
        .map(|h| (h.id.as_str(), h.emergency_beds.available))
        .collect();

    let run = run_assignment(&cases, &hospitals);

    let mut used: HashMap<String, u32> = HashMap::new();
    for decision in &run.decisions {
        let id = decision.hospital_id.clone().expect("hospitals exist");
        let before = *used.get(&id).unwrap_or(&0);
        if decision.tier != Some(AssignmentTier::Nearest) {
            assert!(
                available[id.as_str()] as i64 - before as i64 >= decision.total_victims as i64,
                "{} overfilled {}",
                decision.place,
                id
            );
        }
        used.insert(id, before + decision.total_victims);
    }

    let total: u32 = cases.iter().map(|c| c.patient_count()).sum();
    assert_eq!(run.committed.values().sum::<u32>(), total);
}

#[test]
fn occupancy_is_derived_from_beds() {
    let mut h = hospital("H", (0.0, 0.0), 3, HospitalServices::default());
    h.emergency_beds = BedCount { available: 3, total: 12 };
    assert_eq!(occupancy(&h), 75);

    h.emergency_beds = BedCount { available: 0, total: 0 };
    assert_eq!(occupancy(&h), 0);
}
