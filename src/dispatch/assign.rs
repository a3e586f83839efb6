use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cluster::cluster_cases;
use super::geo::distance_km;
use super::priority::prioritize;
use super::types::{Capability, Case, Cluster, Hospital, Severity};

/// Which step of the fallback search picked the hospital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentTier {
    /// Enough remaining beds and every required service
    Preferred,
    /// Enough remaining beds, services ignored
    CapacityOnly,
    /// Nearest hospital regardless of capacity
    Nearest,
}

/// Outcome for one cluster, in claim order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub place: String,
    pub case_ids: Vec<String>,
    pub total_victims: u32,
    pub worst_severity: Severity,
    pub required_services: BTreeSet<Capability>,
    pub hospital_id: Option<String>,
    pub tier: Option<AssignmentTier>,
    pub distance_km: Option<f64>,
}

/// Everything one assignment pass produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRun {
    /// Input cases in input order, annotated with their hospital
    pub cases: Vec<Case>,
    pub decisions: Vec<ClusterAssignment>,
    /// Victims committed per hospital id during this pass
    pub committed: BTreeMap<String, u32>,
}

impl AssignmentRun {
    pub fn committed_to(&self, hospital_id: &str) -> u32 {
        self.committed.get(hospital_id).copied().unwrap_or(0)
    }

    pub fn forced_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.tier == Some(AssignmentTier::Nearest))
            .count()
    }
}

/// Victims committed to each hospital within a single run. Never outlives the run.
#[derive(Debug, Default)]
struct CapacityLedger<'h> {
    committed: HashMap<&'h str, u32>,
}

impl<'h> CapacityLedger<'h> {
    fn committed(&self, hospital: &Hospital) -> u32 {
        self.committed.get(hospital.id.as_str()).copied().unwrap_or(0)
    }

    /// Declared available emergency beds minus what this run already sent there.
    fn remaining(&self, hospital: &Hospital) -> i64 {
        hospital.emergency_beds.available as i64 - self.committed(hospital) as i64
    }

    fn has_room(&self, hospital: &Hospital, victims: u32) -> bool {
        self.remaining(hospital) >= victims as i64
    }

    fn commit(&mut self, hospital: &'h Hospital, victims: u32) {
        *self.committed.entry(hospital.id.as_str()).or_insert(0) += victims;
    }

    fn into_map(self) -> BTreeMap<String, u32> {
        self.committed
            .into_iter()
            .map(|(id, n)| (id.to_string(), n))
            .collect()
    }
}

/// Hospitals ordered by distance to the cluster centroid. Ties keep list order.
fn rank_by_distance<'h>(cluster: &Cluster, hospitals: &'h [Hospital]) -> Vec<(&'h Hospital, f64)> {
    let mut ranked: Vec<(&Hospital, f64)> = hospitals
        .iter()
        .map(|h| {
            let d = distance_km(cluster.latitude, cluster.longitude, h.latitude, h.longitude);
            (h, d)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

fn select_hospital<'h>(
    cluster: &Cluster,
    ranked: &[(&'h Hospital, f64)],
    ledger: &CapacityLedger<'h>,
) -> Option<(&'h Hospital, f64, AssignmentTier)> {
    let victims = cluster.total_victims;

    let preferred = ranked.iter().find(|(h, _)| {
        ledger.has_room(h, victims) && h.services.satisfies(&cluster.required_services)
    });
    if let Some(&(h, d)) = preferred {
        return Some((h, d, AssignmentTier::Preferred));
    }

    if let Some(&(h, d)) = ranked.iter().find(|(h, _)| ledger.has_room(h, victims)) {
        return Some((h, d, AssignmentTier::CapacityOnly));
    }

    ranked.first().map(|&(h, d)| (h, d, AssignmentTier::Nearest))
}

/// Runs clustering, prioritization and capacity-aware selection over one snapshot.
///
/// Neither input is modified. With no hospitals every case comes back unassigned.
pub fn run_assignment(cases: &[Case], hospitals: &[Hospital]) -> AssignmentRun {
    let mut clusters = cluster_cases(cases);
    prioritize(&mut clusters);

    let mut ledger = CapacityLedger::default();
    let mut decisions = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        let ranked = rank_by_distance(&cluster, hospitals);
        let selected = select_hospital(&cluster, &ranked, &ledger);

        if let Some((hospital, distance, tier)) = selected {
            ledger.commit(hospital, cluster.total_victims);
            match tier {
                AssignmentTier::Nearest => warn!(
                    place = %cluster.place,
                    hospital = %hospital.id,
                    victims = cluster.total_victims,
                    remaining = ledger.remaining(hospital),
                    "No hospital has room; sending cluster to nearest over capacity"
                ),
                _ => debug!(
                    place = %cluster.place,
                    hospital = %hospital.id,
                    ?tier,
                    distance_km = distance,
                    victims = cluster.total_victims,
                    "Cluster assigned"
                ),
            }
        }

        decisions.push(ClusterAssignment {
            hospital_id: selected.map(|(h, _, _)| h.id.clone()),
            tier: selected.map(|(_, _, t)| t),
            distance_km: selected.map(|(_, d, _)| d),
            place: cluster.place,
            case_ids: cluster.case_ids,
            total_victims: cluster.total_victims,
            worst_severity: cluster.worst_severity,
            required_services: cluster.required_services,
        });
    }

    let by_place: HashMap<&str, Option<&str>> = decisions
        .iter()
        .map(|d| (d.place.as_str(), d.hospital_id.as_deref()))
        .collect();
    let assigned = project(cases, &by_place);

    let run = AssignmentRun {
        cases: assigned,
        decisions,
        committed: ledger.into_map(),
    };
    info!(
        cases = cases.len(),
        hospitals = hospitals.len(),
        clusters = run.decisions.len(),
        forced = run.forced_count(),
        "Assignment run complete"
    );
    run
}

/// Copies every case with its cluster's hospital. Output order matches input order.
fn project(cases: &[Case], by_place: &HashMap<&str, Option<&str>>) -> Vec<Case> {
    cases
        .iter()
        .map(|case| {
            let mut assigned = case.clone();
            assigned.assigned_hospital = by_place
                .get(case.place.as_str())
                .copied()
                .flatten()
                .map(str::to_string);
            assigned
        })
        .collect()
}

/// Assigns every case to a receiving hospital.
pub fn assign(cases: &[Case], hospitals: &[Hospital]) -> Vec<Case> {
    run_assignment(cases, hospitals).cases
}
