use std::collections::HashMap;

use super::services::required_services_for;
use super::types::{worst_severity_of, Case, Cluster};

/// Groups cases by exact place label.
///
/// Clusters come out in order of first appearance of their label. The centroid
/// is the plain mean of member latitudes and longitudes.
pub fn cluster_cases(cases: &[Case]) -> Vec<Cluster> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Case>> = Vec::new();

    for case in cases {
        match index.get(case.place.as_str()) {
            Some(&i) => groups[i].push(case),
            None => {
                index.insert(case.place.as_str(), groups.len());
                groups.push(vec![case]);
            }
        }
    }

    groups.into_iter().map(build_cluster).collect()
}

fn build_cluster(members: Vec<&Case>) -> Cluster {
    let n = members.len() as f64;
    let latitude = members.iter().map(|c| c.latitude).sum::<f64>() / n;
    let longitude = members.iter().map(|c| c.longitude).sum::<f64>() / n;

    Cluster {
        place: members[0].place.clone(),
        latitude,
        longitude,
        case_ids: members.iter().map(|c| c.id.clone()).collect(),
        total_victims: members.iter().map(|c| c.patient_count()).sum(),
        required_services: required_services_for(members.iter().copied()),
        worst_severity: worst_severity_of(members.iter().map(|c| c.severity)),
    }
}
