use super::types::{Case, Cluster};

/// Sorts clusters into claim order: worst severity first, then larger incidents.
/// The sort is stable, so equal clusters keep their incoming order.
pub fn prioritize(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| {
        a.worst_severity
            .cmp(&b.worst_severity)
            .then_with(|| b.total_victims.cmp(&a.total_victims))
    });
}

/// Display ordering for cases, using the same severity order as cluster claims.
pub fn sort_by_severity(cases: &[Case]) -> Vec<Case> {
    let mut sorted = cases.to_vec();
    sorted.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.patient_count().cmp(&a.patient_count()))
    });
    sorted
}
