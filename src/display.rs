use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dispatch::{occupancy, sort_by_severity, AssignmentRun, AssignmentTier, Case, Hospital};
use crate::error::DispatchError;

/// Formats a hospital reference for a case
pub fn format_destination(hospital_id: Option<&str>) -> String {
    hospital_id.unwrap_or("UNASSIGNED").to_string()
}

fn tier_label(tier: Option<AssignmentTier>) -> &'static str {
    match tier {
        Some(AssignmentTier::Preferred) => "full match",
        Some(AssignmentTier::CapacityOnly) => "capacity only",
        Some(AssignmentTier::Nearest) => "OVER CAPACITY",
        None => "-",
    }
}

/// One line per case: `<id> [<SEVERITY>] <place> -> <hospital>`
pub fn format_case_line(case: &Case) -> String {
    format!(
        "{} [{}] {} -> {}",
        case.id,
        case.severity,
        case.place,
        format_destination(case.assigned_hospital.as_deref())
    )
}

/// Writes the assigned cases to a file, one line per case in input order
pub fn write_assignment_to_file<P: AsRef<Path>>(
    run: &AssignmentRun,
    path: P,
) -> Result<(), DispatchError> {
    let mut file = File::create(path)?;

    writeln!(file, "** Hospital assignments ({} cases) **", run.cases.len())?;
    for case in &run.cases {
        writeln!(file, "{}", format_case_line(case))?;
    }

    Ok(())
}

/// Prints an assignment run in a readable format
pub fn print_assignment(run: &AssignmentRun, hospitals: &[Hospital]) {
    println!("\n=== Cluster Decisions (claim order) ===");
    for decision in &run.decisions {
        let services: Vec<&str> = decision.required_services.iter().map(|c| c.key()).collect();
        let distance = decision
            .distance_km
            .map(|d| format!("{:.1} km", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} ({} victims, worst {}) needs [{}] -> {} ({}, {})",
            decision.place,
            decision.total_victims,
            decision.worst_severity,
            services.join(", "),
            format_destination(decision.hospital_id.as_deref()),
            tier_label(decision.tier),
            distance
        );
    }

    println!("\n=== Hospitals ===");
    for hospital in hospitals {
        let committed = run.committed_to(&hospital.id);
        let over = if committed > hospital.emergency_beds.available { "  ⚠️  over capacity" } else { "" };
        println!(
            "  {} {}: occupancy {}%, {} of {} ER beds free, {} incoming{}",
            hospital.id,
            hospital.name,
            occupancy(hospital),
            hospital.emergency_beds.available,
            hospital.emergency_beds.total,
            committed,
            over
        );
    }

    let unassigned = run.cases.iter().filter(|c| c.assigned_hospital.is_none()).count();
    println!("\n=== Cases by severity ===");
    println!("Total cases: {}", run.cases.len());
    if unassigned > 0 {
        println!("⚠️  Unassigned cases: {}", unassigned);
    }
    for case in sort_by_severity(&run.cases) {
        println!("  {}", format_case_line(&case));
    }
}
