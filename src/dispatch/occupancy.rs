use super::types::{BedCount, Hospital};

/// Emergency-bed occupancy as a whole percentage in `0..=100`.
///
/// A hospital declaring zero beds reports 0%. Available counts above the total
/// are treated as an empty ward rather than a negative load.
pub fn occupancy(hospital: &Hospital) -> u8 {
    occupancy_of(hospital.emergency_beds)
}

pub fn occupancy_of(beds: BedCount) -> u8 {
    if beds.total == 0 {
        return 0;
    }
    let occupied = beds.total.saturating_sub(beds.available) as f64;
    let percent = (occupied / beds.total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}
