//! Human-readable recommended actions derived from an analysis.

use std::collections::BTreeMap;

use crate::blood_group::{join_groups, BloodGroup};

use super::BloodGroupPrediction;

/// Recommendation emitted when there are no donors at all.
pub const SEED_SAMPLE_DATA: &str =
    "Add sample donors to get started with blood inventory management";

/// Recommendation emitted when nothing else applies.
pub const LEVELS_OPTIMAL: &str = "Inventory levels are optimal. Continue regular monitoring.";

/// Total shortage (percentage points, summed over groups) that warrants an
/// emergency campaign.
const EMERGENCY_CAMPAIGN_THRESHOLD: f64 = 50.0;

/// Build the recommendation list for a non-empty analysis.
pub(super) fn recommendations(
    predictions: &BTreeMap<BloodGroup, BloodGroupPrediction>,
    critical: &[BloodGroup],
    seasonal_factor: f64,
) -> Vec<String> {
    let mut actions = Vec::new();

    if let Some(first) = critical.first() {
        let names = join_groups(critical);
        actions.push(format!("Focus recruitment on {names} donors"));
        actions.push(format!(
            "Send targeted notifications to {names} blood group donors"
        ));
        actions.push(format!(
            "Contact nearby hospitals about {first} blood availability"
        ));
    }

    if seasonal_factor > 1.1 {
        actions.push("Winter season: increase donation drives due to higher demand".to_string());
    } else if seasonal_factor < 0.9 {
        actions.push("Summer season: maintain regular donation schedules".to_string());
    }

    let total_shortage: f64 = predictions.values().map(|p| p.shortage).sum();
    if total_shortage > EMERGENCY_CAMPAIGN_THRESHOLD {
        actions.push("Consider an emergency blood drive campaign".to_string());
    }

    if actions.is_empty() {
        actions.push(LEVELS_OPTIMAL.to_string());
    }
    actions
}
