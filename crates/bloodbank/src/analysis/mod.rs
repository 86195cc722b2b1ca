//! Blood inventory analysis.
//!
//! Compares the observed blood-group mix of the donor population with the
//! reference distribution, adjusts expected demand for the season and
//! classifies each group's shortage into an [`AlertPriority`].
//!
//! The analyzer is stateless: the same donors and the same seasonal factor
//! always produce an identical [`InventoryAnalysis`].
//!
//! # Example
//!
//! ```
//! use bloodbank::analysis::InventoryAnalyzer;
//! use bloodbank::{BloodGroup, DonorRecord};
//!
//! let donors: Vec<DonorRecord> = (0..100).map(|_| DonorRecord::with_group("O+")).collect();
//! let analysis = InventoryAnalyzer::new().analyze_with_factor(&donors, 1.0);
//!
//! assert_eq!(analysis.total_donors, 100);
//! assert_eq!(analysis.critical_shortages.len(), 7);
//! assert!(!analysis.critical_shortages.contains(&BloodGroup::OPos));
//! ```

mod recommend;
mod seasonal;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::Serialize;
use tracing::debug;

use crate::alert::AlertPriority;
use crate::blood_group::BloodGroup;
use crate::donor::DonorRecord;

pub use recommend::{LEVELS_OPTIMAL, SEED_SAMPLE_DATA};
pub use seasonal::{in_holiday_window, seasonal_factor, HOLIDAY_WINDOW, SEASONAL_FACTORS};

/// A group is critically short when its observed share falls below this
/// fraction of its expected share.
const CRITICAL_SHARE_RATIO: f64 = 0.5;

/// Per-group result of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodGroupPrediction {
    /// The group.
    pub blood_group: BloodGroup,
    /// Donors of this group.
    pub current_count: usize,
    /// Observed share of all donors, in percent.
    pub current_percent: f64,
    /// Reference share, in percent.
    pub expected_percent: f64,
    /// Expected share scaled by the seasonal factor.
    pub adjusted_demand: f64,
    /// `max(0, expected - observed)`, in percentage points.
    pub shortage: f64,
    /// Priority of the seasonally adjusted shortage.
    pub priority: AlertPriority,
}

/// The outcome of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryAnalysis {
    /// All donors in the snapshot, including unrecognized tags.
    pub total_donors: usize,
    /// Groups whose share is below half the expected share, canonical order.
    pub critical_shortages: Vec<BloodGroup>,
    /// Predictions for the eight groups; empty when there are no donors.
    pub predictions: BTreeMap<BloodGroup, BloodGroupPrediction>,
    /// Suggested follow-up actions.
    pub recommended_actions: Vec<String>,
    /// Seasonal factor the analysis was computed with.
    pub seasonal_factor: f64,
    /// Donors whose tag was not a canonical group.
    pub unrecognized_donors: usize,
}

impl InventoryAnalysis {
    /// Prediction for one group.
    #[must_use]
    pub fn prediction(&self, group: BloodGroup) -> Option<&BloodGroupPrediction> {
        self.predictions.get(&group)
    }

    /// Sum of shortages over all groups.
    #[must_use]
    pub fn total_shortage(&self) -> f64 {
        self.predictions.values().map(|p| p.shortage).sum()
    }

    /// Whether any group is critically short.
    #[must_use]
    pub fn has_critical_shortage(&self) -> bool {
        !self.critical_shortages.is_empty()
    }
}

/// Computes [`InventoryAnalysis`] values from donor snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryAnalyzer;

impl InventoryAnalyzer {
    /// Create an analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyze donors using the seasonal factor of `now`'s calendar month.
    #[must_use]
    pub fn analyze<Tz: TimeZone>(
        &self,
        donors: &[DonorRecord],
        now: &DateTime<Tz>,
    ) -> InventoryAnalysis {
        self.analyze_with_factor(donors, seasonal_factor(now.month()))
    }

    /// Analyze donors against the local wall clock.
    #[must_use]
    pub fn analyze_now(&self, donors: &[DonorRecord]) -> InventoryAnalysis {
        self.analyze(donors, &Local::now())
    }

    /// Analyze donors with an explicit seasonal factor.
    #[must_use]
    pub fn analyze_with_factor(
        &self,
        donors: &[DonorRecord],
        seasonal_factor: f64,
    ) -> InventoryAnalysis {
        self.analyze_tags(donors.iter().map(|d| d.blood_group.as_str()), seasonal_factor)
    }

    /// Analyze a sequence of raw blood-group tags.
    ///
    /// Only canonical tags (`O+`, `AB-`, ...) count as a group. Anything else
    /// counts toward the total, and so dilutes every group's share, but never
    /// gets a prediction of its own.
    #[must_use]
    pub fn analyze_tags<'a, I>(&self, tags: I, seasonal_factor: f64) -> InventoryAnalysis
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<BloodGroup, usize> = BTreeMap::new();
        let mut total = 0usize;
        let mut unrecognized = 0usize;

        for tag in tags {
            total += 1;
            match BloodGroup::from_canonical(tag) {
                Some(group) => *counts.entry(group).or_default() += 1,
                None => unrecognized += 1,
            }
        }

        if total == 0 {
            debug!("No donors to analyze; flagging every group as critical");
            return InventoryAnalysis {
                total_donors: 0,
                critical_shortages: BloodGroup::ALL.to_vec(),
                predictions: BTreeMap::new(),
                recommended_actions: vec![SEED_SAMPLE_DATA.to_string()],
                seasonal_factor,
                unrecognized_donors: 0,
            };
        }

        let mut critical_shortages = Vec::new();
        let mut predictions = BTreeMap::new();

        for group in BloodGroup::ALL {
            let current_count = counts.get(&group).copied().unwrap_or(0);
            let current_percent = current_count as f64 / total as f64 * 100.0;
            let expected_percent = group.expected_percent();
            let shortage = (expected_percent - current_percent).max(0.0);

            if current_percent < expected_percent * CRITICAL_SHARE_RATIO {
                critical_shortages.push(group);
            }

            predictions.insert(
                group,
                BloodGroupPrediction {
                    blood_group: group,
                    current_count,
                    current_percent,
                    expected_percent,
                    adjusted_demand: expected_percent * seasonal_factor,
                    shortage,
                    priority: AlertPriority::from_adjusted_shortage(shortage * seasonal_factor),
                },
            );
        }

        let recommended_actions =
            recommend::recommendations(&predictions, &critical_shortages, seasonal_factor);

        debug!(
            total_donors = total,
            unrecognized,
            critical = critical_shortages.len(),
            seasonal_factor,
            "Inventory analyzed"
        );

        InventoryAnalysis {
            total_donors: total,
            critical_shortages,
            predictions,
            recommended_actions,
            seasonal_factor,
            unrecognized_donors: unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn donors(groups: &[(&str, usize)]) -> Vec<DonorRecord> {
        groups.iter()
            .flat_map(|(tag, n)| std::iter::repeat_with(|| DonorRecord::with_group(*tag)).take(*n))
            .collect()
    }

    fn reference_population() -> Vec<DonorRecord> {
        donors(&[
            ("O+", 380),
            ("A+", 340),
            ("B+", 90),
            ("AB+", 30),
            ("O-", 70),
            ("A-", 60),
            ("B-", 20),
            ("AB-", 10),
        ])
    }

    #[test]
    fn test_empty_snapshot_is_degenerate() {
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&[], 1.0);

        assert_eq!(analysis.total_donors, 0);
        assert_eq!(analysis.critical_shortages, BloodGroup::ALL.to_vec());
        assert!(analysis.predictions.is_empty());
        assert_eq!(analysis.recommended_actions, vec![SEED_SAMPLE_DATA.to_string()]);
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let sets = [
            donors(&[("O+", 1)]),
            donors(&[("A-", 3), ("B+", 7), ("AB-", 11)]),
            reference_population(),
            donors(&[("O+", 13), ("O-", 17), ("AB+", 19), ("B-", 23)]),
        ];
        for set in &sets {
            let analysis = InventoryAnalyzer::new().analyze_with_factor(set, 1.1);
            let total: f64 = analysis.predictions.values().map(|p| p.current_percent).sum();
            assert!((total - 100.0).abs() < 1e-9, "sum was {total}");
        }
    }

    #[test]
    fn test_shortage_never_negative() {
        let set = donors(&[("AB-", 90), ("B-", 10)]);
        for factor in SEASONAL_FACTORS {
            let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, factor);
            assert!(analysis.predictions.values().all(|p| p.shortage >= 0.0));
        }
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);
        let ab_neg = analysis.prediction(BloodGroup::AbNeg).unwrap();
        assert!(ab_neg.shortage.abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_o_positive() {
        let set = donors(&[("O+", 100)]);
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);

        let o_pos = analysis.prediction(BloodGroup::OPos).unwrap();
        assert!((o_pos.current_percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(o_pos.current_count, 100);

        let others: Vec<BloodGroup> = BloodGroup::ALL[1..].to_vec();
        for group in &others {
            let p = analysis.prediction(*group).unwrap();
            assert!(p.current_percent.abs() < f64::EPSILON);
        }
        assert_eq!(analysis.critical_shortages, others);

        assert!(!analysis.recommended_actions.is_empty());
        let recruitment = &analysis.recommended_actions[0];
        for group in &others {
            assert!(recruitment.contains(group.as_str()), "{recruitment} lacks {group}");
        }
    }

    #[test]
    fn test_reference_population_has_no_shortage() {
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&reference_population(), 1.0);

        assert_eq!(analysis.total_donors, 1000);
        assert!(analysis.critical_shortages.is_empty());
        for p in analysis.predictions.values() {
            assert!(p.shortage.abs() < 1e-9);
            assert_eq!(p.priority, AlertPriority::Low);
        }
        assert_eq!(analysis.recommended_actions, vec![LEVELS_OPTIMAL.to_string()]);
    }

    #[test]
    fn test_priority_uses_seasonal_factor() {
        // O+ expected 38%, observed 0% => shortage 38
        let set = donors(&[("A+", 100)]);
        let summer = InventoryAnalyzer::new().analyze_with_factor(&set, 0.8);
        let winter = InventoryAnalyzer::new().analyze_with_factor(&set, 1.3);

        // A- expected 6 => adjusted 4.8 in summer (Low) and 7.8 in winter (Medium)
        assert_eq!(summer.prediction(BloodGroup::ANeg).unwrap().priority, AlertPriority::Low);
        assert_eq!(winter.prediction(BloodGroup::ANeg).unwrap().priority, AlertPriority::Medium);
        assert_eq!(
            winter.prediction(BloodGroup::OPos).unwrap().priority,
            AlertPriority::Emergency
        );
        let adjusted = winter.prediction(BloodGroup::OPos).unwrap().adjusted_demand;
        assert!((adjusted - 38.0 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_unrecognized_tags_dilute_but_are_not_keys() {
        let set = donors(&[("O+", 50), ("Z?", 50)]);
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);

        assert_eq!(analysis.total_donors, 100);
        assert_eq!(analysis.unrecognized_donors, 50);
        assert_eq!(analysis.predictions.len(), 8);
        let o_pos = analysis.prediction(BloodGroup::OPos).unwrap();
        assert!((o_pos.current_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_loose_tags_are_unrecognized() {
        let set = donors(&[("o+", 1), ("AB neg", 1), ("b positive", 1), ("O-", 1)]);
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);

        assert_eq!(analysis.total_donors, 4);
        assert_eq!(analysis.unrecognized_donors, 3);
        assert_eq!(analysis.prediction(BloodGroup::OPos).unwrap().current_count, 0);
        assert_eq!(analysis.prediction(BloodGroup::AbNeg).unwrap().current_count, 0);
        assert_eq!(analysis.prediction(BloodGroup::BPos).unwrap().current_count, 0);
        let o_neg = analysis.prediction(BloodGroup::ONeg).unwrap();
        assert_eq!(o_neg.current_count, 1);
        assert!((o_neg.current_percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unicode_minus_counts_as_canonical() {
        let set = donors(&[("AB\u{2212}", 2), ("AB-", 2)]);
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);
        assert_eq!(analysis.prediction(BloodGroup::AbNeg).unwrap().current_count, 4);
        assert_eq!(analysis.unrecognized_donors, 0);
    }

    #[test]
    fn test_seasonal_recommendations() {
        let set = reference_population();
        let winter = InventoryAnalyzer::new().analyze_with_factor(&set, 1.2);
        assert!(winter.recommended_actions[0].starts_with("Winter"));

        let summer = InventoryAnalyzer::new().analyze_with_factor(&set, 0.8);
        assert!(summer.recommended_actions[0].starts_with("Summer"));

        // 1.1 and 0.9 are neither
        let shoulder = InventoryAnalyzer::new().analyze_with_factor(&set, 1.1);
        assert_eq!(shoulder.recommended_actions, vec![LEVELS_OPTIMAL.to_string()]);
    }

    #[test]
    fn test_emergency_campaign_recommendation() {
        // all O- => every other group short, total shortage 93
        let set = donors(&[("O-", 10)]);
        let analysis = InventoryAnalyzer::new().analyze_with_factor(&set, 1.0);
        assert!(analysis.total_shortage() > 50.0);
        assert!(analysis
            .recommended_actions
            .iter()
            .any(|a| a.contains("emergency blood drive")));
        assert!(analysis.recommended_actions[2].contains("O+"));
    }

    #[test]
    fn test_analyze_uses_month_of_now() {
        let set = reference_population();
        let feb = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let analysis = InventoryAnalyzer::new().analyze(&set, &feb);
        assert!((analysis.seasonal_factor - 1.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let set = donors(&[("O+", 40), ("A-", 3), ("B+", 9), ("junk", 1)]);
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let analyzer = InventoryAnalyzer::new();

        let first = analyzer.analyze(&set, &now);
        let second = analyzer.analyze(&set, &now);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
