//! Alert selection.
//!
//! The [`AlertSelector`] turns an [`InventoryAnalysis`] into at most one
//! [`Alert`]. A critical shortage yields a targeted shortage alert. Without
//! one, a balanced inventory occasionally yields positive feedback, and
//! otherwise an ordered cascade of probabilistic archetypes is consulted.
//!
//! Randomness and time are always supplied by the caller, so a seeded RNG
//! and a fixed timestamp make every decision reproducible.
//!
//! # Example
//!
//! ```
//! use bloodbank::selector::AlertSelector;
//! use chrono::{TimeZone, Utc};
//! use rand::rngs::mock::StepRng;
//!
//! let selector = AlertSelector::default();
//! let now = Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap();
//!
//! // An RNG that never rolls under any gate produces nothing.
//! let mut never = StepRng::new(u64::MAX, 0);
//! assert!(selector.select_fallback_alert(&now, &mut never).is_none());
//! ```

mod catalog;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::alert::{Alert, AlertPriority, AlertScope, AlertType};
use crate::analysis::{BloodGroupPrediction, InventoryAnalysis};

use catalog::Archetype;

/// Default probability of positive feedback when nothing is critically short.
pub const DEFAULT_POSITIVE_FEEDBACK_PROBABILITY: f64 = 0.3;

/// Lifetime of a shortage alert.
const SHORTAGE_ALERT_TTL_HOURS: i64 = 48;

const POSITIVE_FEEDBACK: [&str; 4] = [
    "Great job! Your blood inventory is well-balanced. Consider organizing a community awareness event.",
    "Excellent blood distribution! Share health tips with donors to maintain their eligibility.",
    "Well-maintained inventory! Consider setting up donation reminders for regular donors.",
    "Good work! Blood supplies are being kept at optimal levels. Keep monitoring trends.",
];

/// How the weekend component of the seasonal campaign gate is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekendBoostMode {
    /// Add 0.2 on every day of the week.
    #[default]
    Always,
    /// Add 0.2 on Saturday and Sunday, 0.1 otherwise.
    WeekendsOnly,
}

/// Tunables for [`AlertSelector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Weekend component of the seasonal campaign gate.
    pub weekend_boost: WeekendBoostMode,

    /// Probability of a positive-feedback alert when nothing is critical.
    pub positive_feedback_probability: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            weekend_boost: WeekendBoostMode::default(),
            positive_feedback_probability: DEFAULT_POSITIVE_FEEDBACK_PROBABILITY,
        }
    }
}

/// The calendar facts gates look at, taken from a local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Day of week.
    pub weekday: Weekday,
    /// Month, 1-12.
    pub month: u32,
    /// The same instant in UTC, used for timestamps.
    pub utc: DateTime<Utc>,
}

impl Moment {
    /// Capture the calendar facts of `now` in its own time zone.
    #[must_use]
    pub fn of<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            hour: now.hour(),
            weekday: now.weekday(),
            month: now.month(),
            utc: now.with_timezone(&Utc),
        }
    }

    /// Saturday or Sunday.
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }

    /// Monday through Friday.
    #[must_use]
    pub fn is_weekday(&self) -> bool {
        !self.is_weekend()
    }
}

/// Roll against `p`. Non-positive probabilities never fire and consume no
/// randomness.
fn chance(rng: &mut dyn RngCore, p: f64) -> bool {
    p > 0.0 && rng.gen_bool(p.min(1.0))
}

/// Chooses which alert, if any, to emit.
pub struct AlertSelector {
    config: SelectorConfig,
    catalog: Vec<Archetype>,
}

impl std::fmt::Debug for AlertSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertSelector")
            .field("config", &self.config)
            .field("archetypes", &self.catalog.len())
            .finish()
    }
}

impl Default for AlertSelector {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl AlertSelector {
    /// Create a selector with the standard archetype catalog.
    #[must_use]
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            catalog: catalog::catalog(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Archetypes in cascade order.
    pub fn archetypes(&self) -> impl Iterator<Item = AlertType> + '_ {
        self.catalog.iter().map(|a| a.alert_type)
    }

    /// Gate probability of every archetype at `now`, in cascade order.
    #[must_use]
    pub fn gate_probabilities<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<(AlertType, f64)> {
        let at = Moment::of(now);
        self.catalog
            .iter()
            .map(|a| (a.alert_type, (a.gate)(&self.config, &at)))
            .collect()
    }

    /// Smart alert first, then the fallback cascade.
    pub fn select<Tz: TimeZone, R: RngCore>(
        &self,
        analysis: &InventoryAnalysis,
        now: &DateTime<Tz>,
        rng: &mut R,
    ) -> Option<Alert> {
        self.select_smart_alert(analysis, now, rng)
            .or_else(|| self.select_fallback_alert(now, rng))
    }

    /// Alert derived directly from the analysis.
    ///
    /// With critical shortages, targets the group with the largest shortage;
    /// ties go to the group listed first. Without any, returns positive
    /// feedback with the configured probability.
    pub fn select_smart_alert<Tz: TimeZone, R: RngCore>(
        &self,
        analysis: &InventoryAnalysis,
        now: &DateTime<Tz>,
        rng: &mut R,
    ) -> Option<Alert> {
        let at = Moment::of(now);

        if analysis.critical_shortages.is_empty() {
            return self.positive_feedback(&at, rng);
        }

        let mut worst: Option<&BloodGroupPrediction> = None;
        for group in &analysis.critical_shortages {
            let Some(prediction) = analysis.predictions.get(group) else {
                continue;
            };
            if worst.map_or(true, |w| prediction.shortage > w.shortage) {
                worst = Some(prediction);
            }
        }

        let worst = worst?;
        debug!(
            group = %worst.blood_group,
            shortage = worst.shortage,
            priority = %worst.priority,
            "Selected shortage alert"
        );
        Some(shortage_alert(worst, at.utc))
    }

    /// Walk the archetype cascade; the first gate that fires wins.
    pub fn select_fallback_alert<Tz: TimeZone, R: RngCore>(
        &self,
        now: &DateTime<Tz>,
        rng: &mut R,
    ) -> Option<Alert> {
        let at = Moment::of(now);
        let rng: &mut dyn RngCore = rng;

        for archetype in &self.catalog {
            let p = (archetype.gate)(&self.config, &at);
            trace!(alert_type = archetype.alert_type.as_str(), p, "Gate");
            if chance(rng, p) {
                debug!(alert_type = archetype.alert_type.as_str(), "Fallback archetype fired");
                return Some((archetype.generate)(&at, rng));
            }
        }

        debug!("No fallback archetype fired");
        None
    }

    fn positive_feedback(&self, at: &Moment, rng: &mut dyn RngCore) -> Option<Alert> {
        if !chance(rng, self.config.positive_feedback_probability) {
            return None;
        }
        let message = POSITIVE_FEEDBACK[rng.gen_range(0..POSITIVE_FEEDBACK.len())];
        Some(Alert::new(
            "Inventory Status: Excellent",
            message,
            AlertScope::All,
            AlertPriority::Low,
            AlertType::HealthTip,
            at.utc,
        ))
    }
}

/// Severity wording for a raw shortage.
fn severity(shortage: f64) -> &'static str {
    if shortage > 20.0 {
        "CRITICAL"
    } else if shortage > 10.0 {
        "HIGH"
    } else {
        "MODERATE"
    }
}

/// `max(1, round(shortage / 2))`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn required_units(shortage: f64) -> u32 {
    ((shortage * 0.5).round().max(0.0) as u32).max(1)
}

fn shortage_alert(prediction: &BloodGroupPrediction, created_at: DateTime<Utc>) -> Alert {
    let group = prediction.blood_group;
    let message = format!(
        "{} shortage of {group} blood detected!\n\n\
         Current: {} donors ({:.1}%)\n\
         Expected: {:.1}%\n\
         Shortage: {:.1}%\n\n\
         Immediate action required to maintain adequate blood supply.",
        severity(prediction.shortage),
        prediction.current_count,
        prediction.current_percent,
        prediction.expected_percent,
        prediction.shortage,
    );

    Alert::new(
        "Critical Blood Shortage Detected",
        message,
        AlertScope::Group(group),
        prediction.priority,
        AlertType::BloodShortage,
        created_at,
    )
    .with_location("All Centers")
    .with_required_units(required_units(prediction.shortage))
    .expires_in(Duration::hours(SHORTAGE_ALERT_TTL_HOURS))
}

/// Greeting emitted when there are no donors yet.
#[must_use]
pub fn welcome_alert(created_at: DateTime<Utc>) -> Alert {
    Alert::new(
        "Welcome to Blood Bank",
        "Thank you for joining our life-saving community! Explore features and help save lives.",
        AlertScope::All,
        AlertPriority::Low,
        AlertType::HealthTip,
        created_at,
    )
}
