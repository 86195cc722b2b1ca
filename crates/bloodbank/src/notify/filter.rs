//! Delivery filter applying user notification preferences.
//!
//! Decides whether a selected alert reaches the user, and on which channel.
//! Emergencies bypass quiet hours while emergency alerts are enabled; other
//! alerts must pass the per-type toggles, the quiet-hours window and the
//! preferred blood groups.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::NotificationChannel;
use crate::alert::{Alert, AlertScope, AlertType};
use crate::blood_group::BloodGroup;

/// Why an alert was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The user turned off this kind of alert.
    TypeDisabled,

    /// Inside the quiet-hours window and not an emergency.
    QuietHours,

    /// Targets a blood group the user did not ask for.
    GroupNotPreferred,
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeDisabled => write!(f, "alert type disabled"),
            Self::QuietHours => write!(f, "quiet hours"),
            Self::GroupNotPreferred => write!(f, "blood group not preferred"),
        }
    }
}

/// Result of filtering an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Deliver on the given channel.
    Deliver(NotificationChannel),

    /// Drop the alert.
    Suppressed(SuppressReason),
}

impl DeliveryDecision {
    /// Whether the alert should be delivered.
    #[must_use]
    pub fn is_deliver(&self) -> bool {
        matches!(self, Self::Deliver(_))
    }
}

/// User notification preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPreferences {
    /// Shortage, low-inventory, partnership and donor-match alerts.
    pub blood_shortage_alerts: bool,
    /// Donation and appointment reminders.
    pub donation_reminders: bool,
    /// Emergency requests; also lets critical alerts bypass quiet hours.
    pub emergency_alerts: bool,
    /// Drives, camps and campaigns nearby.
    pub nearby_donations: bool,
    /// Health tips.
    pub health_tips: bool,
    /// Groups whose targeted alerts the user wants.
    pub preferred_blood_groups: Vec<BloodGroup>,
    /// Whether quiet hours apply.
    pub quiet_hours_enabled: bool,
    /// First quiet hour, 0-23.
    pub quiet_hours_start: u32,
    /// First hour after the quiet window, 0-23. May be before the start,
    /// in which case the window spans midnight.
    pub quiet_hours_end: u32,
}

impl Default for DeliveryPreferences {
    fn default() -> Self {
        Self {
            blood_shortage_alerts: true,
            donation_reminders: true,
            emergency_alerts: true,
            nearby_donations: true,
            health_tips: true,
            preferred_blood_groups: BloodGroup::ALL.to_vec(),
            quiet_hours_enabled: true,
            quiet_hours_start: 22,
            quiet_hours_end: 8,
        }
    }
}

impl DeliveryPreferences {
    /// Whether alerts of this type are enabled.
    #[must_use]
    pub fn type_enabled(&self, alert_type: AlertType) -> bool {
        match alert_type {
            AlertType::BloodShortage
            | AlertType::InventoryLow
            | AlertType::HospitalPartnership
            | AlertType::DonorMatch => self.blood_shortage_alerts,
            AlertType::DonationReminder | AlertType::AppointmentReminder => {
                self.donation_reminders
            }
            AlertType::HospitalEmergency | AlertType::EmergencyRequest => self.emergency_alerts,
            AlertType::NearbyDonation
            | AlertType::MobileBloodCamp
            | AlertType::BloodDriveCampaign
            | AlertType::SeasonalCampaign => self.nearby_donations,
            AlertType::HealthTip => self.health_tips,
        }
    }

    /// Whether `hour` falls in the quiet window. Equal start and end means
    /// an empty window.
    #[must_use]
    pub fn is_quiet_hour(&self, hour: u32) -> bool {
        if !self.quiet_hours_enabled {
            return false;
        }
        let (start, end) = (self.quiet_hours_start, self.quiet_hours_end);
        if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Whether an alert with this scope matches the preferred groups.
    #[must_use]
    pub fn scope_matches(&self, scope: AlertScope) -> bool {
        match scope {
            AlertScope::All => true,
            AlertScope::Group(group) => self.preferred_blood_groups.contains(&group),
        }
    }
}

/// Applies [`DeliveryPreferences`] to alerts.
#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    preferences: DeliveryPreferences,
}

impl DeliveryFilter {
    /// Create a filter with the given preferences.
    #[must_use]
    pub fn new(preferences: DeliveryPreferences) -> Self {
        Self { preferences }
    }

    /// A filter that delivers everything.
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(DeliveryPreferences {
            quiet_hours_enabled: false,
            ..DeliveryPreferences::default()
        })
    }

    /// The active preferences.
    #[must_use]
    pub fn preferences(&self) -> &DeliveryPreferences {
        &self.preferences
    }

    /// Decide at the local wall-clock hour of `now`.
    #[must_use]
    pub fn decide_at<Tz: TimeZone>(&self, alert: &Alert, now: &DateTime<Tz>) -> DeliveryDecision {
        self.decide(alert, now.hour())
    }

    /// Decide for a local hour of day.
    #[must_use]
    pub fn decide(&self, alert: &Alert, hour: u32) -> DeliveryDecision {
        let prefs = &self.preferences;
        let emergency = alert.priority.is_emergency();
        let channel = NotificationChannel::for_alert(alert);

        if emergency && prefs.emergency_alerts {
            trace!(priority = %alert.priority, "Emergency bypasses preferences");
            return DeliveryDecision::Deliver(channel);
        }

        let decision = if !prefs.type_enabled(alert.alert_type) {
            DeliveryDecision::Suppressed(SuppressReason::TypeDisabled)
        } else if !emergency && prefs.is_quiet_hour(hour) {
            DeliveryDecision::Suppressed(SuppressReason::QuietHours)
        } else if !prefs.scope_matches(alert.scope) {
            DeliveryDecision::Suppressed(SuppressReason::GroupNotPreferred)
        } else {
            DeliveryDecision::Deliver(channel)
        };

        if let DeliveryDecision::Suppressed(reason) = decision {
            debug!(
                alert_type = alert.alert_type.as_str(),
                scope = %alert.scope,
                %reason,
                "Alert suppressed"
            );
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertPriority;
    use chrono::Utc;

    fn alert(priority: AlertPriority, alert_type: AlertType, scope: AlertScope) -> Alert {
        Alert::new("t", "m", scope, priority, alert_type, Utc::now())
    }

    fn tip() -> Alert {
        alert(AlertPriority::Low, AlertType::HealthTip, AlertScope::All)
    }

    #[test]
    fn test_quiet_hours_wrap_midnight() {
        let prefs = DeliveryPreferences::default();
        for hour in [22, 23, 0, 3, 7] {
            assert!(prefs.is_quiet_hour(hour), "{hour} should be quiet");
        }
        for hour in [8, 12, 21] {
            assert!(!prefs.is_quiet_hour(hour), "{hour} should not be quiet");
        }
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let prefs = DeliveryPreferences {
            quiet_hours_start: 13,
            quiet_hours_end: 15,
            ..DeliveryPreferences::default()
        };
        assert!(!prefs.is_quiet_hour(12));
        assert!(prefs.is_quiet_hour(13));
        assert!(prefs.is_quiet_hour(14));
        assert!(!prefs.is_quiet_hour(15));
    }

    #[test]
    fn test_quiet_hours_disabled_or_empty() {
        let disabled = DeliveryPreferences {
            quiet_hours_enabled: false,
            ..DeliveryPreferences::default()
        };
        assert!(!disabled.is_quiet_hour(23));

        let empty = DeliveryPreferences {
            quiet_hours_start: 5,
            quiet_hours_end: 5,
            ..DeliveryPreferences::default()
        };
        assert!((0..24).all(|h| !empty.is_quiet_hour(h)));
    }

    #[test]
    fn test_emergency_bypasses_quiet_hours() {
        let filter = DeliveryFilter::default();
        let critical = alert(
            AlertPriority::Critical,
            AlertType::BloodShortage,
            AlertScope::Group(BloodGroup::ONeg),
        );
        assert_eq!(
            filter.decide(&critical, 23),
            DeliveryDecision::Deliver(NotificationChannel::Emergency)
        );
    }

    #[test]
    fn test_emergency_without_toggle_respects_group() {
        let filter = DeliveryFilter::new(DeliveryPreferences {
            emergency_alerts: false,
            preferred_blood_groups: vec![BloodGroup::APos],
            ..DeliveryPreferences::default()
        });
        let shortage = alert(
            AlertPriority::Emergency,
            AlertType::BloodShortage,
            AlertScope::Group(BloodGroup::ONeg),
        );
        // still not subject to quiet hours, but the group must match
        assert_eq!(
            filter.decide(&shortage, 23),
            DeliveryDecision::Suppressed(SuppressReason::GroupNotPreferred)
        );

        let hospital = alert(
            AlertPriority::Emergency,
            AlertType::HospitalEmergency,
            AlertScope::Group(BloodGroup::APos),
        );
        assert_eq!(
            filter.decide(&hospital, 12),
            DeliveryDecision::Suppressed(SuppressReason::TypeDisabled)
        );
    }

    #[test]
    fn test_non_emergency_suppressed_in_quiet_hours() {
        let filter = DeliveryFilter::default();
        assert_eq!(
            filter.decide(&tip(), 2),
            DeliveryDecision::Suppressed(SuppressReason::QuietHours)
        );
        assert_eq!(
            filter.decide(&tip(), 9),
            DeliveryDecision::Deliver(NotificationChannel::Health)
        );
    }

    #[test]
    fn test_scope_all_always_matches() {
        let filter = DeliveryFilter::new(DeliveryPreferences {
            preferred_blood_groups: Vec::new(),
            ..DeliveryPreferences::default()
        });
        assert!(filter.decide(&tip(), 12).is_deliver());

        let targeted = alert(
            AlertPriority::High,
            AlertType::HospitalPartnership,
            AlertScope::Group(BloodGroup::BNeg),
        );
        assert_eq!(
            filter.decide(&targeted, 12),
            DeliveryDecision::Suppressed(SuppressReason::GroupNotPreferred)
        );
    }

    #[test]
    fn test_type_toggles() {
        let filter = DeliveryFilter::new(DeliveryPreferences {
            health_tips: false,
            nearby_donations: false,
            ..DeliveryPreferences::default()
        });
        assert_eq!(
            filter.decide(&tip(), 12),
            DeliveryDecision::Suppressed(SuppressReason::TypeDisabled)
        );
        let camp = alert(AlertPriority::Medium, AlertType::MobileBloodCamp, AlertScope::All);
        assert!(!filter.decide(&camp, 12).is_deliver());
        let reminder = alert(AlertPriority::Medium, AlertType::DonationReminder, AlertScope::All);
        assert_eq!(
            filter.decide(&reminder, 12),
            DeliveryDecision::Deliver(NotificationChannel::Reminders)
        );
    }

    #[test]
    fn test_every_type_has_a_toggle() {
        let off = DeliveryPreferences {
            blood_shortage_alerts: false,
            donation_reminders: false,
            emergency_alerts: false,
            nearby_donations: false,
            health_tips: false,
            ..DeliveryPreferences::default()
        };
        assert!(AlertType::ALL.iter().all(|t| !off.type_enabled(*t)));
    }

    #[test]
    fn test_permissive_filter() {
        let filter = DeliveryFilter::permissive();
        assert!(filter.decide(&tip(), 3).is_deliver());
    }

    #[test]
    fn test_preferences_deserialize_partial() {
        let prefs: DeliveryPreferences =
            serde_json::from_str(r#"{"preferred_blood_groups":["O-","AB+"],"quiet_hours_start":23}"#)
                .unwrap();
        assert_eq!(prefs.preferred_blood_groups, vec![BloodGroup::ONeg, BloodGroup::AbPos]);
        assert_eq!(prefs.quiet_hours_start, 23);
        assert_eq!(prefs.quiet_hours_end, 8);
        assert!(prefs.health_tips);
    }
}
