//! Core alert types for bloodbank.
//!
//! An [`Alert`] is a pure value. Persistence, read/unread state changes and
//! expiry sweeping belong to the store ([`crate::storage`]); the analysis
//! core only constructs candidate alerts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::blood_group::BloodGroup;
use crate::error::{Error, Result};

/// Alert urgency, in ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    /// Informational.
    #[default]
    Low,
    /// Worth attention.
    Medium,
    /// Needs action soon.
    High,
    /// Needs action now.
    Critical,
    /// Life-threatening, bypasses quiet hours.
    Emergency,
}

impl AlertPriority {
    /// All priorities, lowest first.
    pub const ALL: [AlertPriority; 5] = [
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
        Self::Emergency,
    ];

    /// Numeric level, 1 (low) through 5 (emergency).
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
            Self::Emergency => 5,
        }
    }

    /// Inverse of [`AlertPriority::level`].
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.level() == level)
    }

    /// Classify a seasonally adjusted shortage, in percentage points.
    ///
    /// Monotonic: a larger shortage never yields a lower priority.
    #[must_use]
    pub fn from_adjusted_shortage(adjusted_shortage: f64) -> Self {
        if adjusted_shortage > 25.0 {
            Self::Emergency
        } else if adjusted_shortage > 15.0 {
            Self::Critical
        } else if adjusted_shortage > 10.0 {
            Self::High
        } else if adjusted_shortage > 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Critical and emergency alerts count as emergencies for delivery.
    #[must_use]
    pub fn is_emergency(self) -> bool {
        self >= Self::Critical
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Emergency => "Emergency",
        };
        f.write_str(name)
    }
}

/// The closed set of alert archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Inventory analysis found a critical shortage.
    BloodShortage,
    /// Nudge a donor to donate again.
    DonationReminder,
    /// Direct emergency request.
    EmergencyRequest,
    /// Donation drive near the user.
    NearbyDonation,
    /// Inventory running low.
    InventoryLow,
    /// A request matches the donor's group.
    DonorMatch,
    /// Upcoming appointment.
    AppointmentReminder,
    /// Health and eligibility advice.
    HealthTip,
    /// A hospital needs blood immediately.
    HospitalEmergency,
    /// Organised blood drive.
    BloodDriveCampaign,
    /// Holiday or seasonal campaign.
    SeasonalCampaign,
    /// Partner hospital shortage.
    HospitalPartnership,
    /// Mobile collection unit.
    MobileBloodCamp,
}

impl AlertType {
    /// All alert types.
    pub const ALL: [AlertType; 13] = [
        Self::BloodShortage,
        Self::DonationReminder,
        Self::EmergencyRequest,
        Self::NearbyDonation,
        Self::InventoryLow,
        Self::DonorMatch,
        Self::AppointmentReminder,
        Self::HealthTip,
        Self::HospitalEmergency,
        Self::BloodDriveCampaign,
        Self::SeasonalCampaign,
        Self::HospitalPartnership,
        Self::MobileBloodCamp,
    ];

    /// Stable storage key, e.g. `"BLOOD_SHORTAGE"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BloodShortage => "BLOOD_SHORTAGE",
            Self::DonationReminder => "DONATION_REMINDER",
            Self::EmergencyRequest => "EMERGENCY_REQUEST",
            Self::NearbyDonation => "NEARBY_DONATION",
            Self::InventoryLow => "INVENTORY_LOW",
            Self::DonorMatch => "DONOR_MATCH",
            Self::AppointmentReminder => "APPOINTMENT_REMINDER",
            Self::HealthTip => "HEALTH_TIP",
            Self::HospitalEmergency => "HOSPITAL_EMERGENCY",
            Self::BloodDriveCampaign => "BLOOD_DRIVE_CAMPAIGN",
            Self::SeasonalCampaign => "SEASONAL_CAMPAIGN",
            Self::HospitalPartnership => "HOSPITAL_PARTNERSHIP",
            Self::MobileBloodCamp => "MOBILE_BLOOD_CAMP",
        }
    }

    /// Human-readable name, e.g. `"Blood Shortage"`.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::BloodShortage => "Blood Shortage",
            Self::DonationReminder => "Donation Reminder",
            Self::EmergencyRequest => "Emergency Request",
            Self::NearbyDonation => "Nearby Donation",
            Self::InventoryLow => "Inventory Low",
            Self::DonorMatch => "Donor Match",
            Self::AppointmentReminder => "Appointment Reminder",
            Self::HealthTip => "Health Tip",
            Self::HospitalEmergency => "Hospital Emergency",
            Self::BloodDriveCampaign => "Blood Drive Campaign",
            Self::SeasonalCampaign => "Seasonal Campaign",
            Self::HospitalPartnership => "Hospital Partnership",
            Self::MobileBloodCamp => "Mobile Blood Camp",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AlertType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::internal(format!("unknown alert type: {s}")))
    }
}

/// Who an alert is addressed to: one blood group, or everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertScope {
    /// Every donor.
    All,
    /// Donors of one group.
    Group(BloodGroup),
}

impl AlertScope {
    /// The targeted group, if any.
    #[must_use]
    pub fn blood_group(self) -> Option<BloodGroup> {
        match self {
            Self::All => None,
            Self::Group(group) => Some(group),
        }
    }
}

impl fmt::Display for AlertScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Group(group) => fmt::Display::fmt(group, f),
        }
    }
}

impl FromStr for AlertScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Group)
        }
    }
}

impl From<BloodGroup> for AlertScope {
    fn from(group: BloodGroup) -> Self {
        Self::Group(group)
    }
}

impl Serialize for AlertScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlertScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A candidate or stored alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Identifier assigned by the storage layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Short headline.
    pub title: String,

    /// Body text.
    pub message: String,

    /// Targeted blood group, or `All`.
    #[serde(rename = "blood_group")]
    pub scope: AlertScope,

    /// Urgency.
    pub priority: AlertPriority,

    /// Archetype.
    #[serde(rename = "type")]
    pub alert_type: AlertType,

    /// Where to go.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Who to call or write to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Units of blood needed, at least 1 when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_units: Option<u32>,

    /// When the alert stops being relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// When the alert was produced.
    pub created_at: DateTime<Utc>,

    /// Whether the user has seen it.
    pub read: bool,

    /// Whether the alert is still live.
    pub active: bool,
}

impl Alert {
    /// Create an unread, active alert with no optional fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        scope: AlertScope,
        priority: AlertPriority,
        alert_type: AlertType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            message: message.into(),
            scope,
            priority,
            alert_type,
            location: None,
            contact: None,
            required_units: None,
            expires_at: None,
            created_at,
            read: false,
            active: true,
        }
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the contact string.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Set the required units, clamped to at least 1.
    #[must_use]
    pub fn with_required_units(mut self, units: u32) -> Self {
        self.required_units = Some(units.max(1));
        self
    }

    /// Expire `ttl` after creation.
    #[must_use]
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.created_at + ttl);
        self
    }

    /// Whether the alert has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    /// Content fingerprint used for deduplication.
    ///
    /// Covers type, scope, title and message, so the same archetype with the
    /// same text is recognised as a repeat regardless of timestamps.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let scope = self.scope.to_string();
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.alert_type.as_str(),
            scope.as_str(),
            self.title.as_str(),
            self.message.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}
