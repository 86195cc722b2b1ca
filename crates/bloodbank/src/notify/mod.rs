//! Alert delivery.
//!
//! Selected alerts pass through a [`DeliveryFilter`] and are then handed to
//! an [`AlertSink`] together with the [`NotificationChannel`] they belong on.
//! The store sink lives in [`crate::storage`]; this module provides logging,
//! in-memory and fan-out sinks.

mod filter;

use std::fmt;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::alert::{Alert, AlertPriority, AlertType};
use crate::error::Result;

pub use filter::{DeliveryDecision, DeliveryFilter, DeliveryPreferences, SuppressReason};

/// Delivery channel, chosen by priority and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    /// Critical shortages and emergency requests.
    Emergency,
    /// Reminders and campaigns.
    Reminders,
    /// Everything else of low priority.
    General,
    /// Health tips.
    Health,
}

impl NotificationChannel {
    /// All channels.
    pub const ALL: [NotificationChannel; 4] =
        [Self::Emergency, Self::Reminders, Self::General, Self::Health];

    /// Route an alert.
    #[must_use]
    pub fn for_alert(alert: &Alert) -> Self {
        match alert.priority {
            AlertPriority::Critical | AlertPriority::Emergency => Self::Emergency,
            AlertPriority::High | AlertPriority::Medium => Self::Reminders,
            AlertPriority::Low if alert.alert_type == AlertType::HealthTip => Self::Health,
            AlertPriority::Low => Self::General,
        }
    }

    /// Stable channel identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Emergency => "emergency_alerts",
            Self::Reminders => "donation_reminders",
            Self::General => "general_notifications",
            Self::Health => "health_tips",
        }
    }

    /// Human-readable channel name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency Alerts",
            Self::Reminders => "Donation Reminders",
            Self::General => "General Notifications",
            Self::Health => "Health Tips",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Somewhere alerts go once they pass the filter.
#[async_trait]
pub trait AlertSink: Send {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Deliver one alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink could not accept the alert.
    async fn deliver(&mut self, alert: &Alert, channel: NotificationChannel) -> Result<()>;
}

/// Writes alerts to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&mut self, alert: &Alert, channel: NotificationChannel) -> Result<()> {
        if channel == NotificationChannel::Emergency {
            warn!(
                channel = channel.id(),
                priority = %alert.priority,
                scope = %alert.scope,
                title = %alert.title,
                "{}",
                alert.message
            );
        } else {
            info!(
                channel = channel.id(),
                priority = %alert.priority,
                scope = %alert.scope,
                title = %alert.title,
                "{}",
                alert.message
            );
        }
        Ok(())
    }
}

/// Keeps delivered alerts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Vec<(Alert, NotificationChannel)>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> &[(Alert, NotificationChannel)] {
        &self.delivered
    }

    /// Number of deliveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    /// Whether nothing was delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

#[async_trait]
impl AlertSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn deliver(&mut self, alert: &Alert, channel: NotificationChannel) -> Result<()> {
        self.delivered.push((alert.clone(), channel));
        Ok(())
    }
}

/// Delivers to several sinks in order.
///
/// Every sink is tried even if an earlier one fails; the first failure is
/// returned.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl fmt::Debug for MultiSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

impl MultiSink {
    /// Create an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AlertSink for MultiSink {
    fn name(&self) -> &'static str {
        "multi"
    }

    async fn deliver(&mut self, alert: &Alert, channel: NotificationChannel) -> Result<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.deliver(alert, channel).await {
                warn!(sink = sink.name(), error = %e, "Sink failed to deliver alert");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertScope;
    use crate::blood_group::BloodGroup;
    use crate::error::Error;
    use chrono::Utc;

    fn alert(priority: AlertPriority, alert_type: AlertType) -> Alert {
        Alert::new(
            "t",
            "m",
            AlertScope::Group(BloodGroup::ONeg),
            priority,
            alert_type,
            Utc::now(),
        )
    }

    struct FailingSink;

    #[async_trait]
    impl AlertSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(&mut self, _: &Alert, _: NotificationChannel) -> Result<()> {
            Err(Error::delivery("failing", "always fails"))
        }
    }

    #[test]
    fn test_channel_routing() {
        let cases = [
            (AlertPriority::Emergency, AlertType::HospitalEmergency, NotificationChannel::Emergency),
            (AlertPriority::Critical, AlertType::BloodShortage, NotificationChannel::Emergency),
            (AlertPriority::High, AlertType::HospitalPartnership, NotificationChannel::Reminders),
            (AlertPriority::Medium, AlertType::DonationReminder, NotificationChannel::Reminders),
            (AlertPriority::Low, AlertType::HealthTip, NotificationChannel::Health),
            (AlertPriority::Low, AlertType::BloodShortage, NotificationChannel::General),
        ];
        for (priority, alert_type, expected) in cases {
            assert_eq!(
                NotificationChannel::for_alert(&alert(priority, alert_type)),
                expected,
                "{priority} {alert_type}"
            );
        }
    }

    #[test]
    fn test_channel_ids() {
        assert_eq!(NotificationChannel::Emergency.id(), "emergency_alerts");
        assert_eq!(NotificationChannel::Reminders.to_string(), "donation_reminders");
        assert_eq!(NotificationChannel::General.id(), "general_notifications");
        assert_eq!(NotificationChannel::Health.display_name(), "Health Tips");
    }

    #[tokio::test]
    async fn test_memory_sink_records() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());
        let a = alert(AlertPriority::Low, AlertType::HealthTip);
        sink.deliver(&a, NotificationChannel::Health).await.unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.delivered()[0], (a, NotificationChannel::Health));
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        crate::logging::init_test_logging();
        let mut sink = LogSink;
        for priority in AlertPriority::ALL {
            let a = alert(priority, AlertType::BloodShortage);
            let channel = NotificationChannel::for_alert(&a);
            sink.deliver(&a, channel).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_multi_sink_tries_every_sink() {
        let mut multi = MultiSink::new().with(FailingSink).with(LogSink);
        assert_eq!(multi.len(), 2);
        let a = alert(AlertPriority::Medium, AlertType::NearbyDonation);
        let err = multi
            .deliver(&a, NotificationChannel::Reminders)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Delivery { sink: "failing", .. }));
        assert_eq!(format!("{multi:?}"), r#"["failing", "log"]"#);
    }

    #[tokio::test]
    async fn test_empty_multi_sink_is_ok() {
        let mut multi = MultiSink::new();
        assert!(multi.is_empty());
        let a = alert(AlertPriority::Low, AlertType::HealthTip);
        multi.deliver(&a, NotificationChannel::Health).await.unwrap();
    }
}
