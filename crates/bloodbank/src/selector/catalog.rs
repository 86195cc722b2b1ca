//! The fallback archetype catalog: ordered gates and their generators.

use chrono::Duration;
use rand::{Rng, RngCore};

use crate::alert::{Alert, AlertPriority, AlertScope, AlertType};
use crate::analysis::in_holiday_window;
use crate::blood_group::BloodGroup;

use super::{Moment, SelectorConfig, WeekendBoostMode};

/// Probability that an archetype fires at a given moment.
pub(super) type Gate = fn(&SelectorConfig, &Moment) -> f64;

/// Builds the alert for an archetype whose gate fired.
pub(super) type Generator = fn(&Moment, &mut dyn RngCore) -> Alert;

/// One entry of the fallback cascade.
pub(super) struct Archetype {
    pub(super) alert_type: AlertType,
    pub(super) gate: Gate,
    pub(super) generate: Generator,
}

/// The cascade, in evaluation order. The first gate that fires wins.
pub(super) fn catalog() -> Vec<Archetype> {
    vec![
        Archetype {
            alert_type: AlertType::HospitalEmergency,
            gate: hospital_emergency_gate,
            generate: hospital_emergency,
        },
        Archetype {
            alert_type: AlertType::HospitalPartnership,
            gate: hospital_partnership_gate,
            generate: hospital_partnership,
        },
        Archetype {
            alert_type: AlertType::BloodDriveCampaign,
            gate: blood_drive_gate,
            generate: blood_drive,
        },
        Archetype {
            alert_type: AlertType::SeasonalCampaign,
            gate: seasonal_campaign_gate,
            generate: seasonal_campaign,
        },
        Archetype {
            alert_type: AlertType::MobileBloodCamp,
            gate: mobile_camp_gate,
            generate: mobile_camp,
        },
        Archetype {
            alert_type: AlertType::DonationReminder,
            gate: donation_reminder_gate,
            generate: donation_reminder,
        },
        Archetype {
            alert_type: AlertType::HealthTip,
            gate: health_tip_gate,
            generate: health_tip,
        },
        Archetype {
            alert_type: AlertType::NearbyDonation,
            gate: nearby_donation_gate,
            generate: nearby_donation,
        },
    ]
}

fn pick<T: Copy>(pool: &[T], rng: &mut dyn RngCore) -> T {
    pool[rng.gen_range(0..pool.len())]
}

// Gates

fn hospital_emergency_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if (8..=20).contains(&at.hour) {
        0.15
    } else {
        0.05
    }
}

fn hospital_partnership_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if (7..=10).contains(&at.hour) || (17..=20).contains(&at.hour) {
        0.2
    } else {
        0.1
    }
}

fn blood_drive_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if at.is_weekday() && (9..=17).contains(&at.hour) {
        0.25
    } else {
        0.0
    }
}

fn seasonal_campaign_gate(config: &SelectorConfig, at: &Moment) -> f64 {
    let seasonal = if in_holiday_window(at.month) { 0.3 } else { 0.1 };
    let weekend = match config.weekend_boost {
        WeekendBoostMode::Always => 0.2,
        WeekendBoostMode::WeekendsOnly if at.is_weekend() => 0.2,
        WeekendBoostMode::WeekendsOnly => 0.1,
    };
    seasonal + weekend
}

fn mobile_camp_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if at.is_weekend() {
        0.4
    } else {
        0.15
    }
}

fn donation_reminder_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if at.is_weekday() && (9..=18).contains(&at.hour) {
        0.3
    } else {
        0.0
    }
}

fn health_tip_gate(_: &SelectorConfig, at: &Moment) -> f64 {
    if (7..=10).contains(&at.hour) {
        0.4
    } else {
        0.1
    }
}

fn nearby_donation_gate(_: &SelectorConfig, _: &Moment) -> f64 {
    0.2
}

// Generators

const EMERGENCY_HOSPITALS: [&str; 5] = [
    "City General Hospital",
    "Metro Medical Center",
    "Central Hospital",
    "Emergency Care Hospital",
    "Regional Trauma Center",
];

const EMERGENCY_GROUPS: [BloodGroup; 5] = [
    BloodGroup::ONeg,
    BloodGroup::AbPos,
    BloodGroup::ANeg,
    BloodGroup::BPos,
    BloodGroup::OPos,
];

fn hospital_emergency(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    let hospital = pick(&EMERGENCY_HOSPITALS, rng);
    let group = pick(&EMERGENCY_GROUPS, rng);
    let message = match rng.gen_range(0..5) {
        0 => format!(
            "CRITICAL: {hospital} facing severe {group} shortage! Multiple patients in ICU need immediate transfusion. Every minute counts, respond now!"
        ),
        1 => format!(
            "EMERGENCY ALERT: {group} blood stock depleted at {hospital}! Accident victims require urgent care. Your donation saves lives TODAY!"
        ),
        2 => format!(
            "RED ALERT: {hospital} needs {group} donors ASAP! Emergency surgery in progress. Be the hero someone desperately needs!"
        ),
        3 => format!(
            "URGENT CALL: {group} blood critically needed at {hospital}! Life-threatening situation. Immediate donor response required!"
        ),
        _ => format!(
            "LIFE OR DEATH: {hospital} running out of {group} blood! Critical patients waiting. Rush to donate, time is running out!"
        ),
    };

    Alert::new(
        "HOSPITAL EMERGENCY",
        message,
        AlertScope::Group(group),
        AlertPriority::Emergency,
        AlertType::HospitalEmergency,
        at.utc,
    )
    .with_location(hospital)
    .with_contact("Emergency Hotline: +91-911-BLOOD")
    .with_required_units(rng.gen_range(3..=15))
    .expires_in(Duration::hours(2))
}

const PARTNER_HOSPITALS: [&str; 5] = [
    "Metro Hospital",
    "City Medical Center",
    "Regional Health Center",
    "University Hospital",
    "Children's Specialty Hospital",
];

const PARTNER_GROUPS: [BloodGroup; 5] = [
    BloodGroup::AbPos,
    BloodGroup::ONeg,
    BloodGroup::ANeg,
    BloodGroup::BNeg,
    BloodGroup::AbNeg,
];

fn hospital_partnership(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    let hospital = pick(&PARTNER_HOSPITALS, rng);
    let group = pick(&PARTNER_GROUPS, rng);
    let days_left: i64 = rng.gen_range(1..=3);
    let message = match rng.gen_range(0..5) {
        0 => format!(
            "PARTNERSHIP ALERT: {hospital} reports {group} shortage! Our trusted partner needs your help. 15 surgeries on hold, act fast!"
        ),
        1 => format!(
            "PARTNER HOSPITAL SOS: {group} inventory at {hospital} down to {days_left} days! Cancer patients need your support. Respond immediately!"
        ),
        2 => format!(
            "NETWORK ALERT: {hospital} (our key partner) facing {group} crisis! Pediatric ward affected. Your donation saves children's lives!"
        ),
        3 => format!(
            "ALLIANCE EMERGENCY: {group} stocks depleted at partner {hospital}! Organ transplant surgeries at risk. Urgent donor mobilization needed!"
        ),
        _ => format!(
            "PARTNER CRISIS: {hospital}'s {group} supply critically low! Maternity ward needs immediate support. Help mothers and babies!"
        ),
    };

    Alert::new(
        "PARTNERSHIP ALERT",
        message,
        AlertScope::Group(group),
        AlertPriority::High,
        AlertType::HospitalPartnership,
        at.utc,
    )
    .with_location(hospital)
    .with_contact("Partnership Coordinator: +91-800-PARTNER")
    .with_required_units(rng.gen_range(5..=25))
    .expires_in(Duration::days(days_left))
}

const DRIVE_LOCATIONS: [&str; 7] = [
    "Central Community Center",
    "City Mall",
    "University Campus",
    "Sports Complex",
    "Town Hall",
    "Shopping Plaza",
    "Corporate Office Complex",
];

fn blood_drive(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    let location = pick(&DRIVE_LOCATIONS, rng);
    let message = match rng.gen_range(0..5) {
        0 => format!(
            "MEGA BLOOD DRIVE at {location}! Join 500+ donors this weekend. Free health screening and refreshments. Book your 15-minute slot now!"
        ),
        1 => format!(
            "COMMUNITY HEROES NEEDED! Blood donation camp at {location}. Help us reach our goal of 200 units. Every donor gets a thank-you kit!"
        ),
        2 => format!(
            "BLOOD DONATION CHAMPIONSHIP at {location}! Compete with friends to save lives. Prizes for top donors and certificates for all participants!"
        ),
        3 => format!(
            "BE THE CHANGE! Mobile blood unit stationed at {location}. Quick, safe and convenient. Walk-ins welcome, no appointment needed!"
        ),
        _ => format!(
            "BLOOD DONATION FESTIVAL at {location}! Live music, food stalls and life-saving donations. Make it a family day out while helping others!"
        ),
    };

    Alert::new(
        "BLOOD DRIVE CAMPAIGN",
        message,
        AlertScope::All,
        AlertPriority::Medium,
        AlertType::BloodDriveCampaign,
        at.utc,
    )
    .with_location(location)
    .with_contact("Register: blooddrive@hospital.com")
    .expires_in(Duration::hours(24))
}

const SEASONAL_MESSAGES: [&str; 5] = [
    "NEW YEAR, NEW HOPE! Start the year by saving lives. Join our resolution campaign: donate blood and inspire others. First 100 donors get special gifts!",
    "VALENTINE'S SPECIAL: Share love, donate blood! Couples who donate together get matching certificates. Spread love beyond hearts and save lives!",
    "HALLOWEEN BLOOD DRIVE: Don't let blood supplies get scary low! Dress up and donate. Best costume wins prizes while saving real lives!",
    "INDEPENDENCE DAY BLOOD MARATHON: Celebrate freedom by freeing someone from illness. 48-hour non-stop donation drive. Be a true patriot!",
    "RAMADAN BLOOD APPEAL: During this holy month, give the gift of life. Special evening donation slots available. Break your fast knowing you saved lives!",
];

const SEASONAL_LOCATIONS: [&str; 5] = [
    "Seasonal Care Center",
    "Community Health Hub",
    "Festival Grounds Medical",
    "Holiday Donation Center",
    "Special Events Clinic",
];

fn seasonal_campaign(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    let message = pick(&SEASONAL_MESSAGES, rng);
    Alert::new(
        "SEASONAL BLOOD CAMPAIGN",
        message,
        AlertScope::All,
        AlertPriority::Medium,
        AlertType::SeasonalCampaign,
        at.utc,
    )
    .with_location(pick(&SEASONAL_LOCATIONS, rng))
    .with_contact("Campaign Info: seasonal@bloodbank.org")
    .expires_in(Duration::days(7))
}

const MOBILE_AREAS: [&str; 7] = [
    "Sector 15 Market",
    "Downtown Plaza",
    "Residential Complex",
    "Shopping District",
    "Business Park",
    "Metro Station",
    "College Campus",
];

fn mobile_camp(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    let area = pick(&MOBILE_AREAS, rng);
    let message = match rng.gen_range(0..5) {
        0 => format!(
            "MOBILE BLOOD UNIT ALERT! Our van is parked at {area} right now! Quick 10-minute donation process. Free snacks and juice for all donors!"
        ),
        1 => format!(
            "BLOOD-ON-WHEELS at {area}! State-of-the-art mobile lab with comfortable seating. Donate in comfort while saving lives!"
        ),
        2 => format!(
            "MOBILE DONATION CARNIVAL at {area}! Games, music and blood donation all in one place. Bring family and friends for a fun day out!"
        ),
        3 => format!(
            "EXPRESS BLOOD DONATION at {area}! No queues, no waiting. Our mobile unit processes donors in under 15 minutes. Perfect for busy schedules!"
        ),
        _ => format!(
            "NEIGHBORHOOD HEROES WANTED at {area}! Mobile blood camp for local residents. Help your community and donate at your doorstep!"
        ),
    };

    Alert::new(
        "MOBILE BLOOD CAMP",
        message,
        AlertScope::All,
        AlertPriority::Medium,
        AlertType::MobileBloodCamp,
        at.utc,
    )
    .with_location(area)
    .with_contact("Mobile Unit: +91-900-MOBILE")
    .expires_in(Duration::days(3))
}

const REMINDER_MESSAGES: [&str; 3] = [
    "It's been a while since your last donation. Ready to save lives?",
    "Your donation can help up to 3 people. Schedule your appointment today!",
    "Be a hero: donate blood and make a difference in someone's life",
];

fn donation_reminder(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    Alert::new(
        "Donation Reminder",
        pick(&REMINDER_MESSAGES, rng),
        AlertScope::All,
        AlertPriority::Medium,
        AlertType::DonationReminder,
        at.utc,
    )
    .with_location("Nearby Centers")
}

const HEALTH_TIPS: [&str; 5] = [
    "Stay hydrated! Drink plenty of water before and after donating blood.",
    "Eat iron-rich foods like spinach, red meat and beans to maintain healthy blood levels.",
    "Get enough sleep before donating. It helps your body recover faster.",
    "Avoid alcohol 24 hours before donating blood for the best donation experience.",
    "Regular exercise improves blood circulation and overall health.",
];

fn health_tip(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    Alert::new(
        "Health Tip",
        pick(&HEALTH_TIPS, rng),
        AlertScope::All,
        AlertPriority::Low,
        AlertType::HealthTip,
        at.utc,
    )
}

const NEARBY_LOCATIONS: [&str; 4] = [
    "City Hospital",
    "Red Cross Center",
    "Community Health Center",
    "Medical College",
];

fn nearby_donation(at: &Moment, rng: &mut dyn RngCore) -> Alert {
    Alert::new(
        "Nearby Donation Drive",
        "Blood donation camp happening near you! Join us and save lives.",
        AlertScope::All,
        AlertPriority::Medium,
        AlertType::NearbyDonation,
        at.utc,
    )
    .with_location(pick(&NEARBY_LOCATIONS, rng))
    .expires_in(Duration::days(7))
}
