//! Sample donor generation for seeding an empty store.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::blood_group::BloodGroup;
use crate::donor::DonorRecord;

/// Donors generated when no count is given.
pub const DEFAULT_SAMPLE_COUNT: usize = 120;

const FIRST_NAMES: [&str; 30] = [
    "Aarav", "Vivaan", "Aditya", "Arjun", "Sai", "Ishaan", "Pranav", "Vedant", "Aadhya", "Ananya",
    "Diya", "Saanvi", "Fatima", "Aisha", "Zara", "Priya", "Kavya", "Kiara", "Rajesh", "Suresh",
    "Meera", "Sunita", "Amit", "Rohit", "Pooja", "Neha", "Karan", "Varun", "Deepak", "Anjali",
];

const LAST_NAMES: [&str; 25] = [
    "Sharma", "Verma", "Gupta", "Singh", "Kumar", "Jain", "Shah", "Patel", "Mehta", "Desai",
    "Joshi", "Reddy", "Rao", "Nair", "Menon", "Iyer", "Khan", "Ahmed", "Ali", "Malik", "Das",
    "Roy", "Ghosh", "Banerjee", "Sen",
];

const CITIES: [&str; 16] = [
    "Mumbai", "Delhi", "Bangalore", "Hyderabad", "Ahmedabad", "Chennai", "Kolkata", "Surat",
    "Pune", "Jaipur", "Lucknow", "Kanpur", "Nagpur", "Indore", "Thane", "Bhopal",
];

/// Registration dates are spread over this many days before `now`.
const REGISTRATION_SPREAD_DAYS: i64 = 730;

/// Generate `count` random donors registered before `now`.
///
/// Blood groups are drawn uniformly, not from the reference distribution,
/// so a seeded store usually shows shortages.
pub fn sample_donors<R: Rng + ?Sized>(
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<DonorRecord> {
    (0..count)
        .map(|_| {
            let first = FIRST_NAMES.choose(rng).copied().unwrap_or_default();
            let last = LAST_NAMES.choose(rng).copied().unwrap_or_default();
            let group = BloodGroup::ALL.choose(rng).copied().unwrap_or(BloodGroup::OPos);
            let city = CITIES.choose(rng).copied().unwrap_or_default();
            let phone = format!("+91-{}", rng.gen_range(7_000_000_000_u64..=9_999_999_999));

            let mut donor = DonorRecord::new(format!("{first} {last}"), group.as_str(), phone, city);
            donor.available = rng.gen_bool(0.5);
            donor.registered_at =
                now - Duration::minutes(rng.gen_range(0..REGISTRATION_SPREAD_DAYS * 24 * 60));
            donor
        })
        .collect()
}
