//! Donor records as read from the donor store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blood_group::BloodGroup;

/// A registered donor.
///
/// The blood group is kept as the raw tag the donor was registered with.
/// Only the eight canonical spellings count as a group; analysis skips
/// anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorRecord {
    /// Identifier assigned by the storage layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Full name.
    pub name: String,
    /// Blood group tag as registered.
    pub blood_group: String,
    /// Phone number.
    pub phone: String,
    /// City of residence.
    pub city: String,
    /// Whether the donor is currently available to donate.
    pub available: bool,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

impl DonorRecord {
    /// Create an available donor registered now.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        blood_group: impl Into<String>,
        phone: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            blood_group: blood_group.into(),
            phone: phone.into(),
            city: city.into(),
            available: true,
            registered_at: Utc::now(),
        }
    }

    /// A donor carrying only a blood group tag, for analysis input.
    #[must_use]
    pub fn with_group(blood_group: impl Into<String>) -> Self {
        Self::new("", blood_group, "", "")
    }

    /// The blood group, if the tag is canonical.
    #[must_use]
    pub fn group(&self) -> Option<BloodGroup> {
        BloodGroup::from_canonical(&self.blood_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_donor_defaults() {
        let donor = DonorRecord::new("Asha Rao", "B+", "+91-9000000001", "Pune");
        assert!(donor.id.is_none());
        assert!(donor.available);
        assert_eq!(donor.group(), Some(BloodGroup::BPos));
    }

    #[test]
    fn test_group_of_malformed_tag() {
        assert_eq!(DonorRecord::with_group("unknown").group(), None);
        assert_eq!(DonorRecord::with_group("ab-").group(), None);
        assert_eq!(DonorRecord::with_group("b positive").group(), None);
        assert_eq!(DonorRecord::with_group("AB−").group(), Some(BloodGroup::AbNeg));
    }
}
