//! Donor table operations.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{decode_time, encode_time, Storage};
use crate::blood_group::BloodGroup;
use crate::donor::DonorRecord;
use crate::error::{Error, Result};

const DONOR_COLUMNS: &str = "id, name, blood_group, phone, city, available, registered_at";

/// Row as stored, before timestamp decoding.
struct DonorRow {
    id: i64,
    name: String,
    blood_group: String,
    phone: String,
    city: String,
    available: bool,
    registered_at: String,
}

impl DonorRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            blood_group: row.get(2)?,
            phone: row.get(3)?,
            city: row.get(4)?,
            available: row.get(5)?,
            registered_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<DonorRecord> {
        let registered_at = decode_time("donors", self.id, &self.registered_at)?;
        Ok(DonorRecord {
            id: Some(self.id),
            name: self.name,
            blood_group: self.blood_group,
            phone: self.phone,
            city: self.city,
            available: self.available,
            registered_at,
        })
    }
}

impl Storage {
    /// Insert a donor; the tag is stored as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_donor(&self, donor: &DonorRecord) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO donors (name, blood_group, phone, city, available, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                donor.name,
                donor.blood_group,
                donor.phone,
                donor.city,
                donor.available,
                encode_time(donor.registered_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, group = %donor.blood_group, "Inserted donor");
        Ok(id)
    }

    /// Insert many donors in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is inserted then.
    pub fn add_donors(&self, donors: &[DonorRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for donor in donors {
            self.add_donor(donor)?;
        }
        tx.commit()?;
        info!(count = donors.len(), "Inserted donors");
        Ok(donors.len())
    }

    /// A donor by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    pub fn get_donor(&self, id: i64) -> Result<Option<DonorRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {DONOR_COLUMNS} FROM donors WHERE id = ?1"),
                [id],
                DonorRow::from_row,
            )
            .optional()?;
        row.map(DonorRow::into_record).transpose()
    }

    /// Every donor, oldest registration first. This is the analysis snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn all_donors(&self) -> Result<Vec<DonorRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DONOR_COLUMNS} FROM donors ORDER BY registered_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map([], DonorRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(DonorRow::into_record).collect()
    }

    /// Donors, optionally restricted to one group, up to `limit`.
    ///
    /// A group matches its canonical tag, also written with a Unicode minus.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn list_donors(&self, group: Option<BloodGroup>, limit: usize) -> Result<Vec<DonorRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match group {
            Some(group) => {
                let [canonical, unicode_minus] = group.stored_spellings();
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {DONOR_COLUMNS} FROM donors WHERE blood_group IN (?1, ?2)
                     ORDER BY registered_at ASC, id ASC LIMIT ?3"
                ))?;
                let rows = stmt
                    .query_map(params![canonical, unicode_minus, limit], DonorRow::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {DONOR_COLUMNS} FROM donors ORDER BY registered_at ASC, id ASC LIMIT ?1"
                ))?;
                let rows = stmt
                    .query_map([limit], DonorRow::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        rows.into_iter().map(DonorRow::into_record).collect()
    }

    /// Number of donors.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn donor_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM donors", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove one donor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no donor has this id.
    pub fn delete_donor(&self, id: i64) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM donors WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::donor_not_found(id));
        }
        Ok(())
    }

    /// Remove every donor, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear_donors(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM donors", [])?;
        info!(count = affected, "Cleared donors");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_add_and_get() {
        let storage = storage();
        let donor = DonorRecord::new("Meera Iyer", "AB-", "+91-9000000002", "Chennai");
        let id = storage.add_donor(&donor).unwrap();

        let fetched = storage.get_donor(id).unwrap().unwrap();
        assert_eq!(fetched.id, Some(id));
        assert_eq!(fetched.name, "Meera Iyer");
        assert_eq!(fetched.blood_group, "AB-");
        assert_eq!(fetched.registered_at, donor.registered_at);
        assert!(storage.get_donor(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_malformed_tag_is_kept() {
        let storage = storage();
        storage.add_donor(&DonorRecord::with_group("unknown")).unwrap();
        let all = storage.all_donors().unwrap();
        assert_eq!(all[0].blood_group, "unknown");
        assert_eq!(all[0].group(), None);
    }

    #[test]
    fn test_add_donors_and_count() {
        let storage = storage();
        let donors: Vec<DonorRecord> = ["O+", "A+", "B-"]
            .iter()
            .map(|g| DonorRecord::with_group(*g))
            .collect();
        assert_eq!(storage.add_donors(&donors).unwrap(), 3);
        assert_eq!(storage.donor_count().unwrap(), 3);
    }

    #[test]
    fn test_list_by_group_matches_canonical_tags() {
        let storage = storage();
        for tag in ["O-", "o neg", "A+", "O−"] {
            storage.add_donor(&DonorRecord::with_group(tag)).unwrap();
        }
        let o_neg = storage.list_donors(Some(BloodGroup::ONeg), 10).unwrap();
        assert_eq!(o_neg.len(), 2);
        assert!(o_neg.iter().all(|d| d.group() == Some(BloodGroup::ONeg)));
        assert_eq!(storage.list_donors(Some(BloodGroup::ONeg), 1).unwrap().len(), 1);
        assert_eq!(storage.list_donors(None, 10).unwrap().len(), 4);
        assert_eq!(storage.list_donors(None, 3).unwrap().len(), 3);
        assert!(storage.list_donors(Some(BloodGroup::BPos), 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_by_group_uses_index() {
        let storage = storage();
        let plan: Vec<String> = storage
            .conn
            .prepare(&format!(
                "EXPLAIN QUERY PLAN SELECT {DONOR_COLUMNS} FROM donors WHERE blood_group IN (?1, ?2)
                 ORDER BY registered_at ASC, id ASC LIMIT ?3"
            ))
            .unwrap()
            .query_map(params!["O-", "O−", 10_i64], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert!(plan.iter().any(|detail| detail.contains("idx_donors_blood_group")), "{plan:?}");
    }

    #[test]
    fn test_delete_and_clear() {
        let storage = storage();
        let id = storage.add_donor(&DonorRecord::with_group("O+")).unwrap();
        storage.add_donor(&DonorRecord::with_group("A+")).unwrap();

        storage.delete_donor(id).unwrap();
        assert!(storage.delete_donor(id).unwrap_err().is_not_found());
        assert_eq!(storage.clear_donors().unwrap(), 1);
        assert_eq!(storage.donor_count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let storage = storage();
        let id = storage.add_donor(&DonorRecord::with_group("O+")).unwrap();
        storage
            .conn
            .execute("UPDATE donors SET registered_at = 'soon' WHERE id = ?1", [id])
            .unwrap();
        let err = storage.all_donors().unwrap_err();
        assert!(matches!(err, Error::CorruptRow { table: "donors", .. }));
    }
}
