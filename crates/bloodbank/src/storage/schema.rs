//! `SQLite` schema definitions for bloodbank.

/// Registered donors. `blood_group` keeps the tag as entered.
pub const CREATE_DONORS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS donors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    blood_group TEXT NOT NULL,
    phone TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    available INTEGER NOT NULL DEFAULT 1,
    registered_at TEXT NOT NULL
)
";

/// Index on `blood_group` for per-group listing.
pub const CREATE_DONOR_GROUP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_donors_blood_group ON donors(blood_group)
";

/// Stored alerts.
///
/// `priority` is the numeric level (1 low .. 5 emergency) so it sorts
/// correctly. Timestamps are RFC 3339 in UTC with a fixed width, so they
/// compare correctly as text.
pub const CREATE_ALERTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    scope TEXT NOT NULL,
    priority INTEGER NOT NULL,
    alert_type TEXT NOT NULL,
    location TEXT,
    contact TEXT,
    required_units INTEGER,
    expires_at TEXT,
    created_at TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    fingerprint TEXT NOT NULL
)
";

/// Index serving the active-alert listing order.
pub const CREATE_ALERT_ACTIVE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_alerts_active
    ON alerts(is_active, priority DESC, created_at DESC)
";

/// Index on `fingerprint` for deduplication.
pub const CREATE_ALERT_FINGERPRINT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_alerts_fingerprint ON alerts(fingerprint)
";

/// Index on `expires_at` for cleanup.
pub const CREATE_ALERT_EXPIRY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_alerts_expires_at ON alerts(expires_at)
";

/// Key-value metadata, including the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DONORS_TABLE,
    CREATE_DONOR_GROUP_INDEX,
    CREATE_ALERTS_TABLE,
    CREATE_ALERT_ACTIVE_INDEX,
    CREATE_ALERT_FINGERPRINT_INDEX,
    CREATE_ALERT_EXPIRY_INDEX,
    CREATE_METADATA_TABLE,
];
