//! User profiles: where to deliver, which calendar credential to use, and
//! which timezone to render in.
//!
//! Backed by a single SQLite database. Destinations are matched on their
//! digits only, so `+44 7700 900123` and `447700900123` are the same number.

use chrono_tz::Tz;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    user_id         TEXT PRIMARY KEY,
    destination     TEXT,
    destination_key TEXT,
    credential      TEXT,
    timezone        TEXT
);
CREATE INDEX IF NOT EXISTS idx_profiles_destination_key ON profiles(destination_key);
"#;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile store lock poisoned")]
    Poisoned,
}

/// One user's delivery settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
    /// Messaging address (phone number for WhatsApp).
    pub destination: Option<String>,
    /// Calendar provider access token.
    pub credential: Option<String>,
    /// IANA zone name.
    pub timezone: Option<String>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            destination: None,
            credential: None,
            timezone: None,
        }
    }

    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Destination, if set and not blank.
    pub fn destination(&self) -> Option<&str> {
        non_blank(self.destination.as_deref())
    }

    /// Credential, if set and not blank.
    pub fn credential(&self) -> Option<&str> {
        non_blank(self.credential.as_deref())
    }

    /// The profile's zone, or `fallback` when unset or unknown.
    pub fn zone(&self, fallback: Tz) -> Tz {
        match self.timezone.as_deref().map(str::parse::<Tz>) {
            Some(Ok(zone)) => zone,
            Some(Err(_)) => {
                tracing::debug!(user_id = %self.user_id, "unknown profile timezone, using default");
                fallback
            }
            None => fallback,
        }
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("user_id", &self.user_id)
            .field("destination", &self.destination)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("timezone", &self.timezone)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Digits-only form of a destination address.
pub fn destination_key(destination: &str) -> String {
    destination.chars().filter(char::is_ascii_digit).collect()
}

/// Read access to profiles.
pub trait ProfileStore: Send + Sync {
    fn by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Look up the profile whose destination matches `address` on digits.
    fn by_destination(&self, address: &str) -> Result<Option<Profile>, StoreError>;

    fn all(&self) -> Result<Vec<Profile>, StoreError>;
}

/// SQLite-backed [`ProfileStore`].
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a profile.
    pub fn upsert(&self, profile: &Profile) -> Result<(), StoreError> {
        let key = profile.destination().map(destination_key);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO profiles (user_id, destination, destination_key, credential, timezone)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                destination = excluded.destination,
                destination_key = excluded.destination_key,
                credential = excluded.credential,
                timezone = excluded.timezone",
            params![
                profile.user_id,
                profile.destination,
                key,
                profile.credential,
                profile.timezone
            ],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let conn = self.lock()?;
        let profile = conn
            .query_row(
                "SELECT user_id, destination, credential, timezone FROM profiles WHERE user_id = ?1",
                params![user_id],
                row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    fn by_destination(&self, address: &str) -> Result<Option<Profile>, StoreError> {
        let key = destination_key(address);
        if key.is_empty() {
            return Ok(None);
        }
        let conn = self.lock()?;
        let profile = conn
            .query_row(
                "SELECT user_id, destination, credential, timezone FROM profiles
                 WHERE destination_key = ?1 ORDER BY user_id LIMIT 1",
                params![key],
                row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    fn all(&self) -> Result<Vec<Profile>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, destination, credential, timezone FROM profiles ORDER BY user_id",
        )?;
        let rows = stmt.query_map([], row_to_profile)?;
        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }
}

fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        destination: row.get(1)?,
        credential: row.get(2)?,
        timezone: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn store_with(profiles: &[Profile]) -> SqliteProfileStore {
        let store = SqliteProfileStore::open_in_memory().expect("open");
        for profile in profiles {
            store.upsert(profile).expect("upsert");
        }
        store
    }

    #[test]
    fn destination_matching_ignores_formatting() {
        let store = store_with(&[Profile::new("u1").with_destination("+1 234")]);
        let found = store.by_destination("1234").expect("query");
        assert_eq!(found.map(|p| p.user_id), Some("u1".to_owned()));

        let found = store.by_destination("+1-2-3-4").expect("query");
        assert!(found.is_some());
        assert!(store.by_destination("12345").expect("query").is_none());
    }

    #[test]
    fn address_without_digits_matches_nothing() {
        let store = store_with(&[Profile::new("u1")]);
        assert!(store.by_destination("whatsapp:").expect("query").is_none());
    }

    #[test]
    fn upsert_replaces_existing_profile() {
        let store = store_with(&[Profile::new("u1").with_destination("111")]);
        store
            .upsert(
                &Profile::new("u1")
                    .with_destination("222")
                    .with_credential("tok"),
            )
            .expect("upsert");

        let profile = store.by_user_id("u1").expect("query").expect("present");
        assert_eq!(profile.destination(), Some("222"));
        assert_eq!(profile.credential(), Some("tok"));
        assert!(store.by_destination("111").expect("query").is_none());
        assert_eq!(store.all().expect("all").len(), 1);
    }

    #[test]
    fn blank_fields_read_as_unset() {
        let profile = Profile::new("u1").with_destination("  ").with_credential("");
        assert_eq!(profile.destination(), None);
        assert_eq!(profile.credential(), None);
    }

    #[test]
    fn zone_falls_back_when_unknown() {
        let london = Profile::new("a").with_timezone("Europe/London");
        let bogus = Profile::new("b").with_timezone("Nowhere/Special");
        assert_eq!(london.zone(Tz::UTC), chrono_tz::Europe::London);
        assert_eq!(bogus.zone(Tz::UTC), Tz::UTC);
        assert_eq!(Profile::new("c").zone(chrono_tz::Asia::Tokyo), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn credential_is_redacted_in_debug() {
        let profile = Profile::new("u1").with_credential("ya29.secret");
        assert!(!format!("{profile:?}").contains("ya29.secret"));
    }

    #[test]
    fn open_creates_file_and_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("profiles.db");
        {
            let store = SqliteProfileStore::open(&path).expect("open");
            store.upsert(&Profile::new("u1")).expect("upsert");
        }
        let store = SqliteProfileStore::open(&path).expect("reopen");
        assert!(store.by_user_id("u1").expect("query").is_some());
    }
}
