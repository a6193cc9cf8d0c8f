use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::models::admin::AdminSession;
use crate::store::{SESSION_TABLE, Store};

const SESSION_KEY: &str = "admin_session";

impl Store {
    pub fn save_session(&self, session: &AdminSession) -> Result<()> {
        let bytes = serde_json::to_vec(session)?;
        self.write_bytes(SESSION_TABLE, SESSION_KEY, &bytes)
    }

    /// Returns the stored session. An expired one is dropped on the spot
    /// instead of being handed out.
    pub fn load_session(&self) -> Result<Option<AdminSession>> {
        let Some(bytes) = self.read_bytes(SESSION_TABLE, SESSION_KEY)? else {
            return Ok(None);
        };
        let session: AdminSession = serde_json::from_slice(&bytes)?;
        if session.expires_at <= Utc::now().naive_utc() {
            info!("Stored admin session expired, clearing it");
            self.clear_session()?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove_key(SESSION_TABLE, SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::admin::AdminSession;
    use crate::store::temp_store;

    #[test]
    fn session_round_trip() {
        let store = temp_store();
        let session = AdminSession {
            session_token: "c0ffee".to_string(),
            expires_at: (Utc::now() + Duration::hours(8)).naive_utc(),
        };
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn expired_sessions_are_dropped_on_load() {
        let store = temp_store();
        let session = AdminSession {
            session_token: "stale".to_string(),
            expires_at: (Utc::now() - Duration::minutes(1)).naive_utc(),
        };
        store.save_session(&session).unwrap();

        assert_eq!(store.load_session().unwrap(), None);
        // The stale entry is gone, not just filtered.
        assert_eq!(store.load_session().unwrap(), None);
    }
}
