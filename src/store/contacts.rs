use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CONTACTS_CACHE_KEY, CONTACTS_CACHE_TTL_SECS};
use crate::models::contact::ContactInfo;
use crate::store::{CACHE_TABLE, Store};

/// Contacts payload together with the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedContacts {
    pub data: ContactInfo,
    pub timestamp: DateTime<Utc>,
}

impl CachedContacts {
    pub fn is_fresh(&self) -> bool {
        (Utc::now() - self.timestamp).num_seconds() < CONTACTS_CACHE_TTL_SECS
    }
}

impl Store {
    pub fn save_contacts_cache(&self, contacts: &ContactInfo) -> Result<()> {
        let cached = CachedContacts {
            data: contacts.clone(),
            timestamp: Utc::now(),
        };
        let bytes = serde_json::to_vec(&cached)?;
        self.write_bytes(CACHE_TABLE, CONTACTS_CACHE_KEY, &bytes)
    }

    pub fn load_contacts_cache(&self) -> Result<Option<CachedContacts>> {
        match self.read_bytes(CACHE_TABLE, CONTACTS_CACHE_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn plant_contacts_cache(&self, cached: &CachedContacts) -> Result<()> {
        let bytes = serde_json::to_vec(cached)?;
        self.write_bytes(CACHE_TABLE, CONTACTS_CACHE_KEY, &bytes)
    }
}
