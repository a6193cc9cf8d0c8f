use std::sync::Arc;

use log::warn;

use crate::api::{ApiClient, ApiResult};
use crate::models::contact::{ContactInfo, ContactInfoPayload};

impl ApiClient {
    pub async fn get_contacts(&self) -> ApiResult<ContactInfo> {
        self.get_json("/contacts").await
    }

    pub async fn update_contacts(&self, payload: &ContactInfoPayload) -> ApiResult<ContactInfo> {
        let updated: ContactInfo = self.put_admin_json("/contacts", payload).await?;
        self.store().save_contacts_cache(&updated)?;
        Ok(updated)
    }
}

/// Contact details barely change, so reads go through the store cache
/// (1 hour TTL). A fresh entry is returned as-is while a refresh runs
/// in the background; a stale entry is refreshed inline and kept as
/// fallback when the backend is unreachable.
pub async fn fetch_contacts_cached(client: &Arc<ApiClient>) -> ApiResult<ContactInfo> {
    let cached = client.store().load_contacts_cache()?;
    if let Some(entry) = &cached {
        if entry.is_fresh() {
            let background = Arc::clone(client);
            tokio::spawn(async move {
                if let Err(err) = refresh_contacts(&background).await {
                    warn!("Background contacts refresh failed: {}", err);
                }
            });
            return Ok(entry.data.clone());
        }
    }
    match refresh_contacts(client).await {
        Ok(contacts) => Ok(contacts),
        Err(err) => match cached {
            Some(entry) => {
                warn!("Serving stale contacts, refresh failed: {}", err);
                Ok(entry.data)
            }
            None => Err(err),
        },
    }
}

async fn refresh_contacts(client: &ApiClient) -> ApiResult<ContactInfo> {
    let contacts = client.get_contacts().await?;
    client.store().save_contacts_cache(&contacts)?;
    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::store::contacts::CachedContacts;
    use crate::store::temp_store;

    fn unreachable_client() -> Arc<ApiClient> {
        let store = Arc::new(temp_store());
        // Discard port, nothing listens there.
        Arc::new(
            ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200), store).unwrap(),
        )
    }

    fn contacts() -> ContactInfo {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "phone": "+7 (999) 123-45-67",
            "email": "info@altailand.ru",
            "address": "г. Горно-Алтайск",
            "work_hours": {"monday_friday": "9:00-18:00", "saturday_sunday": "выходной"},
            "social_links": {
                "whatsapp": {"enabled": true, "username": "79991234567"},
                "telegram": {"enabled": true, "username": "altailand"},
                "vk": {"enabled": false, "username": ""}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_waiting_on_the_backend() {
        let client = unreachable_client();
        client.store().save_contacts_cache(&contacts()).unwrap();

        let served = fetch_contacts_cached(&client).await.unwrap();
        assert_eq!(served, contacts());
    }

    #[tokio::test]
    async fn stale_cache_is_the_fallback_when_refresh_fails() {
        let client = unreachable_client();
        let stale = CachedContacts {
            data: contacts(),
            timestamp: Utc::now() - chrono::Duration::hours(3),
        };
        client.store().plant_contacts_cache(&stale).unwrap();

        let served = fetch_contacts_cached(&client).await.unwrap();
        assert_eq!(served, contacts());
    }

    #[tokio::test]
    async fn empty_cache_surfaces_the_fetch_error() {
        let client = unreachable_client();
        let result = fetch_contacts_cached(&client).await;
        assert!(result.is_err());
    }
}
