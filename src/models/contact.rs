use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct SocialLink {
    pub enabled: bool,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct SocialLinks {
    #[serde(default)]
    pub whatsapp: SocialLink,
    #[serde(default)]
    pub telegram: SocialLink,
    #[serde(default)]
    pub vk: SocialLink,
}

#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct WorkHours {
    #[serde(default)]
    pub monday_friday: String,
    #[serde(default)]
    pub saturday_sunday: String,
}

/// Site-wide contact block, `GET /contacts`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ContactInfo {
    pub id: i64,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub work_hours: WorkHours,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Body of `PUT /contacts`.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct ContactInfoPayload {
    pub phone: String,
    pub email: String,
    pub address: String,
    pub work_hours: WorkHours,
    pub social_links: SocialLinks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_info_tolerates_missing_optional_blocks() {
        let json = r#"{
            "id": 1,
            "phone": "+7 (900) 123-45-67",
            "email": "info@altailand.ru",
            "address": "г. Барнаул"
        }"#;
        let info: ContactInfo = serde_json::from_str(json).unwrap();
        assert!(!info.social_links.telegram.enabled);
        assert_eq!(info.work_hours.monday_friday, "");
    }
}
