use anyhow::{Result, bail};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Wire format is the backend's own snake_case JSON, so no field
// renaming is needed anywhere in this module except `type`.

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Encode, Decode)]
#[serde(rename_all = "lowercase")]
pub enum PlotStatus {
    #[default]
    Available,
    Reserved,
    Sold,
}

impl PlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::Available => "available",
            PlotStatus::Reserved => "reserved",
            PlotStatus::Sold => "sold",
        }
    }
}

impl std::str::FromStr for PlotStatus {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "available" => Ok(PlotStatus::Available),
            "reserved" => Ok(PlotStatus::Reserved),
            "sold" => Ok(PlotStatus::Sold),
            other => bail!("unknown plot status: {}", other),
        }
    }
}

/// One server-side gallery image of a plot.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct PlotImage {
    pub id: i64,
    pub filename: String,
    pub path: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub order: i64,
}

/// Document attached to a plot description.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq, Encode, Decode)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq, Encode, Decode)]
pub struct Description {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LandPlot {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub cadastral_numbers: Vec<String>,
    pub area: f64,
    #[serde(default)]
    pub specified_area: Option<f64>,
    pub price: i64,
    pub price_per_sotka: i64,
    #[serde(default)]
    pub price_per_meter: Option<i64>,
    pub location: String,
    pub region: String,
    pub land_category: String,
    pub permitted_use: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub communications: Vec<String>,
    #[serde(default)]
    pub status: PlotStatus,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub images: Vec<PlotImage>,
}

fn default_true() -> bool {
    true
}

/// Payload for `POST /plots/`.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq)]
pub struct LandPlotCreate {
    pub title: String,
    pub description: Description,
    pub cadastral_numbers: Vec<String>,
    pub area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specified_area: Option<f64>,
    pub price: i64,
    pub price_per_sotka: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_meter: Option<i64>,
    pub location: String,
    pub region: String,
    pub land_category: String,
    pub permitted_use: String,
    pub features: Vec<String>,
    pub communications: Vec<String>,
    pub status: PlotStatus,
    pub is_visible: bool,
}

/// Partial update payload for `PATCH /admin/plots/{id}`; unset fields
/// are left untouched server-side.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq)]
pub struct LandPlotUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadastral_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specified_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sotka: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_meter: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permitted_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlotStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

/// Catalog filters for `GET /plots/`, serialized to query parameters.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlotQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlotStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlotCount {
    pub total: u64,
}

/// One entry of the bulk reorder payload.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageOrder {
    pub id: i64,
    pub order: i64,
    pub is_main: bool,
}

/// Body of `POST /plots/{id}/images/reorder`.
#[derive(Debug, Clone, Deserialize, Default, Serialize, PartialEq, Eq)]
pub struct ImageReorderRequest {
    pub images: Vec<ImageOrder>,
}

impl ImageReorderRequest {
    /// Shape validation the caller runs before sending: ids unique,
    /// at most one main flag, orders unique. The backend rejects
    /// payloads violating these with a 422.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        let mut main_count = 0usize;
        for entry in &self.images {
            if !ids.insert(entry.id) {
                bail!("duplicate image id {} in reorder payload", entry.id);
            }
            if !orders.insert(entry.order) {
                bail!("duplicate order {} in reorder payload", entry.order);
            }
            if entry.is_main {
                main_count += 1;
            }
        }
        if main_count > 1 {
            bail!("reorder payload flags {} images as main", main_count);
        }
        Ok(())
    }
}

/// Response of `POST /plots/{id}/images/`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub id: i64,
    pub filename: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PlotStatus::Reserved).unwrap();
        assert_eq!(json, "\"reserved\"");
        let back: PlotStatus = serde_json::from_str("\"sold\"").unwrap();
        assert_eq!(back, PlotStatus::Sold);
    }

    #[test]
    fn attachment_kind_maps_to_type_key() {
        let attachment = Attachment {
            id: "a1b2c3d4".to_string(),
            name: "plan.pdf".to_string(),
            url: "/uploads/plan.pdf".to_string(),
            kind: "application/pdf".to_string(),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["type"], "application/pdf");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn plot_image_defaults_for_missing_flags() {
        let image: PlotImage =
            serde_json::from_str(r#"{"id": 7, "filename": "a.jpg", "path": "/images/a.jpg"}"#)
                .unwrap();
        assert!(!image.is_main);
        assert_eq!(image.order, 0);
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = LandPlotUpdate {
            title: Some("Участок у реки".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn reorder_validation_rejects_duplicates() {
        let request = ImageReorderRequest {
            images: vec![
                ImageOrder { id: 1, order: 0, is_main: true },
                ImageOrder { id: 1, order: 1, is_main: false },
            ],
        };
        assert!(request.validate().is_err());

        let request = ImageReorderRequest {
            images: vec![
                ImageOrder { id: 1, order: 0, is_main: true },
                ImageOrder { id: 2, order: 1, is_main: true },
            ],
        };
        assert!(request.validate().is_err());

        let request = ImageReorderRequest {
            images: vec![
                ImageOrder { id: 1, order: 0, is_main: true },
                ImageOrder { id: 2, order: 1, is_main: false },
            ],
        };
        assert!(request.validate().is_ok());
    }
}
