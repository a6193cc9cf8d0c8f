use anyhow::Result;
use bitcode::{Decode, Encode};

use crate::common::{DRAFT_IMAGES_KEY, DRAFT_KEY};
use crate::media::item::MediaItem;
use crate::models::plot::{Attachment, PlotStatus};
use crate::store::{DRAFT_TABLE, Store};

/// Unsaved create-plot form state, mirrored to disk on every change and
/// restored on the next run. Image binaries are never stored here; the
/// draft image list keeps source paths and fingerprints instead.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct PlotDraft {
    pub title: String,
    pub description: String,
    pub cadastral_numbers: Vec<String>,
    pub area: Option<f64>,
    pub specified_area: Option<f64>,
    pub price: Option<i64>,
    pub location: String,
    pub region: String,
    pub land_category: String,
    pub permitted_use: String,
    pub features: Vec<String>,
    pub communications: Vec<String>,
    pub status: PlotStatus,
    pub is_visible: bool,
    pub attachments: Vec<Attachment>,
}

impl Default for PlotDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            cadastral_numbers: Vec::new(),
            area: None,
            specified_area: None,
            price: None,
            location: String::new(),
            region: String::new(),
            land_category: String::new(),
            permitted_use: String::new(),
            features: Vec::new(),
            communications: Vec::new(),
            status: PlotStatus::Available,
            is_visible: true,
            attachments: Vec::new(),
        }
    }
}

impl PlotDraft {
    /// An untouched form. Blank drafts are not worth persisting.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

impl Store {
    pub fn save_draft(&self, draft: &PlotDraft) -> Result<()> {
        if draft.is_blank() {
            return self.remove_key(DRAFT_TABLE, DRAFT_KEY);
        }
        let bytes = bitcode::encode(draft);
        self.write_bytes(DRAFT_TABLE, DRAFT_KEY, &bytes)
    }

    pub fn load_draft(&self) -> Result<Option<PlotDraft>> {
        match self.read_bytes(DRAFT_TABLE, DRAFT_KEY)? {
            Some(bytes) => Ok(Some(bitcode::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save_draft_images(&self, items: &[MediaItem]) -> Result<()> {
        if items.is_empty() {
            return self.remove_key(DRAFT_TABLE, DRAFT_IMAGES_KEY);
        }
        let bytes = bitcode::encode(items);
        self.write_bytes(DRAFT_TABLE, DRAFT_IMAGES_KEY, &bytes)
    }

    pub fn load_draft_images(&self) -> Result<Vec<MediaItem>> {
        match self.read_bytes(DRAFT_TABLE, DRAFT_IMAGES_KEY)? {
            Some(bytes) => Ok(bitcode::decode(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Forgets the form and its staged image list in one go.
    pub fn clear_draft(&self) -> Result<()> {
        self.remove_key(DRAFT_TABLE, DRAFT_KEY)?;
        self.remove_key(DRAFT_TABLE, DRAFT_IMAGES_KEY)
    }
}
