use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use arrayvec::ArrayString;
use bitcode::{Decode, Encode};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::common::CLIENT_ID_LENGTH;
use crate::models::plot::{PlotImage, UploadedImage};

/// Identity a locally added image carries until the backend assigns it a
/// numeric id.
pub type ClientId = ArrayString<CLIENT_ID_LENGTH>;

/// Identity of one media item. Rows loaded from the backend are keyed by
/// their database id; items staged locally get a random client id that is
/// replaced on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum MediaId {
    Server(i64),
    Client(ClientId),
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Server(id) => write!(f, "{}", id),
            MediaId::Client(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for MediaId {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            bail!("empty media id");
        }
        if raw.chars().all(|c| c.is_ascii_digit()) {
            return Ok(MediaId::Server(raw.parse()?));
        }
        let id = ClientId::from(raw)
            .map_err(|_| anyhow!("client id too long (max {} chars): {}", CLIENT_ID_LENGTH, raw))?;
        Ok(MediaId::Client(id))
    }
}

/// Where an item's bytes live. `Existing` is a row already stored by the
/// backend; `New` is a staged local file together with its generated
/// preview and content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum MediaOrigin {
    Existing {
        id: i64,
        path: String,
    },
    New {
        id: ClientId,
        file: String,
        preview: String,
        fingerprint: ArrayString<64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct MediaItem {
    pub origin: MediaOrigin,
    pub filename: String,
    pub order: usize,
    pub is_main: bool,
}

impl MediaItem {
    pub fn from_server(image: &PlotImage) -> Self {
        Self {
            origin: MediaOrigin::Existing {
                id: image.id,
                path: image.path.clone(),
            },
            filename: image.filename.clone(),
            order: image.order.max(0) as usize,
            is_main: image.is_main,
        }
    }

    /// Wraps a staged local file. Order and main flag are assigned by the
    /// collection when the item is inserted.
    pub fn new_local(
        file: String,
        preview: String,
        fingerprint: ArrayString<64>,
        filename: String,
    ) -> Self {
        Self {
            origin: MediaOrigin::New {
                id: generate_client_id(),
                file,
                preview,
                fingerprint,
            },
            filename,
            order: 0,
            is_main: false,
        }
    }

    pub fn id(&self) -> MediaId {
        match &self.origin {
            MediaOrigin::Existing { id, .. } => MediaId::Server(*id),
            MediaOrigin::New { id, .. } => MediaId::Client(*id),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self.origin, MediaOrigin::New { .. })
    }

    pub fn server_id(&self) -> Option<i64> {
        match &self.origin {
            MediaOrigin::Existing { id, .. } => Some(*id),
            MediaOrigin::New { .. } => None,
        }
    }

    /// Path of the staged source file, for items not yet uploaded.
    pub fn source_file(&self) -> Option<&str> {
        match &self.origin {
            MediaOrigin::New { file, .. } => Some(file),
            MediaOrigin::Existing { .. } => None,
        }
    }

    /// Rewrites a `New` item into the `Existing` row the backend created
    /// for it. The backend renames files on disk, so the stored filename
    /// is taken from the response.
    pub fn promote(&mut self, uploaded: &UploadedImage) {
        self.origin = MediaOrigin::Existing {
            id: uploaded.id,
            path: uploaded.path.clone(),
        };
        self.filename = uploaded.filename.clone();
    }
}

/// Random identity for locally added items, distinct in shape from any
/// numeric backend id.
pub fn generate_client_id() -> ClientId {
    let raw: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(CLIENT_ID_LENGTH)
        .map(char::from)
        .collect();
    ClientId::from(&raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_are_lowercase_and_unique() {
        let first = generate_client_id();
        let second = generate_client_id();
        assert_eq!(first.len(), CLIENT_ID_LENGTH);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
        assert_ne!(first, second);
    }

    #[test]
    fn numeric_strings_parse_as_server_ids() {
        assert_eq!("42".parse::<MediaId>().unwrap(), MediaId::Server(42));
        assert!(matches!(
            "a1b2c3".parse::<MediaId>().unwrap(),
            MediaId::Client(_)
        ));
        assert!("".parse::<MediaId>().is_err());
        assert!("x".repeat(40).parse::<MediaId>().is_err());
    }

    #[test]
    fn upload_promotes_to_server_identity() {
        let fingerprint = ArrayString::from("ff".repeat(32).as_str()).unwrap();
        let mut item = MediaItem::new_local(
            "/tmp/in/lake.jpg".to_string(),
            "/tmp/previews/lake.jpg".to_string(),
            fingerprint,
            "lake.jpg".to_string(),
        );
        assert!(item.is_new());
        assert!(item.server_id().is_none());

        item.promote(&UploadedImage {
            id: 7,
            filename: "20260825_lake.jpg".to_string(),
            path: "/uploads/plots/20260825_lake.jpg".to_string(),
        });

        assert_eq!(item.id(), MediaId::Server(7));
        assert_eq!(item.filename, "20260825_lake.jpg");
        assert!(!item.is_new());
    }
}
