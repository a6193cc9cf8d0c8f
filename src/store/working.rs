use anyhow::Result;

use crate::media::collection::MediaCollection;
use crate::store::{DRAFT_TABLE, Store};

fn working_key(plot_id: i64) -> String {
    format!("plot_media:{}", plot_id)
}

/// Per-plot media edits in progress. `media pull` seeds the set from the
/// backend, every edit writes it back, and a clean commit clears it.
impl Store {
    pub fn save_working_set(&self, plot_id: i64, collection: &MediaCollection) -> Result<()> {
        let bytes = bitcode::encode(collection);
        self.write_bytes(DRAFT_TABLE, &working_key(plot_id), &bytes)
    }

    pub fn load_working_set(&self, plot_id: i64) -> Result<Option<MediaCollection>> {
        match self.read_bytes(DRAFT_TABLE, &working_key(plot_id))? {
            Some(bytes) => Ok(Some(bitcode::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn clear_working_set(&self, plot_id: i64) -> Result<()> {
        self.remove_key(DRAFT_TABLE, &working_key(plot_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::media::collection::MediaCollection;
    use crate::models::plot::PlotImage;
    use crate::store::temp_store;

    fn image(id: i64, order: i64, is_main: bool) -> PlotImage {
        PlotImage {
            id,
            filename: format!("img{}.jpg", id),
            path: format!("/uploads/plots/img{}.jpg", id),
            is_main,
            order,
        }
    }

    #[test]
    fn working_sets_are_kept_per_plot() {
        let store = temp_store();
        let first = MediaCollection::from_server(&[image(1, 0, true), image(2, 1, false)]);
        let second = MediaCollection::from_server(&[image(9, 0, true)]);

        store.save_working_set(7, &first).unwrap();
        store.save_working_set(8, &second).unwrap();

        assert_eq!(store.load_working_set(7).unwrap(), Some(first));
        assert_eq!(store.load_working_set(8).unwrap(), Some(second));
        assert_eq!(store.load_working_set(9).unwrap(), None);

        store.clear_working_set(7).unwrap();
        assert_eq!(store.load_working_set(7).unwrap(), None);
        assert!(store.load_working_set(8).unwrap().is_some());
    }
}
