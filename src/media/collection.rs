use std::collections::HashSet;

use anyhow::{Result, bail};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::media::item::{MediaId, MediaItem};
use crate::media::preview::StagedFile;
use crate::models::plot::{ImageOrder, ImageReorderRequest, PlotImage, UploadedImage};

/// Ordered image set of one plot, edited locally and pushed to the
/// backend by [`commit`](crate::media::commit::commit).
///
/// Two invariants hold after every operation: display order is the
/// contiguous range `0..n` matching the visual order, and a non-empty
/// collection has exactly one main item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct MediaCollection {
    items: Vec<MediaItem>,
}

impl MediaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the collection from the backend's image list. Rows come
    /// back in storage order with an untrusted main flag, so they are
    /// sorted and normalized before use.
    pub fn from_server(images: &[PlotImage]) -> Self {
        let mut rows: Vec<&PlotImage> = images.iter().collect();
        rows.sort_by_key(|image| image.order);
        let items = rows.into_iter().map(MediaItem::from_server).collect();
        let mut collection = Self { items };
        collection.reindex();
        collection.ensure_single_main();
        collection
    }

    /// Rebuilds a collection from items persisted in the store, with
    /// the same normalization as [`from_server`](Self::from_server).
    pub fn from_items(mut items: Vec<MediaItem>) -> Self {
        items.sort_by_key(|item| item.order);
        let mut collection = Self { items };
        collection.reindex();
        collection.ensure_single_main();
        collection
    }

    fn reindex(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.order = index;
        }
    }

    /// First flagged item wins; with no flag at all the first item is
    /// promoted.
    fn ensure_single_main(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let main_index = self
            .items
            .iter()
            .position(|item| item.is_main)
            .unwrap_or(0);
        for (index, item) in self.items.iter_mut().enumerate() {
            item.is_main = index == main_index;
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: MediaId) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn main_item(&self) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.is_main)
    }

    fn position(&self, id: MediaId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Appends staged files. Orders continue after the current maximum;
    /// the first file of the batch becomes main only when the collection
    /// was empty before the call.
    pub fn add_files(&mut self, staged: Vec<StagedFile>) -> Vec<MediaId> {
        let was_empty = self.items.is_empty();
        let next_order = self
            .items
            .iter()
            .map(|item| item.order + 1)
            .max()
            .unwrap_or(0);
        let mut added = Vec::with_capacity(staged.len());
        for (index, file) in staged.into_iter().enumerate() {
            let mut item = MediaItem::new_local(
                file.source.to_string_lossy().into_owned(),
                file.preview.to_string_lossy().into_owned(),
                file.fingerprint,
                file.filename,
            );
            item.order = next_order + index;
            item.is_main = was_empty && index == 0;
            added.push(item.id());
            self.items.push(item);
        }
        self.reindex();
        added
    }

    /// Removes the item. When the main item goes away the first survivor
    /// is promoted. Returns false for an unknown id.
    pub fn remove(&mut self, id: MediaId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let removed = self.items.remove(index);
        if removed.is_main {
            if let Some(first) = self.items.first_mut() {
                first.is_main = true;
            }
        }
        self.reindex();
        true
    }

    /// Flags the matching item as main and clears the flag everywhere
    /// else. Unknown ids are a no-op.
    pub fn set_main(&mut self, id: MediaId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        for item in self.items.iter_mut() {
            item.is_main = item.id() == id;
        }
        true
    }

    /// Moves the item at `from` so it ends up at position `to`. Indices
    /// outside the collection are rejected rather than clamped.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        if from >= len || to >= len {
            bail!("reorder index out of range: {} -> {} with {} items", from, to, len);
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.reindex();
        Ok(())
    }

    /// Convenience: moves the main item to position 0. The main-image
    /// invariant does not depend on this.
    pub fn promote_main_to_front(&mut self) {
        let Some(index) = self.items.iter().position(|item| item.is_main) else {
            return;
        };
        if index == 0 {
            return;
        }
        let item = self.items.remove(index);
        self.items.insert(0, item);
        self.reindex();
    }

    /// Server ids the operator kept. Anything on the backend outside this
    /// set is scheduled for deletion on commit.
    pub fn kept_server_ids(&self) -> HashSet<i64> {
        self.items.iter().filter_map(MediaItem::server_id).collect()
    }

    pub fn new_items(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(|item| item.is_new())
    }

    pub(crate) fn promote(&mut self, id: MediaId, uploaded: &UploadedImage) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                item.promote(uploaded);
                true
            }
            None => false,
        }
    }

    /// Bulk order/main payload covering the surviving backend rows.
    /// Client-side items are excluded; their flags travel with the upload
    /// itself.
    pub fn reorder_payload(&self) -> ImageReorderRequest {
        let images = self
            .items
            .iter()
            .filter_map(|item| item.server_id().map(|id| (id, item.is_main)))
            .enumerate()
            .map(|(index, (id, is_main))| ImageOrder {
                id,
                order: index as i64,
                is_main,
            })
            .collect();
        ImageReorderRequest { images }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use arrayvec::ArrayString;

    use super::*;

    fn image(id: i64, order: i64, is_main: bool) -> PlotImage {
        PlotImage {
            id,
            filename: format!("img{}.jpg", id),
            path: format!("/uploads/plots/img{}.jpg", id),
            is_main,
            order,
        }
    }

    fn staged(name: &str) -> StagedFile {
        StagedFile {
            source: PathBuf::from(format!("/tmp/in/{}", name)),
            filename: name.to_string(),
            preview: PathBuf::from(format!("/tmp/previews/{}.jpg", name)),
            fingerprint: ArrayString::from("0".repeat(64).as_str()).unwrap(),
            width: 100,
            height: 80,
        }
    }

    fn assert_invariants(collection: &MediaCollection) {
        let orders: Vec<usize> = collection.items().iter().map(|item| item.order).collect();
        let expected: Vec<usize> = (0..collection.len()).collect();
        assert_eq!(orders, expected);
        if !collection.is_empty() {
            let mains = collection
                .items()
                .iter()
                .filter(|item| item.is_main)
                .count();
            assert_eq!(mains, 1);
        }
    }

    #[test]
    fn server_rows_are_sorted_and_normalized() {
        let rows = vec![
            image(3, 2, true),
            image(1, 0, false),
            image(2, 1, true),
        ];
        let collection = MediaCollection::from_server(&rows);

        let ids: Vec<MediaId> = collection.items().iter().map(|item| item.id()).collect();
        assert_eq!(
            ids,
            vec![MediaId::Server(1), MediaId::Server(2), MediaId::Server(3)]
        );
        // Two rows were flagged; the first one in display order wins.
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(2));
        assert_invariants(&collection);
    }

    #[test]
    fn server_rows_without_main_promote_the_first() {
        let rows = vec![image(5, 0, false), image(6, 1, false)];
        let collection = MediaCollection::from_server(&rows);
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(5));
        assert_invariants(&collection);
    }

    #[test]
    fn first_file_of_first_batch_becomes_main() {
        let mut collection = MediaCollection::new();
        collection.add_files(vec![staged("a.jpg"), staged("b.jpg")]);
        assert!(collection.items()[0].is_main);
        assert!(!collection.items()[1].is_main);
        assert_invariants(&collection);

        // A later batch never steals the main flag.
        collection.add_files(vec![staged("c.jpg")]);
        assert!(collection.items()[0].is_main);
        assert_eq!(collection.len(), 3);
        assert_invariants(&collection);
    }

    #[test]
    fn removing_the_main_item_promotes_the_first_survivor() {
        let rows = vec![image(1, 0, true), image(2, 1, false), image(3, 2, false)];
        let mut collection = MediaCollection::from_server(&rows);

        assert!(collection.remove(MediaId::Server(1)));

        let survivors: Vec<MediaId> =
            collection.items().iter().map(|item| item.id()).collect();
        assert_eq!(survivors, vec![MediaId::Server(2), MediaId::Server(3)]);
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(2));
        assert_invariants(&collection);
    }

    #[test]
    fn removing_the_only_item_empties_the_collection() {
        let mut collection = MediaCollection::from_server(&[image(1, 0, true)]);
        assert!(collection.remove(MediaId::Server(1)));
        assert!(collection.is_empty());
        assert!(collection.main_item().is_none());
        assert_invariants(&collection);
    }

    #[test]
    fn remove_of_unknown_id_is_a_no_op() {
        let mut collection = MediaCollection::from_server(&[image(1, 0, true)]);
        assert!(!collection.remove(MediaId::Server(99)));
        assert_eq!(collection.len(), 1);
        assert_invariants(&collection);
    }

    #[test]
    fn reorder_moves_and_reindexes() {
        let rows = vec![image(1, 0, true), image(2, 1, false), image(3, 2, false)];
        let mut collection = MediaCollection::from_server(&rows);

        collection.reorder(0, 2).unwrap();

        let ids: Vec<MediaId> = collection.items().iter().map(|item| item.id()).collect();
        assert_eq!(
            ids,
            vec![MediaId::Server(2), MediaId::Server(3), MediaId::Server(1)]
        );
        assert_invariants(&collection);
    }

    #[test]
    fn reorder_rejects_out_of_range_indices() {
        let mut collection = MediaCollection::from_server(&[image(1, 0, true), image(2, 1, false)]);
        let before = collection.clone();
        assert!(collection.reorder(0, 2).is_err());
        assert!(collection.reorder(5, 0).is_err());
        assert_eq!(collection, before);
    }

    #[test]
    fn set_main_is_exclusive() {
        let rows = vec![image(1, 0, true), image(2, 1, false), image(3, 2, false)];
        let mut collection = MediaCollection::from_server(&rows);

        assert!(collection.set_main(MediaId::Server(3)));
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(3));
        assert_invariants(&collection);

        assert!(!collection.set_main(MediaId::Server(99)));
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(3));
    }

    #[test]
    fn promote_main_to_front_moves_without_reflagging() {
        let rows = vec![image(1, 0, false), image(2, 1, true), image(3, 2, false)];
        let mut collection = MediaCollection::from_server(&rows);

        collection.promote_main_to_front();

        let ids: Vec<MediaId> = collection.items().iter().map(|item| item.id()).collect();
        assert_eq!(
            ids,
            vec![MediaId::Server(2), MediaId::Server(1), MediaId::Server(3)]
        );
        assert_eq!(collection.main_item().unwrap().id(), MediaId::Server(2));
        assert_invariants(&collection);
    }

    #[test]
    fn invariants_hold_across_mixed_operations() {
        let mut collection = MediaCollection::from_server(&[
            image(1, 0, true),
            image(2, 1, false),
        ]);
        assert_invariants(&collection);

        let added = collection.add_files(vec![staged("a.jpg"), staged("b.jpg")]);
        assert_invariants(&collection);

        collection.set_main(added[1]);
        assert_invariants(&collection);

        collection.reorder(3, 0).unwrap();
        assert_invariants(&collection);

        collection.remove(added[1]);
        assert_invariants(&collection);

        collection.remove(MediaId::Server(1));
        assert_invariants(&collection);

        collection.promote_main_to_front();
        assert_invariants(&collection);

        collection.remove(MediaId::Server(2));
        collection.remove(added[0]);
        assert!(collection.is_empty());
        assert_invariants(&collection);
    }

    #[test]
    fn reorder_payload_covers_only_backend_rows() {
        let mut collection = MediaCollection::from_server(&[
            image(10, 0, true),
            image(11, 1, false),
        ]);
        collection.add_files(vec![staged("new.jpg")]);
        collection.reorder(0, 2).unwrap();

        let payload = collection.reorder_payload();
        payload.validate().unwrap();

        let ids: Vec<i64> = payload.images.iter().map(|image| image.id).collect();
        assert_eq!(ids, vec![11, 10]);
        let orders: Vec<i64> = payload.images.iter().map(|image| image.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert!(payload.images.iter().any(|image| image.is_main));
    }
}
