pub mod collection;
pub mod commit;
pub mod item;
pub mod preview;
