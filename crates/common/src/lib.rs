// notesync-common: shared types and naming rules for the notesync workspace

pub mod inbox;
pub mod path;
pub mod types;
