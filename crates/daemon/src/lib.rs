// notesync-daemon library: repository sync plus the note intake service.

pub mod config;
pub mod error;
pub mod git;
pub mod inbox;
pub mod intake;
pub mod runtime;
