// Places note and attachment files into the working copy's inbox folder.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use notesync_common::inbox::{attachment_extension, candidate_file_name, note_stem, NOTE_EXTENSION};
use notesync_common::path::{normalize_path, PathError};
use notesync_common::types::{Attachment, AttachmentKind};
use tracing::{debug, warn};

use crate::error::CommitFailure;

/// Upper bound on `-N` suffixes tried for one stem.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// What a single inbound message asks to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotePayload {
    Text(String),
    Attachment { attachment: Attachment, caption: Option<String> },
}

#[derive(Debug, Clone)]
pub struct InboxWriter {
    root: PathBuf,
    folder: String,
}

impl InboxWriter {
    /// `folder` is relative to the working-copy `root`.
    pub fn new(root: impl Into<PathBuf>, folder: &str) -> Result<Self, PathError> {
        Ok(Self { root: root.into(), folder: normalize_path(folder)? })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn folder_path(&self) -> PathBuf {
        self.root.join(&self.folder)
    }

    /// Write the payload and return the working-copy-relative paths created.
    pub fn write(
        &self,
        payload: &NotePayload,
        received_at: NaiveDateTime,
    ) -> Result<Vec<String>, CommitFailure> {
        std::fs::create_dir_all(self.folder_path())?;
        let stem = note_stem(received_at);

        match payload {
            NotePayload::Text(text) => Ok(vec![self.create(&stem, NOTE_EXTENSION, text.as_bytes())?]),
            NotePayload::Attachment { attachment, caption } => {
                let extension = attachment_extension(attachment);
                let stored = self.create(&stem, &extension, &attachment.data)?;
                let mut written = vec![stored.clone()];

                if let Some(caption) = caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                    let file_name = stored.rsplit('/').next().unwrap_or(&stored);
                    let body = caption_note(caption, file_name, attachment.kind);
                    written.push(self.create(&stem, NOTE_EXTENSION, body.as_bytes())?);
                }
                Ok(written)
            }
        }
    }

    /// Remove files returned by an earlier [`InboxWriter::write`] whose
    /// commit failed, so a later commit does not pick them up.
    pub fn discard(&self, written: &[String]) {
        for relative in written {
            match std::fs::remove_file(self.root.join(relative)) {
                Ok(()) => debug!(path = %relative, "discarded inbox file"),
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => warn!(path = %relative, %error, "failed to discard inbox file"),
            }
        }
    }

    /// Create `<folder>/<stem>[-N].<ext>` without overwriting anything.
    fn create(&self, stem: &str, extension: &str, contents: &[u8]) -> Result<String, CommitFailure> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let relative = normalize_path(&format!(
                "{}/{}",
                self.folder,
                candidate_file_name(stem, extension, attempt)
            ))?;
            let absolute = self.root.join(&relative);

            match OpenOptions::new().write(true).create_new(true).open(&absolute) {
                Ok(mut file) => {
                    file.write_all(contents)?;
                    file.sync_all()?;
                    debug!(path = %relative, bytes = contents.len(), "wrote inbox file");
                    return Ok(relative);
                }
                Err(error) if error.kind() == ErrorKind::AlreadyExists => continue,
                Err(error) => return Err(error.into()),
            }
        }

        Err(CommitFailure::Io(format!(
            "no free file name for `{stem}.{extension}` in `{}`",
            self.folder_path().display()
        )))
    }
}

fn caption_note(caption: &str, file_name: &str, kind: AttachmentKind) -> String {
    match kind {
        AttachmentKind::Photo => format!("{caption}\n\n![]({file_name})\n"),
        AttachmentKind::Document => format!("{caption}\n\n[{file_name}]({file_name})\n"),
    }
}
