// Message handling: authorize the sender, store the note, commit, reply.
//
// Transport-neutral: a chat bridge hands over `InboundMessage`s and sends
// the returned `Acknowledgment` back to the conversation. The reply is only
// positive after the commit went through.

use chrono::{Local, NaiveDateTime};
use notesync_common::types::{Acknowledgment, InboundMessage};
use tracing::{info, warn};

use crate::git::queue::{CommitQueue, NoteJob, SubmitError};
use crate::inbox::NotePayload;

pub const START_REPLY: &str = "Just send the note to create one.";
pub const CREATED_REPLY: &str = "Note created!";
pub const UNAUTHORIZED_REPLY: &str = "Sorry, you are not allowed to add notes here.";
pub const EMPTY_REPLY: &str = "Nothing to save: send text, a photo or a document.";

pub const NOTE_COMMIT_MESSAGE: &str = "Auto commit for inbox note";
pub const ATTACHMENT_COMMIT_MESSAGE: &str = "Auto commit for inbox attachment";

#[derive(Debug, Clone)]
pub struct Intake {
    queue: CommitQueue,
    authorized_sender: Option<String>,
}

impl Intake {
    pub fn new(queue: CommitQueue, authorized_sender: Option<String>) -> Self {
        Self { queue, authorized_sender }
    }

    pub async fn handle(&self, message: InboundMessage) -> Acknowledgment {
        self.handle_at(message, Local::now().naive_local()).await
    }

    /// Like [`Intake::handle`] with an explicit receive time (names the files).
    pub async fn handle_at(&self, message: InboundMessage, received_at: NaiveDateTime) -> Acknowledgment {
        let chat_id = message.chat_id;

        if message.is_start_command() {
            return Acknowledgment::ok(chat_id, START_REPLY);
        }
        if !self.is_authorized(&message.sender) {
            warn!(sender = %message.sender, chat_id, "rejected message from unauthorized sender");
            return Acknowledgment::failed(chat_id, UNAUTHORIZED_REPLY);
        }

        let Some((payload, commit_message)) = classify(message) else {
            return Acknowledgment::failed(chat_id, EMPTY_REPLY);
        };

        match self.queue.submit(NoteJob::new(payload, received_at, commit_message)).await {
            Ok(outcome) => {
                info!(job_id = %outcome.job_id, chat_id, files = ?outcome.written, "note stored");
                Acknowledgment::ok(chat_id, CREATED_REPLY)
            }
            Err(SubmitError::Closed) => {
                warn!(chat_id, "commit queue closed; note dropped");
                Acknowledgment::failed(chat_id, "Failed to save note: the service is shutting down.")
            }
            Err(SubmitError::Repo(error)) => {
                warn!(chat_id, %error, "failed to store note");
                Acknowledgment::failed(chat_id, format!("Failed to save note: {error}"))
            }
        }
    }

    fn is_authorized(&self, sender: &str) -> bool {
        self.authorized_sender.as_deref().is_none_or(|allowed| allowed == sender)
    }
}

fn classify(message: InboundMessage) -> Option<(NotePayload, &'static str)> {
    if let Some(attachment) = message.attachment {
        let caption = message.caption.or(message.text);
        return Some((NotePayload::Attachment { attachment, caption }, ATTACHMENT_COMMIT_MESSAGE));
    }

    message
        .text
        .filter(|text| !text.trim().is_empty())
        .map(|text| (NotePayload::Text(text), NOTE_COMMIT_MESSAGE))
}
