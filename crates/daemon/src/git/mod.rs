// Git sync: credential, binding, change detection, publishing, commit queue.

pub mod binding;
pub mod changes;
pub mod credentials;
pub mod publisher;
pub mod queue;
pub mod remote;
pub mod worker;

pub use binding::{bind, open, CommitterIdentity, RepositoryConfig, RepositoryHandle};
pub use changes::{detect_changes, ChangeSet};
pub use credentials::TransportCredential;
pub use publisher::{commit, CommitOutcome, CommitRequest, PushPolicy};
pub use queue::{CommitQueue, JobOutcome, NoteJob, SubmitError};
pub use remote::RemoteLocator;
