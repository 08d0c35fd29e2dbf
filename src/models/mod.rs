pub mod checkpoint;
pub mod phase;
pub mod session_record;
pub mod session_status;

pub use checkpoint::{CheckpointDraft, TimerCheckpoint};
pub use phase::Phase;
pub use session_record::SessionRecord;
pub use session_status::SessionStatus;
