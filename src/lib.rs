// Public API for the talkgen library

pub mod agents;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod speech;
pub mod trace;
pub mod utils;

// Re-export commonly used types
pub use errors::{PollError, RenderError, Result, SubmissionError, TalkgenError};
pub use render::{
    client::{PollPolicy, RenderJobClient},
    job::{Credentials, JobHandle, JobResult, JobStatus, RenderRequest},
    sanitizer::sanitize,
};
pub use utils::retry_with_backoff;
