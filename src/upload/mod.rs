//! The upload engine.
//!
//! An [`Upload`] is one multipart upload from start to finish.  Content comes
//! from a [`ContentSource`], is cut into parts following a [`PartPlan`], and
//! each part is sent as soon as it is cut, so several part uploads can be in
//! flight at once.  When the content is exhausted and the last part is done,
//! the upload is completed with every part in order.
//!
//! A [`PauseHandle`] stops an upload and hands back a [`ResumeToken`], which
//! can later start a new `Upload` that skips the parts already done.
mod content;
pub use content::ContentSource;

mod dispatch;

mod failure;

mod orchestrator;
pub use orchestrator::Upload;

mod pause;
pub use pause::{PauseHandle, ResumeToken, SessionState};

mod plan;
pub use plan::PartPlan;

mod session;
pub(crate) use session::UploadSession;

mod tracker;
