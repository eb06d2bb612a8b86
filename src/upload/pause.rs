use super::session::UploadSession;
use crate::client::UploadId;
use crate::error::{ErrorRepr, Result};

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// What a paused upload needs to be picked up again later.
///
/// The serialized form is stable:
///
/// ```json
/// {"uploadId":"...","partSize":8388608,"totalPartCount":3,"numPartsCompleted":1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeToken {
    upload_id: UploadId,
    part_size: u64,
    total_part_count: u32,
    num_parts_completed: u32,
}

impl ResumeToken {
    /// Create a new `ResumeToken`.
    pub fn new(
        upload_id: UploadId,
        part_size: u64,
        total_part_count: u32,
        num_parts_completed: u32,
    ) -> Self {
        Self {
            upload_id,
            part_size,
            total_part_count,
            num_parts_completed,
        }
    }

    /// The ID of the paused upload.
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// The part size the upload was started with.
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// The number of parts in the upload.
    pub fn total_part_count(&self) -> u32 {
        self.total_part_count
    }

    /// The number of parts that had finished uploading when it was paused.
    pub fn num_parts_completed(&self) -> u32 {
        self.num_parts_completed
    }

    /// Serialize the token to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self).map_err(ErrorRepr::from)?)
    }

    /// Read a token from its JSON form.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s).map_err(ErrorRepr::from)?)
    }
}

/// Observable state of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The upload future has not been polled yet.
    NotStarted,
    /// Parts are being uploaded.
    Active,
    /// Every part is done and the request to complete the upload was sent.
    Completing,
    /// The upload completed.
    Completed,
    /// The upload was paused.
    Paused,
    /// The upload failed and was aborted.
    Failed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Active => write!(f, "active"),
            Self::Completing => write!(f, "completing"),
            Self::Completed => write!(f, "completed"),
            Self::Paused => write!(f, "paused"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Pauses an upload from outside the task driving it.
///
/// Obtained from [`Upload::pause_handle`].  Clones refer to the same upload.
///
/// [`Upload::pause_handle`]: crate::upload::Upload::pause_handle
#[derive(Debug, Clone)]
pub struct PauseHandle {
    session: Arc<UploadSession>,
}

impl PauseHandle {
    pub(crate) fn new(session: Arc<UploadSession>) -> Self {
        Self { session }
    }

    /// Pause the upload.
    ///
    /// Part uploads still in flight and a pending complete request are
    /// cancelled; parts that already finished are kept and counted in the
    /// returned token.  The upload future then resolves with an error of kind
    /// [`ErrorKind::Paused`].
    ///
    /// Calling this again returns a token for the same upload, with a count
    /// at least as large.  Returns `None` if the upload has completed or
    /// failed, since there is nothing left to resume.
    ///
    /// [`ErrorKind::Paused`]: crate::error::ErrorKind::Paused
    pub fn pause(&self) -> Option<ResumeToken> {
        self.session.pause()
    }

    /// Number of parts of the upload that are done, including those done
    /// before it was resumed.
    pub fn num_parts_completed(&self) -> usize {
        self.session.tracker().num_done()
    }

    /// The current state of the upload.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The ID of the upload.
    pub fn upload_id(&self) -> &UploadId {
        &self.session.data().id
    }
}
