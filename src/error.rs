//! Errors this crate can emit.
use crate::abort_upload::AbortMultipartUploadError;
use crate::client::UploadId;
use crate::client::part::{CompletedParts, PartNumber};
use crate::complete_upload::CompleteMultipartUploadError;
use crate::create_upload::CreateMultipartUploadError;
use crate::list_parts::ListPartsError;
use crate::part_upload::UploadPartError;
use crate::uri::ObjectUri;

use aws_sdk::error::SdkError;
use std::fmt::{self, Display, Formatter};

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// The value returned in this crate when an error occurs.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(pub(crate) ErrorRepr);

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorRepr::Create { .. }
            | ErrorRepr::UploadPart { .. }
            | ErrorRepr::Complete { .. }
            | ErrorRepr::Abort { .. }
            | ErrorRepr::ListParts { .. } => ErrorKind::Sdk,
            ErrorRepr::Missing(_, _) | ErrorRepr::PartNumber(_) | ErrorRepr::PartCount { .. } => {
                ErrorKind::Config
            }
            ErrorRepr::ContentLength { .. } | ErrorRepr::Content(_) => ErrorKind::Content,
            ErrorRepr::Paused { .. } => ErrorKind::Paused,
            ErrorRepr::TokenMismatch { .. } | ErrorRepr::Token(_) => ErrorKind::Resume,
            ErrorRepr::StdDyn(_) => ErrorKind::Unknown,
            ErrorRepr::Any { kind, .. } => kind,
        }
    }

    /// Returns `true` if this is the error an upload resolves with after it
    /// was paused.
    pub fn is_paused(&self) -> bool {
        matches!(self.kind(), ErrorKind::Paused)
    }

    /// Create an `Error` from an arbitrary error value.
    pub fn from_dyn<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let err = Box::new(e);
        Self(ErrorRepr::StdDyn(err))
    }

    /// Create an `Error` of a given kind with a static message.
    pub fn from_kind(kind: ErrorKind, msg: &'static str) -> Self {
        Self(ErrorRepr::Any { kind, msg })
    }

    pub(crate) fn content<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(ErrorRepr::Content(Box::new(e)))
    }
}

impl From<ErrorRepr> for Error {
    fn from(value: ErrorRepr) -> Self {
        Self(value)
    }
}

/// The category of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A request or configuration value was invalid.
    Config,
    /// The content source failed or did not match its declared length.
    Content,
    /// The upload was paused before it finished.
    Paused,
    /// A resume token could not be used.
    Resume,
    /// The object store returned an error.
    Sdk,
    /// Any other error.
    Unknown,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Content => write!(f, "content"),
            Self::Paused => write!(f, "paused"),
            Self::Resume => write!(f, "resume"),
            Self::Sdk => write!(f, "sdk"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Internal error type that we are free to change at will.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorRepr {
    #[error("{0} missing required field: {1}")]
    Missing(&'static str, &'static str),
    #[error("{0} is outside the range of part numbers allowed in an upload")]
    PartNumber(PartNumber),
    #[error("content needs {count} parts of {part_size} bytes, more than an upload allows")]
    PartCount { count: u32, part_size: u64 },
    #[error("content source produced {actual} bytes but declared {expected}")]
    ContentLength { expected: u64, actual: u64 },
    #[error("content source failed: {0}")]
    Content(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("upload {id} was paused")]
    Paused { id: UploadId },
    #[error("resume token for upload {id} expects {expected} parts, content has {actual}")]
    TokenMismatch {
        id: UploadId,
        expected: u32,
        actual: u32,
    },
    #[error("invalid resume token: {0}")]
    Token(#[from] serde_json::Error),
    #[error("creating multipart upload failed: {source}")]
    Create {
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("uploading {part} to upload {id} failed: {source}")]
    UploadPart {
        id: UploadId,
        uri: ObjectUri,
        part: PartNumber,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("completing upload {id} failed: {source}")]
    Complete {
        id: UploadId,
        uri: ObjectUri,
        parts: CompletedParts,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("aborting upload {id} failed: {source}")]
    Abort {
        id: UploadId,
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("listing parts of upload {id} failed: {source}")]
    ListParts {
        id: UploadId,
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("{kind} error: {msg}")]
    Any { kind: ErrorKind, msg: &'static str },
    #[error(transparent)]
    StdDyn(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ErrorRepr {
    pub(crate) fn from_create_err(
        uri: &ObjectUri,
    ) -> impl FnMut(SdkError<CreateMultipartUploadError>) -> Self {
        move |e| Self::Create {
            uri: uri.clone(),
            source: Box::new(e),
        }
    }

    pub(crate) fn from_upload_err(
        id: &UploadId,
        uri: &ObjectUri,
        part: PartNumber,
    ) -> impl FnMut(SdkError<UploadPartError>) -> Self {
        move |e| Self::UploadPart {
            id: id.clone(),
            uri: uri.clone(),
            part,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_complete_err(
        id: &UploadId,
        uri: &ObjectUri,
        parts: &CompletedParts,
    ) -> impl FnMut(SdkError<CompleteMultipartUploadError>) -> Self {
        move |e| Self::Complete {
            id: id.clone(),
            uri: uri.clone(),
            parts: parts.clone(),
            source: Box::new(e),
        }
    }

    pub(crate) fn from_abort_err(
        id: &UploadId,
        uri: &ObjectUri,
    ) -> impl FnMut(SdkError<AbortMultipartUploadError>) -> Self {
        move |e| Self::Abort {
            id: id.clone(),
            uri: uri.clone(),
            source: Box::new(e),
        }
    }

    pub(crate) fn from_list_parts_err(
        id: &UploadId,
        uri: &ObjectUri,
    ) -> impl FnMut(SdkError<ListPartsError>) -> Self {
        move |e| Self::ListParts {
            id: id.clone(),
            uri: uri.clone(),
            source: Box::new(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_repr() {
        let err = Error::from(ErrorRepr::ContentLength {
            expected: 10,
            actual: 4,
        });
        assert_eq!(err.kind(), ErrorKind::Content);
        assert_eq!(
            err.to_string(),
            "content source produced 4 bytes but declared 10"
        );

        let err = Error::from(ErrorRepr::Paused { id: "abc".into() });
        assert!(err.is_paused());

        let err = Error::from_kind(ErrorKind::Sdk, "throttled");
        assert_eq!(err.kind(), ErrorKind::Sdk);
        assert_eq!(err.to_string(), "sdk error: throttled");
    }
}
