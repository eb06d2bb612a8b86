//! Addressing the object an upload creates.
//!
//! An [`ObjectUri`] is the pair of [`Bucket`] and [`Key`] that every request in
//! a multipart upload carries.  It can be built from a tuple or parsed from the
//! `s3://bucket/key` form:
//!
//! ```rust
//! use s3_resumable_upload::ObjectUri;
//!
//! let uri: ObjectUri = "s3://my-bucket/backups/2025/db.tar".parse().unwrap();
//! assert_eq!(&*uri.bucket, "my-bucket");
//! assert_eq!(&*uri.key, "backups/2025/db.tar");
//! assert_eq!(uri, ObjectUri::from(("my-bucket", "backups/2025/db.tar")));
//! ```
use crate::error::{Error, ErrorRepr};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Formatter};
use std::ops::Deref;
use std::str::FromStr;

const SCHEME: &str = "s3://";

/// The address of an uploaded object in S3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectUri {
    /// The S3 bucket for the object.
    ///
    /// This should be the plain bucket name, e.g., "my-s3-bucket".
    pub bucket: Bucket,
    /// The full key of this object within the bucket.
    pub key: Key,
}

impl ObjectUri {
    /// Create a new `ObjectUri` from bucket and object key.
    pub fn new(bucket: Bucket, key: Key) -> Self {
        Self { bucket, key }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bucket.is_empty() || self.key.is_empty()
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", &self.bucket, &self.key)
    }
}

impl<T: Into<Bucket>, U: Into<Key>> From<(T, U)> for ObjectUri {
    fn from((b, k): (T, U)) -> Self {
        ObjectUri::new(b.into(), k.into())
    }
}

impl FromStr for ObjectUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or(ErrorRepr::Missing("ObjectUri", "s3:// scheme"))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or(ErrorRepr::Missing("ObjectUri", "object key"))?;
        let uri = ObjectUri::from((bucket, key.trim_start_matches('/')));
        if uri.is_empty() {
            return Err(ErrorRepr::Missing("ObjectUri", "bucket and key"))?;
        }
        Ok(uri)
    }
}

/// The destination bucket for this upload when it is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket(Cow<'static, str>);

impl Bucket {
    /// Create a new `Bucket`, dropping any trailing `'/'`.
    pub fn new<T: Into<Cow<'static, str>>>(bucket: T) -> Self {
        let bucket: Cow<'static, str> = bucket.into();
        match bucket.strip_suffix('/') {
            Some(v) => Self(Cow::Owned(v.to_string())),
            _ => Self(bucket),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Bucket {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for Bucket {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Bucket {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The key within the associated bucket for this object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new object `Key`.
    pub fn new<T: Into<Cow<'static, str>>>(key: T) -> Self {
        Self(key.into())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Key {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_missing_parts() {
        assert!("my-bucket/key".parse::<ObjectUri>().is_err());
        assert!("s3://my-bucket".parse::<ObjectUri>().is_err());
        assert!("s3:///key".parse::<ObjectUri>().is_err());
        assert!("s3://my-bucket/".parse::<ObjectUri>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        let uri = ObjectUri::from(("bucket/", "a/b.bin"));
        assert_eq!(uri.to_string(), "s3://bucket/a/b.bin");
        assert_eq!(uri.to_string().parse::<ObjectUri>().unwrap(), uri);
    }
}
