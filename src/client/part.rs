use crate::complete_upload::CompleteMultipartUploadOutput as CompleteResponse;
use crate::error::{ErrorRepr, Result};
use crate::list_parts::ListPartsOutput as ListPartsResponse;
use crate::part_upload::UploadPartOutput as UploadResponse;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

/// Number we assign to a part when uploading.
///
/// This, along with the entity tag found in the response, is required in the
/// request to complete a multipart upload because it identifies where the part
/// goes when assembling the full object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartNumber(u32);

impl Default for PartNumber {
    fn default() -> Self {
        Self(1)
    }
}

impl PartNumber {
    /// Create a new `PartNumber` from a plain integer.
    ///
    /// Part numbers of an upload start at 1, which is how `PartNumber: Default`.
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    /// The part number as the signed integer the S3 API uses.
    pub(crate) fn as_sdk(self) -> Result<i32> {
        i32::try_from(self.0).map_err(|_| ErrorRepr::PartNumber(self).into())
    }
}

impl Deref for PartNumber {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for PartNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "part_{}", self.0)
    }
}

impl From<u32> for PartNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// AWS entity tag.
///
/// This value is a hash of an object. It is assigned to an uploaded part and
/// returned in the response from a part upload request.
///
/// It is also assigned to a completed upload and found in a successful complete
/// upload response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTag(Cow<'static, str>);

impl EntityTag {
    /// Create a new `EntityTag`.
    pub fn new<T: Into<Cow<'static, str>>>(etag: T) -> Self {
        Self(etag.into())
    }

    pub(crate) fn try_from_upload_resp(value: &UploadResponse) -> Result<Self, ErrorRepr> {
        value
            .e_tag
            .as_deref()
            .map(Self::from)
            .ok_or(ErrorRepr::Missing("UploadResponse", "e_tag"))
    }

    pub(crate) fn try_from_complete_resp(value: &CompleteResponse) -> Result<Self, ErrorRepr> {
        value
            .e_tag
            .as_deref()
            .map(Self::from)
            .ok_or(ErrorRepr::Missing("CompleteResponse", "e_tag"))
    }
}

impl Deref for EntityTag {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.deref()
    }
}

impl AsRef<str> for EntityTag {
    fn as_ref(&self) -> &str {
        self.deref()
    }
}

impl Display for EntityTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for EntityTag {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for EntityTag {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Integrity checksums the object store computed for a part.
///
/// Which of these are present depends on the checksum algorithm requested when
/// the part was uploaded.  Whatever was returned has to be echoed back in the
/// complete upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    /// Base64 CRC32 checksum.
    pub crc32: Option<String>,
    /// Base64 CRC32C checksum.
    pub crc32c: Option<String>,
    /// Base64 CRC64NVME checksum.
    pub crc64nvme: Option<String>,
    /// Base64 SHA-1 digest.
    pub sha1: Option<String>,
    /// Base64 SHA-256 digest.
    pub sha256: Option<String>,
}

impl Checksums {
    pub(crate) fn from_upload_resp(value: &UploadResponse) -> Self {
        Self {
            crc32: value.checksum_crc32.clone(),
            crc32c: value.checksum_crc32_c.clone(),
            crc64nvme: value.checksum_crc64_nvme.clone(),
            sha1: value.checksum_sha1.clone(),
            sha256: value.checksum_sha256.clone(),
        }
    }

    /// Returns `true` if no checksum is present.
    pub fn is_empty(&self) -> bool {
        self.crc32.is_none()
            && self.crc32c.is_none()
            && self.crc64nvme.is_none()
            && self.sha1.is_none()
            && self.sha256.is_none()
    }
}

/// The value for a successful part upload request.
///
/// All `CompletedPart`s need to be retained in order to construct a valid
/// complete upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    /// The incrementing integer starting with 1 that identifies this part in the
    /// upload.
    pub part_number: PartNumber,
    /// The entity tag of the uploaded part.
    pub etag: EntityTag,
    /// Checksums reported for the part.
    pub checksums: Checksums,
    /// The size of this part in bytes.
    pub part_size: u64,
}

impl CompletedPart {
    /// Create a new value from the part number and the entity tag returned for
    /// it.
    pub fn new(part_number: PartNumber, etag: EntityTag, part_size: u64) -> Self {
        Self {
            part_number,
            etag,
            checksums: Checksums::default(),
            part_size,
        }
    }

    /// Attach the checksums reported for this part.
    pub fn with_checksums(self, checksums: Checksums) -> Self {
        Self { checksums, ..self }
    }

    pub(crate) fn from_sdk_part(part: &aws_sdk::types::Part) -> Result<Self, ErrorRepr> {
        let part_number = part
            .part_number
            .and_then(|n| u32::try_from(n).ok())
            .map(PartNumber)
            .ok_or(ErrorRepr::Missing("Part", "part_number"))?;
        let etag = part
            .e_tag
            .as_deref()
            .map(EntityTag::from)
            .ok_or(ErrorRepr::Missing("Part", "e_tag"))?;
        let checksums = Checksums {
            crc32: part.checksum_crc32.clone(),
            crc32c: part.checksum_crc32_c.clone(),
            crc64nvme: part.checksum_crc64_nvme.clone(),
            sha1: part.checksum_sha1.clone(),
            sha256: part.checksum_sha256.clone(),
        };
        let part_size = part.size.and_then(|n| u64::try_from(n).ok()).unwrap_or(0);
        Ok(Self {
            part_number,
            etag,
            checksums,
            part_size,
        })
    }
}

/// A collection of completed part uploads.
///
/// When it is the input to a complete upload request it is in ascending order
/// by part number with no gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedParts(Vec<CompletedPart>);

impl CompletedParts {
    /// Add a new [`CompletedPart`] to this collection.
    pub fn push(&mut self, part: CompletedPart) {
        self.0.push(part);
    }

    /// Returns the number of parts in the collection.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Returns the size in bytes of all parts in the collection.
    pub fn size(&self) -> u64 {
        self.0.iter().map(|p| p.part_size).sum()
    }

    /// Sort the `CompletedPart`s in increasing order by part number.
    pub fn sort_ascending(&mut self) {
        self.0.sort_by_key(|part| part.part_number);
    }

    /// Returns the part numbers in the order they appear.
    pub fn part_numbers(&self) -> Vec<PartNumber> {
        self.0.iter().map(|p| p.part_number).collect()
    }

    pub(crate) fn from_list_resp(value: &ListPartsResponse) -> Result<Self, ErrorRepr> {
        value
            .parts()
            .iter()
            .map(CompletedPart::from_sdk_part)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Deref for CompletedParts {
    type Target = [CompletedPart];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<CompletedPart>> for CompletedParts {
    fn from(value: Vec<CompletedPart>) -> Self {
        Self(value)
    }
}

impl FromIterator<CompletedPart> for CompletedParts {
    fn from_iter<I: IntoIterator<Item = CompletedPart>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CompletedParts {
    type Item = CompletedPart;
    type IntoIter = std::vec::IntoIter<CompletedPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<CompletedPart> for CompletedParts {
    fn extend<I: IntoIterator<Item = CompletedPart>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl TryFrom<&CompletedParts> for aws_sdk::types::CompletedMultipartUpload {
    type Error = crate::error::Error;

    fn try_from(value: &CompletedParts) -> Result<Self, Self::Error> {
        let completed_parts = value
            .0
            .iter()
            .map(|v| {
                let part = aws_sdk::types::CompletedPart::builder()
                    .e_tag(v.etag.to_string())
                    .part_number(v.part_number.as_sdk()?)
                    .set_checksum_crc32(v.checksums.crc32.clone())
                    .set_checksum_crc32_c(v.checksums.crc32c.clone())
                    .set_checksum_crc64_nvme(v.checksums.crc64nvme.clone())
                    .set_checksum_sha1(v.checksums.sha1.clone())
                    .set_checksum_sha256(v.checksums.sha256.clone())
                    .build();
                Ok(part)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(aws_sdk::types::CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(n: u32) -> CompletedPart {
        CompletedPart::new(PartNumber::new(n), format!("etag-{n}").into(), 5)
    }

    #[test]
    fn sdk_body_keeps_order_and_checksums() {
        let mut parts: CompletedParts = [part(1), part(2)].into_iter().collect();
        parts.push(part(3).with_checksums(Checksums {
            crc32: Some("AAAAAA==".into()),
            ..Default::default()
        }));

        let body = aws_sdk::types::CompletedMultipartUpload::try_from(&parts).unwrap();
        let sdk_parts = body.parts();
        assert_eq!(sdk_parts.len(), 3);
        assert_eq!(sdk_parts[0].part_number(), Some(1));
        assert_eq!(sdk_parts[2].e_tag(), Some("etag-3"));
        assert_eq!(sdk_parts[2].checksum_crc32(), Some("AAAAAA=="));
        assert_eq!(sdk_parts[1].checksum_crc32(), None);
        assert_eq!(parts.size(), 15);
    }

    #[test]
    fn list_response_parts_are_converted() {
        let resp = ListPartsResponse::builder()
            .parts(
                aws_sdk::types::Part::builder()
                    .part_number(2)
                    .e_tag("b")
                    .size(7)
                    .build(),
            )
            .parts(
                aws_sdk::types::Part::builder()
                    .part_number(1)
                    .e_tag("a")
                    .size(8)
                    .build(),
            )
            .build();

        let mut parts = CompletedParts::from_list_resp(&resp).unwrap();
        parts.sort_ascending();
        assert_eq!(parts.part_numbers(), vec![PartNumber::new(1), PartNumber::new(2)]);
        assert_eq!(parts.size(), 15);
    }

    #[test]
    fn list_response_without_etag_is_rejected() {
        let resp = ListPartsResponse::builder()
            .parts(aws_sdk::types::Part::builder().part_number(1).build())
            .build();
        assert!(CompletedParts::from_list_resp(&resp).is_err());
    }
}
