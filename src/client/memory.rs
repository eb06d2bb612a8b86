use super::part::{CompletedPart, CompletedParts, EntityTag, PartNumber};
use super::request::*;
use super::{SendRequest, UploadData, UploadId};
use crate::error::{Error, ErrorKind, Result};
use crate::uri::ObjectUri;

use bytes::{Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An object store that lives in memory.
///
/// It implements every operation of [`SendRequest`] with the bookkeeping of
/// the real thing: upload IDs are assigned on create, parts are held until the
/// upload is completed or aborted, and a complete request is rejected unless
/// its parts are in ascending order and match what was uploaded.
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    store: Arc<Mutex<Store>>,
}

#[derive(Debug, Default)]
struct Store {
    uploads: HashMap<UploadId, ActiveUpload>,
    objects: HashMap<ObjectUri, StoredObject>,
}

#[derive(Debug)]
struct ActiveUpload {
    uri: ObjectUri,
    parts: BTreeMap<PartNumber, StoredPart>,
}

#[derive(Debug, Clone)]
struct StoredPart {
    etag: EntityTag,
    body: Bytes,
}

#[derive(Debug, Clone)]
struct StoredObject {
    etag: EntityTag,
    body: Bytes,
}

impl MemoryClient {
    /// Create a new, empty `MemoryClient`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents of a completed object.
    pub fn object(&self, uri: &ObjectUri) -> Option<Bytes> {
        self.lock().objects.get(uri).map(|o| o.body.clone())
    }

    /// Returns the entity tag of a completed object.
    pub fn object_etag(&self, uri: &ObjectUri) -> Option<EntityTag> {
        self.lock().objects.get(uri).map(|o| o.etag.clone())
    }

    /// Returns the number of uploads that were created and not yet completed
    /// or aborted.
    pub fn active_uploads(&self) -> usize {
        self.lock().uploads.len()
    }

    /// Returns the part numbers held for an active upload.
    pub fn part_numbers(&self, id: &UploadId) -> Option<Vec<PartNumber>> {
        self.lock()
            .uploads
            .get(id)
            .map(|u| u.parts.keys().copied().collect())
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_etag() -> EntityTag {
        EntityTag::from(uuid::Uuid::now_v7().simple().to_string())
    }
}

fn no_such_upload() -> Error {
    Error::from_kind(ErrorKind::Sdk, "no such upload")
}

impl SendRequest for MemoryClient {
    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        req.validate()?;
        let id = UploadId::from(uuid::Uuid::now_v7().to_string());
        let upload = ActiveUpload {
            uri: req.uri().clone(),
            parts: BTreeMap::new(),
        };
        self.lock().uploads.insert(id.clone(), upload);
        Ok(UploadData::new(id, req.uri().clone()))
    }

    async fn send_new_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        req.validate()?;
        let mut store = self.lock();
        let upload = store.uploads.get_mut(req.id()).ok_or_else(no_such_upload)?;

        let etag = Self::new_etag();
        let part = StoredPart {
            etag: etag.clone(),
            body: req.body().clone(),
        };
        // Uploading a part number again replaces the earlier part.
        upload.parts.insert(req.part_number(), part);

        Ok(CompletedPart::new(
            req.part_number(),
            etag,
            req.body().len() as u64,
        ))
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        req.validate()?;
        let mut store = self.lock();
        let upload = store.uploads.get(req.id()).ok_or_else(no_such_upload)?;

        let parts = req.completed_parts();
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(Error::from_kind(
                ErrorKind::Sdk,
                "parts are not in ascending order",
            ));
        }

        let mut body = BytesMut::with_capacity(parts.size() as usize);
        for part in parts.iter() {
            match upload.parts.get(&part.part_number) {
                Some(stored) if stored.etag == part.etag => body.extend_from_slice(&stored.body),
                Some(_) => return Err(Error::from_kind(ErrorKind::Sdk, "entity tag mismatch")),
                None => return Err(Error::from_kind(ErrorKind::Sdk, "invalid part")),
            }
        }

        let uri = upload.uri.clone();
        let etag = Self::new_etag();
        store.uploads.remove(req.id());
        store.objects.insert(
            uri.clone(),
            StoredObject {
                etag: etag.clone(),
                body: body.freeze(),
            },
        );

        Ok(CompletedUpload::new(uri, etag))
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        req.validate()?;
        self.lock()
            .uploads
            .remove(req.id())
            .map(|_| ())
            .ok_or_else(no_such_upload)
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<CompletedParts> {
        req.validate()?;
        let store = self.lock();
        let upload = store.uploads.get(req.id()).ok_or_else(no_such_upload)?;

        Ok(upload
            .parts
            .iter()
            .map(|(n, p)| CompletedPart::new(*n, p.etag.clone(), p.body.len() as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn uri() -> ObjectUri {
        ObjectUri::from(("bucket", "object"))
    }

    fn upload_part(client: &MemoryClient, data: &UploadData, n: u32, body: &'static [u8]) -> CompletedPart {
        let req = UploadPartRequest::new(data, Bytes::from_static(body), PartNumber::new(n));
        block_on(client.send_new_part_upload_request(req)).unwrap()
    }

    #[test]
    fn complete_assembles_object_in_part_order() {
        let client = MemoryClient::new();
        let data = block_on(client.send_create_upload_request(CreateRequest::new(uri()))).unwrap();

        let second = upload_part(&client, &data, 2, b"world");
        let first = upload_part(&client, &data, 1, b"hello ");

        let req = CompleteRequest::new(&data, vec![first, second].into());
        let done = block_on(client.send_complete_upload_request(req)).unwrap();

        assert_eq!(done.uri, uri());
        assert_eq!(client.object(&uri()).unwrap(), Bytes::from_static(b"hello world"));
        assert_eq!(client.object_etag(&uri()), Some(done.etag));
        assert_eq!(client.active_uploads(), 0);
    }

    #[test]
    fn complete_rejects_unordered_or_unknown_parts() {
        let client = MemoryClient::new();
        let data = block_on(client.send_create_upload_request(CreateRequest::new(uri()))).unwrap();

        let first = upload_part(&client, &data, 1, b"a");
        let second = upload_part(&client, &data, 2, b"b");

        let req = CompleteRequest::new(&data, vec![second.clone(), first.clone()].into());
        assert!(block_on(client.send_complete_upload_request(req)).is_err());

        let stale = CompletedPart::new(PartNumber::new(2), "stale".into(), 1);
        let req = CompleteRequest::new(&data, vec![first, stale].into());
        assert!(block_on(client.send_complete_upload_request(req)).is_err());

        assert_eq!(client.active_uploads(), 1);
        assert!(client.object(&uri()).is_none());
    }

    #[test]
    fn abort_discards_parts() {
        let client = MemoryClient::new();
        let data = block_on(client.send_create_upload_request(CreateRequest::new(uri()))).unwrap();
        upload_part(&client, &data, 1, b"a");

        let listed = block_on(client.send_list_parts_request(ListPartsRequest::new(&data))).unwrap();
        assert_eq!(listed.part_numbers(), vec![PartNumber::new(1)]);

        block_on(client.send_abort_upload_request(AbortRequest::new(&data))).unwrap();
        assert_eq!(client.active_uploads(), 0);
        assert!(client.part_numbers(&data.id).is_none());
        assert!(block_on(client.send_abort_upload_request(AbortRequest::new(&data))).is_err());
    }
}
