//! Editor sessions and image display handles.
//!
//! An editor shows images through short `blob:` handles instead of inline
//! `data:` URIs. [`BlobRegistry`] owns the bytes behind those handles and
//! releases them when the owning session ends, is replaced, or is dropped.
//! [`DocumentStore`] is the explicitly owned home of open sessions; there
//! is no process-wide document cache.

use crate::error::{Error, Result};
use crate::html::to_html;
use crate::model::{from_data_uri, Block, DocumentModel};
use crate::options::EncodeOptions;
use crate::pipeline::Decoded;
use std::collections::{BTreeMap, HashMap};

/// Prefix of every display handle.
pub const BLOB_SCHEME: &str = "blob:wordloom/";

/// Bytes behind one display handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Owned registry of image display handles.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    next: u64,
    blobs: BTreeMap<String, Blob>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes and return a fresh handle.
    pub fn register(&mut self, mime: impl Into<String>, data: Vec<u8>) -> String {
        self.next += 1;
        let handle = format!("{}{}", BLOB_SCHEME, self.next);
        self.blobs.insert(
            handle.clone(),
            Blob {
                mime: mime.into(),
                data,
            },
        );
        handle
    }

    pub fn get(&self, handle: &str) -> Option<&Blob> {
        self.blobs.get(handle)
    }

    /// Release one handle. Returns whether it was live.
    pub fn release(&mut self, handle: &str) -> bool {
        self.blobs.remove(handle).is_some()
    }

    /// Release every handle and return how many were live.
    pub fn release_all(&mut self) -> usize {
        let released = self.blobs.len();
        self.blobs.clear();
        if released > 0 {
            log::debug!("released {} blob handle(s)", released);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.blobs.keys().map(String::as_str)
    }
}

impl Drop for BlobRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Swap inline image data for display handles.
///
/// The `data:` URI moves to `original_src` so the encoder can still reach
/// the bytes. Returns the number of images externalized.
pub fn externalize_images(model: &mut DocumentModel, registry: &mut BlobRegistry) -> usize {
    let mut count = 0;
    model.walk_mut(&mut |block: &mut Block| {
        let Block::Image(image) = block else {
            return;
        };
        let Some((mime, data)) = from_data_uri(&image.src) else {
            return;
        };
        let handle = registry.register(mime, data);
        image.original_src = Some(std::mem::replace(&mut image.src, handle));
        count += 1;
    });
    count
}

/// One open document.
#[derive(Debug)]
pub struct EditorSession {
    model: DocumentModel,
    blobs: BlobRegistry,
}

impl EditorSession {
    /// Start a session over a decoded document.
    pub fn open(decoded: Decoded) -> Self {
        let mut session = Self {
            model: DocumentModel::default(),
            blobs: BlobRegistry::new(),
        };
        session.replace(decoded.model);
        session
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    /// Replace the document. Handles of the previous document are released.
    pub fn replace(&mut self, mut model: DocumentModel) {
        self.blobs.release_all();
        let images = externalize_images(&mut model, &mut self.blobs);
        log::debug!("session holds {} image handle(s)", images);
        self.model = model;
    }

    /// HTML for the editor, with images shown through handles.
    pub fn html(&self) -> String {
        to_html(&self.model)
    }

    /// Encode the current document.
    pub fn encode(&self, options: &EncodeOptions) -> Result<Vec<u8>> {
        crate::writer::encode(&self.model, options)
    }

    /// End the session, releasing its handles.
    pub fn close(mut self) -> DocumentModel {
        self.blobs.release_all();
        std::mem::take(&mut self.model)
    }
}

/// Explicitly owned store of open sessions, keyed by document id.
#[derive(Debug, Default)]
pub struct DocumentStore {
    sessions: HashMap<String, EditorSession>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; an existing session under the same id is replaced
    /// and its handles released.
    pub fn open(&mut self, id: impl Into<String>, decoded: Decoded) -> &mut EditorSession {
        let id = id.into();
        if let Some(previous) = self.sessions.remove(&id) {
            log::debug!("replacing session {}", id);
            previous.close();
        }
        self.sessions
            .entry(id)
            .or_insert_with(|| EditorSession::open(decoded))
    }

    pub fn get(&self, id: &str) -> Option<&EditorSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut EditorSession> {
        self.sessions.get_mut(id)
    }

    /// Close a session and return its final model.
    pub fn close(&mut self, id: &str) -> Result<DocumentModel> {
        self.sessions
            .remove(id)
            .map(EditorSession::close)
            .ok_or_else(|| Error::MissingComponent(format!("no open session '{}'", id)))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Total live handles across all sessions.
    pub fn live_handles(&self) -> usize {
        self.sessions.values().map(|s| s.blobs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{to_data_uri, ImageBlock, ListItem, ListKind, Run};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn decoded_with_images(count: usize) -> Decoded {
        let mut blocks = vec![Block::paragraph(vec![Run::text("Intro")])];
        for _ in 0..count {
            blocks.push(Block::Image(ImageBlock::new(to_data_uri("image/png", PNG))));
        }
        let model = DocumentModel::with_blocks(blocks);
        Decoded {
            html: to_html(&model),
            model,
        }
    }

    #[test]
    fn test_registry_release() {
        let mut registry = BlobRegistry::new();
        let a = registry.register("image/png", PNG.to_vec());
        let b = registry.register("image/png", PNG.to_vec());
        assert_ne!(a, b);
        assert!(a.starts_with(BLOB_SCHEME));
        assert_eq!(registry.get(&a).map(|blob| blob.mime.as_str()), Some("image/png"));

        assert!(registry.release(&a));
        assert!(!registry.release(&a));
        assert_eq!(registry.release_all(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_externalize_nested_images() {
        let mut model = DocumentModel::with_blocks(vec![
            Block::List {
                kind: ListKind::Bullet,
                start: None,
                items: vec![ListItem::new(vec![Block::Image(ImageBlock::new(
                    to_data_uri("image/png", PNG),
                ))])],
            },
            Block::Image(ImageBlock::new("https://example.com/a.png")),
        ]);
        let mut registry = BlobRegistry::new();
        assert_eq!(externalize_images(&mut model, &mut registry), 1);

        let Block::List { items, .. } = &model.blocks[0] else {
            panic!("expected list");
        };
        let Block::Image(image) = &items[0].blocks[0] else {
            panic!("expected image");
        };
        assert!(image.src.starts_with(BLOB_SCHEME));
        assert!(image.data_source().starts_with("data:image/png;base64,"));
        assert_eq!(registry.get(&image.src).map(|b| b.data.as_slice()), Some(PNG));
    }

    #[test]
    fn test_session_replace_releases_handles() {
        let mut session = EditorSession::open(decoded_with_images(2));
        assert_eq!(session.blobs().len(), 2);
        assert!(session.html().contains(BLOB_SCHEME));

        session.replace(decoded_with_images(1).model);
        assert_eq!(session.blobs().len(), 1);
        assert_eq!(session.blobs().handles().count(), 1);

        let model = session.close();
        assert_eq!(model.count_images(), 1);
    }

    #[test]
    fn test_session_encodes_original_bytes() {
        let session = EditorSession::open(decoded_with_images(1));
        let bytes = session.encode(&EncodeOptions::default()).unwrap();
        let container = crate::container::OoxmlContainer::from_bytes(bytes).unwrap();
        assert_eq!(container.read_binary("word/media/image1.png").unwrap(), PNG);
    }

    #[test]
    fn test_store_replace_and_close() {
        let mut store = DocumentStore::new();
        store.open("doc", decoded_with_images(3));
        assert_eq!(store.live_handles(), 3);

        store.open("doc", decoded_with_images(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.live_handles(), 1);

        store.open("other", decoded_with_images(0));
        assert_eq!(store.len(), 2);

        let model = store.close("doc").unwrap();
        assert_eq!(model.count_images(), 1);
        assert!(store.close("doc").is_err());
        assert_eq!(store.live_handles(), 0);
    }
}
