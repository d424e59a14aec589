//! Lazily loaded association target.

use tether_core::{Document, DocumentId};

/// The children loaded by a proxy. Either unloaded or holding the full
/// result of one load; it is never patched in place, only dropped.
#[derive(Debug, Clone, Default)]
pub struct TargetCache {
    docs: Option<Vec<Document>>,
}

impl TargetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.docs.is_some()
    }

    /// Store a freshly loaded result set.
    pub fn fill(&mut self, docs: Vec<Document>) {
        self.docs = Some(docs);
    }

    /// Loaded documents, or an empty slice when unloaded.
    pub fn documents(&self) -> &[Document] {
        self.docs.as_deref().unwrap_or(&[])
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents().iter().any(|doc| doc.id() == Some(id))
    }

    /// Drop the loaded set. Returns whether anything was loaded.
    pub fn reset(&mut self) -> bool {
        self.docs.take().is_some()
    }
}
