//! Ownership of the single open document

use crate::engine::{DocumentHandle, RenderEngine};
use crate::types::*;

struct OpenDocument<D> {
    source: DocumentSource,
    handle: D,
}

/// Holds at most one document handle and releases each handle exactly once
pub struct DocumentSlot<D: DocumentHandle> {
    current: Option<OpenDocument<D>>,
}

/// Result of [`DocumentSlot::ensure_open`]
pub struct Opened<'a, D> {
    pub handle: &'a D,
    /// Set when a new document was opened, holding its page count
    pub newly_opened: Option<u32>,
}

impl<D: DocumentHandle> DocumentSlot<D> {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn source(&self) -> Option<&DocumentSource> {
        self.current.as_ref().map(|open| &open.source)
    }

    /// Return the handle for `source`, opening it first if nothing is open
    /// or a different source is. On a failed open the previous handle is kept.
    pub async fn ensure_open<'a, E>(
        &'a mut self,
        engine: &E,
        source: &DocumentSource,
    ) -> Result<Opened<'a, D>>
    where
        E: RenderEngine<Document = D>,
    {
        let reusable = self
            .current
            .as_ref()
            .is_some_and(|open| &open.source == source);

        let mut newly_opened = None;
        if !reusable {
            let handle = engine.open(source).await.map_err(ViewerError::Open)?;
            let page_count = handle.page_count();
            log::info!("Opened {} ({} pages)", source.describe(), page_count);

            self.replace(source.clone(), handle);
            newly_opened = Some(page_count);
        }

        let open = self.current.as_ref().ok_or_else(|| {
            ViewerError::Open(EngineError::Unsupported("no document is open".to_string()))
        })?;
        Ok(Opened {
            handle: &open.handle,
            newly_opened,
        })
    }

    /// Store a new handle, releasing the previous one
    pub fn replace(&mut self, source: DocumentSource, handle: D) {
        if let Some(previous) = self.current.replace(OpenDocument { source, handle }) {
            log::debug!("Releasing replaced document {}", previous.source.describe());
            previous.handle.release();
        }
    }

    /// Release the current handle, if any
    pub fn release(&mut self) {
        if let Some(open) = self.current.take() {
            log::debug!("Releasing document {}", open.source.describe());
            open.handle.release();
        }
    }
}

impl<D: DocumentHandle> Default for DocumentSlot<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DocumentHandle> Drop for DocumentSlot<D> {
    fn drop(&mut self) {
        self.release();
    }
}
