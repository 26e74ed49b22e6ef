#![allow(dead_code)]

use image::Rgba;
use pdf_viewer::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::sync::Semaphore;

/// Letter size, in points
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// One call into `PageHandle::render_to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCall {
    pub page: u32,
    pub zoom_percent: u32,
    pub rotation: i32,
    pub width: u32,
    pub height: u32,
}

/// Scripting knobs and call log shared between a test and its mock engine
#[derive(Default)]
pub struct MockState {
    documents: RefCell<HashMap<PathBuf, u32>>,
    next_handle: Cell<u64>,
    pub fail_page_fetch: Cell<bool>,
    pub fail_render: Cell<bool>,
    gate: RefCell<Option<Rc<Semaphore>>>,
    pub opened: RefCell<Vec<(u64, PathBuf)>>,
    pub released: RefCell<Vec<(u64, PathBuf)>>,
    pub renders: RefCell<Vec<RenderCall>>,
}

impl MockState {
    pub fn add_document(&self, path: &str, pages: u32) {
        self.documents.borrow_mut().insert(PathBuf::from(path), pages);
    }

    /// Hold every render until `release_renders` hands out permits
    pub fn close_gate(&self) {
        *self.gate.borrow_mut() = Some(Rc::new(Semaphore::new(0)));
    }

    pub fn release_renders(&self, count: usize) {
        if let Some(gate) = self.gate.borrow().as_ref() {
            gate.add_permits(count);
        }
    }

    pub fn render_calls(&self) -> Vec<RenderCall> {
        self.renders.borrow().clone()
    }

    pub fn rendered_pages(&self) -> Vec<u32> {
        self.renders.borrow().iter().map(|call| call.page).collect()
    }

    pub fn open_count(&self) -> usize {
        self.opened.borrow().len()
    }

    pub fn released_ids(&self) -> Vec<u64> {
        self.released.borrow().iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Clone)]
pub struct MockEngine {
    pub state: Rc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Rc::new(MockState::default()),
        }
    }

    pub fn with_document(path: &str, pages: u32) -> Self {
        let engine = Self::new();
        engine.state.add_document(path, pages);
        engine
    }
}

impl RenderEngine for MockEngine {
    type Document = MockDocument;

    async fn open(
        &self,
        source: &DocumentSource,
    ) -> std::result::Result<MockDocument, EngineError> {
        tokio::task::yield_now().await;

        let path = match source {
            DocumentSource::Path(path) => path.clone(),
            DocumentSource::Bytes(_) => {
                return Err(EngineError::Unsupported("mock opens paths only".to_string()));
            }
        };
        let pages = self
            .state
            .documents
            .borrow()
            .get(&path)
            .copied()
            .ok_or_else(|| {
                EngineError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                ))
            })?;

        let id = self.state.next_handle.get() + 1;
        self.state.next_handle.set(id);
        self.state.opened.borrow_mut().push((id, path.clone()));

        Ok(MockDocument {
            id,
            path,
            pages,
            state: Rc::clone(&self.state),
        })
    }
}

pub struct MockDocument {
    id: u64,
    path: PathBuf,
    pages: u32,
    state: Rc<MockState>,
}

impl DocumentHandle for MockDocument {
    type Page = MockPage;

    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn get_page(&self, page_number: u32) -> std::result::Result<MockPage, EngineError> {
        tokio::task::yield_now().await;
        if self.state.fail_page_fetch.get() {
            return Err(EngineError::Pdf("corrupt page tree".to_string()));
        }
        Ok(MockPage {
            number: page_number,
            state: Rc::clone(&self.state),
        })
    }

    fn release(self) {
        self.state.released.borrow_mut().push((self.id, self.path));
    }
}

pub struct MockPage {
    number: u32,
    state: Rc<MockState>,
}

impl PageHandle for MockPage {
    fn compute_viewport(&self, scale: f32, rotation_degrees: i32) -> Viewport {
        Viewport::new(PAGE_WIDTH, PAGE_HEIGHT, scale, rotation_degrees)
    }

    async fn render_to(
        &self,
        mut canvas: Canvas2d<'_>,
        viewport: &Viewport,
    ) -> std::result::Result<(), EngineError> {
        self.state.renders.borrow_mut().push(RenderCall {
            page: self.number,
            zoom_percent: (viewport.scale * 100.0).round() as u32,
            rotation: viewport.rotation,
            width: viewport.width,
            height: viewport.height,
        });

        let gate = self.state.gate.borrow().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        } else {
            tokio::task::yield_now().await;
        }

        if self.state.fail_render.get() {
            return Err(EngineError::Pdf("rasterizer crashed".to_string()));
        }

        let shade = (self.number * 40 % 256) as u8;
        canvas.clear(Rgba([shade, shade, shade, 255]));
        Ok(())
    }
}

/// Surface that cannot hand out a 2-D context
#[derive(Default)]
pub struct BlindSurface {
    pub sizes: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl DrawingSurface for BlindSurface {
    type View = Rc<RefCell<Vec<(u32, u32)>>>;

    fn view(&self) -> Self::View {
        Rc::clone(&self.sizes)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.sizes.borrow_mut().push((width, height));
    }

    fn context_2d(&mut self) -> Option<Canvas2d<'_>> {
        None
    }
}

/// Run a test body on a `LocalSet` so the controller can spawn its worker
pub async fn run_local<F: Future>(body: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(body).await
}

pub fn viewer(engine: &MockEngine, path: &str) -> ViewerController<SurfaceView> {
    ViewerController::new(
        ViewerOptions::new(path),
        engine.clone(),
        PixelSurface::default(),
    )
    .unwrap()
}
