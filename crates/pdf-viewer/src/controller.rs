use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::coordinator::{Completion, RenderCoordinator, RenderState, RenderTicket};
use crate::engine::RenderEngine;
use crate::options::{BASE_ZOOM_PERCENT, ViewerOptions};
use crate::runtime::{RenderJob, RenderTarget, RenderUpdate};
use crate::surface::DrawingSurface;
use crate::types::*;
use crate::worker::render_worker;

/// Mutable view state, owned by the controller
#[derive(Debug)]
pub struct ViewState {
    pub current_page: u32,
    /// 0 until a document has been opened
    pub total_pages: u32,
    pub zoom_percent: u32,
    /// Multiple of 90, unbounded
    pub rotation_degrees: i32,
    pub render: RenderCoordinator,
    /// Empty when the last render succeeded
    pub last_error: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            zoom_percent: BASE_ZOOM_PERCENT,
            rotation_degrees: 0,
            render: RenderCoordinator::new(),
            last_error: String::new(),
        }
    }
}

/// Pages through, zooms and rotates one document, delegating rasterization to
/// a render worker.
///
/// Commands mutate state immediately and request a render of the current page.
/// Completions come back from the worker and are applied by
/// [`process_updates`](Self::process_updates), [`next_update`](Self::next_update)
/// or [`wait_idle`](Self::wait_idle).
///
/// Must be created inside a [`tokio::task::LocalSet`]: the worker is spawned
/// with `spawn_local`.
pub struct ViewerController<V> {
    options: ViewerOptions,
    state: ViewState,
    view: V,
    job_tx: mpsc::UnboundedSender<RenderJob>,
    update_rx: mpsc::UnboundedReceiver<RenderUpdate>,
    worker: JoinHandle<()>,
}

impl<V: Clone> ViewerController<V> {
    /// Validate `options`, spawn the render worker and request page 1
    pub fn new<E, S>(options: ViewerOptions, engine: E, surface: S) -> Result<Self>
    where
        E: RenderEngine,
        S: DrawingSurface<View = V>,
    {
        options.validate()?;

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let view = surface.view();

        // Spawn worker task
        let worker = tokio::task::spawn_local(render_worker(engine, surface, job_rx, update_tx));

        let mut controller = Self {
            options,
            state: ViewState::default(),
            view,
            job_tx,
            update_rx,
            worker,
        };
        controller.request_render();
        Ok(controller)
    }

    /// The drawable surface handle bound to this controller
    pub fn view(&self) -> V {
        self.view.clone()
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn render_state(&self) -> RenderState {
        self.state.render.state()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            current_page: self.state.current_page,
            total_pages: self.state.total_pages,
            zoom_percent: self.state.zoom_percent,
            rotation_degrees: self.state.rotation_degrees,
            loading: self.state.render.is_rendering(),
            last_error: self.state.last_error.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.render.is_rendering()
    }

    pub fn next_page(&mut self) -> bool {
        if self.state.current_page >= self.state.total_pages {
            return false;
        }
        self.state.current_page += 1;
        self.request_render();
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.state.current_page <= 1 {
            return false;
        }
        self.state.current_page -= 1;
        self.request_render();
        true
    }

    /// Jump straight to `page`; out-of-range pages and the current page are no-ops
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page == 0 || page > self.state.total_pages || page == self.state.current_page {
            return false;
        }
        self.state.current_page = page;
        self.request_render();
        true
    }

    pub fn increase_zoom(&mut self) -> bool {
        self.state.zoom_percent = self.state.zoom_percent.saturating_add(self.options.zoom_step);
        self.request_render();
        true
    }

    pub fn decrease_zoom(&mut self) -> bool {
        let lowered = self
            .state
            .zoom_percent
            .checked_sub(self.options.zoom_step)
            .filter(|zoom| *zoom >= self.options.min_zoom);

        match lowered {
            Some(zoom) => {
                self.state.zoom_percent = zoom;
                self.request_render();
                true
            }
            None => false,
        }
    }

    pub fn rotate_right(&mut self) -> bool {
        self.state.rotation_degrees += 90;
        self.request_render();
        true
    }

    pub fn rotate_left(&mut self) -> bool {
        self.state.rotation_degrees -= 90;
        self.request_render();
        true
    }

    /// Switch to another document and show its first page
    pub fn open_source(&mut self, src: impl Into<DocumentSource>) {
        self.options.src = src.into();
        self.state.current_page = 1;
        self.request_render();
    }

    /// Apply every update the worker has already sent, without waiting.
    /// Returns how many were applied.
    pub fn process_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            self.apply_update(update);
            applied += 1;
        }
        applied
    }

    /// Wait for the next worker update and apply it. Returns `false` if the
    /// worker has stopped.
    pub async fn next_update(&mut self) -> bool {
        match self.update_rx.recv().await {
            Some(update) => {
                self.apply_update(update);
                true
            }
            None => false,
        }
    }

    /// Apply updates until no render is in flight
    pub async fn wait_idle(&mut self) {
        while self.state.render.is_rendering() {
            if !self.next_update().await {
                self.fail_in_flight(ViewerError::WorkerStopped);
            }
        }
    }

    /// Stop the worker and wait for it to release the open document
    pub async fn dispose(self) {
        let Self { job_tx, worker, .. } = self;

        // Closing the job channel ends the worker loop
        drop(job_tx);
        if let Err(e) = worker.await {
            log::warn!("Render worker ended abnormally: {}", e);
        }
    }

    fn request_render(&mut self) {
        let page = self.state.current_page;
        match self.state.render.request(page) {
            Some(ticket) => self.dispatch(ticket),
            None => log::debug!("Render in flight, page {} queued", page),
        }
    }

    /// Send the live view state to the worker. A follow-up ticket's page may
    /// have been clamped by a document open since it was queued.
    fn dispatch(&mut self, ticket: RenderTicket) {
        let target = RenderTarget {
            source: self.options.src.clone(),
            page: self.state.current_page,
            zoom_percent: self.state.zoom_percent,
            rotation_degrees: self.state.rotation_degrees,
        };
        log::debug!(
            "Dispatching render {:?}: page {} at {}%, {}°",
            ticket.job,
            target.page,
            target.zoom_percent,
            target.rotation_degrees
        );

        if self
            .job_tx
            .send(RenderJob {
                id: ticket.job,
                target,
            })
            .is_err()
        {
            self.fail_in_flight(ViewerError::WorkerStopped);
        }
    }

    fn fail_in_flight(&mut self, error: ViewerError) {
        self.state.last_error = error.to_string();
        if let Some(job) = self.state.render.state().in_flight() {
            self.state.render.complete(job, false);
        }
    }

    fn apply_update(&mut self, update: RenderUpdate) {
        if self.state.render.state().in_flight() != Some(update.job()) {
            log::warn!("Ignoring update for stale render {:?}", update.job());
            return;
        }

        match update {
            RenderUpdate::DocumentOpened { page_count, .. } => {
                self.state.total_pages = page_count;
                self.state.current_page = self.state.current_page.clamp(1, page_count.max(1));
            }
            RenderUpdate::Finished { job, result } => {
                let succeeded = match result {
                    Ok(rendered) => {
                        log::debug!(
                            "Rendered page {} ({}x{})",
                            rendered.page,
                            rendered.width,
                            rendered.height
                        );
                        self.state.last_error.clear();
                        true
                    }
                    Err(e) => {
                        self.state.last_error = e.to_string();
                        false
                    }
                };

                match self.state.render.complete(job, succeeded) {
                    Completion::FollowUp(ticket) => self.dispatch(ticket),
                    Completion::Idle | Completion::Stale => {}
                }
            }
        }
    }
}
