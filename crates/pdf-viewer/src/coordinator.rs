//! Serializes render requests against the single drawing surface.
//!
//! At most one render is in flight. Requests arriving meanwhile collapse into
//! a single pending slot where the latest request wins.

/// Identifies one dispatched render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering {
        job: JobId,
        page: u32,
    },
    RenderingWithPending {
        job: JobId,
        page: u32,
        pending: u32,
    },
}

impl RenderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RenderState::Idle)
    }

    pub fn in_flight(&self) -> Option<JobId> {
        match *self {
            RenderState::Idle => None,
            RenderState::Rendering { job, .. } | RenderState::RenderingWithPending { job, .. } => {
                Some(job)
            }
        }
    }

    pub fn pending(&self) -> Option<u32> {
        match *self {
            RenderState::RenderingWithPending { pending, .. } => Some(pending),
            _ => None,
        }
    }
}

/// A render the caller must start now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub job: JobId,
    pub page: u32,
}

/// What to do after a render finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Nothing pending; the coordinator is idle
    Idle,
    /// Start the coalesced follow-up render
    FollowUp(RenderTicket),
    /// The completion was not for the in-flight job and changed nothing
    Stale,
}

#[derive(Debug, Default)]
pub struct RenderCoordinator {
    state: RenderState,
    next_job: u64,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_rendering(&self) -> bool {
        !self.state.is_idle()
    }

    /// Ask for `page` to be rendered. Returns a ticket when the render may
    /// start immediately; otherwise the request replaces any pending one.
    pub fn request(&mut self, page: u32) -> Option<RenderTicket> {
        match self.state {
            RenderState::Idle => Some(self.start(page)),
            RenderState::Rendering { job, page: current }
            | RenderState::RenderingWithPending {
                job, page: current, ..
            } => {
                if let Some(dropped) = self.state.pending() {
                    log::debug!("Coalescing render request: page {} replaces page {}", page, dropped);
                }
                self.state = RenderState::RenderingWithPending {
                    job,
                    page: current,
                    pending: page,
                };
                None
            }
        }
    }

    /// Record that `job` finished. A failed render never starts the pending one.
    pub fn complete(&mut self, job: JobId, succeeded: bool) -> Completion {
        if self.state.in_flight() != Some(job) {
            return Completion::Stale;
        }

        match (self.state, succeeded) {
            (RenderState::RenderingWithPending { pending, .. }, true) => {
                Completion::FollowUp(self.start(pending))
            }
            (RenderState::RenderingWithPending { pending, .. }, false) => {
                log::debug!("Dropping pending render of page {} after failure", pending);
                self.state = RenderState::Idle;
                Completion::Idle
            }
            _ => {
                self.state = RenderState::Idle;
                Completion::Idle
            }
        }
    }

    fn start(&mut self, page: u32) -> RenderTicket {
        self.next_job += 1;
        let job = JobId(self.next_job);
        self.state = RenderState::Rendering { job, page };
        RenderTicket { job, page }
    }
}
