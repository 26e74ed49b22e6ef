pub mod controller;
pub mod coordinator;
pub mod document;
pub mod engine;
pub mod engines;
mod options;
pub mod runtime;
pub mod surface;
mod types;
pub mod viewport;
pub mod worker;

pub use controller::{ViewState, ViewerController};
pub use coordinator::{JobId, RenderCoordinator, RenderState};
pub use document::DocumentSlot;
pub use engine::{DocumentHandle, PageHandle, RenderEngine};
pub use options::*;
pub use surface::{
    Canvas2d, DrawingSurface, Frame, MAX_SURFACE_AREA, MAX_SURFACE_SIDE, PixelSurface, SurfaceView,
};
pub use types::*;
pub use viewport::Viewport;
