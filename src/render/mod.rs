//! Rendering: local preview canvas and remote composite surface.

pub mod canvas;
pub mod skeleton;
pub mod surface;

pub use canvas::LocalCanvas;
pub use surface::RenderSurface;
