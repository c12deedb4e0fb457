//! ### English
//! Engine modules: surfaces, triple-buffer rotation, context control, and the decoder/display
//! sides built on them.
//!
//! ### 中文
//! 引擎模块：surface、三缓冲轮换、上下文控制，以及基于它们的解码侧与显示侧。
pub mod capture;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod flags;
pub mod format;
pub mod frame;
pub mod glfw;
pub mod surface;

#[cfg(test)]
mod testing;

pub use capture::{FrameCapture, FrameSink, SessionEvent};
pub use config::CaptureConfig;
pub use context::{DecoderContextBridge, GpuContext};
pub use display::{DisplayLoop, DisplayState, FramePresenter, GlowQuadPresenter};
pub use error::{CaptureError, Result};
pub use format::OutputFormat;
pub use frame::{AcquiredFrame, FrameSlotRotator, Recycled, RoleAssignment, Withdrawn};
pub use glfw::{EmbedderGlfwApi, GlfwApi, GlfwContext};
pub use surface::{GleamSurfaceDevice, Surface, SurfaceDevice, SurfaceSet};
