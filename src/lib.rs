//! ### English
//! `vlc_gl_capture` crate root.
//!
//! Captures frames a libVLC-style decoder renders through its OpenGL output callbacks into a
//! triple buffer of shared GL surfaces, and presents the newest one from the display thread.
//! Rust users drive `engine` directly; the C ABI in `ffi` wraps it for other hosts.
//!
//! ### 中文
//! `vlc_gl_capture` 的 crate 根。
//!
//! 把 libVLC 风格解码器通过 OpenGL 输出回调渲染的帧捕获到共享 GL surface 的三缓冲中，
//! 并在显示线程呈现最新一帧。Rust 使用者直接驱动 `engine`；`ffi` 中的 C ABI 为其他宿主封装它。
pub mod engine;
mod ffi;
