//! ### English
//! C ABI surface for `vlc_gl_capture`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Errors are logged and reported as `false` / NULL.
//!
//! ### 中文
//! `vlc_gl_capture` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 错误会被记录日志，并以 `false` / NULL 返回。
mod abi;
mod capture;
mod display;
mod vlc;

use std::cell::UnsafeCell;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::engine::{
    AcquiredFrame, CaptureConfig, DisplayLoop, FrameCapture, FrameSlotRotator, GlfwApi,
    GlfwContext, GleamSurfaceDevice, GlowQuadPresenter, SessionEvent,
};

/// ### English
/// Decoder-side sink type behind the libVLC callbacks.
///
/// ### 中文
/// libVLC 回调背后的解码侧 sink 类型。
type CaptureSink = FrameCapture<GlfwContext, GleamSurfaceDevice>;

/// ### English
/// Opaque capture handle: the `opaque` pointer passed to the libVLC output callbacks.
///
/// ### 中文
/// 不透明捕获句柄：即传给 libVLC 输出回调的 `opaque` 指针。
pub struct VlcGlCapture {
    /// ### English
    /// Decoder-side state. Only touched from the libVLC callback thread (serialized by libVLC)
    /// and from `vlc_gl_capture_destroy` once playback stopped.
    ///
    /// ### 中文
    /// 解码侧状态。只会在 libVLC 回调线程（由 libVLC 串行化）以及播放停止后的
    /// `vlc_gl_capture_destroy` 中访问。
    sink: UnsafeCell<CaptureSink>,
    rotator: Arc<FrameSlotRotator>,
    events: Receiver<SessionEvent>,
    glfw: GlfwApi,
    config: CaptureConfig,
}

/// ### English
/// Opaque display handle living on the host's main thread.
///
/// ### 中文
/// 位于宿主主线程的不透明显示句柄。
pub struct VlcGlDisplay {
    display: DisplayLoop<GlowQuadPresenter>,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// The frame drawn by one `vlc_gl_display_tick`.
///
/// ### 中文
/// 一次 `vlc_gl_display_tick` 绘制的帧。
pub struct VlcGlCaptureFrame {
    /// ### English
    /// Triple-buffer slot index (0..=2).
    ///
    /// ### 中文
    /// 三缓冲槽位索引（0..=2）。
    pub slot: u32,
    /// ### English
    /// GL texture ID containing the frame (shared with the display context).
    ///
    /// ### 中文
    /// 包含该帧的 GL 纹理 ID（与显示上下文共享）。
    pub texture_id: u32,
    pub width: u32,
    pub height: u32,
    /// ### English
    /// Monotonic frame sequence number (wraps; 0 is reserved).
    ///
    /// ### 中文
    /// 单调递增帧序号（会回绕；0 保留不用）。
    pub frame_seq: u64,
    /// ### English
    /// Whether the frame was new on this tick (otherwise the previous frame was repeated).
    ///
    /// ### 中文
    /// 该帧在本次 tick 是否为新帧（否则为重复上一帧）。
    pub is_new: bool,
}

impl From<AcquiredFrame> for VlcGlCaptureFrame {
    fn from(value: AcquiredFrame) -> Self {
        Self {
            slot: value.surface.index as u32,
            texture_id: value.surface.texture(),
            width: value.surface.size.width,
            height: value.surface.size.height,
            frame_seq: value.sequence,
            is_new: value.is_new,
        }
    }
}
