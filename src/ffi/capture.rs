use std::cell::UnsafeCell;
use std::ffi::{CString, c_void};
use std::sync::Arc;

use crate::engine::glfw::GlfwWindowPtr;
use crate::engine::{
    CaptureConfig, EmbedderGlfwApi, FrameCapture, FrameSlotRotator, GlfwApi, GlfwContext,
    GleamSurfaceDevice, GpuContext as _,
};

use super::VlcGlCapture;
use super::vlc::VlcGlOutputCallbacks;

#[unsafe(no_mangle)]
/// ### English
/// Creates a capture handle bound to the host's GLFW instance.
///
/// - `api`: GLFW function table (see `EmbedderGlfwApi`).
/// - `display_window`: the host's window whose context displays frames.
/// - `decoder_window`: an invisible window sharing objects with `display_window`, used as the
///   decoder context. If NULL, one is created from `display_window`, which requires the
///   window-creation symbols in `api`.
/// - `flags`: `VLC_GL_CAPTURE_FLAG_*` bitmask.
///
/// Must be called on the GLFW main thread. Returns NULL on failure.
///
/// ### 中文
/// 创建绑定到宿主 GLFW 实例的捕获句柄。
///
/// - `api`：GLFW 函数表（见 `EmbedderGlfwApi`）。
/// - `display_window`：宿主用于显示帧的 window。
/// - `decoder_window`：与 `display_window` 共享对象的不可见 window，作为解码器上下文。
///   为 NULL 时会基于 `display_window` 创建，此时 `api` 必须提供 window 创建相关符号。
/// - `flags`：`VLC_GL_CAPTURE_FLAG_*` 位掩码。
///
/// 必须在 GLFW 主线程调用。失败时返回 NULL。
pub unsafe extern "C" fn vlc_gl_capture_create(
    api: *const EmbedderGlfwApi,
    display_window: *mut c_void,
    decoder_window: *mut c_void,
    flags: u32,
) -> *mut VlcGlCapture {
    if api.is_null() {
        return std::ptr::null_mut();
    }

    let glfw = match unsafe { GlfwApi::from_embedder(&*api) } {
        Ok(glfw) => glfw,
        Err(err) => {
            tracing::error!(%err, "rejecting embedder GLFW table");
            return std::ptr::null_mut();
        }
    };

    let context = if decoder_window.is_null() {
        unsafe { GlfwContext::create_shared(glfw, display_window as GlfwWindowPtr) }
    } else {
        GlfwContext::borrowed(glfw, decoder_window as GlfwWindowPtr)
    };
    let context = match context {
        Ok(context) => context,
        Err(err) => {
            tracing::error!(%err, "cannot set up the decoder GL context");
            return std::ptr::null_mut();
        }
    };

    let config = CaptureConfig::from_flags(flags);
    let rotator = Arc::new(FrameSlotRotator::new());
    let (sender, events) = crossbeam_channel::unbounded();

    let sink = FrameCapture::new(
        context,
        Box::new(|context: &GlfwContext| unsafe {
            GleamSurfaceDevice::load_with(|name| match CString::new(name) {
                Ok(name) => context.proc_address(&name),
                Err(_) => std::ptr::null(),
            })
        }),
        rotator.clone(),
        sender,
        config,
    );

    Box::into_raw(Box::new(VlcGlCapture {
        sink: UnsafeCell::new(sink),
        rotator,
        events,
        glfw,
        config,
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Fills `out` with the libVLC output callbacks for `capture`.
///
/// Pass them to `libvlc_video_set_output_callbacks` with `libvlc_video_engine_opengl` and
/// `out->opaque` as the opaque pointer.
///
/// ### 中文
/// 为 `capture` 填充 libVLC 输出回调。
///
/// 将其与 `libvlc_video_engine_opengl` 一起传给 `libvlc_video_set_output_callbacks`，
/// opaque 指针使用 `out->opaque`。
pub unsafe extern "C" fn vlc_gl_capture_callbacks(
    capture: *mut VlcGlCapture,
    out: *mut VlcGlOutputCallbacks,
) -> bool {
    if capture.is_null() || out.is_null() {
        return false;
    }
    unsafe { out.write(VlcGlOutputCallbacks::for_capture(capture)) };
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a capture created by `vlc_gl_capture_create`.
///
/// The media player must be stopped (no callback in flight) and the display created for this
/// capture must already be destroyed. Surfaces still alive are released with the decoder context
/// made current briefly on this thread; the previously current context is restored. Must be
/// called on the GLFW main thread.
///
/// ### 中文
/// 销毁由 `vlc_gl_capture_create` 创建的捕获句柄。
///
/// 媒体播放器必须已停止（无进行中的回调），且为该 capture 创建的 display 必须已销毁。
/// 仍存活的 surface 会在本线程短暂 current 解码器上下文后释放；之后恢复原先 current 的上下文。
/// 必须在 GLFW 主线程调用。
pub unsafe extern "C" fn vlc_gl_capture_destroy(capture: *mut VlcGlCapture) {
    if capture.is_null() {
        return;
    }
    let mut capture = unsafe { Box::from_raw(capture) };
    let previous = unsafe { capture.glfw.current_context() };

    let sink = capture.sink.get_mut();
    sink.shutdown();
    unsafe { sink.context().make_window_current(previous) };

    drop(capture);
}
