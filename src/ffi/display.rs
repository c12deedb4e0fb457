use crate::engine::{DisplayLoop, GlowQuadPresenter};

use super::{VlcGlCapture, VlcGlCaptureFrame, VlcGlDisplay};

#[unsafe(no_mangle)]
/// ### English
/// Creates the display side for `capture` on the calling (main) thread.
///
/// The display window's context must be current. The display must be destroyed on the same
/// thread, with the same context current, before `capture` is destroyed. One display per capture.
///
/// Returns NULL on failure (e.g. shader compilation).
///
/// ### 中文
/// 在调用线程（主线程）上为 `capture` 创建显示侧。
///
/// 显示 window 的上下文必须 current。必须在同一线程、同一上下文 current 时，
/// 先于 `capture` 销毁它。每个 capture 只能有一个 display。
///
/// 失败时（例如 shader 编译失败）返回 NULL。
pub unsafe extern "C" fn vlc_gl_display_create(capture: *const VlcGlCapture) -> *mut VlcGlDisplay {
    if capture.is_null() {
        return std::ptr::null_mut();
    }
    let capture = unsafe { &*capture };
    let glfw = capture.glfw;

    let presenter = match unsafe {
        GlowQuadPresenter::load_with(
            |name| glfw.get_proc_address(name),
            capture.config.placeholder_color,
        )
    } {
        Ok(presenter) => presenter,
        Err(err) => {
            tracing::error!(%err, "cannot create the display presenter");
            return std::ptr::null_mut();
        }
    };

    let display = DisplayLoop::new(capture.rotator.clone(), capture.events.clone(), presenter);
    Box::into_raw(Box::new(VlcGlDisplay { display }))
}

#[unsafe(no_mangle)]
/// ### English
/// Draws one refresh into the current draw framebuffer: the newest decoded frame, or the
/// placeholder when there is none. Swapping buffers stays with the host.
///
/// If `out_frame` is non-NULL and a frame was drawn, it receives that frame.
/// Returns whether a frame was drawn.
///
/// ### 中文
/// 向当前绘制 framebuffer 绘制一次刷新：最新的解码帧，或在没有帧时绘制占位画面。
/// 交换缓冲由宿主负责。
///
/// 若 `out_frame` 非 NULL 且绘制了帧，则写入该帧信息。返回是否绘制了帧。
pub unsafe extern "C" fn vlc_gl_display_tick(
    display: *mut VlcGlDisplay,
    out_frame: *mut VlcGlCaptureFrame,
) -> bool {
    if display.is_null() {
        return false;
    }

    let Some(frame) = (unsafe { (*display).display.tick() }) else {
        return false;
    };
    if !out_frame.is_null() {
        unsafe { out_frame.write(frame.into()) };
    }
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a display created by `vlc_gl_display_create`.
///
/// ### 中文
/// 销毁由 `vlc_gl_display_create` 创建的显示句柄。
pub unsafe extern "C" fn vlc_gl_display_destroy(display: *mut VlcGlDisplay) {
    if display.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(display));
    }
}
