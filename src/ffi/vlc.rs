//! ### English
//! libVLC 4 OpenGL output-callback ABI (`libvlc_video_set_output_callbacks` with
//! `libvlc_video_engine_opengl`) and the trampolines into `FrameSink`.
//!
//! ### 中文
//! libVLC 4 OpenGL 输出回调 ABI（`libvlc_video_set_output_callbacks` 搭配
//! `libvlc_video_engine_opengl`）以及转发到 `FrameSink` 的跳板函数。

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};

use crate::engine::FrameSink;

use super::{CaptureSink, VlcGlCapture};

#[repr(C)]
pub struct LibvlcVideoSetupDeviceCfg {
    pub hardware_decoding: bool,
}

#[repr(C)]
/// ### English
/// `libvlc_video_setup_device_info_t`: a union of Direct3D device descriptions. Unused by the
/// OpenGL engine; only its size matters.
///
/// ### 中文
/// `libvlc_video_setup_device_info_t`：Direct3D 设备描述的 union。OpenGL 引擎不使用它，只关心其大小。
pub struct LibvlcVideoSetupDeviceInfo {
    _d3d: [*mut c_void; 2],
}

#[repr(C)]
/// ### English
/// `libvlc_video_render_cfg_t`: the output the decoder wants to render.
///
/// ### 中文
/// `libvlc_video_render_cfg_t`：解码器期望渲染的输出。
pub struct LibvlcVideoRenderCfg {
    pub width: c_uint,
    pub height: c_uint,
    pub bitdepth: c_uint,
    pub full_range: bool,
    pub colorspace: c_int,
    pub primaries: c_int,
    pub transfer: c_int,
    pub device: *mut c_void,
}

#[repr(C)]
/// ### English
/// `libvlc_video_output_cfg_t`. The leading union is represented by its widest member; the
/// OpenGL engine reads it as `int opengl_format`.
///
/// ### 中文
/// `libvlc_video_output_cfg_t`。开头的 union 以其最宽成员表示；OpenGL 引擎将其读作 `int opengl_format`。
pub struct LibvlcVideoOutputCfg {
    pub surface_format: LibvlcOutputFormatUnion,
    pub full_range: bool,
    pub colorspace: c_int,
    pub primaries: c_int,
    pub transfer: c_int,
    pub orientation: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union LibvlcOutputFormatUnion {
    pub opengl_format: c_int,
    pub p_surface: *mut c_void,
}

pub type LibvlcVideoOutputSetupCb = unsafe extern "C" fn(
    *mut *mut c_void,
    *const LibvlcVideoSetupDeviceCfg,
    *mut LibvlcVideoSetupDeviceInfo,
) -> bool;
pub type LibvlcVideoOutputCleanupCb = unsafe extern "C" fn(*mut c_void);
pub type LibvlcVideoUpdateOutputCb = unsafe extern "C" fn(
    *mut c_void,
    *const LibvlcVideoRenderCfg,
    *mut LibvlcVideoOutputCfg,
) -> bool;
pub type LibvlcVideoSwapCb = unsafe extern "C" fn(*mut c_void);
pub type LibvlcVideoMakeCurrentCb = unsafe extern "C" fn(*mut c_void, bool) -> bool;
pub type LibvlcVideoGetProcAddressCb = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;

#[repr(C)]
/// ### English
/// Arguments for `libvlc_video_set_output_callbacks(mp, libvlc_video_engine_opengl, setup,
/// cleanup, NULL, update_output, swap, make_current, get_proc_address, NULL, NULL, opaque)`.
///
/// ### 中文
/// `libvlc_video_set_output_callbacks(mp, libvlc_video_engine_opengl, setup, cleanup, NULL,
/// update_output, swap, make_current, get_proc_address, NULL, NULL, opaque)` 的参数。
pub struct VlcGlOutputCallbacks {
    pub setup: LibvlcVideoOutputSetupCb,
    pub cleanup: LibvlcVideoOutputCleanupCb,
    pub update_output: LibvlcVideoUpdateOutputCb,
    pub swap: LibvlcVideoSwapCb,
    pub make_current: LibvlcVideoMakeCurrentCb,
    pub get_proc_address: LibvlcVideoGetProcAddressCb,
    pub opaque: *mut c_void,
}

impl VlcGlOutputCallbacks {
    pub(super) fn for_capture(capture: *mut VlcGlCapture) -> Self {
        Self {
            setup: setup_trampoline,
            cleanup: cleanup_trampoline,
            update_output: update_output_trampoline,
            swap: swap_trampoline,
            make_current: make_current_trampoline,
            get_proc_address: get_proc_address_trampoline,
            opaque: capture.cast(),
        }
    }
}

/// ### English
/// Recovers the sink from libVLC's opaque pointer.
///
/// # Safety
/// `opaque` must be a live `VlcGlCapture` and the call must come from the libVLC callback
/// thread (which serializes all callbacks).
///
/// ### 中文
/// 从 libVLC 的 opaque 指针取回 sink。
///
/// # Safety
/// `opaque` 必须是有效的 `VlcGlCapture`，且调用必须来自 libVLC 回调线程（其保证所有回调串行）。
unsafe fn sink<'a>(opaque: *mut c_void) -> Option<&'a mut CaptureSink> {
    let capture = opaque.cast::<VlcGlCapture>();
    if capture.is_null() {
        return None;
    }
    Some(unsafe { &mut *(*capture).sink.get() })
}

unsafe extern "C" fn setup_trampoline(
    opaque: *mut *mut c_void,
    _cfg: *const LibvlcVideoSetupDeviceCfg,
    _out: *mut LibvlcVideoSetupDeviceInfo,
) -> bool {
    if opaque.is_null() {
        return false;
    }
    let Some(sink) = (unsafe { sink(*opaque) }) else {
        return false;
    };
    sink.on_setup();
    true
}

unsafe extern "C" fn cleanup_trampoline(opaque: *mut c_void) {
    if let Some(sink) = unsafe { sink(opaque) } {
        sink.on_teardown();
    }
}

unsafe extern "C" fn update_output_trampoline(
    opaque: *mut c_void,
    cfg: *const LibvlcVideoRenderCfg,
    out: *mut LibvlcVideoOutputCfg,
) -> bool {
    if cfg.is_null() || out.is_null() {
        return false;
    }
    let Some(sink) = (unsafe { sink(opaque) }) else {
        return false;
    };
    let (width, height) = unsafe { ((*cfg).width, (*cfg).height) };

    match sink.on_size_negotiated(width, height) {
        Ok(format) => {
            unsafe {
                out.write(LibvlcVideoOutputCfg {
                    surface_format: LibvlcOutputFormatUnion {
                        opengl_format: format.gl_format as c_int,
                    },
                    full_range: format.full_range,
                    colorspace: format.colorspace as c_int,
                    primaries: format.primaries as c_int,
                    transfer: format.transfer as c_int,
                    orientation: format.orientation as c_int,
                });
            }
            true
        }
        Err(err) => {
            tracing::error!(%err, width, height, "rejecting decoder output configuration");
            false
        }
    }
}

unsafe extern "C" fn swap_trampoline(opaque: *mut c_void) {
    if let Some(sink) = unsafe { sink(opaque) } {
        sink.on_frame_complete();
    }
}

unsafe extern "C" fn make_current_trampoline(opaque: *mut c_void, enter: bool) -> bool {
    let Some(sink) = (unsafe { sink(opaque) }) else {
        return false;
    };
    sink.on_context_needed(enter).is_ok()
}

unsafe extern "C" fn get_proc_address_trampoline(
    opaque: *mut c_void,
    name: *const c_char,
) -> *mut c_void {
    if name.is_null() {
        return std::ptr::null_mut();
    }
    let Some(sink) = (unsafe { sink(opaque) }) else {
        return std::ptr::null_mut();
    };
    let name = unsafe { CStr::from_ptr(name) };
    sink.on_resolve_symbol(name).cast_mut()
}
