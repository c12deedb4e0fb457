use crate::engine::flags;

/// ### English
/// C ABI version for `vlc_gl_capture`.
///
/// ### 中文
/// `vlc_gl_capture` 的 C ABI 版本号。
const VLC_GL_CAPTURE_ABI_VERSION: u32 = 1;

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn vlc_gl_capture_abi_version() -> u32 {
    VLC_GL_CAPTURE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE`.
/// (Constant getter for hosts without C headers.)
///
/// ### 中文
/// 返回 `VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE`。
/// （供无 C 头文件的宿主使用的常量获取函数。）
pub extern "C" fn vlc_gl_capture_flag_unsafe_no_producer_fence() -> u32 {
    flags::VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE`.
///
/// ### 中文
/// 返回 `VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE`。
pub extern "C" fn vlc_gl_capture_flag_no_clear_on_configure() -> u32 {
    flags::VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE
}
