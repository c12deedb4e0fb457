//! ### English
//! Bitflags controlling optional capture behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制捕获可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Unsafe mode: skip producer-side fences (`GLsync`) for completed frames (lower overhead).
///
/// The display then samples the texture relying only on the decoder's implicit flush ordering.
///
/// ### 中文
/// 不安全模式：完成帧时跳过生产者侧 fence（`GLsync`）（开销更低）。
///
/// 此时显示侧采样纹理仅依赖解码器隐式的 flush 顺序。
pub const VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE: u32 = 1 << 0;

/// ### English
/// Do not clear newly allocated surfaces. The display still treats the initial surface as empty
/// (`sequence == 0`) and draws the placeholder instead of sampling it.
///
/// ### 中文
/// 不清空新分配的 surface。显示侧仍将初始 surface 视为空（`sequence == 0`），绘制占位而不采样。
pub const VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE: u32 = 1 << 1;

pub(crate) const VLC_GL_CAPTURE_KNOWN_FLAGS: u32 =
    VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE | VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE;
