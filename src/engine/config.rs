//! ### English
//! Construction-time configuration for the capture engine.
//!
//! ### 中文
//! 捕获引擎的构造期配置。

use super::flags::{
    VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE, VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE,
    VLC_GL_CAPTURE_KNOWN_FLAGS,
};
use super::format::OutputFormat;

/// ### English
/// Configuration shared by the decoder-side capture and the display loop.
///
/// ### 中文
/// 解码侧捕获与显示循环共享的配置。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureConfig {
    /// ### English
    /// Pixel format negotiated with the decoder and used for every surface.
    ///
    /// ### 中文
    /// 与解码器协商、并用于所有 surface 的像素格式。
    pub format: OutputFormat,
    /// ### English
    /// Insert a `GLsync` after each completed frame for the display to wait on.
    ///
    /// ### 中文
    /// 每帧完成后插入 `GLsync`，供显示侧等待。
    pub producer_fence: bool,
    /// ### English
    /// Clear newly allocated surfaces to transparent black.
    ///
    /// ### 中文
    /// 将新分配的 surface 清空为透明黑。
    pub clear_on_configure: bool,
    /// ### English
    /// RGBA clear color drawn by the display when there is no frame to show.
    ///
    /// ### 中文
    /// 没有可显示帧时显示侧绘制的 RGBA 清屏颜色。
    pub placeholder_color: [f32; 4],
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            producer_fence: true,
            clear_on_configure: true,
            placeholder_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl CaptureConfig {
    /// ### English
    /// Builds a configuration from the C ABI bitmask (`VLC_GL_CAPTURE_FLAG_*`).
    /// Unknown bits are ignored.
    ///
    /// ### 中文
    /// 由 C ABI 位掩码（`VLC_GL_CAPTURE_FLAG_*`）构建配置。未知位会被忽略。
    pub fn from_flags(flags: u32) -> Self {
        let unknown = flags & !VLC_GL_CAPTURE_KNOWN_FLAGS;
        if unknown != 0 {
            tracing::warn!(unknown, "ignoring unknown capture flags");
        }

        Self {
            producer_fence: flags & VLC_GL_CAPTURE_FLAG_UNSAFE_NO_PRODUCER_FENCE == 0,
            clear_on_configure: flags & VLC_GL_CAPTURE_FLAG_NO_CLEAR_ON_CONFIGURE == 0,
            ..Self::default()
        }
    }
}
