//! ### English
//! Output pixel-format descriptor returned to the decoder during size negotiation.
//!
//! The numeric values of the enums mirror libVLC 4 (`libvlc_video_*_t`) so they can be written
//! straight into `libvlc_video_output_cfg_t`.
//!
//! ### 中文
//! 尺寸协商时返回给解码器的输出像素格式描述。
//!
//! 各枚举的数值与 libVLC 4（`libvlc_video_*_t`）一致，可直接写入 `libvlc_video_output_cfg_t`。

use gleam::gl;

#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Bt601 = 1,
    Bt709 = 2,
    Bt2020 = 3,
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorPrimaries {
    Bt601_525 = 1,
    Bt601_625 = 2,
    Bt709 = 3,
    Bt2020 = 4,
    DciP3 = 5,
    Bt470M = 6,
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferFunction {
    Linear = 1,
    Srgb = 2,
    Bt470Bg = 3,
    Bt470M = 4,
    Bt709 = 5,
    Pq = 6,
    Smpte240 = 7,
    Hlg = 8,
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
    LeftTop = 4,
    LeftBottom = 5,
    RightTop = 6,
    RightBottom = 7,
}

/// ### English
/// Pixel format of every surface and of the frames the decoder writes into them.
///
/// ### 中文
/// 所有 surface 以及解码器写入帧的像素格式。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    /// ### English
    /// GL internal format / pixel format of the color attachment (`GL_RGBA` by default).
    ///
    /// ### 中文
    /// 颜色附件的 GL 内部格式/像素格式（默认 `GL_RGBA`）。
    pub gl_format: u32,
    pub full_range: bool,
    pub colorspace: ColorSpace,
    pub primaries: ColorPrimaries,
    pub transfer: TransferFunction,
    pub orientation: Orientation,
}

impl Default for OutputFormat {
    /// ### English
    /// 8-bit RGBA, full range, BT.709 primaries/colorspace, sRGB transfer, top-left origin.
    ///
    /// ### 中文
    /// 8 位 RGBA、全范围、BT.709 原色/色彩空间、sRGB 传递函数、左上角原点。
    fn default() -> Self {
        Self {
            gl_format: gl::RGBA,
            full_range: true,
            colorspace: ColorSpace::Bt709,
            primaries: ColorPrimaries::Bt709,
            transfer: TransferFunction::Srgb,
            orientation: Orientation::TopLeft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_decoder_contract() {
        let format = OutputFormat::default();
        assert_eq!(format.gl_format, 0x1908);
        assert!(format.full_range);
        assert_eq!(format.colorspace as i32, 2);
        assert_eq!(format.primaries as i32, 3);
        assert_eq!(format.transfer as i32, 2);
        assert_eq!(format.orientation as i32, 0);
    }
}
