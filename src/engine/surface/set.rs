//! ### English
//! The batch of three surfaces sized to the current frame.
//!
//! ### 中文
//! 按当前帧尺寸分配的三个 surface。

use dpi::PhysicalSize;
use gleam::gl;

use crate::engine::config::CaptureConfig;
use crate::engine::error::{CaptureError, Result};
use crate::engine::format::OutputFormat;
use crate::engine::frame::TRIPLE_BUFFER_COUNT;

use super::{RenderTarget, Surface, SurfaceDevice};

/// ### English
/// Owns the three triple-buffer surfaces. Surfaces are created and destroyed only as a batch.
///
/// Must only be used on the decoder's GL context thread.
///
/// ### 中文
/// 持有三缓冲的三个 surface。surface 只会整批创建与销毁。
///
/// 只能在解码器 GL 上下文所在线程使用。
pub struct SurfaceSet<D: SurfaceDevice> {
    device: D,
    format: OutputFormat,
    clear_on_configure: bool,
    surfaces: Option<[Surface; TRIPLE_BUFFER_COUNT]>,
}

impl<D: SurfaceDevice> SurfaceSet<D> {
    pub fn new(device: D, config: &CaptureConfig) -> Self {
        Self {
            device,
            format: config.format,
            clear_on_configure: config.clear_on_configure,
            surfaces: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_allocated(&self) -> bool {
        self.surfaces.is_some()
    }

    /// ### English
    /// Size of the allocated surfaces, if any.
    ///
    /// ### 中文
    /// 已分配 surface 的尺寸（若有）。
    pub fn size(&self) -> Option<PhysicalSize<u32>> {
        self.surfaces.as_ref().map(|surfaces| surfaces[0].size)
    }

    /// ### English
    /// Destroys any previous surfaces and allocates three new ones of `size`.
    ///
    /// Each texture is attached to its framebuffer's color attachment 0 and every framebuffer is
    /// checked for completeness. On failure all three new targets are deleted and the set is left
    /// empty.
    ///
    /// ### 中文
    /// 销毁旧 surface 并分配三个 `size` 尺寸的新 surface。
    ///
    /// 每个纹理绑定到其 framebuffer 的颜色附件 0，并逐个检查 framebuffer 完整性。
    /// 失败时删除三个新目标，集合保持为空。
    pub fn configure(&mut self, size: PhysicalSize<u32>) -> Result<[Surface; TRIPLE_BUFFER_COUNT]> {
        self.teardown();

        if size.width == 0 || size.height == 0 {
            return Err(CaptureError::EmptyFrameSize {
                width: size.width,
                height: size.height,
            });
        }

        let targets: [RenderTarget; TRIPLE_BUFFER_COUNT] =
            std::array::from_fn(|_| self.device.create_target(size, &self.format));

        for (index, target) in targets.iter().enumerate() {
            let status = self.device.target_status(target);
            if status == gl::FRAMEBUFFER_COMPLETE {
                continue;
            }

            tracing::error!(
                index,
                status,
                width = size.width,
                height = size.height,
                "incomplete surface framebuffer"
            );
            self.device.bind_draw_target(None);
            for target in &targets {
                self.device.delete_target(target);
            }
            self.device.drain_errors();
            return Err(CaptureError::IncompleteTarget { index, status });
        }

        if self.clear_on_configure {
            for target in &targets {
                self.device.clear_target(target);
            }
        }
        self.device.drain_errors();

        let surfaces = std::array::from_fn(|index| Surface {
            index,
            target: targets[index],
            size,
        });
        self.surfaces = Some(surfaces);
        tracing::debug!(width = size.width, height = size.height, "surfaces allocated");
        Ok(surfaces)
    }

    /// ### English
    /// Bounds-checked lookup. An index outside `0..3` is a programming error; an empty set reports
    /// `NotAllocated`.
    ///
    /// ### 中文
    /// 带边界检查的查找。`0..3` 之外的索引属于编程错误；集合为空时返回 `NotAllocated`。
    pub fn surface_at(&self, index: usize) -> Result<Surface> {
        debug_assert!(index < TRIPLE_BUFFER_COUNT, "surface index {index} out of range");
        let surfaces = self.surfaces.as_ref().ok_or(CaptureError::NotAllocated)?;
        surfaces
            .get(index)
            .copied()
            .ok_or(CaptureError::IndexOutOfRange { index })
    }

    /// ### English
    /// Releases all three surfaces. No-op when nothing is allocated.
    ///
    /// ### 中文
    /// 释放全部三个 surface。未分配时为 no-op。
    pub fn teardown(&mut self) {
        if let Some(surfaces) = self.surfaces.take() {
            self.delete_batch(&surfaces);
        }
    }

    /// ### English
    /// Detaches the current batch without deleting it. The caller keeps it alive until the display
    /// let go of it, then hands it to `delete_batch`.
    ///
    /// ### 中文
    /// 取走当前批次但不删除。调用方在显示侧放手之前保持其存活，之后交给 `delete_batch`。
    pub fn retire(&mut self) -> Option<[Surface; TRIPLE_BUFFER_COUNT]> {
        self.surfaces.take()
    }

    pub fn delete_batch(&self, surfaces: &[Surface; TRIPLE_BUFFER_COUNT]) {
        self.device.bind_draw_target(None);
        for surface in surfaces {
            self.device.delete_target(&surface.target);
        }
        self.device.drain_errors();
        tracing::debug!("surfaces released");
    }
}
