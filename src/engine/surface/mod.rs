//! ### English
//! GPU render targets the decoder writes frames into and the display samples from.
//!
//! ### 中文
//! 解码器写入帧、显示侧采样的 GPU 渲染目标。

use dpi::PhysicalSize;

use super::format::OutputFormat;

mod gleam_device;
mod set;

pub use gleam_device::GleamSurfaceDevice;
pub use set::SurfaceSet;

/// ### English
/// Raw GL object names of one render target (color texture + framebuffer).
///
/// ### 中文
/// 单个渲染目标的 GL 对象名（颜色纹理 + framebuffer）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    /// ### English
    /// Color texture attached to `framebuffer` (shared with the display context).
    ///
    /// ### 中文
    /// 绑定到 `framebuffer` 的颜色纹理（与显示上下文共享）。
    pub texture: u32,
    pub framebuffer: u32,
}

/// ### English
/// One allocated surface: a render target plus its slot index and size.
///
/// `Surface` is a copyable handle; the GL objects it names are owned by `SurfaceSet`.
///
/// ### 中文
/// 一个已分配的 surface：渲染目标及其槽位索引与尺寸。
///
/// `Surface` 是可复制的句柄；其引用的 GL 对象由 `SurfaceSet` 持有。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub index: usize,
    pub target: RenderTarget,
    pub size: PhysicalSize<u32>,
}

impl Surface {
    pub fn texture(&self) -> u32 {
        self.target.texture
    }

    pub fn framebuffer(&self) -> u32 {
        self.target.framebuffer
    }
}

/// ### English
/// GPU operations `SurfaceSet` and the decoder-side capture need.
///
/// Every method must be called on the thread where the decoder's GL context is current.
///
/// ### 中文
/// `SurfaceSet` 与解码侧捕获所需的 GPU 操作。
///
/// 所有方法都必须在解码器 GL 上下文 current 的线程上调用。
pub trait SurfaceDevice {
    /// ### English
    /// Creates a texture of `size`/`format`, a framebuffer, and attaches the texture as color
    /// attachment 0. Leaves the new framebuffer bound.
    ///
    /// ### 中文
    /// 创建 `size`/`format` 的纹理与 framebuffer，并把纹理绑定到颜色附件 0。
    /// 结束时新 framebuffer 保持绑定。
    fn create_target(&self, size: PhysicalSize<u32>, format: &OutputFormat) -> RenderTarget;

    /// ### English
    /// Returns the completeness status of `target`'s framebuffer (`GL_FRAMEBUFFER_COMPLETE` when
    /// usable).
    ///
    /// ### 中文
    /// 返回 `target` framebuffer 的完整性状态（可用时为 `GL_FRAMEBUFFER_COMPLETE`）。
    fn target_status(&self, target: &RenderTarget) -> u32;

    fn clear_target(&self, target: &RenderTarget);

    fn delete_target(&self, target: &RenderTarget);

    /// ### English
    /// Binds `target`'s framebuffer as the draw target, or the default framebuffer for `None`.
    ///
    /// ### 中文
    /// 将 `target` 的 framebuffer 绑定为绘制目标；`None` 时绑定默认 framebuffer。
    fn bind_draw_target(&self, target: Option<&RenderTarget>);

    /// ### English
    /// Inserts a GPU fence after all commands issued so far and flushes.
    /// Returns the fence handle as `u64`, or 0 if unavailable.
    ///
    /// ### 中文
    /// 在已提交命令之后插入 GPU fence 并 flush。以 `u64` 返回 fence 句柄，不可用则为 0。
    fn insert_fence(&self) -> u64;

    fn delete_fence(&self, fence: u64);

    /// ### English
    /// Makes the decoder context's GPU queue wait for `fence` (server-side, non-blocking for the
    /// caller).
    ///
    /// ### 中文
    /// 让解码器上下文的 GPU 队列等待 `fence`（服务端等待，调用方不阻塞）。
    fn wait_fence(&self, fence: u64);

    /// ### English
    /// Drains and logs pending GL errors. Returns how many were found.
    ///
    /// ### 中文
    /// 取出并记录所有挂起的 GL 错误，返回错误数量。
    fn drain_errors(&self) -> usize {
        0
    }
}
