//! ### English
//! Decoder-side frame capture: the capability the decoder runtime drives through its output
//! callbacks.
//!
//! ### 中文
//! 解码侧帧捕获：解码器运行时通过输出回调驱动的能力接口。

use std::ffi::{CStr, c_void};
use std::sync::Arc;

use crossbeam_channel::Sender;
use dpi::PhysicalSize;

use crate::engine::config::CaptureConfig;
use crate::engine::context::{DecoderContextBridge, GpuContext};
use crate::engine::error::{CaptureError, Result};
use crate::engine::format::OutputFormat;
use crate::engine::frame::{FrameSlotRotator, TRIPLE_BUFFER_COUNT, Withdrawn};
use crate::engine::surface::{Surface, SurfaceDevice, SurfaceSet};

/// ### English
/// Session notifications sent from the decoder thread to the display loop.
///
/// ### 中文
/// 从解码线程发往显示循环的会话通知。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// ### English
    /// A fresh surface batch of this size was installed.
    ///
    /// ### 中文
    /// 已安装该尺寸的新 surface 批次。
    Configured(PhysicalSize<u32>),
    /// ### English
    /// Surfaces were withdrawn (teardown, zero size or failed allocation).
    ///
    /// ### 中文
    /// surface 已撤回（teardown、零尺寸或分配失败）。
    TornDown,
}

/// ### English
/// Frame-sink capability held by the decoder runtime.
///
/// All methods run on the decoder's callback thread. Except for `on_setup`, `on_context_needed`
/// and `on_teardown`, the decoder context is current while they run.
///
/// ### 中文
/// 解码器运行时持有的帧接收能力接口。
///
/// 所有方法都在解码回调线程执行。除 `on_setup`、`on_context_needed`、`on_teardown` 外，
/// 调用期间解码器上下文处于 current。
pub trait FrameSink {
    /// ### English
    /// A decode session starts. No GPU work.
    ///
    /// ### 中文
    /// 解码会话开始。不做 GPU 操作。
    fn on_setup(&mut self);

    /// ### English
    /// The decoder negotiated its output size. Allocates surfaces and answers with the pixel
    /// format the decoder must render in; an error rejects the size and ends the session.
    ///
    /// ### 中文
    /// 解码器协商了输出尺寸。分配 surface，并返回解码器必须使用的像素格式；返回错误即拒绝该尺寸并结束会话。
    fn on_size_negotiated(&mut self, width: u32, height: u32) -> Result<OutputFormat>;

    /// ### English
    /// The decoder finished writing a frame into the current render target.
    ///
    /// ### 中文
    /// 解码器已把一帧写完到当前渲染目标。
    fn on_frame_complete(&mut self);

    fn on_context_needed(&mut self, enter: bool) -> Result<()>;

    fn on_resolve_symbol(&self, name: &CStr) -> *const c_void;

    fn on_teardown(&mut self);
}

/// ### English
/// Builds the GPU device once the decoder context is current for the first time.
///
/// ### 中文
/// 在解码器上下文首次 current 时构建 GPU 设备。
pub type DeviceLoader<C, D> = Box<dyn FnOnce(&C) -> D>;

/// ### English
/// A withdrawn surface batch the display may still be drawing.
///
/// ### 中文
/// 已撤回、但显示侧可能仍在绘制的 surface 批次。
struct RetiredBatch {
    surfaces: [Surface; TRIPLE_BUFFER_COUNT],
    generation: u64,
}

/// ### English
/// Decoder-side `FrameSink`: owns the surfaces (through `SurfaceSet`) and the decoder context,
/// and publishes completed frames through the shared `FrameSlotRotator`.
///
/// Replaced batches are retired, not deleted: their GL objects live until the rotator reports the
/// display released them, and are deleted on the next decoder callback with the context current.
///
/// ### 中文
/// 解码侧 `FrameSink`：持有 surface（经由 `SurfaceSet`）与解码器上下文，
/// 并通过共享的 `FrameSlotRotator` 发布已完成的帧。
///
/// 被替换的批次先退役而不是立即删除：其 GL 对象在轮换器报告显示侧已释放之前保持存活，
/// 之后在下一次上下文 current 的解码回调中删除。
pub struct FrameCapture<C: GpuContext, D: SurfaceDevice> {
    bridge: DecoderContextBridge<C>,
    loader: Option<DeviceLoader<C, D>>,
    surfaces: Option<SurfaceSet<D>>,
    retired: Vec<RetiredBatch>,
    rotator: Arc<FrameSlotRotator>,
    events: Sender<SessionEvent>,
    config: CaptureConfig,
    /// ### English
    /// Last negotiated size; `None` right after `on_setup`.
    ///
    /// ### 中文
    /// 上一次协商的尺寸；`on_setup` 之后为 `None`。
    frame_size: Option<PhysicalSize<u32>>,
}

impl<C: GpuContext, D: SurfaceDevice> FrameCapture<C, D> {
    /// ### English
    /// Creates a capture whose GPU device is built lazily by `loader` on the decoder thread.
    ///
    /// ### 中文
    /// 创建捕获器，其 GPU 设备由 `loader` 在解码线程上延迟构建。
    pub fn new(
        context: C,
        loader: DeviceLoader<C, D>,
        rotator: Arc<FrameSlotRotator>,
        events: Sender<SessionEvent>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            bridge: DecoderContextBridge::new(context),
            loader: Some(loader),
            surfaces: None,
            retired: Vec::new(),
            rotator,
            events,
            config,
            frame_size: None,
        }
    }

    /// ### English
    /// Creates a capture around an already loaded device.
    ///
    /// ### 中文
    /// 基于已加载的设备创建捕获器。
    pub fn with_device(
        context: C,
        device: D,
        rotator: Arc<FrameSlotRotator>,
        events: Sender<SessionEvent>,
        config: CaptureConfig,
    ) -> Self {
        let surfaces = SurfaceSet::new(device, &config);
        Self {
            bridge: DecoderContextBridge::new(context),
            loader: None,
            surfaces: Some(surfaces),
            retired: Vec::new(),
            rotator,
            events,
            config,
            frame_size: None,
        }
    }

    pub fn rotator(&self) -> &Arc<FrameSlotRotator> {
        &self.rotator
    }

    pub fn context(&self) -> &C {
        self.bridge.context()
    }

    pub fn frame_size(&self) -> Option<PhysicalSize<u32>> {
        self.frame_size
    }

    pub fn is_allocated(&self) -> bool {
        self.surfaces.as_ref().is_some_and(SurfaceSet::is_allocated)
    }

    /// ### English
    /// Number of withdrawn batches still waiting for the display.
    ///
    /// ### 中文
    /// 仍在等待显示侧释放的已撤回批次数量。
    pub fn retired_batches(&self) -> usize {
        self.retired.len()
    }

    fn holds_gpu_objects(&self) -> bool {
        self.is_allocated() || !self.retired.is_empty()
    }

    /// ### English
    /// Final release once no decode session will run again: tears the session down and deletes
    /// every retired batch whether or not the display acknowledged it. The display must already be
    /// gone. Enters the decoder context on the calling thread if needed and leaves it afterwards.
    ///
    /// ### 中文
    /// 不会再有解码会话时的最终释放：结束会话，并删除所有退役批次（无论显示侧是否确认）。
    /// 调用前显示侧必须已销毁。如有需要会在调用线程进入解码器上下文，结束后离开。
    pub fn shutdown(&mut self) {
        if self.rotator.is_display_attached() {
            tracing::warn!("shutting down while the display is still attached");
        }
        self.end_session(true);
    }

    fn load_device(&mut self) {
        if self.surfaces.is_some() {
            return;
        }
        if let Some(loader) = self.loader.take() {
            let device = loader(self.bridge.context());
            self.surfaces = Some(SurfaceSet::new(device, &self.config));
            tracing::debug!("decoder GL device loaded");
        }
    }

    /// ### English
    /// Withdraws the published batch from the rotator and retires it. The decoder context must be
    /// current.
    ///
    /// ### 中文
    /// 从轮换器撤回已发布的批次并使其退役。解码器上下文必须 current。
    fn withdraw(&mut self) {
        let withdrawn = self.rotator.clear();
        let Some(surfaces) = self.surfaces.as_mut() else {
            return;
        };
        release_fences(surfaces.device(), &withdrawn);
        if let Some(batch) = surfaces.retire() {
            self.retired.push(RetiredBatch {
                surfaces: batch,
                generation: withdrawn.generation,
            });
        }
    }

    /// ### English
    /// Deletes retired batches the display released (all of them with `force`). The decoder
    /// context must be current.
    ///
    /// ### 中文
    /// 删除显示侧已释放的退役批次（`force` 时全部删除）。解码器上下文必须 current。
    fn reap_retired(&mut self, force: bool) {
        let Some(surfaces) = self.surfaces.as_ref() else {
            return;
        };
        let rotator = &self.rotator;
        self.retired.retain(|batch| {
            if !force && !rotator.is_released(batch.generation) {
                return true;
            }
            surfaces.delete_batch(&batch.surfaces);
            false
        });
    }

    fn end_session(&mut self, force: bool) {
        let entered = self.holds_gpu_objects() && !self.bridge.is_current();
        if entered && let Err(err) = self.bridge.on_context_activate(true) {
            tracing::warn!(%err, "cannot enter decoder context for teardown; GPU objects leak");
            self.rotator.clear();
            self.retired.clear();
            self.frame_size = None;
            send_event(&self.events, SessionEvent::TornDown);
            return;
        }

        self.withdraw();
        self.reap_retired(force);
        if !self.retired.is_empty() {
            tracing::debug!(
                batches = self.retired.len(),
                "retired surfaces wait for the display"
            );
        }

        if entered && let Err(err) = self.bridge.on_context_activate(false) {
            tracing::warn!(%err, "decoder context not released after teardown");
        }

        self.frame_size = None;
        send_event(&self.events, SessionEvent::TornDown);
        tracing::debug!("decode session torn down");
    }
}

fn send_event(events: &Sender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        tracing::trace!(?event, "display loop is gone; session event dropped");
    }
}

fn release_fences<D: SurfaceDevice>(device: &D, withdrawn: &Withdrawn) {
    for &fence in &withdrawn.consumer_fences {
        if fence != 0 {
            device.wait_fence(fence);
            device.delete_fence(fence);
        }
    }
    for &fence in &withdrawn.producer_fences {
        if fence != 0 {
            device.delete_fence(fence);
        }
    }
}

impl<C: GpuContext, D: SurfaceDevice> FrameSink for FrameCapture<C, D> {
    fn on_setup(&mut self) {
        self.frame_size = None;
        tracing::debug!("decode session setup");
    }

    fn on_size_negotiated(&mut self, width: u32, height: u32) -> Result<OutputFormat> {
        let size = PhysicalSize::new(width, height);
        if self.frame_size != Some(size) {
            tracing::info!(width, height, "decoder frame size changed");
        }
        self.frame_size = Some(size);

        self.withdraw();
        self.reap_retired(false);

        let Some(surfaces) = self.surfaces.as_mut() else {
            tracing::error!("size negotiated before the decoder context was ever made current");
            send_event(&self.events, SessionEvent::TornDown);
            return Err(CaptureError::ContextSwitchFailed { enter: true });
        };
        let batch = match surfaces.configure(size) {
            Ok(batch) => batch,
            Err(err) => {
                send_event(&self.events, SessionEvent::TornDown);
                return Err(err);
            }
        };

        let leftover = self.rotator.install(batch);
        release_fences(surfaces.device(), &leftover);
        let render = surfaces.surface_at(self.rotator.roles().render)?;
        surfaces.device().bind_draw_target(Some(&render.target));

        send_event(&self.events, SessionEvent::Configured(size));
        Ok(self.config.format)
    }

    fn on_frame_complete(&mut self) {
        self.reap_retired(false);
        let Some(surfaces) = self.surfaces.as_ref().filter(|set| set.is_allocated()) else {
            tracing::warn!("frame completed without allocated surfaces; ignored");
            return;
        };
        let device = surfaces.device();

        let fence = if self.config.producer_fence {
            device.insert_fence()
        } else {
            0
        };
        let recycled = self.rotator.on_frame_ready(fence, |render| {
            device.bind_draw_target(Some(&render.target));
        });
        if recycled.dropped_fence != 0 {
            device.delete_fence(recycled.dropped_fence);
        }
        if recycled.consumer_fence != 0 {
            device.wait_fence(recycled.consumer_fence);
            device.delete_fence(recycled.consumer_fence);
        }
    }

    fn on_context_needed(&mut self, enter: bool) -> Result<()> {
        self.bridge.on_context_activate(enter)?;
        if enter {
            self.load_device();
            self.reap_retired(false);
        }
        Ok(())
    }

    fn on_resolve_symbol(&self, name: &CStr) -> *const c_void {
        self.bridge.resolve_proc_address(name)
    }

    fn on_teardown(&mut self) {
        self.end_session(false);
    }
}

impl<C: GpuContext, D: SurfaceDevice> Drop for FrameCapture<C, D> {
    fn drop(&mut self) {
        if self.holds_gpu_objects() {
            // GL objects can only be deleted with the decoder context current on its thread.
            tracing::warn!("frame capture dropped with live surfaces; GPU objects leak");
            self.rotator.clear();
        }
    }
}
