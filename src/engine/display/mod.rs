//! ### English
//! Main-thread consumer of completed frames.
//!
//! ### 中文
//! 主线程上已完成帧的消费者。

mod quad;

use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::Receiver;
use dpi::PhysicalSize;

use crate::engine::capture::SessionEvent;
use crate::engine::frame::{AcquiredFrame, FrameSlotRotator};

pub use quad::GlowQuadPresenter;

/// ### English
/// Display state: `Idle` until the first successful surface configuration, `Active` while
/// surfaces are installed.
///
/// ### 中文
/// 显示状态：首次成功配置 surface 之前为 `Idle`，surface 已安装期间为 `Active`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayState {
    #[default]
    Idle,
    Active,
}

/// ### English
/// Draw operations of the display context.
///
/// Called on the display thread with the display context current.
///
/// ### 中文
/// 显示上下文的绘制操作。
///
/// 在显示线程、显示上下文 current 时调用。
pub trait FramePresenter {
    /// ### English
    /// Samples `frame.surface`'s texture into the current draw target.
    ///
    /// A non-zero `frame.producer_fence` is owned by the presenter: wait on it before sampling,
    /// then delete it.
    ///
    /// Returns a consumer fence inserted (and flushed) after the draw, or 0. It is handed back to
    /// the decoder, which waits on it before writing the surface again.
    ///
    /// ### 中文
    /// 把 `frame.surface` 的纹理采样绘制到当前绘制目标。
    ///
    /// 非 0 的 `frame.producer_fence` 归 presenter 所有：采样前等待，之后删除。
    ///
    /// 返回绘制之后插入（并已 flush）的 consumer fence，无则为 0。它会交还给解码侧，
    /// 解码侧在再次写入该 surface 之前等待它。
    fn draw_frame(&mut self, frame: &AcquiredFrame) -> u64;

    /// ### English
    /// Draws the "no frame yet" placeholder.
    ///
    /// ### 中文
    /// 绘制“尚无帧”的占位画面。
    fn draw_placeholder(&mut self);

    /// ### English
    /// Deletes a consumer fence the rotator did not keep.
    ///
    /// ### 中文
    /// 删除轮换器未保留的 consumer fence。
    fn delete_fence(&mut self, fence: u64);
}

/// ### English
/// Per-refresh driver on the display thread.
///
/// `tick` must be called on the thread that created the loop, once per output refresh, with the
/// display context current. Buffer swapping stays with the caller. While the loop exists the
/// decoder keeps withdrawn surfaces alive until a later `tick` shows they are no longer drawn.
///
/// ### 中文
/// 显示线程上的逐次刷新驱动。
///
/// `tick` 必须在创建该循环的线程上、每次输出刷新调用一次，且显示上下文处于 current。
/// 交换缓冲由调用方负责。该循环存在期间，解码侧会保持被撤回的 surface 存活，直到后续 `tick` 表明它们不再被绘制。
pub struct DisplayLoop<P: FramePresenter> {
    rotator: Arc<FrameSlotRotator>,
    events: Receiver<SessionEvent>,
    presenter: P,
    state: DisplayState,
    frame_size: Option<PhysicalSize<u32>>,
    owner: ThreadId,
}

impl<P: FramePresenter> DisplayLoop<P> {
    pub fn new(
        rotator: Arc<FrameSlotRotator>,
        events: Receiver<SessionEvent>,
        presenter: P,
    ) -> Self {
        rotator.attach_display();
        Self {
            rotator,
            events,
            presenter,
            state: DisplayState::Idle,
            frame_size: None,
            owner: thread::current().id(),
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// ### English
    /// Size of the installed surfaces as last announced by the decoder side.
    ///
    /// ### 中文
    /// 解码侧最近一次通知的已安装 surface 尺寸。
    pub fn frame_size(&self) -> Option<PhysicalSize<u32>> {
        self.frame_size
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// ### English
    /// One refresh: applies pending session events, acquires the latest frame and draws it, or
    /// draws the placeholder when there is nothing to show.
    ///
    /// Returns the frame that was drawn.
    ///
    /// ### 中文
    /// 一次刷新：应用挂起的会话事件，获取最新帧并绘制；无可显示内容时绘制占位画面。
    ///
    /// 返回本次绘制的帧。
    pub fn tick(&mut self) -> Option<AcquiredFrame> {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "DisplayLoop::tick called off its owner thread"
        );

        self.apply_events();

        let frame = match self.state {
            DisplayState::Idle => None,
            DisplayState::Active => self
                .rotator
                .acquire_latest()
                .filter(|frame| !frame.is_empty()),
        };

        match frame {
            Some(frame) => {
                let consumer_fence = self.presenter.draw_frame(&frame);
                let stale = self.rotator.release(&frame, consumer_fence);
                if stale != 0 {
                    self.presenter.delete_fence(stale);
                }
            }
            None => {
                self.rotator.release_idle();
                self.presenter.draw_placeholder();
            }
        }
        frame
    }

    fn apply_events(&mut self) {
        for event in self.events.try_iter() {
            let next = match event {
                SessionEvent::Configured(size) => {
                    self.frame_size = Some(size);
                    DisplayState::Active
                }
                SessionEvent::TornDown => {
                    self.frame_size = None;
                    DisplayState::Idle
                }
            };
            if next != self.state {
                tracing::debug!(from = ?self.state, to = ?next, "display state changed");
                self.state = next;
            }
        }
    }
}

impl<P: FramePresenter> Drop for DisplayLoop<P> {
    fn drop(&mut self) {
        self.rotator.detach_display();
    }
}
