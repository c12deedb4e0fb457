//! ### English
//! The two rotations: decoder-side frame completion and display-side acquisition.
//!
//! ### 中文
//! 两种轮换：解码侧帧完成与显示侧获取。

use crate::engine::surface::Surface;

use super::{AcquiredFrame, FrameSlotRotator, Recycled};

impl FrameSlotRotator {
    /// ### English
    /// Decoder side: called after a complete frame was written into the `render` surface.
    ///
    /// Under the lock: swaps `render` and `swap`, stores `producer_fence` and a new sequence
    /// number with the completed slot, sets the pending flag, and calls `bind` with the new
    /// `render` surface so subsequent decoding targets it.
    ///
    /// Returns the fence of a completed frame that was never presented and the consumer fence the
    /// display left on the new `render` surface (0 when absent).
    ///
    /// ### 中文
    /// 解码侧：一帧完整写入 `render` surface 后调用。
    ///
    /// 持锁期间：交换 `render` 与 `swap`，把 `producer_fence` 和新帧序号记录到完成的槽位，
    /// 设置 pending 标记，并以新的 `render` surface 调用 `bind`，使后续解码写入它。
    ///
    /// 返回从未被呈现的已完成帧的 fence，以及显示侧留在新 `render` surface 上的 consumer fence（无则为 0）。
    pub fn on_frame_ready(&self, producer_fence: u64, bind: impl FnOnce(&Surface)) -> Recycled {
        let mut state = self.state.lock();

        state.roles.rotate_completed();
        debug_assert!(state.roles.is_permutation());

        let mut sequence = state.next_sequence.wrapping_add(1);
        if sequence == 0 {
            sequence = 1;
        }
        state.next_sequence = sequence;

        let completed = state.roles.swap;
        let render = state.roles.render;
        state.sequences[completed] = sequence;
        state.fences[completed] = producer_fence;
        let recycled = Recycled {
            dropped_fence: std::mem::take(&mut state.fences[render]),
            consumer_fence: std::mem::take(&mut state.consumer_fences[render]),
        };
        state.pending = true;

        if let Some(surfaces) = state.surfaces.as_ref() {
            bind(&surfaces[render]);
        }

        recycled
    }

    /// ### English
    /// Display side: called once per refresh.
    ///
    /// Under the lock: if a frame is pending, swaps `present` and `swap` and clears the flag.
    /// Returns the `present` surface either way (repeat-last-frame when nothing new arrived), or
    /// `None` while no surfaces are installed. Either way the display is recorded as holding nothing
    /// from older batches.
    ///
    /// ### 中文
    /// 显示侧：每次刷新调用一次。
    ///
    /// 持锁期间：若有 pending 帧，则交换 `present` 与 `swap` 并清除标记。
    /// 无论是否有新帧都返回 `present` surface（无新帧时重复上一帧）；未安装 surface 时返回 `None`。
    /// 两种情况下都会记录显示侧不再持有旧批次的任何 surface。
    pub fn acquire_latest(&self) -> Option<AcquiredFrame> {
        let mut state = self.state.lock();
        state.display_generation = state.generation;
        let surfaces = state.surfaces?;

        let is_new = std::mem::take(&mut state.pending);
        if is_new {
            state.roles.rotate_presented();
            debug_assert!(state.roles.is_permutation());
        }

        let present = state.roles.present;
        let producer_fence = if is_new {
            std::mem::take(&mut state.fences[present])
        } else {
            0
        };

        Some(AcquiredFrame {
            surface: surfaces[present],
            sequence: state.sequences[present],
            producer_fence,
            is_new,
            generation: state.generation,
        })
    }

    /// ### English
    /// Display side: records `consumer_fence` (inserted after sampling `frame`) against its slot.
    /// The decoder waits on it before the slot becomes its render target again.
    ///
    /// Returns a fence the display must delete itself: the one this call superseded, or
    /// `consumer_fence` when `frame`'s batch was withdrawn in the meantime.
    ///
    /// ### 中文
    /// 显示侧：把 `consumer_fence`（在采样 `frame` 之后插入）记录到其槽位。
    /// 该槽位再次成为解码器渲染目标之前，解码侧会先等待它。
    ///
    /// 返回需由显示侧自行删除的 fence：本次被替换的旧 fence；若 `frame` 的批次已被撤回，则为 `consumer_fence` 本身。
    pub fn release(&self, frame: &AcquiredFrame, consumer_fence: u64) -> u64 {
        let mut state = self.state.lock();
        if frame.generation != state.generation || state.surfaces.is_none() {
            return consumer_fence;
        }
        std::mem::replace(
            &mut state.consumer_fences[frame.surface.index],
            consumer_fence,
        )
    }

    /// ### English
    /// Display side: a refresh that acquired nothing. Records that the display holds no surface.
    ///
    /// ### 中文
    /// 显示侧：本次刷新未获取任何 surface。记录显示侧不持有任何 surface。
    pub fn release_idle(&self) {
        let mut state = self.state.lock();
        state.display_generation = state.generation;
    }
}
