use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dpi::PhysicalSize;

use super::*;
use crate::engine::surface::RenderTarget;

fn batch(base: u32, size: PhysicalSize<u32>) -> [Surface; TRIPLE_BUFFER_COUNT] {
    std::array::from_fn(|index| Surface {
        index,
        target: RenderTarget {
            texture: base + index as u32 * 2,
            framebuffer: base + index as u32 * 2 + 1,
        },
        size,
    })
}

fn installed() -> FrameSlotRotator {
    let rotator = FrameSlotRotator::new();
    rotator.install(batch(10, PhysicalSize::new(320, 240)));
    rotator
}

#[test]
fn initial_roles_are_render_swap_present() {
    let rotator = FrameSlotRotator::new();
    assert_eq!(
        rotator.roles(),
        RoleAssignment {
            render: 0,
            swap: 1,
            present: 2
        }
    );
    assert!(!rotator.has_pending_frame());
}

#[test]
fn acquire_without_surfaces_is_none() {
    let rotator = FrameSlotRotator::new();
    rotator.on_frame_ready(0, |_| {});
    assert_eq!(rotator.acquire_latest(), None);
    assert_eq!(rotator.begin_render_target(), None);
}

#[test]
fn initial_read_after_install_is_explicitly_empty() {
    let rotator = installed();

    let frame = rotator.acquire_latest().unwrap();

    assert!(frame.is_empty());
    assert!(!frame.is_new);
    assert_eq!(frame.surface.index, 2);
    assert_eq!(frame.producer_fence, 0);
}

#[test]
fn repeated_acquire_returns_same_surface() {
    let rotator = installed();
    rotator.on_frame_ready(0, |_| {});

    let first = rotator.acquire_latest().unwrap();
    let second = rotator.acquire_latest().unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.surface, second.surface);
    assert_eq!(first.sequence, second.sequence);
}

#[test]
fn new_frame_is_observed_exactly_once() {
    let rotator = installed();
    let before = rotator.acquire_latest().unwrap();

    rotator.on_frame_ready(0, |_| {});
    let after = rotator.acquire_latest().unwrap();

    assert_ne!(before.surface, after.surface);
    assert_eq!(after.sequence, 1);
    assert!(!rotator.acquire_latest().unwrap().is_new);
}

#[test]
fn frame_ready_binds_the_next_render_surface() {
    let rotator = installed();
    let first_target = rotator.begin_render_target().unwrap();

    let mut bound = None;
    rotator.on_frame_ready(0, |surface| bound = Some(*surface));

    let bound = bound.unwrap();
    assert_ne!(bound, first_target);
    assert_eq!(rotator.begin_render_target(), Some(bound));
    assert_eq!(rotator.roles().swap, first_target.index);
}

#[test]
fn rapid_frames_coalesce_into_the_newest() {
    let rotator = installed();
    let before = rotator.roles();

    for _ in 0..7 {
        rotator.on_frame_ready(0, |_| {});
    }
    let frame = rotator.acquire_latest().unwrap();

    assert_eq!(frame.sequence, 7);
    assert!(frame.is_new);
    assert_ne!(frame.surface.index, before.present);
    let again = rotator.acquire_latest().unwrap();
    assert_eq!(again.surface, frame.surface);
    assert!(!again.is_new);
}

#[test]
fn display_never_sees_an_intermediate_frame() {
    let rotator = installed();
    let mut last_seen = 0;

    for burst in 1..50u64 {
        for _ in 0..(burst % 4) {
            rotator.on_frame_ready(0, |_| {});
        }
        let frame = rotator.acquire_latest().unwrap();
        assert!(frame.sequence >= last_seen);
        if frame.is_new {
            assert!(frame.sequence > last_seen);
        }
        last_seen = frame.sequence;
        assert!(rotator.roles().is_permutation());
    }
}

#[test]
fn fences_follow_their_frames() {
    let rotator = installed();

    assert_eq!(rotator.on_frame_ready(101, |_| {}).dropped_fence, 0);
    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(frame.producer_fence, 101);

    // Repeats carry no fence.
    assert_eq!(rotator.acquire_latest().unwrap().producer_fence, 0);
}

#[test]
fn fences_of_dropped_frames_are_returned_to_the_decoder() {
    let rotator = installed();

    assert_eq!(rotator.on_frame_ready(201, |_| {}).dropped_fence, 0);
    // Frame 201 is overtaken before the display polled: its slot becomes the render target.
    assert_eq!(rotator.on_frame_ready(202, |_| {}).dropped_fence, 201);

    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(frame.producer_fence, 202);
    assert_eq!(frame.sequence, 2);
}

#[test]
fn install_and_clear_hand_back_outstanding_fences() {
    let rotator = installed();
    rotator.on_frame_ready(301, |_| {});

    let withdrawn = rotator.install(batch(40, PhysicalSize::new(64, 64)));
    let fences = withdrawn.producer_fences;
    assert_eq!(fences.iter().filter(|&&fence| fence != 0).count(), 1);
    assert!(fences.contains(&301));
    assert_eq!(rotator.roles(), RoleAssignment::default());
    assert!(!rotator.has_pending_frame());

    rotator.on_frame_ready(302, |_| {});
    let withdrawn = rotator.clear();
    assert!(withdrawn.producer_fences.contains(&302));
    assert!(!rotator.is_installed());
}

#[test]
fn reinstall_never_returns_stale_sized_surfaces() {
    let rotator = installed();
    rotator.on_frame_ready(0, |_| {});
    rotator.acquire_latest().unwrap();

    let size = PhysicalSize::new(1280, 720);
    rotator.install(batch(100, size));

    assert_eq!(rotator.begin_render_target().unwrap().size, size);
    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(frame.surface.size, size);
    assert!(frame.is_empty());

    rotator.on_frame_ready(0, |surface| assert_eq!(surface.size, size));
    assert_eq!(rotator.acquire_latest().unwrap().surface.size, size);
}

#[test]
fn consumer_fence_guards_the_next_render_target() {
    let rotator = installed();
    rotator.on_frame_ready(0, |_| {});
    let shown = rotator.acquire_latest().unwrap();
    assert_eq!(rotator.release(&shown, 501), 0);

    // The next presented frame pushes `shown` back into `swap`.
    rotator.on_frame_ready(0, |_| {});
    let next = rotator.acquire_latest().unwrap();
    assert_eq!(rotator.roles().swap, shown.surface.index);

    let mut bound = None;
    let recycled = rotator.on_frame_ready(0, |surface| bound = Some(*surface));
    assert_eq!(bound, Some(shown.surface));
    assert_eq!(recycled.consumer_fence, 501);
    assert_eq!(recycled.dropped_fence, 0);
    assert_ne!(next.surface, shown.surface);
}

#[test]
fn repeated_releases_keep_only_the_newest_consumer_fence() {
    let rotator = installed();
    rotator.on_frame_ready(0, |_| {});

    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(rotator.release(&frame, 601), 0);
    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(rotator.release(&frame, 602), 601);

    let withdrawn = rotator.clear();
    assert_eq!(
        withdrawn.consumer_fences.iter().filter(|&&fence| fence != 0).count(),
        1
    );
    assert!(withdrawn.consumer_fences.contains(&602));
}

#[test]
fn release_after_withdrawal_returns_the_fence() {
    let rotator = installed();
    rotator.on_frame_ready(0, |_| {});
    let frame = rotator.acquire_latest().unwrap();

    rotator.install(batch(70, PhysicalSize::new(64, 64)));

    assert_eq!(rotator.release(&frame, 701), 701);
    assert_eq!(rotator.clear().consumer_fences, [0; TRIPLE_BUFFER_COUNT]);
}

#[test]
fn withdrawn_batch_waits_for_the_display() {
    let rotator = installed();
    rotator.attach_display();
    rotator.on_frame_ready(0, |_| {});
    let held = rotator.acquire_latest().unwrap();

    let withdrawn = rotator.install(batch(90, PhysicalSize::new(64, 64)));
    assert_eq!(withdrawn.generation, held.generation);
    assert!(!rotator.is_released(withdrawn.generation));

    let next = rotator.acquire_latest().unwrap();
    assert!(next.generation > held.generation);
    assert_eq!(rotator.generation(), next.generation);
    assert!(rotator.is_released(withdrawn.generation));
}

#[test]
fn idle_display_and_detached_display_release_batches() {
    let rotator = installed();
    rotator.attach_display();
    rotator.acquire_latest().unwrap();

    let first = rotator.clear();
    assert!(!rotator.is_released(first.generation));
    rotator.release_idle();
    assert!(rotator.is_released(first.generation));

    rotator.install(batch(20, PhysicalSize::new(8, 8)));
    rotator.acquire_latest().unwrap();
    let second = rotator.clear();
    assert!(!rotator.is_released(second.generation));
    rotator.detach_display();
    assert!(rotator.is_released(second.generation));
}

#[test]
fn without_a_display_batches_are_released_at_once() {
    let rotator = installed();
    let withdrawn = rotator.clear();
    assert!(rotator.is_released(withdrawn.generation));
}

#[test]
fn roles_stay_a_permutation_for_any_sequence() {
    let rotator = installed();
    // Deterministic pseudo-random interleaving.
    let mut seed = 0x2545_F491_4F6C_DD1Du64;
    for _ in 0..10_000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        if seed & 1 == 0 {
            rotator.on_frame_ready(0, |_| {});
        } else {
            rotator.acquire_latest();
        }
        assert!(rotator.roles().is_permutation());
    }
}

#[test]
fn concurrent_producer_and_consumer_keep_the_invariant() {
    const ITERATIONS: usize = 100_000;

    let rotator = Arc::new(installed());
    let producer_done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..ITERATIONS {
                rotator.on_frame_ready(0, |surface| {
                    assert!(surface.index < TRIPLE_BUFFER_COUNT);
                });
                assert!(rotator.roles().is_permutation());
            }
            producer_done.store(true, Ordering::Release);
        });

        scope.spawn(|| {
            let mut last_sequence = 0;
            for _ in 0..ITERATIONS {
                let frame = rotator.acquire_latest().unwrap();
                assert!(frame.sequence >= last_sequence);
                last_sequence = frame.sequence;
                let roles = rotator.roles();
                assert!(roles.is_permutation());
            }
        });
    });

    assert!(producer_done.load(Ordering::Acquire));
    let frame = rotator.acquire_latest().unwrap();
    assert_eq!(frame.sequence, ITERATIONS as u64);
}
