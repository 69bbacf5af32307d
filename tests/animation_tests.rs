//! Animation Sampling Tests
//!
//! Tests for:
//! - AnimationKeyArray clamped and looping sampling
//! - Hinted key search (fast path vs. binary search fallback)
//! - AnimationTransformTrack channel defaults
//! - Animation duration derivation
//! - AnimationBinding clock and track mapping

use std::sync::Arc;

use glam::{Quat, Vec3};

use myth_skeletal::animation::binding::AnimationBinding;
use myth_skeletal::animation::clip::{Animation, AnimationTransformTrack};
use myth_skeletal::animation::keys::{AnimationKeyArray, KeyCursor};
use myth_skeletal::errors::{AnimationError, ErrorKind};
use myth_skeletal::scene::frame::FrameTree;
use myth_skeletal::scene::pose::{BoneTransform, LocalPose};
use myth_skeletal::scene::skeleton::Skeleton;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_array<const D: usize>(a: [f32; D], b: [f32; D]) -> bool {
    a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn two_key_position() -> AnimationKeyArray<3> {
    AnimationKeyArray::from_keys([(0.0, [0.0, 0.0, 0.0]), (1.0, [10.0, 0.0, 0.0])]).unwrap()
}

fn uneven_keys() -> AnimationKeyArray<1> {
    AnimationKeyArray::from_keys([
        (0.0, [0.0]),
        (0.5, [4.0]),
        (0.75, [2.0]),
        (1.5, [-6.0]),
        (2.0, [1.0]),
    ])
    .unwrap()
}

// ============================================================================
// AnimationKeyArray: Clamped Sampling
// ============================================================================

#[test]
fn two_key_midpoint_and_clamp() {
    let keys = two_key_position();
    assert_eq!(keys.sample(0.5, None, true).unwrap(), [5.0, 0.0, 0.0]);
    assert_eq!(keys.sample(1.5, None, true).unwrap(), [10.0, 0.0, 0.0]);
}

#[test]
fn sample_reproduces_keys_exactly() {
    let keys = uneven_keys();
    let mut cursor = KeyCursor::default();
    for i in 0..keys.len() {
        let t = keys.key_time(i).unwrap();
        assert_eq!(
            keys.sample(t, Some(&mut cursor), true).unwrap(),
            keys.key_value(i).unwrap(),
            "key {i} at t={t}"
        );
    }
}

#[test]
fn sample_between_keys_is_convex() {
    let keys = uneven_keys();
    for i in 0..keys.len() - 1 {
        let t0 = keys.key_time(i).unwrap();
        let t1 = keys.key_time(i + 1).unwrap();
        let [v0] = keys.key_value(i).unwrap();
        let [v1] = keys.key_value(i + 1).unwrap();

        for step in 1..10 {
            let t = t0 + (t1 - t0) * step as f32 / 10.0;
            let [v] = keys.sample(t, None, true).unwrap();
            assert!(
                v >= v0.min(v1) - EPSILON && v <= v0.max(v1) + EPSILON,
                "t={t}: {v} not between {v0} and {v1}"
            );
        }
    }
}

#[test]
fn clamp_before_first_and_after_last() {
    let keys = AnimationKeyArray::<2>::from_keys([(1.0, [1.0, 2.0]), (2.0, [3.0, 4.0])]).unwrap();
    assert_eq!(keys.sample(0.0, None, true).unwrap(), [1.0, 2.0]);
    assert_eq!(keys.sample(0.999, None, false).unwrap(), [1.0, 2.0]);
    assert_eq!(keys.sample(2.0, None, true).unwrap(), [3.0, 4.0]);
    assert_eq!(keys.sample(100.0, None, true).unwrap(), [3.0, 4.0]);
}

#[test]
fn unsorted_input_is_sorted_before_search() {
    let mut keys = AnimationKeyArray::<1>::new();
    keys.push_key(1.0, [10.0]).unwrap();
    keys.push_key(0.0, [0.0]).unwrap();
    keys.sort_keys().unwrap();
    assert!(approx(keys.sample(0.25, None, true).unwrap()[0], 2.5));
}

#[test]
fn empty_array_and_negative_time_are_rejected() {
    let empty = AnimationKeyArray::<3>::new();
    let err = empty.sample(0.0, None, true).unwrap_err();
    assert_eq!(err, AnimationError::EmptyKeyArray);
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);

    let keys = two_key_position();
    assert!(matches!(
        keys.sample(-0.1, None, true),
        Err(AnimationError::NegativeKeyTime { .. })
    ));
}

#[test]
fn stale_cursor_is_rejected() {
    let keys = two_key_position();
    let mut cursor = KeyCursor { last_index: 7 };
    assert_eq!(
        keys.sample(0.5, Some(&mut cursor), true),
        Err(AnimationError::HintOutOfRange { hint: 7, len: 2 })
    );
}

// ============================================================================
// AnimationKeyArray: Hinted Search
// ============================================================================

#[test]
fn find_key_is_hint_idempotent() {
    let keys = AnimationKeyArray::<1>::from_keys((0..20).map(|i| (i as f32 * 0.37, [i as f32]))).unwrap();

    for step in 0..80 {
        let t = step as f32 * 0.1;
        for hint in 0..keys.len() {
            for forward in [true, false] {
                let first = keys.find_key(t, hint, forward).unwrap();
                let again = keys.find_key(t, first, forward).unwrap();
                assert_eq!(first, again, "t={t} hint={hint} forward={forward}");
            }
        }
    }
}

#[test]
fn find_key_result_independent_of_hint() {
    let keys = uneven_keys();
    for step in 0..30 {
        let t = step as f32 * 0.1;
        let reference = keys.find_key(t, 0, true).unwrap();
        for hint in 0..keys.len() {
            assert_eq!(keys.find_key(t, hint, true).unwrap(), reference);
            assert_eq!(keys.find_key(t, hint, false).unwrap(), reference);
        }
    }
}

#[test]
fn cursor_follows_sequential_playback() {
    let keys = AnimationKeyArray::<1>::from_keys((0..5).map(|i| (i as f32, [i as f32 * 10.0]))).unwrap();
    let mut cursor = KeyCursor::default();

    for i in 0..=20 {
        let t = i as f32 * 0.2;
        let [v] = keys.sample(t, Some(&mut cursor), true).unwrap();
        assert!(approx(v, t * 10.0), "t={t}: got {v}");
        assert_eq!(cursor.last_index, (t.floor() as usize).min(4));
    }

    // Reverse playback walks the cursor back down
    for i in (0..=20).rev() {
        let t = i as f32 * 0.2;
        let [v] = keys.sample(t, Some(&mut cursor), false).unwrap();
        assert!(approx(v, t * 10.0), "t={t}: got {v}");
    }
}

// ============================================================================
// AnimationKeyArray: Looping Sampling
// ============================================================================

#[test]
fn looping_is_continuous_across_the_boundary() {
    let keys = two_key_position();
    let at_end = keys.sample_looping(1.0, 1.0, None, true).unwrap();
    let at_start = keys.sample_looping(0.0, 1.0, None, true).unwrap();
    assert_eq!(at_end, at_start);
    assert!(approx_array(keys.sample_looping(0.5, 1.0, None, true).unwrap(), [5.0, 0.0, 0.0]));
}

#[test]
fn looping_blends_last_into_first() {
    let keys = AnimationKeyArray::<1>::from_keys([(0.25, [0.0]), (0.75, [10.0])]).unwrap();

    // Before the first key: from (0.75 - 1.0, 10) to (0.25, 0)
    assert!(approx(keys.sample_looping(0.0, 1.0, None, true).unwrap()[0], 5.0));
    // After the last key: from (0.75, 10) to (1.25, 0)
    assert!(approx(keys.sample_looping(0.9, 1.0, None, true).unwrap()[0], 7.0));
    // Inside the keyed range: plain interpolation
    assert!(approx(keys.sample_looping(0.5, 1.0, None, true).unwrap()[0], 5.0));
}

#[test]
fn looping_is_periodic() {
    let keys = uneven_keys();
    let duration = 2.5;

    for step in 0..50 {
        let t = step as f32 * 0.05;
        let a = keys.sample_looping(t, duration, None, true).unwrap();
        let b = keys.sample_looping(t + duration, duration, None, true).unwrap();
        let c = keys.sample_looping(t + 2.0 * duration, duration, None, false).unwrap();
        assert!(approx_array(a, b), "t={t}: {a:?} vs {b:?}");
        assert!(approx_array(a, c), "t={t}: {a:?} vs {c:?}");
    }
}

#[test]
fn looping_accepts_negative_time() {
    let keys = two_key_position();
    let a = keys.sample_looping(-0.25, 1.0, None, true).unwrap();
    let b = keys.sample_looping(0.75, 1.0, None, true).unwrap();
    assert!(approx_array(a, b));
}

// ============================================================================
// AnimationTransformTrack & Animation
// ============================================================================

#[test]
fn empty_channels_return_neutral_values() {
    let track = AnimationTransformTrack::new("spine");
    assert_eq!(track.sample_position(0.3, None, true).unwrap(), Vec3::ZERO);
    assert_eq!(track.sample_orientation(0.3, None, true).unwrap(), Quat::IDENTITY);
    assert_eq!(track.sample_scale(0.3, None, true).unwrap(), Vec3::ONE);
    assert_eq!(track.sample_position_looping(0.3, 1.0, None, true).unwrap(), Vec3::ZERO);
    assert_eq!(track.sample_orientation_looping(0.3, 1.0, None, true).unwrap(), Quat::IDENTITY);
    assert_eq!(track.sample_scale_looping(0.3, 1.0, None, true).unwrap(), Vec3::ONE);
}

#[test]
fn track_decodes_channels() {
    let q = Quat::from_rotation_y(0.8);
    let mut track = AnimationTransformTrack::new("arm");
    track.positions.push_key(0.0, [1.0, 2.0, 3.0]).unwrap();
    track.orientations.push_key(0.0, q.to_array()).unwrap();
    track.scales.push_key(0.0, [2.0, 2.0, 2.0]).unwrap();

    assert_eq!(track.sample_position(0.5, None, true).unwrap(), Vec3::new(1.0, 2.0, 3.0));
    assert!(track.sample_orientation(0.5, None, true).unwrap().abs_diff_eq(q, EPSILON));
    assert_eq!(track.sample_scale(0.5, None, true).unwrap(), Vec3::splat(2.0));
}

#[test]
fn opposite_sign_orientation_keys_blend_along_short_arc() {
    let q = Quat::from_rotation_z(0.6);
    let mut track = AnimationTransformTrack::new("wrist");
    track.orientations.push_key(0.0, q.to_array()).unwrap();
    track.orientations.push_key(1.0, (-q).to_array()).unwrap();

    let mid = track.sample_orientation(0.5, None, true).unwrap();
    assert!(mid.is_finite());
    assert!(mid.abs_diff_eq(q, EPSILON));

    // Wrap from the last key back into the first
    let wrapped = track.sample_orientation_looping(1.5, 2.0, None, true).unwrap();
    assert!(wrapped.abs_diff_eq(-q, EPSILON));
}

#[test]
fn track_sort_orders_every_channel() -> anyhow::Result<()> {
    let mut track = AnimationTransformTrack::new("arm");
    track.positions.push_key(2.0, [2.0, 0.0, 0.0])?;
    track.positions.push_key(0.0, [0.0, 0.0, 0.0])?;
    track.scales.push_key(1.0, [3.0; 3])?;
    track.scales.push_key(1.0, [4.0; 3])?;
    track.scales.push_key(0.5, [1.0; 3])?;
    track.sort_keys()?;

    assert_eq!(track.positions.times(), &[0.0, 2.0]);
    assert_eq!(track.scales.times(), &[0.5, 1.0, 1.0]);
    assert_eq!(track.scales.values(), &[[1.0; 3], [3.0; 3], [4.0; 3]]);
    assert!(track.sample_position(1.0, None, true)?.abs_diff_eq(Vec3::X, EPSILON));
    Ok(())
}

#[test]
fn animation_duration_from_latest_key() {
    let mut a = AnimationTransformTrack::new("a");
    a.positions.push_key(1.5, [0.0; 3]).unwrap();
    let mut b = AnimationTransformTrack::new("b");
    b.orientations.push_key(2.25, Quat::IDENTITY.to_array()).unwrap();
    b.scales.push_key(0.5, [1.0; 3]).unwrap();

    let animation = Animation::from_tracks("walk", vec![a, b]);
    assert!(approx(animation.duration, 2.25));
    assert_eq!(animation.track_count(), 2);
    assert_eq!(animation.find_track("b"), Some(1));
    assert!(animation.track(2).is_none());
}

// ============================================================================
// AnimationBinding
// ============================================================================

fn two_bone_skeleton() -> Skeleton {
    let mut tree = FrameTree::new();
    let root = tree.add_frame("root", BoneTransform::IDENTITY, None);
    tree.add_frame("head", BoneTransform::from_translation(Vec3::Y), Some(root));
    Skeleton::new(&tree, root).unwrap()
}

fn nod_animation() -> Arc<Animation> {
    let mut head = AnimationTransformTrack::new("head");
    head.orientations
        .push_key(0.0, Quat::IDENTITY.to_array())
        .unwrap();
    // Deliberately non-unit to exercise normalization
    head.orientations
        .push_key(1.0, (Quat::from_rotation_x(1.0) * 3.0).to_array())
        .unwrap();

    let mut tail = AnimationTransformTrack::new("tail");
    tail.positions.push_key(0.0, [9.0, 9.0, 9.0]).unwrap();

    Arc::new(Animation::new("nod", 2.0, vec![head, tail]))
}

#[test]
fn binding_maps_tracks_by_name() {
    let skeleton = two_bone_skeleton();
    let binding = AnimationBinding::new(&skeleton, nod_animation()).unwrap();

    assert_eq!(binding.bone_for_track(0), Some(1));
    assert_eq!(binding.bone_for_track(1), None);
    assert_eq!(binding.bound_track_count(), 1);
    assert!(approx(binding.playback_time(), 0.0));
    assert!(approx(binding.speed(), 1.0));
}

#[test]
fn tick_wraps_and_returns_after_one_duration() {
    let skeleton = two_bone_skeleton();
    let mut binding = AnimationBinding::new(&skeleton, nod_animation()).unwrap();
    binding.set_playback_time(0.3);

    for _ in 0..20 {
        binding.tick(0.1);
        assert!((0.0..2.0).contains(&binding.playback_time()));
    }

    let t = binding.playback_time();
    let circular = (t - 0.3).abs().min(2.0 - (t - 0.3).abs());
    assert!(circular < 1e-4, "expected ~0.3, got {t}");
}

#[test]
fn speed_scales_and_reverses_the_clock() {
    let skeleton = two_bone_skeleton();
    let mut binding = AnimationBinding::new(&skeleton, nod_animation()).unwrap();

    binding.set_speed(0.0);
    binding.tick(5.0);
    assert!(approx(binding.playback_time(), 0.0));

    binding.set_speed(2.0);
    binding.tick(0.25);
    assert!(approx(binding.playback_time(), 0.5));

    binding.set_speed(-1.0);
    binding.tick(1.0);
    assert!(approx(binding.playback_time(), 1.5));
}

#[test]
fn sampling_overwrites_only_bound_bones() -> anyhow::Result<()> {
    let skeleton = two_bone_skeleton();
    let mut binding = AnimationBinding::new(&skeleton, nod_animation())?;
    let mut pose = LocalPose::new(skeleton.bone_count())?;
    pose.as_mut_slice().copy_from_slice(skeleton.bind_pose());

    binding.set_playback_time(1.0);
    binding.sample_to_local_pose(&mut pose)?;

    let head = pose.get(1).copied().unwrap();
    assert!(approx(head.orientation.length(), 1.0));
    assert!(head.orientation.abs_diff_eq(Quat::from_rotation_x(1.0), EPSILON));
    // Orientation-only track keeps the bind position
    assert!(head.position.abs_diff_eq(Vec3::Y, EPSILON));
    // Root has no track and the "tail" track is unbound
    let root = pose.get(0).copied().unwrap();
    assert!(root.position.abs_diff_eq(Vec3::ZERO, EPSILON));
    assert!(root.orientation.abs_diff_eq(Quat::IDENTITY, EPSILON));
    Ok(())
}

#[test]
fn sampling_between_negated_keys_stays_finite() -> anyhow::Result<()> {
    let skeleton = two_bone_skeleton();
    let q = Quat::from_rotation_y(1.2);
    let mut head = AnimationTransformTrack::new("head");
    head.orientations.push_key(0.0, q.to_array())?;
    head.orientations.push_key(1.0, (-q).to_array())?;
    let animation = Arc::new(Animation::new("flip", 2.0, vec![head]));

    let mut binding = AnimationBinding::new(&skeleton, animation)?;
    let mut pose = LocalPose::new(skeleton.bone_count())?;
    pose.as_mut_slice().copy_from_slice(skeleton.bind_pose());

    for t in [0.5, 1.5] {
        binding.set_playback_time(t);
        binding.sample_to_local_pose(&mut pose)?;
        let orientation = pose.get(1).copied().unwrap().orientation;
        assert!(orientation.is_finite(), "t={t}");
        // q and -q are the same rotation
        assert!(orientation.dot(q).abs() > 1.0 - EPSILON, "t={t}");
    }
    Ok(())
}

#[test]
fn degenerate_orientation_keeps_previous_value() -> anyhow::Result<()> {
    let skeleton = two_bone_skeleton();
    let mut head = AnimationTransformTrack::new("head");
    head.orientations.push_key(0.0, [0.0; 4])?;
    let animation = Arc::new(Animation::new("broken", 1.0, vec![head]));

    let mut binding = AnimationBinding::new(&skeleton, animation)?;
    let mut pose = LocalPose::new(skeleton.bone_count())?;
    pose.as_mut_slice().copy_from_slice(skeleton.bind_pose());
    binding.sample_to_local_pose(&mut pose)?;

    let orientation = pose.get(1).copied().unwrap().orientation;
    assert!(orientation.abs_diff_eq(Quat::IDENTITY, EPSILON));
    Ok(())
}

#[test]
fn zero_duration_holds_at_start() {
    let skeleton = two_bone_skeleton();
    let animation = Arc::new(Animation::new("pose", 0.0, vec![AnimationTransformTrack::new("head")]));
    let mut binding = AnimationBinding::new(&skeleton, animation).unwrap();
    binding.tick(3.0);
    assert!(approx(binding.playback_time(), 0.0));
}
