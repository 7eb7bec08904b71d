//! Renderer contract tests

use pingscope::core::Error as CoreError;
use pingscope::render::{NullSurface, RangeDopplerRenderer, SnapshotSurface};
use proptest::prelude::*;

/// One hot entry of 10 in a 64x20 frame.
#[test]
fn test_scenario_c_single_target() {
    let mut renderer = RangeDopplerRenderer::new(SnapshotSurface::new());
    renderer.resize(64, 20);

    let mut frame = vec![0.0f32; 1280];
    let hot = 7 * 64 + 33;
    frame[hot] = 10.0;

    let max = renderer.draw(&frame).unwrap();
    assert_eq!(max, 10.0);

    let buffer = renderer.surface().last().unwrap();
    assert_eq!((buffer.width(), buffer.height()), (64, 20));
    for (i, v) in buffer.intensities().enumerate() {
        assert_eq!(v, if i == hot { 255 } else { 0 }, "pixel {i}");
    }
    assert_eq!(buffer.intensity(33, 7), Some(255));
}

#[test]
fn test_draw_before_resize_is_dropped() {
    let mut renderer = RangeDopplerRenderer::new(NullSurface::new());
    assert!(matches!(
        renderer.draw(&[1.0; 4]),
        Err(CoreError::NotInitialized)
    ));
    assert_eq!(renderer.surface().presented(), 0);
}

proptest! {
    #[test]
    fn prop_frame_length_contract(w in 1usize..96, h in 1usize..32) {
        let mut renderer = RangeDopplerRenderer::new(NullSurface::new());
        renderer.resize(w, h);

        let frame: Vec<f32> = (0..w * h).map(|i| (i % 7) as f32).collect();
        prop_assert!(renderer.draw(&frame).is_ok());

        let short = renderer.draw(&frame[..w * h - 1]);
        let is_mismatch = matches!(
            short,
            Err(CoreError::DimensionMismatch { expected, actual })
                if expected == w * h && actual == w * h - 1
        );
        prop_assert!(is_mismatch);
        prop_assert_eq!(renderer.frames_drawn(), 1);
    }

    #[test]
    fn prop_all_zero_frame_is_black(w in 1usize..64, h in 1usize..24) {
        let mut renderer = RangeDopplerRenderer::new(SnapshotSurface::new());
        renderer.resize(w, h);

        let max = renderer.draw(&vec![0.0; w * h]).unwrap();
        prop_assert_eq!(max, 0.0);
        let buffer = renderer.surface().last().unwrap();
        prop_assert!(buffer.intensities().all(|v| v == 0));
    }
}
