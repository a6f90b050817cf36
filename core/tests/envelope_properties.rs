//! Properties of the move envelope over randomly generated valid areas.

use aerial_tactics_core::{MoveArea, MoveInput, MoveResult, RangeFloat2};
use proptest::prelude::*;

/// Ordered distances and angle ranges that straddle straight ahead.
fn valid_area() -> impl Strategy<Value = MoveArea> {
    (
        0.0f32..30.0,
        5.0f32..40.0,
        -80.0f32..-2.0,
        2.0f32..80.0,
        -80.0f32..-2.0,
        2.0f32..80.0,
    )
        .prop_map(|(low, span, near_min, near_max, far_min, far_max)| {
            MoveArea::new(
                RangeFloat2::new(low, low + span),
                RangeFloat2::new(near_min, near_max),
                RangeFloat2::new(far_min, far_max),
            )
        })
}

proptest! {
    #[test]
    fn inverse_recovers_every_evaluated_input(
        area in valid_area(),
        speed in 0.0f32..=1.0,
        steer in 0.0f32..=1.0,
    ) {
        prop_assert!(area.is_monotonic());
        let input = MoveInput::new(speed, steer);
        let recovered = area.inverse(area.evaluate(input));
        prop_assert!((recovered.speed - speed).abs() < 1e-3, "{input:?} -> {recovered:?}");
        prop_assert!((recovered.steer - steer).abs() < 1e-3, "{input:?} -> {recovered:?}");
    }

    #[test]
    fn clamp_leaves_evaluated_results_in_place(
        area in valid_area(),
        speed in 0.0f32..=1.0,
        steer in 0.0f32..=1.0,
    ) {
        let result = area.evaluate(MoveInput::new(speed, steer));
        let clamped = area.clamp(result);
        prop_assert!((clamped.distance - result.distance).abs() < 1e-3);
        prop_assert!((clamped.azimuth - result.azimuth).abs() < 1e-3);
    }

    #[test]
    fn clamp_keeps_included_results(
        area in valid_area(),
        distance in -10.0f32..90.0,
        azimuth in -100.0f32..100.0,
    ) {
        let result = MoveResult::new(distance, azimuth);
        let clamped = area.clamp(result);
        if area.is_include(result) {
            prop_assert_eq!(clamped, result);
        }
        prop_assert!(area.is_include(clamped), "{result:?} clamped to {clamped:?}");
    }
}
