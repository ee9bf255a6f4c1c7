//! Cursor-driven tilt.
//!
//! Every frame each slot eases its tilt toward a target derived from the
//! cursor position and its distance to the slot on screen.

use crate::{config::TiltConfig, showcase::cursor::Cursor, showcase::viewport::Viewport};

/// Rotation about X (`pitch`) and Y (`yaw`) in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tilt {
    pub pitch: f32,
    pub yaw: f32,
}

/// How strongly a slot reacts to the cursor, in [0, 1].
///
/// Grows with the on-screen pixel distance between slot and cursor, relative
/// to the viewport diagonal. A NaN distance saturates to 1.
pub fn intensity(slot_px: (f32, f32), cursor_px: (f32, f32), viewport: &Viewport) -> f32 {
    let distance = (slot_px.0 - cursor_px.0).hypot(slot_px.1 - cursor_px.1);
    let proximity = 1.0 - (distance / viewport.diagonal()).min(1.0);
    1.0 - proximity
}

pub fn tilt_target(cursor: &Cursor, intensity: f32, gains: &TiltConfig) -> Tilt {
    Tilt {
        pitch: -cursor.y * gains.pitch_gain * intensity,
        yaw: cursor.x * gains.yaw_gain * intensity,
    }
}

/// One easing step: move `delay` of the remaining way toward `target`.
pub fn ease(current: Tilt, target: Tilt, delay: f32) -> Tilt {
    Tilt {
        pitch: current.pitch + (target.pitch - current.pitch) * delay,
        yaw: current.yaw + (target.yaw - current.yaw) * delay,
    }
}

/// Target tilt of a slot whose position projects to `slot_ndc`.
pub fn target_for(
    slot_ndc: (f32, f32),
    cursor: &Cursor,
    viewport: &Viewport,
    gains: &TiltConfig,
) -> Tilt {
    let slot_px = viewport.ndc_to_pixels(slot_ndc.0, slot_ndc.1);
    let cursor_px = viewport.ndc_to_pixels(cursor.x, cursor.y);
    tilt_target(cursor, intensity(slot_px, cursor_px, viewport), gains)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 300.0,
        height: 400.0,
    };

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
    }

    #[test]
    fn intensity_is_relative_distance() {
        assert_close(intensity((0.0, 0.0), (0.0, 0.0), &VIEWPORT), 0.0);
        assert_close(intensity((0.0, 0.0), (150.0, 200.0), &VIEWPORT), 0.5);
        assert_close(intensity((0.0, 0.0), (300.0, 400.0), &VIEWPORT), 1.0);
    }

    #[test]
    fn intensity_saturates() {
        assert_eq!(intensity((-1000.0, 0.0), (300.0, 400.0), &VIEWPORT), 1.0);
        assert_eq!(intensity((f32::NAN, 0.0), (0.0, 0.0), &VIEWPORT), 1.0);
    }

    #[test]
    fn target_follows_the_cursor_signs() {
        let gains = TiltConfig::default();
        let target = tilt_target(&Cursor { x: 1.0, y: 1.0 }, 1.0, &gains);
        assert_eq!(target, Tilt { pitch: -0.5, yaw: 1.4 });
        let target = tilt_target(&Cursor { x: -0.5, y: -1.0 }, 0.5, &gains);
        assert_eq!(target, Tilt { pitch: 0.25, yaw: -0.35 });
    }

    #[test]
    fn cursor_on_the_slot_has_no_target() {
        let gains = TiltConfig::default();
        let cursor = Cursor { x: 0.3, y: -0.2 };
        let target = target_for((0.3, -0.2), &cursor, &VIEWPORT, &gains);
        assert_eq!(target, Tilt::default());
    }

    #[test]
    fn easing_moves_a_fraction_of_the_gap() {
        let eased = ease(Tilt::default(), Tilt { pitch: 1.0, yaw: -2.0 }, 0.25);
        assert_eq!(eased, Tilt { pitch: 0.25, yaw: -0.5 });
    }

    #[test]
    fn easing_converges_monotonically() {
        let target = Tilt { pitch: 0.4, yaw: -0.7 };
        let mut current = Tilt::default();
        let mut gap = f32::INFINITY;
        for _ in 0..500 {
            current = ease(current, target, 0.04);
            let next_gap = (target.pitch - current.pitch).abs() + (target.yaw - current.yaw).abs();
            assert!(next_gap <= gap);
            gap = next_gap;
        }
        assert!(gap < 1e-6);
    }
}
