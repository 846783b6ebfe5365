//! Hand angles for a two-handed clock face.

/// Long-hand denominator outside countdown mode: one full sweep per hour.
pub const FULL_HOUR_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    /// Minute-hand equivalent, degrees clockwise from 12.
    pub long_hand_degrees: f64,
    /// Second hand, degrees clockwise from 12.
    pub second_hand_degrees: f64,
}

/// Map a timer reading to hand angles.
///
/// In countdown mode the long hand sweeps linearly over `segment_total_seconds`;
/// otherwise it shows minutes-within-the-hour and creeps within each minute.
/// Angles are not normalised: a countdown reading above the segment total
/// yields more than 360 degrees.
pub fn hand_angles(time_in_seconds: u64, countdown: bool, segment_total_seconds: u64) -> HandAngles {
    let seconds_component = (time_in_seconds % 60) as f64;
    let second_hand_degrees = seconds_component / 60.0 * 360.0;

    let long_hand_degrees = if countdown {
        // PomodoroConfig never yields 0; fall back to a full-hour face.
        let total = if segment_total_seconds == 0 {
            FULL_HOUR_SECONDS
        } else {
            segment_total_seconds
        };
        time_in_seconds as f64 / total as f64 * 360.0
    } else {
        let minutes_component = ((time_in_seconds / 60) % 60) as f64;
        minutes_component / 60.0 * 360.0 + seconds_component / 60.0 * 6.0
    };

    HandAngles {
        long_hand_degrees,
        second_hand_degrees,
    }
}

/// Elapsed-time face (normal mode).
pub fn elapsed_face(elapsed_seconds: u64) -> HandAngles {
    hand_angles(elapsed_seconds, false, FULL_HOUR_SECONDS)
}

/// Unit-circle end point of a hand of `length` at `degrees` (12 o'clock is +y).
pub fn hand_tip(degrees: f64, length: f64) -> (f64, f64) {
    let radians = degrees.rem_euclid(360.0).to_radians();
    (length * radians.sin(), length * radians.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normal_mode_ninety_seconds() {
        let a = elapsed_face(90);
        assert!(close(a.second_hand_degrees, 180.0));
        assert!(close(a.long_hand_degrees, 9.0));
    }

    #[test]
    fn normal_mode_wraps_each_hour() {
        let a = elapsed_face(3600 + 90);
        assert!(close(a.long_hand_degrees, 9.0));
        let b = elapsed_face(59 * 60 + 59);
        assert!(close(b.long_hand_degrees, 354.0 + 5.9));
        assert!(close(b.second_hand_degrees, 354.0));
    }

    #[test]
    fn countdown_mode_is_linear_fraction_of_segment() {
        let a = hand_angles(450, true, 1500);
        assert!(close(a.long_hand_degrees, 108.0));
        assert!(close(a.second_hand_degrees, 180.0));
        let full = hand_angles(1500, true, 1500);
        assert!(close(full.long_hand_degrees, 360.0));
    }

    #[test]
    fn countdown_overrun_is_not_clamped() {
        let a = hand_angles(3000, true, 1500);
        assert!(close(a.long_hand_degrees, 720.0));
    }

    #[test]
    fn hand_tip_points() {
        let (x, y) = hand_tip(0.0, 1.0);
        assert!(close(x, 0.0) && close(y, 1.0));
        let (x, y) = hand_tip(90.0, 2.0);
        assert!(close(x, 2.0) && y.abs() < 1e-9);
        let (x, y) = hand_tip(450.0, 2.0);
        assert!(close(x, 2.0) && y.abs() < 1e-9);
    }
}
