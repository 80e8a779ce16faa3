//! Relative mouse state and the per-cycle combine step.
//!
//! Several mouse actions can be active in the same frame (e.g. "move left"
//! while "wheel up").  The bridge accepts one relative report per packet, so
//! all active actions are folded into a single [`MouseReport`]:
//!
//! - button presses are OR'ed into the button bits,
//! - x / y / wheel deltas are summed and clamped to `[-127, 127]`.
//!
//! Release actions contribute no bits.  A report without bits releases every
//! button on the host.

use serde::{Deserialize, Serialize};

use crate::keymap::{MouseAction, MOVE_STEP};

pub const BUTTON_LEFT: u8 = 0x01;
pub const BUTTON_RIGHT: u8 = 0x02;
pub const BUTTON_MIDDLE: u8 = 0x04;

/// One relative mouse report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseReport {
    /// bit0 = left, bit1 = right, bit2 = middle.
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

impl MouseReport {
    /// No buttons, no motion.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }

    pub fn holds_button(&self) -> bool {
        self.buttons != 0
    }

    /// Folds every action into one report.
    pub fn combine(actions: &[MouseAction]) -> Self {
        let mut buttons = 0u8;
        let (mut x, mut y, mut wheel) = (0i32, 0i32, 0i32);

        for action in actions {
            match action {
                MouseAction::LeftPress => buttons |= BUTTON_LEFT,
                MouseAction::RightPress => buttons |= BUTTON_RIGHT,
                MouseAction::MiddlePress => buttons |= BUTTON_MIDDLE,
                MouseAction::LeftRelease
                | MouseAction::RightRelease
                | MouseAction::MiddleRelease
                | MouseAction::ReleaseAll => {}
                MouseAction::WheelUp => wheel += 1,
                MouseAction::WheelDown => wheel -= 1,
                MouseAction::MoveLeft => x -= i32::from(MOVE_STEP),
                MouseAction::MoveRight => x += i32::from(MOVE_STEP),
            }
        }

        Self {
            buttons,
            x: clamp_axis(x),
            y: clamp_axis(y),
            wheel: clamp_axis(wheel),
        }
    }
}

/// Clamps to the symmetric signed-byte range `[-127, 127]`.
fn clamp_axis(value: i32) -> i8 {
    // The clamp guarantees the cast is lossless.
    value.clamp(-127, 127) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_left_and_wheel_up_combine_into_one_report() {
        // Arrange
        let actions = [MouseAction::MoveLeft, MouseAction::WheelUp];

        // Act
        let report = MouseReport::combine(&actions);

        // Assert
        assert_eq!(
            report,
            MouseReport {
                buttons: 0,
                x: -10,
                y: 0,
                wheel: 1,
            }
        );
    }

    #[test]
    fn test_button_presses_are_ored() {
        let report = MouseReport::combine(&[
            MouseAction::LeftPress,
            MouseAction::MiddlePress,
            MouseAction::LeftPress,
        ]);
        assert_eq!(report.buttons, BUTTON_LEFT | BUTTON_MIDDLE);
    }

    #[test]
    fn test_release_actions_leave_buttons_clear() {
        let report = MouseReport::combine(&[MouseAction::LeftRelease, MouseAction::ReleaseAll]);
        assert!(report.is_neutral());
        assert!(!report.holds_button());
    }

    #[test]
    fn test_opposite_moves_cancel() {
        let report = MouseReport::combine(&[MouseAction::MoveLeft, MouseAction::MoveRight]);
        assert_eq!(report.x, 0);
        let report = MouseReport::combine(&[MouseAction::WheelUp, MouseAction::WheelDown]);
        assert_eq!(report.wheel, 0);
    }

    #[test]
    fn test_deltas_clamp_to_signed_byte_range() {
        let many_left = vec![MouseAction::MoveLeft; 20];
        assert_eq!(MouseReport::combine(&many_left).x, -127);
        let many_right = vec![MouseAction::MoveRight; 20];
        assert_eq!(MouseReport::combine(&many_right).x, 127);
        let many_up = vec![MouseAction::WheelUp; 300];
        assert_eq!(MouseReport::combine(&many_up).wheel, 127);
    }

    #[test]
    fn test_empty_action_list_is_neutral() {
        assert!(MouseReport::combine(&[]).is_neutral());
    }
}
