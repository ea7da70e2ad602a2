use bitflags::bitflags;

bitflags! {
    /// Per-tick action bitset, one bit per recognized action.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Actions: u8 {
        const MOVE_RIGHT = 1 << 0;
        const MOVE_LEFT = 1 << 1;
        const JUMP = 1 << 2;
    }
}

impl Actions {
    /// Fixed enumeration order of the wire-level action vector.
    pub const WIRE_ORDER: [Actions; 3] =
        [Actions::MOVE_RIGHT, Actions::MOVE_LEFT, Actions::JUMP];
}

/// Source of a local player's input, sampled once per tick.
///
/// This is the seam to whatever owns the real input device (window event
/// loop, gamepad poll, scripted bot). The replication core only ever asks
/// for the current bitset.
pub trait InputDevice {
    fn poll(&mut self) -> Actions;
}

/// Device that never presses anything. Used by headless runners.
pub struct NullDevice;

impl InputDevice for NullDevice {
    fn poll(&mut self) -> Actions {
        Actions::empty()
    }
}

/// Device that holds a constant bitset. Used by soak runs and tests.
pub struct FixedDevice(pub Actions);

impl InputDevice for FixedDevice {
    fn poll(&mut self) -> Actions {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_order_is_stable() {
        assert_eq!(
            Actions::WIRE_ORDER,
            [Actions::MOVE_RIGHT, Actions::MOVE_LEFT, Actions::JUMP]
        );
    }

    #[test]
    fn devices_report_their_bitset() {
        assert_eq!(NullDevice.poll(), Actions::empty());
        assert_eq!(
            FixedDevice(Actions::JUMP | Actions::MOVE_LEFT).poll(),
            Actions::JUMP | Actions::MOVE_LEFT
        );
    }
}
