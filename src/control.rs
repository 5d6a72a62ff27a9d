/*
 * Control Module
 *
 * Discrete directional input for the predator. Front ends report which
 * direction is asserted; the simulator consumes at most one per tick.
 */

use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlDirection {
    PosY,
    NegX,
    NegY,
    PosX,
    PosZ,
    NegZ,
}

impl ControlDirection {
    pub const ALL: [ControlDirection; 6] = [
        ControlDirection::PosY,
        ControlDirection::NegX,
        ControlDirection::NegY,
        ControlDirection::PosX,
        ControlDirection::PosZ,
        ControlDirection::NegZ,
    ];

    pub fn unit_vector(self) -> Vec3 {
        match self {
            ControlDirection::PosY => Vec3::Y,
            ControlDirection::NegX => Vec3::NEG_X,
            ControlDirection::NegY => Vec3::NEG_Y,
            ControlDirection::PosX => Vec3::X,
            ControlDirection::PosZ => Vec3::Z,
            ControlDirection::NegZ => Vec3::NEG_Z,
        }
    }
}

// Latest asserted direction since the last tick; later assertions replace earlier ones
#[derive(Debug, Default)]
pub struct PendingControl {
    pending: Option<ControlDirection>,
}

impl PendingControl {
    pub fn assert(&mut self, direction: ControlDirection) {
        self.pending = Some(direction);
    }

    pub fn take(&mut self) -> Option<ControlDirection> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<ControlDirection> {
        self.pending
    }
}
