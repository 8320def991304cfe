//! Logical drive commands.

use crate::{
    function::{Parameter, ReadRequest, cmds},
    packet::Packet,
    status::DriveConfig,
};

/// Smallest value accepted by the gain, speed and acceleration setters.
pub const MIN_SETTER_VALUE: i32 = 1;

/// Largest value accepted by the gain, speed and acceleration setters.
pub const MAX_SETTER_VALUE: i32 = 127;

/// A command the host can send to a drive.
///
/// Setter arguments outside of [`MIN_SETTER_VALUE`]`..=`[`MAX_SETTER_VALUE`] are
/// clamped into range rather than rejected, matching what the drive accepts.
///
/// Gains, limits and configuration written here are not persisted by the drive
/// and must be applied again after it resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Move to a signed 28-bit absolute position.
    MoveToAbsolutePosition(i32),
    /// Turn continuously. The sign selects the direction.
    RotateConstantSpeed(i32),
    /// Make the current shaft position the new origin.
    ResetOrigin,
    SetMaxSpeed(i32),
    SetMaxAccel(i32),
    SetMainGain(i32),
    SetSpeedGain(i32),
    SetIntegralGain(i32),
    SetDriveConfig(DriveConfig),
    /// Ask the drive to report a parameter through a general read.
    ReadParameter(Parameter),
    /// Ask the drive to report a parameter through its dedicated read command.
    Read(ReadRequest),
}

impl Command {
    /// Function code of the packet carrying this command.
    pub const fn function(&self) -> u8 {
        match self {
            Self::MoveToAbsolutePosition(_) => cmds::GO_ABSOLUTE_POS,
            Self::RotateConstantSpeed(_) => cmds::TURN_CONST_SPEED,
            Self::ResetOrigin => cmds::SET_ORIGIN,
            Self::SetMaxSpeed(_) => cmds::SET_HIGH_SPEED,
            Self::SetMaxAccel(_) => cmds::SET_HIGH_ACCEL,
            Self::SetMainGain(_) => cmds::SET_MAIN_GAIN,
            Self::SetSpeedGain(_) => cmds::SET_SPEED_GAIN,
            Self::SetIntegralGain(_) => cmds::SET_INT_GAIN,
            Self::SetDriveConfig(_) => cmds::SET_DRIVE_CONFIG,
            Self::ReadParameter(_) => cmds::GENERAL_READ,
            Self::Read(request) => request.code(),
        }
    }

    /// Argument sent with this command, after clamping.
    pub fn argument(&self) -> i32 {
        match *self {
            Self::MoveToAbsolutePosition(position) => position,
            Self::RotateConstantSpeed(speed) => speed,
            Self::SetMaxSpeed(value)
            | Self::SetMaxAccel(value)
            | Self::SetMainGain(value)
            | Self::SetSpeedGain(value)
            | Self::SetIntegralGain(value) => value.clamp(MIN_SETTER_VALUE, MAX_SETTER_VALUE),
            Self::SetDriveConfig(config) => i32::from(config.bits()),
            Self::ReadParameter(parameter) => i32::from(parameter.code()),
            // The argument is a dummy.
            Self::ResetOrigin | Self::Read(_) => 0,
        }
    }

    /// The parameter the drive reports in reply, for read commands.
    pub const fn reply(&self) -> Option<Parameter> {
        match self {
            Self::ReadParameter(parameter) => Some(*parameter),
            Self::Read(request) => Some(request.reply()),
            _ => None,
        }
    }

    /// Addresses this command to a drive.
    pub fn to_packet(&self, axis: u8) -> Packet {
        Packet::new(axis, self.function(), self.argument())
    }
}
