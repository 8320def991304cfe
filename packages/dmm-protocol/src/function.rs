//! Function codes and the telemetry parameter table.

use core::fmt;

/// Known host-to-drive function codes.
///
/// This module is non-exhaustive.
pub mod cmds {
    // motion
    pub const SET_ORIGIN: u8 = 0x00;
    pub const GO_ABSOLUTE_POS: u8 = 0x01;
    pub const TURN_CONST_SPEED: u8 = 0x0a;

    // configuration
    pub const SET_DRIVE_CONFIG: u8 = 0x07;
    pub const SET_MAIN_GAIN: u8 = 0x10;
    pub const SET_SPEED_GAIN: u8 = 0x11;
    pub const SET_INT_GAIN: u8 = 0x12;
    pub const SET_HIGH_SPEED: u8 = 0x14;
    pub const SET_HIGH_ACCEL: u8 = 0x15;

    // reads
    pub const READ_DRIVE_ID: u8 = 0x06;
    pub const READ_DRIVE_CONFIG: u8 = 0x08;
    pub const READ_DRIVE_STATUS: u8 = 0x09;
    pub const GENERAL_READ: u8 = 0x0e;
    pub const READ_MAIN_GAIN: u8 = 0x18;
    pub const READ_SPEED_GAIN: u8 = 0x19;
    pub const READ_POS_ON_RANGE: u8 = 0x1e;
    pub const READ_GEAR_NUMBER: u8 = 0x1f;
}

/// How the data groups of a packet are turned back into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    /// Bit 6 of the first data group is a sign bit.
    Signed,
    /// Bit 6 of the first data group is an ordinary data bit.
    Unsigned,
}

impl Signedness {
    /// Looks up how a packet with the given function code should be decoded.
    ///
    /// Function codes that are not telemetry parameters decode as signed.
    pub fn for_function(function: u8) -> Self {
        Parameter::from_code(function)
            .map(Parameter::signedness)
            .unwrap_or(Self::Signed)
    }
}

/// Telemetry parameters reported by the drive.
///
/// The discriminant is the function code of the drive's reply, which is also the
/// sub-code sent with a [general read](cmds::GENERAL_READ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Parameter {
    MainGain = 0x10,
    SpeedGain = 0x11,
    IntegralGain = 0x12,
    TorqueConstant = 0x13,
    MaxSpeed = 0x14,
    MaxAccel = 0x15,
    DriveId = 0x16,
    PositionOnRange = 0x17,
    GearNumber = 0x18,
    Status = 0x19,
    Config = 0x1a,
    /// 32-bit absolute shaft position.
    AbsolutePosition = 0x1b,
    TorqueCurrent = 0x1e,
}

impl Parameter {
    pub const ALL: [Self; 13] = [
        Self::MainGain,
        Self::SpeedGain,
        Self::IntegralGain,
        Self::TorqueConstant,
        Self::MaxSpeed,
        Self::MaxAccel,
        Self::DriveId,
        Self::PositionOnRange,
        Self::GearNumber,
        Self::Status,
        Self::Config,
        Self::AbsolutePosition,
        Self::TorqueCurrent,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|parameter| *parameter as u8 == code)
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn signedness(self) -> Signedness {
        match self {
            Self::AbsolutePosition
            | Self::TorqueCurrent
            | Self::GearNumber
            | Self::Config
            | Self::Status => Signedness::Signed,
            Self::MainGain
            | Self::SpeedGain
            | Self::IntegralGain
            | Self::TorqueConstant
            | Self::MaxSpeed
            | Self::MaxAccel
            | Self::DriveId
            | Self::PositionOnRange => Signedness::Unsigned,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::MainGain => "Main Gain",
            Self::SpeedGain => "Speed Gain",
            Self::IntegralGain => "Integration Gain",
            Self::TorqueConstant => "Torque Constant",
            Self::MaxSpeed => "Max Speed",
            Self::MaxAccel => "Max Acceleration",
            Self::DriveId => "Drive ID",
            Self::PositionOnRange => "Position On Range",
            Self::GearNumber => "Gear Number",
            Self::Status => "Status Byte",
            Self::Config => "Config Byte",
            Self::AbsolutePosition => "Absolute Position",
            Self::TorqueCurrent => "Torque Current",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Parameter {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Display name for an arbitrary reply function code.
pub fn parameter_name(function: u8) -> &'static str {
    Parameter::from_code(function)
        .map(Parameter::name)
        .unwrap_or("Unknown Parameter")
}

/// Dedicated read commands, answered with the matching [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadRequest {
    DriveId = cmds::READ_DRIVE_ID,
    DriveConfig = cmds::READ_DRIVE_CONFIG,
    DriveStatus = cmds::READ_DRIVE_STATUS,
    MainGain = cmds::READ_MAIN_GAIN,
    SpeedGain = cmds::READ_SPEED_GAIN,
    PositionOnRange = cmds::READ_POS_ON_RANGE,
    GearNumber = cmds::READ_GEAR_NUMBER,
}

impl ReadRequest {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The parameter the drive reports in reply to this request.
    pub const fn reply(self) -> Parameter {
        match self {
            Self::DriveId => Parameter::DriveId,
            Self::DriveConfig => Parameter::Config,
            Self::DriveStatus => Parameter::Status,
            Self::MainGain => Parameter::MainGain,
            Self::SpeedGain => Parameter::SpeedGain,
            Self::PositionOnRange => Parameter::PositionOnRange,
            Self::GearNumber => Parameter::GearNumber,
        }
    }
}
