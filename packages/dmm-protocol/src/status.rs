//! Drive status and configuration bytes.

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Status byte reported for [`Parameter::Status`](crate::Parameter::Status).
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct DriveStatus: u8 {
        /// Bit 0 is set when the motor has reached its commanded position.
        const IN_POSITION = 1 << 0;

        /// Bit 1 is set when the motor is free (disengaged).
        const FREE = 1 << 1;

        /// Bits 2 to 4 carry the alarm code. See [`Alarm`].
        const ALARM = 0b111 << 2;

        /// Bit 5 is set while an S-curve, linear or circular motion is running.
        const BUSY = 1 << 5;

        /// Bit 6 mirrors the CNC zero position input (pin 2 of JP3).
        const CNC_ZERO = 1 << 6;
    }
}

impl DriveStatus {
    /// Interprets a decoded status value. Only the low 7 bits are meaningful.
    pub fn from_value(value: i32) -> Self {
        Self::from_bits_truncate((value & 0x7f) as u8)
    }

    pub fn alarm(self) -> Alarm {
        Alarm::from_code((self.bits() & Self::ALARM.bits()) >> 2)
    }
}

/// Alarm code carried in bits 2 to 4 of [`DriveStatus`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Alarm {
    None,
    /// `|Pset - Pmotor| > 8192` steps (180 degrees).
    LostPhase,
    OverCurrent,
    OverHeat,
    /// The drive rejected a command because its checksum did not validate.
    ChecksumReport,
    Unknown(u8),
}

impl Alarm {
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::LostPhase,
            2 => Self::OverCurrent,
            3 => Self::OverHeat,
            4 => Self::ChecksumReport,
            other => Self::Unknown(other),
        }
    }

    /// Whether the drive cannot continue without intervention.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::LostPhase | Self::OverCurrent | Self::OverHeat)
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("No alarm"),
            Self::LostPhase => f.write_str("Lost phase, |Pset - Pmotor| > 8192 steps (180 deg)"),
            Self::OverCurrent => f.write_str("Over current"),
            Self::OverHeat => f.write_str("Over heat or over power"),
            Self::ChecksumReport => f.write_str("Checksum error report, command not accepted"),
            Self::Unknown(code) => write!(f, "Unknown alarm ({code})"),
        }
    }
}

bitflags! {
    /// Drive configuration byte, written with
    /// [`Command::SetDriveConfig`](crate::Command::SetDriveConfig) and reported as
    /// [`Parameter::Config`](crate::Parameter::Config).
    ///
    /// Only the motor drive bit is interpreted; other bits are carried through as-is.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct DriveConfig: u8 {
        /// HIGH: motor drive enabled. LOW: motor shaft free.
        const MOTOR_DRIVE = 0x10;

        const _ = 0x7f;
    }
}

impl DriveConfig {
    /// Interprets a decoded config value. Only the low 7 bits are meaningful.
    pub fn from_value(value: i32) -> Self {
        Self::from_bits_retain((value & 0x7f) as u8)
    }

    /// The config with the motor drive enabled.
    pub fn engaged(self) -> Self {
        self | Self::MOTOR_DRIVE
    }

    /// The config with the motor shaft free.
    pub fn disengaged(self) -> Self {
        self - Self::MOTOR_DRIVE
    }
}
