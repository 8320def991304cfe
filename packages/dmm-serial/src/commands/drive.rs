use std::time::Duration;

use log::{debug, warn};

use crate::{
    protocol::{self, Alarm, DriveStatus, Parameter, ReadRequest},
    Connection,
};

use super::Command;

/// How long to wait for a drive to answer a read.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How many times a read is repeated before giving up.
pub const READ_RETRIES: usize = 3;

/// Reads one telemetry parameter through a general read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadParameter {
    pub axis: u8,
    pub parameter: Parameter,
}
impl Command for ReadParameter {
    type Output = i32;

    async fn execute<C: Connection + ?Sized>(
        self,
        connection: &mut C,
    ) -> Result<Self::Output, C::Error> {
        let request = protocol::Command::ReadParameter(self.parameter);
        let reply = connection
            .handshake(
                request.to_packet(self.axis),
                self.parameter.code(),
                READ_TIMEOUT,
                READ_RETRIES,
            )
            .await?;

        debug!("{reply}");
        Ok(reply.value)
    }
}

/// Reads a drive's status byte and decodes its alarm field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStatus {
    pub axis: u8,
}
impl Command for ReadStatus {
    type Output = (DriveStatus, Alarm);

    async fn execute<C: Connection + ?Sized>(
        self,
        connection: &mut C,
    ) -> Result<Self::Output, C::Error> {
        let request = protocol::Command::Read(ReadRequest::DriveStatus);
        let reply = connection
            .handshake(
                request.to_packet(self.axis),
                ReadRequest::DriveStatus.reply().code(),
                READ_TIMEOUT,
                READ_RETRIES,
            )
            .await?;

        let status = DriveStatus::from_value(reply.value);
        let alarm = status.alarm();
        if alarm.is_fatal() {
            warn!("Axis {} reports {alarm}", self.axis);
        }

        Ok((status, alarm))
    }
}

/// Sets the speed and acceleration limits used by subsequent moves.
///
/// The drive forgets both limits when it resets, so this is sent before every
/// constant speed move rather than once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureMotion {
    pub axis: u8,
    pub max_speed: i32,
    pub max_accel: i32,
}
impl Command for ConfigureMotion {
    type Output = ();

    async fn execute<C: Connection + ?Sized>(
        self,
        connection: &mut C,
    ) -> Result<Self::Output, C::Error> {
        connection
            .command(self.axis, protocol::Command::SetMaxSpeed(self.max_speed))
            .await?;
        connection
            .command(self.axis, protocol::Command::SetMaxAccel(self.max_accel))
            .await?;

        Ok(())
    }
}
