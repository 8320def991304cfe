//! Per-link protocol state.
//!
//! A [`Session`] ties the codec to a transport without owning one: outgoing bytes go
//! to a [`ByteSink`], incoming bytes are pushed in with [`Session::feed`], and decoded
//! replies come back through a [`ReportHandler`] or can be polled with
//! [`Session::last_report`] and [`Session::status`].
//!
//! Everything runs inline on the caller's thread. Drives that are polled
//! independently each need their own session; drives sharing one serial line must
//! not interleave the bytes of two packets.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::{
    DecodeError,
    assembler::FrameAssembler,
    command::Command,
    function::Parameter,
    packet::Packet,
};

/// Destination for outgoing wire bytes, written one at a time and in order.
pub trait ByteSink {
    fn write(&mut self, byte: u8);
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, byte: u8) {
        self.push(byte);
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, byte: u8) {
        (**self).write(byte);
    }
}

/// Adapts a closure into a [`ByteSink`].
pub struct SinkFn<F>(pub F);

impl<F: FnMut(u8)> ByteSink for SinkFn<F> {
    fn write(&mut self, byte: u8) {
        (self.0)(byte);
    }
}

/// Receives decoded replies.
///
/// Both methods are called synchronously from within [`Session::feed`].
pub trait ReportHandler {
    /// Called for every [absolute position](Parameter::AbsolutePosition) report.
    fn report_position(&mut self, axis: u8, position: i32);

    /// Called for every other successfully decoded packet.
    fn report_parameter(&mut self, report: Packet) {
        let _ = report;
    }
}

impl ReportHandler for () {
    fn report_position(&mut self, _axis: u8, _position: i32) {}
}

impl<H: ReportHandler + ?Sized> ReportHandler for &mut H {
    fn report_position(&mut self, axis: u8, position: i32) {
        (**self).report_position(axis, position);
    }

    fn report_parameter(&mut self, report: Packet) {
        (**self).report_parameter(report);
    }
}

/// Outcome of the most recent exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecodeStatus {
    /// No packet has completed since the session was created or reset, or since
    /// the last packet was sent.
    #[default]
    Pending,
    /// The last completed packet decoded successfully.
    Success,
    /// The last completed packet did not pass its checksum. Values from earlier
    /// packets are left untouched.
    ChecksumFailed,
}

/// Codec state for one serial link.
pub struct Session<S: ByteSink, H: ReportHandler = ()> {
    assembler: FrameAssembler,
    sink: S,
    handler: H,
    last_report: Option<Packet>,
    status: DecodeStatus,
}

impl<S: ByteSink> Session<S> {
    /// Creates a session that only supports polling.
    pub fn polling(sink: S) -> Self {
        Self::new(sink, ())
    }
}

impl<S: ByteSink, H: ReportHandler> Session<S, H> {
    pub fn new(sink: S, handler: H) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            sink,
            handler,
            last_report: None,
            status: DecodeStatus::Pending,
        }
    }

    /// Encodes a packet and writes it to the sink, starting a new exchange.
    pub fn send_packet(&mut self, packet: &Packet) {
        self.status = DecodeStatus::Pending;
        for &byte in packet.to_bytes().iter() {
            self.sink.write(byte);
        }
    }

    /// Sends a command to the drive at `axis`.
    pub fn send(&mut self, axis: u8, command: Command) {
        debug!("axis {axis}: {command:?}");
        self.send_packet(&command.to_packet(axis));
    }

    /// Asks the drive at `axis` for its absolute position. The reply is delivered
    /// to [`ReportHandler::report_position`].
    pub fn read_position(&mut self, axis: u8) {
        self.send(axis, Command::ReadParameter(Parameter::AbsolutePosition));
    }

    /// Consumes one received byte.
    ///
    /// Returns the decode result when this byte completes a packet. Successful
    /// packets are also dispatched to the [`ReportHandler`] before returning.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Packet, DecodeError>> {
        let result = Packet::decode_exact(self.assembler.feed(byte)?);

        match result {
            Ok(packet) => {
                self.status = DecodeStatus::Success;
                self.last_report = Some(packet);

                if packet.is_position_report() {
                    self.handler.report_position(packet.axis, packet.value);
                } else {
                    self.handler.report_parameter(packet);
                }
            }
            Err(err) => {
                warn!("{err}");
                self.status = DecodeStatus::ChecksumFailed;
            }
        }

        Some(result)
    }

    /// Consumes a run of received bytes in arrival order.
    pub fn feed_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            _ = self.feed(byte);
        }
    }

    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    /// The most recent successfully decoded packet.
    pub fn last_report(&self) -> Option<Packet> {
        self.last_report
    }

    /// Drops any partial packet and forgets previous results.
    pub fn reset(&mut self) {
        self.assembler.reset();
        self.last_report = None;
        self.status = DecodeStatus::Pending;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_parts(self) -> (S, H) {
        (self.sink, self.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checksum::checksum, function::cmds, status::DriveConfig};

    #[derive(Default)]
    struct Recorder {
        positions: Vec<(u8, i32)>,
        reports: Vec<Packet>,
    }

    impl ReportHandler for Recorder {
        fn report_position(&mut self, axis: u8, position: i32) {
            self.positions.push((axis, position));
        }

        fn report_parameter(&mut self, report: Packet) {
            self.reports.push(report);
        }
    }

    fn reply(axis: u8, parameter: Parameter, value: i32) -> Vec<u8> {
        Packet::new(axis, parameter.code(), value).to_bytes().to_vec()
    }

    #[test]
    fn move_to_zero_on_the_wire() {
        let mut session = Session::polling(Vec::<u8>::new());
        session.send(0, Command::MoveToAbsolutePosition(0));

        assert_eq!(session.sink(), &[0x00, 0x81, 0x80, 0x81]);
    }

    #[test]
    fn write_code_echo_is_a_generic_report() {
        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        session.feed_all(&[0x00, 0x81, 0x80, 0x81]);

        let recorder = session.handler();
        assert!(recorder.positions.is_empty());
        assert_eq!(
            recorder.reports,
            vec![Packet::new(0, cmds::GO_ABSOLUTE_POS, 0)]
        );
        assert_eq!(session.status(), DecodeStatus::Success);
    }

    #[test]
    fn position_report_invokes_callback() {
        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        session.read_position(2);
        assert_eq!(
            session.sink(),
            &Packet::new(2, cmds::GENERAL_READ, 0x1b).to_bytes().to_vec()
        );
        assert_eq!(session.status(), DecodeStatus::Pending);

        session.feed_all(&reply(2, Parameter::AbsolutePosition, -123_456));

        assert_eq!(session.handler().positions, vec![(2, -123_456)]);
        assert!(session.handler().reports.is_empty());
        assert_eq!(
            session.last_report(),
            Some(Packet::new(2, 0x1b, -123_456))
        );
    }

    #[test]
    fn checksum_failure_keeps_previous_values() {
        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        session.feed_all(&reply(1, Parameter::MainGain, 40));
        assert_eq!(session.status(), DecodeStatus::Success);

        let mut corrupted = reply(1, Parameter::MainGain, 41);
        *corrupted.last_mut().unwrap() ^= 0x01;

        let mut results = corrupted.iter().filter_map(|&byte| session.feed(byte));
        assert!(results.next().unwrap().unwrap_err().is_checksum());
        assert!(results.next().is_none());
        drop(results);

        assert_eq!(session.status(), DecodeStatus::ChecksumFailed);
        assert_eq!(
            session.last_report(),
            Some(Packet::new(1, Parameter::MainGain.code(), 40))
        );
        assert_eq!(session.handler().reports.len(), 1);
    }

    #[test]
    fn truncated_reply_produces_no_callback() {
        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        let truncated = reply(3, Parameter::AbsolutePosition, 1 << 20);
        session.feed_all(&truncated[..5]);
        session.feed_all(&reply(3, Parameter::AbsolutePosition, 17));

        assert_eq!(session.handler().positions, vec![(3, 17)]);
    }

    #[test]
    fn unsigned_gain_reply() {
        // The drive may report gains in a single group with bit 6 set.
        let body = [0x05, 0x80 | Parameter::SpeedGain.code(), 0xFF];
        let mut packet = body.to_vec();
        packet.push(checksum(&body));

        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        session.feed_all(&packet);

        assert_eq!(
            session.handler().reports,
            vec![Packet::new(5, Parameter::SpeedGain.code(), 127)]
        );
    }

    #[test]
    fn pending_before_any_exchange() {
        let mut session = Session::polling(Vec::<u8>::new());
        assert_eq!(session.status(), DecodeStatus::Pending);
        assert!(session.sink().is_empty());

        session.feed_all(&reply(1, Parameter::MainGain, 5));
        assert_eq!(session.status(), DecodeStatus::Success);

        session.reset();
        assert_eq!(session.status(), DecodeStatus::Pending);
        assert!(session.sink().is_empty());
    }

    #[test]
    fn sending_resets_status() {
        let mut session = Session::polling(Vec::<u8>::new());
        session.feed_all(&reply(1, Parameter::Status, 0x21));
        assert_eq!(session.status(), DecodeStatus::Success);

        session.send(1, Command::SetDriveConfig(DriveConfig::MOTOR_DRIVE));
        assert_eq!(session.status(), DecodeStatus::Pending);
        assert_eq!(
            session.last_report(),
            Some(Packet::new(1, Parameter::Status.code(), 0x21))
        );
    }

    #[test]
    fn closure_sink() {
        let mut written: Vec<u8> = Vec::new();
        {
            let mut session = Session::polling(SinkFn(|byte: u8| written.push(byte)));
            session.send(0x7f, Command::RotateConstantSpeed(-1));
        }
        assert_eq!(written, Packet::new(0x7f, 0x0a, -1).to_bytes().to_vec());
    }

    #[test]
    fn borrowed_parts() {
        let mut wire: Vec<u8> = Vec::new();
        let mut recorder = Recorder::default();
        {
            let mut session = Session::new(&mut wire, &mut recorder);
            session.send(1, Command::ResetOrigin);
            session.feed_all(&reply(1, Parameter::AbsolutePosition, 0));
        }
        assert_eq!(wire, Packet::new(1, 0x00, 0).to_bytes().to_vec());
        assert_eq!(recorder.positions, vec![(1, 0)]);
    }

    #[test]
    fn reset_discards_partial_packet() {
        let mut session = Session::new(Vec::<u8>::new(), Recorder::default());
        let bytes = reply(1, Parameter::AbsolutePosition, 99);
        session.feed_all(&bytes[..2]);
        session.reset();
        // Without an address byte the rest of the packet is ignored.
        session.feed_all(&bytes[2..]);

        assert!(session.handler().positions.is_empty());
        assert_eq!(session.last_report(), None);
    }
}
