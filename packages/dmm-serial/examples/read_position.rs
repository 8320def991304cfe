use std::{thread::sleep, time::Duration};

use dmm_serial::{
    blocking::{self, BlockingPort},
    protocol::{Packet, ReportHandler, Session},
    serial::{self, SerialError},
};

struct Printer;

impl ReportHandler for Printer {
    fn report_position(&mut self, axis: u8, position: i32) {
        println!("axis {axis}: position {position}");
    }

    fn report_parameter(&mut self, report: Packet) {
        println!("{report}");
    }
}

fn main() -> Result<(), SerialError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let axis = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let port = serial::find_ports()?
        .into_iter()
        .next()
        .ok_or(SerialError::NoPorts)?;
    let port = BlockingPort::open(&port.port_name, Duration::from_millis(10))?;

    let mut session = Session::new(port, Printer);

    // Poll ten times a second
    loop {
        session.read_position(axis);
        if let Some(e) = session.sink_mut().take_error() {
            return Err(e.into());
        }

        sleep(Duration::from_millis(100));
        blocking::pump(&mut session)?;
    }
}
