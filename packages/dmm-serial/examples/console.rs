use std::time::Duration;

use rustyline::{error::ReadlineError, DefaultEditor};
use dmm_serial::{
    commands::drive::{ConfigureMotion, ReadParameter, ReadStatus},
    protocol::{Command, DriveConfig, Parameter},
    serial::{SerialConnection, SerialError},
    Connection,
};

/// Fastest constant speed the console will command.
const SAFE_SPEED: i32 = 100;

const HELP: &str = "\
move <axis> <position>   go to an absolute position
speed <axis> <speed>     turn at a constant speed
origin <axis>            make the current position the origin
gain <axis> main|speed|int <value>
engage <axis>            drive the motor
free <axis>              let the shaft turn freely
status <axis>            read the status byte
read <axis> <parameter>  read a parameter by code, e.g. 0x1b
quit";

async fn run(
    connection: &mut SerialConnection,
    last_speed: &mut Option<i32>,
    line: &str,
) -> Result<(), SerialError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(());
    };
    let Some(axis) = args.first().and_then(|arg| arg.parse::<u8>().ok()) else {
        println!("{HELP}");
        return Ok(());
    };
    let number = |index: usize| args.get(index).and_then(|arg| arg.parse::<i32>().ok());

    match (name, number(1)) {
        ("move", Some(position)) => {
            connection
                .command(axis, Command::MoveToAbsolutePosition(position))
                .await?
        }
        ("speed", Some(speed)) => {
            let speed = speed.clamp(-SAFE_SPEED, SAFE_SPEED);
            if *last_speed != Some(speed) {
                connection
                    .execute_command(ConfigureMotion {
                        axis,
                        max_speed: 1,
                        max_accel: 4,
                    })
                    .await?;
                connection
                    .command(axis, Command::RotateConstantSpeed(speed))
                    .await?;
                *last_speed = Some(speed);
            }
        }
        ("origin", _) => connection.command(axis, Command::ResetOrigin).await?,
        ("gain", _) => {
            let Some(value) = number(2) else {
                println!("{HELP}");
                return Ok(());
            };
            let command = match args.get(1).copied() {
                Some("main") => Command::SetMainGain(value),
                Some("speed") => Command::SetSpeedGain(value),
                Some("int") => Command::SetIntegralGain(value),
                _ => {
                    println!("{HELP}");
                    return Ok(());
                }
            };
            connection.command(axis, command).await?;
        }
        ("engage" | "free", _) => {
            let current = connection
                .execute_command(ReadParameter {
                    axis,
                    parameter: Parameter::Config,
                })
                .await?;
            let config = DriveConfig::from_value(current);
            let config = if name == "engage" {
                config.engaged()
            } else {
                config.disengaged()
            };
            connection
                .command(axis, Command::SetDriveConfig(config))
                .await?;
        }
        ("status", _) => {
            let (status, alarm) = connection.execute_command(ReadStatus { axis }).await?;
            println!("{status:?}, alarm: {alarm}");
        }
        ("read", _) => {
            let parameter = args
                .get(1)
                .and_then(|arg| u8::from_str_radix(arg.trim_start_matches("0x"), 16).ok())
                .and_then(Parameter::from_code);
            let Some(parameter) = parameter else {
                println!("Known parameters:");
                for parameter in Parameter::ALL {
                    println!("  {:#04x} {parameter}", parameter.code());
                }
                return Ok(());
            };
            let value = connection
                .execute_command(ReadParameter { axis, parameter })
                .await?;
            println!("{parameter}: {value}");
        }
        _ => println!("{HELP}"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), SerialError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let mut connection = SerialConnection::open_first(Duration::from_millis(100))?;
    println!("Connected to {}", connection.port_name());

    let mut editor = DefaultEditor::new().unwrap();
    let mut last_speed = None;

    loop {
        let line = match editor.readline("dmm> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                log::error!("{e}");
                break;
            }
        };
        if line.trim() == "quit" {
            break;
        }
        _ = editor.add_history_entry(line.as_str());

        if let Err(e) = run(&mut connection, &mut last_speed, &line).await {
            log::error!("{e}");
        }
    }

    Ok(())
}
