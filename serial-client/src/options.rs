//! Command line handling.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_BAUD: u32 = 9600;
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: usize = 1;

pub const USAGE: &str = "\
usage: serial-client --port <PORT> [--baud <RATE>] [--listen <ADDR>] [--max-conn <N>] [--record <FILE>]
       serial-client --list-ports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListPorts,
    Bridge(Options),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub port: String,
    pub baud: u32,
    pub listen: String,
    pub max_connections: usize,
    /// Also append every stamped line to this file.
    pub record: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    MissingPort,
    MissingValue(&'static str),
    InvalidValue { flag: &'static str, value: String },
    Unknown(String),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::MissingPort => write!(f, "no serial port given, use --port"),
            OptionsError::MissingValue(flag) => write!(f, "{} needs a value", flag),
            OptionsError::InvalidValue { flag, value } => {
                write!(f, "invalid value {:?} for {}", value, flag)
            }
            OptionsError::Unknown(arg) => write!(f, "unknown argument {:?}", arg),
        }
    }
}

impl std::error::Error for OptionsError {}

impl Command {
    /// Parse the arguments that follow the program name.
    pub fn parse<I>(args: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut port = None;
        let mut baud = DEFAULT_BAUD;
        let mut listen = DEFAULT_LISTEN.to_string();
        let mut max_connections = DEFAULT_MAX_CONNECTIONS;
        let mut record = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--list-ports" => return Ok(Command::ListPorts),
                "--port" => port = Some(value(&mut args, "--port")?),
                "--baud" => baud = number(&mut args, "--baud")?,
                "--listen" => listen = value(&mut args, "--listen")?,
                "--max-conn" => {
                    max_connections = number(&mut args, "--max-conn")?;
                    if max_connections == 0 {
                        return Err(OptionsError::InvalidValue {
                            flag: "--max-conn",
                            value: "0".into(),
                        });
                    }
                }
                "--record" => record = Some(PathBuf::from(value(&mut args, "--record")?)),
                _ => return Err(OptionsError::Unknown(arg)),
            }
        }

        Ok(Command::Bridge(Options {
            port: port.ok_or(OptionsError::MissingPort)?,
            baud,
            listen,
            max_connections,
            record,
        }))
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, OptionsError> {
    args.next().ok_or(OptionsError::MissingValue(flag))
}

fn number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, OptionsError> {
    let value = value(args, flag)?;
    value
        .parse()
        .map_err(|_| OptionsError::InvalidValue { flag, value })
}
