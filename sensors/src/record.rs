//! The line reported for each successful polling cycle.

use core::fmt::{self, Write};
use core::str::FromStr;

use heapless::String;

use crate::ms5837::Measurement;

/// Enough room for three `f32` fields at their widest plus the labels.
pub const LINE_CAPACITY: usize = 192;

const LABELS: [&str; 3] = ["MS5837_Temp", "Pressure", "TSYS01_Temp"];

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    pub ms5837_temperature: f32,
    pub pressure: f32,
    pub tsys01_temperature: f32,
}

impl Record {
    pub fn new(ms5837: Measurement, tsys01_temperature: f32) -> Self {
        Self {
            ms5837_temperature: ms5837.temperature,
            pressure: ms5837.pressure,
            tsys01_temperature,
        }
    }

    /// Render the record as a CRLF terminated line.
    pub fn to_line(&self) -> Result<String<LINE_CAPACITY>, fmt::Error> {
        let mut line = String::new();
        write!(line, "{}\r\n", self)?;
        Ok(line)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MS5837_Temp:{:.2},Pressure:{:.2},TSYS01_Temp:{:.2}",
            self.ms5837_temperature, self.pressure, self.tsys01_temperature
        )
    }
}

/// Why a line could not be read back as a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseRecordError {
    /// The named field is missing or out of place.
    Field(&'static str),
    /// The named field does not hold a number.
    Value(&'static str),
    /// Something follows the last field.
    Trailing,
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::Field(label) => write!(f, "missing field {}", label),
            ParseRecordError::Value(label) => write!(f, "field {} is not a number", label),
            ParseRecordError::Trailing => f.write_str("unexpected data after the last field"),
        }
    }
}

/// Parses the text written by [`Record::to_line`], with or without the line ending.
impl FromStr for Record {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.trim_end_matches(&['\r', '\n'][..]).split(',');
        let mut values = [0f32; 3];
        for (label, value) in LABELS.into_iter().zip(values.iter_mut()) {
            let text = fields
                .next()
                .and_then(|field| field.strip_prefix(label))
                .and_then(|rest| rest.strip_prefix(':'))
                .ok_or(ParseRecordError::Field(label))?;
            *value = text
                .trim()
                .parse()
                .map_err(|_| ParseRecordError::Value(label))?;
        }
        if fields.next().is_some() {
            return Err(ParseRecordError::Trailing);
        }

        let [ms5837_temperature, pressure, tsys01_temperature] = values;
        Ok(Self {
            ms5837_temperature,
            pressure,
            tsys01_temperature,
        })
    }
}
