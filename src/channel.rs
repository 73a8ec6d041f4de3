//! Channel-related data types extracted from AGI replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Channel state as reported by `CHANNEL STATUS` — carried in the `result`
/// attribute of the reply as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ChannelStatus {
    DownAvailable = 0,
    DownReserved = 1,
    OffHook = 2,
    DigitsDialed = 3,
    LineRinging = 4,
    RemoteEndRinging = 5,
    LineUp = 6,
    LineBusy = 7,
}

impl ChannelStatus {
    /// Parse from the `result` integer of a `CHANNEL STATUS` reply.
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            0 => Some(Self::DownAvailable),
            1 => Some(Self::DownReserved),
            2 => Some(Self::OffHook),
            3 => Some(Self::DigitsDialed),
            4 => Some(Self::LineRinging),
            5 => Some(Self::RemoteEndRinging),
            6 => Some(Self::LineUp),
            7 => Some(Self::LineBusy),
            _ => None,
        }
    }

    /// Integer discriminant matching the protocol's status codes.
    pub fn as_number(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DownAvailable => "DOWN_AVAILABLE",
            Self::DownReserved => "DOWN_RESERVED",
            Self::OffHook => "OFF_HOOK",
            Self::DigitsDialed => "DIGITS_DIALED",
            Self::LineRinging => "LINE_RINGING",
            Self::RemoteEndRinging => "REMOTE_END_RINGING",
            Self::LineUp => "LINE_UP",
            Self::LineBusy => "LINE_BUSY",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an invalid channel status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChannelStatusError(pub String);

impl fmt::Display for ParseChannelStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel status: {}", self.0)
    }
}

impl std::error::Error for ParseChannelStatusError {}

impl FromStr for ChannelStatus {
    type Err = ParseChannelStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DOWN_AVAILABLE" => Ok(Self::DownAvailable),
            "DOWN_RESERVED" => Ok(Self::DownReserved),
            "OFF_HOOK" => Ok(Self::OffHook),
            "DIGITS_DIALED" => Ok(Self::DigitsDialed),
            "LINE_RINGING" => Ok(Self::LineRinging),
            "REMOTE_END_RINGING" => Ok(Self::RemoteEndRinging),
            "LINE_UP" => Ok(Self::LineUp),
            "LINE_BUSY" => Ok(Self::LineBusy),
            _ => Err(ParseChannelStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_number_round_trip() {
        for n in 0..=7i64 {
            let status = ChannelStatus::from_number(n).unwrap();
            assert_eq!(i64::from(status.as_number()), n);
        }
        assert_eq!(ChannelStatus::from_number(8), None);
        assert_eq!(ChannelStatus::from_number(-1), None);
    }

    #[test]
    fn display_and_from_str() {
        assert_eq!(ChannelStatus::LineUp.to_string(), "LINE_UP");
        assert_eq!("line_up".parse::<ChannelStatus>(), Ok(ChannelStatus::LineUp));
        assert_eq!(
            "REMOTE_END_RINGING".parse::<ChannelStatus>(),
            Ok(ChannelStatus::RemoteEndRinging)
        );
        assert!("RINGING_HARD".parse::<ChannelStatus>().is_err());
    }
}
