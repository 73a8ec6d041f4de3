//! Command serialization: exact outbound wire strings for each AGI operation.

use crate::error::{AgiError, AgiResult};
use std::fmt;

/// Validate that a user-provided string contains no newline characters.
///
/// AGI commands are line-delimited; embedded newlines would allow injection
/// of arbitrary protocol commands.
pub(crate) fn validate_no_newlines(s: &str, context: &str) -> AgiResult<()> {
    if s.contains('\n') || s.contains('\r') {
        return Err(AgiError::Protocol {
            message: format!("{} must not contain newlines", context),
        });
    }
    Ok(())
}

/// Quoting style for the `GET OPTION` command.
///
/// The reference wire template carries a stray quote
/// (`GET OPTION "<file>" <esc>" <timeout>`). [`Faithful`](Self::Faithful)
/// reproduces it byte for byte for compatibility with deployments that parse
/// around it; [`Corrected`](Self::Corrected) emits the properly quoted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetOptionStyle {
    /// Reproduce the reference template, stray quote included.
    #[default]
    Faithful,
    /// Emit `GET OPTION "<file>" "<esc>" <timeout>`.
    Corrected,
}

/// One AGI operation, ready to serialize.
///
/// Fields hold the final wire arguments; optional-argument defaulting happens
/// in the [`AgiSession`](crate::AgiSession) methods that build these.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgiCommand {
    /// Answer the channel
    Answer,
    /// Query channel status (empty name = current channel)
    ChannelStatus { name: String },
    /// Run a dialplan application
    Exec { app: String, params: String },
    /// Play a file and collect DTMF digits
    GetData {
        file: String,
        timeout: String,
        max_digits: String,
    },
    /// Read a variable with full dialplan evaluation
    GetFullVariable { variable: String, channel: String },
    /// Play a file and wait for one digit
    GetOption {
        file: String,
        escape_digits: String,
        timeout: String,
        style: GetOptionStyle,
    },
    /// Read a channel variable
    GetVariable { variable: String },
    /// No operation
    Noop,
    /// Record channel audio to a file
    RecordFile {
        file: String,
        format: String,
        escape_digits: String,
        timeout: i64,
        silence_seconds: Option<u32>,
        beep: bool,
    },
    /// Play a file, interruptible by escape digits
    StreamFile { file: String, escape_digits: String },
    /// Hang up the channel
    Hangup,
    /// Set the dialplan context to continue at
    SetContext { context: String },
    /// Set the dialplan extension to continue at
    SetExtension { extension: String },
    /// Set the dialplan priority to continue at
    SetPriority { priority: String },
    /// Set a channel variable
    SetVariable { variable: String, value: String },
}

impl AgiCommand {
    /// Validate all user-supplied fields, then build the exact command text.
    ///
    /// The templates (spacing, quoting, defaults) are part of the protocol
    /// contract and are reproduced exactly; the line terminator is added by
    /// the transport when the command is written.
    pub fn to_wire_format(&self) -> AgiResult<String> {
        match self {
            AgiCommand::Answer => Ok("ANSWER".to_string()),
            AgiCommand::ChannelStatus { name } => {
                validate_no_newlines(name, "channel name")?;
                Ok(format!("CHANNEL STATUS {}", name))
            }
            AgiCommand::Exec { app, params } => {
                validate_no_newlines(app, "application name")?;
                validate_no_newlines(params, "application parameters")?;
                Ok(format!("EXEC {} {}", app, params))
            }
            AgiCommand::GetData {
                file,
                timeout,
                max_digits,
            } => {
                validate_no_newlines(file, "file")?;
                validate_no_newlines(timeout, "timeout")?;
                validate_no_newlines(max_digits, "max digits")?;
                Ok(format!("GET DATA \"{}\" {} {}", file, timeout, max_digits))
            }
            AgiCommand::GetFullVariable { variable, channel } => {
                validate_no_newlines(variable, "variable name")?;
                validate_no_newlines(channel, "channel name")?;
                Ok(format!("GET FULL VARIABLE {} {}", variable, channel))
            }
            AgiCommand::GetOption {
                file,
                escape_digits,
                timeout,
                style,
            } => {
                validate_no_newlines(file, "file")?;
                validate_no_newlines(escape_digits, "escape digits")?;
                validate_no_newlines(timeout, "timeout")?;
                Ok(match style {
                    GetOptionStyle::Faithful => {
                        format!("GET OPTION \"{}\" {}\" {}", file, escape_digits, timeout)
                    }
                    GetOptionStyle::Corrected => {
                        format!("GET OPTION \"{}\" \"{}\" {}", file, escape_digits, timeout)
                    }
                })
            }
            AgiCommand::GetVariable { variable } => {
                validate_no_newlines(variable, "variable name")?;
                Ok(format!("GET VARIABLE \"{}\"", variable))
            }
            AgiCommand::Noop => Ok("NOOP".to_string()),
            AgiCommand::RecordFile {
                file,
                format,
                escape_digits,
                timeout,
                silence_seconds,
                beep,
            } => {
                validate_no_newlines(file, "file")?;
                validate_no_newlines(format, "format")?;
                validate_no_newlines(escape_digits, "escape digits")?;
                let beep = if *beep { "BEEP" } else { "" };
                let silence = silence_seconds
                    .map(|s| format!("s={}", s))
                    .unwrap_or_default();
                Ok(format!(
                    "RECORD FILE \"{}\" \"{}\" \"{}\" {} {} {}",
                    file, format, escape_digits, timeout, beep, silence
                ))
            }
            AgiCommand::StreamFile {
                file,
                escape_digits,
            } => {
                validate_no_newlines(file, "file")?;
                validate_no_newlines(escape_digits, "escape digits")?;
                Ok(format!("STREAM FILE \"{}\" \"{}\"", file, escape_digits))
            }
            AgiCommand::Hangup => Ok("HANGUP".to_string()),
            AgiCommand::SetContext { context } => {
                validate_no_newlines(context, "context")?;
                Ok(format!("SET CONTEXT {}", context))
            }
            AgiCommand::SetExtension { extension } => {
                validate_no_newlines(extension, "extension")?;
                Ok(format!("SET EXTENSION {}", extension))
            }
            AgiCommand::SetPriority { priority } => {
                validate_no_newlines(priority, "priority")?;
                Ok(format!("SET PRIORITY {}", priority))
            }
            AgiCommand::SetVariable { variable, value } => {
                validate_no_newlines(variable, "variable name")?;
                validate_no_newlines(value, "variable value")?;
                Ok(format!("SET VARIABLE {} {}", variable, value))
            }
        }
    }
}

impl fmt::Display for AgiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_wire_format() {
            Ok(wire) => f.write_str(&wire),
            Err(_) => f.write_str("<invalid command>"),
        }
    }
}
