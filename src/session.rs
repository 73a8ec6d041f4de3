//! Per-call session engine: state machine, command/reply rendezvous, and the
//! typed command API.

use tracing::{debug, info, warn};

use crate::channel::ChannelStatus;
use crate::command::{AgiCommand, GetOptionStyle};
use crate::connection::{AgiConnection, AgiStream};
use crate::error::{AgiError, AgiResult};
use crate::reply::{AgiReply, ReplyLine};
use crate::request::AgiRequest;

/// Session protocol state.
///
/// `Terminated` is terminal; it has no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for the next command.
    Idle,
    /// A command is outstanding; its reply has not arrived.
    AwaitingReply,
    /// Hangup, EOF, or a fatal transport error ended the session.
    Terminated,
}

/// Reply decode strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// A reply with no parsable code still resolves the command (the record
    /// carries `code() == None`). Matches the reference behavior.
    #[default]
    Forgiving,
    /// A reply with no parsable code fails the command with
    /// [`AgiError::ReplyDecode`].
    Strict,
}

/// Options fixed at session construction.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Reply decode strictness. Default: forgiving.
    pub decode_mode: DecodeMode,
    /// `GET OPTION` quoting compatibility toggle. Default: faithful.
    pub get_option_style: GetOptionStyle,
}

/// One AGI call: the call context, the exclusively-owned transport, and the
/// command/reply state machine.
///
/// Commands are strictly serialized — [`send_command`](Self::send_command) is
/// the single suspension point, and a new command cannot be issued until the
/// previous one resolved. There is no pipelining, so reply N always
/// corresponds to command N.
pub struct AgiSession {
    request: AgiRequest,
    connection: AgiConnection,
    state: SessionState,
    commands_sent: u64,
    options: SessionOptions,
}

impl std::fmt::Debug for AgiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgiSession")
            .field("channel", &self.request.channel())
            .field("state", &self.state)
            .field("commands_sent", &self.commands_sent)
            .finish()
    }
}

impl AgiSession {
    /// Read the handshake block from an accepted stream and build the session.
    pub async fn negotiate(stream: impl AgiStream + 'static) -> AgiResult<Self> {
        Self::negotiate_with_options(stream, SessionOptions::default()).await
    }

    /// Read the handshake block and build the session with explicit options.
    pub async fn negotiate_with_options(
        stream: impl AgiStream + 'static,
        options: SessionOptions,
    ) -> AgiResult<Self> {
        let mut connection = AgiConnection::new(stream);
        let envelope = connection.read_envelope().await?;
        let request = AgiRequest::parse(&envelope);

        info!(
            channel = request.channel().unwrap_or("?"),
            script = request.network_script().unwrap_or(""),
            "AGI call accepted"
        );

        Ok(Self {
            request,
            connection,
            state: SessionState::Idle,
            commands_sent: 0,
            options,
        })
    }

    /// The call context from the handshake.
    pub fn request(&self) -> &AgiRequest {
        &self.request
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of commands sent so far on this session.
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    /// Send one command and suspend until its reply arrives.
    ///
    /// Fails fast with [`AgiError::CommandPending`] if a command is already
    /// outstanding (nothing is written in that case) and with
    /// [`AgiError::SessionTerminated`] after the session ended. The `hangup`
    /// sentinel fails the command with [`AgiError::Hangup`] and terminates
    /// the session. No timeout is imposed here; if the switch never replies,
    /// the call hangs with it.
    pub async fn send_command(&mut self, command: AgiCommand) -> AgiResult<AgiReply> {
        let text = command.to_wire_format()?;
        self.exchange(text).await
    }

    /// Send a raw command line for AGI verbs without a typed constructor.
    ///
    /// The text is validated against newline injection but otherwise written
    /// verbatim.
    pub async fn send_raw(&mut self, text: &str) -> AgiResult<AgiReply> {
        crate::command::validate_no_newlines(text, "raw command")?;
        self.exchange(text.to_string()).await
    }

    /// One full command/reply cycle. The single place the state machine moves.
    async fn exchange(&mut self, text: String) -> AgiResult<AgiReply> {
        match self.state {
            SessionState::Terminated => return Err(AgiError::SessionTerminated),
            SessionState::AwaitingReply => return Err(AgiError::CommandPending),
            SessionState::Idle => {}
        }

        self.commands_sent += 1;
        self.state = SessionState::AwaitingReply;
        debug!(seq = self.commands_sent, command = %text, "sending command");

        if let Err(e) = self.connection.send_line(&text).await {
            self.state = SessionState::Terminated;
            return Err(e);
        }

        let line = match self.connection.recv_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.state = SessionState::Terminated;
                return Err(AgiError::ConnectionClosed);
            }
            Err(e) => {
                self.state = SessionState::Terminated;
                return Err(e);
            }
        };

        match ReplyLine::decode(&line) {
            ReplyLine::Hangup => {
                info!(channel = self.request.channel().unwrap_or("?"), "channel hung up");
                self.state = SessionState::Terminated;
                Err(AgiError::Hangup)
            }
            ReplyLine::Reply(reply) => {
                if reply.code().is_none() {
                    warn!(line = %reply.raw(), "reply has no numeric code");
                    if self.options.decode_mode == DecodeMode::Strict {
                        // The line was consumed, so correlation is intact and
                        // the session stays usable.
                        self.state = SessionState::Idle;
                        return Err(AgiError::ReplyDecode {
                            line: reply.raw().to_string(),
                        });
                    }
                }
                debug!(seq = self.commands_sent, reply = %reply.raw(), "reply");
                self.state = SessionState::Idle;
                Ok(reply)
            }
        }
    }

    /// `ANSWER` — answer the channel. Resolves to the numeric `result`
    /// attribute, `-1` if absent.
    pub async fn answer(&mut self) -> AgiResult<i64> {
        let reply = self.send_command(AgiCommand::Answer).await?;
        Ok(reply.result_code())
    }

    /// `CHANNEL STATUS <name>` — query channel state. Pass `None` for the
    /// current channel. Resolves to the numeric `result` attribute, `-1` if
    /// absent; interpret with [`ChannelStatus::from_number`].
    pub async fn channel_status(&mut self, name: Option<&str>) -> AgiResult<i64> {
        let reply = self
            .send_command(AgiCommand::ChannelStatus {
                name: name.unwrap_or("").to_string(),
            })
            .await?;
        Ok(reply.result_code())
    }

    /// [`channel_status`](Self::channel_status) narrowed to the typed enum.
    /// `None` when the switch reported a value outside the known range.
    pub async fn channel_status_typed(
        &mut self,
        name: Option<&str>,
    ) -> AgiResult<Option<ChannelStatus>> {
        let code = self.channel_status(name).await?;
        Ok(ChannelStatus::from_number(code))
    }

    /// `EXEC <app> <params>` — run a dialplan application.
    pub async fn exec(&mut self, app: &str, params: Option<&str>) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::Exec {
            app: app.to_string(),
            params: params.unwrap_or("").to_string(),
        })
        .await
    }

    /// `GET DATA "<file>" <timeout> <maxDigits>` — play a prompt and collect
    /// digits. Resolves to the raw `result` attribute.
    pub async fn get_data(
        &mut self,
        file: &str,
        timeout: Option<u32>,
        max_digits: Option<u32>,
    ) -> AgiResult<Option<String>> {
        let reply = self
            .send_command(AgiCommand::GetData {
                file: file.to_string(),
                timeout: timeout.map(|t| t.to_string()).unwrap_or_default(),
                max_digits: max_digits.map(|m| m.to_string()).unwrap_or_default(),
            })
            .await?;
        Ok(reply.result().map(|s| s.to_string()))
    }

    /// `GET FULL VARIABLE <var> <chan>` — evaluate a variable, optionally on
    /// another channel. Resolves to the extra payload, `None` if absent.
    pub async fn get_full_variable(
        &mut self,
        variable: &str,
        channel: Option<&str>,
    ) -> AgiResult<Option<String>> {
        let reply = self
            .send_command(AgiCommand::GetFullVariable {
                variable: variable.to_string(),
                channel: channel.unwrap_or("").to_string(),
            })
            .await?;
        Ok(reply.extra().map(|s| s.to_string()))
    }

    /// `GET OPTION "<file>" ...` — play a prompt and wait for one digit.
    /// Uses the quoting style from [`SessionOptions`].
    pub async fn get_option(
        &mut self,
        file: &str,
        escape_digits: Option<&str>,
        timeout: Option<u32>,
    ) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::GetOption {
            file: file.to_string(),
            escape_digits: escape_digits.unwrap_or("").to_string(),
            timeout: timeout.map(|t| t.to_string()).unwrap_or_default(),
            style: self.options.get_option_style,
        })
        .await
    }

    /// `GET VARIABLE "<var>"` — read a channel variable. Resolves to the
    /// extra payload, `None` if the variable is unset.
    pub async fn get_variable(&mut self, variable: &str) -> AgiResult<Option<String>> {
        let reply = self
            .send_command(AgiCommand::GetVariable {
                variable: variable.to_string(),
            })
            .await?;
        Ok(reply.extra().map(|s| s.to_string()))
    }

    /// `NOOP`.
    pub async fn noop(&mut self) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::Noop).await
    }

    /// `RECORD FILE ...` — record channel audio. Defaults match the protocol
    /// contract: format `wav`, no escape digits, no timeout (`-1`), no
    /// silence detection, no beep.
    pub async fn record_file(
        &mut self,
        file: &str,
        format: Option<&str>,
        escape_digits: Option<&str>,
        timeout: Option<i64>,
        silence_seconds: Option<u32>,
        beep: bool,
    ) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::RecordFile {
            file: file.to_string(),
            format: format.filter(|f| !f.is_empty()).unwrap_or("wav").to_string(),
            escape_digits: escape_digits.unwrap_or("").to_string(),
            timeout: timeout.unwrap_or(-1),
            silence_seconds,
            beep,
        })
        .await
    }

    /// `STREAM FILE "<file>" "<escapeDigits>"` — play a sound file.
    pub async fn stream_file(
        &mut self,
        file: &str,
        escape_digits: Option<&str>,
    ) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::StreamFile {
            file: file.to_string(),
            escape_digits: escape_digits.unwrap_or("").to_string(),
        })
        .await
    }

    /// `HANGUP` — ask the switch to hang the channel up. The switch still
    /// sends a normal reply; the subsequent teardown arrives as the sentinel.
    pub async fn hangup(&mut self) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::Hangup).await
    }

    /// `SET CONTEXT <ctx>`.
    pub async fn set_context(&mut self, context: &str) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::SetContext {
            context: context.to_string(),
        })
        .await
    }

    /// `SET EXTENSION <ext>`.
    pub async fn set_extension(&mut self, extension: &str) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::SetExtension {
            extension: extension.to_string(),
        })
        .await
    }

    /// `SET PRIORITY <p>`.
    pub async fn set_priority(&mut self, priority: &str) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::SetPriority {
            priority: priority.to_string(),
        })
        .await
    }

    /// `SET VARIABLE <var> <val>`.
    pub async fn set_variable(&mut self, variable: &str, value: &str) -> AgiResult<AgiReply> {
        self.send_command(AgiCommand::SetVariable {
            variable: variable.to_string(),
            value: value.to_string(),
        })
        .await
    }

    /// Point the dialplan at `context`/`extension`/`priority` and let the call
    /// continue there after the script returns.
    ///
    /// `extension` defaults to the call's original extension, `priority` to 1.
    /// The three underlying sets are issued strictly in order context →
    /// extension → priority; only one command may be outstanding at a time,
    /// so they cannot be batched. Succeeds only if all three succeed.
    pub async fn continue_at(
        &mut self,
        context: &str,
        extension: Option<&str>,
        priority: Option<u32>,
    ) -> AgiResult<()> {
        let extension = match extension {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => self.request.extension().unwrap_or("").to_string(),
        };
        let priority = priority.filter(|p| *p != 0).unwrap_or(1);

        self.set_context(context).await?;
        self.set_extension(&extension).await?;
        self.set_priority(&priority.to_string()).await?;
        Ok(())
    }
}
