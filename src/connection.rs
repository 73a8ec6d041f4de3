//! Transport plumbing: line framing over an accepted byte stream.
//!
//! The listener that accepts connections is the caller's; this module takes
//! the accepted stream and speaks the line discipline — one handshake block,
//! then strictly alternating command/reply lines.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tracing::trace;

use crate::constants::{LINE_TERMINATOR, MAX_ENVELOPE_SIZE, MAX_LINE_LENGTH};
use crate::error::{AgiError, AgiResult};

/// Byte stream a call can be served on. Blanket-implemented; a
/// `tokio::net::TcpStream` qualifies, and so does `tokio::io::duplex` in tests.
pub trait AgiStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AgiStream for T {}

/// Framed line transport for one call.
///
/// Exclusively owned by one session for the call's lifetime; nothing else may
/// write to the underlying stream.
pub struct AgiConnection {
    reader: BufReader<ReadHalf<Box<dyn AgiStream>>>,
    writer: WriteHalf<Box<dyn AgiStream>>,
}

impl AgiConnection {
    /// Take ownership of an accepted stream.
    pub fn new(stream: impl AgiStream + 'static) -> Self {
        let (read_half, write_half) = tokio::io::split(Box::new(stream) as Box<dyn AgiStream>);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Read the handshake block: `name: value` lines up to the first blank line.
    ///
    /// Returned as raw text for [`AgiRequest::parse`](crate::AgiRequest::parse);
    /// the blank terminator line is not included.
    pub async fn read_envelope(&mut self) -> AgiResult<String> {
        let mut block = String::new();

        loop {
            let line = self
                .recv_line()
                .await?
                .ok_or(AgiError::ConnectionClosed)?;

            if line.is_empty() {
                break;
            }

            block.push_str(&line);
            block.push('\n');

            if block.len() > MAX_ENVELOPE_SIZE {
                return Err(AgiError::protocol_error(format!(
                    "handshake block exceeds {} bytes",
                    MAX_ENVELOPE_SIZE
                )));
            }
        }

        Ok(block)
    }

    /// Read one raw line, stripped of its terminator. `None` on EOF.
    pub async fn recv_line(&mut self) -> AgiResult<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            trace!("[RECV] EOF on call socket");
            return Ok(None);
        }

        if line.len() > MAX_LINE_LENGTH {
            return Err(AgiError::protocol_error(format!(
                "line exceeds {} bytes",
                MAX_LINE_LENGTH
            )));
        }

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }

        trace!(line = %line, "[RECV] line");
        Ok(Some(line))
    }

    /// Write one command line verbatim, append the terminator, flush.
    ///
    /// Written as a single buffer so the peer never observes a split line.
    pub async fn send_line(&mut self, line: &str) -> AgiResult<()> {
        trace!(line = %line, "[SEND] line");
        let framed = format!("{}{}", line, LINE_TERMINATOR);
        self.writer.write_all(framed.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl std::fmt::Debug for AgiConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgiConnection").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn reads_envelope_up_to_blank_line() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = AgiConnection::new(client);

        tokio::io::AsyncWriteExt::write_all(
            &mut server,
            b"agi_channel: SIP/1000-1\nagi_extension: 100\n\n200 result=1\n",
        )
        .await
        .unwrap();

        let envelope = conn.read_envelope().await.unwrap();
        assert_eq!(envelope, "agi_channel: SIP/1000-1\nagi_extension: 100\n");

        // The first reply line is still queued after the envelope.
        let line = conn.recv_line().await.unwrap();
        assert_eq!(line.as_deref(), Some("200 result=1"));
    }

    #[tokio::test]
    async fn envelope_eof_is_connection_closed() {
        let (client, server) = tokio::io::duplex(4096);
        drop(server);
        let mut conn = AgiConnection::new(client);

        assert!(matches!(
            conn.read_envelope().await,
            Err(AgiError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn recv_line_strips_crlf() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = AgiConnection::new(client);

        tokio::io::AsyncWriteExt::write_all(&mut server, b"200 result=1\r\n")
            .await
            .unwrap();

        let line = conn.recv_line().await.unwrap();
        assert_eq!(line.as_deref(), Some("200 result=1"));
    }

    #[tokio::test]
    async fn send_line_appends_terminator() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = AgiConnection::new(client);

        conn.send_line("ANSWER").await.unwrap();

        let mut buf = [0u8; 16];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ANSWER\n");
    }

    #[tokio::test]
    async fn oversized_line_is_rejected() {
        let (client, mut server) = tokio::io::duplex(MAX_LINE_LENGTH * 2);
        let mut conn = AgiConnection::new(client);

        let big = vec![b'x'; MAX_LINE_LENGTH + 1];
        tokio::io::AsyncWriteExt::write_all(&mut server, &big)
            .await
            .unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut server, b"\n")
            .await
            .unwrap();

        assert!(matches!(
            conn.recv_line().await,
            Err(AgiError::Protocol { .. })
        ));
    }
}
