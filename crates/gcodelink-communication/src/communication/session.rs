//! Exclusive device channel
//!
//! A [`ChannelSession`] is either closed or holds exactly one open link. All
//! access goes through one lock, so a transmit-then-read exchange can never
//! interleave with another exchange, an open, or a close.

use super::serial::SerialLinkOpener;
use super::{ConnectionParams, LinkOpener, ReadWrite};
use gcodelink_core::{
    AppEvent, ConnectionError, ConnectionEvent, ControllerError, DisconnectReason,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use std::time::Instant;

const READ_CHUNK_SIZE: usize = 256;

/// Device response to one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acknowledgment {
    /// A response line, trailing whitespace removed
    Response(String),
    /// Nothing arrived before the read timeout
    NoResponse,
}

impl Acknowledgment {
    /// Response text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Acknowledgment::Response(text) => Some(text),
            Acknowledgment::NoResponse => None,
        }
    }

    /// Whether the read timed out
    pub fn is_missing(&self) -> bool {
        matches!(self, Acknowledgment::NoResponse)
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acknowledgment::Response(text) => f.write_str(text),
            Acknowledgment::NoResponse => f.write_str("<no response>"),
        }
    }
}

struct OpenLink {
    link: Box<dyn ReadWrite>,
    params: ConnectionParams,
    // Bytes received past the last returned line
    pending: Vec<u8>,
}

/// Exclusive connection to the device
pub struct ChannelSession {
    opener: Box<dyn LinkOpener>,
    state: Mutex<Option<OpenLink>>,
}

impl Default for ChannelSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSession")
            .field("params", &self.params())
            .finish()
    }
}

impl ChannelSession {
    /// Create a closed session that opens real serial ports
    pub fn new() -> Self {
        Self::with_opener(SerialLinkOpener)
    }

    /// Create a closed session with a custom link opener
    pub fn with_opener(opener: impl LinkOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            state: Mutex::new(None),
        }
    }

    /// Open the channel
    ///
    /// An already-open link is closed first. On failure the session is left
    /// closed.
    pub fn open(&self, params: ConnectionParams) -> Result<(), ConnectionError> {
        params.validate()?;

        // Handlers may call back into the session, so events go out after
        // the lock is released.
        let mut events = Vec::with_capacity(3);
        let outcome = {
            let mut state = self.state.lock();
            if let Some(previous) = state.take() {
                tracing::info!("Reconnecting: closing {}", previous.params.port);
                events.push(ConnectionEvent::Disconnected {
                    port: previous.params.port,
                    reason: DisconnectReason::Reconnect,
                });
            }

            events.push(ConnectionEvent::Connecting {
                port: params.port.clone(),
            });
            match self.opener.open(&params) {
                Ok(link) => {
                    tracing::info!("Connected to {}", params);
                    events.push(ConnectionEvent::Connected {
                        port: params.port.clone(),
                        baud_rate: params.baud_rate,
                    });
                    *state = Some(OpenLink {
                        link,
                        params,
                        pending: Vec::new(),
                    });
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Failed to open {}: {}", params.port, e);
                    events.push(ConnectionEvent::ConnectionFailed {
                        port: params.port,
                        error: e.to_string(),
                    });
                    Err(e)
                }
            }
        };

        events.into_iter().for_each(publish);
        outcome
    }

    /// Close the channel; a no-op when already closed
    pub fn close(&self) {
        let closed = self.state.lock().take();
        if let Some(open) = closed {
            tracing::info!("Disconnected from {}", open.params.port);
            publish(ConnectionEvent::Disconnected {
                port: open.params.port,
                reason: DisconnectReason::UserRequested,
            });
        }
    }

    /// Whether a link is open
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Port name of the open link
    pub fn endpoint(&self) -> Option<String> {
        self.state.lock().as_ref().map(|open| open.params.port.clone())
    }

    /// Parameters of the open link
    pub fn params(&self) -> Option<ConnectionParams> {
        self.state.lock().as_ref().map(|open| open.params.clone())
    }

    /// Send one command and read its acknowledgment
    ///
    /// Writes `command` plus `\n`, flushes, then reads until a newline or the
    /// read timeout. The whole exchange holds the session lock. An I/O error
    /// on either side closes the session.
    pub fn transact(&self, command: &str) -> Result<Acknowledgment, ControllerError> {
        let mut state = self.state.lock();
        let open = state.as_mut().ok_or(ControllerError::NotConnected)?;

        match exchange(open, command) {
            Ok(ack) => {
                tracing::debug!("{} -> {}", command, ack);
                Ok(ack)
            }
            Err(error) => {
                let lost = state.take();
                drop(state);
                if let Some(lost) = lost {
                    tracing::warn!("Link to {} failed: {}", lost.params.port, error);
                    publish(ConnectionEvent::Disconnected {
                        port: lost.params.port,
                        reason: DisconnectReason::ConnectionLost,
                    });
                }
                Err(error)
            }
        }
    }
}

/// Write `command` and read its acknowledgment
///
/// A write error maps to `Transmit`, a read error to `ConnectionLost`.
fn exchange(open: &mut OpenLink, command: &str) -> Result<Acknowledgment, ControllerError> {
    open.link
        .write_all(command.as_bytes())
        .and_then(|_| open.link.write_all(b"\n"))
        .and_then(|_| open.link.flush())
        .map_err(|e| ControllerError::Transmit {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    let line = read_line(open).map_err(|e| ControllerError::ConnectionLost {
        reason: e.to_string(),
    })?;
    Ok(if line.is_empty() {
        Acknowledgment::NoResponse
    } else {
        Acknowledgment::Response(line)
    })
}

/// Read one line, bounded by the link's read timeout
///
/// Returns the text before the newline with trailing whitespace removed. On
/// timeout or end of data, whatever arrived so far is returned.
fn read_line(open: &mut OpenLink) -> io::Result<String> {
    let deadline = Instant::now() + open.params.timeout();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        if let Some(pos) = open.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = open.pending.drain(..=pos).collect();
            return Ok(decode(&line));
        }
        if Instant::now() >= deadline {
            break;
        }

        match open.link.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => open.pending.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                break
            }
            Err(e) => return Err(e),
        }
    }

    let rest = std::mem::take(&mut open.pending);
    Ok(decode(&rest))
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

fn publish(event: ConnectionEvent) {
    gcodelink_core::emit!(AppEvent::Connection(event));
}
