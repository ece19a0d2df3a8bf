//! In-memory device used in place of serial hardware
#![allow(dead_code)]

use gcodelink_communication::{ConnectionParams, LinkOpener, ReadWrite};
use gcodelink_core::{thread_safe, ConnectionError, ThreadSafe};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

/// One observed operation on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write(String),
    Read(String),
}

/// How the device answers a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Echo,
    Silent,
}

pub struct DeviceState {
    pub log: Vec<Op>,
    pub written: Vec<String>,
    pub reply: Reply,
    pub fail_write_at: Option<usize>,
    pub fail_read: bool,
    pub one_byte_reads: bool,
    pub reply_delay: Duration,
    pub opens: usize,
    pub drops: usize,
    inbound: Vec<u8>,
    outbox: VecDeque<u8>,
    outbound_line: Vec<u8>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            written: Vec::new(),
            reply: Reply::Ok,
            fail_write_at: None,
            fail_read: false,
            one_byte_reads: false,
            reply_delay: Duration::ZERO,
            opens: 0,
            drops: 0,
            inbound: Vec::new(),
            outbox: VecDeque::new(),
            outbound_line: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct MockDevice {
    pub state: ThreadSafe<DeviceState>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: thread_safe(DeviceState::default()),
        }
    }

    pub fn configure(&self, f: impl FnOnce(&mut DeviceState)) -> &Self {
        f(&mut self.state.lock());
        self
    }

    pub fn written(&self) -> Vec<String> {
        self.state.lock().written.clone()
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.lock().log.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    pub fn drops(&self) -> usize {
        self.state.lock().drops
    }

    pub fn opener(&self) -> MockOpener {
        MockOpener {
            device: self.clone(),
            fail_with: None,
        }
    }
}

pub struct MockOpener {
    device: MockDevice,
    fail_with: Option<ConnectionError>,
}

impl MockOpener {
    pub fn failing(device: &MockDevice, error: ConnectionError) -> Self {
        Self {
            device: device.clone(),
            fail_with: Some(error),
        }
    }
}

impl LinkOpener for MockOpener {
    fn open(&self, _params: &ConnectionParams) -> Result<Box<dyn ReadWrite>, ConnectionError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.device.state.lock().opens += 1;
        Ok(Box::new(MockLink {
            state: self.device.state.clone(),
        }))
    }
}

struct MockLink {
    state: ThreadSafe<DeviceState>,
}

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let delay = {
            let mut state = self.state.lock();
            if state.inbound.is_empty() && state.fail_write_at == Some(state.written.len()) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
            }
            state.inbound.extend_from_slice(buf);
            state.reply_delay
        };

        while let Some(line) = self.take_line() {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            let mut state = self.state.lock();
            state.log.push(Op::Write(line.clone()));
            let reply = match state.reply {
                Reply::Ok => Some("ok\n".to_string()),
                Reply::Echo => Some(format!("ok {}\r\n", line)),
                Reply::Silent => None,
            };
            if let Some(reply) = reply {
                state.outbox.extend(reply.bytes());
            }
            state.written.push(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl MockLink {
    fn take_line(&self) -> Option<String> {
        let mut state = self.state.lock();
        let pos = state.inbound.iter().position(|&b| b == b'\n')?;
        let bytes: Vec<u8> = state.inbound.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&bytes[..pos]).to_string())
    }
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.fail_read {
            return Err(io::Error::new(io::ErrorKind::Other, "read failed"));
        }
        if state.outbox.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        }

        let limit = if state.one_byte_reads { 1 } else { buf.len() };
        let mut n = 0;
        while n < limit {
            let Some(byte) = state.outbox.pop_front() else {
                break;
            };
            buf[n] = byte;
            n += 1;
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&state.outbound_line)
                    .trim_end()
                    .to_string();
                state.outbound_line.clear();
                state.log.push(Op::Read(line));
            } else {
                state.outbound_line.push(byte);
            }
        }
        Ok(n)
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.state.lock().drops += 1;
    }
}

pub fn params() -> ConnectionParams {
    ConnectionParams::new("/dev/ttyMOCK0").with_timeout_ms(50)
}
