//! # gcodelink Communication
//!
//! Serial channel session and command streaming for gcodelink.
//! A [`ChannelSession`] owns the one open link to the device; the
//! [`CommandStreamer`] pushes a program through it one acknowledged line at a
//! time, either blocking or on a tokio blocking worker.

pub mod communication;

pub use communication::{
    serial::{list_ports, SerialLinkOpener, SerialPortInfo},
    session::{Acknowledgment, ChannelSession},
    streamer::{
        CommandStreamer, Exchange, StatusSink, StreamHandle, StreamOptions, StreamProgress,
        TransferResult, TransferStatus,
    },
    ConnectionParams, LinkOpener, ReadWrite, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
