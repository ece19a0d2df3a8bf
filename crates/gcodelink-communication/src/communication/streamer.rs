//! Command streaming
//!
//! Sends a program through a [`ChannelSession`] one command at a time,
//! waiting for each acknowledgment before the next write. The first failed
//! exchange ends the job; nothing is retried.

use super::session::{Acknowledgment, ChannelSession};
use gcodelink_core::{AppEvent, ControllerError, EventBus, PrinterStatus, StreamEvent};
use gcodelink_visualizer::CanonicalCommand;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One command and the device's answer to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Zero-based position in the program
    pub index: usize,
    /// Command text as sent, without terminator
    pub command: String,
    /// What came back
    pub acknowledgment: Acknowledgment,
}

/// How a job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// Every command was sent and answered
    Completed,
    /// The exchange for command `index` failed
    Aborted {
        /// Index of the command that failed
        index: usize,
        /// The failure
        error: ControllerError,
    },
    /// The session was closed before the job started
    NotConnected,
}

/// Outcome of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Completed exchanges in send order
    pub exchanges: Vec<Exchange>,
    /// How the job ended
    pub status: TransferStatus,
    /// Wall time spent streaming
    pub duration: Duration,
}

impl TransferResult {
    fn not_connected() -> Self {
        Self {
            exchanges: Vec::new(),
            status: TransferStatus::NotConnected,
            duration: Duration::ZERO,
        }
    }

    /// Whether every command was sent
    pub fn is_complete(&self) -> bool {
        self.status == TransferStatus::Completed
    }

    /// Number of commands sent and answered
    pub fn sent(&self) -> usize {
        self.exchanges.len()
    }

    /// Index of the failed command, if the job aborted
    pub fn aborted_index(&self) -> Option<usize> {
        match self.status {
            TransferStatus::Aborted { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Exchanges whose read timed out
    pub fn missing_acks(&self) -> usize {
        self.exchanges
            .iter()
            .filter(|e| e.acknowledgment.is_missing())
            .count()
    }
}

/// Streaming behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Abort with `ResponseTimeout` when a command gets no response
    pub halt_on_missing_ack: bool,
    /// Log a progress line every this many commands (0 disables)
    pub progress_log_interval: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            halt_on_missing_ack: false,
            progress_log_interval: 50,
        }
    }
}

/// Progress snapshot published after every exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamProgress {
    /// Commands answered so far
    pub completed: usize,
    /// Commands in the job
    pub total: usize,
    /// Whether the session was open when the snapshot was taken
    pub connected: bool,
    /// Set once the job has ended, however it ended
    pub finished: bool,
}

impl StreamProgress {
    /// Progress as a printer status record
    pub fn status(&self) -> PrinterStatus {
        let mut status = PrinterStatus::printing(self.completed, self.total);
        status.connected = self.connected;
        status.printing &= self.connected && !self.finished;
        status
    }
}

/// Receives status while a job runs
pub trait StatusSink: Send + Sync {
    /// Called once before the first command
    fn started(&self, _total: usize) {}

    /// Called after every exchange
    fn report(&self, status: PrinterStatus);

    /// Called once with the outcome
    fn finished(&self, _result: &TransferResult) {}
}

impl<S: StatusSink + ?Sized> StatusSink for &S {
    fn started(&self, total: usize) {
        (**self).started(total)
    }

    fn report(&self, status: PrinterStatus) {
        (**self).report(status)
    }

    fn finished(&self, result: &TransferResult) {
        (**self).finished(result)
    }
}

impl StatusSink for EventBus {
    fn started(&self, total: usize) {
        self.publish(AppEvent::Stream(StreamEvent::Started { total }));
    }

    fn report(&self, status: PrinterStatus) {
        self.publish(AppEvent::Stream(StreamEvent::Progress(status)));
    }

    fn finished(&self, result: &TransferResult) {
        let event = match &result.status {
            TransferStatus::Completed => StreamEvent::Finished {
                sent: result.sent(),
                duration: result.duration,
            },
            TransferStatus::Aborted { index, error } => StreamEvent::Aborted {
                index: *index,
                reason: error.to_string(),
            },
            TransferStatus::NotConnected => StreamEvent::NotConnected,
        };
        self.publish(AppEvent::Stream(event));
    }
}

/// Handle to a job running on a blocking worker
pub struct StreamHandle {
    join: JoinHandle<TransferResult>,
    progress: watch::Receiver<StreamProgress>,
}

impl StreamHandle {
    /// Receiver that sees a new value after every exchange
    pub fn progress(&self) -> watch::Receiver<StreamProgress> {
        self.progress.clone()
    }

    /// Wait for the job to end
    pub async fn wait(self) -> gcodelink_core::Result<TransferResult> {
        self.join
            .await
            .map_err(|e| gcodelink_core::Error::other(format!("stream task failed: {}", e)))
    }
}

/// Streams programs through a session
#[derive(Clone, Default)]
pub struct CommandStreamer {
    options: StreamOptions,
    sink: Option<Arc<dyn StatusSink>>,
}

impl CommandStreamer {
    /// Create a streamer with default options and no sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a streamer with the given options
    pub fn with_options(options: StreamOptions) -> Self {
        Self {
            options,
            sink: None,
        }
    }

    /// Report status into `sink`
    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Streaming options
    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Stream `commands` on the calling thread
    pub fn stream(&self, session: &ChannelSession, commands: &[CanonicalCommand]) -> TransferResult {
        self.run(session, commands, None)
    }

    /// Stream `commands` on a tokio blocking worker
    ///
    /// Must be called from within a tokio runtime. Closing `session` from
    /// elsewhere aborts the job at the next command.
    pub fn spawn(self, session: Arc<ChannelSession>, commands: Vec<CanonicalCommand>) -> StreamHandle {
        let (tx, rx) = watch::channel(StreamProgress {
            completed: 0,
            total: commands.len(),
            connected: session.is_open(),
            finished: false,
        });
        let join = tokio::task::spawn_blocking(move || self.run(&session, &commands, Some(&tx)));
        StreamHandle { join, progress: rx }
    }

    fn run(
        &self,
        session: &ChannelSession,
        commands: &[CanonicalCommand],
        progress: Option<&watch::Sender<StreamProgress>>,
    ) -> TransferResult {
        let total = commands.len();
        let publish = |completed: usize, connected: bool, finished: bool| {
            let snapshot = StreamProgress {
                completed,
                total,
                connected,
                finished,
            };
            if let Some(tx) = progress {
                tx.send_replace(snapshot);
            }
            if let Some(sink) = &self.sink {
                sink.report(snapshot.status());
            }
        };

        if !session.is_open() {
            tracing::warn!("Refusing to stream {} commands: not connected", total);
            let result = TransferResult::not_connected();
            publish(0, false, true);
            self.finish(&result);
            return result;
        }

        tracing::info!("Streaming {} commands", total);
        if let Some(sink) = &self.sink {
            sink.started(total);
        }

        let start = Instant::now();
        let mut exchanges = Vec::with_capacity(total);
        let mut status = TransferStatus::Completed;

        for (index, command) in commands.iter().enumerate() {
            let outcome = session.transact(command.as_str()).and_then(|ack| {
                if ack.is_missing() && self.options.halt_on_missing_ack {
                    let timeout_ms = session.params().map_or(0, |p| p.timeout_ms);
                    Err(ControllerError::ResponseTimeout { timeout_ms })
                } else {
                    Ok(ack)
                }
            });

            match outcome {
                Ok(acknowledgment) => {
                    exchanges.push(Exchange {
                        index,
                        command: command.to_string(),
                        acknowledgment,
                    });
                }
                Err(error) => {
                    tracing::warn!("Stream aborted at command {} ({}): {}", index, command, error);
                    status = TransferStatus::Aborted { index, error };
                    break;
                }
            }

            let completed = index + 1;
            let interval = self.options.progress_log_interval;
            if interval > 0 && completed % interval == 0 {
                tracing::info!("Progress: {}", PrinterStatus::printing(completed, total));
            }
            publish(completed, true, false);
        }

        let result = TransferResult {
            status,
            duration: start.elapsed(),
            exchanges,
        };
        if result.is_complete() {
            tracing::info!(
                "Streamed {} commands in {:?} ({} without response)",
                result.sent(),
                result.duration,
                result.missing_acks()
            );
        }
        // A lost link closes the session, so this reads false after an abort
        // caused by I/O failure or a close from another thread.
        publish(result.sent(), session.is_open(), true);
        self.finish(&result);
        result
    }

    fn finish(&self, result: &TransferResult) {
        if let Some(sink) = &self.sink {
            sink.finished(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_status() {
        let progress = StreamProgress {
            completed: 1,
            total: 4,
            connected: true,
            finished: false,
        };
        assert_eq!(progress.status().progress, 25);
        assert!(progress.status().printing);
        assert!(progress.status().connected);

        let done = StreamProgress {
            finished: true,
            ..progress
        };
        assert!(!done.status().printing);
        assert!(done.status().connected);

        let dropped = StreamProgress {
            connected: false,
            ..progress
        };
        assert!(!dropped.status().connected);
        assert!(!dropped.status().printing);
        assert_eq!(dropped.status().to_string(), "disconnected 25% (1/4)");
    }

    #[test]
    fn test_not_connected_result() {
        let session = ChannelSession::new();
        let commands = gcodelink_visualizer::parse_lines(["G28"]);
        let result = CommandStreamer::new().stream(&session, &commands);
        assert_eq!(result.status, TransferStatus::NotConnected);
        assert_eq!(result.sent(), 0);
        assert_eq!(result.aborted_index(), None);
    }

    #[test]
    fn test_default_options() {
        let options = StreamOptions::default();
        assert!(!options.halt_on_missing_ack);
        assert_eq!(options.progress_log_interval, 50);
    }
}
