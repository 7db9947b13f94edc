//! Progress reporting surface.
//!
//! The runner never touches a UI directly. It reports through a
//! [`ProgressSink`], and the [`ChannelSink`] implementation turns that into
//! immutable [`ProgressEvent`]s over an mpsc channel so a foreground
//! consumer (a window, a TUI, a test) drains them on its own schedule.

use crate::runner::RunOutcome;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{error, info};

/// Receives progress updates and the terminal outcome of one run.
pub trait ProgressSink: Send {
    /// Called once per directory entry, with a 1-based strictly increasing
    /// `current` and the entry count taken at run start.
    fn on_progress(&self, current: usize, total: usize);

    /// Called exactly once, after the run has finished or aborted.
    fn on_complete(&self, outcome: &RunOutcome);
}

/// Immutable progress message emitted over a [`ChannelSink`].
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// One directory entry has been accounted for.
    Progress {
        /// 1-based index of the entry
        current: usize,
        /// Total entry count at run start
        total: usize,
    },

    /// The run has finished; no further events follow.
    Complete(RunOutcome),
}

/// Sink that forwards events over a channel.
///
/// Dropped receivers are tolerated: a consumer that went away must not
/// abort the run, so failed sends are ignored.
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end for the consumer.
    #[must_use]
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&self, current: usize, total: usize) {
        let _ = self.tx.send(ProgressEvent::Progress { current, total });
    }

    fn on_complete(&self, outcome: &RunOutcome) {
        let _ = self.tx.send(ProgressEvent::Complete(outcome.clone()));
    }
}

/// Sink that logs progress through `tracing`. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn on_progress(&self, current: usize, total: usize) {
        info!("Progress: {current}/{total}");
    }

    fn on_complete(&self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Completed(report) => info!(
                "Rewriting complete: {} rewritten, {} ignored, {} failed",
                report.rewritten,
                report.ignored,
                report.failures.len()
            ),
            RunOutcome::Failed(message) => error!("Run failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_events() {
        let (sink, rx) = ChannelSink::new();

        sink.on_progress(1, 2);
        sink.on_progress(2, 2);
        sink.on_complete(&RunOutcome::Failed("boom".to_string()));
        drop(sink);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            ProgressEvent::Progress { current: 1, total: 2 }
        ));
        assert!(matches!(
            events[1],
            ProgressEvent::Progress { current: 2, total: 2 }
        ));
        match &events[2] {
            ProgressEvent::Complete(RunOutcome::Failed(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected Complete(Failed), got {other:?}"),
        }
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        // Must not panic or error out.
        sink.on_progress(1, 1);
        sink.on_complete(&RunOutcome::Failed("ignored".to_string()));
    }
}
