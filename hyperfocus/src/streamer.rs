//! Timer-driven focus-session streaming.
//!
//! Each started session owns a producer task that waits for the next tick
//! boundary, an external signal or cancellation, feeds the resulting
//! checkpoint to the guardian, and pushes the message into a bounded channel.
//! Control signals are acknowledged as soon as the clock accepts them, whether
//! or not the consumer is keeping up. Sessions share nothing but the guardian.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::core::session::{CHECK_INTERVAL_MINUTES, Checkpoint, SessionClock, SessionError};
use crate::core::types::FocusMode;
use crate::io::generator::Generator;
use crate::responders::guardian::Guardian;

const MESSAGE_BUFFER: usize = 8;

/// One guardian message for one checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMessage {
    pub mode: FocusMode,
    #[serde(flatten)]
    pub checkpoint: Checkpoint,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl SessionMessage {
    pub fn kind(&self) -> &'static str {
        self.checkpoint.kind.as_str()
    }
}

/// Why a distraction or stop request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Transition(#[from] SessionError),
    #[error("session is no longer running")]
    Closed,
}

enum Signal {
    Distraction(oneshot::Sender<Result<(), SessionError>>),
    Stop(oneshot::Sender<Result<(), SessionError>>),
}

/// Handle for steering a running session from outside its stream.
#[derive(Debug, Clone)]
pub struct SessionControl {
    signals: mpsc::Sender<Signal>,
    cancel: CancellationToken,
}

impl SessionControl {
    pub async fn log_distraction(&self) -> Result<(), ControlError> {
        self.send(Signal::Distraction).await
    }

    pub async fn stop(&self) -> Result<(), ControlError> {
        self.send(Signal::Stop).await
    }

    /// Stop producing messages without emitting an end checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.signals.is_closed()
    }

    /// Resolves once the producer task has exited.
    pub async fn finished(&self) {
        self.signals.closed().await;
    }

    async fn send(
        &self,
        signal: impl FnOnce(oneshot::Sender<Result<(), SessionError>>) -> Signal,
    ) -> Result<(), ControlError> {
        let (reply, outcome) = oneshot::channel();
        self.signals
            .send(signal(reply))
            .await
            .map_err(|_| ControlError::Closed)?;
        outcome.await.map_err(|_| ControlError::Closed)??;
        Ok(())
    }
}

/// A started session: its control handle and the receiving end of its messages.
#[derive(Debug)]
pub struct FocusSession {
    control: SessionControl,
    messages: mpsc::Receiver<SessionMessage>,
}

impl FocusSession {
    pub fn control(&self) -> &SessionControl {
        &self.control
    }

    /// Next message, or `None` once the session has ended or been cancelled.
    pub async fn next_message(&mut self) -> Option<SessionMessage> {
        self.messages.recv().await
    }

    /// Consume the session as a stream. Dropping the stream cancels the session.
    pub fn into_stream(self) -> impl Stream<Item = SessionMessage> + Send + 'static {
        let FocusSession {
            control,
            mut messages,
        } = self;
        let guard = control.cancel.clone().drop_guard();
        async_stream::stream! {
            let _guard = guard;
            while let Some(message) = messages.recv().await {
                yield message;
            }
        }
    }
}

/// Starts sessions and maps their checkpoints to guardian messages.
pub struct SessionStreamer<G> {
    guardian: Arc<Guardian<G>>,
    tick_period: Duration,
    shutdown: CancellationToken,
}

impl<G: Generator + 'static> SessionStreamer<G> {
    /// `tick_period` is the wall-clock length of one 10 minute check interval.
    pub fn new(guardian: Arc<Guardian<G>>, tick_period: Duration) -> Self {
        Self {
            guardian,
            tick_period,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start a session. Messages begin with the start checkpoint.
    pub fn start(
        &self,
        mode: FocusMode,
        target_minutes: u32,
        task_title: Option<String>,
    ) -> Result<FocusSession, SessionError> {
        let clock = SessionClock::new(mode, target_minutes)?;
        let (signal_tx, signal_rx) = mpsc::channel(MESSAGE_BUFFER);
        let (message_tx, message_rx) = mpsc::channel(MESSAGE_BUFFER);
        let cancel = self.shutdown.child_token();

        let producer = Producer {
            guardian: self.guardian.clone(),
            clock,
            task_title,
            tick_period: self.tick_period,
            signals: signal_rx,
            messages: message_tx,
            cancel: cancel.clone(),
        };
        let span = info_span!("session", %mode, target_minutes);
        tokio::spawn(producer.run().instrument(span));

        Ok(FocusSession {
            control: SessionControl {
                signals: signal_tx,
                cancel,
            },
            messages: message_rx,
        })
    }

    /// Cancel every session started by this streamer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

struct Producer<G> {
    guardian: Arc<Guardian<G>>,
    clock: SessionClock,
    task_title: Option<String>,
    tick_period: Duration,
    signals: mpsc::Receiver<Signal>,
    messages: mpsc::Sender<SessionMessage>,
    cancel: CancellationToken,
}

impl<G: Generator> Producer<G> {
    async fn run(mut self) {
        let Ok(start) = self.clock.start() else {
            return;
        };
        info!("session started");
        let mut pending = VecDeque::new();
        let Some(message) = self.render(start).await else {
            return;
        };
        pending.push_back(message);

        let mut deadline = Instant::now() + self.wait_for_next_tick();
        let mut signals_open = true;
        loop {
            let running = !self.clock.state().is_terminal();
            if !running && pending.is_empty() {
                break;
            }
            // Undelivered messages queue here so signals are still served
            // while the consumer is not reading.
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("session cancelled");
                    return;
                }
                permit = self.messages.reserve(), if !pending.is_empty() => {
                    let Ok(permit) = permit else {
                        debug!("message receiver dropped");
                        return;
                    };
                    if let Some(message) = pending.pop_front() {
                        permit.send(message);
                    }
                }
                signal = self.signals.recv(), if running && signals_open => {
                    let Some(signal) = signal else {
                        signals_open = false;
                        continue;
                    };
                    let checkpoint = match signal {
                        Signal::Distraction(reply) => reply_with(reply, self.clock.log_distraction()),
                        Signal::Stop(reply) => reply_with(reply, self.clock.stop()),
                    };
                    if let Some(checkpoint) = checkpoint {
                        let Some(message) = self.render(checkpoint).await else {
                            return;
                        };
                        pending.push_back(message);
                    }
                }
                _ = sleep_until(deadline), if running => {
                    match self.clock.tick() {
                        Ok(checkpoint) => {
                            let Some(message) = self.render(checkpoint).await else {
                                return;
                            };
                            pending.push_back(message);
                        }
                        Err(err) => {
                            warn!(error = %err, "tick rejected");
                            return;
                        }
                    }
                    deadline += self.wait_for_next_tick();
                }
            }
        }
        info!(
            state = %self.clock.state(),
            elapsed = self.clock.elapsed_minutes(),
            distractions = self.clock.distraction_count(),
            "session ended"
        );
    }

    fn wait_for_next_tick(&self) -> Duration {
        self.tick_period * self.clock.minutes_until_tick() / CHECK_INTERVAL_MINUTES
    }

    /// Ask the guardian for a checkpoint's message. `None` once the session is cancelled.
    async fn render(&self, checkpoint: Checkpoint) -> Option<SessionMessage> {
        let mode = self.clock.mode();
        let text = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            text = self.guardian.message_for(mode, self.task_title.as_deref(), &checkpoint) => text,
        };
        let message = SessionMessage {
            mode,
            checkpoint,
            message: text,
            at: Utc::now(),
        };
        debug!(kind = message.kind(), "session message ready");
        Some(message)
    }
}

fn reply_with(
    reply: oneshot::Sender<Result<(), SessionError>>,
    outcome: Result<Checkpoint, SessionError>,
) -> Option<Checkpoint> {
    match outcome {
        Ok(checkpoint) => {
            let _ = reply.send(Ok(()));
            Some(checkpoint)
        }
        Err(err) => {
            let _ = reply.send(Err(err));
            None
        }
    }
}
