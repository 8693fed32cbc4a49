//! Hand-tracking provider contract.
//!
//! A provider implements [`HandTracker`] and runs on its own thread, pushing
//! [`TrackingEvent`]s through a [`FrameSink`].  The render loop owns a
//! [`TrackingSession`] and calls [`TrackingSession::latest`] once per frame:
//! everything queued since the previous call is drained and only the newest
//! frame is kept.  Consumers never learn whether frames came from a camera,
//! a LeapMotion device or the keyboard simulator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::{Result, TrackingError};
use crate::landmark::TrackingFrame;

// ════════════════════════════════════════════════════════════════════════════
// Events and status
// ════════════════════════════════════════════════════════════════════════════

/// What a provider reports to its session.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackingEvent {
    /// Model / device loaded; frames will follow.
    Ready,
    /// Initialisation or runtime failure.  No frames follow.
    Failed(TrackingError),
    Frame(TrackingFrame),
}

/// Session status as seen by the render loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackingStatus {
    Loading,
    Ready,
    Failed(String),
}

impl TrackingStatus {
    pub fn label(&self) -> &str {
        match self {
            TrackingStatus::Loading   => "loading",
            TrackingStatus::Ready     => "ready",
            TrackingStatus::Failed(_) => "failed",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandTracker trait + FrameSink
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver tracking frames to a session.
pub trait HandTracker: Send + 'static {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str {
        "hand tracker"
    }

    /// Run until the source is exhausted or `sink.should_stop()` is true.
    fn run(self: Box<Self>, sink: FrameSink);
}

/// Provider-side handle of a session.
pub struct FrameSink {
    tx:   Sender<TrackingEvent>,
    stop: Arc<AtomicBool>,
}

impl FrameSink {
    /// Returns false once the session is gone.
    pub fn ready(&self) -> bool {
        self.send(TrackingEvent::Ready)
    }

    pub fn failed(&self, err: TrackingError) {
        let _ = self.send(TrackingEvent::Failed(err));
    }

    /// Returns false once the session has stopped; the provider should
    /// return.
    pub fn frame(&self, frame: TrackingFrame) -> bool {
        self.send(TrackingEvent::Frame(frame))
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn send(&self, event: TrackingEvent) -> bool {
        !self.should_stop() && self.tx.send(event).is_ok()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingSession
// ════════════════════════════════════════════════════════════════════════════

/// Render-loop side of a provider.
///
/// `stop()` is idempotent and never joins the provider thread: an in-flight
/// inference simply finishes into a closed channel.  Dropping the session
/// stops it.
pub struct TrackingSession {
    rx:       Option<Receiver<TrackingEvent>>,
    stop:     Arc<AtomicBool>,
    status:   TrackingStatus,
    latest:   Option<TrackingFrame>,
    received: u64,
    dropped:  u64,
}

impl TrackingSession {
    /// A session with no provider attached.
    pub fn idle() -> Self {
        TrackingSession {
            rx:       None,
            stop:     Arc::new(AtomicBool::new(true)),
            status:   TrackingStatus::Loading,
            latest:   None,
            received: 0,
            dropped:  0,
        }
    }

    /// Spawn `tracker` on its own thread and return a running session.
    pub fn start<T: HandTracker>(tracker: T) -> Result<Self> {
        let mut session = Self::idle();
        session.attach(Box::new(tracker))?;
        Ok(session)
    }

    /// A connected sink/session pair with no thread, for providers that push
    /// from callbacks they already own.
    pub fn pair() -> (FrameSink, TrackingSession) {
        let mut session = Self::idle();
        let sink = session.connect();
        (sink, session)
    }

    /// Attach and spawn a provider.  Fails with `AlreadyRunning` if one is
    /// attached and not stopped.
    pub fn attach(&mut self, tracker: Box<dyn HandTracker>) -> Result<()> {
        if self.is_running() {
            return Err(TrackingError::AlreadyRunning);
        }
        let name = tracker.name().to_string();
        let sink = self.connect();

        let spawned = thread::Builder::new()
            .name(format!("tracker:{}", name))
            .spawn(move || tracker.run(sink));

        match spawned {
            Ok(_) => {
                info!("tracking session started ({})", name);
                Ok(())
            }
            Err(e) => {
                let err = TrackingError::Unavailable(format!("could not spawn {}: {}", name, e));
                self.stop();
                self.status = TrackingStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    fn connect(&mut self) -> FrameSink {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        self.rx = Some(rx);
        self.stop = Arc::clone(&stop);
        self.status = TrackingStatus::Loading;
        self.latest = None;
        FrameSink { tx, stop }
    }

    pub fn is_running(&self) -> bool {
        self.rx.is_some() && !self.stop.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    /// Frames received over the session's lifetime.
    pub fn frames_received(&self) -> u64 { self.received }

    /// Frames superseded before the render loop saw them.
    pub fn frames_dropped(&self) -> u64 { self.dropped }

    /// Drain pending events and return the newest frame seen so far.
    /// `None` once the provider has failed, exited or been stopped.
    pub fn latest(&mut self) -> Option<&TrackingFrame> {
        self.drain();
        self.latest.as_ref()
    }

    fn drain(&mut self) {
        let rx = match self.rx.as_ref() {
            Some(rx) => rx,
            None => return,
        };

        let mut fresh = 0u64;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(TrackingEvent::Frame(frame)) => {
                    fresh += 1;
                    self.latest = Some(frame);
                    if self.status == TrackingStatus::Loading {
                        self.status = TrackingStatus::Ready;
                    }
                }
                Ok(TrackingEvent::Ready) => {
                    info!("hand tracker ready");
                    self.status = TrackingStatus::Ready;
                }
                Ok(TrackingEvent::Failed(err)) => {
                    error!("hand tracker failed: {}", err);
                    self.status = TrackingStatus::Failed(err.to_string());
                    self.latest = None;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if fresh > 1 {
            self.dropped += fresh - 1;
            debug!("dropped {} stale tracking frame(s)", fresh - 1);
        }
        self.received += fresh;

        if disconnected {
            self.rx = None;
            self.latest = None;
            if !matches!(self.status, TrackingStatus::Failed(_)) {
                warn!("hand tracker exited");
                self.status = TrackingStatus::Failed(TrackingError::Disconnected.to_string());
            }
        }
    }

    /// Stop the provider and forget its last frame.  Safe to call any
    /// number of times.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.latest = None;
        if self.rx.take().is_some() {
            info!("tracking session stopped");
        }
    }
}

impl Default for TrackingSession {
    fn default() -> Self { Self::idle() }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedTracker — replay / tests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum ScriptStep {
    Ready,
    Fail(TrackingError),
    Frame(TrackingFrame),
    Pause(Duration),
    Linger,
}

/// Plays a fixed sequence of events.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTracker {
    steps: Vec<ScriptStep>,
}

impl ScriptedTracker {
    pub fn new() -> Self { Self::default() }

    pub fn ready(mut self) -> Self {
        self.steps.push(ScriptStep::Ready);
        self
    }

    pub fn fail(mut self, err: TrackingError) -> Self {
        self.steps.push(ScriptStep::Fail(err));
        self
    }

    pub fn frame(mut self, frame: TrackingFrame) -> Self {
        self.steps.push(ScriptStep::Frame(frame));
        self
    }

    pub fn frames<I: IntoIterator<Item = TrackingFrame>>(mut self, frames: I) -> Self {
        self.steps.extend(frames.into_iter().map(ScriptStep::Frame));
        self
    }

    pub fn pause(mut self, d: Duration) -> Self {
        self.steps.push(ScriptStep::Pause(d));
        self
    }

    /// Keep the provider alive after the script until the session stops.
    pub fn linger(mut self) -> Self {
        self.steps.push(ScriptStep::Linger);
        self
    }
}

impl HandTracker for ScriptedTracker {
    fn name(&self) -> &str { "scripted" }

    fn run(self: Box<Self>, sink: FrameSink) {
        for step in self.steps {
            if sink.should_stop() {
                return;
            }
            match step {
                ScriptStep::Ready => { sink.ready(); }
                ScriptStep::Fail(err) => {
                    sink.failed(err);
                    return;
                }
                ScriptStep::Frame(frame) => {
                    if !sink.frame(frame) { return; }
                }
                ScriptStep::Pause(d) => thread::sleep(d),
                ScriptStep::Linger => {
                    while !sink.should_stop() {
                        thread::sleep(Duration::from_millis(5));
                    }
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
