//! Streaming engine
//!
//! Drives one controller session through
//! `Idle -> Initializing -> Streaming -> Draining -> Completed`, pacing
//! writes by the controller's receive buffer. The sender runs in the
//! caller's future; the reader and the notifier run as background tasks
//! owned by the session.

use super::config::StreamerConfig;
use super::notifier::{spawn_notifier, EventSink};
use super::reader::{Incoming, Reader};
use super::writer::LineWriter;
use crate::communication::{BufferSide, FlowControlTracker, RealSerialPort, Transport};
use crate::firmware::grbl::{
    decode_alarm, decode_error, GrblResponse, SOFT_RESET, STATUS_QUERY, UNLOCK_COMMAND,
};
use grblstream_core::{
    ConnectionError, Error, Result, StreamError, StreamEvent, StreamListener, StreamState,
};
use grblstream_gcode::{sanitize_lines, ArcToLinearConverter};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

/// Outcome of one streamed job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    /// Commands written
    pub commands_sent: usize,
    /// `ok` responses matched to an outstanding command
    pub acknowledged: usize,
    /// `error` responses
    pub faults: usize,
    /// Alarms handled
    pub alarms: usize,
    /// The machine reported idle before the completion timeout
    pub drained: bool,
}

/// An open controller link and its background tasks
struct Session {
    id: Uuid,
    port_name: String,
    writer: LineWriter,
    responses: mpsc::UnboundedReceiver<Incoming>,
    events: EventSink,
    active: watch::Sender<bool>,
    reader: JoinHandle<()>,
    notifier: JoinHandle<()>,
    tracker: FlowControlTracker,
    state: Arc<RwLock<StreamState>>,
}

impl Session {
    fn state(&self) -> StreamState {
        *self.state.read()
    }

    fn set_state(&self, state: StreamState) {
        let mut current = self.state.write();
        if *current != state {
            tracing::debug!("Stream state {} -> {}", *current, state);
            *current = state;
        }
    }

    fn write_line(&self, line: &str) -> Result<()> {
        self.writer
            .write_line(line)
            .map_err(|e| self.write_failed(e))
    }

    fn write_realtime(&self, byte: u8) -> Result<()> {
        self.writer
            .write_realtime(byte)
            .map_err(|e| self.write_failed(e))
    }

    fn write_failed(&self, e: ConnectionError) -> Error {
        tracing::error!("Write to {} failed: {}", self.port_name, e);
        self.events.emit(StreamEvent::Error(e.to_string()));
        e.into()
    }

    fn try_response(&mut self) -> Option<Incoming> {
        self.responses.try_recv().ok()
    }

    /// Wait up to `timeout` for the next response; `None` on timeout
    async fn wait_response(&mut self, timeout: Duration) -> Result<Option<Incoming>> {
        match tokio::time::timeout(timeout, self.responses.recv()).await {
            Ok(Some(response)) => Ok(Some(response)),
            Ok(None) => Err(ConnectionError::SerialError {
                reason: "Reader stopped".to_string(),
            }
            .into()),
            Err(_) => Ok(None),
        }
    }

    fn discard_responses(&mut self) -> usize {
        let mut discarded = 0;
        while self.responses.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Apply one response to the buffer accounting
    fn handle_response(
        &mut self,
        incoming: Incoming,
        summary: &mut StreamSummary,
        phase: StreamState,
    ) {
        match incoming.response {
            GrblResponse::Ok => match self.tracker.on_acknowledge() {
                Some(command) => {
                    summary.acknowledged += 1;
                    tracing::trace!("Acknowledged '{}'", command.text);
                }
                None => tracing::warn!("Acknowledgement received with nothing outstanding"),
            },
            GrblResponse::Error { code, line } => {
                summary.faults += 1;
                let description = code.and_then(decode_error).unwrap_or("unknown error");
                match self.tracker.on_fault() {
                    Some(command) => tracing::warn!(
                        "Command '{}' rejected: {} ({})",
                        command.text,
                        line,
                        description
                    ),
                    None => tracing::warn!(
                        "{} ({}) received with nothing outstanding",
                        line,
                        description
                    ),
                }
            }
            GrblResponse::Alarm { code, line } => {
                summary.alarms += 1;
                let description = code.and_then(decode_alarm).unwrap_or("unknown alarm");
                tracing::warn!("Alarm while {}: {} ({})", phase, line, description);
                if incoming.unlock_sent {
                    // Its ok is still to come.
                    self.tracker.record_sent(UNLOCK_COMMAND);
                } else {
                    tracing::warn!("Controller left locked after {}", line);
                }
                self.set_state(phase);
            }
            GrblResponse::Status(report) => {
                tracing::trace!("Status report: {}", report.state);
            }
            GrblResponse::Message(line) => {
                tracing::debug!("Controller message: {}", line);
            }
        }
    }

    async fn initialize(&mut self, config: &StreamerConfig) -> Result<()> {
        self.set_state(StreamState::Initializing);
        tracing::info!("Resetting controller on {}", self.port_name);

        self.write_realtime(SOFT_RESET)?;
        tokio::time::sleep(config.reset_settle()).await;

        if let Err(e) = self.writer.clear(BufferSide::All) {
            tracing::warn!("Failed to clear buffers on {}: {}", self.port_name, e);
        }
        let stale = self.discard_responses();
        tracing::debug!("Discarded {} responses after reset", stale);

        self.write_line(UNLOCK_COMMAND)?;
        tokio::time::sleep(config.unlock_settle()).await;

        self.tracker.clear();
        self.set_state(StreamState::Idle);
        Ok(())
    }

    async fn run_job(&mut self, commands: &[String], config: &StreamerConfig) -> Result<StreamSummary> {
        let mut summary = StreamSummary::default();
        let total = commands.len();

        let stale = self.discard_responses();
        if stale > 0 {
            tracing::debug!("Discarded {} stale responses", stale);
        }
        self.tracker.clear();
        self.set_state(StreamState::Streaming);
        tracing::info!("Streaming {} commands to {}", total, self.port_name);

        for (index, command) in commands.iter().enumerate() {
            let sequence = index + 1;

            while let Some(response) = self.try_response() {
                self.handle_response(response, &mut summary, StreamState::Streaming);
            }

            if !self.tracker.fits(command) {
                tracing::warn!(
                    "Command of {} bytes exceeds the receive buffer, sending alone: {}",
                    command.len(),
                    command
                );
            }

            while !self.tracker.can_send(command) {
                match self.wait_response(config.response_timeout()).await? {
                    Some(response) => {
                        self.handle_response(response, &mut summary, StreamState::Streaming)
                    }
                    None => tracing::debug!(
                        "No response within {:?}, {} bytes outstanding",
                        config.response_timeout(),
                        self.tracker.used_bytes()
                    ),
                }
            }

            if let Err(e) = self.write_line(command) {
                self.set_state(StreamState::Idle);
                return Err(e);
            }
            self.tracker.record_sent(command);
            summary.commands_sent += 1;

            if sequence % config.progress_interval == 0 {
                let percent = (sequence * 100 / total) as u8;
                if percent < 100 {
                    self.events.emit(StreamEvent::Progress {
                        percent,
                        command: command.clone(),
                    });
                }
            }
        }

        let drained = match self.drain(config, &mut summary).await {
            Ok(drained) => drained,
            Err(e) => {
                self.set_state(StreamState::Idle);
                return Err(e);
            }
        };
        summary.drained = drained;

        self.events.emit(StreamEvent::Progress {
            percent: 100,
            command: "completed".to_string(),
        });
        self.set_state(StreamState::Completed);
        tracing::info!(
            "Job complete: {} sent, {} errors, {} alarms",
            summary.commands_sent,
            summary.faults,
            summary.alarms
        );
        Ok(summary)
    }

    /// Poll status until the machine is idle with nothing outstanding
    async fn drain(&mut self, config: &StreamerConfig, summary: &mut StreamSummary) -> Result<bool> {
        self.set_state(StreamState::Draining);
        let deadline = Instant::now() + config.completion_timeout();

        while Instant::now() < deadline {
            self.write_realtime(STATUS_QUERY)?;
            let poll_end = (Instant::now() + config.status_poll_interval()).min(deadline);

            loop {
                let remaining = poll_end.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match self.wait_response(remaining).await? {
                    Some(Incoming {
                        response: GrblResponse::Status(report),
                        ..
                    }) if report.state.is_idle() && self.tracker.is_empty() => {
                        tracing::debug!("Machine idle, drain complete");
                        return Ok(true);
                    }
                    Some(response) => {
                        self.handle_response(response, summary, StreamState::Draining)
                    }
                    None => break,
                }
            }
        }

        tracing::warn!(
            "Machine not confirmed idle within {:?} ({} commands outstanding)",
            config.completion_timeout(),
            self.tracker.outstanding_len()
        );
        Ok(false)
    }

    async fn shutdown(self) {
        if self.active.send(false).is_err() {
            tracing::trace!("Background tasks already gone");
        }
        if let Err(e) = self.writer.clear(BufferSide::All) {
            tracing::warn!("Failed to clear buffers on {}: {}", self.port_name, e);
        }

        let Session {
            writer,
            events,
            responses,
            reader,
            notifier,
            ..
        } = self;
        drop(writer);
        drop(events);
        drop(responses);

        if let Err(e) = reader.await {
            tracing::warn!("Reader task ended abnormally: {}", e);
        }
        if let Err(e) = notifier.await {
            tracing::warn!("Notifier task ended abnormally: {}", e);
        }
    }
}

/// Streams G-code to a GRBL-class controller
///
/// # Examples
///
/// ```no_run
/// # async fn run() -> grblstream_core::Result<()> {
/// use grblstream_communication::{GrblStreamer, StreamerConfig};
/// use grblstream_core::NoOpListener;
/// use std::sync::Arc;
///
/// let mut streamer = GrblStreamer::new(StreamerConfig::for_port("/dev/ttyUSB0"), Arc::new(NoOpListener))?;
/// streamer.open().await?;
/// let summary = streamer.send_file("job.nc").await?;
/// println!("sent {} commands", summary.commands_sent);
/// streamer.close().await;
/// # Ok(())
/// # }
/// ```
pub struct GrblStreamer {
    config: StreamerConfig,
    listener: Arc<dyn StreamListener>,
    state: Arc<RwLock<StreamState>>,
    converter: Option<ArcToLinearConverter>,
    session: Option<Session>,
}

impl GrblStreamer {
    /// Create a streamer; nothing is opened yet
    pub fn new(config: StreamerConfig, listener: Arc<dyn StreamListener>) -> Result<Self> {
        config.validate()?;
        let converter = config
            .convert_arcs
            .then(|| ArcToLinearConverter::new(config.arc));
        Ok(Self {
            config,
            listener,
            state: Arc::new(RwLock::new(StreamState::Idle)),
            converter,
            session: None,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// Current session state
    pub fn state(&self) -> StreamState {
        *self.state.read()
    }

    /// Check if a session is open
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Identifier of the open session
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Name of the open link
    pub fn port_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.port_name.as_str())
    }

    /// Receive-buffer accounting of the open session
    pub fn tracker(&self) -> Option<&FlowControlTracker> {
        self.session.as_ref().map(|s| &s.tracker)
    }

    /// Open the configured serial port and initialize the controller
    pub async fn open(&mut self) -> Result<()> {
        let port = RealSerialPort::open_with_fallback(&self.config.serial_settings())?;
        self.open_with_transport(Box::new(port)).await
    }

    /// Open a session over an existing transport and initialize the controller
    pub async fn open_with_transport(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        if self.session.is_some() {
            tracing::info!("Closing previous session before reopening");
            self.close().await;
        }

        let mut write_port = transport;
        write_port.set_timeout(self.config.write_timeout())?;
        let mut read_port = write_port.try_clone()?;
        read_port.set_timeout(self.config.read_poll())?;
        write_port.clear(BufferSide::All)?;
        let port_name = write_port.name();

        let (events, event_rx) = EventSink::channel(self.config.event_queue_capacity);
        let (active_tx, active_rx) = watch::channel(true);
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let writer = LineWriter::new(write_port, events.clone());

        let notifier = spawn_notifier(event_rx, self.listener.clone(), active_rx.clone());
        let reader = Reader {
            port: read_port,
            writer: writer.clone(),
            responses: response_tx,
            events: events.clone(),
            state: self.state.clone(),
            active: active_rx,
        }
        .spawn();

        let id = Uuid::new_v4();
        tracing::info!("Opened session {} on {}", id, port_name);
        let session = self.session.insert(Session {
            id,
            port_name,
            writer,
            responses: response_rx,
            events,
            active: active_tx,
            reader,
            notifier,
            tracker: FlowControlTracker::new(self.config.flow_control),
            state: self.state.clone(),
        });

        if let Err(e) = session.initialize(&self.config).await {
            tracing::error!("Controller initialization failed: {}", e);
            self.close().await;
            return Err(e);
        }
        if let Some(converter) = self.converter.as_mut() {
            converter.reset();
        }
        Ok(())
    }

    /// Stream a G-code file
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> Result<StreamSummary> {
        let path = path.as_ref();
        let program = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StreamError::ReadSource {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Loaded {}", path.display());
        self.send_program(&program).await
    }

    /// Stream an in-memory program
    pub async fn send_program(&mut self, program: &str) -> Result<StreamSummary> {
        self.send_lines(program.lines()).await
    }

    /// Stream a sequence of lines
    ///
    /// Comments and blank lines are removed first; arcs are converted when
    /// enabled.
    pub async fn send_lines<I, S>(&mut self, lines: I) -> Result<StreamSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match &self.session {
            None => return Err(ConnectionError::NotConnected.into()),
            Some(session) if session.state().is_active() => {
                return Err(StreamError::AlreadyStreaming.into())
            }
            Some(_) => {}
        }

        let commands = self.prepare_commands(lines);
        let config = &self.config;
        let session = self
            .session
            .as_mut()
            .ok_or(Error::Connection(ConnectionError::NotConnected))?;
        session.run_job(&commands, config).await
    }

    /// Commands that would be transmitted for `lines`
    pub fn prepare_commands<I, S>(&mut self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let commands = sanitize_lines(lines);
        match self.converter.as_mut() {
            Some(converter) => {
                converter.reset();
                let converted = converter.convert_lines(&commands);
                tracing::debug!(
                    "Arc conversion expanded {} commands to {}",
                    commands.len(),
                    converted.len()
                );
                converted
            }
            None => commands,
        }
    }

    /// Stop the background tasks and release the link
    pub async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let id = session.id;
        session.shutdown().await;
        *self.state.write() = StreamState::Idle;
        tracing::info!("Closed session {}", id);
    }
}

impl Drop for GrblStreamer {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            let _ = session.active.send(false);
        }
    }
}
