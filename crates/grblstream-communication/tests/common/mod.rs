#![allow(dead_code)]

use async_trait::async_trait;
use grblstream_communication::{BufferSide, StreamerConfig, Transport};
use grblstream_core::{StreamEvent, StreamListener};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A reply waiting to be read, with the buffer bytes it releases
struct Reply {
    line: String,
    releases: Option<usize>,
}

#[derive(Default)]
pub struct MockState {
    /// Lines written, without newlines
    pub lines: Vec<String>,
    /// Real-time bytes written
    pub realtime: Vec<u8>,
    /// Status polls answered with `Run` before reporting `Idle`
    pub run_polls: usize,
    /// Extra lines sent after the `ok` of a command
    pub scripted: HashMap<String, Vec<String>>,
    /// Command answered with the given line instead of `ok`
    pub rejected: HashMap<String, String>,
    /// Release one queued reply every this many reads
    pub ack_every: usize,
    /// Fail every line write after this many
    pub fail_after_lines: Option<usize>,
    /// Writes of this exact line fail
    pub fail_line: Option<String>,
    /// Bytes written and not yet answered
    pub in_flight: usize,
    /// Highest value `in_flight` reached
    pub max_in_flight: usize,
    reads: usize,
    replies: VecDeque<Reply>,
    status: VecDeque<String>,
}

impl MockState {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if let Some(limit) = self.fail_after_lines {
            if self.lines.len() >= limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged"));
            }
        }
        if self.fail_line.as_deref() == Some(line) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }

        let footprint = line.len() + 1;
        self.lines.push(line.to_string());
        self.in_flight += footprint;
        self.max_in_flight = self.max_in_flight.max(self.in_flight);

        let answer = self
            .rejected
            .get(line)
            .cloned()
            .unwrap_or_else(|| "ok".to_string());
        self.replies.push_back(Reply {
            line: answer,
            releases: Some(footprint),
        });
        for extra in self.scripted.get(line).cloned().unwrap_or_default() {
            self.replies.push_back(Reply {
                line: extra,
                releases: None,
            });
        }
        Ok(())
    }

    fn write_realtime(&mut self, byte: u8) {
        self.realtime.push(byte);
        match byte {
            b'?' => {
                let state = if self.run_polls > 0 {
                    self.run_polls -= 1;
                    "Run"
                } else {
                    "Idle"
                };
                self.status
                    .push_back(format!("<{}|MPos:0.000,0.000,0.000|FS:0,0>", state));
            }
            0x18 => {
                self.replies.clear();
                self.in_flight = 0;
                self.replies.push_back(Reply {
                    line: "Grbl 1.1h ['$' for help]".to_string(),
                    releases: None,
                });
            }
            _ => {}
        }
    }

    fn next_reply(&mut self) -> Option<String> {
        if let Some(status) = self.status.pop_front() {
            return Some(status);
        }
        self.reads += 1;
        if self.reads % self.ack_every.max(1) != 0 {
            return None;
        }
        let reply = self.replies.pop_front()?;
        if let Some(bytes) = reply.releases {
            self.in_flight = self.in_flight.saturating_sub(bytes);
        }
        Some(reply.line)
    }
}

/// In-memory GRBL controller
#[derive(Clone)]
pub struct MockController {
    pub state: Arc<Mutex<MockState>>,
}

impl MockController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                ack_every: 1,
                ..MockState::default()
            })),
        }
    }

    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }

    pub fn with_state(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.state.lock().unwrap());
    }

    /// Lines written after the initialization unlock
    pub fn job_lines(&self) -> Vec<String> {
        self.state.lock().unwrap().lines.iter().skip(1).cloned().collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.state.lock().unwrap().lines.clone()
    }

    pub fn realtime(&self) -> Vec<u8> {
        self.state.lock().unwrap().realtime.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

impl Transport for MockController {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        match data.strip_suffix(b"\n") {
            Some(line) => state.write_line(&String::from_utf8_lossy(line)),
            None => {
                for byte in data {
                    state.write_realtime(*byte);
                }
                Ok(())
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let reply = self.state.lock().unwrap().next_reply();
        match reply {
            Some(line) => {
                let bytes = format!("{}\r\n", line).into_bytes();
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
            }
        }
    }

    fn clear(&mut self, which: BufferSide) -> io::Result<()> {
        if matches!(which, BufferSide::Input | BufferSide::All) {
            let mut state = self.state.lock().unwrap();
            state.status.clear();
        }
        Ok(())
    }

    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

/// Listener that records every notification
#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<StreamEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl StreamListener for Recorder {
    async fn on_progress(&self, percent: u8, command: &str) {
        self.push(StreamEvent::Progress {
            percent,
            command: command.to_string(),
        });
    }

    async fn on_alarm(&self, line: &str) {
        self.push(StreamEvent::Alarm(line.to_string()));
    }

    async fn on_error(&self, line: &str) {
        self.push(StreamEvent::Error(line.to_string()));
    }

    async fn on_send(&self, line: &str) {
        self.push(StreamEvent::Sent(line.to_string()));
    }

    async fn on_receive(&self, line: &str) {
        self.push(StreamEvent::Received(line.to_string()));
    }
}

/// Configuration with short timings for tests
pub fn test_config() -> StreamerConfig {
    StreamerConfig {
        read_poll_ms: 5,
        response_timeout_ms: 200,
        status_poll_interval_ms: 50,
        completion_timeout_secs: 2,
        reset_settle_ms: 20,
        unlock_settle_ms: 100,
        event_queue_capacity: 1000,
        ..StreamerConfig::for_port("mock")
    }
}
