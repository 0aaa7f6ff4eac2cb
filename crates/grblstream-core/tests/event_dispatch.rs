use async_trait::async_trait;
use grblstream_core::{NoOpListener, StreamEvent, StreamListener};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingListener {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl StreamListener for RecordingListener {
    async fn on_progress(&self, percent: u8, command: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("progress:{}:{}", percent, command));
    }

    async fn on_alarm(&self, line: &str) {
        self.calls.lock().unwrap().push(format!("alarm:{}", line));
    }

    async fn on_error(&self, line: &str) {
        self.calls.lock().unwrap().push(format!("error:{}", line));
    }

    async fn on_send(&self, line: &str) {
        self.calls.lock().unwrap().push(format!("send:{}", line));
    }

    async fn on_receive(&self, line: &str) {
        self.calls.lock().unwrap().push(format!("receive:{}", line));
    }
}

#[tokio::test]
async fn test_each_event_reaches_exactly_one_callback() {
    let listener = RecordingListener::default();
    let events = vec![
        StreamEvent::Progress {
            percent: 40,
            command: "G1 X1".to_string(),
        },
        StreamEvent::Alarm("ALARM:1".to_string()),
        StreamEvent::Error("error:9".to_string()),
        StreamEvent::Sent("G1 X1".to_string()),
        StreamEvent::Received("ok".to_string()),
    ];

    for event in &events {
        event.dispatch(&listener).await;
    }

    let calls = listener.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "progress:40:G1 X1",
            "alarm:ALARM:1",
            "error:error:9",
            "send:G1 X1",
            "receive:ok",
        ]
    );
}

#[tokio::test]
async fn test_noop_listener_accepts_everything() {
    let listener = NoOpListener;
    StreamEvent::Alarm("ALARM:2".to_string())
        .dispatch(&listener)
        .await;
    StreamEvent::Progress {
        percent: 100,
        command: "completed".to_string(),
    }
    .dispatch(&listener)
    .await;
}

#[test]
fn test_event_kind_and_display() {
    let event = StreamEvent::Progress {
        percent: 50,
        command: "G1 X5".to_string(),
    };
    assert_eq!(event.kind(), "progress");
    assert_eq!(event.to_string(), "Progress 50% (G1 X5)");
    assert_eq!(StreamEvent::Received("ok".into()).kind(), "receive");
}
