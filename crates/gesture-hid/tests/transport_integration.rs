//! Integration tests against a loopback TCP "bridge".
//!
//! Each test starts a `std::net::TcpListener` that behaves like the bridge:
//! one packet per connection, read to EOF.

use std::io::Read;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use uuid::Uuid;

use gesture_core::{decode_packet, BridgePacket, Joint, MouseReport};
use gesture_hid::application::pipeline::{Pipeline, PipelineControl, PipelineSettings};
use gesture_hid::application::sources::{CaptureError, Frame, FrameSource, StaticConfigSource};
use gesture_hid::application::synthesize::{CommandSynthesizer, Dispatch, HidTransport};
use gesture_hid::infrastructure::camera::SyntheticSource;
use gesture_hid::infrastructure::estimator::ReplayEstimator;
use gesture_hid::infrastructure::storage::gestures::parse_gestures;
use gesture_hid::infrastructure::transport::{TcpLink, TcpTransport};

/// Accepts `count` connections and returns what each one carried.
fn fake_bridge(count: usize) -> (u16, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    let handle = std::thread::spawn(move || {
        (0..count)
            .map(|_| {
                let (mut conn, _) = listener.accept().expect("accept");
                let mut buf = Vec::new();
                conn.read_to_end(&mut buf).expect("read");
                buf
            })
            .collect()
    });
    (port, handle)
}

fn transport(port: u16) -> TcpTransport {
    TcpTransport::new(TcpLink::new("127.0.0.1", port, Duration::from_secs(1)))
}

fn decode_all(packets: &[Vec<u8>]) -> Vec<BridgePacket> {
    packets
        .iter()
        .map(|bytes| decode_packet(bytes).expect("valid frame").0)
        .collect()
}

#[test]
fn test_release_all_reaches_the_bridge() {
    // Arrange
    let (port, bridge) = fake_bridge(2);
    let mut transport = transport(port);

    // Act
    let sent = CommandSynthesizer::new().release_all(&mut transport);

    // Assert
    assert_eq!(sent.len(), 2);
    let received = bridge.join().expect("bridge thread");
    assert_eq!(
        decode_all(&received),
        vec![
            BridgePacket::keyboard_release(),
            BridgePacket::Mouse(MouseReport::neutral()),
        ]
    );
}

#[test]
fn test_duplicate_packet_is_not_put_on_the_wire() {
    // Arrange
    let (port, bridge) = fake_bridge(2);
    let mut transport = transport(port);
    let packet = BridgePacket::keyboard_release().encode();

    // Act
    let first = transport.send(&packet, false).expect("first send");
    let duplicate = transport.send(&packet, false).expect("duplicate");
    let forced = transport.send(&packet, true).expect("forced");

    // Assert
    assert_eq!(first, Dispatch::Sent);
    assert_eq!(duplicate, Dispatch::Suppressed);
    assert_eq!(forced, Dispatch::Sent);
    assert_eq!(bridge.join().expect("bridge thread").len(), 2);
}

#[test]
fn test_unreachable_bridge_is_an_error_not_a_panic() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let mut transport = TcpTransport::new(TcpLink::new("127.0.0.1", port, Duration::from_millis(300)));

    assert!(transport.send(&[0x57, 0xAB], false).is_err());
    assert_eq!(transport.last_sent(), None);
}

// ── End to end ────────────────────────────────────────────────────────────────

/// Synthetic frames; the capture that brings `remaining` to zero stops the pipeline.
struct LimitedSource {
    inner: SyntheticSource,
    remaining: u32,
    control: PipelineControl,
}

impl FrameSource for LimitedSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.inner.open()
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.control.stop();
        }
        self.inner.capture()
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

fn raised_hand_line() -> String {
    let mut joints = vec![[0.0, 0.0, 0.0]; Joint::COUNT];
    for (joint, x, y) in [
        (Joint::LeftShoulder, 400.0, 250.0),
        (Joint::LeftElbow, 420.0, 190.0),
        (Joint::LeftWrist, 430.0, 100.0),
        (Joint::RightShoulder, 300.0, 250.0),
    ] {
        joints[joint.index()] = [x, y, 0.9];
    }
    serde_json::to_string(&joints).expect("serialize pose")
}

fn scratch_recording(lines: &[String]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gesture_hid_rec_{}.jsonl", Uuid::new_v4()));
    std::fs::write(&path, lines.join("\n")).expect("write recording");
    path
}

#[test]
fn test_replayed_session_drives_the_bridge() {
    // Arrange: raised, nobody, raised; then shutdown releases.
    let recording = scratch_recording(&[raised_hand_line(), "[]".to_string()]);
    let estimator = ReplayEstimator::load(&recording).expect("load recording");
    let gestures = parse_gestures(
        r#"[{"name": "RightHandUp", "index": 5,
             "base_joint": "right_shoulder",
             "core_joints": ["right_elbow", "right_wrist"],
             "reference_vector": {"right_elbow": [20.0, -60.0], "right_wrist": [30.0, -150.0]},
             "keys": ["i"]}]"#,
        std::path::Path::new("inline"),
    )
    .expect("gestures");

    let (port, bridge) = fake_bridge(4);
    let control = PipelineControl::new(true);
    let mut pipeline = Pipeline::new(
        PipelineSettings {
            frame_interval: Duration::ZERO,
            ..PipelineSettings::default()
        },
        control.clone(),
        Box::new(estimator),
        Arc::new(StaticConfigSource::new(gestures)),
        Box::new(transport(port)),
    );
    let mut source = LimitedSource {
        inner: SyntheticSource::new(8, 8),
        remaining: 3,
        control,
    };

    // Act
    let stats = pipeline.run_serial(&mut source);

    // Assert
    let press = BridgePacket::Keyboard([0, 0, 0, 0, 0, 0, 0, 0x0C]);
    let release = BridgePacket::keyboard_release();
    let received = bridge.join().expect("bridge thread");
    assert_eq!(decode_all(&received), vec![press, release, press, release]);
    assert_eq!(stats.frames_processed, 3);
    assert_eq!(stats.commands_sent, 4);
    assert_eq!(pipeline.history(2).len(), 2);
    std::fs::remove_file(&recording).ok();
}
