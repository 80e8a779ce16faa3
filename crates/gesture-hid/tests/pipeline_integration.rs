//! Integration tests for the processing pipeline.
//!
//! The estimator is mocked with `mockall`; the gesture file, transport dedup
//! and synthesizer are the real ones, with packets captured by a
//! [`RecordingLink`].

use std::sync::Arc;
use std::time::Duration;

use mockall::{mock, Sequence};
use uuid::Uuid;

use gesture_core::{decode_packet, BridgePacket, Joint, KeypointSet};
use gesture_hid::application::pipeline::{Pipeline, PipelineControl, PipelineSettings};
use gesture_hid::application::sources::{
    ConfigSource, Estimation, EstimatorError, Frame, PoseEstimator, RawPose,
};
use gesture_hid::infrastructure::storage::gestures::FileConfigSource;
use gesture_hid::infrastructure::transport::mock::RecordingLink;
use gesture_hid::infrastructure::transport::Transport;

mock! {
    pub Estimator {}

    impl PoseEstimator for Estimator {
        fn infer(&mut self, frame: &Frame) -> Result<Estimation, EstimatorError>;
        fn pose_to_keypoints(&self, pose: &RawPose, min_confidence: f32) -> KeypointSet;
    }
}

const GESTURES_I: &str = r#"{
    "templates": [{
        "name": "RightHandUp", "index": 5,
        "base_joint": "right_shoulder",
        "core_joints": ["right_elbow", "right_wrist"],
        "reference_vector": {"right_elbow": [20.0, -60.0], "right_wrist": [30.0, -150.0]},
        "keys": ["i"]
    }],
    "rules": []
}"#;

const GESTURES_J: &str = r#"{
    "templates": [{
        "name": "RightHandUp", "index": 5,
        "base_joint": "right_shoulder",
        "core_joints": ["right_elbow", "right_wrist"],
        "reference_vector": {"right_elbow": [20.0, -60.0], "right_wrist": [30.0, -150.0]},
        "keys": ["j"]
    }],
    "rules": [{"required": [5], "symbols": ["mouse_left_click"]}]
}"#;

/// The user's physical right hand raised, as the un-mirrored model sees it.
fn raised_hand() -> RawPose {
    let mut joints = vec![[0.0, 0.0, 0.0]; Joint::COUNT];
    for (joint, x, y) in [
        (Joint::LeftShoulder, 400.0, 250.0),
        (Joint::LeftElbow, 420.0, 190.0),
        (Joint::LeftWrist, 430.0, 100.0),
        (Joint::RightShoulder, 300.0, 250.0),
        (Joint::RightElbow, 300.0, 330.0),
        (Joint::RightWrist, 300.0, 420.0),
    ] {
        joints[joint.index()] = [x, y, 0.95];
    }
    RawPose { joints }
}

fn scratch_gestures(contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("gesture_hid_it_{}.json", Uuid::new_v4()));
    std::fs::write(&path, contents).expect("write gestures");
    path
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        frame_interval: Duration::ZERO,
        ..PipelineSettings::default()
    }
}

fn decoded(link: &RecordingLink) -> Vec<BridgePacket> {
    link.delivered()
        .iter()
        .map(|bytes| decode_packet(bytes).expect("valid frame").0)
        .collect()
}

fn key_report(code: u8) -> BridgePacket {
    BridgePacket::Keyboard([0, 0, 0, 0, 0, 0, 0, code])
}

#[test]
fn test_pose_sequence_produces_press_release_press() {
    // Arrange
    let mut estimator = MockEstimator::new();
    let mut seq = Sequence::new();
    for poses in [vec![raised_hand()], vec![raised_hand()], vec![], vec![raised_hand()]] {
        estimator
            .expect_infer()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| {
                Ok(Estimation {
                    poses: poses.clone(),
                    annotated: None,
                })
            });
    }
    estimator
        .expect_pose_to_keypoints()
        .returning(|pose, min| pose.to_keypoints(min));

    let path = scratch_gestures(GESTURES_I);
    let gestures: Arc<dyn ConfigSource> = Arc::new(FileConfigSource::open(&path).expect("open"));
    let link = RecordingLink::new();
    let mut pipeline = Pipeline::new(
        settings(),
        PipelineControl::new(true),
        Box::new(estimator),
        gestures,
        Box::new(Transport::new(link.clone())),
    );

    // Act
    for i in 0..4 {
        pipeline.process_frame(&Frame::blank(i, 8, 8));
    }

    // Assert
    assert_eq!(
        decoded(&link),
        vec![key_report(0x0C), BridgePacket::keyboard_release(), key_report(0x0C)]
    );
    let stats = pipeline.stats();
    assert_eq!(stats.frames_processed, 4);
    assert_eq!(stats.poses_detected, 3);
    assert_eq!(stats.commands_sent, 3);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_reloaded_gestures_apply_from_the_next_cycle() {
    // Arrange
    let mut estimator = MockEstimator::new();
    estimator.expect_infer().returning(|_| {
        Ok(Estimation {
            poses: vec![raised_hand()],
            annotated: None,
        })
    });
    estimator
        .expect_pose_to_keypoints()
        .returning(|pose, min| pose.to_keypoints(min));

    let path = scratch_gestures(GESTURES_I);
    let file = Arc::new(FileConfigSource::open(&path).expect("open"));
    let link = RecordingLink::new();
    let mut pipeline = Pipeline::new(
        settings(),
        PipelineControl::new(true),
        Box::new(estimator),
        Arc::clone(&file) as Arc<dyn ConfigSource>,
        Box::new(Transport::new(link.clone())),
    );

    // Act
    pipeline.process_frame(&Frame::blank(0, 8, 8));
    std::fs::write(&path, GESTURES_J).expect("rewrite");
    assert!(file.reload().expect("reload"));
    let report = pipeline.process_frame(&Frame::blank(1, 8, 8));

    // Assert: "j" replaces "i" and the explicit rule adds a left click.
    assert_eq!(report.symbols, vec!["mouse_left_click", "j"]);
    assert_eq!(
        decoded(&link)[1..],
        [
            key_report(0x0D),
            BridgePacket::Mouse(gesture_core::MouseReport {
                buttons: 0x01,
                ..Default::default()
            }),
        ]
    );
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_muted_pipeline_keeps_classifying_and_resumes_cleanly() {
    // Arrange
    let mut estimator = MockEstimator::new();
    estimator.expect_infer().returning(|_| {
        Ok(Estimation {
            poses: vec![raised_hand()],
            annotated: None,
        })
    });
    estimator
        .expect_pose_to_keypoints()
        .returning(|pose, min| pose.to_keypoints(min));

    let path = scratch_gestures(GESTURES_I);
    let control = PipelineControl::new(false);
    let link = RecordingLink::new();
    let mut pipeline = Pipeline::new(
        settings(),
        control.clone(),
        Box::new(estimator),
        Arc::new(FileConfigSource::open(&path).expect("open")),
        Box::new(Transport::new(link.clone())),
    );

    // Act
    let muted = pipeline.process_frame(&Frame::blank(0, 8, 8));
    control.set_sending(true);
    pipeline.process_frame(&Frame::blank(1, 8, 8));

    // Assert
    assert_eq!(muted.matches.len(), 1);
    assert!(muted.sent.is_empty());
    assert_eq!(decoded(&link), vec![key_report(0x0C)]);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_failing_link_does_not_stop_the_pipeline() {
    // Arrange
    let mut estimator = MockEstimator::new();
    estimator.expect_infer().returning(|_| {
        Ok(Estimation {
            poses: vec![raised_hand()],
            annotated: None,
        })
    });
    estimator
        .expect_pose_to_keypoints()
        .returning(|pose, min| pose.to_keypoints(min));

    let path = scratch_gestures(GESTURES_I);
    let link = RecordingLink::new();
    link.set_failing(true);
    let mut pipeline = Pipeline::new(
        settings(),
        PipelineControl::new(true),
        Box::new(estimator),
        Arc::new(FileConfigSource::open(&path).expect("open")),
        Box::new(Transport::new(link.clone())),
    );

    // Act
    let lost = pipeline.process_frame(&Frame::blank(0, 8, 8));
    link.set_failing(false);
    let recovered = pipeline.process_frame(&Frame::blank(1, 8, 8));

    // Assert
    assert!(lost.sent.is_empty());
    assert_eq!(recovered.sent.len(), 1);
    assert_eq!(decoded(&link), vec![key_report(0x0C)]);
    std::fs::remove_file(&path).ok();
}
