//! The sample files under `config/` must stay loadable.

use std::path::PathBuf;

use gesture_hid::application::sources::ConfigSource;
use gesture_hid::infrastructure::estimator::create_estimator;
use gesture_hid::infrastructure::storage::config::{load_config_from, EstimatorBackend, PipelineMode};
use gesture_hid::infrastructure::storage::gestures::FileConfigSource;

fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

#[test]
fn test_sample_config_loads_and_resolves_paths() {
    // Act
    let config = load_config_from(&sample_dir().join("config.toml")).expect("sample config");

    // Assert
    assert_eq!(config.pipeline.mode, PipelineMode::Async);
    assert_eq!(config.estimator.backend, EstimatorBackend::Replay);
    let gestures = config.gestures.path.expect("gestures path");
    assert!(gestures.exists());
}

#[test]
fn test_sample_gestures_and_recording_load() {
    let config = load_config_from(&sample_dir().join("config.toml")).expect("sample config");

    let source = FileConfigSource::open(config.gestures.path.clone().expect("path")).expect("gestures");
    let snapshot = source.current();
    assert_eq!(snapshot.templates.len(), 6);
    assert_eq!(snapshot.mapper.rules()[0].required, vec![5, 6]);

    assert!(create_estimator(&config.estimator).is_ok());
}
