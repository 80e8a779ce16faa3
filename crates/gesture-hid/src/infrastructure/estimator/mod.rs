//! Pose estimator backends.
//!
//! The backend is chosen once at startup from `[estimator].backend` and
//! handed to the pipeline as a `Box<dyn PoseEstimator>`; nothing branches on
//! the backend per frame.
//!
//! - `none`   – [`NoneEstimator`], never sees anybody.
//! - `replay` – [`replay::ReplayEstimator`], plays back recorded keypoints.

pub mod replay;

use tracing::info;

use crate::application::sources::{Estimation, EstimatorError, Frame, PoseEstimator};
use crate::infrastructure::storage::config::{EstimatorBackend, EstimatorConfig};

pub use replay::ReplayEstimator;

/// Reports an empty scene for every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneEstimator;

impl PoseEstimator for NoneEstimator {
    fn infer(&mut self, _frame: &Frame) -> Result<Estimation, EstimatorError> {
        Ok(Estimation::default())
    }
}

/// Builds the estimator named in the config.
///
/// # Errors
///
/// [`EstimatorError::MissingPath`] when a file-backed backend has no path,
/// or whatever loading that file returned.
pub fn create_estimator(config: &EstimatorConfig) -> Result<Box<dyn PoseEstimator>, EstimatorError> {
    match config.backend {
        EstimatorBackend::None => {
            info!("pose estimator disabled, no gestures will be detected");
            Ok(Box::new(NoneEstimator))
        }
        EstimatorBackend::Replay => {
            let path = config
                .path
                .as_deref()
                .ok_or(EstimatorError::MissingPath("replay"))?;
            let estimator = ReplayEstimator::load(path)?;
            info!(
                "replaying {} recorded frames from {}",
                estimator.len(),
                path.display()
            );
            Ok(Box::new(estimator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_estimator_reports_empty_scene() {
        let mut estimator = NoneEstimator;
        let estimation = estimator.infer(&Frame::blank(0, 1, 1)).unwrap();
        assert!(estimation.poses.is_empty());
        assert!(estimation.annotated.is_none());
    }

    #[test]
    fn test_replay_without_path_is_rejected() {
        let config = EstimatorConfig {
            backend: EstimatorBackend::Replay,
            ..EstimatorConfig::default()
        };
        assert!(matches!(
            create_estimator(&config),
            Err(EstimatorError::MissingPath("replay"))
        ));
    }

    #[test]
    fn test_default_config_builds_none_backend() {
        let mut estimator = create_estimator(&EstimatorConfig::default()).unwrap();
        assert!(estimator.infer(&Frame::blank(0, 1, 1)).unwrap().poses.is_empty());
    }
}
