//! Capture-and-classify: the compound plant-state operation.
//!
//! Runs outside the control loop. The resulting label reaches the journal
//! through the controller's command queue, never by a second writer.

use std::path::Path;

use log::info;

use crate::config::VisionConfig;
use crate::error::VisionError;

use super::ports::{CapturePort, ClassifierPort, Classification};
use super::runner::ControllerHandle;

/// Capture a fresh image and classify it.
pub fn capture_and_classify(
    camera: &impl CapturePort,
    classifier: &impl ClassifierPort,
    cfg: &VisionConfig,
) -> Result<Classification, VisionError> {
    let image = camera.capture(&cfg.image_path, cfg.width, cfg.height)?;
    let verdict = classifier.classify(&image)?;
    info!(
        "classified {}: {} ({:.2})",
        image.display(),
        verdict.label,
        verdict.confidence
    );
    Ok(verdict)
}

/// Capture, classify and queue the label for the latest journal row.
///
/// Fails with [`VisionError::ControllerStopped`] if the loop has already
/// exited.
pub fn classify_and_record(
    camera: &impl CapturePort,
    classifier: &impl ClassifierPort,
    cfg: &VisionConfig,
    controller: &ControllerHandle,
) -> Result<Classification, VisionError> {
    let verdict = capture_and_classify(camera, classifier, cfg)?;
    if !controller.amend_visual_state(verdict.label.clone()) {
        return Err(VisionError::ControllerStopped);
    }
    Ok(verdict)
}

/// Whether the last captured image is on disk.
pub fn image_status(path: &Path) -> Option<&Path> {
    path.is_file().then_some(path)
}
