//! Classifier adapter driven by an external command.
//!
//! The command receives the image path and prints `<label> <confidence>`
//! on its last non-empty stdout line.

use std::path::Path;

use log::debug;

use super::utils::{expand_template, run_command};
use crate::app::ports::{Classification, ClassifierPort};
use crate::error::VisionError;

#[derive(Debug, Clone)]
pub struct CommandClassifier {
    template: Vec<String>,
}

impl CommandClassifier {
    pub fn new(template: Vec<String>) -> Self {
        Self { template }
    }
}

impl ClassifierPort for CommandClassifier {
    fn classify(&self, image: &Path) -> Result<Classification, VisionError> {
        if self.template.is_empty() {
            return Err(VisionError::NotConfigured("classify"));
        }
        let image_str = image.to_string_lossy();
        let argv = expand_template(&self.template, &[("image", &image_str)]);
        debug!("classify: {argv:?}");
        parse_classifier_output(&run_command(&argv)?)
    }
}

/// Parse `<label> <confidence>` from classifier stdout.
///
/// Labels may contain spaces; the confidence is the last token and must lie
/// in `0.0..=1.0`.
pub fn parse_classifier_output(stdout: &str) -> Result<Classification, VisionError> {
    let bad = || VisionError::BadOutput(stdout.trim().to_string());
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or_else(bad)?;
    let (label, confidence) = line.rsplit_once(char::is_whitespace).ok_or_else(bad)?;
    let label = label.trim();
    let confidence: f32 = confidence.parse().map_err(|_| bad())?;
    if label.is_empty() || !(0.0..=1.0).contains(&confidence) {
        return Err(bad());
    }
    Ok(Classification {
        label: label.to_string(),
        confidence,
    })
}
