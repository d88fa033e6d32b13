//! Camera adapter driven by an external capture command.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::utils::{expand_template, run_command};
use crate::app::ports::CapturePort;
use crate::error::VisionError;

/// Runs the configured argv template, e.g.
/// `["libcamera-still", "-o", "{output}", "--width", "{width}", "--height", "{height}"]`.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    template: Vec<String>,
}

impl CommandCamera {
    pub fn new(template: Vec<String>) -> Self {
        Self { template }
    }
}

impl CapturePort for CommandCamera {
    fn capture(&self, output: &Path, width: u32, height: u32) -> Result<PathBuf, VisionError> {
        if self.template.is_empty() {
            return Err(VisionError::NotConfigured("capture"));
        }
        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| VisionError::Spawn {
                program: format!("mkdir {}", dir.display()),
                source,
            })?;
        }

        let output_str = output.to_string_lossy();
        let (w, h) = (width.to_string(), height.to_string());
        let argv = expand_template(
            &self.template,
            &[("output", &output_str), ("width", &w), ("height", &h)],
        );
        debug!("capture: {argv:?}");
        run_command(&argv)?;

        if !output.is_file() {
            return Err(VisionError::BadOutput(format!(
                "capture command did not write {}",
                output.display()
            )));
        }
        Ok(output.to_path_buf())
    }
}
