//! Shared helpers for the external-command adapters.
//!
//! The camera and the classifier are both driven by argv templates from
//! the configuration; expansion and execution live here.

use std::process::Command;

use crate::error::VisionError;

/// Substitute `{name}` placeholders in every argument.
///
/// Unknown placeholders are left untouched.
pub(super) fn expand_template(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

/// Run `argv` to completion and return its stdout.
pub(super) fn run_command(argv: &[String]) -> Result<String, VisionError> {
    let (program, args) = argv
        .split_first()
        .ok_or(VisionError::NotConfigured("command"))?;
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| VisionError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(VisionError::Failed {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
