//! Parameters persisted as `NAME="VALUE"` lines in the launch script.
//!
//! The script stays human-editable: writes replace only the assignment lines
//! of the variable, keep every other line byte for byte, and land through a
//! temp file and rename so a crash never leaves a half-written script.
//!
//! A variable assigned more than once reads as its last assignment, as the
//! shell sees it, and a write rewrites every one of them.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;
use sonic_core::{ConfigStoreError, ConfigStorePort};
use tracing::debug;

/// Shell script holding `NAME="VALUE"` assignments.
#[derive(Debug, Clone)]
pub struct ShellVarFile {
    path: PathBuf,
}

impl ShellVarFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: &std::io::Error) -> ConfigStoreError {
        ConfigStoreError::Io {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    fn read_content(&self) -> Result<String, ConfigStoreError> {
        fs::read_to_string(&self.path).map_err(|e| self.io_error(&e))
    }

    fn assignment(variable: &str) -> Result<Regex, ConfigStoreError> {
        Regex::new(&format!(r#"(?m)^{}="(?P<value>[^"\n]*)"\s*$"#, regex::escape(variable)))
            .map_err(|e| ConfigStoreError::Malformed {
                variable: variable.to_string(),
                reason: e.to_string(),
            })
    }

    fn any_assignment(variable: &str) -> Result<Regex, ConfigStoreError> {
        Regex::new(&format!(r"(?m)^{}=.*$", regex::escape(variable))).map_err(|e| {
            ConfigStoreError::Malformed {
                variable: variable.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn write_atomically(&self, content: &str) -> Result<(), ConfigStoreError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self.path.with_file_name(format!(".{file_name}.tmp"));

        replace_file(&tmp, &self.path, content).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.io_error(&e)
        })
    }
}

fn replace_file(tmp: &Path, path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    // Keep the executable bit of the launch script.
    fs::set_permissions(tmp, fs::metadata(path)?.permissions())?;
    fs::rename(tmp, path)
}

impl ConfigStorePort for ShellVarFile {
    fn read(&self, variable: &str) -> Result<String, ConfigStoreError> {
        let content = self.read_content()?;
        if let Some(caps) = Self::assignment(variable)?.captures_iter(&content).last() {
            return Ok(caps["value"].to_string());
        }
        if Self::any_assignment(variable)?.is_match(&content) {
            return Err(ConfigStoreError::Malformed {
                variable: variable.to_string(),
                reason: "value is not a double-quoted string".to_string(),
            });
        }
        Err(ConfigStoreError::UnknownVariable(variable.to_string()))
    }

    fn write(&self, variable: &str, value: &str) -> Result<(), ConfigStoreError> {
        if value.contains(['"', '\n', '\\', '$', '`']) {
            return Err(ConfigStoreError::Malformed {
                variable: variable.to_string(),
                reason: format!("value {value:?} cannot be stored in double quotes"),
            });
        }

        let content = self.read_content()?;
        let line = Self::any_assignment(variable)?;
        if !line.is_match(&content) {
            return Err(ConfigStoreError::UnknownVariable(variable.to_string()));
        }

        let replacement = format!("{variable}=\"{value}\"");
        let updated = line.replace_all(&content, regex::NoExpand(&replacement));
        self.write_atomically(&updated)?;
        debug!(path = %self.path.display(), variable, value, "Persisted parameter");
        Ok(())
    }
}
