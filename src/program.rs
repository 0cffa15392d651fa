//! Loading of the OpenCL C kernel source.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{BenchError, Result};

/// OpenCL C source text of the multiplication kernel.
#[derive(Debug, Clone)]
pub struct KernelSource {
    path: PathBuf,
    text: String,
}

impl KernelSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|e| BenchError::KernelSource {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Err(BenchError::KernelSource {
                path,
                message: "file is empty".to_string(),
            });
        }
        info!(path = %path.display(), bytes = text.len(), "read kernel source");
        Ok(Self { path, text })
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: PathBuf::from("<inline>"),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
