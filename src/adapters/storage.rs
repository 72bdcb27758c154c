use crate::domain::ports::CalibrationSource;
use crate::utils::error::{BedError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

/// A calibration file on the local file system.
#[derive(Debug, Clone)]
pub struct CalibrationFile {
    path: PathBuf,
}

impl CalibrationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationSource for CalibrationFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path).map_err(|e| BedError::InvalidCalibrationFile {
            file: self.name(),
            reason: format!("cannot open: {}", e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Directory holding calibration files; names resolve relative to it.
#[derive(Debug, Clone)]
pub struct LocalCalibrationStore {
    base_path: PathBuf,
}

impl LocalCalibrationStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn file(&self, name: &str) -> CalibrationFile {
        CalibrationFile::new(self.base_path.join(name))
    }

    /// Files in the directory with the given extension, sorted by name.
    pub fn list(&self, extension: &str) -> Result<Vec<CalibrationFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
                files.push(CalibrationFile::new(path));
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// Calibration text held in memory, e.g. embedded defaults or test fixtures.
#[derive(Debug, Clone)]
pub struct InlineCalibration {
    name: String,
    text: String,
}

impl InlineCalibration {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl CalibrationSource for InlineCalibration {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.text.as_bytes())))
    }
}
