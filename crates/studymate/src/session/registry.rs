//! Flat-file registry of session names
//!
//! One name per line. Creating a session appends a line; deleting one
//! rewrites the file through a temp file persisted over the old one.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Known session names, in creation order
#[derive(Debug)]
pub struct SessionRegistry {
    /// Backing text file
    path: PathBuf,
    /// Names as loaded and modified in this process
    names: Vec<String>,
}

impl SessionRegistry {
    /// Load the registry at `path`; a missing file is an empty registry
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let names = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let mut names: Vec<String> = Vec::new();
            for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if names.iter().any(|n| n == line) {
                    tracing::warn!("Duplicate session '{}' in {}, keeping the first", line, path.display());
                    continue;
                }
                names.push(line.to_string());
            }
            names
        } else {
            Vec::new()
        };

        tracing::debug!("Loaded {} sessions from {}", names.len(), path.display());
        Ok(Self { path, names })
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All session names in insertion order
    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Check that `name` can be stored as one registry line
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSessionName(name.to_string()));
        }
        Ok(())
    }

    /// Register a new session name
    pub fn create(&mut self, name: &str) -> Result<()> {
        Self::validate_name(name)?;
        if self.contains(name) {
            return Err(Error::SessionExists(name.to_string()));
        }

        self.append_line(name)?;
        self.names.push(name.to_string());
        tracing::info!("Registered session '{}'", name);
        Ok(())
    }

    /// Forget a session name
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(pos) = self.names.iter().position(|n| n == name) else {
            return Err(Error::SessionNotFound(name.to_string()));
        };

        let mut remaining = self.names.clone();
        remaining.remove(pos);
        self.rewrite(&remaining)?;
        self.names = remaining;

        tracing::info!("Removed session '{}'", name);
        Ok(())
    }

    /// Fail with `SessionNotFound` unless `name` is registered
    pub fn require(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(Error::SessionNotFound(name.to_string()))
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn append_line(&self, name: &str) -> Result<()> {
        std::fs::create_dir_all(self.parent_dir())?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A hand-edited file may lack the final newline
        let len = file.metadata()?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }

        writeln!(file, "{}", name)?;
        Ok(())
    }

    fn rewrite(&self, names: &[String]) -> Result<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        for name in names {
            writeln!(tmp, "{}", name)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
