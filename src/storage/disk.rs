//! Disk manager for textdb
//!
//! This module handles reading and rewriting the single database file,
//! passing every read through [`Envelope::open`] and every write through
//! [`Envelope::seal`] when a key is configured.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::codec;
use super::envelope::{self, Envelope};
use crate::catalog::Catalog;
use crate::error::{Error, Result};

/// Disk manager
#[derive(Debug)]
pub struct DiskManager {
    /// Path of the database file
    path: PathBuf,
    /// Session envelope, fixed for the lifetime of the manager
    envelope: Option<Envelope>,
}

impl DiskManager {
    pub fn new(path: impl AsRef<Path>, envelope: Option<Envelope>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            envelope,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.envelope.is_some()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the file exactly as stored
    pub fn read_raw(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(self.path.display().to_string()),
            _ => Error::IoError(e),
        })
    }

    pub fn write_raw(&self, data: &str) -> Result<()> {
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Read the file and return its plaintext
    pub fn read(&self) -> Result<String> {
        let raw = self.read_raw()?;
        if raw.trim().is_empty() {
            return Ok(String::new());
        }
        match (&self.envelope, envelope::is_sealed(&raw)) {
            (Some(envelope), true) => envelope.open(&raw),
            (Some(_), false) => Err(Error::Decryption(format!(
                "'{}' is not sealed but an encryption key is configured",
                self.path.display()
            ))),
            (None, true) => Err(Error::Decryption(format!(
                "'{}' is sealed and no encryption key was supplied",
                self.path.display()
            ))),
            (None, false) => Ok(raw),
        }
    }

    /// Write plaintext, sealing it first when a key is configured
    pub fn write(&self, plaintext: &str) -> Result<()> {
        match &self.envelope {
            Some(envelope) => self.write_raw(&envelope.seal(plaintext)?),
            None => self.write_raw(plaintext),
        }
    }

    /// Parse every table segment in the file
    pub fn load(&self) -> Result<Catalog> {
        let text = self.read()?;
        Ok(Catalog::from_tables(codec::parse(&text)?))
    }

    /// Rewrite the whole file from `catalog`
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let text = codec::render(catalog.tables());
        debug!(
            path = %self.path.display(),
            tables = catalog.tables().len(),
            bytes = text.len(),
            "flushing database"
        );
        self.write(&text)
    }

    /// Seal a plaintext file in place when a key is configured.
    ///
    /// Returns true if the file was rewritten.
    pub fn seal_in_place(&self) -> Result<bool> {
        let Some(envelope) = &self.envelope else {
            return Ok(false);
        };
        let raw = self.read_raw()?;
        if envelope::is_sealed(&raw) {
            return Ok(false);
        }
        // Parse first so a corrupt file is never sealed.
        codec::parse(&raw)?;
        self.write_raw(&envelope.seal(&raw)?)?;
        info!(path = %self.path.display(), "sealed plaintext database file");
        Ok(true)
    }

    /// Replace a sealed file with its plaintext.
    pub fn unseal_in_place(&self) -> Result<()> {
        let plaintext = self.read()?;
        self.write_raw(&plaintext)?;
        info!(path = %self.path.display(), "removed encryption from database file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;
    use tempfile::tempdir;

    fn sample_catalog() -> Catalog {
        let mut users = Table::new("Users", ["name", "age"]);
        users.add_values(&["1", "pedro", "32"], false).unwrap();
        Catalog::from_tables(vec![users])
    }

    #[test]
    fn test_plain_save_and_load() {
        let dir = tempdir().unwrap();
        let disk = DiskManager::new(dir.path().join("db.txt"), None);

        disk.save(&sample_catalog()).unwrap();
        assert!(disk.read_raw().unwrap().starts_with("////"));
        assert_eq!(disk.load().unwrap(), sample_catalog());
    }

    #[test]
    fn test_sealed_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.txt");
        let disk = DiskManager::new(&path, Some(Envelope::from_passphrase("key")));

        disk.save(&sample_catalog()).unwrap();
        assert!(envelope::is_sealed(&disk.read_raw().unwrap()));
        assert_eq!(disk.load().unwrap(), sample_catalog());

        let plain = DiskManager::new(&path, None);
        assert!(matches!(plain.load(), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_seal_and_unseal_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.txt");
        DiskManager::new(&path, None).save(&sample_catalog()).unwrap();

        let disk = DiskManager::new(&path, Some(Envelope::from_passphrase("key")));
        assert!(disk.seal_in_place().unwrap());
        assert!(!disk.seal_in_place().unwrap());
        assert_eq!(disk.load().unwrap(), sample_catalog());

        disk.unseal_in_place().unwrap();
        let plain = DiskManager::new(&path, None);
        assert_eq!(plain.load().unwrap(), sample_catalog());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let disk = DiskManager::new(dir.path().join("absent.txt"), None);
        assert!(matches!(disk.load(), Err(Error::FileNotFound(_))));
    }
}
