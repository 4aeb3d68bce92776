use crate::error::WalletError;
use crate::wallet::{IdentityWallet, X509Identity};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension of identity files inside a wallet directory
pub const IDENTITY_FILE_EXTENSION: &str = "id";

/// Wallet keeping one JSON file per identity in a directory
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
    dir: PathBuf,
}

impl FileSystemWallet {
    /// Open the wallet at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<FileSystemWallet, WalletError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| WalletError::Io {
            path: dir.clone(),
            source,
        })?;
        log::debug!("wallet opened at {}", dir.display());
        Ok(FileSystemWallet { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn identity_path(&self, label: &str) -> Result<PathBuf, WalletError> {
        let valid = !label.is_empty()
            && label != "."
            && label != ".."
            && !label.contains(['/', '\\', '\0']);
        if !valid {
            return Err(WalletError::InvalidLabel(label.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{label}.{IDENTITY_FILE_EXTENSION}")))
    }
}

impl IdentityWallet for FileSystemWallet {
    fn exists(&self, label: &str) -> bool {
        self.identity_path(label)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    fn get(&self, label: &str) -> Result<Option<X509Identity>, WalletError> {
        let path = self.identity_path(label)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(WalletError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| WalletError::Format { path, source })
    }

    fn put(&self, label: &str, identity: &X509Identity) -> Result<(), WalletError> {
        let path = self.identity_path(label)?;
        let io_err = |source| WalletError::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, identity).map_err(|source| WalletError::Format {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
        log::info!("identity {label} stored in wallet {}", self.dir.display());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, WalletError> {
        let io_err = |source| WalletError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut labels = vec![];
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(IDENTITY_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                labels.push(stem.to_string());
            }
        }
        labels.sort();
        Ok(labels)
    }

    fn remove(&self, label: &str) -> Result<(), WalletError> {
        let path = self.identity_path(label)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("identity {label} removed from wallet {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WalletError::Io { path, source }),
        }
    }
}
