//! On-disk token cache at `~/.lexi/credentials.json`.
//!
//! Writes go through `.tmp` + rename so a crash never leaves half a file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::Profile;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Credentials {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_LEEWAY_SECS) > now
    }
}

/// Where credentials live. `None` keeps them in memory only.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: Option<PathBuf>,
}

impl CredentialStore {
    pub fn default_location() -> Self {
        Self {
            path: dirs::home_dir().map(|h| h.join(".lexi").join("credentials.json")),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Reads cached credentials. Missing or unreadable files yield `None`.
    pub fn load(&self) -> Option<Credentials> {
        let path = self.path.as_ref()?;
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read credentials {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(creds) => {
                debug!("Loaded cached credentials from {}", path.display());
                Some(creds)
            }
            Err(e) => {
                warn!("Ignoring malformed credentials file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, creds: &Credentials) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write_json(path, creds)
    }

    pub fn clear(&self) -> io::Result<()> {
        match &self.path {
            Some(path) => match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
