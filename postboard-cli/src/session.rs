use anyhow::{Context, Result};
use postboard_client::Session;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_FILE_NAME: &str = ".postboard_session.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    user_id: String,
    email: String,
}

/// Signed-in user persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    pub session: Session,
    pub email: String,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(DEFAULT_FILE_NAME)
            }
        };

        Ok(Self { path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn save(&self, saved: &SavedSession) -> Result<()> {
        let stored = StoredSession {
            token: saved.session.token.clone(),
            user_id: saved.session.user_id.clone(),
            email: saved.email.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to save session to {:?}", self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// A missing or unreadable file means "not logged in".
    pub fn load(&self) -> Result<Option<SavedSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session file"),
        };

        let Ok(stored) = serde_json::from_str::<StoredSession>(&raw) else {
            return Ok(None);
        };

        if stored.token.is_empty() || stored.user_id.is_empty() {
            return Ok(None);
        }

        Ok(Some(SavedSession {
            session: Session {
                token: stored.token,
                user_id: stored.user_id,
            },
            email: stored.email,
        }))
    }

    /// Returns whether a session file was removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove session file {:?}", self.path))?;
        Ok(true)
    }
}
