//! Persistent login session.
//!
//! Cookies live in a JSON jar next to the manifest so a second run within
//! the session lifetime reuses the login. The jar is a convenience: a
//! missing or unreadable file just means a fresh session.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use cookie_store::CookieStore;

use crate::error::{io_err, SessionError};

/// Result of reading a cookie jar from disk.
#[derive(Debug)]
pub enum CookieJarLoad {
    Loaded(CookieStore),
    Absent,
    /// The file exists but could not be parsed.
    Corrupt(String),
}

impl CookieJarLoad {
    /// The loaded store, or an empty one.
    pub fn into_store(self) -> CookieStore {
        match self {
            CookieJarLoad::Loaded(store) => store,
            CookieJarLoad::Absent | CookieJarLoad::Corrupt(_) => CookieStore::default(),
        }
    }
}

/// Read the jar at `path` without failing.
#[allow(deprecated)]
pub fn load_at(path: &Path) -> CookieJarLoad {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CookieJarLoad::Absent,
        Err(e) => return CookieJarLoad::Corrupt(e.to_string()),
    };
    match CookieStore::load_json(BufReader::new(file)) {
        Ok(store) => CookieJarLoad::Loaded(store),
        Err(e) => CookieJarLoad::Corrupt(e.to_string()),
    }
}

/// [`load_at`] with logging; always yields a usable store.
pub fn load_or_default(path: &Path) -> CookieStore {
    match load_at(path) {
        CookieJarLoad::Loaded(store) => {
            tracing::debug!("loaded cookies from {}", path.display());
            store
        }
        CookieJarLoad::Absent => {
            tracing::debug!("no cookie jar at {}; starting a new session", path.display());
            CookieStore::default()
        }
        CookieJarLoad::Corrupt(reason) => {
            tracing::info!(
                "cookie jar {} could not be read ({reason}); starting a new session",
                path.display()
            );
            CookieStore::default()
        }
    }
}

/// Write the jar atomically (`<path>.tmp` then rename). Session cookies are
/// included so the login survives until the server expires it.
#[allow(deprecated)]
pub fn save_at(path: &Path, store: &CookieStore) -> Result<(), SessionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut buf = Vec::new();
    store
        .save_incl_expired_and_nonpersistent_json(&mut buf)
        .map_err(|e| SessionError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let tmp = tmp_path(path);
    std::fs::write(&tmp, &buf).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
