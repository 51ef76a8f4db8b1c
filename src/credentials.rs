use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const ACCESS_KEY_ID_ENV: &str = "ESASECRET_ID";
pub const ACCESS_KEY_SECRET_ENV: &str = "ESASECRET_KEY";
pub const DEFAULT_KEY_FILE: &str = "key.txt";

const KEY_FILE_SEPARATOR: char = '：';

/// Vendor access key pair, resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    access_key_secret: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }

    /// Environment first, then the key file for whatever is still missing.
    pub fn resolve(sources: &CredentialSources) -> Option<Self> {
        let mut access_key_id = sources.access_key_id.clone().filter(|v| !v.is_empty());
        let mut access_key_secret = sources
            .access_key_secret
            .clone()
            .filter(|v| !v.is_empty());

        if access_key_id.is_none() || access_key_secret.is_none() {
            if let Some(contents) = read_key_file(&sources.key_file) {
                let (file_id, file_secret) = parse_key_file(&contents);
                access_key_id = access_key_id.or(file_id);
                access_key_secret = access_key_secret.or(file_secret);
            }
        }

        match (access_key_id, access_key_secret) {
            (Some(id), Some(secret)) => Some(Self::new(id, secret)),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Where credentials may come from.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub key_file: PathBuf,
}

impl CredentialSources {
    pub fn from_env(key_file: PathBuf) -> Self {
        Self {
            access_key_id: env::var(ACCESS_KEY_ID_ENV).ok(),
            access_key_secret: env::var(ACCESS_KEY_SECRET_ENV).ok(),
            key_file,
        }
    }
}

fn read_key_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            info!("Reading credentials from {}", path.display());
            Some(contents)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Failed to read key file {}: {}", path.display(), e);
            None
        }
    }
}

/// Lines look like `accessKeyId：LTAI...` with a full-width colon.
/// The first matching line for each field wins.
fn parse_key_file(contents: &str) -> (Option<String>, Option<String>) {
    let mut access_key_id = None;
    let mut access_key_secret = None;

    for line in contents.lines() {
        let is_id = line.contains("accessKeyId");
        let is_secret = line.contains("accessKeySecret");
        if !is_id && !is_secret {
            continue;
        }

        let Some((_, value)) = line.split_once(KEY_FILE_SEPARATOR) else {
            warn!("Skipping key file line without full-width colon separator");
            continue;
        };
        let value = value.split(KEY_FILE_SEPARATOR).next().unwrap_or("").trim();

        if is_id && access_key_id.is_none() {
            access_key_id = Some(value.to_string());
        }
        if is_secret && access_key_secret.is_none() {
            access_key_secret = Some(value.to_string());
        }
    }

    (
        access_key_id.filter(|v| !v.is_empty()),
        access_key_secret.filter(|v| !v.is_empty()),
    )
}
