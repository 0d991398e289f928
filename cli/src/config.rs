//! Account configuration for the command-line front end.
//!
//! The file is TOML with a single `[account]` table:
//!
//! ```toml
//! [account]
//! user = "4912345"
//! password = "secret"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "~/.sipgate.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to determine the home directory")]
    NoHomeDir,

    #[error("unable to find config file '{}'", path.display())]
    NotFound { path: PathBuf },

    #[error("unable to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration file '{}': {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    account: AccountSection,
}

#[derive(Debug, Deserialize)]
struct AccountSection {
    user: String,
    password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

pub fn load_account(path: &Path) -> Result<Account, ConfigError> {
    let full_path = expand_home(path)?;
    let contents = match fs::read_to_string(&full_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %full_path.display(), "loaded account configuration");

    Ok(Account {
        user: parsed.account.user,
        password: parsed.account.password,
    })
}

/// Credentials from the command line or environment win over the file.
///
/// The file is not read at all when both parts are given.
pub fn resolve_account(
    path: &Path,
    user: Option<String>,
    password: Option<String>,
) -> Result<Account, ConfigError> {
    if let (Some(user), Some(password)) = (&user, &password) {
        return Ok(Account {
            user: user.clone(),
            password: password.clone(),
        });
    }

    let mut account = load_account(path)?;
    if let Some(user) = user {
        account.user = user;
    }
    if let Some(password) = password {
        account.password = password;
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_account_table() {
        let file = config_file("[account]\nuser = \"alice\"\npassword = \"s3cret\"\n");
        let account = load_account(file.path()).unwrap();
        assert_eq!(account.user, "alice");
        assert_eq!(account.password, "s3cret");
        assert!(!format!("{account:?}").contains("s3cret"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_account(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().starts_with("unable to find config file"));
    }

    #[test]
    fn missing_key_or_bad_syntax_is_invalid() {
        let file = config_file("[account]\nuser = \"alice\"\n");
        assert!(matches!(
            load_account(file.path()),
            Err(ConfigError::Invalid { .. })
        ));

        let file = config_file("user = alice");
        assert!(matches!(
            load_account(file.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn overrides_win_over_file() {
        let file = config_file("[account]\nuser = \"alice\"\npassword = \"s3cret\"\n");
        let account = resolve_account(file.path(), None, Some("other".to_owned())).unwrap();
        assert_eq!(account.user, "alice");
        assert_eq!(account.password, "other");
    }

    #[test]
    fn full_override_skips_file() {
        let account = resolve_account(
            Path::new("/definitely/not/here.toml"),
            Some("bob".to_owned()),
            Some("pw".to_owned()),
        )
        .unwrap();
        assert_eq!(account.user, "bob");
    }

    #[test]
    fn expand_home_leaves_plain_paths_alone() {
        let path = Path::new("/etc/sipgate.toml");
        assert_eq!(expand_home(path).unwrap(), path);
    }
}
