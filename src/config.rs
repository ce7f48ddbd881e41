use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use tracing::warn;

use crate::group::Alphabet;
use crate::recents::DEFAULT_RECENTS_LIMIT;
use crate::store::EditIdentity;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "dialbook";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub documents_dir: PathBuf,
    pub address_book: Option<PathBuf>,
    pub alphabet: Alphabet,
    pub recents_limit: usize,
    pub edit_identity: EditIdentity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    documents_dir: Option<PathBuf>,
    address_book: Option<PathBuf>,
    alphabet: Option<AlphabetDef>,
    recents_limit: Option<usize>,
    edit_identity: EditIdentity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AlphabetDef {
    Named(String),
    Letters(Vec<String>),
}

impl AlphabetDef {
    fn into_alphabet(self) -> Result<Alphabet> {
        match self {
            AlphabetDef::Named(name) => match name.trim().to_ascii_lowercase().as_str() {
                "ascii" => Ok(Alphabet::ascii()),
                "icelandic" => Ok(Alphabet::icelandic()),
                other => bail!("unknown alphabet `{other}` (expected \"ascii\", \"icelandic\" or a list of letters)"),
            },
            AlphabetDef::Letters(letters) => {
                let mut chars = Vec::with_capacity(letters.len());
                for letter in letters {
                    let mut it = letter.trim().chars();
                    match (it.next(), it.next()) {
                        (Some(c), None) => chars.push(c),
                        _ => bail!("alphabet entries must be single letters, got `{letter}`"),
                    }
                }
                if chars.is_empty() {
                    bail!("alphabet must contain at least one letter");
                }
                Ok(Alphabet::new(chars))
            }
        }
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

fn default_documents_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

/// Load configuration from `path`, or the default location. A missing file
/// means defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        return from_file(path, ConfigFile::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(path, &raw)
}

pub fn parse(path: PathBuf, raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    from_file(path, cfg_file)
}

fn from_file(config_path: PathBuf, cfg_file: ConfigFile) -> Result<Config> {
    let documents_dir = match cfg_file.documents_dir {
        Some(dir) => expand_tilde(&dir),
        None => default_documents_dir()?,
    };

    let alphabet = match cfg_file.alphabet {
        Some(def) => def
            .into_alphabet()
            .with_context(|| format!("invalid `alphabet` in {}", config_path.display()))?,
        None => Alphabet::default(),
    };

    let recents_limit = match cfg_file.recents_limit {
        Some(0) => bail!("`recents_limit` must be at least 1"),
        Some(limit) => limit,
        None => DEFAULT_RECENTS_LIMIT,
    };

    Ok(Config {
        config_path,
        documents_dir,
        address_book: cfg_file.address_book.map(|p| expand_tilde(&p)),
        alphabet,
        recents_limit,
        edit_identity: cfg_file.edit_identity,
    })
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "documents_dir",
        "address_book",
        "alphabet",
        "recents_limit",
        "edit_identity",
    ]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warn!(key = %key, "unknown configuration key");
        }
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(raw: &str) -> Result<Config> {
        parse(PathBuf::from("/tmp/dialbook/config.toml"), raw)
    }

    #[test]
    fn test_defaults() {
        let config = parse_str("documents_dir = \"/data/dialbook\"").unwrap();
        assert_eq!(config.documents_dir, PathBuf::from("/data/dialbook"));
        assert_eq!(config.address_book, None);
        assert_eq!(config.alphabet, Alphabet::ascii());
        assert_eq!(config.recents_limit, 100);
        assert_eq!(config.edit_identity, EditIdentity::Preserve);
    }

    #[test]
    fn test_full_config() {
        let config = parse_str(
            r#"
            documents_dir = "/data"
            address_book = "/data/export.json"
            alphabet = "icelandic"
            recents_limit = 25
            edit_identity = "regenerate"
            "#,
        )
        .unwrap();
        assert_eq!(config.address_book, Some(PathBuf::from("/data/export.json")));
        assert_eq!(config.alphabet, Alphabet::icelandic());
        assert_eq!(config.recents_limit, 25);
        assert_eq!(config.edit_identity, EditIdentity::Regenerate);
    }

    #[test]
    fn test_letter_list_alphabet() {
        let config = parse_str("documents_dir = \"/d\"\nalphabet = [\"a\", \"b\", \"ð\"]").unwrap();
        assert_eq!(config.alphabet.letters(), &['A', 'B', 'Ð']);
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_str("documents_dir = \"/d\"\nalphabet = \"klingon\"").is_err());
        assert!(parse_str("documents_dir = \"/d\"\nalphabet = [\"ab\"]").is_err());
        assert!(parse_str("documents_dir = \"/d\"\nalphabet = []").is_err());
        assert!(parse_str("documents_dir = \"/d\"\nrecents_limit = 0").is_err());
        assert!(parse_str("documents_dir = \"/d\"\nedit_identity = \"sometimes\"").is_err());
        assert!(parse_str("documents_dir = [").is_err());
    }

    #[test]
    fn test_unknown_keys_are_not_fatal() {
        assert!(parse_str("documents_dir = \"/d\"\ntheme = \"dark\"").is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = load(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.recents_limit, 100);
        assert_eq!(config.alphabet, Alphabet::ascii());
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }
}
