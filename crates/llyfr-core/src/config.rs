//! Configuration for llyfr
//!
//! Settings come from a TOML file, then environment variables, then whatever
//! the caller sets explicitly (command-line flags).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlyfrError, Result, Stage};

pub const ENV_LIBRARY_PATH: &str = "LLYFR_LIBRARY_PATH";
pub const ENV_BIBFILE: &str = "LLYFR_BIBFILE";
pub const ENV_ADS_TOKEN: &str = "ADS_API_TOKEN";

const DEFAULT_API_URL: &str = "https://api.adsabs.harvard.edu/v1";
const DEFAULT_GATEWAY_URL: &str = "https://ui.adsabs.harvard.edu/link_gateway";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlyfrConfig {
    pub library: LibraryConfig,
    pub ads: AdsConfig,
}

/// Where the bibliography and its documents live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding attached documents
    pub path: Option<PathBuf>,
    /// The `.bib` file
    pub bibfile: Option<PathBuf>,
}

/// ADS API access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    pub token: Option<String>,
    pub api_url: String,
    /// Base of the full-text link gateway
    pub gateway_url: String,
    /// Maximum search results
    pub rows: u32,
    pub timeout_secs: u64,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            rows: 50,
            timeout_secs: 30,
        }
    }
}

impl LlyfrConfig {
    /// `<config dir>/llyfr/config.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("llyfr").join("config.toml"))
    }

    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    /// Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading configuration");
        let text = fs::read_to_string(path).map_err(LlyfrError::io(Stage::ReadConfig, path))?;
        Self::from_toml(&text).map_err(|e| {
            LlyfrError::Validation(format!("Invalid configuration in {}: {e}", path.display()))
        })
    }

    /// Override settings from variables found by `lookup`; blank values are
    /// ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = var(ENV_LIBRARY_PATH) {
            self.library.path = Some(PathBuf::from(path));
        }
        if let Some(bibfile) = var(ENV_BIBFILE) {
            self.library.bibfile = Some(PathBuf::from(bibfile));
        }
        if let Some(token) = var(ENV_ADS_TOKEN) {
            self.ads.token = Some(token);
        }
    }

    /// Library directory and bibliography, both required
    pub fn validate_library(&self) -> Result<(&Path, &Path)> {
        let path = self
            .library
            .path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| LlyfrError::Validation("Path to bibliography missing".to_string()))?;
        let bibfile = self
            .library
            .bibfile
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| LlyfrError::Validation("Path to .bib file missing".to_string()))?;

        if !bibfile.to_string_lossy().ends_with(".bib") {
            return Err(LlyfrError::Validation(format!(
                "Invalid .bib file selected: {}",
                bibfile.display()
            )));
        }

        Ok((path, bibfile))
    }

    pub fn validate_ads(&self) -> Result<&str> {
        self.ads
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| LlyfrError::Validation("ADS API token missing".to_string()))
    }

    /// Copy safe to print, with the token masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(token) = config.ads.token.as_mut() {
            *token = mask(token);
        }
        config
    }
}

/// Keep the last four characters of long tokens
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("****{visible}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LlyfrConfig::default();
        assert_eq!(config.ads.rows, 50);
        assert_eq!(config.ads.api_url, "https://api.adsabs.harvard.edu/v1");
        assert!(config.validate_library().is_err());
        assert!(config.validate_ads().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LlyfrConfig::from_toml(
            r#"
[library]
path = "/home/me/papers"
bibfile = "/home/me/papers/refs.bib"

[ads]
rows = 10
"#,
        )
        .unwrap();
        assert_eq!(config.ads.rows, 10);
        assert_eq!(config.ads.timeout_secs, 30);
        let (path, bibfile) = config.validate_library().unwrap();
        assert_eq!(path, Path::new("/home/me/papers"));
        assert_eq!(bibfile, Path::new("/home/me/papers/refs.bib"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = LlyfrConfig::default();
        config.library.path = Some("/lib".into());
        config.ads.token = Some("abc".into());
        let parsed = LlyfrConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_messages() {
        let mut config = LlyfrConfig::default();
        config.library.path = Some("/lib".into());
        let err = config.validate_library().unwrap_err();
        assert_eq!(err.to_string(), "Path to .bib file missing");

        config.library.bibfile = Some("/lib/refs.txt".into());
        let err = config.validate_library().unwrap_err();
        assert_eq!(err.to_string(), "Invalid .bib file selected: /lib/refs.txt");

        config.library.path = None;
        let err = config.validate_library().unwrap_err();
        assert_eq!(err.to_string(), "Path to bibliography missing");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_LIBRARY_PATH, "/env/lib"),
            (ENV_BIBFILE, "/env/lib/refs.bib"),
            (ENV_ADS_TOKEN, "  "),
        ]);
        let mut config = LlyfrConfig::default();
        config.ads.token = Some("from-file".into());
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.library.path.as_deref(), Some(Path::new("/env/lib")));
        assert_eq!(config.validate_ads().unwrap(), "from-file");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ads]\ntoken = \"secret-token-1234\"\n").unwrap();
        let config = LlyfrConfig::read(&path).unwrap();
        assert_eq!(config.ads.token.as_deref(), Some("secret-token-1234"));
        assert_eq!(config.redacted().ads.token.as_deref(), Some("****1234"));

        let missing = LlyfrConfig::read(&dir.path().join("nope.toml")).unwrap_err();
        assert_eq!(missing.stage(), Some(Stage::ReadConfig));

        fs::write(&path, "[ads\n").unwrap();
        assert!(matches!(LlyfrConfig::read(&path), Err(LlyfrError::Validation(_))));
    }

    #[test]
    fn test_mask_short_token() {
        assert_eq!(mask("abc"), "****");
    }
}
