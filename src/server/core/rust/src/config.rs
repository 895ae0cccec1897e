/* src/server/core/rust/src/config.rs */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "mosaic.toml";

static LANGUAGE_CODE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("static regex"));

#[derive(Debug, Clone, Deserialize)]
pub struct MosaicConfig {
  pub i18n: I18nSection,
  #[serde(default)]
  pub translator: Option<TranslatorSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct I18nSection {
  pub languages: Vec<String>,
  #[serde(default = "default_reference")]
  pub reference: String,
  #[serde(default = "default_pending_marker")]
  pub pending_marker: String,
}

impl I18nSection {
  pub fn new(languages: &[&str], reference: &str) -> Self {
    Self {
      languages: languages.iter().map(|l| (*l).to_string()).collect(),
      reference: reference.to_string(),
      pending_marker: default_pending_marker(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.languages.is_empty() {
      bail!("i18n.languages must not be empty");
    }
    let mut seen = HashSet::new();
    for lang in &self.languages {
      if !LANGUAGE_CODE.is_match(lang) {
        bail!("i18n.languages contains invalid language code \"{lang}\"");
      }
      if !seen.insert(lang.as_str()) {
        bail!("i18n.languages lists \"{lang}\" more than once");
      }
    }
    if !self.languages.contains(&self.reference) {
      bail!("i18n.reference \"{}\" is not in i18n.languages {:?}", self.reference, self.languages);
    }
    if self.pending_marker.trim().is_empty() {
      bail!("i18n.pending_marker must not be blank");
    }
    Ok(())
  }

  /// Every configured language except the reference, in configured order.
  pub fn targets(&self) -> impl Iterator<Item = &str> {
    self.languages.iter().map(String::as_str).filter(|l| *l != self.reference)
  }

  pub fn is_reference(&self, language: &str) -> bool {
    self.reference == language
  }
}

impl Default for I18nSection {
  fn default() -> Self {
    Self {
      languages: vec![default_reference()],
      reference: default_reference(),
      pending_marker: default_pending_marker(),
    }
  }
}

fn default_reference() -> String {
  "en".to_string()
}

fn default_pending_marker() -> String {
  mosaic_engine::DEFAULT_PENDING_MARKER.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorSection {
  pub endpoint: String,
  /// Name of the environment variable holding the API key, if any.
  pub api_key_env: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl TranslatorSection {
  pub fn validate(&self) -> Result<()> {
    if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
      bail!("translator.endpoint must be an http(s) URL, got \"{}\"", self.endpoint);
    }
    if self.timeout_secs == 0 {
      bail!("translator.timeout_secs must be greater than 0");
    }
    Ok(())
  }
}

fn default_timeout_secs() -> u64 {
  30
}

impl MosaicConfig {
  pub fn parse(content: &str) -> Result<Self> {
    let config: Self = toml::from_str(content).context("failed to parse mosaic config")?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    self.i18n.validate()?;
    if let Some(ref translator) = self.translator {
      translator.validate()?;
    }
    Ok(())
  }
}

/// Walk upward from `start` to find `mosaic.toml`, like Cargo.toml discovery
pub fn find_mosaic_config(start: &Path) -> Result<PathBuf> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
      return Ok(candidate);
    }
    if !dir.pop() {
      bail!("{CONFIG_FILE} not found (searched upward from {})", start.display());
    }
  }
}

pub fn load_mosaic_config(path: &Path) -> Result<MosaicConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  MosaicConfig::parse(&content).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_minimal_config() {
    let toml_str = r#"
[i18n]
languages = ["en", "de"]
"#;
    let config = MosaicConfig::parse(toml_str).unwrap();
    assert_eq!(config.i18n.reference, "en");
    assert_eq!(config.i18n.pending_marker, mosaic_engine::DEFAULT_PENDING_MARKER);
    assert_eq!(config.i18n.targets().collect::<Vec<_>>(), vec!["de"]);
    assert!(config.translator.is_none());
  }

  #[test]
  fn parse_full_config() {
    let toml_str = r#"
[i18n]
languages = ["de", "en", "fr", "zh-Hans"]
reference = "de"
pending_marker = "[needs translation]"

[translator]
endpoint = "https://translate.internal/api/translate"
api_key_env = "MOSAIC_TRANSLATOR_KEY"
timeout_secs = 10
"#;
    let config = MosaicConfig::parse(toml_str).unwrap();
    assert!(config.i18n.is_reference("de"));
    assert_eq!(config.i18n.targets().collect::<Vec<_>>(), vec!["en", "fr", "zh-Hans"]);
    let translator = config.translator.unwrap();
    assert_eq!(translator.api_key_env.as_deref(), Some("MOSAIC_TRANSLATOR_KEY"));
    assert_eq!(translator.timeout_secs, 10);
  }

  #[test]
  fn reference_must_be_configured() {
    let toml_str = r#"
[i18n]
languages = ["de", "fr"]
"#;
    let err = MosaicConfig::parse(toml_str).unwrap_err();
    assert!(err.to_string().contains("i18n.reference \"en\""));
  }

  #[test]
  fn rejects_bad_language_lists() {
    assert!(I18nSection::new(&[], "en").validate().is_err());
    assert!(I18nSection::new(&["en", "en"], "en").validate().is_err());
    assert!(I18nSection::new(&["en", "German"], "en").validate().is_err());
    assert!(I18nSection::new(&["en", "pt-BR"], "en").validate().is_ok());
  }

  #[test]
  fn rejects_zero_timeout() {
    let toml_str = r#"
[i18n]
languages = ["en"]

[translator]
endpoint = "http://localhost:9000"
timeout_secs = 0
"#;
    let err = MosaicConfig::parse(toml_str).unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));
  }

  #[test]
  fn find_walks_upward() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join(CONFIG_FILE), "[i18n]\nlanguages = [\"en\"]\n").unwrap();
    let nested = root.path().join("site/pages/home");
    std::fs::create_dir_all(&nested).unwrap();

    let found = find_mosaic_config(&nested).unwrap();
    assert_eq!(found, root.path().canonicalize().unwrap().join(CONFIG_FILE));
    let config = load_mosaic_config(&found).unwrap();
    assert_eq!(config.i18n.languages, vec!["en"]);
  }

  #[test]
  fn load_reports_path_on_error() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join(CONFIG_FILE);
    std::fs::write(&path, "[i18n]\nlanguages = []\n").unwrap();
    let err = load_mosaic_config(&path).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("invalid config"));
    assert!(chain.contains("must not be empty"));
  }
}
