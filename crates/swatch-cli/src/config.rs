//! Optional user configuration.
//!
//! Read from `--config <path>` or `<config_dir>/swatch/config.toml`:
//!
//! ```toml
//! [defaults]
//! format = "gpl"
//! aco_version = 2
//! aco_color_space = "hsb"
//! sort = "brightness"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, de};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use swatch_core::SortOrder;
use swatch_formats::{AcoColorSpace, AcoVersion};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub defaults: Defaults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    /// Extension of the codec used when an output path names none.
    pub format: Option<String>,
    #[serde(deserialize_with = "parsed")]
    pub aco_version: Option<AcoVersion>,
    #[serde(deserialize_with = "parsed")]
    pub aco_color_space: Option<AcoColorSpace>,
    #[serde(deserialize_with = "parsed")]
    pub sort: Option<SortOrder>,
}

/// A bare integer or a string, as written in the config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Str(String),
}

/// Deserialize through the type's `FromStr`, accepting `2` as well as `"2"`.
fn parsed<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let text = match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => n.to_string(),
        Scalar::Str(s) => s,
    };
    text.parse().map(Some).map_err(de::Error::custom)
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("swatch").join("config.toml"))
}

impl Config {
    /// Load `explicit` if given, otherwise the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
