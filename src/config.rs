//! Configuration file loading and merging with CLI flags.
//!
//! Layers, lowest priority first: built-in defaults, the config file,
//! command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use http_pool::{FieldKeys, PoolOptions};

use crate::cli::Args;

/// Values read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub concurrency: Option<u16>,
    pub pool_limit: Option<u16>,
    pub max_handles: Option<u16>,
    pub max_redirects: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub identifier_key: Option<String>,
    pub url_key: Option<String>,
    pub url_as_identifier: Option<bool>,
    pub memory_limit: Option<String>,
    pub progress: Option<bool>,
}

impl FileConfig {
    /// Validates config values against the CLI ranges.
    pub fn validate(&self) -> Result<()> {
        validate_range("concurrency", self.concurrency.map(u64::from), 1, 1000)?;
        validate_range("pool_limit", self.pool_limit.map(u64::from), 1, 10_000)?;
        validate_range("max_handles", self.max_handles.map(u64::from), 1, 1000)?;
        validate_range("max_redirects", self.max_redirects.map(u64::from), 0, 50)?;
        validate_range("timeout_secs", self.timeout_secs, 1, 3600)?;
        if let Some(limit) = &self.memory_limit
            && http_pool::transport::parse_memory_limit(limit).is_none()
        {
            bail!("Invalid config value for `memory_limit`: {limit}. Expected bytes or a size like 512M");
        }
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Options and field keys after merging every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub options: PoolOptions,
    pub keys: FieldKeys,
}

/// Merges defaults, file config and CLI flags.
///
/// Errors are always recorded rather than raised so the summary can report them.
#[must_use]
pub fn resolve(args: &Args, file: Option<&FileConfig>) -> RunSettings {
    let file = file.cloned().unwrap_or_default();
    let mut options = PoolOptions {
        throw_errors: false,
        ..PoolOptions::default()
    };
    let mut keys = FieldKeys::default();

    if let Some(value) = args.concurrency.or(file.concurrency) {
        options.concurrency = usize::from(value);
    }
    if let Some(value) = args.pool_limit.or(file.pool_limit) {
        options.pool_limit = usize::from(value);
    }
    if let Some(value) = args.max_handles.or(file.max_handles) {
        options.max_handles = usize::from(value);
    }
    if let Some(value) = args.max_redirects.or(file.max_redirects) {
        options.max_redirects = usize::from(value);
    }
    if let Some(secs) = args.timeout.or(file.timeout_secs) {
        options.timeout = Duration::from_secs(secs);
    }
    options.memory_limit = args.memory_limit.clone().or(file.memory_limit);
    options.verbose = args.progress || file.progress.unwrap_or(false);

    if let Some(key) = args.id_key.clone().or(file.identifier_key) {
        keys.identifier = key;
    }
    if let Some(key) = args.url_key.clone().or(file.url_key) {
        keys.url = key;
    }
    keys.url_as_identifier = args.url_as_id || file.url_as_identifier.unwrap_or(false);

    RunSettings { options, keys }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/http-pool/config.toml`
/// 2. `$HOME/.config/http-pool/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("http-pool")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("http-pool")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

/// Loads and validates a config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "concurrency" => cfg.concurrency = Some(parse_integer_u16(value).with_context(context)?),
            "pool_limit" => cfg.pool_limit = Some(parse_integer_u16(value).with_context(context)?),
            "max_handles" => cfg.max_handles = Some(parse_integer_u16(value).with_context(context)?),
            "max_redirects" => {
                cfg.max_redirects = Some(parse_integer_u16(value).with_context(context)?);
            }
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "identifier_key" => {
                cfg.identifier_key = Some(parse_string_literal(value).with_context(context)?);
            }
            "url_key" => cfg.url_key = Some(parse_string_literal(value).with_context(context)?),
            "url_as_identifier" => {
                cfg.url_as_identifier = Some(parse_boolean(value).with_context(context)?);
            }
            "memory_limit" => {
                cfg.memory_limit = Some(parse_string_literal(value).with_context(context)?);
            }
            "progress" => cfg.progress = Some(parse_boolean(value).with_context(context)?),
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u16(raw_value: &str) -> Result<u16> {
    let value = parse_integer_u64(raw_value)?;
    u16::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u16"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
