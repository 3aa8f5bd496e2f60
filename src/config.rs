//! qrgen runtime configuration handling

use crate::error::{Error, Result};
use crate::form::{Color, FormSettings, QrSize};
use crate::qr::{QrEncoder, parse_ec_level};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrgenConfig {
    /// Initial form values and encoder options
    pub form: FormOptions,
    /// Where downloads are written
    pub export: ExportOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrgenConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrgen.toml / qrgen.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrgen.toml", "qrgen.yaml", "qrgen.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrgen");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.form.apply_env_overrides();
        self.export.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Initial form values resolved from the configured overrides.
    pub fn form_settings(&self) -> Result<FormSettings> {
        self.form.to_form_settings()
    }

    /// Encoder honouring the configured error correction level.
    pub fn encoder(&self) -> Result<QrEncoder> {
        self.form.to_encoder()
    }
}

/// Overrides merged on top of `FormSettings::default()`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Initial text / URL
    pub text: Option<String>,
    /// Initial size in pixels (clamped to 100..=400, step 10)
    pub size: Option<u32>,
    /// Initial foreground color (`#rrggbb`)
    pub foreground: Option<String>,
    /// Initial background color (`#rrggbb`)
    pub background: Option<String>,
    /// Error correction level (`L`, `M`, `Q`, `H`)
    pub error_correction: Option<String>,
}

impl FormOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(text) = env::var("QRGEN_TEXT") {
            self.text = Some(text);
        }
        if let Ok(size) = env::var("QRGEN_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.size = Some(parsed);
            }
        }
        if let Ok(color) = env::var("QRGEN_FOREGROUND") {
            self.foreground = Some(color);
        }
        if let Ok(color) = env::var("QRGEN_BACKGROUND") {
            self.background = Some(color);
        }
        if let Ok(ecc) = env::var("QRGEN_ECC") {
            self.error_correction = Some(ecc);
        }
    }

    /// Merge overrides onto the default form values.
    pub fn to_form_settings(&self) -> Result<FormSettings> {
        let mut settings = FormSettings::default();

        if let Some(text) = &self.text {
            settings.text = text.clone();
        }

        if let Some(size) = self.size {
            settings.size = QrSize::clamped(size);
        }

        if let Some(color) = &self.foreground {
            settings.foreground = Color::parse(color)
                .map_err(|e| Error::Config(format!("form.foreground: {e}")))?;
        }

        if let Some(color) = &self.background {
            settings.background = Color::parse(color)
                .map_err(|e| Error::Config(format!("form.background: {e}")))?;
        }

        Ok(settings)
    }

    /// Build the encoder for the configured error correction level.
    pub fn to_encoder(&self) -> Result<QrEncoder> {
        match &self.error_correction {
            None => Ok(QrEncoder::new()),
            Some(level) => parse_ec_level(level)
                .map(QrEncoder::with_ecc_level)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Unknown error correction level '{}'. Use L, M, Q, or H",
                        level
                    ))
                }),
        }
    }
}

/// Destination for exported PNG files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Directory downloads are written to
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExportOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("QRGEN_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRGEN_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRGEN_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRGEN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRGEN_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("QRGEN_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrcode::EcLevel;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("qrgen-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_resolve_to_form_defaults() {
        let config = QrgenConfig::default();
        assert_eq!(config.form_settings().unwrap(), FormSettings::default());
        assert_eq!(config.encoder().unwrap().ecc_level(), EcLevel::M);
        assert_eq!(config.export.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_toml_file() {
        let path = write_temp(
            "qrgen.toml",
            r##"
[form]
text = "hello"
size = 333
foreground = "#ff0000"
error_correction = "h"

[export]
output_dir = "/tmp/qr"

[logging]
level = "debug"
rotation = "daily"
"##,
        );

        let config = QrgenConfig::from_file(&path).unwrap();
        let settings = config.form_settings().unwrap();
        assert_eq!(settings.text, "hello");
        assert_eq!(settings.size.px(), 330);
        assert_eq!(settings.foreground, Color::rgb(255, 0, 0));
        assert_eq!(settings.background, Color::WHITE);
        assert_eq!(config.encoder().unwrap().ecc_level(), EcLevel::H);
        assert_eq!(config.export.output_dir, PathBuf::from("/tmp/qr"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_yaml_file() {
        let path = write_temp("qrgen.yaml", "form:\n  background: \"#eee\"\n");
        let config = QrgenConfig::from_file(&path).unwrap();
        assert_eq!(
            config.form_settings().unwrap().background,
            Color::rgb(0xee, 0xee, 0xee)
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let path = write_temp("qrgen.ini", "");
        assert!(matches!(
            QrgenConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let form = FormOptions {
            foreground: Some("blue".to_string()),
            ..FormOptions::default()
        };
        assert!(matches!(form.to_form_settings(), Err(Error::Config(_))));

        let form = FormOptions {
            error_correction: Some("X".to_string()),
            ..FormOptions::default()
        };
        assert!(matches!(form.to_encoder(), Err(Error::Config(_))));
    }
}
