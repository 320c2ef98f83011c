use crate::app::backends::{default_backend_names, BACKEND_NAMES};
use crate::core::cleaning::CleaningConfig;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BenchError, Result};
use crate::utils::monitor::MonitorConfig;
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Run settings. Every section and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub run: RunConfig,
    pub cleaning: CleaningConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input_folder: String,
    pub output_path: String,
    pub backends: Vec<String>,
    /// 未設定時不限時，與原本行為相同
    pub job_timeout_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_folder: "./pdfs".to_string(),
            output_path: "./output".to_string(),
            backends: default_backend_names(),
            job_timeout_secs: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BenchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REPORTS_DIR})；未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("run.input_folder", &self.run.input_folder)?;
        validation::validate_path("run.output_path", &self.run.output_path)?;
        validation::validate_backend_names("run.backends", &self.run.backends, &BACKEND_NAMES)?;
        if let Some(seconds) = self.run.job_timeout_secs {
            validation::validate_positive_number("run.job_timeout_secs", seconds as usize, 1)?;
        }

        validation::validate_range(
            "cleaning.min_present_ratio",
            self.cleaning.min_present_ratio,
            0.0,
            1.0,
        )?;
        validation::validate_positive_number("cleaning.min_rows", self.cleaning.min_rows, 1)?;
        validation::validate_positive_number("cleaning.min_columns", self.cleaning.min_columns, 1)?;

        validation::validate_range(
            "monitor.sample_interval_ms",
            self.monitor.sample_interval_ms,
            1,
            60_000,
        )?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_folder(&self) -> &str {
        &self.run.input_folder
    }

    fn output_path(&self) -> &str {
        &self.run.output_path
    }

    fn backend_names(&self) -> &[String] {
        &self.run.backends
    }

    fn cleaning(&self) -> CleaningConfig {
        self.cleaning
    }

    fn monitor(&self) -> MonitorConfig {
        self.monitor
    }

    fn job_timeout(&self) -> Option<Duration> {
        self.run.job_timeout_secs.map(Duration::from_secs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
