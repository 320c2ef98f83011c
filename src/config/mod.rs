pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::TomlConfig;
    use crate::utils::error::Result;
    use crate::utils::monitor::CpuScope;
    use clap::Parser;

    /// Command line flags; each one set overrides the TOML file.
    #[derive(Debug, Clone, Parser)]
    #[command(name = "tabbench")]
    #[command(about = "Benchmark PDF table-extraction backends and normalize the tables they find")]
    pub struct CliConfig {
        /// Folder containing the PDF files (not searched recursively)
        #[arg(short, long)]
        pub input: Option<String>,

        /// Root folder for extracted tables and metrics
        #[arg(short, long)]
        pub output: Option<String>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Backends to run, in order
        #[arg(long, value_delimiter = ',')]
        pub backends: Option<Vec<String>>,

        /// Resource sampling interval in milliseconds
        #[arg(long)]
        pub sample_interval_ms: Option<u64>,

        /// CPU figure to record
        #[arg(long, value_enum)]
        pub cpu_scope: Option<CpuScope>,

        /// Give up on a (file, backend) job after this many seconds
        #[arg(long)]
        pub job_timeout_secs: Option<u64>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl CliConfig {
        /// Loads the TOML file when given, then applies the flags on top.
        pub fn resolve(&self) -> Result<TomlConfig> {
            let mut settings = match &self.config {
                Some(path) => TomlConfig::from_file(path)?,
                None => TomlConfig::default(),
            };

            if let Some(input) = &self.input {
                settings.run.input_folder = input.clone();
            }
            if let Some(output) = &self.output {
                settings.run.output_path = output.clone();
            }
            if let Some(backends) = &self.backends {
                settings.run.backends = backends.clone();
            }
            if let Some(timeout) = self.job_timeout_secs {
                settings.run.job_timeout_secs = Some(timeout);
            }
            if let Some(interval) = self.sample_interval_ms {
                settings.monitor.sample_interval_ms = interval;
            }
            if let Some(scope) = self.cpu_scope {
                settings.monitor.cpu_scope = scope;
            }

            Ok(settings)
        }
    }

}
