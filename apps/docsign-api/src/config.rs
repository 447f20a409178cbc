//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::convert::ConverterConfig;

/// Command-line arguments; every option can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "docsign-api")]
#[command(about = "Template preparation API: uploads, signatories and field placement")]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// sqlite connection string; defaults to a file in the platform data directory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory holding uploaded template PDFs
    #[arg(long, env = "STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "26214400")]
    pub max_upload_bytes: usize,

    /// Conversion service root URL; non-PDF uploads fail without it
    #[arg(long, env = "CONVERTER_URL")]
    pub converter_url: Option<String>,

    #[arg(long, env = "CONVERTER_CLIENT_ID")]
    pub converter_client_id: Option<String>,

    #[arg(long, env = "CONVERTER_CLIENT_SECRET", hide_env_values = true)]
    pub converter_client_secret: Option<String>,

    /// Delay between conversion job status checks
    #[arg(long, env = "CONVERTER_POLL_INTERVAL_MS", default_value = "1000")]
    pub converter_poll_interval_ms: u64,

    /// Status checks before a conversion job is abandoned
    #[arg(long, env = "CONVERTER_MAX_POLLS", default_value = "60")]
    pub converter_max_polls: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            let data_dir = app_data_dir();
            std::fs::create_dir_all(&data_dir).ok();
            format!("sqlite:{}/docsign.db?mode=rwc", data_dir.display())
        })
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| app_data_dir().join("templates"))
    }

    /// Conversion settings, when URL and both credentials are present
    pub fn converter(&self) -> Option<ConverterConfig> {
        Some(ConverterConfig {
            base_url: self.converter_url.clone()?,
            client_id: self.converter_client_id.clone()?,
            client_secret: self.converter_client_secret.clone()?,
            poll_interval: Duration::from_millis(self.converter_poll_interval_ms),
            max_polls: self.converter_max_polls,
        })
    }
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsign-api")
}
