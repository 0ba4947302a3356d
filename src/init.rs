// Initialization utilities for server startup
//
// Storage operator and logging/tracing setup

use anyhow::{Context, Result};
use opendal::Operator;
use tracing::info;

use crate::config::{LogFormat, ServerConfig, StorageBackend, StorageConfig};

/// Build the OpenDAL operator backing the store from configuration.
pub(crate) fn init_operator(storage: &StorageConfig) -> Result<Operator> {
    info!("Initializing storage backend: {}", storage.backend);

    let operator = match storage.backend {
        StorageBackend::Fs => {
            let fs = storage
                .fs
                .as_ref()
                .context("fs config required for filesystem backend")?;
            info!("Using filesystem storage at: {}", fs.path);

            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            Operator::new(fs_builder)
                .context("Failed to create filesystem operator")?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .context("s3 config required for S3 backend")?;
            info!(
                "Using S3 storage: bucket={}, region={}",
                s3.bucket, s3.region
            );

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }

            Operator::new(s3_builder)
                .context("Failed to create S3 operator")?
                .finish()
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage (contents lost on shutdown)");
            Operator::new(opendal::services::Memory::default())
                .context("Failed to create memory operator")?
                .finish()
        }
    };

    Ok(operator)
}

/// Initialize tracing/logging from server configuration.
pub(crate) fn init_tracing(server: &ServerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match server.log_format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}
