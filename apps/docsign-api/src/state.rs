//! Application state for DocSign API

use std::sync::Arc;

use anyhow::Result;
use docsign_core::TemplateStore;
use tracing::{info, warn};

use crate::config::Args;
use crate::convert::{DisabledConverter, DocumentConverter, HttpConverter};
use crate::db::SqliteStore;
use crate::storage::{FsObjectStore, ObjectStore};
use crate::upload::UploadPipeline;

pub struct AppState {
    pub store: Arc<dyn TemplateStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub uploads: UploadPipeline,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        objects: Arc<dyn ObjectStore>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        let uploads = UploadPipeline::new(converter, objects.clone(), store.clone());
        Self {
            store,
            objects,
            uploads,
        }
    }

    /// Build the production collaborators from configuration
    pub async fn from_args(args: &Args) -> Result<Self> {
        let store = SqliteStore::connect(&args.database_url(), 5).await?;

        let storage_dir = args.storage_dir();
        info!("Storing templates in {}", storage_dir.display());
        let objects = FsObjectStore::open(storage_dir).await?;

        let converter: Arc<dyn DocumentConverter> = match args.converter() {
            Some(config) => {
                info!("Document conversion via {}", config.base_url);
                Arc::new(HttpConverter::new(config))
            }
            None => {
                warn!("No conversion service configured; only PDF uploads will succeed");
                Arc::new(DisabledConverter)
            }
        };

        Ok(Self::new(Arc::new(store), Arc::new(objects), converter))
    }
}
