use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Named-artifact storage backing the pipeline. Every artifact lives flat
/// inside a single folder; stages exchange data by name only.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch a named artifact, returning a local path it can be read from.
    async fn fetch(&self, name: &str) -> Result<PathBuf>;

    /// Publish a local file to the store under `name`, replacing any
    /// previous version.
    async fn publish(&self, name: &str, path: &Path) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;
}

/// Store backed by a plain local directory.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    /// Opens an existing store folder. A missing folder is a precondition
    /// failure, not something to silently repair.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(PipelineError::StoreUnavailable(
                root.display().to_string(),
            ));
        }
        Ok(Self { root })
    }

    /// Creates the store folder if needed and opens it. Used by stages that
    /// produce the first artifacts of a fresh pipeline run.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl FileStore for LocalDirStore {
    async fn fetch(&self, name: &str) -> Result<PathBuf> {
        let path = self.resolve(name);
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(name.to_string()));
        }
        debug!("Fetched '{}' from {}", name, self.root.display());
        Ok(path)
    }

    async fn publish(&self, name: &str, path: &Path) -> Result<()> {
        let target = self.resolve(name);
        if path != target {
            std::fs::copy(path, &target)?;
        }
        debug!("Published '{}' to {}", name, self.root.display());
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.resolve(name).is_file())
    }
}

/// Store backed by an HTTP file service. Artifacts are cached into a local
/// working directory on fetch so readers always see a filesystem path.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    folder: String,
    cache_dir: PathBuf,
}

impl HttpStore {
    pub fn new(base_url: &str, folder: &str, cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            folder: folder.to_string(),
            cache_dir,
        })
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.folder, name)
    }
}

#[async_trait]
impl FileStore for HttpStore {
    async fn fetch(&self, name: &str) -> Result<PathBuf> {
        let response = self.client.get(self.url(name)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::FileNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            return Err(PipelineError::StoreUnavailable(format!(
                "{} returned {}",
                self.url(name),
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let path = self.cache_dir.join(name);
        std::fs::write(&path, &bytes)?;
        debug!("Fetched '{}' ({} bytes) from {}", name, bytes.len(), self.base_url);
        Ok(path)
    }

    async fn publish(&self, name: &str, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let response = self
            .client
            .put(self.url(name))
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::StoreUnavailable(format!(
                "{} returned {}",
                self.url(name),
                response.status()
            )));
        }
        debug!("Published '{}' to {}", name, self.base_url);
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let response = self.client.head(self.url(name)).send().await?;
        Ok(response.status().is_success())
    }
}
