//! Pipeline configuration and dataset layout.
//!
//! Values come from `Default`, then an optional JSON file (`--config`), then
//! command-line flags.

use anyhow::{Context, Result};
use deputados_graph::ontology::CAMARA_RESOURCE_NS;
use deputados_graph::ntriples::DEFAULT_PREVIEW_BYTES;
use deputados_graph::IdentityScheme;
use deputados_ingest::ApiConfig;
use deputados_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    /// Legislative term (`idLegislatura`).
    pub legislature: u32,
    pub resource_namespace: String,
    pub api: ApiConfig,
    /// `store.path` unset means `<data_dir>/store`.
    pub store: StoreConfig,
    pub preview_bytes: usize,
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            data_dir: PathBuf::from("dataset"),
            legislature: api.legislature,
            resource_namespace: CAMARA_RESOURCE_NS.to_string(),
            api,
            store: StoreConfig::default(),
            preview_bytes: DEFAULT_PREVIEW_BYTES,
            preview_rows: 20,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.data_dir)
    }

    /// API settings with the pipeline's legislative term applied.
    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            legislature: self.legislature,
            ..self.api.clone()
        }
    }

    pub fn identity(&self) -> IdentityScheme {
        IdentityScheme::new(self.resource_namespace.clone())
    }

    pub fn store_config(&self) -> StoreConfig {
        match &self.store.path {
            Some(_) => self.store.clone(),
            None => StoreConfig::at(self.layout().store_dir()),
        }
    }
}

/// `raw/` for CSV, `processed/` for N-Triples, `img/` for renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn img_dir(&self) -> PathBuf {
        self.root.join("img")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    pub fn csv_path(&self, legislature: u32) -> PathBuf {
        self.raw_dir()
            .join(format!("deputados_legisl_{legislature}.csv"))
    }

    pub fn ntriples_path(&self, legislature: u32) -> PathBuf {
        self.processed_dir()
            .join(format!("deputados_legisl_{legislature}.nt"))
    }

    pub fn viz_path(&self, deputado: u64, extension: &str) -> PathBuf {
        self.img_dir()
            .join(format!("deputado_{deputado}_graph.{extension}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_names_files_per_term() {
        let layout = DatasetLayout::new("data");
        assert_eq!(
            layout.csv_path(57),
            PathBuf::from("data/raw/deputados_legisl_57.csv")
        );
        assert_eq!(
            layout.ntriples_path(56),
            PathBuf::from("data/processed/deputados_legisl_56.nt")
        );
        assert_eq!(
            layout.viz_path(204445, "dot"),
            PathBuf::from("data/img/deputado_204445_graph.dot")
        );
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipeline.json");
        fs::write(
            &path,
            r#"{ "legislature": 56, "api": { "max_pages": 3 }, "store": { "path": "/tmp/g" } }"#,
        )
        .expect("write");

        let cfg = PipelineConfig::load(Some(&path)).expect("load");
        assert_eq!(cfg.legislature, 56);
        assert_eq!(cfg.api().legislature, 56);
        assert_eq!(cfg.api.max_pages, 3);
        assert_eq!(cfg.api.order_by, "nome");
        assert_eq!(cfg.preview_bytes, 2000);
        assert_eq!(cfg.store_config().path, Some(PathBuf::from("/tmp/g")));
    }

    #[test]
    fn store_defaults_under_data_dir() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            cfg.store_config().path,
            Some(PathBuf::from("dataset/store"))
        );
    }

    #[test]
    fn bad_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").expect("write");
        let err = PipelineConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
