//! Factory for assembling the pipeline from configuration.

use std::sync::Arc;

use docsum_core::{
    DocsumConfig, DocsumError, DocsumResult, DocumentPipeline, ExtractionOrchestrator,
    OcrConfig, OcrProvider, SqliteDocumentStore, StorageBackend, StorageConfig,
    SummaryRequestBuilder,
};
use docsum_extractors::{LocalObjectStore, ObjectStore, OcrEngine};
use docsum_llm::LlmFactory;
use tracing::{info, warn};

use crate::state::AppState;

/// Build the object store, OCR engine, model, status store and pipeline.
pub fn create_components(config: &DocsumConfig) -> DocsumResult<AppState> {
    let (objects, locator_prefix) = create_object_store(&config.storage)?;
    let engine = create_ocr_engine(&config.ocr, &config.storage, objects.clone())?;
    let llm = LlmFactory::from_config(&config.llm)?;
    let documents = Arc::new(SqliteDocumentStore::new(&config.status_db_path)?);

    info!(
        store = objects.name(),
        ocr = ?config.ocr.provider,
        llm = ?config.llm.provider,
        model = llm.model_name(),
        "Pipeline components created"
    );

    let orchestrator = ExtractionOrchestrator::new(objects.clone(), Arc::new(engine));
    let summarizer =
        SummaryRequestBuilder::new(llm).with_min_input_tokens(config.summarizer.min_input_tokens);
    let pipeline = DocumentPipeline::new(orchestrator, summarizer, documents.clone());

    Ok(AppState::new(objects, documents, pipeline, locator_prefix))
}

/// Object store plus the prefix that turns object names into locators.
fn create_object_store(config: &StorageConfig) -> DocsumResult<(Arc<dyn ObjectStore>, String)> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalObjectStore::new(config.local_root.clone());
            Ok((Arc::new(store), String::new()))
        }
        #[cfg(feature = "gcp")]
        StorageBackend::Gcs => {
            use docsum_extractors::gcp::{GcpAuth, GcsObjectStore};

            let bucket = config.bucket.clone().ok_or_else(|| {
                DocsumError::Configuration(
                    "GCS storage requires a bucket. Set DOCSUM_GCS_BUCKET.".to_string(),
                )
            })?;
            let store = GcsObjectStore::new(GcpAuth::from_env())?.with_default_bucket(&bucket);
            Ok((Arc::new(store), format!("gs://{}/", bucket)))
        }
        #[cfg(not(feature = "gcp"))]
        StorageBackend::Gcs => Err(DocsumError::Configuration(
            "Storage backend gcs is not enabled. Enable the 'gcp' feature.".to_string(),
        )),
    }
}

fn create_ocr_engine(
    config: &OcrConfig,
    storage: &StorageConfig,
    store: Arc<dyn ObjectStore>,
) -> DocsumResult<OcrEngine> {
    match config.provider {
        #[cfg(feature = "gcp")]
        OcrProvider::GoogleVision => {
            use docsum_extractors::gcp::{GcpAuth, GoogleVisionClient};

            let client = Arc::new(GoogleVisionClient::new(GcpAuth::from_env())?);
            let bucket = match (&storage.backend, &storage.bucket) {
                (StorageBackend::Gcs, Some(bucket)) => bucket,
                _ => {
                    // Vision batch jobs read and write gs:// objects only
                    warn!("Batch OCR needs the gcs storage backend; scanned PDFs will fail extraction");
                    return Ok(OcrEngine::new(client, store, config.engine.clone()));
                }
            };

            let mut engine = config.engine.clone();
            engine.output_root = batch_output_root(&engine.output_root, bucket);
            info!(output_root = %engine.output_root, "Batch OCR enabled");
            Ok(OcrEngine::new(client.clone(), store, engine).with_batch(client))
        }
        #[cfg(feature = "tesseract")]
        OcrProvider::Tesseract => {
            use docsum_extractors::tesseract::TesseractDetector;

            // single-image only; scanned PDFs fail extraction
            let detector = Arc::new(TesseractDetector::new());
            Ok(OcrEngine::new(detector, store, config.engine.clone()))
        }
        #[allow(unreachable_patterns)]
        provider => Err(DocsumError::Configuration(format!(
            "OCR provider {:?} is not enabled. Enable the corresponding feature.",
            provider
        ))),
    }
}

/// Place a relative output root inside the upload bucket.
#[cfg_attr(not(feature = "gcp"), allow(dead_code))]
fn batch_output_root(output_root: &str, bucket: &str) -> String {
    if output_root.starts_with("gs://") {
        return output_root.to_string();
    }
    format!("gs://{}/{}", bucket, output_root.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsum_core::{LlmConfig, LlmProvider, LlmProviderConfig};

    fn config(dir: &std::path::Path) -> DocsumConfig {
        let mut config = DocsumConfig::builder()
            .llm(LlmProviderConfig {
                provider: LlmProvider::Gemini,
                config: LlmConfig {
                    api_key: Some("test-key".into()),
                    ..Default::default()
                },
            })
            .status_db_path(dir.join("status.db"))
            .min_input_tokens(5)
            .build();
        config.storage.local_root = dir.join("objects");
        config
    }

    #[test]
    fn test_local_backend_has_no_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let (store, prefix) = create_object_store(&config(dir.path()).storage).unwrap();
        assert_eq!(store.name(), "local");
        assert!(prefix.is_empty());
    }

    #[cfg(feature = "gcp")]
    #[test]
    fn test_gcs_backend_requires_bucket() {
        let storage = StorageConfig {
            backend: StorageBackend::Gcs,
            bucket: None,
            ..Default::default()
        };
        assert!(matches!(
            create_object_store(&storage),
            Err(DocsumError::Configuration(_))
        ));

        let storage = StorageConfig {
            backend: StorageBackend::Gcs,
            bucket: Some("uploads".into()),
            ..Default::default()
        };
        let (store, prefix) = create_object_store(&storage).unwrap();
        assert_eq!(store.name(), "gcs");
        assert_eq!(prefix, "gs://uploads/");
    }

    #[cfg(feature = "gcp")]
    #[test]
    fn test_components_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_components(&config(dir.path())).unwrap();
        assert_eq!(state.objects().name(), "local");
        assert!(dir.path().join("status.db").exists());
    }

    #[test]
    fn test_batch_output_root_lands_in_bucket() {
        assert_eq!(batch_output_root("ocr-output", "uploads"), "gs://uploads/ocr-output");
        assert_eq!(batch_output_root("/ocr/", "uploads"), "gs://uploads/ocr");
        assert_eq!(batch_output_root("gs://ocr-out", "uploads"), "gs://ocr-out");
    }

    #[cfg(feature = "gcp")]
    #[test]
    fn test_vision_with_gcs_gets_batch_ocr() {
        let storage = StorageConfig {
            backend: StorageBackend::Gcs,
            bucket: Some("uploads".into()),
            ..Default::default()
        };
        let (store, _) = create_object_store(&storage).unwrap();

        let engine = create_ocr_engine(&OcrConfig::default(), &storage, store).unwrap();
        assert!(engine.supports_batch());
        assert_eq!(engine.config().output_root, "gs://uploads/ocr-output");
    }

    #[cfg(feature = "gcp")]
    #[test]
    fn test_vision_with_local_storage_has_no_batch_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let storage = config(dir.path()).storage;
        let (store, _) = create_object_store(&storage).unwrap();

        let engine = create_ocr_engine(&OcrConfig::default(), &storage, store).unwrap();
        assert!(!engine.supports_batch());
    }
}
