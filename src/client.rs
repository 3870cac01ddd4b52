use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::interfaces::providers::LlmProvider;
use crate::providers::gigachat::GigaChatProvider;
use crate::providers::ocr_space::OcrSpaceClient;
use crate::services::assistant::Assistant;
use crate::store::LumiraStore;

/// Wires the store, the GigaChat provider and the optional OCR client.
pub struct Lumira {
    assistant: Arc<Assistant>,
    store: Arc<LumiraStore>,
    ocr: Option<Arc<OcrSpaceClient>>,
}

impl Lumira {
    pub async fn from_config(config: Config) -> Result<Self> {
        let llm: Arc<dyn LlmProvider> = Arc::new(GigaChatProvider::new(config.gigachat.clone())?);
        let store = Arc::new(LumiraStore::new(&config.database.sqlite_path).await?);
        let ocr = if config.ocr.api_key.is_some() {
            Some(Arc::new(OcrSpaceClient::new(config.ocr.clone())?))
        } else {
            None
        };
        info!(
            db = %config.database.sqlite_path,
            model = %config.gigachat.model,
            ocr = ocr.is_some(),
            "lumira initialised"
        );
        Ok(Self::from_parts(llm, store, ocr))
    }

    pub fn from_parts(
        llm: Arc<dyn LlmProvider>,
        store: Arc<LumiraStore>,
        ocr: Option<Arc<OcrSpaceClient>>,
    ) -> Self {
        let assistant = Arc::new(Assistant::new(llm, store.clone()));
        Self {
            assistant,
            store,
            ocr,
        }
    }

    pub fn assistant(&self) -> Arc<Assistant> {
        self.assistant.clone()
    }

    pub fn store(&self) -> Arc<LumiraStore> {
        self.store.clone()
    }

    pub fn ocr(&self) -> Option<Arc<OcrSpaceClient>> {
        self.ocr.clone()
    }
}
