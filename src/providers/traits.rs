use anyhow::Result;
use async_trait::async_trait;

/// Black-box text completion capability.
///
/// Implementations wrap a hosted language model. The pipeline hands over a
/// system/user message pair and a temperature and gets raw text back; any
/// provider failure is an `Err` the caller must catch at its own boundary.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_message: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String>;

    async fn model_info(&self) -> Result<String>;

    fn clone_box(&self) -> Box<dyn CompletionProvider>;
}

impl Clone for Box<dyn CompletionProvider> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Black-box embedding capability: text in, fixed-length vector out.
/// Must be deterministic for identical input so indexing is reproducible.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> String;

    fn clone_box(&self) -> Box<dyn EmbeddingProvider>;
}

impl Clone for Box<dyn EmbeddingProvider> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
