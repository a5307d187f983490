//! Embedding function seam.

/// A deterministic text → vector function.
///
/// Identical input text and model configuration must produce identical
/// vectors; every vector has length [`Embed::dim`].
pub trait Embed: Send + Sync {
    /// Model identifier recorded alongside persisted vectors.
    fn model_name(&self) -> &str;

    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in input order.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedding function returned no vector"))
    }
}
