//! Revision of a generated result from user feedback.

use lexdraft_core::{GeneratedResult, QueryRequest};
use lexdraft_store::VectorIndex;
use tracing::info;

use crate::{PipelineError, RagPipeline};

pub fn revision_instruction(previous_text: &str, correction: &str) -> String {
    format!("Make the changes to {previous_text} based on the feedback: {correction}")
}

impl RagPipeline {
    /// Regenerate `previous` with `correction` applied.
    ///
    /// The new result keeps the original contract parameters and links back
    /// to `previous`; `previous` itself is left untouched.
    pub async fn revise(
        &self,
        previous: &GeneratedResult,
        correction: &str,
        index: &VectorIndex,
    ) -> Result<GeneratedResult, PipelineError> {
        let correction = correction.trim();
        if correction.is_empty() {
            return Err(PipelineError::EmptyCorrection);
        }

        let request = QueryRequest::new(revision_instruction(&previous.text, correction))
            .with_params(previous.request.params.clone());
        let mut revised = self.answer(&request, index).await?;
        revised.revises = Some(previous.id);
        info!(id = %revised.id, revises = %previous.id, "revised result");
        Ok(revised)
    }
}
