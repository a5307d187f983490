//! Shared record types passed between the loader, index, pipeline and scorer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source document read from the corpus.
///
/// `id` is the source label (the file stem, e.g. `nda_standard` for
/// `nda_standard.txt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A bounded window of a [`DocumentRecord`], the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{document_id}_{ordinal}`.
    pub id: String,
    pub document_id: String,
    /// Position within the parent document, starting at 0.
    pub ordinal: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(document_id: &str, ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            id: format!("{document_id}_{ordinal}"),
            document_id: document_id.to_string(),
            ordinal,
            text: text.into(),
        }
    }
}

/// Structured contract parameters folded into a request as plain sentences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractParams {
    pub category: Option<String>,
    pub jurisdiction: Option<String>,
    pub governing_law: Option<String>,
    pub contract_value: Option<f64>,
    pub effective_date: Option<NaiveDate>,
}

impl ContractParams {
    /// Render the parameters as natural-language clauses.
    ///
    /// Only present fields are rendered, in a fixed order:
    /// value, jurisdiction, governing law, effective date.
    pub fn render_clauses(&self) -> String {
        let mut clauses = Vec::new();
        if let Some(value) = self.contract_value {
            clauses.push(format!("Value of the contract is {value}."));
        }
        if let Some(j) = self.jurisdiction.as_deref().filter(|s| !s.trim().is_empty()) {
            clauses.push(format!("Jurisdiction is {}.", j.trim()));
        }
        if let Some(law) = self.governing_law.as_deref().filter(|s| !s.trim().is_empty()) {
            clauses.push(format!("Governing law is {}.", law.trim()));
        }
        if let Some(date) = self.effective_date {
            clauses.push(format!("Effective date is {}.", date.format("%Y-%m-%d")));
        }
        clauses.join(" ")
    }
}

/// A natural-language request to the generation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub instruction: String,
    #[serde(default)]
    pub params: ContractParams,
}

impl QueryRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            params: ContractParams::default(),
        }
    }

    pub fn with_params(mut self, params: ContractParams) -> Self {
        self.params = params;
        self
    }

    /// The full request text: instruction followed by the parameter clauses.
    pub fn render(&self) -> String {
        let clauses = self.params.render_clauses();
        let instruction = self.instruction.trim();
        if clauses.is_empty() {
            instruction.to_string()
        } else if instruction.is_empty() {
            clauses
        } else {
            format!("{instruction} {clauses}")
        }
    }
}

/// Text produced by one generator call.
///
/// Never mutated: a revision is a new record whose `revises` points at the
/// record it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResult {
    pub id: Uuid,
    pub text: String,
    pub request: QueryRequest,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revises: Option<Uuid>,
}

impl GeneratedResult {
    pub fn new(text: impl Into<String>, request: QueryRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            request,
            created_at: Utc::now(),
            revises: None,
        }
    }

    /// A new result recording that it revises `previous`.
    pub fn revision_of(
        previous: &GeneratedResult,
        text: impl Into<String>,
        request: QueryRequest,
    ) -> Self {
        Self {
            revises: Some(previous.id),
            ..Self::new(text, request)
        }
    }
}

/// ACTQM quality evaluation of a generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Clause coverage score in `[0, 1]`.
    pub ccs: f64,
    /// Formality score in `[0, 1]`.
    pub fs: f64,
    /// Composite score in `[0, 100]`.
    pub actqm: f64,
    pub keywords_found: Vec<String>,
    pub total_required: usize,
    pub grammar_issues: usize,
    pub sentences: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_combines_document_and_ordinal() {
        let chunk = Chunk::new("nda_standard", 3, "text");
        assert_eq!(chunk.id, "nda_standard_3");
        assert_eq!(chunk.ordinal, 3);
    }

    #[test]
    fn render_folds_params_in_order() {
        let req = QueryRequest::new("Create a detailed contract template for NDA.").with_params(
            ContractParams {
                category: Some("NDA".into()),
                jurisdiction: Some("United Kingdom".into()),
                governing_law: Some("Common Law".into()),
                contract_value: Some(10000.0),
                effective_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            },
        );
        assert_eq!(
            req.render(),
            "Create a detailed contract template for NDA. Value of the contract is 10000. \
             Jurisdiction is United Kingdom. Governing law is Common Law. \
             Effective date is 2025-07-01."
        );
    }

    #[test]
    fn render_without_params_is_instruction() {
        let req = QueryRequest::new("  Summarise the indemnity clause.  ");
        assert_eq!(req.render(), "Summarise the indemnity clause.");
    }

    #[test]
    fn blank_params_are_skipped() {
        let params = ContractParams {
            jurisdiction: Some("   ".into()),
            governing_law: Some("Civil Law".into()),
            ..Default::default()
        };
        assert_eq!(params.render_clauses(), "Governing law is Civil Law.");
    }

    #[test]
    fn revision_links_to_previous() {
        let first = GeneratedResult::new("draft", QueryRequest::new("q"));
        let second = GeneratedResult::revision_of(&first, "draft v2", first.request.clone());
        assert_eq!(second.revises, Some(first.id));
        assert_ne!(second.id, first.id);
        assert!(first.revises.is_none());
    }

    #[test]
    fn generated_result_json_roundtrip() {
        let result = GeneratedResult::new("body", QueryRequest::new("q"));
        let json = serde_json::to_string(&result).unwrap();
        let parsed: GeneratedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
