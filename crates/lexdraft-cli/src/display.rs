//! Terminal rendering for retrieval hits, quality reports, and history.
//!
//! Tabular output goes through Arrow's pretty printer; single records are
//! rendered as vertical cards.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use lexdraft_core::{GeneratedResult, QualityReport};
use lexdraft_store::ScoredChunk;

const PREVIEW_CHARS: usize = 72;

/// Print retrieved chunks as a ranked table.
pub fn print_hits(hits: &[ScoredChunk]) -> anyhow::Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("rank", DataType::UInt64, false),
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("score", DataType::Float32, false),
        Field::new("text", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(1..=hits.len() as u64)),
        Arc::new(StringArray::from_iter_values(
            hits.iter().map(|h| h.chunk.id.as_str()),
        )),
        Arc::new(Float32Array::from_iter_values(hits.iter().map(|h| h.score))),
        Arc::new(StringArray::from_iter_values(
            hits.iter().map(|h| preview(&h.chunk.text)),
        )),
    ];
    let batch = RecordBatch::try_new(schema, columns)?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

/// Print an ACTQM report as a vertical card.
pub fn print_report(category: &str, report: &QualityReport) {
    println!("=== ACTQM: {category} ===");
    println!();
    println!("Scores");
    println!("  {:<22} {:.2}", "actqm", report.actqm);
    println!("  {:<22} {:.2}", "clause_coverage", report.ccs);
    println!("  {:<22} {:.2}", "formality", report.fs);
    println!();
    println!("Clause Coverage");
    println!(
        "  {:<22} {}/{}",
        "keywords_found",
        report.keywords_found.len(),
        report.total_required
    );
    if !report.keywords_found.is_empty() {
        println!("  {:<22} {}", "matched", report.keywords_found.join(", "));
    }
    println!();
    println!("Formality");
    println!("  {:<22} {}", "grammar_issues", report.grammar_issues);
    println!("  {:<22} {}", "sentences", report.sentences);
}

/// Print history entries as a table, oldest first.
pub fn print_history<'a>(
    entries: impl IntoIterator<Item = &'a GeneratedResult>,
) -> anyhow::Result<()> {
    let entries: Vec<&GeneratedResult> = entries.into_iter().collect();
    if entries.is_empty() {
        println!("(no history)");
        return Ok(());
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("revises", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.id.to_string()),
        )),
        Arc::new(StringArray::from_iter(
            entries.iter().map(|e| e.revises.map(|id| id.to_string())),
        )),
        Arc::new(StringArray::from_iter_values(
            entries
                .iter()
                .map(|e| e.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        )),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| preview(&e.text)),
        )),
    ];
    let batch = RecordBatch::try_new(schema, columns)?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

/// First line of `text`, cut to a fixed width.
fn preview(text: &str) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= PREVIEW_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}
