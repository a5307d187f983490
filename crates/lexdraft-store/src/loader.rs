//! Corpus loader: reads text-bearing files from a directory into [`DocumentRecord`]s.
//!
//! Plain `.txt` files are read directly. Container formats (e.g. `.docx`) need
//! a [`TextExtractor`] registered for their extension. Files with other
//! extensions, and files that fail to read, are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use lexdraft_core::DocumentRecord;
use tracing::{debug, info, warn};

use crate::StoreError;

/// Extracts plain text from a container-format file.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> anyhow::Result<String>;
}

/// Directory loader with a per-extension reader table.
pub struct CorpusLoader {
    /// Lowercase extension → extractor; `None` means read as UTF-8 text.
    readers: BTreeMap<String, Option<Box<dyn TextExtractor>>>,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusLoader {
    /// A loader that recognises `.txt` files only.
    pub fn new() -> Self {
        let mut readers = BTreeMap::new();
        readers.insert("txt".to_string(), None);
        Self { readers }
    }

    /// Recognise an extra extension read as UTF-8 text (e.g. `md`).
    pub fn with_text_extension(mut self, ext: &str) -> Self {
        self.readers.insert(ext.to_ascii_lowercase(), None);
        self
    }

    /// Recognise an extension whose text comes from an external extractor.
    pub fn with_extractor(mut self, ext: &str, extractor: Box<dyn TextExtractor>) -> Self {
        self.readers
            .insert(ext.to_ascii_lowercase(), Some(extractor));
        self
    }

    /// Load every recognised file in `dir`, sorted by file name.
    ///
    /// A missing or empty directory yields an empty list.
    pub fn load(&self, dir: &Path) -> Vec<DocumentRecord> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "corpus directory unreadable");
                return Vec::new();
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(ext) = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
            else {
                continue;
            };
            let Some(reader) = self.readers.get(&ext) else {
                debug!(path = %path.display(), "skipping unrecognised file");
                continue;
            };

            let text = match reader {
                None => std::fs::read_to_string(&path).map_err(anyhow::Error::from),
                Some(extractor) => extractor.extract(&path),
            };
            match text {
                Ok(text) => docs.push(DocumentRecord::new(source_label(&path), text)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }

        info!(dir = %dir.display(), documents = docs.len(), "loaded corpus");
        docs
    }

    /// Load `dir` and fail with [`StoreError::EmptyCorpus`] when nothing was found.
    pub fn require(&self, dir: &Path) -> Result<Vec<DocumentRecord>, StoreError> {
        let docs = self.load(dir);
        if docs.is_empty() {
            return Err(StoreError::EmptyCorpus(dir.to_path_buf()));
        }
        Ok(docs)
    }
}

/// Load `.txt` documents from `dir`.
pub fn load_corpus(dir: &Path) -> Vec<DocumentRecord> {
    CorpusLoader::new().load(dir)
}

/// Load `.txt` documents from `dir`, treating an empty result as a precondition failure.
pub fn require_documents(dir: &Path) -> Result<Vec<DocumentRecord>, StoreError> {
    CorpusLoader::new().require(dir)
}

/// Document id: the full file name, unique within a directory.
fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chunker;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &[u8]) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_txt_files_sorted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b_msa.txt", b"Master services.");
        write(tmp.path(), "a_nda.txt", b"Confidential information.");
        write(tmp.path(), "notes.pdf", b"%PDF-1.4");

        let docs = load_corpus(tmp.path());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a_nda.txt");
        assert_eq!(docs[0].text, "Confidential information.");
        assert_eq!(docs[1].id, "b_msa.txt");
    }

    #[test]
    fn empty_directory_yields_empty_list() {
        let tmp = TempDir::new().unwrap();
        assert!(load_corpus(tmp.path()).is_empty());
    }

    #[test]
    fn missing_directory_yields_empty_list() {
        assert!(load_corpus(Path::new("/nonexistent/corpus")).is_empty());
    }

    #[test]
    fn require_documents_reports_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "readme.md", b"not a contract");
        let err = require_documents(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::EmptyCorpus(ref p) if p == tmp.path()));
    }

    #[test]
    fn invalid_utf8_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "bad.txt", &[0xff, 0xfe, 0xfd]);
        write(tmp.path(), "good.txt", b"Employment terms.");
        let docs = load_corpus(tmp.path());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good.txt");
    }

    #[test]
    fn subdirectories_are_ignored() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("nested.txt")).unwrap();
        write(tmp.path(), "top.txt", b"Top level.");
        let docs = load_corpus(tmp.path());
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn same_stem_files_get_distinct_chunk_ids() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "nda.v1.txt", b"First confidentiality draft.");
        write(tmp.path(), "nda.v2.txt", b"Second confidentiality draft.");
        write(tmp.path(), "nda.docx", b"Extracted confidentiality draft.");

        let docs = CorpusLoader::new()
            .with_extractor("docx", Box::new(UpperExtractor))
            .load(tmp.path());
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["nda.docx", "nda.v1.txt", "nda.v2.txt"]);

        let chunks = Chunker::new(100, 10).unwrap().chunk_all(&docs);
        let unique: BTreeSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(unique.len(), 3);
    }

    struct UpperExtractor;

    impl TextExtractor for UpperExtractor {
        fn extract(&self, path: &Path) -> anyhow::Result<String> {
            Ok(std::fs::read_to_string(path)?.to_uppercase())
        }
    }

    #[test]
    fn registered_extractor_handles_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "ref.docx", b"governing law");
        write(tmp.path(), "plain.md", b"markdown body");

        let loader = CorpusLoader::new()
            .with_extractor("DOCX", Box::new(UpperExtractor))
            .with_text_extension("md");
        let docs = loader.load(tmp.path());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "plain.md");
        assert_eq!(docs[1].text, "GOVERNING LAW");
    }
}
