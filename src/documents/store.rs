//! Document store: turns a policy document into a flat list of text chunks
//! and persists that list so the retriever can be rebuilt without
//! re-extracting the source. PDF sources are run through `pdf-extract`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::InputError;

/// An immutable unit of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// How extracted text is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkPolicy {
    /// Split on blank lines.
    #[default]
    Paragraphs,
    /// Consecutive windows of `size` whitespace-separated words.
    WordWindow { size: usize },
}

impl ChunkPolicy {
    pub const DEFAULT_WINDOW: usize = 500;

    /// Split `text` into non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        match *self {
            Self::Paragraphs => text
                .replace("\r\n", "\n")
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(Chunk::new)
                .collect(),
            Self::WordWindow { size } => {
                let words: Vec<&str> = text.split_whitespace().collect();
                words
                    .chunks(size.max(1))
                    .map(|window| Chunk::new(window.join(" ")))
                    .collect()
            }
        }
    }
}

/// Builds and persists the chunk list for one source document.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    chunks_path: PathBuf,
    policy: ChunkPolicy,
}

impl DocumentStore {
    pub fn new(chunks_path: impl Into<PathBuf>, policy: ChunkPolicy) -> Self {
        Self {
            chunks_path: chunks_path.into(),
            policy,
        }
    }

    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    /// Read `source`, split it into chunks, and persist the list.
    ///
    /// `.pdf` sources have their text extracted first; anything else is read
    /// as UTF-8 text.
    pub async fn build(&self, source: &Path) -> Result<Vec<Chunk>, InputError> {
        let text = extract_text(source).await?;

        let chunks = self.policy.split(&text);
        info!(
            source = %source.display(),
            chunks = chunks.len(),
            "Extracted document chunks"
        );

        self.persist(&chunks).await?;
        Ok(chunks)
    }

    /// Reload a previously persisted chunk list.
    pub async fn load(&self) -> Result<Vec<Chunk>, InputError> {
        let data = tokio::fs::read(&self.chunks_path)
            .await
            .map_err(|e| self.store_error(e))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&data).map_err(|e| self.store_error(e))?;
        debug!(path = %self.chunks_path.display(), chunks = chunks.len(), "Loaded chunks");
        Ok(chunks)
    }

    /// Reuse persisted chunks when present, otherwise build from `source`.
    pub async fn load_or_build(&self, source: &Path) -> Result<Vec<Chunk>, InputError> {
        if tokio::fs::try_exists(&self.chunks_path)
            .await
            .unwrap_or(false)
        {
            return self.load().await;
        }
        self.build(source).await
    }

    async fn persist(&self, chunks: &[Chunk]) -> Result<(), InputError> {
        if let Some(parent) = self.chunks_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.store_error(e))?;
            }
        }
        let json = serde_json::to_vec(chunks).map_err(|e| self.store_error(e))?;
        tokio::fs::write(&self.chunks_path, json)
            .await
            .map_err(|e| self.store_error(e))?;
        debug!(path = %self.chunks_path.display(), "Persisted chunks");
        Ok(())
    }

    fn store_error(&self, reason: impl std::fmt::Display) -> InputError {
        InputError::ChunkStore {
            path: self.chunks_path.clone(),
            reason: reason.to_string(),
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn extract_text(source: &Path) -> Result<String, InputError> {
    let unreadable = |e: std::io::Error| InputError::UnreadableDocument {
        path: source.to_path_buf(),
        source: e,
    };

    if !is_pdf(source) {
        return tokio::fs::read_to_string(source).await.map_err(unreadable);
    }

    let bytes = tokio::fs::read(source).await.map_err(unreadable)?;
    let unextractable = |reason: String| InputError::UnextractableDocument {
        path: source.to_path_buf(),
        reason,
    };
    // pdf-extract is synchronous and may panic on malformed input.
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| unextractable(e.to_string()))?
        .map_err(|e| unextractable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-page PDF with a line of text per entry in `lines`.
    fn write_pdf(path: &Path, lines: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{Document, Object, Stream, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-40).into()]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let chunks = ChunkPolicy::Paragraphs.split("First para.\r\n\r\n  \n\nSecond\npara.\n\n");
        assert_eq!(
            chunks,
            vec![Chunk::new("First para."), Chunk::new("Second\npara.")]
        );
    }

    #[test]
    fn word_windows_keep_the_remainder() {
        let chunks = ChunkPolicy::WordWindow { size: 2 }.split("a b c d e");
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(ChunkPolicy::Paragraphs.split("\n\n \n").is_empty());
        assert!(ChunkPolicy::WordWindow { size: 10 }.split("   ").is_empty());
    }

    #[tokio::test]
    async fn persisted_chunks_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("policy.txt");
        tokio::fs::write(&source, "Gamma.\n\nAlpha.\n\nBeta.")
            .await
            .unwrap();

        let store = DocumentStore::new(dir.path().join("data/chunks.json"), ChunkPolicy::Paragraphs);
        let built = store.build(&source).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(built, loaded);
        assert_eq!(loaded[0].text, "Gamma.");
        assert_eq!(loaded[2].text, "Beta.");
    }

    #[tokio::test]
    async fn persisted_format_is_a_list_of_text_objects() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("policy.txt");
        tokio::fs::write(&source, "Only chunk.").await.unwrap();

        let store = DocumentStore::new(dir.path().join("chunks.json"), ChunkPolicy::Paragraphs);
        store.build(&source).await.unwrap();

        let raw = tokio::fs::read_to_string(store.chunks_path()).await.unwrap();
        assert_eq!(raw, r#"[{"text":"Only chunk."}]"#);
    }

    #[tokio::test]
    async fn load_or_build_prefers_persisted_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let chunks_path = dir.path().join("chunks.json");
        tokio::fs::write(&chunks_path, r#"[{"text":"cached"}]"#)
            .await
            .unwrap();

        let store = DocumentStore::new(&chunks_path, ChunkPolicy::Paragraphs);
        let chunks = store
            .load_or_build(Path::new("/no/such/source.txt"))
            .await
            .unwrap();
        assert_eq!(chunks, vec![Chunk::new("cached")]);
    }

    #[tokio::test]
    async fn unreadable_source_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("chunks.json"), ChunkPolicy::Paragraphs);
        let err = store
            .build(Path::new("/no/such/source.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::UnreadableDocument { .. }));
    }

    #[tokio::test]
    async fn pdf_sources_are_extracted_before_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Policy.PDF");
        write_pdf(
            &source,
            &["Claims must be filed within thirty days.", "Premiums are due monthly."],
        );

        let store = DocumentStore::new(
            dir.path().join("chunks.json"),
            ChunkPolicy::WordWindow { size: 500 },
        );
        let chunks = store.build(&source).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("Claims must be filed within thirty days."));
        assert!(chunks[0].text.contains("Premiums are due monthly."));
        assert_eq!(store.load().await.unwrap(), chunks);
    }

    #[tokio::test]
    async fn garbage_pdf_is_unextractable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.pdf");
        tokio::fs::write(&source, "plain text pretending to be a pdf")
            .await
            .unwrap();

        let store = DocumentStore::new(dir.path().join("chunks.json"), ChunkPolicy::Paragraphs);
        let err = store.build(&source).await.unwrap_err();
        assert!(matches!(err, InputError::UnextractableDocument { .. }));
        assert!(!store.chunks_path().exists());
    }

    #[test]
    fn pdf_detection_uses_the_extension() {
        assert!(is_pdf(Path::new("data/policy.pdf")));
        assert!(is_pdf(Path::new("POLICY.Pdf")));
        assert!(!is_pdf(Path::new("policy.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[tokio::test]
    async fn corrupt_chunk_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let chunks_path = dir.path().join("chunks.json");
        tokio::fs::write(&chunks_path, "not json").await.unwrap();

        let store = DocumentStore::new(&chunks_path, ChunkPolicy::Paragraphs);
        assert!(matches!(
            store.load().await,
            Err(InputError::ChunkStore { .. })
        ));
    }
}
