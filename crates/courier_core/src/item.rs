use std::path::Path;

use chrono::NaiveDate;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Descriptive fields sent along with a document as `source_info`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub publication_date: String,
    pub url: String,
    pub notes: String,
}

impl Metadata {
    /// Fill blank fields the way the upload form does: title from the file
    /// stem, a placeholder author, and `today` as publication date.
    pub fn with_defaults(mut self, file_name: &str, today: NaiveDate) -> Self {
        if self.title.trim().is_empty() {
            self.title = file_stem(file_name);
        }
        if self.author.trim().is_empty() {
            self.author = UNKNOWN_AUTHOR.to_string();
        }
        if self.publication_date.trim().is_empty() {
            self.publication_date = today.format("%Y-%m-%d").to_string();
        }
        self
    }

    /// JSON document the ingestion service expects in the `source_info` form field.
    pub fn to_source_info(&self) -> String {
        serde_json::json!({
            "title": self.title,
            "author": self.author,
            "publication_date": self.publication_date,
            "url": self.url,
            "additional_notes": self.notes,
        })
        .to_string()
    }

    /// Whether the fields a text submission must carry are present.
    pub fn has_required_fields(&self) -> bool {
        [&self.title, &self.author, &self.publication_date]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

fn file_stem(file_name: &str) -> String {
    // Everything before the first dot, matching how the form derives titles.
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name);
    base.split('.').next().unwrap_or(base).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn len(&self) -> u64 {
        match self {
            Payload::Bytes(bytes) => bytes.len() as u64,
            Payload::Text(text) => text.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Bytes(bytes) => bytes,
            Payload::Text(text) => text.as_bytes(),
        }
    }
}

/// One unit of work for the job-accepting service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    name: String,
    payload: Payload,
    domain: String,
    metadata: Metadata,
}

impl WorkItem {
    pub fn file(
        name: impl Into<String>,
        bytes: Vec<u8>,
        domain: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Bytes(bytes),
            domain: domain.into(),
            metadata,
        }
    }

    /// A text item is uploaded as `<title>.txt`.
    pub fn text(text: impl Into<String>, domain: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: format!("{}.txt", metadata.title),
            payload: Payload::Text(text.into()),
            domain: domain.into(),
            metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn size(&self) -> u64 {
        self.payload.len()
    }

    pub fn content_type(&self) -> &'static str {
        if let Payload::Text(_) = self.payload {
            return "text/plain";
        }
        let extension = Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            _ => "application/octet-stream",
        }
    }

    /// Same item with metadata replaced; used when metadata is resolved
    /// right before submission.
    pub fn with_metadata(self, metadata: Metadata) -> Self {
        Self { metadata, ..self }
    }
}

/// Stable reference to an item inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub index: usize,
    pub name: String,
}

impl ItemRef {
    pub fn new(index: usize, item: &WorkItem) -> Self {
        Self {
            index,
            name: item.name().to_string(),
        }
    }
}
