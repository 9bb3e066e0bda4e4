//! Export document rendering.
//!
//! A snapshot is written to a [`DocumentSink`] as an ordered sequence of
//! headings, paragraphs and monospaced blocks. The sink decides the format;
//! [`MarkdownDocument`] is the one shipped with projex.

use crate::Snapshot;
use chrono::{DateTime, Utc};

/// Receives the blocks of an export document in order.
pub trait DocumentSink {
    /// Section heading, `level` 1 being the document title.
    fn heading(&mut self, level: u8, text: &str);

    /// Plain text paragraph.
    fn paragraph(&mut self, text: &str);

    /// Monospaced block, rendered verbatim.
    fn code_block(&mut self, text: &str);

    /// Start a new page, where the format has pages.
    fn page_break(&mut self);
}

/// Markdown document builder.
#[derive(Debug, Default, Clone)]
pub struct MarkdownDocument {
    buffer: String,
}

impl MarkdownDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    fn push_block(&mut self, block: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(block);
        self.buffer.push('\n');
    }
}

/// Shortest backtick fence that cannot be closed by content.
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

impl DocumentSink for MarkdownDocument {
    fn heading(&mut self, level: u8, text: &str) {
        let hashes = "#".repeat(level.clamp(1, 6) as usize);
        self.push_block(&format!("{hashes} {text}"));
    }

    fn paragraph(&mut self, text: &str) {
        self.push_block(text);
    }

    fn code_block(&mut self, text: &str) {
        let fence = fence_for(text);
        let body = text.strip_suffix('\n').unwrap_or(text);
        self.push_block(&format!("{fence}\n{body}\n{fence}"));
    }

    fn page_break(&mut self) {
        self.push_block("---");
    }
}

/// Write a full export of `snapshot` to `sink`.
pub fn render_export<S: DocumentSink + ?Sized>(
    sink: &mut S,
    snapshot: &Snapshot,
    generated_at: DateTime<Utc>,
) {
    sink.heading(1, "Project Documentation Export");
    sink.paragraph(&format!("Source path: {}", snapshot.root.display()));
    sink.paragraph(&format!(
        "Generated at: {} UTC",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    sink.heading(2, "Folder Structure");
    sink.code_block(&snapshot.tree);
    sink.page_break();

    sink.heading(2, "File Contents");
    for record in &snapshot.records {
        sink.heading(3, &record.relative_path);
        sink.paragraph(&format!(
            "Size: {} bytes | Modified: {}",
            record.size_bytes,
            record.modified_display()
        ));
        sink.code_block(&record.content.to_string());
    }
}
