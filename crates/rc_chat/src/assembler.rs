//! Turns the deltas of a streamed reply into the text shown to the user.

use rc_stream::Citation;

/// Separates the reply from its citation block.
const CITATIONS_RULE: &str = "---";

/// Builds the visible content of a reply while it streams in.
///
/// Until the first delta arrives the content is a placeholder. The first
/// delta replaces the placeholder, every later delta is appended verbatim.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    content: String,

    /// Whether `content` still holds the placeholder.
    placeholder: bool,
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> String {
        self.content
    }

    /// Show `placeholder` until the first delta arrives.
    pub fn show_placeholder(&mut self, placeholder: &str) {
        placeholder.clone_into(&mut self.content);
        self.placeholder = true;
    }

    pub fn push(&mut self, text: &str) {
        if self.placeholder {
            self.content.clear();
            self.placeholder = false;
        }

        self.content.push_str(text);
    }

    /// Replace whatever is shown with `text`.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.content = text.into();
        self.placeholder = false;
    }

    /// Trim the reply and append the citation block, if there are any
    /// citations.
    pub fn finalize(&mut self, citations: &[Citation]) {
        if self.placeholder {
            self.content.clear();
            self.placeholder = false;
        }

        let mut content = self.content.trim().to_owned();
        if let Some(block) = format_citations(citations) {
            if !content.is_empty() {
                content.push_str("\n\n");
            }
            content.push_str(&block);
        }

        self.content = content;
    }
}

/// Render `citations` as a numbered list, or `None` if there are none.
///
/// ```text
/// ---
/// Citations:
/// 1. handbook.pdf (page 3)
///    "First line of the snippet
///    second line of the snippet"
/// ```
#[must_use]
pub fn format_citations(citations: &[Citation]) -> Option<String> {
    if citations.is_empty() {
        return None;
    }

    let mut block = format!("{CITATIONS_RULE}\nCitations:");
    for (index, citation) in citations.iter().enumerate() {
        block.push_str(&format!("\n{}. {}", index + 1, citation.source_id));
        if let Some(locator) = &citation.locator {
            block.push_str(&format!(" ({locator})"));
        }

        let Some(snippet) = citation.snippet.as_deref().map(str::trim) else {
            continue;
        };
        if snippet.is_empty() {
            continue;
        }

        let snippet = snippet
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n    ");
        block.push_str(&format!("\n   \"{snippet}\""));
    }

    Some(block)
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
