//! Clean-up passes for Markdown produced by pandoc from Word documents.
//!
//! Pandoc decorates images with `{width=... height=...}` attribute blocks
//! and emits grid-table debris (`+---+` rules, missing header separators)
//! that most Markdown consumers cannot read.

use regex::Regex;

use crate::error::Result;

/// Compiled patterns for the repair passes.
#[derive(Debug, Clone)]
pub struct MarkdownRepair {
    image_attrs: Regex,
    paragraph_break: Regex,
    table_line: Regex,
    rule_line: Regex,
    separator_row: Regex,
    dashes: Regex,
}

impl MarkdownRepair {
    pub fn new() -> Result<Self> {
        Ok(Self {
            image_attrs: Regex::new(r"(!\[.*?\]\(.*?\))(\{.*?\})")?,
            paragraph_break: Regex::new(r"\n\n+")?,
            table_line: Regex::new(r"(?m)^\|")?,
            rule_line: Regex::new(r"^[+\-]+$")?,
            separator_row: Regex::new(r"^\|\s*-+\s*(\|\s*-+\s*)+\|$")?,
            dashes: Regex::new(r"-{3,}")?,
        })
    }

    /// Apply every pass.
    pub fn repair(&self, content: &str) -> String {
        self.fix_tables(&self.strip_image_attributes(content))
    }

    /// Drop `{...}` attribute blocks that directly follow an image.
    pub fn strip_image_attributes(&self, content: &str) -> String {
        self.image_attrs.replace_all(content, "$1").into_owned()
    }

    /// Repair every paragraph that contains a pipe-table line.
    pub fn fix_tables(&self, content: &str) -> String {
        self.paragraph_break
            .split(content)
            .map(|paragraph| {
                if self.table_line.is_match(paragraph) {
                    self.fix_table_block(paragraph)
                } else {
                    paragraph.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Rebuild one table paragraph: blank lines and `+---+` rules go,
    /// `#` is stripped from table rows, separator rows after the second
    /// row go, and a `| ---- |` separator follows the header.
    pub fn fix_table_block(&self, paragraph: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut header: Option<usize> = None;
        let mut has_separator = false;
        let mut row = 0;

        for line in paragraph.split('\n') {
            let trimmed = line.trim();
            if trimmed.is_empty() || self.rule_line.is_match(trimmed) {
                continue;
            }
            if !trimmed.starts_with('|') {
                lines.push(line.to_string());
                continue;
            }

            let cleaned = line.replace('#', "");
            if row > 1 && self.separator_row.is_match(&cleaned) {
                continue;
            }

            match row {
                0 => {
                    header = Some(lines.len());
                    lines.push(cleaned);
                }
                1 => {
                    if !self.dashes.is_match(&cleaned) {
                        if let Some(h) = header {
                            lines.push(separator_for(&lines[h]));
                        }
                    }
                    has_separator = true;
                    lines.push(cleaned);
                }
                _ => lines.push(cleaned),
            }
            row += 1;
        }

        if let (Some(h), false) = (header, has_separator) {
            let separator = separator_for(&lines[h]);
            lines.insert(h + 1, separator);
        }
        lines.join("\n")
    }
}

/// `| ---- | ---- |` with one cell per column of `header`.
fn separator_for(header: &str) -> String {
    let columns = header.split('|').count().saturating_sub(2).max(1);
    format!("| {} |", vec!["----"; columns].join(" | "))
}
