//! Output formatting for JSON, JSONL and plain-text output.
//!
//! Provides a writer that can output single records or batches in JSON,
//! JSON Lines, or one `path<TAB>caption` line per record.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::CaptionRecord;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
    /// One tab-separated line per record
    Text,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            "text" | "txt" | "tsv" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Records that have a plain-text rendering.
pub trait TextLine {
    fn text_line(&self) -> String;
}

impl TextLine for CaptionRecord {
    fn text_line(&self) -> String {
        format!("{}\t{}", self.file_path.display(), self.caption)
    }
}

/// A writer that serializes records in the chosen format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single record.
    pub fn write<T: Serialize + TextLine>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Json | OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Text => {
                writeln!(self.writer, "{}", item.text_line())?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple records.
    ///
    /// For JSON format, writes a JSON array; otherwise one record per line.
    pub fn write_all<T: Serialize + TextLine>(&mut self, items: &[T]) -> io::Result<()> {
        if self.format != OutputFormat::Json {
            for item in items {
                self.write(item)?;
            }
            return Ok(());
        }

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, items).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += items.len();
        Ok(())
    }

    /// Get the number of records written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Serialize an item to a JSON string.
pub fn to_json<T: Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}
