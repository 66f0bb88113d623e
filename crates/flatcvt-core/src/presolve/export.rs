//! JSON-lines export of link entries.

use super::link::Link;
use super::node::{NodeRange, ValueNode};
use crate::error::ConvertError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct RangeRecord<'a> {
    node: &'a str,
    kind: &'static str,
    begin: usize,
    end: usize,
}

#[derive(Debug, Serialize)]
struct LinkRecord<'a> {
    index: usize,
    #[serde(rename = "type")]
    link_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregation: Option<&'static str>,
    src: RangeRecord<'a>,
    dst: Vec<RangeRecord<'a>>,
}

fn range_record<'a>(range: &NodeRange, nodes: &'a [ValueNode]) -> RangeRecord<'a> {
    let node = &nodes[range.node.index()];
    RangeRecord {
        node: node.name(),
        kind: node.kind().as_str(),
        begin: range.begin,
        end: range.end,
    }
}

/// Append-only sink writing one JSON object per link.
#[derive(Debug)]
pub struct LinkExporter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl LinkExporter {
    pub fn create(path: &Path) -> Result<Self, ConvertError> {
        let file = File::create(path).map_err(|err| ConvertError::Export {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        tracing::debug!(
            component = "presolve",
            operation = "open_export",
            status = "success",
            path = %path.display(),
            "Opened link graph export"
        );
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn io_error(&self, err: impl std::fmt::Display) -> ConvertError {
        ConvertError::Export {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn write_link(
        &mut self,
        index: usize,
        link: &Link,
        nodes: &[ValueNode],
    ) -> Result<(), ConvertError> {
        let aggregation = match link {
            Link::OneToMany { aggregation, .. } => Some(aggregation.as_str()),
            Link::Copy { .. } => None,
        };
        let record = LinkRecord {
            index,
            link_type: link.type_name(),
            aggregation,
            src: range_record(link.src(), nodes),
            dst: link
                .targets()
                .iter()
                .map(|r| range_record(r, nodes))
                .collect(),
        };
        serde_json::to_writer(&mut self.writer, &record).map_err(|e| self.io_error(e))?;
        self.writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close; returns the number of lines written.
    pub fn close(mut self) -> Result<usize, ConvertError> {
        self.writer.flush().map_err(|e| self.io_error(e))?;
        tracing::debug!(
            component = "presolve",
            operation = "close_export",
            status = "success",
            path = %self.path.display(),
            entries = self.written,
            "Closed link graph export"
        );
        Ok(self.written)
    }
}
