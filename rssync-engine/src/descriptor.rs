//! Streaming descriptor reader.
//!
//! The descriptor is consumed front to back as a pull-based sequence of
//! [`DescriptorEvent`]s; no tree is ever built. Element and attribute names are
//! folded to upper case so `<folder name=…>` and `<FOLDER NAME=…>` are the same.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{descriptor_io_err, SyncError};

/// Attribute name (upper case) to value.
pub type Attributes = BTreeMap<String, String>;

/// One open or close tag, with the line the reader had reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorEvent {
    Open {
        name: String,
        attrs: Attributes,
        line: u64,
    },
    Close {
        name: String,
        line: u64,
    },
}

/// Element kinds the sync driver acts on. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Folder,
    DataSource,
    DataSet,
    Report,
    ItemReference,
    Role,
    Task,
}

impl ElementKind {
    /// Match an upper-cased element name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FOLDER" => Some(Self::Folder),
            "DATASOURCE" => Some(Self::DataSource),
            "DATASET" => Some(Self::DataSet),
            "REPORT" => Some(Self::Report),
            "ITEMREFERENCE" => Some(Self::ItemReference),
            "ROLE" => Some(Self::Role),
            "TASK" => Some(Self::Task),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Line tracking
// ---------------------------------------------------------------------------

/// Counts newlines as the XML reader consumes its input.
struct LineCounter<R> {
    inner: R,
    newlines: u64,
}

impl<R> LineCounter<R> {
    fn line(&self) -> u64 {
        self.newlines + 1
    }
}

impl<R: BufRead> Read for LineCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.newlines += count_newlines(&buf[..n]);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for LineCounter<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        // The buffer is already filled, so this does not read.
        if let Ok(buf) = self.inner.fill_buf() {
            let end = amt.min(buf.len());
            self.newlines += count_newlines(&buf[..end]);
        }
        self.inner.consume(amt);
    }
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|b| **b == b'\n').count() as u64
}

// ---------------------------------------------------------------------------
// Event sequence
// ---------------------------------------------------------------------------

enum Step {
    Open {
        name: String,
        attrs: Attributes,
        empty: bool,
    },
    Close(String),
    Eof,
    Skip,
}

/// Lazy sequence of descriptor events over any buffered reader.
///
/// A self-closing element yields an `Open` immediately followed by its `Close`.
/// The first error ends the sequence.
pub struct DescriptorEvents<R> {
    reader: Reader<LineCounter<R>>,
    buf: Vec<u8>,
    pending_close: Option<String>,
    unclosed: usize,
    finished: bool,
}

impl DescriptorEvents<BufReader<File>> {
    /// Open a descriptor file for streaming.
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let file = File::open(path).map_err(|e| descriptor_io_err(path, e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> DescriptorEvents<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: Reader::from_reader(LineCounter {
                inner: input,
                newlines: 0,
            }),
            buf: Vec::new(),
            pending_close: None,
            unclosed: 0,
            finished: false,
        }
    }

    /// Line the reader has reached (1-based).
    pub fn line(&self) -> u64 {
        self.reader.get_ref().line()
    }
}

impl<R: BufRead> Iterator for DescriptorEvents<R> {
    type Item = Result<DescriptorEvent, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(name) = self.pending_close.take() {
            self.unclosed = self.unclosed.saturating_sub(1);
            return Some(Ok(DescriptorEvent::Close {
                name,
                line: self.line(),
            }));
        }

        loop {
            self.buf.clear();
            let step = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => element(&e).map(|(name, attrs)| Step::Open {
                    name,
                    attrs,
                    empty: false,
                }),
                Ok(Event::Empty(e)) => element(&e).map(|(name, attrs)| Step::Open {
                    name,
                    attrs,
                    empty: true,
                }),
                Ok(Event::End(e)) => upper_name(e.name().as_ref()).map(Step::Close),
                Ok(Event::Eof) => Ok(Step::Eof),
                Ok(_) => Ok(Step::Skip),
                Err(e) => Err(e.to_string()),
            };
            let line = self.line();

            match step {
                Ok(Step::Skip) => continue,
                Ok(Step::Open { name, attrs, empty }) => {
                    self.unclosed += 1;
                    if empty {
                        self.pending_close = Some(name.clone());
                    }
                    return Some(Ok(DescriptorEvent::Open { name, attrs, line }));
                }
                Ok(Step::Close(name)) => {
                    self.unclosed = self.unclosed.saturating_sub(1);
                    return Some(Ok(DescriptorEvent::Close { name, line }));
                }
                Ok(Step::Eof) => {
                    self.finished = true;
                    if self.unclosed > 0 {
                        return Some(Err(SyncError::Xml {
                            line,
                            message: format!(
                                "unexpected end of document with {} unclosed element(s)",
                                self.unclosed
                            ),
                        }));
                    }
                    return None;
                }
                Err(message) => {
                    self.finished = true;
                    return Some(Err(SyncError::Xml { line, message }));
                }
            }
        }
    }
}

fn element(start: &BytesStart<'_>) -> Result<(String, Attributes), String> {
    let name = upper_name(start.name().as_ref())?;
    let mut attrs = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = upper_name(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attrs.insert(key, value.into_owned());
    }
    Ok((name, attrs))
}

fn upper_name(raw: &[u8]) -> Result<String, String> {
    std::str::from_utf8(raw)
        .map(|s| s.to_ascii_uppercase())
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
