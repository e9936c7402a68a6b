use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use regex::Regex;

use crate::error::SortError;
use crate::order::Order;

/// Read one record, without its line terminator. Invalid UTF-8 is replaced, not rejected.
pub(crate) fn read_record<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> std::io::Result<Option<String>> {
    buffer.clear();
    if reader.read_until(b'\n', buffer)? == 0 {
        return Ok(None);
    }
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
    let line = match String::from_utf8(std::mem::take(buffer)) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(Some(line))
}

/// One in-memory batch of records
#[derive(Debug)]
pub(crate) struct Chunk {
    lines: Vec<String>,
    bytes: u64,
}

impl Chunk {
    pub(crate) fn new(lines: Vec<String>, bytes: u64) -> Chunk {
        Chunk {
            lines,
            bytes,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn sort(&mut self, order: Order) {
        self.lines.sort_unstable_by(|a, b| order.compare(a, b));
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Reads the input files, in sequence, as chunks of records. A chunk is closed as soon as the
/// accumulated length of its lines reaches `chunk_size_bytes`, so every chunk holds at least one
/// line however long it is.
pub(crate) struct ChunkIterator {
    inputs: VecDeque<(PathBuf, BufReader<File>)>,
    chunk_size_bytes: u64,
    ignore_empty: bool,
    ignore_lines: Option<Regex>,
    buffer: Vec<u8>,
    ignored: usize,
}

impl ChunkIterator {
    pub(crate) fn new(
        paths: &[PathBuf],
        chunk_size_bytes: u64,
        ignore_empty: bool,
        ignore_lines: Option<Regex>,
    ) -> Result<ChunkIterator, anyhow::Error> {
        let mut inputs = VecDeque::with_capacity(paths.len());
        for path in paths {
            let file = File::open(path).map_err(|e| SortError::open(path, e))?;
            inputs.push_back((path.clone(), BufReader::new(file)));
        }

        Ok(
            ChunkIterator {
                inputs,
                chunk_size_bytes: chunk_size_bytes.max(1),
                ignore_empty,
                ignore_lines,
                buffer: Vec::new(),
                ignored: 0,
            }
        )
    }

    /// Lines dropped by the empty line and regex filters so far
    pub(crate) fn ignored(&self) -> usize {
        self.ignored
    }

    fn is_ignored(&self, line: &str) -> bool {
        if self.ignore_empty && line.trim().is_empty() {
            return true;
        }
        match &self.ignore_lines {
            Some(r) => r.is_match(line),
            None => false,
        }
    }
}

impl Iterator for ChunkIterator {
    type Item = Result<Chunk, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut lines = Vec::new();
        let mut bytes = 0;
        while bytes < self.chunk_size_bytes {
            let (path, reader) = match self.inputs.front_mut() {
                Some(input) => input,
                None => break,
            };
            match read_record(reader, &mut self.buffer) {
                Ok(Some(line)) => {
                    if self.is_ignored(&line) {
                        self.ignored += 1;
                        continue;
                    }
                    bytes += line.len() as u64 + 1;
                    lines.push(line);
                }
                Ok(None) => {
                    self.inputs.pop_front();
                }
                Err(e) => {
                    let path = path.clone();
                    self.inputs.clear();
                    return Some(Err(anyhow::Error::new(e).context(format!("path: {}", path.display()))));
                }
            }
        }

        if lines.is_empty() {
            None
        } else {
            Some(Ok(Chunk::new(lines, bytes)))
        }
    }
}
