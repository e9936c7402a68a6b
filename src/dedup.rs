//! Deduplication applied to the merged line stream.
//!
//! Duplicates are only guaranteed to be adjacent after a chunk has been merged with everything
//! sorted before it, so dedup runs on the lines the merge emits. A simple filter drops byte
//! identical repeats, a smart aggregator then resolves runs of the same game to one kept line.

use std::io::Write;

use crate::day_bucket::DayBucketDedup;
use crate::matching::{exact_match, smart_match};
use crate::record::label_white;

const KEEP_LABEL: &str = "KEEP ";
const DISCARD_LABEL: &str = "DISCARD ";

/// Selects the smart aggregator used when a diagnostics sink is supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SmartDedup {
    /// Resolve each maximal run of adjacent [crate::matching::smart_match] lines, the default
    #[default]
    Lookback,
    /// Collect lines sharing tournament, tournament date and game date, then resolve runs of
    /// matching lines within that bucket
    DayBucket,
}

/// Writes newline terminated records and counts them.
pub(crate) struct LineWriter<'w> {
    writer: &'w mut dyn Write,
    lines: usize,
}

impl<'w> LineWriter<'w> {
    pub(crate) fn new(writer: &'w mut dyn Write) -> LineWriter<'w> {
        LineWriter {
            writer,
            lines: 0,
        }
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), anyhow::Error> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub(crate) fn lines(&self) -> usize {
        self.lines
    }
}

/// A stateful dedup stage fed one emitted line at a time.
pub(crate) trait Aggregator {
    fn push(&mut self, line: String, out: &mut LineWriter) -> Result<(), anyhow::Error>;

    /// Resolve whatever is still buffered, called at the end of every merge pass
    fn flush(&mut self, out: &mut LineWriter) -> Result<(), anyhow::Error>;

    /// Lines dropped so far
    fn discarded(&self) -> usize;

    /// Runs of matching lines resolved so far
    fn runs(&self) -> usize;
}

/// Index of the longest line, the first one on ties.
pub(crate) fn longest<'a, I: Iterator<Item = &'a str>>(lines: I) -> usize {
    let mut best = 0;
    let mut best_len = 0;
    for (i, line) in lines.enumerate() {
        let len = line.chars().count();
        if i == 0 || len > best_len {
            best = i;
            best_len = len;
        }
    }
    best
}

pub(crate) fn all_identical<'a, I: Iterator<Item = &'a str>>(mut lines: I) -> bool {
    match lines.next() {
        Some(first) => lines.all(|line| exact_match(first, line)),
        None => true,
    }
}

/// Report a resolved run that was not all identical: the kept line once, then each discarded
/// line unless it repeats the one reported just before it.
pub(crate) fn report_run<'a, I: Iterator<Item = &'a str>>(
    diagnostics: &mut dyn Write,
    kept: &str,
    discarded: I,
) -> Result<(), anyhow::Error> {
    writeln!(diagnostics, "{}", label_white(kept, KEEP_LABEL))?;
    let mut previous: Option<&str> = None;
    for line in discarded {
        if previous != Some(line) {
            writeln!(diagnostics, "{}", label_white(line, DISCARD_LABEL))?;
        }
        previous = Some(line);
    }
    Ok(())
}

/// Buffers the current run of adjacent matching lines and writes its longest member when the run
/// breaks.
pub(crate) struct LookbackDedup<'a> {
    buffer: Vec<String>,
    diagnostics: &'a mut dyn Write,
    discarded: usize,
    runs: usize,
}

impl<'a> LookbackDedup<'a> {
    pub(crate) fn new(diagnostics: &'a mut dyn Write) -> LookbackDedup<'a> {
        LookbackDedup {
            buffer: Vec::new(),
            diagnostics,
            discarded: 0,
            runs: 0,
        }
    }

    fn resolve(&mut self, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let keep = longest(self.buffer.iter().map(String::as_str));
        if self.buffer.len() > 1 {
            self.runs += 1;
            self.discarded += self.buffer.len() - 1;
            if !all_identical(self.buffer.iter().map(String::as_str)) {
                let discarded = self.buffer
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != keep)
                    .map(|(_, line)| line.as_str());
                report_run(self.diagnostics, &self.buffer[keep], discarded)?;
            }
        }
        out.write_line(&self.buffer[keep])?;
        self.buffer.clear();
        Ok(())
    }
}

impl<'a> Aggregator for LookbackDedup<'a> {
    fn push(&mut self, line: String, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        let broken = match self.buffer.last() {
            Some(last) => !smart_match(last, &line),
            None => false,
        };
        if broken {
            self.resolve(out)?;
        }
        self.buffer.push(line);
        Ok(())
    }

    fn flush(&mut self, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        self.resolve(out)
    }

    fn discarded(&self) -> usize {
        self.discarded
    }

    fn runs(&self) -> usize {
        self.runs
    }
}

/// Everything the merge emits passes through here on its way to the write side.
pub(crate) struct Emitter<'a> {
    simple_uniq: bool,
    previous: Option<String>,
    aggregator: Option<Box<dyn Aggregator + 'a>>,
    dropped: usize,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(simple_uniq: bool, smart_dedup: SmartDedup, diagnostics: Option<&'a mut dyn Write>) -> Emitter<'a> {
        let aggregator: Option<Box<dyn Aggregator + 'a>> = match diagnostics {
            None => None,
            Some(diagnostics) => match smart_dedup {
                SmartDedup::Lookback => Some(Box::new(LookbackDedup::new(diagnostics))),
                SmartDedup::DayBucket => Some(Box::new(DayBucketDedup::new(diagnostics))),
            },
        };
        Emitter {
            simple_uniq,
            previous: None,
            aggregator,
            dropped: 0,
        }
    }

    pub(crate) fn emit(&mut self, line: String, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        if self.simple_uniq && self.previous.as_deref() == Some(line.as_str()) {
            self.dropped += 1;
            return Ok(());
        }
        match self.aggregator.as_mut() {
            Some(aggregator) => {
                if self.simple_uniq {
                    // the aggregator owns the line, reuse the previous allocation
                    match self.previous.as_mut() {
                        Some(previous) => {
                            previous.clear();
                            previous.push_str(&line);
                        }
                        None => self.previous = Some(line.clone()),
                    }
                }
                aggregator.push(line, out)
            }
            None => {
                out.write_line(&line)?;
                if self.simple_uniq {
                    self.previous = Some(line);
                }
                Ok(())
            }
        }
    }

    /// Close a merge pass. The first line of the next pass is never dropped.
    pub(crate) fn end_pass(&mut self, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        self.previous = None;
        match self.aggregator.as_mut() {
            Some(aggregator) => aggregator.flush(out),
            None => Ok(()),
        }
    }

    /// Lines dropped by either stage over all passes
    pub(crate) fn dropped(&self) -> usize {
        self.dropped + self.aggregator.as_ref().map_or(0, |aggregator| aggregator.discarded())
    }

    pub(crate) fn runs(&self) -> usize {
        self.aggregator.as_ref().map_or(0, |aggregator| aggregator.runs())
    }
}
