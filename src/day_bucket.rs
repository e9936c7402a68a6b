use std::io::Write;

use crate::dedup::{all_identical, longest, report_run, Aggregator, LineWriter};
use crate::matching::{exact_match, smart_match};
use crate::record::day_key;

#[derive(Debug)]
struct BucketEntry {
    line: String,
    keep: bool,
}

/// Day bucketed dedup.
///
/// Lines are collected while they share the same `<tournament-date> <event>, <site> # <game-date>`
/// key. When the key changes the bucket is resolved: sorted copies are scanned for runs of lines
/// that [exact_match] or [smart_match] their neighbour, and each run is reduced to its longest
/// member. Lines are written back in the order they were buffered. For a run that is not all
/// identical the earliest buffered member takes the kept content, so a later, better annotated
/// copy wins without moving the game.
pub(crate) struct DayBucketDedup<'a> {
    bucket: Vec<BucketEntry>,
    cached_day: Option<String>,
    diagnostics: &'a mut dyn Write,
    discarded: usize,
    runs: usize,
}

impl<'a> DayBucketDedup<'a> {
    pub(crate) fn new(diagnostics: &'a mut dyn Write) -> DayBucketDedup<'a> {
        DayBucketDedup {
            bucket: Vec::new(),
            cached_day: None,
            diagnostics,
            discarded: 0,
            runs: 0,
        }
    }

    fn same_game(a: &str, b: &str) -> bool {
        exact_match(a, b) || smart_match(a, b)
    }

    fn resolve_bucket(&mut self) -> Result<(), anyhow::Error> {
        // stable, so equal lines stay in buffer order
        let mut sorted: Vec<usize> = (0..self.bucket.len()).collect();
        sorted.sort_by(|a, b| self.bucket[*a].line.cmp(&self.bucket[*b].line));

        let mut start = 0;
        while start < sorted.len() {
            let mut end = start + 1;
            while end < sorted.len()
                && Self::same_game(&self.bucket[sorted[end - 1]].line, &self.bucket[sorted[end]].line) {
                end += 1;
            }
            if end - start > 1 {
                self.resolve_run(&sorted[start..end])?;
            }
            start = end;
        }
        Ok(())
    }

    /// `members` are bucket positions in sorted order
    fn resolve_run(&mut self, members: &[usize]) -> Result<(), anyhow::Error> {
        self.runs += 1;
        self.discarded += members.len() - 1;
        let keep = members[longest(members.iter().map(|i| self.bucket[*i].line.as_str()))];

        let identical = all_identical(members.iter().map(|i| self.bucket[*i].line.as_str()));
        let position = if identical {
            keep
        } else {
            let discarded = members
                .iter()
                .filter(|i| **i != keep)
                .map(|i| self.bucket[*i].line.as_str());
            report_run(self.diagnostics, &self.bucket[keep].line, discarded)?;
            let earliest = members.iter().copied().min().unwrap_or(keep);
            if earliest != keep {
                let kept = self.bucket[keep].line.clone();
                self.bucket[earliest].line = kept;
            }
            earliest
        };

        for i in members {
            self.bucket[*i].keep = *i == position;
        }
        Ok(())
    }
}

impl<'a> Aggregator for DayBucketDedup<'a> {
    fn push(&mut self, line: String, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        let day = day_key(&line);
        if self.cached_day.as_deref() != Some(day) {
            self.flush(out)?;
            self.cached_day = Some(day.to_string());
        }
        self.bucket.push(
            BucketEntry {
                line,
                keep: true,
            }
        );
        Ok(())
    }

    fn flush(&mut self, out: &mut LineWriter) -> Result<(), anyhow::Error> {
        self.cached_day = None;
        if self.bucket.is_empty() {
            return Ok(());
        }
        if self.bucket.len() > 1 {
            self.resolve_bucket()?;
        }
        for entry in self.bucket.drain(..) {
            if entry.keep {
                out.write_line(&entry.line)?;
            }
        }
        Ok(())
    }

    fn discarded(&self) -> usize {
        self.discarded
    }

    fn runs(&self) -> usize {
        self.runs
    }
}
