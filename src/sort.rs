use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;

use crate::chunk_iterator::{read_record, ChunkIterator};
use crate::config::{tmp_dir_for, tmp_prefix_for, Config};
use crate::dedup::{Emitter, LineWriter, SmartDedup};
use crate::error::SortError;
use crate::merge_stream::{MergeStreamPair, SortedStream};
use crate::order::Order;

const TMP_STAGE: &str = "disksort";

/// Counters of one [DiskSort] run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Lines read from the inputs, ignored lines excluded
    pub lines_read: usize,
    /// Lines in the output file
    pub lines_written: usize,
    /// Lines removed by simple or smart dedup
    pub duplicates_dropped: usize,
    /// Runs of matching games resolved by smart dedup
    pub smart_runs: usize,
    /// Chunks merged
    pub chunks: usize,
}

/// Disk backed merge sort of one-line game records.
///
/// The input is read in chunks bounded by their accumulated byte length. Each chunk is sorted in
/// memory and merged with everything sorted so far into a second temporary file, then the two
/// temporary files swap roles. Memory use is one chunk regardless of the input size and there is
/// no limit on the length of a line.
///
/// Lines are ordered as plain byte strings, which the sort prefix of a record is laid out for.
/// Deduplication runs on the merged stream, where duplicates are adjacent.
///
/// # Examples
/// ```no_run
/// use std::path::PathBuf;
/// use lpgn_sort::sort::DiskSort;
///
/// fn sort_games(input: PathBuf, output: PathBuf, report: PathBuf) -> Result<(), anyhow::Error> {
///     let mut disk_sort = DiskSort::new(vec![input], output);
///     // read the input in 64 MB chunks
///     disk_sort.with_chunk_size_mb(64);
///     // resolve duplicate games, reporting kept and discarded copies
///     disk_sort.with_diagnostics(report);
///     let stats = disk_sort.sort()?;
///     println!("{} games written", stats.lines_written);
///     Ok(())
/// }
/// ```
pub struct DiskSort {
    input_files: Vec<PathBuf>,
    output: PathBuf,
    tmp: Option<PathBuf>,
    chunk_size_bytes: u64,
    order: Order,
    simple_uniq: bool,
    smart_dedup: SmartDedup,
    diagnostics: Option<PathBuf>,
    ignore_empty: bool,
    ignore_lines: Option<Regex>,
}

impl DiskSort {
    /// Create a default DiskSort definition.
    ///
    /// * temporary files are created next to the output
    /// * input is read in chunks of 10 MB
    /// * default Order is Asc
    /// * byte identical neighbours are dropped
    /// * smart dedup is off until a diagnostics file is given, then [SmartDedup::Lookback]
    /// * empty lines are sorted like any other line
    pub fn new(input_files: Vec<PathBuf>, output: PathBuf) -> DiskSort {
        DiskSort {
            input_files,
            output,
            tmp: None,
            chunk_size_bytes: 10_000_000,
            order: Order::Asc,
            simple_uniq: true,
            smart_dedup: SmartDedup::Lookback,
            diagnostics: None,
            ignore_empty: false,
            ignore_lines: None,
        }
    }

    /// Set directory for the two temporary merge files. By default they are created in the
    /// directory of the output file.
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = Some(tmp);
    }

    /// The input will be read in chunks of 'chunk_size_bytes' respecting line boundaries
    pub fn with_chunk_size_bytes(&mut self, chunk_size_bytes: u64) {
        self.chunk_size_bytes = chunk_size_bytes;
    }

    /// The input will be read in chunks of 'chunk_size_mb' MB respecting line boundaries
    pub fn with_chunk_size_mb(&mut self, chunk_size_mb: u64) {
        self.chunk_size_bytes = chunk_size_mb * 1_000_000;
    }

    /// Set [Order]
    pub fn with_order(&mut self, order: Order) {
        self.order = order
    }

    /// Drop lines identical to the line emitted just before them. The default is true
    pub fn with_simple_uniq(&mut self, simple_uniq: bool) {
        self.simple_uniq = simple_uniq
    }

    /// Select the smart dedup used when a diagnostics sink is present
    pub fn with_smart_dedup(&mut self, smart_dedup: SmartDedup) {
        self.smart_dedup = smart_dedup
    }

    /// Enable smart dedup and write KEEP/DISCARD reports to `diagnostics`
    pub fn with_diagnostics(&mut self, diagnostics: PathBuf) {
        self.diagnostics = Some(diagnostics)
    }

    /// Direct the algorithm to ignore empty lines. The default is false
    pub fn with_ignore_empty(&mut self) {
        self.ignore_empty = true;
    }

    /// Specify which lines to ignore. Each line matching the regex will be ignored and will not
    /// appear in the output.
    pub fn with_ignore_lines(&mut self, r: Regex) {
        self.ignore_lines = Some(r)
    }

    /// Sort the inputs into the output, opening the configured diagnostics file if any
    pub fn sort(&self) -> Result<SortStats, anyhow::Error> {
        match &self.diagnostics {
            None => self.sort_with(None),
            Some(path) => {
                let file = File::create(path).map_err(|e| SortError::create(path, e))?;
                let mut writer = BufWriter::new(file);
                let stats = self.sort_with(Some(&mut writer))?;
                writer.flush().with_context(|| format!("path: {}", path.display()))?;
                Ok(stats)
            }
        }
    }

    /// Sort the inputs into the output. Smart dedup runs when `diagnostics` is given.
    pub fn sort_with(&self, diagnostics: Option<&mut dyn Write>) -> Result<SortStats, anyhow::Error> {
        let config = self.create_config();
        Self::internal_sort(&self.input_files, &config, &self.output, diagnostics)
    }

    /// Check that every input is sorted in the configured [Order]
    pub fn check(&self) -> Result<bool, anyhow::Error> {
        let config = self.create_config();

        let mut result = true;
        for path in &self.input_files {
            result = Self::internal_check(path, &config)?;
            if !result {
                break;
            }
        }
        Ok(result)
    }

    fn create_config(&self) -> Config {
        Config::new(
            tmp_dir_for(&self.output, &self.tmp),
            tmp_prefix_for(&self.output, TMP_STAGE),
            self.chunk_size_bytes,
            self.order,
            self.simple_uniq,
            self.smart_dedup,
            self.ignore_empty,
            self.ignore_lines.clone(),
        )
    }

    pub(crate) fn internal_check(path: &Path, config: &Config) -> Result<bool, anyhow::Error> {
        let file = File::open(path).map_err(|e| SortError::open(path, e))?;
        let mut reader = BufReader::new(file);
        let mut buffer = Vec::new();
        let mut previous: Option<String> = None;
        while let Some(line) = read_record(&mut reader, &mut buffer)? {
            if let Some(previous) = &previous {
                if config.order().precedes(&line, previous) {
                    log::info!("{} is not sorted, first line out of order: {}", path.display(), line);
                    return Ok(false);
                }
            }
            previous = Some(line);
        }
        Ok(true)
    }

    pub(crate) fn internal_sort(
        input_files: &[PathBuf],
        config: &Config,
        output: &Path,
        diagnostics: Option<&mut dyn Write>,
    ) -> Result<SortStats, anyhow::Error> {
        log::info!("Start disk sort of {} input file(s) into {}", input_files.len(), output.display());
        let mut chunks = ChunkIterator::new(
            input_files,
            config.chunk_size_bytes(),
            config.ignore_empty(),
            config.ignore_lines().clone(),
        )?;
        let mut streams = MergeStreamPair::create(config.tmp(), config.tmp_prefix(), config.tmp_suffix())?;
        let mut emitter = Emitter::new(config.simple_uniq(), config.smart_dedup(), diagnostics);
        let mut stats = SortStats::default();

        for chunk in &mut chunks {
            let mut chunk = chunk?;
            stats.chunks += 1;
            stats.lines_read += chunk.len();
            log::debug!("Merging chunk {}, lines: {}, bytes: {}", stats.chunks, chunk.len(), chunk.bytes());
            chunk.sort(config.order());
            stats.lines_written = Self::internal_merge(chunk.into_lines(), &streams, config.order(), &mut emitter)?;
            streams.flip();
        }

        streams.finish(output)?;
        stats.duplicates_dropped = emitter.dropped();
        stats.smart_runs = emitter.runs();
        log::info!(
            "Finish disk sort, chunks: {}, lines read: {}, ignored: {}, written: {}, duplicates dropped: {}, smart runs: {}",
            stats.chunks,
            stats.lines_read,
            chunks.ignored(),
            stats.lines_written,
            stats.duplicates_dropped,
            stats.smart_runs,
        );
        Ok(stats)
    }

    /// Merge a sorted chunk with the read side into the write side, returning the lines written.
    fn internal_merge(
        chunk: Vec<String>,
        streams: &MergeStreamPair,
        order: Order,
        emitter: &mut Emitter,
    ) -> Result<usize, anyhow::Error> {
        let mut sorted = SortedStream::open(streams.read_side())?;
        let write_side = streams.write_side();
        let file = File::create(write_side).map_err(|e| SortError::create(write_side, e))?;
        let mut writer = BufWriter::new(file);
        let mut out = LineWriter::new(&mut writer);
        let mut chunk = chunk.into_iter().peekable();

        loop {
            let take_chunk = match (chunk.peek(), sorted.peek()) {
                (Some(chunk_line), Some(sorted_line)) => order.precedes(chunk_line, sorted_line),
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let line = if take_chunk {
                chunk.next()
            } else {
                sorted.next_line()?
            };
            if let Some(line) = line {
                emitter.emit(line, &mut out)?;
            }
        }
        emitter.end_pass(&mut out)?;

        let written = out.lines();
        writer.flush().with_context(|| format!("path: {}", write_side.display()))?;
        Ok(written)
    }
}

/// Sort `input` into `output`.
///
/// With `diagnostics` smart dedup resolves duplicate games and reports them to the sink,
/// `reverse` sorts in descending order, `simple_uniq` drops byte identical neighbours.
pub fn disk_sort(
    input: &Path,
    output: &Path,
    diagnostics: Option<&mut dyn Write>,
    reverse: bool,
    simple_uniq: bool,
) -> Result<SortStats, anyhow::Error> {
    let mut disk_sort = DiskSort::new(vec![input.to_path_buf()], output.to_path_buf());
    disk_sort.with_order(Order::from_reverse(reverse));
    disk_sort.with_simple_uniq(simple_uniq);
    disk_sort.sort_with(diagnostics)
}
