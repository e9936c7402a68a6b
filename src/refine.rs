//! Second pass over a sorted file replacing each record's provisional tournament date with the
//! tournament's start date.
//!
//! A record enters the pipeline dated with its own game date. Games of one tournament can span a
//! month boundary, so the refinement keeps the tournaments seen in the last months and redates a
//! record whose tournament was already seen to the date recorded for it. Rewriting changes the
//! order, so records are buffered and re-sorted before they are written.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::chunk_iterator::read_record;
use crate::config::{tmp_dir_for, tmp_prefix_for, TMP_SUFFIX};
use crate::dedup::LineWriter;
use crate::error::SortError;
use crate::merge_stream::{create_tmp_file, rename_to_output};
use crate::record::{redate, SortPrefix, DATE_WIDTH};

/// Completed months a tournament is looked up in
const WINDOW_MONTHS: usize = 6;
const TMP_STAGE: &str = "refine";

/// Counters of one [RefineSort] run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefineStats {
    /// Lines read, bad lines included
    pub lines: usize,
    /// Lines without a dated sort prefix, passed through as they are
    pub bad_lines: usize,
    /// Lines whose leading date was changed
    pub redated: usize,
    /// Month jumps that reset the tournament window
    pub discontinuities: usize,
}

#[derive(Debug)]
struct Tournament {
    start_date: String,
    hit: bool,
}

/// Tournaments first seen in one month
#[derive(Debug)]
struct Month {
    year: u32,
    month: u32,
    hit: bool,
    tournaments: HashMap<String, Tournament>,
}

impl Month {
    fn new(year: u32, month: u32) -> Month {
        Month {
            year,
            month,
            hit: false,
            tournaments: HashMap::new(),
        }
    }

    fn is(&self, year: u32, month: u32) -> bool {
        self.year == year && self.month == month
    }

    fn is_followed_by(&self, year: u32, month: u32) -> bool {
        if self.month == 12 {
            year == self.year + 1 && month == 1
        } else {
            year == self.year && month == self.month + 1
        }
    }

    /// `YYYY-MM`
    fn tag(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Forget tournaments that were not seen during the month just completed.
    fn end_round(&mut self) {
        self.tournaments.retain(|_, tournament| tournament.hit);
        for tournament in self.tournaments.values_mut() {
            tournament.hit = false;
        }
        self.hit = false;
    }
}

enum State {
    NewMonth,
    Buffering(Month),
}

/// The refinement state machine, fed one line at a time.
struct Refiner<'w> {
    state: State,
    window: VecDeque<Month>,
    main_buffer: Vec<String>,
    out: LineWriter<'w>,
    stats: RefineStats,
}

impl<'w> Refiner<'w> {
    fn new(out: LineWriter<'w>) -> Refiner<'w> {
        Refiner {
            state: State::NewMonth,
            window: VecDeque::with_capacity(WINDOW_MONTHS),
            main_buffer: Vec::new(),
            out,
            stats: RefineStats::default(),
        }
    }

    fn push(&mut self, line: String) -> Result<(), anyhow::Error> {
        self.stats.lines += 1;
        let (year, month, tournament, game_date) = match SortPrefix::parse(&line) {
            Some(prefix) => (
                prefix.year(),
                prefix.month(),
                prefix.tournament().to_string(),
                prefix.game_date().to_string(),
            ),
            None => return self.pass_bad_line(line),
        };

        let mut current = match std::mem::replace(&mut self.state, State::NewMonth) {
            State::NewMonth => Month::new(year, month),
            State::Buffering(current) if current.is(year, month) => current,
            State::Buffering(current) if current.is_followed_by(year, month) => {
                self.complete_month(current)?;
                Month::new(year, month)
            }
            State::Buffering(current) => {
                log::debug!("Month jump from {} to {:04}-{:02}, resetting tournaments", current.tag(), year, month);
                self.discontinuity()?;
                Month::new(year, month)
            }
        };

        let start_date = Self::resolve_start_date(&mut self.window, &mut current, &tournament, &game_date);
        self.state = State::Buffering(current);

        if line[..DATE_WIDTH] == start_date {
            self.main_buffer.push(line);
        } else {
            self.stats.redated += 1;
            self.main_buffer.push(redate(&line, &start_date));
        }
        Ok(())
    }

    /// The oldest month of the window that knows `tournament` wins, otherwise the current month
    /// records it with `game_date` as its start.
    fn resolve_start_date(window: &mut VecDeque<Month>, current: &mut Month, tournament: &str, game_date: &str) -> String {
        for month in window.iter_mut() {
            if let Some(entry) = month.tournaments.get_mut(tournament) {
                entry.hit = true;
                month.hit = true;
                return entry.start_date.clone();
            }
        }
        current
            .tournaments
            .entry(tournament.to_string())
            .or_insert_with(|| Tournament {
                start_date: game_date.to_string(),
                hit: false,
            })
            .start_date
            .clone()
    }

    fn complete_month(&mut self, completed: Month) -> Result<(), anyhow::Error> {
        self.main_buffer.sort();
        while let Some(front) = self.window.front() {
            if self.window.len() < WINDOW_MONTHS && front.hit {
                break;
            }
            if let Some(evicted) = self.window.pop_front() {
                self.flush_before(&evicted.tag())?;
            }
        }
        for month in self.window.iter_mut() {
            month.end_round();
        }
        self.window.push_back(completed);
        Ok(())
    }

    /// Write the buffered lines that sort strictly before `tag`. The buffer must be sorted.
    fn flush_before(&mut self, tag: &str) -> Result<(), anyhow::Error> {
        let end = self.main_buffer.partition_point(|line| line.as_str() < tag);
        for line in self.main_buffer.drain(..end) {
            self.out.write_line(&line)?;
        }
        Ok(())
    }

    fn flush_all(&mut self) -> Result<(), anyhow::Error> {
        self.main_buffer.sort();
        for line in self.main_buffer.drain(..) {
            self.out.write_line(&line)?;
        }
        Ok(())
    }

    fn discontinuity(&mut self) -> Result<(), anyhow::Error> {
        self.stats.discontinuities += 1;
        self.flush_all()?;
        self.window.clear();
        Ok(())
    }

    fn pass_bad_line(&mut self, line: String) -> Result<(), anyhow::Error> {
        log::warn!("Line {} has no dated sort prefix, passing it through", self.stats.lines);
        self.stats.bad_lines += 1;
        self.flush_all()?;
        self.window.clear();
        self.state = State::NewMonth;
        self.out.write_line(&line)
    }

    fn finish(mut self) -> Result<RefineStats, anyhow::Error> {
        self.flush_all()?;
        Ok(self.stats)
    }
}

/// Refinement of a file sorted by [crate::sort::DiskSort] in ascending order.
///
/// The result is written to a temporary file next to the output and renamed over the output when
/// complete, so `input` and `output` may be the same path.
pub struct RefineSort {
    input: PathBuf,
    output: PathBuf,
    tmp: Option<PathBuf>,
}

impl RefineSort {
    pub fn new(input: PathBuf, output: PathBuf) -> RefineSort {
        RefineSort {
            input,
            output,
            tmp: None,
        }
    }

    /// Set directory for the temporary file. The default is the directory of the output file.
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = Some(tmp);
    }

    pub fn sort(&self) -> Result<RefineStats, anyhow::Error> {
        log::info!("Start refinement of {} into {}", self.input.display(), self.output.display());
        let input = File::open(&self.input).map_err(|e| SortError::open(&self.input, e))?;
        let mut reader = BufReader::new(input);

        let tmp_file = create_tmp_file(
            &tmp_dir_for(&self.output, &self.tmp),
            &tmp_prefix_for(&self.output, TMP_STAGE),
            TMP_SUFFIX,
        )?;
        let file = File::create(&tmp_file).map_err(|e| SortError::create(&tmp_file, e))?;
        let mut writer = BufWriter::new(file);

        let mut refiner = Refiner::new(LineWriter::new(&mut writer));
        let mut buffer = Vec::new();
        while let Some(line) = read_record(&mut reader, &mut buffer)
            .with_context(|| format!("path: {}", self.input.display()))? {
            refiner.push(line)?;
        }
        let stats = refiner.finish()?;
        writer.flush().with_context(|| format!("path: {}", tmp_file.display()))?;

        rename_to_output(&tmp_file, &self.output)?;
        log::info!(
            "Finish refinement, lines: {}, redated: {}, bad lines: {}, discontinuities: {}",
            stats.lines,
            stats.redated,
            stats.bad_lines,
            stats.discontinuities,
        );
        Ok(stats)
    }
}

/// Refine the sorted `input` into `output`
pub fn refine_sort(input: &Path, output: &Path) -> Result<RefineStats, anyhow::Error> {
    RefineSort::new(input.to_path_buf(), output.to_path_buf()).sort()
}
