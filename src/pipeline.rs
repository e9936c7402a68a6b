use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{tmp_dir_for, tmp_prefix_for, TMP_SUFFIX};
use crate::dedup::SmartDedup;
use crate::merge_stream::create_tmp_file;
use crate::order::Order;
use crate::refine::{RefineSort, RefineStats};
use crate::sort::{DiskSort, SortStats};

/// Counters of one [Pipeline] run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub sort: SortStats,
    pub refine: RefineStats,
    /// Present when the output was reversed to most recent first
    pub reverse: Option<SortStats>,
}

/// Disk sort with dedup, then refinement of tournament dates, then optionally a descending sort
/// so the most recent tournaments come first.
///
/// Intermediate files are created in the temporary directory and removed once the next stage has
/// consumed them. A failed run leaves them in place.
///
/// # Examples
/// ```no_run
/// use std::path::PathBuf;
/// use lpgn_sort::pipeline::Pipeline;
///
/// fn build_database(input: PathBuf, output: PathBuf) -> Result<(), anyhow::Error> {
///     let mut pipeline = Pipeline::new(input, output);
///     pipeline.with_diagnostics(PathBuf::from("duplicates.lpgn"));
///     pipeline.with_most_recent_first(true);
///     pipeline.run()?;
///     Ok(())
/// }
/// ```
pub struct Pipeline {
    input: PathBuf,
    output: PathBuf,
    tmp: Option<PathBuf>,
    chunk_size_bytes: u64,
    diagnostics: Option<PathBuf>,
    simple_uniq: bool,
    smart_dedup: SmartDedup,
    most_recent_first: bool,
}

impl Pipeline {
    pub fn new(input: PathBuf, output: PathBuf) -> Pipeline {
        Pipeline {
            input,
            output,
            tmp: None,
            chunk_size_bytes: 10_000_000,
            diagnostics: None,
            simple_uniq: true,
            smart_dedup: SmartDedup::Lookback,
            most_recent_first: false,
        }
    }

    /// Set directory for intermediate and temporary files, the default is the output directory
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = Some(tmp);
    }

    pub fn with_chunk_size_bytes(&mut self, chunk_size_bytes: u64) {
        self.chunk_size_bytes = chunk_size_bytes;
    }

    /// Enable smart dedup in the first sort, reporting to `diagnostics`
    pub fn with_diagnostics(&mut self, diagnostics: PathBuf) {
        self.diagnostics = Some(diagnostics);
    }

    pub fn with_simple_uniq(&mut self, simple_uniq: bool) {
        self.simple_uniq = simple_uniq;
    }

    pub fn with_smart_dedup(&mut self, smart_dedup: SmartDedup) {
        self.smart_dedup = smart_dedup;
    }

    /// Write the result in descending order
    pub fn with_most_recent_first(&mut self, most_recent_first: bool) {
        self.most_recent_first = most_recent_first;
    }

    pub fn run(&self) -> Result<PipelineStats, anyhow::Error> {
        log::info!("Start pipeline {} -> {}", self.input.display(), self.output.display());
        let tmp = tmp_dir_for(&self.output, &self.tmp);

        let sorted = create_tmp_file(&tmp, &tmp_prefix_for(&self.output, "sorted"), TMP_SUFFIX)?;
        let mut disk_sort = DiskSort::new(vec![self.input.clone()], sorted.clone());
        disk_sort.with_tmp_dir(tmp.clone());
        disk_sort.with_chunk_size_bytes(self.chunk_size_bytes);
        disk_sort.with_simple_uniq(self.simple_uniq);
        disk_sort.with_smart_dedup(self.smart_dedup);
        if let Some(diagnostics) = &self.diagnostics {
            disk_sort.with_diagnostics(diagnostics.clone());
        }
        let sort = disk_sort.sort()?;

        let stats = if self.most_recent_first {
            let refined = create_tmp_file(&tmp, &tmp_prefix_for(&self.output, "refined"), TMP_SUFFIX)?;
            let refine = self.refine(&sorted, &refined, &tmp)?;

            let mut reverse_sort = DiskSort::new(vec![refined.clone()], self.output.clone());
            reverse_sort.with_tmp_dir(tmp);
            reverse_sort.with_chunk_size_bytes(self.chunk_size_bytes);
            reverse_sort.with_order(Order::Desc);
            reverse_sort.with_simple_uniq(false);
            let reverse = reverse_sort.sort()?;
            remove_intermediate(&refined)?;

            PipelineStats {
                sort,
                refine,
                reverse: Some(reverse),
            }
        } else {
            let refine = self.refine(&sorted, &self.output, &tmp)?;
            PipelineStats {
                sort,
                refine,
                reverse: None,
            }
        };

        log::info!(
            "Finish pipeline, games read: {}, duplicates dropped: {}, redated: {}",
            stats.sort.lines_read,
            stats.sort.duplicates_dropped,
            stats.refine.redated,
        );
        Ok(stats)
    }

    /// Refine `sorted` into `output` and remove `sorted`
    fn refine(&self, sorted: &Path, output: &Path, tmp: &Path) -> Result<RefineStats, anyhow::Error> {
        let mut refine_sort = RefineSort::new(sorted.to_path_buf(), output.to_path_buf());
        refine_sort.with_tmp_dir(tmp.to_path_buf());
        let stats = refine_sort.sort()?;
        remove_intermediate(sorted)?;
        Ok(stats)
    }
}

fn remove_intermediate(path: &Path) -> Result<(), anyhow::Error> {
    fs::remove_file(path).with_context(|| format!("Remove {}", path.display()))
}
