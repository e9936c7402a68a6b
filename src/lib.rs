//! This crate sorts, deduplicates and refines very large collections of chess games stored one
//! game per line.
//!
//! Each line is a game record of the form `SortPrefix@H[Tag "value"]...@M<moves>`, where the sort
//! prefix `YYYY-MM-DD <event>, <site> # YYYY-MM-DD <round> <tie-breaker> <White>-<Black>` makes
//! plain byte order the order of tournaments, games and rounds. Game databases assembled from many
//! sources hold millions of such lines, often longer than the line limit of platform sort
//! utilities, and the same game appears several times with different annotations.
//!
//! The processing has two passes over the data:
//! * [sort::DiskSort] sorts in bounded chunks merged through two temporary files and drops
//!   duplicate games on the merged stream. Games are recognised as duplicates by the predicates
//!   of [matching], which compare sort prefixes without their tie-breaker and the main line moves
//!   extracted by [moves::main_line].
//! * [refine::RefineSort] replaces the provisional tournament date of each game with the start date
//!   of its tournament and restores the order.
//!
//! [pipeline::Pipeline] runs both, optionally writing the result most recent first.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use lpgn_sort::dedup::SmartDedup;
//! use lpgn_sort::sort::DiskSort;
//!
//! // optimized for use with Jemalloc
//! use tikv_jemallocator::Jemalloc;
//! #[global_allocator]
//! static GLOBAL: Jemalloc = Jemalloc;
//!
//! // sort and resolve duplicate games
//! fn sort_games(input: PathBuf, output: PathBuf, tmp: PathBuf, report: PathBuf) -> Result<(), anyhow::Error> {
//!     let mut disk_sort = DiskSort::new(vec![input], output);
//!
//!     // set the directory for the two merge files. The default is the directory of the output,
//!     // keep it on the same file system as the output so the final rename is cheap.
//!     disk_sort.with_tmp_dir(tmp);
//!
//!     // memory use is bounded by the chunk size, lines are never split
//!     disk_sort.with_chunk_size_mb(100);
//!
//!     // smart dedup runs when a report file is given
//!     disk_sort.with_diagnostics(report);
//!     disk_sort.with_smart_dedup(SmartDedup::DayBucket);
//!
//!     let stats = disk_sort.sort()?;
//!     log::info!("{} duplicates dropped", stats.duplicates_dropped);
//!     Ok(())
//! }
//! ```
//!

pub(crate) mod config;
pub(crate) mod chunk_iterator;
pub(crate) mod merge_stream;
pub(crate) mod record;
pub(crate) mod day_bucket;

pub mod order;
pub mod error;
pub mod moves;
pub mod matching;
pub mod dedup;
pub mod sort;
pub mod refine;
pub mod pipeline;
