use std::path::{Path, PathBuf};

use regex::Regex;

use crate::dedup::SmartDedup;
use crate::order::Order;

pub(crate) const TMP_SUFFIX: &str = ".tmp";

#[derive(Clone)]
pub(crate) struct Config {
    tmp: PathBuf,
    tmp_prefix: String,
    tmp_suffix: String,
    chunk_size_bytes: u64,
    order: Order,
    simple_uniq: bool,
    smart_dedup: SmartDedup,
    ignore_empty: bool,
    ignore_lines: Option<Regex>,
}

impl Config {
    pub(crate) fn new(
        tmp: PathBuf,
        tmp_prefix: String,
        chunk_size_bytes: u64,
        order: Order,
        simple_uniq: bool,
        smart_dedup: SmartDedup,
        ignore_empty: bool,
        ignore_lines: Option<Regex>,
    ) -> Config {
        Config {
            tmp,
            tmp_prefix,
            tmp_suffix: TMP_SUFFIX.to_string(),
            // a zero budget would never admit a line
            chunk_size_bytes: chunk_size_bytes.max(1),
            order,
            simple_uniq,
            smart_dedup,
            ignore_empty,
            ignore_lines,
        }
    }

    pub(crate) fn tmp(&self) -> &PathBuf {
        &self.tmp
    }

    pub(crate) fn tmp_prefix(&self) -> &String {
        &self.tmp_prefix
    }

    pub(crate) fn tmp_suffix(&self) -> &String {
        &self.tmp_suffix
    }

    pub(crate) fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_bytes
    }

    pub(crate) fn order(&self) -> Order {
        self.order
    }

    pub(crate) fn simple_uniq(&self) -> bool {
        self.simple_uniq
    }

    pub(crate) fn smart_dedup(&self) -> SmartDedup {
        self.smart_dedup
    }

    pub(crate) fn ignore_empty(&self) -> bool {
        self.ignore_empty
    }

    pub(crate) fn ignore_lines(&self) -> &Option<Regex> {
        &self.ignore_lines
    }
}

/// Temporary files live next to the output unless a directory is given, so the final rename does
/// not cross file systems.
pub(crate) fn tmp_dir_for(output: &Path, tmp: &Option<PathBuf>) -> PathBuf {
    match tmp {
        Some(tmp) => tmp.clone(),
        None => match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// `<output-file-name>-<stage>-tempfile-`
pub(crate) fn tmp_prefix_for(output: &Path, stage: &str) -> String {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    format!("{name}-{stage}-tempfile-")
}
