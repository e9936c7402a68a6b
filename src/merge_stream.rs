use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::Builder;

use crate::chunk_iterator::read_record;
use crate::error::SortError;

const TMP_RANDOM_LEN: usize = 5;

/// Create and persist an empty temporary file. Persisted files survive a failed run so they can
/// be inspected, a successful run removes or renames them.
pub(crate) fn create_tmp_file(tmp: &Path, prefix: &str, suffix: &str) -> Result<PathBuf, anyhow::Error> {
    let tmp_file = Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .rand_bytes(TMP_RANDOM_LEN)
        .tempfile_in(tmp)
        .map_err(|e| SortError::create(&tmp.join(format!("{prefix}*{suffix}")), e))?;
    let (_file, path) = tmp_file
        .keep()
        .map_err(|e| SortError::create(&tmp.join(format!("{prefix}*{suffix}")), e.error))?;
    Ok(path)
}

/// Move a finished temporary file over `output`.
pub(crate) fn rename_to_output(path: &Path, output: &Path) -> Result<(), anyhow::Error> {
    std::fs::rename(path, output).map_err(|e| SortError::rename(path, output, e))?;
    Ok(())
}

/// A sorted file read line by line with one line of look ahead.
#[derive(Debug)]
pub(crate) struct SortedStream {
    path: PathBuf,
    reader: BufReader<File>,
    head: Option<String>,
    buffer: Vec<u8>,
}

impl SortedStream {
    pub(crate) fn open(path: &Path) -> Result<SortedStream, anyhow::Error> {
        let file = File::open(path).map_err(|e| SortError::open(path, e))?;
        let mut stream = SortedStream {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            head: None,
            buffer: Vec::new(),
        };
        stream.head = read_record(&mut stream.reader, &mut stream.buffer)
            .with_context(|| format!("path: {}", path.display()))?;
        Ok(stream)
    }

    pub(crate) fn peek(&self) -> Option<&str> {
        self.head.as_deref()
    }

    /// Take the head line and read the next one
    pub(crate) fn next_line(&mut self) -> Result<Option<String>, anyhow::Error> {
        if self.head.is_none() {
            return Ok(None);
        }
        let next = read_record(&mut self.reader, &mut self.buffer)
            .with_context(|| format!("path: {}", self.path.display()))?;
        Ok(std::mem::replace(&mut self.head, next))
    }
}

/// The two temporary files of the merge. The read side holds everything sorted so far, the write
/// side receives the next merge result. [MergeStreamPair::flip] swaps the roles.
#[derive(Debug)]
pub(crate) struct MergeStreamPair {
    read_side: PathBuf,
    write_side: PathBuf,
}

impl MergeStreamPair {
    pub(crate) fn create(tmp: &Path, prefix: &str, suffix: &str) -> Result<MergeStreamPair, anyhow::Error> {
        let read_side = create_tmp_file(tmp, prefix, suffix)?;
        let write_side = create_tmp_file(tmp, prefix, suffix)?;
        Ok(
            MergeStreamPair {
                read_side,
                write_side,
            }
        )
    }

    pub(crate) fn read_side(&self) -> &Path {
        &self.read_side
    }

    pub(crate) fn write_side(&self) -> &Path {
        &self.write_side
    }

    pub(crate) fn flip(&mut self) {
        std::mem::swap(&mut self.read_side, &mut self.write_side);
    }

    /// Remove the stale write side and move the read side, the complete result, to `output`.
    pub(crate) fn finish(self, output: &Path) -> Result<(), anyhow::Error> {
        std::fs::remove_file(&self.write_side)
            .with_context(|| format!("Remove {}", self.write_side.display()))?;
        rename_to_output(&self.read_side, output)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::error::SortError;
    use crate::merge_stream::{MergeStreamPair, SortedStream};

    fn tmp_dir() -> Result<PathBuf, anyhow::Error> {
        let dir = PathBuf::from("./target/unit-results/");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn test_sorted_stream() -> Result<(), anyhow::Error> {
        let path = tmp_dir()?.join("stream.lpgn");
        fs::write(&path, "a\nb\n")?;
        let mut stream = SortedStream::open(&path)?;
        assert_eq!(stream.peek(), Some("a"));
        assert_eq!(stream.next_line()?, Some("a".to_string()));
        assert_eq!(stream.peek(), Some("b"));
        assert_eq!(stream.next_line()?, Some("b".to_string()));
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.next_line()?, None);
        Ok(())
    }

    #[test]
    fn test_pair_flip_and_finish() -> Result<(), anyhow::Error> {
        let dir = tmp_dir()?;
        let output = dir.join("pair-output.lpgn");
        let mut pair = MergeStreamPair::create(&dir, "pair-output.lpgn-disksort-tempfile-", ".tmp")?;
        let read_side = pair.read_side().to_path_buf();
        let write_side = pair.write_side().to_path_buf();
        assert_ne!(read_side, write_side);
        let name = read_side.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("pair-output.lpgn-disksort-tempfile-"));
        assert!(name.ends_with(".tmp"));
        assert_eq!(name.len(), "pair-output.lpgn-disksort-tempfile-".len() + 5 + 4);

        fs::write(&write_side, "merged\n")?;
        pair.flip();
        assert_eq!(pair.read_side(), write_side.as_path());
        assert_eq!(pair.write_side(), read_side.as_path());
        pair.finish(&output)?;

        assert!(!read_side.exists());
        assert!(!write_side.exists());
        assert_eq!(fs::read_to_string(&output)?, "merged\n");
        fs::remove_file(output)?;
        Ok(())
    }

    #[test]
    fn test_rename_failure() -> Result<(), anyhow::Error> {
        let dir = tmp_dir()?;
        let pair = MergeStreamPair::create(&dir, "rename-failure-", ".tmp")?;
        let read_side = pair.read_side().to_path_buf();
        let error = pair.finish(&dir.join("no-such-dir").join("out.lpgn")).err().unwrap();
        assert!(matches!(error.downcast_ref::<SortError>(), Some(SortError::Rename { .. })));
        fs::remove_file(read_side)?;
        Ok(())
    }
}
