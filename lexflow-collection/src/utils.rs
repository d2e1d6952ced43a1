use std::io::prelude::*;
use std::io::{self, SeekFrom, BufReader};
use std::fs::{File, metadata};
use std::path::{Path, PathBuf};

use lexflow::deferred::{Deferred, batch_try_apply};

use crate::collection::memory::MemoryCollection;

#[derive(Clone)]
struct Chunk { path: PathBuf, start: u64, end: u64 }

/// A line read from a file, terminator removed.  Bytes are left undecoded so callers
/// decide what an invalid line means to them.
#[derive(Debug,Clone,PartialEq)]
pub struct RawLine {
    /// Byte offset of the first byte of the line
    pub offset: u64,

    /// Line contents without the trailing `\n` or `\r\n`
    pub bytes: Vec<u8>
}

/// Chunk size that splits a file of `file_size` bytes into about `partitions` chunks
pub fn chunk_size_for(file_size: u64, partitions: usize) -> u64 {
    let parts = partitions.max(1) as u64;
    ((file_size + parts - 1) / parts).max(1)
}

/// Reads a file as a collection of lines, one partition per `chunk_size` byte range.
/// A chunk owns every line that starts inside it, so every line is read exactly once no
/// matter where the chunk boundaries fall.  Reading happens inside the tasks; a chunk that
/// fails to read is retried and then reported as a failure of the `ReadLines` stage.
pub fn read_lines<P: AsRef<Path>>(path: P, chunk_size: u64) -> io::Result<MemoryCollection<RawLine>> {
    let path = path.as_ref();
    let file_size = metadata(path)?.len();
    let chunk_size = chunk_size.max(1);
    let mut dfs = Vec::new();
    let mut cur_offset = 0u64;
    while cur_offset < file_size {
        let chunk = Chunk {
            path: path.to_path_buf(),
            start: cur_offset,
            end: cur_offset + chunk_size
        };
        dfs.push(Deferred::lift(chunk,
                                Some(&format!("File: {}, start: {}", path.display(), cur_offset))));
        cur_offset += chunk_size;
    }
    debug!("Reading {} in {} chunk(s) of {} bytes", path.display(), dfs.len(), chunk_size);

    Ok(MemoryCollection::from_defs(batch_try_apply(&dfs, "ReadLines", read)))
}

fn read(_idx: usize, chunk: &Chunk) -> Result<Vec<RawLine>, String> {
    read_chunk(chunk).map_err(|e| {
        format!("reading {} at byte {}: {}", chunk.path.display(), chunk.start, e)
    })
}

fn read_chunk(chunk: &Chunk) -> io::Result<Vec<RawLine>> {
    let mut reader = BufReader::new(File::open(&chunk.path)?);
    reader.seek(SeekFrom::Start(chunk.start))?;

    let mut pos = chunk.start;
    let mut buf = Vec::new();
    if chunk.start > 0 {
        // The line running through our start belongs to the previous chunk
        pos += reader.read_until(b'\n', &mut buf)? as u64;
    }

    let mut lines = Vec::new();
    while pos <= chunk.end {
        buf.clear();
        let size = reader.read_until(b'\n', &mut buf)?;
        if size == 0 {
            break;
        }
        let mut bytes = std::mem::take(&mut buf);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        lines.push(RawLine { offset: pos, bytes });
        pos += size as u64;
    }
    Ok(lines)
}

#[cfg(test)]
mod utils_test {
    use super::*;
    use std::io::Write;
    use lexflow::ExecutionContext;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f.flush().unwrap();
        f
    }

    fn lines_of(path: &str, chunk_size: u64) -> Vec<String> {
        read_lines(path, chunk_size).unwrap()
            .run(&ExecutionContext::leveled()).unwrap()
            .into_iter()
            .map(|l| String::from_utf8(l.bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_every_line_read_once_for_any_chunk_size() {
        let text = b"The cat sat on the mat.\nIt was happy.\n\nA much longer line than the chunk size used here\r\nlast";
        let f = write_temp(text);
        let path = f.path().to_str().unwrap();
        let expected = vec![
            "The cat sat on the mat.",
            "It was happy.",
            "",
            "A much longer line than the chunk size used here",
            "last"
        ];
        for chunk_size in 1..(text.len() as u64 + 2) {
            assert_eq!(lines_of(path, chunk_size), expected, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_offsets_point_at_line_starts() {
        let f = write_temp(b"ab\ncd\n");
        let lines = read_lines(f.path().to_str().unwrap(), 2).unwrap()
            .run(&ExecutionContext::leveled()).unwrap();
        let offsets: Vec<u64> = lines.iter().map(|l| l.offset).collect();
        assert_eq!(offsets, vec![0, 3]);
    }

    #[test]
    fn test_empty_file_has_no_partitions() {
        let f = write_temp(b"");
        let col = read_lines(f.path().to_str().unwrap(), 16).unwrap();
        assert_eq!(col.n_partitions(), 0);
    }

    #[test]
    fn test_missing_file() {
        assert!(read_lines("/definitely/not/here.txt", 16).is_err());
    }

    #[test]
    fn test_chunk_size_for() {
        assert_eq!(chunk_size_for(100, 20), 5);
        assert_eq!(chunk_size_for(101, 20), 6);
        assert_eq!(chunk_size_for(3, 20), 1);
        assert_eq!(chunk_size_for(0, 0), 1);
    }
}
