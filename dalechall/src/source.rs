use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use lexflow_collection::collection::memory::MemoryCollection;
use lexflow_collection::utils::{chunk_size_for, read_lines, RawLine};

use crate::error::AnalysisError;
use crate::lexicon::Lexicon;

/// Decodes one corpus line as UTF-8
pub fn decode_record(line: &RawLine) -> Result<String, AnalysisError> {
    String::from_utf8(line.bytes.clone()).map_err(|e| AnalysisError::MalformedRecord {
        offset: line.offset,
        reason: e.utf8_error().to_string()
    })
}

// A record that can't be decoded still counts as a sentence, just one with no words
fn sentence_or_empty(line: &RawLine) -> String {
    decode_record(line).unwrap_or_else(|e| {
        warn!("Dropping the words of a malformed record: {}", e);
        String::new()
    })
}

/// Reads a corpus file, one sentence per line, into roughly `partitions` partitions
pub fn load_corpus(path: &Path, partitions: usize) -> Result<MemoryCollection<String>, AnalysisError> {
    let corpus_err = |source: io::Error| AnalysisError::Corpus {
        path: path.display().to_string(),
        source
    };
    let size = fs::metadata(path).map_err(corpus_err)?.len();
    let chunk_size = chunk_size_for(size, partitions);
    info!("Reading corpus {} ({} bytes) in chunks of {} bytes", path.display(), size, chunk_size);

    let lines = read_lines(path, chunk_size).map_err(corpus_err)?;
    Ok(lines.map(sentence_or_empty))
}

/// Builds a corpus from sentences already in memory
pub fn corpus_from_sentences<S: Into<String>>(sentences: Vec<S>, partitions: usize) -> MemoryCollection<String> {
    let sentences = sentences.into_iter().map(Into::into).collect();
    MemoryCollection::parallelize(sentences, partitions)
}

/// Reads an easy-word list, one entry per line.  Entries are trimmed and blank lines
/// skipped; lines that are not valid UTF-8 are logged and skipped.
pub fn read_lexicon<R: BufRead>(mut reader: R) -> io::Result<Lexicon> {
    let mut entries = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        match std::str::from_utf8(&buf) {
            Ok(line) => {
                let entry = line.trim();
                if !entry.is_empty() {
                    entries.push(entry.to_owned());
                }
            },
            Err(e) => warn!("Skipping lexicon line {}: {}", line_no, e)
        }
    }
    Ok(Lexicon::new(entries))
}

/// Opens and reads an easy-word list
pub fn load_lexicon(path: &Path) -> Result<Lexicon, AnalysisError> {
    let missing = |source: io::Error| AnalysisError::MissingLexiconSource {
        path: path.display().to_string(),
        source
    };
    let file = File::open(path).map_err(missing)?;
    let lexicon = read_lexicon(BufReader::new(file)).map_err(missing)?;
    info!("Loaded {} lexicon entries from {}", lexicon.len(), path.display());
    Ok(lexicon)
}
