//! # Corpus Encoder
//!
//! Converts a plain-text corpus (one sentence per line) into the numeric
//! format the `eflomal` aligner reads:
//!
//! ```text
//! <sentence_count> <vocab_size>
//! <token_count> <idx_1> ... <idx_n>
//! 0
//! ```
//!
//! Blank lines are kept as empty sentences so that line `i` of the source
//! still pairs with line `i` of the target.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use super::vocab::Vocabulary;

/// Split a line into lower-cased, whitespace-separated tokens.
///
/// A blank or whitespace-only line yields no tokens.
///
/// # Examples
/// ```
/// use wordalign_core::corpus::tokenize;
///
/// assert_eq!(tokenize("  Hello   World "), vec!["hello", "world"]);
/// assert!(tokenize(" \t ").is_empty());
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    line.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// A corpus encoded against its own vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCorpus {
    sentences: Vec<Vec<u32>>,
    vocab_size: usize,
}

impl EncodedCorpus {
    /// Read every line of `reader` and encode it.
    ///
    /// Fails if the stream cannot be read or is not valid UTF-8.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
        Ok(Self::encode(lines))
    }

    /// Encode an in-memory sequence of lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::encode(lines)
    }

    fn encode<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Vocabulary::new();
        let sentences: Vec<Vec<u32>> = lines
            .into_iter()
            .map(|line| {
                tokenize(line.as_ref())
                    .iter()
                    .map(|token| vocab.index_of_or_insert(token))
                    .collect()
            })
            .collect();

        Self {
            sentences,
            vocab_size: vocab.len(),
        }
    }

    /// Number of sentences, empty ones included.
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Number of distinct tokens in the corpus.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Vocabulary indices of each sentence, in input order.
    pub fn sentences(&self) -> &[Vec<u32>] {
        &self.sentences
    }

    /// Write the header and one line per sentence.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{} {}", self.sentences.len(), self.vocab_size)?;
        for sentence in &self.sentences {
            write!(out, "{}", sentence.len())?;
            for index in sentence {
                write!(out, " {index}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    /// Render the encoded form as a string.
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Encode `reader` into a new file at `path` and return the sentence count.
///
/// Nothing is cleaned up on failure; the caller owns the directory the file
/// lives in.
pub fn encode_to_file<R: BufRead, P: AsRef<Path>>(reader: R, path: P) -> io::Result<usize> {
    let corpus = EncodedCorpus::from_reader(reader)?;
    let file = File::create(path)?;
    corpus.write_to(BufWriter::new(file))?;
    Ok(corpus.sentence_count())
}
