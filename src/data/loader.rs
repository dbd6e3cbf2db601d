// ============================================================
// Layer 4 — Line Loader
// ============================================================
// Reads the input text stream, one example per line.
//
//   - every line is stripped
//   - blank lines are skipped (they never get a sentence id)
//   - each surviving line becomes an Example
//
// Batches are cut from this stream in input order. The last
// batch may be short; no batch is ever empty.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::domain::example::Example;

/// Iterator over the Examples of a line-oriented reader.
pub struct LineReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_no: 0 }
    }
}

impl LineReader<BufReader<File>> {
    /// Open a UTF-8 text file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open input '{}'", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some(Ok(Example::parse(&line))),
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e)
                        .context(format!("Cannot read input line {}", self.line_no))));
                }
            }
        }
    }
}

/// Number of non-blank lines in a file. Used to size the progress bar.
pub fn count_examples(path: &Path) -> Result<usize> {
    let mut n = 0usize;
    for example in LineReader::open(path)? {
        example?;
        n += 1;
    }
    Ok(n)
}

// ─── Batching ─────────────────────────────────────────────────────────────────
/// Groups an example stream into batches of at most `batch_size`.
pub struct Batches<I> {
    inner: I,
    batch_size: usize,
}

impl<I> Batches<I> {
    pub fn new(inner: I, batch_size: usize) -> Self {
        Self { inner, batch_size: batch_size.max(1) }
    }
}

impl<I: Iterator<Item = Result<Example>>> Iterator for Batches<I> {
    type Item = Result<Vec<Example>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.inner.next() {
                Some(Ok(example)) => batch.push(example),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        if batch.is_empty() { None } else { Some(Ok(batch)) }
    }
}
