// ============================================================
// Layer 6 — Embedding Sink (.npz output store)
// ============================================================
// Writes one float32 array per sentence into a NumPy .npz
// archive. The entry name is the sentence id, so
//
//   np.load("out.npz")["17"]   →  array of shape (L, T, D)
//
// Writes are append-only and must arrive with ids 0, 1, 2, ...
// An out-of-order or repeated id is refused. A run that aborts
// leaves every array written so far in place once the archive
// is finished.

use anyhow::{Context, Result};
use ndarray::{Array3, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::{
    fs::File,
    io::{BufWriter, Read, Seek, Write},
    path::Path,
};

use crate::domain::{error::EncodeError, traits::EmbeddingSink};

pub struct NpzSink<W: Write + Seek> {
    writer:  Option<NpzWriter<W>>,
    next_id: usize,
}

impl NpzSink<BufWriter<File>> {
    /// Create (or truncate) an archive on disk.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create output '{}'", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> NpzSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Some(NpzWriter::new(writer)), next_id: 0 }
    }

    /// Number of arrays written so far
    pub fn written(&self) -> usize {
        self.next_id
    }

    /// Finish the archive and hand back the underlying writer.
    #[cfg(test)]
    pub fn into_inner(mut self) -> Result<W> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| EncodeError::Sink("archive already finished".into()))?;
        Ok(writer.finish().context("Cannot finish output archive")?)
    }
}

impl<W: Write + Seek> EmbeddingSink for NpzSink<W> {
    fn write(&mut self, sentence_id: usize, embeddings: &Array3<f32>) -> Result<()> {
        if sentence_id != self.next_id {
            return Err(EncodeError::Sink(format!(
                "sentence id {sentence_id} written out of order (expected {})",
                self.next_id
            ))
            .into());
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| EncodeError::Sink("archive already finished".into()))?;
        writer
            .add_array(sentence_id.to_string(), embeddings)
            .with_context(|| format!("Cannot write sentence {sentence_id}"))?;
        self.next_id += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finish().context("Cannot finish output archive")?;
            tracing::debug!("Output archive closed after {} sentences", self.next_id);
        }
        Ok(())
    }
}

/// Random-access reader over an archive written by NpzSink.
pub struct NpzStore<R: Read + Seek> {
    reader: NpzReader<R>,
}

impl NpzStore<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open output '{}'", path.display()))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> NpzStore<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self { reader: NpzReader::new(reader).context("Not a valid .npz archive")? })
    }

    pub fn len(&mut self) -> Result<usize> {
        Ok(self.reader.len())
    }

    /// Array stored for `sentence_id`, shape (L, T, D).
    pub fn get(&mut self, sentence_id: usize) -> Result<Array3<f32>> {
        let key = sentence_id.to_string();
        let names = self.reader.names().context("Cannot list archive entries")?;
        let name = names
            .into_iter()
            .find(|n| n.strip_suffix(".npy").unwrap_or(n) == key)
            .with_context(|| format!("Sentence {sentence_id} is not in the archive"))?;
        self.reader
            .by_name::<OwnedRepr<f32>, Ix3>(&name)
            .with_context(|| format!("Cannot read sentence {sentence_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn array(seed: f32, units: usize) -> Array3<f32> {
        Array3::from_shape_fn((2, units, 3), |(l, t, d)| seed + (l * 100 + t * 10 + d) as f32)
    }

    #[test]
    fn test_written_arrays_read_back_by_id() {
        let mut sink = NpzSink::new(Cursor::new(Vec::new()));
        sink.write(0, &array(0.5, 4)).unwrap();
        sink.write(1, &array(1.5, 0)).unwrap();
        sink.write(2, &array(2.5, 1)).unwrap();
        assert_eq!(sink.written(), 3);

        let bytes = sink.into_inner().unwrap().into_inner();
        let mut store = NpzStore::new(Cursor::new(bytes)).unwrap();
        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.get(2).unwrap(), array(2.5, 1));
        assert_eq!(store.get(0).unwrap(), array(0.5, 4));
        assert_eq!(store.get(1).unwrap().dim(), (2, 0, 3));
        assert!(store.get(3).is_err());
    }

    #[test]
    fn test_ids_must_be_sequential() {
        let mut sink = NpzSink::new(Cursor::new(Vec::new()));
        sink.write(0, &array(0.0, 1)).unwrap();
        let err = sink.write(2, &array(0.0, 1)).unwrap_err();
        assert!(matches!(err.downcast_ref::<EncodeError>(), Some(EncodeError::Sink(_))));
        assert!(sink.write(0, &array(0.0, 1)).is_err());
        assert!(sink.write(1, &array(0.0, 1)).is_ok());
    }

    #[test]
    fn test_no_writes_after_finish() {
        let mut sink = NpzSink::new(Cursor::new(Vec::new()));
        sink.finish().unwrap();
        assert!(sink.write(0, &array(0.0, 1)).is_err());
        // finishing twice is harmless
        assert!(sink.finish().is_ok());
    }

    #[test]
    fn test_on_disk_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.npz");
        let mut sink = NpzSink::create(&path).unwrap();
        sink.write(0, &array(0.0, 2)).unwrap();
        sink.finish().unwrap();
        let mut store = NpzStore::open(&path).unwrap();
        assert_eq!(store.get(0).unwrap(), array(0.0, 2));
    }
}
