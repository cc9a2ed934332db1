//! Flat-file snapshot: streaming record codec and the table walk.
//!
//! The format is a bare sequence of records, little-endian, with no header,
//! record count, or checksum:
//!
//! ```text
//! [key_len: u64 LE][key bytes][value_len: u64 LE][value bytes] ...
//! ```
//!
//! End of data is end of file. A file that ends exactly on a record boundary
//! is complete; one that ends anywhere else is reported as truncated.
//!
//! Snapshots are best-effort with respect to concurrent writers: the walk
//! holds the table's shared lock (so no resize can swap the bucket array
//! mid-walk) and visits one bucket lock at a time, so entries inserted into
//! an already-visited bucket during the walk are not captured. Callers that
//! need a frozen image must quiesce writers themselves.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::table::StripedTable;

const LEN_BYTES: usize = 8;

/// Append one record to `out`.
fn write_record<W: Write>(out: &mut W, key: &[u8], value: &[u8]) -> Result<()> {
    out.write_all(&(key.len() as u64).to_le_bytes())?;
    out.write_all(key)?;
    out.write_all(&(value.len() as u64).to_le_bytes())?;
    out.write_all(value)?;
    Ok(())
}

/// Sequential record reader that tracks its byte offset so a truncated file
/// can be reported precisely.
struct RecordReader<R> {
    input: R,
    offset: u64,
}

impl<R: Read> RecordReader<R> {
    fn new(input: R) -> Self {
        Self { input, offset: 0 }
    }

    /// Decode the next record, `Ok(None)` on a clean end of file.
    fn next_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let key_len = match self.read_len()? {
            Some(len) => len,
            // EOF landing exactly before a key length is the normal end.
            None => return Ok(None),
        };
        let key = self.read_bytes(key_len)?;
        let value_len = self
            .read_len()?
            .ok_or(Error::TruncatedRecord { offset: self.offset })?;
        let value = self.read_bytes(value_len)?;
        Ok(Some((key, value)))
    }

    /// Read one u64 length field. `Ok(None)` when the file ends before the
    /// first byte; an error when it ends partway through the field.
    fn read_len(&mut self) -> Result<Option<u64>> {
        let mut buf = [0u8; LEN_BYTES];
        let mut filled = 0;
        while filled < LEN_BYTES {
            let n = self.input.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.offset += filled as u64;
        match filled {
            0 => Ok(None),
            LEN_BYTES => Ok(Some(u64::from_le_bytes(buf))),
            _ => Err(Error::TruncatedRecord { offset: self.offset }),
        }
    }

    /// Read exactly `len` payload bytes. Growing through `take` bounds the
    /// allocation by what the file actually holds, so a corrupt length field
    /// cannot demand an absurd up-front buffer.
    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = (&mut self.input).take(len).read_to_end(&mut buf)? as u64;
        self.offset += read;
        if read < len {
            return Err(Error::TruncatedRecord { offset: self.offset });
        }
        Ok(buf)
    }
}

impl StripedTable {
    /// Serialize every live entry to a flat file at `path`, creating or
    /// overwriting it.
    ///
    /// Buckets are walked in index order under their own locks; see the
    /// module docs for the best-effort semantics under concurrent writers.
    pub fn write_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        let inner = self.read_buckets();
        for bucket in inner.buckets.iter() {
            let chain = bucket.lock();
            for (key, value) in chain.iter() {
                write_record(&mut out, key, value)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Re-insert every record from the snapshot at `path` through the normal
    /// insert path, returning how many records were applied.
    ///
    /// The target table is *not* cleared first: loading into a non-empty
    /// table merges, with records from the file overwriting entries that
    /// share a key. Resizes fire as usual while loading. On
    /// [`Error::TruncatedRecord`] the records decoded before the truncation
    /// point remain applied.
    pub fn load_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let mut reader = RecordReader::new(BufReader::new(File::open(path)?));
        let mut applied = 0;
        while let Some((key, value)) = reader.next_record()? {
            self.insert(&key, &value)?;
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the record encoding is exactly the documented byte layout.
    #[test]
    fn record_layout_is_length_prefixed_le() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"key1", b"value1").unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&4u64.to_le_bytes());
        expected.extend_from_slice(b"key1");
        expected.extend_from_slice(&6u64.to_le_bytes());
        expected.extend_from_slice(b"value1");
        assert_eq!(buf, expected);
    }

    /// Invariant: a writer/reader pair round-trips records, including empty
    /// keys-adjacent cases (empty value, binary bytes).
    #[test]
    fn reader_decodes_writer_output() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"a", b"").unwrap();
        write_record(&mut buf, b"\x00\xff", b"\xde\xad\xbe\xef").unwrap();

        let mut reader = RecordReader::new(&buf[..]);
        assert_eq!(
            reader.next_record().unwrap(),
            Some((b"a".to_vec(), Vec::new()))
        );
        assert_eq!(
            reader.next_record().unwrap(),
            Some((b"\x00\xff".to_vec(), b"\xde\xad\xbe\xef".to_vec()))
        );
        assert_eq!(reader.next_record().unwrap(), None);
    }

    /// Invariant: an empty stream is a clean end, not an error.
    #[test]
    fn empty_stream_is_clean_eof() {
        let mut reader = RecordReader::new(&[][..]);
        assert_eq!(reader.next_record().unwrap(), None);
    }

    /// Invariant: a stream ending inside a length field, inside key bytes,
    /// before the value length, or inside value bytes reports truncation with
    /// the offset where decoding stopped.
    #[test]
    fn truncation_reported_at_every_cut() {
        let mut full = Vec::new();
        write_record(&mut full, b"key1", b"value1").unwrap();
        for cut in 1..full.len() {
            let mut reader = RecordReader::new(&full[..cut]);
            match reader.next_record() {
                Err(Error::TruncatedRecord { offset }) => {
                    assert!(offset as usize <= cut);
                }
                other => panic!("cut at {cut}: unexpected result {other:?}"),
            }
        }
    }

    /// Invariant: a declared length far beyond the file's actual size fails
    /// as truncation after consuming what exists, without a matching
    /// up-front allocation.
    #[test]
    fn absurd_length_is_truncation_not_allocation() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        buf.extend_from_slice(b"tiny");
        let mut reader = RecordReader::new(&buf[..]);
        match reader.next_record() {
            Err(Error::TruncatedRecord { offset }) => assert_eq!(offset, 12),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
