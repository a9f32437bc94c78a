use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::header::{Header, HEADER_SIZE};
use crate::error::StoreError;
use crate::hasher::Hasher;
use crate::store::Result;

pub const OP_PUT: u8 = 1;
pub const OP_DELETE: u8 = 2;

/// op + key_len + value_len + frame checksum
const FRAME_SIZE: u64 = 1 + 4 + 4 + 8;

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Append-only record log.
///
/// ```text
/// [op: u8][key_len: u32][value_len: u32][frame_crc: u64][key][value][crc64: u64]
/// ```
///
/// All integers are big-endian. `frame_crc` covers op and both lengths and is checked
/// before any length is trusted; `crc64` covers op, key and value. Deletes carry a zero
/// `value_len`.
#[derive(Debug)]
pub struct Wal {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Wal {
    /// Opens the log at `path`, creating it with a fresh header if it is empty.
    pub fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();

        let file = File::options()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file.try_clone()?);

        if file.metadata()?.len() == 0 {
            Header::new().encode(&mut writer)?;
            writer.flush()?;
        } else {
            let mut reader = BufReader::new(file);
            reader.seek(SeekFrom::Start(0))?;
            let mut buf = [0u8; HEADER_SIZE];
            match reader.read_exact(&mut buf) {
                Ok(()) => {
                    Header::try_from(&buf[..])?;
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(StoreError::InvalidHeader);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a put record.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.append(OP_PUT, key, value)
    }

    /// Appends a delete record.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.append(OP_DELETE, key, &[])
    }

    fn append(&mut self, op: u8, key: &[u8], value: &[u8]) -> Result<()> {
        let key_len = encode_len(key)?;
        let value_len = encode_len(value)?;

        self.writer.write_u8(op)?;
        self.writer.write_u32::<BigEndian>(key_len)?;
        self.writer.write_u32::<BigEndian>(value_len)?;
        self.writer
            .write_u64::<BigEndian>(Hasher::frame(op, key_len, value_len))?;
        self.writer.write_all(key)?;
        self.writer.write_all(value)?;
        self.writer
            .write_u64::<BigEndian>(Hasher::record(op, key, value))?;
        Ok(())
    }

    /// Pushes buffered records to the OS.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and fsyncs the log file.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Size of the log file in bytes, including buffered records.
    pub fn len(&mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.writer.get_ref().metadata()?.len())
    }

    /// Cuts the log back to `len` bytes. Later appends continue from there.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(len.max(HEADER_SIZE as u64))?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Replays every record from the start of the log. Buffered records are flushed
    /// first so they are included.
    pub fn replay(&mut self) -> Result<ReplayIterator> {
        self.writer.flush()?;
        ReplayIterator::new(BufReader::new(File::open(&self.path)?))
    }
}

fn encode_len(bytes: &[u8]) -> Result<u32> {
    u32::try_from(bytes.len()).map_err(|_| {
        StoreError::Encode(
            "length",
            io::Error::new(io::ErrorKind::InvalidInput, "entry exceeds 4 GiB"),
        )
    })
}

pub struct ReplayIterator {
    reader: BufReader<File>,
    offset: u64,
    done: bool,
}

impl ReplayIterator {
    fn new(mut reader: BufReader<File>) -> Result<Self> {
        reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        Ok(Self {
            reader,
            offset: HEADER_SIZE as u64,
            done: false,
        })
    }

    /// Byte offset just past the last complete record read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads one record. A clean end of file at a record boundary yields `None`. An end
    /// of file inside the frame, or inside the body of a verified frame, is a torn write.
    /// Anything that fails a checksum is corruption.
    fn read(&mut self) -> Result<Option<Record>> {
        let start = self.offset;
        let op = match self.reader.read_u8() {
            Ok(op) => op,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let torn = move |e: io::Error| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StoreError::TornRecord { offset: start }
            } else {
                StoreError::Io(e)
            }
        };

        let key_len = self.reader.read_u32::<BigEndian>().map_err(torn)?;
        let value_len = self.reader.read_u32::<BigEndian>().map_err(torn)?;
        let stored = self.reader.read_u64::<BigEndian>().map_err(torn)?;

        let computed = Hasher::frame(op, key_len, value_len);
        if computed != stored {
            return Err(StoreError::CorruptedLog(format!(
                "frame checksum mismatch at offset {}: computed = {:#x}, stored = {:#x}",
                start, computed, stored
            )));
        }
        match op {
            OP_PUT => {}
            OP_DELETE if value_len == 0 => {}
            _ => {
                return Err(StoreError::CorruptedLog(format!(
                    "invalid record op {:#04x} at offset {}",
                    op, start
                )))
            }
        }

        let key = read_exact_len(&mut self.reader, key_len).map_err(torn)?;
        let value = read_exact_len(&mut self.reader, value_len).map_err(torn)?;
        let stored = self.reader.read_u64::<BigEndian>().map_err(torn)?;

        let computed = Hasher::record(op, &key, &value);
        if computed != stored {
            return Err(StoreError::CorruptedLog(format!(
                "checksum mismatch at offset {}: computed = {:#x}, stored = {:#x}",
                start, computed, stored
            )));
        }

        self.offset += FRAME_SIZE + key.len() as u64 + value.len() as u64 + 8;
        Ok(Some(match op {
            OP_PUT => Record::Put(key, value),
            _ => Record::Delete(key),
        }))
    }
}

/// Reads `len` bytes without trusting the length for allocation.
fn read_exact_len<R: Read>(reader: &mut R, len: u32) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len as usize {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

impl Iterator for ReplayIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
