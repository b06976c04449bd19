use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::Path,
};

use crate::types::error::{DatabaseError, Result};

/// Seekable, sequentially-readable view over a database image. The cursor
/// position is the only decode state; every read advances it.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
}

impl ByteCursor<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(file))
    }
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DatabaseError::malformed(offset, format!("seek failed: {e}")))?;
        self.position = offset;
        Ok(())
    }

    pub fn read_exact(&mut self, buffer: &mut [u8]) -> Result<()> {
        let start = self.position;
        self.inner.read_exact(buffer).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => DatabaseError::malformed(
                start,
                format!("unexpected end of file reading {} bytes", buffer.len()),
            ),
            _ => DatabaseError::Io(e),
        })?;
        self.position += buffer.len() as u64;
        Ok(())
    }

    /// Read `len` bytes. The buffer grows with the bytes actually present, so a
    /// corrupt length hits end of file instead of a huge allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let start = self.position;
        let mut buffer = Vec::new();
        self.inner
            .by_ref()
            .take(len as u64)
            .read_to_end(&mut buffer)?;
        self.position += buffer.len() as u64;
        if buffer.len() < len {
            return Err(DatabaseError::malformed(
                start,
                format!("unexpected end of file reading {len} bytes"),
            ));
        }
        Ok(buffer)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buffer = [0u8; 2];
        self.read_exact(&mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }
}
