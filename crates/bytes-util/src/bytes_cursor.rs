use std::io;

use bytes::Bytes;

/// A cursor over a shared [`Bytes`] buffer.
///
/// Combined with [`byteorder::ReadBytesExt`](https://docs.rs/byteorder) this is
/// the bounded big-endian reader used by the demuxers: every read past the end
/// of the buffer yields [`io::ErrorKind::UnexpectedEof`].
pub type BytesCursor = io::Cursor<Bytes>;

/// Zero-copy helpers for [`BytesCursor`].
pub trait BytesCursorExt {
    /// Number of bytes between the cursor position and the end of the buffer.
    fn remaining_len(&self) -> usize;

    /// Returns a slice of the next `size` bytes and advances past them.
    ///
    /// The slice shares the underlying allocation. Fails with
    /// [`io::ErrorKind::UnexpectedEof`] when fewer than `size` bytes remain.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;

    /// Returns everything after the cursor and moves the cursor to the end.
    fn extract_remaining(&mut self) -> Bytes;

    /// Advances the cursor by `size` bytes without looking at them.
    fn skip_bytes(&mut self, size: usize) -> io::Result<()>;
}

impl BytesCursorExt for BytesCursor {
    fn remaining_len(&self) -> usize {
        self.get_ref().len().saturating_sub(self.position() as usize)
    }

    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        if size > self.remaining_len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("need {size} bytes, {} left", self.remaining_len()),
            ));
        }

        let start = self.position() as usize;
        let slice = self.get_ref().slice(start..start + size);
        self.set_position((start + size) as u64);

        Ok(slice)
    }

    fn extract_remaining(&mut self) -> Bytes {
        let size = self.remaining_len();
        self.extract_bytes(size).unwrap_or_default()
    }

    fn skip_bytes(&mut self, size: usize) -> io::Result<()> {
        if size > self.remaining_len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "skip past end of buffer"));
        }
        self.set_position(self.position() + size as u64);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bytes_shares_buffer() {
        let source = Bytes::from_static(&[1, 2, 3, 4, 5]);
        let mut cursor = io::Cursor::new(source.clone());

        let head = cursor.extract_bytes(3).unwrap();
        assert_eq!(head, Bytes::from_static(&[1, 2, 3]));
        assert_eq!(head.as_ptr(), source.as_ptr());
        assert_eq!(cursor.remaining_len(), 2);

        let err = cursor.extract_bytes(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // A failed extract does not move the cursor.
        assert_eq!(cursor.position(), 3);

        assert_eq!(cursor.extract_remaining(), Bytes::from_static(&[4, 5]));
        assert_eq!(cursor.remaining_len(), 0);
        assert_eq!(cursor.extract_bytes(0).unwrap(), Bytes::new());
    }

    #[test]
    fn test_skip_bytes() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3]));
        cursor.skip_bytes(2).unwrap();
        assert_eq!(cursor.remaining_len(), 1);
        assert!(cursor.skip_bytes(2).is_err());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_position_past_end() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2]));
        cursor.set_position(10);
        assert_eq!(cursor.remaining_len(), 0);
        assert_eq!(cursor.extract_remaining(), Bytes::new());
    }
}
