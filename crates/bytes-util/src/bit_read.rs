use std::io;

/// A big-endian bit reader over a byte buffer.
///
/// Unread bits live in a 32-bit window (`word`), most significant bit first.
/// When the window runs dry it is refilled with up to four bytes from the
/// buffer. Trying to refill past the end of the buffer fails with
/// [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug, Clone)]
#[must_use]
pub struct BitReader<B> {
    data: B,
    byte_pos: usize,
    word: u32,
    bits_left: u32,
}

fn exhausted() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "insufficient data in bit reader")
}

impl<B> BitReader<B> {
    /// Creates a reader positioned at the first bit of `data`.
    pub const fn new(data: B) -> Self {
        Self {
            data,
            byte_pos: 0,
            word: 0,
            bits_left: 0,
        }
    }

    /// Returns the underlying buffer
    #[inline(always)]
    #[must_use]
    pub fn into_inner(self) -> B {
        self.data
    }

    /// Number of bits still buffered in the current window.
    #[inline(always)]
    #[must_use]
    pub const fn window_bits(&self) -> u32 {
        self.bits_left
    }
}

impl<B: AsRef<[u8]>> BitReader<B> {
    fn fill_word(&mut self) -> io::Result<()> {
        let data = self.data.as_ref();
        let remaining = data.len().saturating_sub(self.byte_pos);
        if remaining == 0 {
            return Err(exhausted());
        }

        let take = remaining.min(4);
        let mut buf = [0u8; 4];
        buf[..take].copy_from_slice(&data[self.byte_pos..self.byte_pos + take]);

        self.word = u32::from_be_bytes(buf);
        self.byte_pos += take;
        self.bits_left = take as u32 * 8;
        Ok(())
    }

    /// Takes `count` bits (at most what the window holds) off the top of the window.
    fn take_from_window(&mut self, count: u32) -> u32 {
        debug_assert!(count <= self.bits_left);
        if count == 0 {
            return 0;
        }
        let value = self.word >> (32 - count);
        self.word = self.word.checked_shl(count).unwrap_or(0);
        self.bits_left -= count;
        value
    }

    /// Reads up to 32 bits, most significant bit first.
    pub fn read_bits(&mut self, count: u32) -> io::Result<u32> {
        if count > 32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits at once"),
            ));
        }

        if count <= self.bits_left {
            return Ok(self.take_from_window(count));
        }

        let high_len = self.bits_left;
        let high = self.take_from_window(high_len);

        let low_len = count - high_len;
        self.fill_word()?;
        if low_len > self.bits_left {
            return Err(exhausted());
        }
        let low = self.take_from_window(low_len);

        Ok(high.checked_shl(low_len).unwrap_or(0) | low)
    }

    /// Reads a single bit as a flag.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads eight bits.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Discards `count` bits, any amount.
    pub fn skip_bits(&mut self, mut count: u64) -> io::Result<()> {
        while count > 0 {
            let step = count.min(32) as u32;
            self.read_bits(step)?;
            count -= step as u64;
        }
        Ok(())
    }

    /// Counts and consumes the run of zero bits in front of the next set bit.
    ///
    /// The set bit itself is left unread.
    pub fn skip_leading_zeros(&mut self) -> io::Result<u32> {
        let mut zeros = 0;
        loop {
            if self.bits_left == 0 {
                self.fill_word()?;
            }

            let run = self.word.leading_zeros().min(self.bits_left);
            if run < self.bits_left {
                self.take_from_window(run);
                return Ok(zeros + run);
            }

            zeros += self.bits_left;
            self.word = 0;
            self.bits_left = 0;
        }
    }

    /// Total bits not read yet, window included.
    #[must_use]
    pub fn remaining_bits(&self) -> u64 {
        let unread_bytes = self.data.as_ref().len().saturating_sub(self.byte_pos) as u64;
        unread_bytes * 8 + self.bits_left as u64
    }
}
