use std::io;

use bytes_util::BitReader;

use super::FrameRate;

/// `TimingInfo` holds the VUI fields read when `timing_info_present_flag == 1`.
///
/// ISO/IEC-14496-10-2022 - E.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    /// Number of `time_scale` units per clock tick. Zero is accepted here
    /// and rejected by [`TimingInfo::frame_rate`] consumers via
    /// [`FrameRate::is_usable`].
    pub num_units_in_tick: u32,
    /// Number of time units that pass in one second.
    pub time_scale: u32,
    /// `fixed_frame_rate_flag`.
    pub fixed_frame_rate_flag: bool,
}

impl TimingInfo {
    /// Parses the timing fields from a bitstream.
    pub fn parse<B: AsRef<[u8]>>(reader: &mut BitReader<B>) -> io::Result<Self> {
        let num_units_in_tick = reader.read_bits(32)?;
        let time_scale = reader.read_bits(32)?;
        let fixed_frame_rate_flag = reader.read_bit()?;

        Ok(Self {
            num_units_in_tick,
            time_scale,
            fixed_frame_rate_flag,
        })
    }

    /// The frame rate, `time_scale / (2 * num_units_in_tick)`.
    ///
    /// A denominator that does not fit in 32 bits is reported as 0.
    pub fn frame_rate(&self) -> FrameRate {
        let fps_den = self.num_units_in_tick.checked_mul(2).unwrap_or(0);
        FrameRate::new(self.fixed_frame_rate_flag, self.time_scale, fps_den)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;

    use super::*;

    fn timing(tick: u32, scale: u32, fixed: bool) -> TimingInfo {
        let mut writer = BitWriter::new();
        writer.write_bits(tick as u64, 32);
        writer.write_bits(scale as u64, 32);
        writer.write_bit(fixed);
        TimingInfo::parse(&mut BitReader::new(writer.finish())).unwrap()
    }

    #[test]
    fn test_parse_timing_info() {
        let info = timing(1001, 60000, true);
        assert_eq!(info.num_units_in_tick, 1001);
        assert_eq!(info.time_scale, 60000);

        let rate = info.frame_rate();
        assert_eq!((rate.fps_num, rate.fps_den), (60000, 2002));
        assert!((rate.fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_degenerate_timing_info() {
        assert!(!timing(0, 60000, true).frame_rate().is_usable());
        assert!(!timing(u32::MAX, 60000, true).frame_rate().is_usable());
        assert!(!timing(1000, 60000, false).frame_rate().is_usable());
    }
}
