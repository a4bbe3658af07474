mod frame_crop_info;
pub use self::frame_crop_info::FrameCropInfo;

mod frame_rate;
pub use self::frame_rate::FrameRate;

mod sample_aspect_ratio;
pub use self::sample_aspect_ratio::SarDimensions;

mod sps_ext;
pub use self::sps_ext::SpsExtended;

mod timing_info;
use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

pub use self::timing_info::TimingInfo;
use crate::{NALUnitType, ebsp_to_rbsp};

/// The Sequence Parameter Set.
///
/// Only the fields needed to describe the stream to a decoder are kept;
/// everything after the VUI timing info is ignored.
///
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
#[derive(Debug, Clone, PartialEq)]
pub struct Sps {
    /// `nal_ref_idc` from the NAL header.
    pub nal_ref_idc: u8,
    /// `profile_idc`
    pub profile_idc: u8,
    /// The raw `constraint_set0_flag..constraint_set5_flag` byte, including
    /// the two reserved bits.
    pub constraint_flags: u8,
    /// `level_idc`
    pub level_idc: u8,
    /// `seq_parameter_set_id`
    pub seq_parameter_set_id: u32,
    /// The High-family extension, or the inferred defaults for profiles that
    /// do not carry it.
    pub ext: SpsExtended,
    /// `log2_max_frame_num_minus4`
    pub log2_max_frame_num_minus4: u32,
    /// `pic_order_cnt_type`
    pub pic_order_cnt_type: u32,
    /// `max_num_ref_frames`
    pub max_num_ref_frames: u32,
    /// `gaps_in_frame_num_value_allowed_flag`
    pub gaps_in_frame_num_value_allowed_flag: bool,
    /// `pic_width_in_mbs_minus1`
    pub pic_width_in_mbs_minus1: u32,
    /// `pic_height_in_map_units_minus1`
    pub pic_height_in_map_units_minus1: u32,
    /// `frame_mbs_only_flag`
    pub frame_mbs_only_flag: bool,
    /// `direct_8x8_inference_flag`
    pub direct_8x8_inference_flag: bool,
    /// Cropping rectangle, when `frame_cropping_flag` is set.
    pub frame_crop_info: Option<FrameCropInfo>,
    /// Sample aspect ratio, 1:1 unless the VUI says otherwise.
    pub sample_aspect_ratio: SarDimensions,
    /// VUI timing info, when present and readable.
    pub timing_info: Option<TimingInfo>,
    /// The frame rate from the timing info, or the reference rate passed to
    /// [`Sps::parse`] when the timing info is missing or unusable.
    pub frame_rate: FrameRate,
    /// Decoded width in pixels after cropping.
    pub codec_width: u32,
    /// Decoded height in pixels after cropping.
    pub codec_height: u32,
    /// Display width, `codec_width` scaled by the sample aspect ratio.
    pub present_width: u32,
    /// Display height.
    pub present_height: u32,
}

impl Sps {
    /// Parses an SPS NAL unit (header byte included, emulation prevention
    /// bytes still present).
    ///
    /// The fields up to the VUI flag must decode. The VUI is read on a best
    /// effort basis: if it is truncated the fields read so far are kept and
    /// the rest fall back to their defaults.
    pub fn parse(nal: &[u8], reference_frame_rate: FrameRate) -> io::Result<Self> {
        let rbsp = ebsp_to_rbsp(nal);
        let mut reader = BitReader::new(rbsp.as_slice());

        let header = reader.read_u8()?;
        if header & 0x80 != 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Forbidden zero bit is set"));
        }
        if NALUnitType::from_header(header) != NALUnitType::Sps {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "NAL unit type is not SPS"));
        }
        let nal_ref_idc = (header >> 5) & 0b11;

        let profile_idc = reader.read_u8()?;
        let constraint_flags = reader.read_u8()?;
        let level_idc = reader.read_u8()?;
        let seq_parameter_set_id = reader.read_exp_golomb()?;

        let ext = match profile_idc {
            100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 134 | 135 | 138 | 139 | 144 => {
                SpsExtended::parse(&mut reader)?
            }
            _ => SpsExtended::default(),
        };

        let log2_max_frame_num_minus4 = reader.read_exp_golomb()?;
        let pic_order_cnt_type = reader.read_exp_golomb()?;
        match pic_order_cnt_type {
            0 => {
                // log2_max_pic_order_cnt_lsb_minus4
                reader.read_exp_golomb()?;
            }
            1 => {
                reader.read_bit()?; // delta_pic_order_always_zero_flag
                reader.read_signed_exp_golomb()?; // offset_for_non_ref_pic
                reader.read_signed_exp_golomb()?; // offset_for_top_to_bottom_field
                let cycle = reader.read_exp_golomb()?;
                for _ in 0..cycle {
                    reader.read_signed_exp_golomb()?; // offset_for_ref_frame
                }
            }
            _ => {}
        }

        let max_num_ref_frames = reader.read_exp_golomb()?;
        let gaps_in_frame_num_value_allowed_flag = reader.read_bit()?;
        let pic_width_in_mbs_minus1 = reader.read_exp_golomb()?;
        let pic_height_in_map_units_minus1 = reader.read_exp_golomb()?;

        let frame_mbs_only_flag = reader.read_bit()?;
        if !frame_mbs_only_flag {
            reader.read_bit()?; // mb_adaptive_frame_field_flag
        }
        let direct_8x8_inference_flag = reader.read_bit()?;

        let frame_crop_info = if reader.read_bit()? {
            Some(FrameCropInfo::parse(&mut reader)?)
        } else {
            None
        };

        let mut sample_aspect_ratio = SarDimensions::default();
        let mut timing_info = None;

        if reader.read_bit()? {
            if let Err(err) = parse_vui(&mut reader, &mut sample_aspect_ratio, &mut timing_info) {
                tracing::warn!(error = %err, "SPS VUI truncated, keeping partial result");
            }
        }

        let frame_rate = timing_info
            .map_or(FrameRate::UNKNOWN, |timing| timing.frame_rate())
            .or(reference_frame_rate);

        let mut sps = Sps {
            nal_ref_idc,
            profile_idc,
            constraint_flags,
            level_idc,
            seq_parameter_set_id,
            ext,
            log2_max_frame_num_minus4,
            pic_order_cnt_type,
            max_num_ref_frames,
            gaps_in_frame_num_value_allowed_flag,
            pic_width_in_mbs_minus1,
            pic_height_in_map_units_minus1,
            frame_mbs_only_flag,
            direct_8x8_inference_flag,
            frame_crop_info,
            sample_aspect_ratio,
            timing_info,
            frame_rate,
            codec_width: 0,
            codec_height: 0,
            present_width: 0,
            present_height: 0,
        };
        sps.compute_dimensions();

        Ok(sps)
    }

    fn compute_dimensions(&mut self) {
        let (unit_x, unit_y) = FrameCropInfo::crop_units(self.ext.chroma_format_idc, self.frame_mbs_only_flag);
        let crop = self.frame_crop_info.unwrap_or_default();

        let width = (self.pic_width_in_mbs_minus1 as u64 + 1) * 16;
        let height = (2 - self.frame_mbs_only_flag as u64) * (self.pic_height_in_map_units_minus1 as u64 + 1) * 16;

        let codec_width = width.saturating_sub(crop.horizontal(unit_x));
        let codec_height = height.saturating_sub(crop.vertical(unit_y));

        let present_width = if self.sample_aspect_ratio.is_specified() {
            let sar = &self.sample_aspect_ratio;
            (codec_width * sar.sar_width as u64).div_ceil(sar.sar_height as u64)
        } else {
            codec_width
        };

        self.codec_width = clamp_u32(codec_width);
        self.codec_height = clamp_u32(codec_height);
        self.present_width = clamp_u32(present_width);
        self.present_height = self.codec_height;
    }

    /// The profile name.
    pub const fn profile_string(&self) -> &'static str {
        match self.profile_idc {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High10",
            122 => "High422",
            244 => "High444",
            _ => "Unknown",
        }
    }

    /// The level as a decimal string, `31` becomes `"3.1"`.
    pub fn level_string(&self) -> String {
        format!("{:.1}", self.level_idc as f64 / 10.0)
    }

    /// The chroma format as a number: 420, 422, 444, or 0 for monochrome
    /// and unknown values.
    pub const fn chroma_format(&self) -> u16 {
        match self.ext.chroma_format_idc {
            1 => 420,
            2 => 422,
            3 => 444,
            _ => 0,
        }
    }

    /// The chroma format as a display string.
    pub const fn chroma_format_string(&self) -> &'static str {
        match self.ext.chroma_format_idc {
            1 => "4:2:0",
            2 => "4:2:2",
            3 => "4:4:4",
            _ => "Unknown",
        }
    }

    /// Luma bit depth.
    pub const fn bit_depth(&self) -> u32 {
        self.ext.bit_depth_luma()
    }
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Reads the VUI up to and including the timing info, E.1.1.
fn parse_vui<B: AsRef<[u8]>>(
    reader: &mut BitReader<B>,
    sample_aspect_ratio: &mut SarDimensions,
    timing_info: &mut Option<TimingInfo>,
) -> io::Result<()> {
    if reader.read_bit()? {
        *sample_aspect_ratio = SarDimensions::parse(reader)?;
    }

    // overscan_info_present_flag
    if reader.read_bit()? {
        reader.read_bit()?; // overscan_appropriate_flag
    }

    // video_signal_type_present_flag
    if reader.read_bit()? {
        reader.skip_bits(4)?; // video_format, video_full_range_flag
        if reader.read_bit()? {
            reader.skip_bits(24)?; // colour_primaries, transfer_characteristics, matrix_coefficients
        }
    }

    // chroma_loc_info_present_flag
    if reader.read_bit()? {
        reader.read_exp_golomb()?;
        reader.read_exp_golomb()?;
    }

    if reader.read_bit()? {
        *timing_info = Some(TimingInfo::parse(reader)?);
    }

    Ok(())
}
