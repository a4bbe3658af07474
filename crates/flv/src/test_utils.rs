//! # Test Utilities
//!
//! Builders for synthetic FLV streams shared by the demuxer tests.

use amf0::{Amf0Encoder, Amf0Object, Amf0Value};
use byteorder::{BigEndian, WriteBytesExt};
use bytes_util::BitWriter;
use expgolomb::BitWriterExpGolombExt;

/// Initialize tracing for tests with appropriate settings
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// 1280x720 High 3.1, 4:2:0, square pixels, 30 fps.
pub fn sps_720p() -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bits(0x67, 8);
    writer.write_bits(100, 8); // profile_idc
    writer.write_bits(0, 8);
    writer.write_bits(31, 8); // level_idc
    writer.write_exp_golomb(0); // seq_parameter_set_id
    writer.write_exp_golomb(1); // chroma_format_idc
    writer.write_exp_golomb(0);
    writer.write_exp_golomb(0);
    writer.write_bit(false);
    writer.write_bit(false);
    writer.write_exp_golomb(0); // log2_max_frame_num_minus4
    writer.write_exp_golomb(0); // pic_order_cnt_type
    writer.write_exp_golomb(0);
    writer.write_exp_golomb(4); // max_num_ref_frames
    writer.write_bit(false);
    writer.write_exp_golomb(79); // pic_width_in_mbs_minus1
    writer.write_exp_golomb(44); // pic_height_in_map_units_minus1
    writer.write_bit(true); // frame_mbs_only_flag
    writer.write_bit(true);
    writer.write_bit(false); // frame_cropping_flag
    writer.write_bit(true); // vui_parameters_present_flag
    writer.write_bit(true);
    writer.write_bits(1, 8); // aspect_ratio_idc, 1:1
    writer.write_bit(false);
    writer.write_bit(false);
    writer.write_bit(false);
    writer.write_bit(true); // timing_info_present_flag
    writer.write_bits(1000, 32);
    writer.write_bits(60000, 32);
    writer.write_bit(true);
    writer.finish()
}

pub const PPS: [u8; 4] = [0x68, 0xeb, 0xe3, 0xcb];

/// AudioSpecificConfig of AAC LC, 44100 Hz, stereo.
pub const ASC_44100_STEREO: [u8; 2] = [0x12, 0x10];

/// An AVCDecoderConfigurationRecord with one SPS and one PPS.
pub fn avcc(sps: &[u8], pps: &[u8], length_size: u8) -> Vec<u8> {
    let mut out = vec![0x01, sps[1], sps[2], sps[3], 0xfc | (length_size - 1), 0xe1];
    out.write_u16::<BigEndian>(sps.len() as u16).unwrap();
    out.extend_from_slice(sps);
    out.push(0x01);
    out.write_u16::<BigEndian>(pps.len() as u16).unwrap();
    out.extend_from_slice(pps);
    out
}

/// Length prefixes each unit with a 4-byte big endian size.
pub fn nalus(units: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        out.write_u32::<BigEndian>(unit.len() as u32).unwrap();
        out.extend_from_slice(unit);
    }
    out
}

/// Appends tags to an FLV byte stream.
#[derive(Debug, Default, Clone)]
pub struct StreamBuilder {
    data: Vec<u8>,
}

impl StreamBuilder {
    /// Starts a stream with the header and PreviousTagSize0.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        let mut data = b"FLV\x01".to_vec();
        data.push(((has_audio as u8) << 2) | has_video as u8);
        data.write_u32::<BigEndian>(9).unwrap();
        data.write_u32::<BigEndian>(0).unwrap();
        Self { data }
    }

    pub fn tag(mut self, tag_type: u8, timestamp: u32, body: &[u8]) -> Self {
        self.data.push(tag_type);
        self.data.write_u24::<BigEndian>(body.len() as u32).unwrap();
        self.data.write_u24::<BigEndian>(timestamp & 0x00ff_ffff).unwrap();
        self.data.push((timestamp >> 24) as u8);
        self.data.write_u24::<BigEndian>(0).unwrap();
        self.data.extend_from_slice(body);
        self.data.write_u32::<BigEndian>(11 + body.len() as u32).unwrap();
        self
    }

    /// A tag whose trailing PreviousTagSize is wrong.
    pub fn tag_with_bad_previous_size(self, tag_type: u8, timestamp: u32, body: &[u8]) -> Self {
        let mut builder = self.tag(tag_type, timestamp, body);
        let len = builder.data.len();
        builder.data[len - 4..].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        builder
    }

    pub fn on_metadata(self, properties: &[(&str, Amf0Value)]) -> Self {
        let object: Amf0Object = properties.iter().cloned().collect();
        let mut body = Vec::new();
        Amf0Encoder::encode_script_data(&mut body, "onMetaData", &Amf0Value::Object(object)).unwrap();
        self.tag(18, 0, &body)
    }

    pub fn aac_sequence_header(self, config: &[u8]) -> Self {
        let mut body = vec![0xaf, 0x00];
        body.extend_from_slice(config);
        self.tag(8, 0, &body)
    }

    pub fn aac_frame(self, timestamp: u32, frame: &[u8]) -> Self {
        let mut body = vec![0xaf, 0x01];
        body.extend_from_slice(frame);
        self.tag(8, timestamp, &body)
    }

    pub fn mp3_frame(self, timestamp: u32, frame: &[u8]) -> Self {
        let mut body = vec![0x2f];
        body.extend_from_slice(frame);
        self.tag(8, timestamp, &body)
    }

    pub fn avc_sequence_header(self, record: &[u8]) -> Self {
        let mut body = vec![0x17, 0x00, 0x00, 0x00, 0x00];
        body.extend_from_slice(record);
        self.tag(9, 0, &body)
    }

    /// An AVC NALU packet; `cts` is the composition offset in milliseconds.
    pub fn avc_frame(self, timestamp: u32, keyframe: bool, cts: i32, payload: &[u8]) -> Self {
        let mut body = vec![if keyframe { 0x17 } else { 0x27 }, 0x01];
        body.write_i24::<BigEndian>(cts).unwrap();
        body.extend_from_slice(payload);
        self.tag(9, timestamp, &body)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}
