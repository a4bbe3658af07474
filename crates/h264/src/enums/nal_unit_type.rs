/// NAL (Network Abstraction Layer) unit types as defined by ISO/IEC 14496-10:2022 (Table 7-1).
///
/// Only the low five bits of the NAL header byte carry the type, so every
/// byte maps to some variant; values without a dedicated variant are grouped
/// as [`NALUnitType::Reserved`] or [`NALUnitType::Unspecified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NALUnitType {
    /// Coded slice of a non-IDR picture
    NonIdrSlice,
    /// Coded slice data partition A
    SliceDataPartitionA,
    /// Coded slice data partition B
    SliceDataPartitionB,
    /// Coded slice data partition C
    SliceDataPartitionC,
    /// Coded slice of an IDR picture
    IdrSlice,
    /// Supplemental enhancement information
    Sei,
    /// Sequence parameter set
    Sps,
    /// Picture parameter set
    Pps,
    /// Access unit delimiter
    AccessUnitDelimiter,
    /// End of sequence
    EndOfSeq,
    /// End of stream
    EndOfStream,
    /// Filler data
    FillerData,
    /// Sequence parameter set extension
    SpsExtension,
    /// Prefix NAL unit
    PrefixNalUnit,
    /// Subset sequence parameter set
    SubsetSps,
    /// Depth parameter set
    DepthParameterSet,
    /// Coded slice of an auxiliary coded picture
    AuxiliarySlice,
    /// Coded slice extension
    SliceExtension,
    /// Coded slice extension for a depth view component
    SliceExtensionDepth,
    /// Reserved values 17, 18, 22 and 23
    Reserved(u8),
    /// Unspecified values 0 and 24..=31
    Unspecified(u8),
}

impl NALUnitType {
    /// Reads the unit type from a NAL header byte.
    pub const fn from_header(byte: u8) -> Self {
        Self::from_u5(byte & 0x1f)
    }

    const fn from_u5(value: u8) -> Self {
        match value {
            1 => Self::NonIdrSlice,
            2 => Self::SliceDataPartitionA,
            3 => Self::SliceDataPartitionB,
            4 => Self::SliceDataPartitionC,
            5 => Self::IdrSlice,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSeq,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            14 => Self::PrefixNalUnit,
            15 => Self::SubsetSps,
            16 => Self::DepthParameterSet,
            19 => Self::AuxiliarySlice,
            20 => Self::SliceExtension,
            21 => Self::SliceExtensionDepth,
            17 | 18 | 22 | 23 => Self::Reserved(value),
            _ => Self::Unspecified(value),
        }
    }

    /// The five bit type value.
    pub const fn value(self) -> u8 {
        match self {
            Self::NonIdrSlice => 1,
            Self::SliceDataPartitionA => 2,
            Self::SliceDataPartitionB => 3,
            Self::SliceDataPartitionC => 4,
            Self::IdrSlice => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::AccessUnitDelimiter => 9,
            Self::EndOfSeq => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::SpsExtension => 13,
            Self::PrefixNalUnit => 14,
            Self::SubsetSps => 15,
            Self::DepthParameterSet => 16,
            Self::AuxiliarySlice => 19,
            Self::SliceExtension => 20,
            Self::SliceExtensionDepth => 21,
            Self::Reserved(v) | Self::Unspecified(v) => v,
        }
    }

    /// Whether this unit starts an instantaneous decoder refresh picture.
    pub const fn is_idr(self) -> bool {
        matches!(self, Self::IdrSlice)
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        Self::from_header(value)
    }
}
