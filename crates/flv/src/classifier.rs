//! Best-effort I/P/B labelling of AVC samples.
//!
//! The label is reconstructed from timestamps only: no slice header is read.
//! An IDR unit resets the references, the distance between the first two
//! frames after it is taken as the frame duration, and a non-IDR unit whose
//! presentation time jumps ahead of the previous reference by more than one
//! frame is taken as a P frame followed by `jump - 1` B frames. Streams with
//! variable frame durations or open GOPs are labelled wrongly; consumers
//! must not treat the result as authoritative.

use std::fmt;

/// The inferred picture type of a video sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameType {
    I,
    P,
    B,
    /// No IDR or non-IDR slice was seen in the sample.
    #[default]
    Unknown,
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FrameType::I => "I",
            FrameType::P => "P",
            FrameType::B => "B",
            FrameType::Unknown => "?",
        };
        f.write_str(label)
    }
}

/// Timestamp-based frame type classifier.
#[derive(Debug, Clone)]
pub struct FrameTypeClassifier {
    tolerance: f64,
    last_idr_or_b_dts: i64,
    last_idr_or_p_pts: i64,
    frame_duration: i64,
    b_frame_count: f64,
}

impl FrameTypeClassifier {
    /// `tolerance` is how far, in milliseconds, two timestamps may be apart
    /// and still count as equal.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            last_idr_or_b_dts: 0,
            last_idr_or_p_pts: 0,
            frame_duration: 0,
            b_frame_count: 0.0,
        }
    }

    /// The frame duration learned so far, 0 until two frames were seen.
    pub fn frame_duration(&self) -> i64 {
        self.frame_duration
    }

    fn near(&self, a: i64, b: i64) -> bool {
        ((a - b) as f64).abs() < self.tolerance
    }

    /// Feeds one NAL unit of type `unit_type` belonging to a sample at
    /// `dts` with composition offset `cts`.
    ///
    /// Returns the label for IDR (5) and non-IDR (1) slices, `None` for any
    /// other unit.
    pub fn classify(&mut self, unit_type: u8, dts: i64, cts: i32) -> Option<FrameType> {
        let cts = cts as i64;

        if unit_type == 5 {
            self.last_idr_or_b_dts = dts;
            self.last_idr_or_p_pts = dts + cts;
        }

        if self.frame_duration == 0 && self.last_idr_or_b_dts != 0 && dts != self.last_idr_or_b_dts {
            self.frame_duration = dts - self.last_idr_or_b_dts;
        }

        match unit_type {
            5 => Some(FrameType::I),
            1 => Some(self.classify_slice(dts, cts)),
            _ => None,
        }
    }

    fn classify_slice(&mut self, dts: i64, cts: i64) -> FrameType {
        let duration = self.frame_duration;
        let follows_reference = self.near(dts - duration, self.last_idr_or_b_dts);
        let displayed_in_order = self.near(dts + cts - duration, self.last_idr_or_p_pts);

        if follows_reference && cts != 0 && !displayed_in_order {
            // The frames skipped in display order are B frames still to come
            let count = match duration {
                0 => 0.0,
                _ => (cts + dts - self.last_idr_or_p_pts) as f64 / duration as f64 - 1.0,
            };
            self.b_frame_count = if count < 0.1 { 0.0 } else { count };
            self.last_idr_or_p_pts = cts + dts;
            return FrameType::P;
        }

        if cts <= 0 {
            return FrameType::P;
        }

        if self.b_frame_count > 0.0 {
            self.b_frame_count -= 1.0;
            if self.b_frame_count < 0.1 {
                self.b_frame_count = 0.0;
            }
        }
        if self.b_frame_count <= 0.0 {
            self.last_idr_or_b_dts = dts;
            self.b_frame_count = 0.0;
        }

        FrameType::B
    }
}

impl Default for FrameTypeClassifier {
    fn default() -> Self {
        Self::new(2.0)
    }
}
