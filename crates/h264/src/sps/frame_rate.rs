/// A frame rate expressed both as a rational and as a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    /// Whether the stream declares a fixed frame rate.
    pub fixed: bool,
    /// `fps_num / fps_den`, or 0 when either part is 0.
    pub fps: f64,
    /// Numerator.
    pub fps_num: u32,
    /// Denominator.
    pub fps_den: u32,
}

impl FrameRate {
    /// The NTSC film rate, used when nothing better is known.
    pub const FILM: FrameRate = FrameRate {
        fixed: true,
        fps: 23.976,
        fps_num: 23976,
        fps_den: 1000,
    };

    /// The value an SPS reports when it carries no timing info.
    pub const UNKNOWN: FrameRate = FrameRate {
        fixed: true,
        fps: 0.0,
        fps_num: 0,
        fps_den: 0,
    };

    /// Builds a frame rate from a rational.
    pub fn new(fixed: bool, fps_num: u32, fps_den: u32) -> Self {
        let fps = if fps_num == 0 || fps_den == 0 {
            0.0
        } else {
            fps_num as f64 / fps_den as f64
        };

        Self {
            fixed,
            fps,
            fps_num,
            fps_den,
        }
    }

    /// Whether the rate can be used to derive sample durations.
    pub const fn is_usable(&self) -> bool {
        self.fixed && self.fps_num != 0 && self.fps_den != 0
    }

    /// Returns `self` when usable, otherwise `reference`.
    pub const fn or(self, reference: FrameRate) -> FrameRate {
        if self.is_usable() { self } else { reference }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FILM
    }
}
