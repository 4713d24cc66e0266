use std::fmt;

use hifitime::Epoch;
use nom::{
    number::complete::{le_f64, le_i32},
    IResult,
};

use super::spk_type::SpkDataType;

/// Descriptor of one SPK segment (ND = 2 doubles, NI = 6 integers).
#[derive(Debug, PartialEq, Clone)]
pub struct Summary {
    pub start_epoch: f64,
    pub end_epoch: f64,
    pub target: i32,
    pub center: i32,
    pub frame_id: i32,
    pub data_type: i32,
    pub initial_addr: i32,
    pub final_addr: i32,
}

impl Summary {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, start_epoch) = le_f64(input)?;
        let (input, end_epoch) = le_f64(input)?;

        let (input, target) = le_i32(input)?;
        let (input, center) = le_i32(input)?;
        let (input, frame_id) = le_i32(input)?;
        let (input, data_type) = le_i32(input)?;
        let (input, initial_addr) = le_i32(input)?;
        let (input, final_addr) = le_i32(input)?;
        Ok((
            input,
            Summary {
                start_epoch,
                end_epoch,
                target,
                center,
                frame_id,
                data_type,
                initial_addr,
                final_addr,
            },
        ))
    }

    /// `true` if the ET epoch lies inside the segment coverage (inclusive).
    pub fn covers(&self, et_seconds: f64) -> bool {
        et_seconds >= self.start_epoch && et_seconds <= self.end_epoch
    }

    /// Number of double-precision words of segment data.
    pub fn word_count(&self) -> usize {
        (self.final_addr - self.initial_addr + 1).max(0) as usize
    }
}

/// Control words at the head of each summary record: `(next, prev, nsum)`.
pub fn parse_summary_control(input: &[u8]) -> IResult<&[u8], (usize, usize, usize)> {
    let (input, next) = le_f64(input)?;
    let (input, prev) = le_f64(input)?;
    let (input, nsum) = le_f64(input)?;
    Ok((input, (next as usize, prev as usize, nsum as usize)))
}

impl fmt::Display for Summary {
    /// `body -61 wrt 599, Hermite Interpolation (Unequal Time Steps), frame 1, <start> to <end>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "body {} wrt {}, {}, frame {}, {} to {}",
            self.target,
            self.center,
            SpkDataType::from(self.data_type),
            self.frame_id,
            Epoch::from_et_seconds(self.start_epoch),
            Epoch::from_et_seconds(self.end_epoch)
        )
    }
}
