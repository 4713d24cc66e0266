use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::{boundary_errors::BoundaryError, constants::OBLIQUITY_J2000};

use super::{
    chebyshev_record::ChebyshevRecord, directory::DirectoryData, hermite_segment::HermiteSegment,
    spk_type::SpkDataType, summary_record::Summary,
};

/// NAIF frame code of the J2000 (ICRF-aligned) inertial frame.
pub const FRAME_J2000: i32 = 1;
/// NAIF frame code of the mean ecliptic and equinox of J2000.
pub const FRAME_ECLIPJ2000: i32 = 17;

/// Decoded data of one SPK segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentData {
    Chebyshev {
        directory: DirectoryData,
        records: Vec<ChebyshevRecord>,
    },
    Hermite(HermiteSegment),
}

/// One loaded SPK segment: its descriptor, its data, and the rotation bringing
/// its native frame to J2000.
#[derive(Debug, Clone, PartialEq)]
pub struct SpkSegment {
    pub summary: Summary,
    pub data: SegmentData,
    to_j2000: Matrix3<f64>,
}

impl SpkSegment {
    /// Build a segment from its summary and raw words.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` if the data type or the frame is not handled (the caller logs and
    ///   skips the segment), `Ok(Some(..))` on success, or a format error.
    pub fn decode(summary: Summary, words: &[f64]) -> Result<Option<Self>, BoundaryError> {
        let Some(to_j2000) = frame_to_j2000(summary.frame_id) else {
            return Ok(None);
        };

        let data = match SpkDataType::from(summary.data_type) {
            data_type @ (SpkDataType::ChebyshevPositionOnly
            | SpkDataType::ChebyshevPositionVelocity) => {
                let components = if data_type == SpkDataType::ChebyshevPositionOnly {
                    3
                } else {
                    6
                };
                let directory = DirectoryData::from_segment_words(words)?;
                let records = ChebyshevRecord::parse_all(
                    words,
                    directory.rsize,
                    directory.n_records,
                    components,
                );
                SegmentData::Chebyshev { directory, records }
            }
            SpkDataType::HermiteNonUniform => {
                SegmentData::Hermite(HermiteSegment::from_segment_words(words)?)
            }
            SpkDataType::Unsupported(_) => return Ok(None),
        };

        Ok(Some(SpkSegment {
            summary,
            data,
            to_j2000,
        }))
    }

    pub fn target(&self) -> i32 {
        self.summary.target
    }

    pub fn center(&self) -> i32 {
        self.summary.center
    }

    pub fn covers(&self, et_seconds: f64) -> bool {
        self.summary.covers(et_seconds)
    }

    /// Position of the target relative to the center, km, J2000.
    pub fn position(&self, et_seconds: f64) -> Vector3<f64> {
        let native = match &self.data {
            SegmentData::Chebyshev { directory, records } => {
                records[directory.record_index(et_seconds)].interpolate(et_seconds)
            }
            SegmentData::Hermite(segment) => segment.interpolate(et_seconds),
        };
        self.to_j2000 * native
    }
}

/// Rotation from a NAIF inertial frame to J2000, for the frames this crate handles.
pub fn frame_to_j2000(frame_id: i32) -> Option<Matrix3<f64>> {
    match frame_id {
        FRAME_J2000 => Some(Matrix3::identity()),
        FRAME_ECLIPJ2000 => Some(
            Rotation3::from_axis_angle(&Vector3::x_axis(), OBLIQUITY_J2000).into_inner(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod test_segment {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(frame_id: i32, data_type: i32) -> Summary {
        Summary {
            start_epoch: 0.0,
            end_epoch: 200.0,
            target: -61,
            center: 599,
            frame_id,
            data_type,
            initial_addr: 1,
            final_addr: 14,
        }
    }

    /// Two constant type 2 records followed by the directory.
    fn type2_words() -> Vec<f64> {
        vec![
            50.0, 50.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0, // record 0
            150.0, 50.0, 4.0, 0.0, 5.0, 0.0, 6.0, 0.0, // record 1
            0.0, 100.0, 8.0, 2.0, // directory
        ]
    }

    #[test]
    fn test_type2_segment() {
        let segment = SpkSegment::decode(summary(FRAME_J2000, 2), &type2_words())
            .unwrap()
            .unwrap();
        assert_eq!(segment.position(10.0), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(segment.position(150.0), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(segment.position(200.0), Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_ecliptic_segment_rotated() {
        let segment = SpkSegment::decode(summary(FRAME_ECLIPJ2000, 2), &type2_words())
            .unwrap()
            .unwrap();
        let p = segment.position(10.0);
        let (s, c) = OBLIQUITY_J2000.sin_cos();
        assert_relative_eq!(p, Vector3::new(1.0, 2.0 * c - 3.0 * s, 2.0 * s + 3.0 * c), epsilon = 1e-12);
    }

    #[test]
    fn test_unsupported_segments_are_skipped() {
        assert!(SpkSegment::decode(summary(FRAME_J2000, 1), &type2_words())
            .unwrap()
            .is_none());
        assert!(SpkSegment::decode(summary(-82000, 2), &type2_words())
            .unwrap()
            .is_none());
    }
}
