use std::fmt;

/// SPK segment data types this crate knows how to evaluate.
///
/// Every other type code is kept as [`SpkDataType::Unsupported`] so that the
/// summary can still be displayed and the segment skipped with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpkDataType {
    ChebyshevPositionOnly,
    ChebyshevPositionVelocity,
    HermiteNonUniform,
    Unsupported(i32),
}

impl SpkDataType {
    pub fn to_i32(self) -> i32 {
        match self {
            SpkDataType::ChebyshevPositionOnly => 2,
            SpkDataType::ChebyshevPositionVelocity => 3,
            SpkDataType::HermiteNonUniform => 13,
            SpkDataType::Unsupported(code) => code,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, SpkDataType::Unsupported(_))
    }
}

impl From<i32> for SpkDataType {
    fn from(value: i32) -> Self {
        match value {
            2 => SpkDataType::ChebyshevPositionOnly,
            3 => SpkDataType::ChebyshevPositionVelocity,
            13 => SpkDataType::HermiteNonUniform,
            other => SpkDataType::Unsupported(other),
        }
    }
}

impl fmt::Display for SpkDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpkDataType::ChebyshevPositionOnly => write!(f, "Chebyshev Position Only"),
            SpkDataType::ChebyshevPositionVelocity => write!(f, "Chebyshev Position and Velocity"),
            SpkDataType::HermiteNonUniform => {
                write!(f, "Hermite Interpolation (Unequal Time Steps)")
            }
            SpkDataType::Unsupported(code) => write!(f, "Unsupported SPK type {code}"),
        }
    }
}
