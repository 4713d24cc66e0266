//! File record of a NAIF DAF (Double precision Array File).
//!
//! The first 1024 bytes of an SPK kernel describe how the rest of the file is
//! laid out: the summary shape (`ND` doubles and `NI` integers per segment
//! descriptor, always 2 and 6 for SPK), the record numbers where the linked
//! list of summary records starts and ends, the first unused word address
//! and the binary format tag.
//!
//! Only `"LTL-IEEE"` kernels are decoded; [`DAFHeader::check_spk`] rejects the rest.
//! Every kernel NAIF distributes today for Juno and the planets is little-endian.

use std::fmt;

use nom::{bytes::complete::take, number::complete::le_i32, IResult};

use crate::boundary_errors::BoundaryError;

/// Size of one DAF physical record in bytes.
pub const DAF_RECORD_BYTES: usize = 1024;

/// Decoded DAF/SPK file record.
#[derive(Debug, PartialEq, Clone)]
pub struct DAFHeader {
    /// Format identifier without padding, `"DAF/SPK"` for SPK kernels.
    pub idword: String,
    pub internal_filename: String,
    /// Doubles per segment descriptor.
    pub nd: i32,
    /// Integers per segment descriptor.
    pub ni: i32,
    /// First summary record, 1-based.
    pub fward: i32,
    /// Last summary record, 1-based.
    pub bward: i32,
    /// First unused word address, 1-based.
    pub free: i32,
    /// `"LTL-IEEE"` or `"BIG-IEEE"`.
    pub locfmt: String,
}

/// Padded ASCII field of the file record.
fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

impl DAFHeader {
    /// Parse the file record into a [`DAFHeader`].
    ///
    /// Arguments
    /// -----------------
    /// * `input`: bytes from the start of the kernel, at least 96 bytes long.
    ///
    /// Return
    /// ----------
    /// * `(remaining, header)`; the reserved area and the FTP validation
    ///   string following `locfmt` are left in `remaining`.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, idword) = take(8usize)(input)?;
        let (input, nd) = le_i32(input)?;
        let (input, ni) = le_i32(input)?;
        let (input, name) = take(60usize)(input)?;
        let (input, fward) = le_i32(input)?;
        let (input, bward) = le_i32(input)?;
        let (input, free) = le_i32(input)?;
        let (input, locfmt) = take(8usize)(input)?;
        let header = DAFHeader {
            idword: text(idword),
            internal_filename: text(name),
            nd,
            ni,
            fward,
            bward,
            free,
            locfmt: text(locfmt),
        };
        Ok((input, header))
    }

    /// Validate that this header describes a little-endian SPK kernel with the
    /// standard `ND = 2`, `NI = 6` summary layout.
    pub fn check_spk(&self) -> Result<(), BoundaryError> {
        if self.idword != "DAF/SPK" {
            return Err(BoundaryError::InvalidDafFile(format!(
                "unexpected id word {:?}",
                self.idword
            )));
        }
        if self.locfmt != "LTL-IEEE" {
            return Err(BoundaryError::UnsupportedBinaryFormat(self.locfmt.clone()));
        }
        if self.nd != 2 || self.ni != 6 {
            return Err(BoundaryError::InvalidDafFile(format!(
                "SPK summaries must have ND=2, NI=6 (found ND={}, NI={})",
                self.nd, self.ni
            )));
        }
        if self.fward < 2 {
            return Err(BoundaryError::InvalidDafFile(format!(
                "invalid forward pointer {}",
                self.fward
            )));
        }
        Ok(())
    }

    /// Summary size in double-precision words: `ND + ceil(NI / 2)`.
    pub fn summary_words(&self) -> usize {
        self.nd as usize + (self.ni as usize).div_ceil(2)
    }
}

impl fmt::Display for DAFHeader {
    /// `DAF/SPK 'JUNOSPK' (LTL-IEEE, ND=2 NI=6, summary records 2..3)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}, ND={} NI={}, summary records {}..{})",
            self.idword, self.internal_filename, self.locfmt, self.nd, self.ni, self.fward, self.bward
        )
    }
}
