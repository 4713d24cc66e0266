//! Loader and evaluator for a set of NAIF SPK kernels.
//!
//! This module ties together the DAF file record, the linked list of summary
//! records, and the per-type segment decoders into a [`KernelPool`] that answers
//! "where is body A relative to body B at this epoch".
//!
//! # What this module does
//! 1. Reads the **DAF file record** of each kernel and checks it describes a
//!    little-endian SPK.
//! 2. Walks the **summary records**, from `fward` along the `next` pointers.
//! 3. Reads the words of each segment and decodes types 2, 3 and 13 in the J2000
//!    or ECLIPJ2000 frame. Other segments are skipped with a warning.
//! 4. Indexes segments by target body. Segments loaded later take precedence
//!    over earlier ones, as in the SPICE kernel pool.
//!
//! # Units & time scales
//! * Times are **ET/TDB seconds from J2000**.
//! * Positions are **kilometers**, expressed in J2000.
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use nalgebra::Vector3;

use crate::{boundary_errors::BoundaryError, constants::NAIF_SSB};

use super::{
    daf_header::{DAFHeader, DAF_RECORD_BYTES},
    metakernel::MetaKernel,
    segment::SpkSegment,
    summary_record::{parse_summary_control, Summary},
};

/// Upper bound on the number of summary records followed in one file.
const MAX_SUMMARY_RECORDS: usize = 100_000;

/// In-memory bundle of loaded SPK segments.
///
/// See also
/// ------------
/// * [`KernelPool::load`] – Build the pool from SPK files.
/// * [`KernelPool::from_metakernels`] – Build the pool from SPICE meta-kernels.
/// * [`KernelPool::furnish`] – Add SPK files on top of a pool.
/// * [`KernelPool::position`] – Relative position of two bodies.
#[derive(Debug, Clone, Default)]
pub struct KernelPool {
    kernels: Vec<Utf8PathBuf>,
    // target -> segments in load order
    segments: HashMap<i32, Vec<SpkSegment>>,
}

impl KernelPool {
    /// Load every SPK kernel in `paths`, in order.
    ///
    /// Arguments
    /// -----------------
    /// * `paths`: SPK files. Later files take precedence where coverage overlaps.
    ///
    /// Return
    /// ----------
    /// * The pool, or the first I/O or format error encountered.
    pub fn load<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self, BoundaryError> {
        let mut pool = KernelPool::default();
        pool.furnish(paths)?;
        Ok(pool)
    }

    /// Add SPK kernels to the pool. Their segments take precedence over the ones
    /// already loaded.
    pub fn furnish<P: AsRef<Utf8Path>>(&mut self, paths: &[P]) -> Result<(), BoundaryError> {
        for path in paths {
            self.load_spk(path.as_ref())?;
        }
        Ok(())
    }

    /// Load the kernels listed by a SPICE text meta-kernel.
    ///
    /// See also
    /// ------------
    /// * [`KernelPool::from_metakernels`] – Several meta-kernels, in order.
    pub fn from_metakernel(path: &Utf8Path) -> Result<Self, BoundaryError> {
        Self::from_metakernels(&[path])
    }

    /// Load the kernels listed by each meta-kernel of `paths`, in order.
    ///
    /// Files in `KERNELS_TO_LOAD` whose first bytes are not a DAF/SPK id word
    /// (leap-seconds, frames, planetary constants) are skipped: the pool only
    /// needs trajectories, time conversions are handled by `hifitime`.
    ///
    /// Arguments
    /// -----------------
    /// * `paths`: meta-kernels, typically the planetary one then the spacecraft one.
    ///   Kernels of later meta-kernels take precedence.
    pub fn from_metakernels<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self, BoundaryError> {
        let mut pool = KernelPool::default();
        for path in paths {
            let metakernel = MetaKernel::from_file(path.as_ref())?;
            for kernel in metakernel.kernels()? {
                if is_spk_file(&kernel)? {
                    pool.load_spk(&kernel)?;
                } else {
                    debug!("Skipping non-SPK kernel {kernel}");
                }
            }
        }
        Ok(pool)
    }

    /// Files loaded so far, in load order.
    pub fn kernels(&self) -> &[Utf8PathBuf] {
        &self.kernels
    }

    /// Number of usable segments in the pool.
    pub fn segment_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }

    fn load_spk(&mut self, path: &Utf8Path) -> Result<(), BoundaryError> {
        let mut file = BufReader::new(File::open(path)?);

        let mut record = [0u8; DAF_RECORD_BYTES];
        file.read_exact(&mut record)?;
        let (_, header) = DAFHeader::parse(&record)
            .map_err(|e| BoundaryError::NomParsingError(format!("{path}: {e}")))?;
        header.check_spk()?;
        debug!("{path}: {header}");

        let summaries = read_summaries(&mut file, &header, path)?;
        let mut loaded = 0usize;

        for summary in summaries {
            let words = read_words(&mut file, summary.initial_addr, summary.word_count())?;
            match SpkSegment::decode(summary.clone(), &words)? {
                Some(segment) => {
                    self.segments
                        .entry(segment.target())
                        .or_default()
                        .push(segment);
                    loaded += 1;
                }
                None => warn!("{path}: skipping segment, {summary}"),
            }
        }

        debug!("Loaded {loaded} SPK segments from {path}");
        self.kernels.push(path.to_owned());
        Ok(())
    }

    /// Position of `target` relative to the solar system barycenter, km, J2000.
    ///
    /// The chain of segments is followed from `target` through its successive
    /// centers until the barycenter is reached.
    pub fn position_wrt_ssb(&self, target: i32, et_seconds: f64) -> Result<Vector3<f64>, BoundaryError> {
        let mut position = Vector3::zeros();
        let mut body = target;

        // a chain longer than the number of bodies would loop
        for _ in 0..=self.segments.len() {
            if body == NAIF_SSB {
                return Ok(position);
            }
            let segment = self.segment_for(body, et_seconds).ok_or(
                BoundaryError::NoEphemerisCoverage {
                    target,
                    center: NAIF_SSB,
                    et_seconds,
                },
            )?;
            position += segment.position(et_seconds);
            body = segment.center();
        }

        Err(BoundaryError::NoEphemerisCoverage {
            target,
            center: NAIF_SSB,
            et_seconds,
        })
    }

    /// Position of `target` relative to `center`, km, J2000.
    ///
    /// Arguments
    /// -----------------
    /// * `target`, `center`: NAIF body ids.
    /// * `et_seconds`: Epoch in **ET seconds from J2000**.
    ///
    /// Return
    /// ----------
    /// * The relative position, or [`BoundaryError::NoEphemerisCoverage`] naming the
    ///   pair if either body cannot be chained to the barycenter at that epoch.
    pub fn position(
        &self,
        target: i32,
        center: i32,
        et_seconds: f64,
    ) -> Result<Vector3<f64>, BoundaryError> {
        // direct segment first, it avoids summing large barycentric vectors
        if let Some(segment) = self.segment_for(target, et_seconds) {
            if segment.center() == center {
                return Ok(segment.position(et_seconds));
            }
        }

        let missing = |_| BoundaryError::NoEphemerisCoverage {
            target,
            center,
            et_seconds,
        };
        let target_ssb = self.position_wrt_ssb(target, et_seconds).map_err(missing)?;
        let center_ssb = self.position_wrt_ssb(center, et_seconds).map_err(missing)?;
        Ok(target_ssb - center_ssb)
    }

    /// Highest-priority segment of `body` covering `et_seconds`.
    fn segment_for(&self, body: i32, et_seconds: f64) -> Option<&SpkSegment> {
        self.segments
            .get(&body)?
            .iter()
            .rev()
            .find(|segment| segment.covers(et_seconds))
    }
}

/// `true` if the file starts with the `DAF/SPK` id word.
fn is_spk_file(path: &Utf8Path) -> Result<bool, BoundaryError> {
    let mut id_word = [0u8; 8];
    let mut file = File::open(path)?;
    match file.read_exact(&mut id_word) {
        Ok(()) => Ok(id_word.starts_with(b"DAF/SPK")),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Follow the summary-record list of a DAF and collect every segment descriptor.
fn read_summaries<R: Read + Seek>(
    file: &mut R,
    header: &DAFHeader,
    path: &Utf8Path,
) -> Result<Vec<Summary>, BoundaryError> {
    let summary_bytes = header.summary_words() * 8;
    let mut summaries = Vec::new();
    let mut record_number = header.fward as usize;
    let mut record = [0u8; DAF_RECORD_BYTES];

    for _ in 0..MAX_SUMMARY_RECORDS {
        if record_number == 0 {
            return Ok(summaries);
        }

        file.seek(SeekFrom::Start(((record_number - 1) * DAF_RECORD_BYTES) as u64))?;
        file.read_exact(&mut record)?;

        let (_, (next, _prev, nsum)) = parse_summary_control(&record)
            .map_err(|e| BoundaryError::NomParsingError(format!("{path}: {e}")))?;
        if nsum > (DAF_RECORD_BYTES - 24) / summary_bytes {
            return Err(BoundaryError::InvalidDafFile(format!(
                "{path}: summary record #{record_number} announces {nsum} summaries"
            )));
        }

        for i in 0..nsum {
            let start = 24 + i * summary_bytes;
            let (_, summary) = Summary::parse(&record[start..start + summary_bytes])
                .map_err(|e| BoundaryError::NomParsingError(format!("{path}: {e}")))?;
            summaries.push(summary);
        }

        record_number = next;
    }

    Err(BoundaryError::InvalidDafFile(format!(
        "{path}: summary record list does not terminate"
    )))
}

/// Read `count` little-endian doubles starting at the 1-based word address `initial_addr`.
fn read_words<R: Read + Seek>(
    file: &mut R,
    initial_addr: i32,
    count: usize,
) -> Result<Vec<f64>, BoundaryError> {
    if initial_addr < 1 {
        return Err(BoundaryError::InvalidDafFile(format!(
            "segment starts at invalid address {initial_addr}"
        )));
    }
    file.seek(SeekFrom::Start((initial_addr as u64 - 1) * 8))?;

    let mut bytes = vec![0u8; count * 8];
    file.read_exact(&mut bytes)?;

    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            f64::from_le_bytes(word)
        })
        .collect())
}
