#![allow(dead_code)]

use std::{fs::File, io::Write};

use camino::{Utf8Path, Utf8PathBuf};

const RECORD_BYTES: usize = 1024;
const WORDS_PER_RECORD: usize = 128;
/// Five-word summaries after the three control words.
const SUMMARIES_PER_RECORD: usize = 25;

/// One type 2 segment: a single Chebyshev record over `[start, end]` whose
/// position is `origin + velocity · (et - mid)`, exactly representable with two
/// coefficients per axis.
#[derive(Debug, Clone)]
pub struct LinearSegment {
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub start: f64,
    pub end: f64,
    /// Position at the middle of the segment, km.
    pub origin: [f64; 3],
    /// km/s
    pub velocity: [f64; 3],
}

impl LinearSegment {
    pub fn fixed(target: i32, center: i32, start: f64, end: f64, origin: [f64; 3]) -> Self {
        LinearSegment {
            target,
            center,
            frame: 1,
            start,
            end,
            origin,
            velocity: [0.0; 3],
        }
    }

    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Expected position at `et`.
    pub fn position(&self, et: f64) -> [f64; 3] {
        let dt = et - self.mid();
        [
            self.origin[0] + self.velocity[0] * dt,
            self.origin[1] + self.velocity[1] * dt,
            self.origin[2] + self.velocity[2] * dt,
        ]
    }

    fn words(&self) -> Vec<f64> {
        let radius = (self.end - self.start) / 2.0;
        let mut words = vec![self.mid(), radius];
        for axis in 0..3 {
            words.push(self.origin[axis]);
            words.push(self.velocity[axis] * radius);
        }
        // directory: init, intlen, rsize, n
        words.extend_from_slice(&[self.start, self.end - self.start, 8.0, 1.0]);
        words
    }
}

fn pack_i32_pair(a: i32, b: i32) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&a.to_le_bytes());
    bytes[4..].copy_from_slice(&b.to_le_bytes());
    bytes
}

/// Write a little-endian DAF/SPK file holding `segments` in a single summary record.
pub fn write_spk(path: &Utf8Path, segments: &[LinearSegment]) {
    write_spk_records(path, segments, SUMMARIES_PER_RECORD);
}

/// Write a DAF/SPK file whose summaries are spread over linked summary records
/// of at most `per_record` entries, each followed by its name record.
pub fn write_spk_records(path: &Utf8Path, segments: &[LinearSegment], per_record: usize) {
    assert!((1..=SUMMARIES_PER_RECORD).contains(&per_record));
    let groups: Vec<&[LinearSegment]> = segments.chunks(per_record).collect();
    let n_records = groups.len().max(1);
    // summary record k is record 2 + 2k, its name record follows
    let summary_record_number = |k: usize| 2 + 2 * k;
    let first_data_record = summary_record_number(n_records);
    let first_word = (first_data_record - 1) * WORDS_PER_RECORD + 1;

    let mut data: Vec<f64> = Vec::new();
    let mut summary_records = Vec::with_capacity(n_records);
    for k in 0..n_records {
        let group = groups.get(k).copied().unwrap_or(&[]);
        let next = if k + 1 < n_records { summary_record_number(k + 1) } else { 0 };
        let prev = if k > 0 { summary_record_number(k - 1) } else { 0 };

        let mut record = Vec::with_capacity(RECORD_BYTES);
        record.extend_from_slice(&(next as f64).to_le_bytes());
        record.extend_from_slice(&(prev as f64).to_le_bytes());
        record.extend_from_slice(&(group.len() as f64).to_le_bytes());
        for segment in group {
            let words = segment.words();
            let initial = first_word + data.len();
            let last = initial + words.len() - 1;
            data.extend_from_slice(&words);

            record.extend_from_slice(&segment.start.to_le_bytes());
            record.extend_from_slice(&segment.end.to_le_bytes());
            record.extend_from_slice(&pack_i32_pair(segment.target, segment.center));
            record.extend_from_slice(&pack_i32_pair(segment.frame, 2));
            record.extend_from_slice(&pack_i32_pair(initial as i32, last as i32));
        }
        record.resize(RECORD_BYTES, 0);
        summary_records.push(record);
    }
    let free = first_word + data.len();

    // file record
    let mut file_record = Vec::with_capacity(RECORD_BYTES);
    file_record.extend_from_slice(b"DAF/SPK ");
    file_record.extend_from_slice(&2i32.to_le_bytes());
    file_record.extend_from_slice(&6i32.to_le_bytes());
    let mut name = [b' '; 60];
    name[..13].copy_from_slice(b"SYNTHETIC SPK");
    file_record.extend_from_slice(&name);
    file_record.extend_from_slice(&(summary_record_number(0) as i32).to_le_bytes());
    file_record.extend_from_slice(&(summary_record_number(n_records - 1) as i32).to_le_bytes());
    file_record.extend_from_slice(&(free as i32).to_le_bytes());
    file_record.extend_from_slice(b"LTL-IEEE");
    file_record.resize(RECORD_BYTES, 0);

    let mut bytes = file_record;
    for record in &summary_records {
        bytes.extend_from_slice(record);
        bytes.extend_from_slice(&[b' '; RECORD_BYTES]);
    }
    for word in &data {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    let padded = bytes.len().div_ceil(RECORD_BYTES) * RECORD_BYTES;
    bytes.resize(padded, 0);

    File::create(path).unwrap().write_all(&bytes).unwrap();
}

/// Write `lines` to `dir/name` and return the path.
pub fn write_text(dir: &tempfile::TempDir, name: &str, lines: &[String]) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
    let mut file = File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

pub fn utf8_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}
