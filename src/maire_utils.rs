use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Type alias for a line reader over either a plain or a gzip compressed file.
pub type LineReader = Box<dyn BufRead>;

pub(crate) const VALIDSTRANDS: [&str; 4] = ["+", "-", "1", "-1"];

/// The columns every annotation table must carry, in the order they are written.
pub static ANNOTATIONCOLUMNS: [&str; 9] = [
    "seqname",
    "feature_type",
    "start",
    "end",
    "strand",
    "gene_id",
    "gene_name",
    "transcript_id",
    "transcript_type",
];

pub(crate) const UNKNOWN_BIOTYPE: &str = "Unknown";
pub(crate) const UNKNOWN_GENE: &str = "Unknown Gene";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// Represents the genomic strand of a transcript.
///
/// The strand determines the transcription direction, and therefore which way the
/// directional arrows of a track point.
///
/// # Variants
///
/// * `Forward` - the `+` strand. Arrows point to the right.
/// * `Reverse` - the `-` strand. Arrows point to the left.
///
/// # Examples
///
/// ```rust
/// use maire::maire_utils::Strand;
/// let s: Strand = "-".parse().unwrap();
/// assert_eq!(s, Strand::Reverse);
/// assert_eq!(s.to_string(), "-");
/// ```
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Returns the sign applied to the arrow tail offset of this strand.
    ///
    /// A forward arrow has its tail on the left of the anchor (negative offset) so the
    /// head points right; a reverse arrow has the opposite.
    pub fn tail_sign(&self) -> i64 {
        match self {
            Strand::Forward => -1,
            Strand::Reverse => 1,
        }
    }

    /// Maps the numeric strand encoding used by gene records (`1` / anything else)
    /// onto a [Strand].
    pub fn from_numeric(v: i64) -> Strand {
        if v == 1 {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = anyhow::Error;

    /// Converts from a [&str] to a [Strand]. Accepts `+`/`-` and the numeric
    /// `1`/`-1` encoding; anything else is an error.
    fn from_str(s: &str) -> anyhow::Result<Strand> {
        let st = match s.trim() {
            "+" | "1" => Strand::Forward,
            "-" | "-1" => Strand::Reverse,
            _ => anyhow::bail!(
                "Cannot parse the strand {:?}; expected one of {:?}.",
                s,
                VALIDSTRANDS
            ),
        };
        Ok(st)
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// Checks the first two bytes of `reader` for the gzip magic number without consuming
/// them. The reader must not have been read from yet.
///
/// Returns [Ok]`(true)` for a gzipped stream, [Ok]`(false)` otherwise, and the underlying
/// [std::io::Error] if the buffer cannot be filled.
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    Ok(src.get(..2) == Some(&GZIP_MAGIC_NUMBER))
}

/// Opens `file_path` for line-oriented reading, transparently decompressing it when the
/// gzip magic bytes are found.
///
/// It returns [Ok]`(`[LineReader]`)` on success and an [anyhow::Error] if the file cannot
/// be opened or its first bytes cannot be read.
pub fn open_line_reader<T: AsRef<Path>>(file_path: T) -> anyhow::Result<LineReader> {
    let file = File::open(file_path.as_ref())?;
    let mut inner_rdr = BufReader::new(file);
    if is_gzipped(&mut inner_rdr)? {
        info!("auto-detected gzipped file - reading via decompression");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr))))
    } else {
        Ok(Box::new(inner_rdr))
    }
}

/// Formats an integer with `,` as the thousands separator, e.g. `1234567` becomes
/// `1,234,567`. Used for every coordinate shown in a tooltip.
pub fn format_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounds `v` to `digits` decimal places.
pub fn round_to(v: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}
