use crate::maire_utils::Strand;
use anyhow::bail;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// A genomic interval `(start, end)` of a transcript feature.
///
/// Coordinates follow whatever convention the source uses (0-based half-open for UCSC
/// tables, 1-based inclusive for GTF); the layout code only requires them to be
/// consistent within one figure. Intervals are not validated: `start > end` is carried
/// through unchanged.
pub struct FeatureInterval {
    pub start: i64,
    pub end: i64,
}

impl FeatureInterval {
    pub fn new(start: i64, end: i64) -> FeatureInterval {
        FeatureInterval { start, end }
    }

    /// `end - start`, as displayed in the feature tooltips.
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) as f64 / 2.0
    }
}

impl From<(i64, i64)> for FeatureInterval {
    fn from(v: (i64, i64)) -> FeatureInterval {
        FeatureInterval::new(v.0, v.1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// The two kinds of sub-features drawn on a transcript track.
pub enum FeatureKind {
    CodingExon,
    Utr,
}

impl FeatureKind {
    /// The label shown in tooltips.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKind::CodingExon => "Coding Exon",
            FeatureKind::Utr => "UTR",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A spliced transcript of a gene, with the sub-features needed to draw its track.
///
/// # Fields
///
/// * `id`: the transcript identifier, e.g. `ENST00000473358`.
/// * `gene_symbol`: the symbol of the parent gene. The first transcript's symbol becomes
///   the figure title.
/// * `biotype`: a free-form biotype label such as `protein_coding`.
/// * `strand`: the transcription direction.
/// * `coding_exons`: coding sub-intervals of the exons, in source order.
/// * `utrs`: untranslated regions, in source order.
/// * `start` / `end`: the transcript span, expected to cover every feature.
///
/// # Examples
///
/// ```rust
/// use maire::maire_utils::Strand;
/// use maire::transcript::Transcript;
/// let t = Transcript::new("t1", "ACTA1", "protein_coding", Strand::Forward, 1000, 5000)
///     .with_coding_exons([(1200, 1800)])
///     .with_utrs([(1000, 1200)]);
/// assert!(t.is_drawable());
/// assert_eq!(t.length(), 4000);
/// ```
pub struct Transcript {
    pub id: String,
    pub gene_symbol: String,
    pub biotype: String,
    pub strand: Strand,
    pub coding_exons: Vec<FeatureInterval>,
    pub utrs: Vec<FeatureInterval>,
    pub start: i64,
    pub end: i64,
}

impl Transcript {
    pub fn new<S: Into<String>>(
        id: S,
        gene_symbol: S,
        biotype: S,
        strand: Strand,
        start: i64,
        end: i64,
    ) -> Transcript {
        Transcript {
            id: id.into(),
            gene_symbol: gene_symbol.into(),
            biotype: biotype.into(),
            strand,
            coding_exons: Vec::new(),
            utrs: Vec::new(),
            start,
            end,
        }
    }

    pub fn with_coding_exons<I: IntoIterator<Item = (i64, i64)>>(mut self, exons: I) -> Transcript {
        self.coding_exons
            .extend(exons.into_iter().map(FeatureInterval::from));
        self
    }

    pub fn with_utrs<I: IntoIterator<Item = (i64, i64)>>(mut self, utrs: I) -> Transcript {
        self.utrs.extend(utrs.into_iter().map(FeatureInterval::from));
        self
    }

    /// The raw intervals of one feature kind.
    pub fn features(&self, kind: FeatureKind) -> &[FeatureInterval] {
        match kind {
            FeatureKind::CodingExon => &self.coding_exons,
            FeatureKind::Utr => &self.utrs,
        }
    }

    /// A transcript with neither coding exons nor UTRs carries nothing to draw.
    pub fn is_drawable(&self) -> bool {
        !(self.coding_exons.is_empty() && self.utrs.is_empty())
    }

    pub fn length(&self) -> i64 {
        self.end - self.start
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One editing-level measurement: the fraction of edited reads at a genomic position in
/// one tissue.
pub struct MeasurementPoint {
    pub position: i64,
    pub value: f64,
    pub tissue_label: String,
}

impl MeasurementPoint {
    pub fn new<S: Into<String>>(position: i64, value: f64, tissue_label: S) -> MeasurementPoint {
        MeasurementPoint {
            position,
            value,
            tissue_label: tissue_label.into(),
        }
    }
}

#[derive(Clone, Debug)]
/// A transcript described by blocks, the way BED12 and UCSC `knownGene` rows do.
///
/// Exons are given as `block_sizes` and `block_starts` relative to `chrom_start`; the coding
/// region is `[thick_start, thick_end]`. [BlockTranscript::into_transcript] splits every
/// exon into its coding part and its untranslated flanks.
///
/// # Fields
///
/// * `chrom_start` / `chrom_end`: the transcript span.
/// * `block_sizes` / `block_starts`: exon lengths and exon offsets from `chrom_start`.
/// * `thick_start` / `thick_end`: bounds of the coding sequence. A transcript with
///   `thick_start >= thick_end` is non-coding and all of its exons become UTRs.
pub struct BlockTranscript {
    pub id: String,
    pub gene_symbol: String,
    pub biotype: String,
    pub strand: Strand,
    pub chrom_start: i64,
    pub chrom_end: i64,
    pub block_sizes: Vec<i64>,
    pub block_starts: Vec<i64>,
    pub thick_start: i64,
    pub thick_end: i64,
}

impl BlockTranscript {
    /// Returns `true` if `[chrom_start, chrom_end]` intersects the inclusive window
    /// `[start, end]`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        !(self.chrom_start > end || self.chrom_end < start)
    }

    /// Absolute exon coordinates.
    pub fn exons(&self) -> anyhow::Result<Vec<FeatureInterval>> {
        if self.block_sizes.len() != self.block_starts.len() {
            bail!(
                "Transcript {} has {} block sizes but {} block starts.",
                self.id,
                self.block_sizes.len(),
                self.block_starts.len()
            )
        }
        Ok(self
            .block_starts
            .iter()
            .zip(self.block_sizes.iter())
            .map(|(s, size)| {
                let start = self.chrom_start + s;
                FeatureInterval::new(start, start + size)
            })
            .collect())
    }

    /// Derives coding exons and UTRs from the blocks and the thick region.
    ///
    /// ### Returns
    ///
    /// Returns an [`anyhow::Result<Transcript>`], which is an error only if the block size
    /// and block start lists differ in length.
    pub fn into_transcript(self) -> anyhow::Result<Transcript> {
        let exons = self.exons()?;
        let (cds_start, cds_end) = (self.thick_start, self.thick_end);
        let non_coding = cds_start >= cds_end;

        let mut coding = Vec::new();
        let mut utrs = Vec::new();
        for ex in exons {
            if non_coding || ex.end <= cds_start || ex.start >= cds_end {
                utrs.push(ex);
                continue;
            }
            if ex.start < cds_start {
                utrs.push(FeatureInterval::new(ex.start, cds_start));
            }
            if ex.end > cds_end {
                utrs.push(FeatureInterval::new(cds_end, ex.end));
            }
            coding.push(FeatureInterval::new(
                ex.start.max(cds_start),
                ex.end.min(cds_end),
            ));
        }

        Ok(Transcript {
            id: self.id,
            gene_symbol: self.gene_symbol,
            biotype: self.biotype,
            strand: self.strand,
            coding_exons: coding,
            utrs,
            start: self.chrom_start,
            end: self.chrom_end,
        })
    }
}

/// Converts the block transcripts that intersect the gene window `[start, end]`, in input
/// order. Blocks entirely outside the window are dropped before conversion.
///
/// ### Returns
///
/// Returns an [`anyhow::Result<Vec<Transcript>>`], failing on the first kept block whose
/// size and start lists differ in length.
pub fn block_transcripts_in_window<I>(blocks: I, start: i64, end: i64) -> anyhow::Result<Vec<Transcript>>
where
    I: IntoIterator<Item = BlockTranscript>,
{
    blocks
        .into_iter()
        .filter(|b| b.overlaps(start, end))
        .map(BlockTranscript::into_transcript)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(thick_start: i64, thick_end: i64) -> BlockTranscript {
        BlockTranscript {
            id: String::from("uc001aaa.3"),
            gene_symbol: String::from("DDX11L1"),
            biotype: String::from("protein_coding"),
            strand: Strand::Forward,
            chrom_start: 1000,
            chrom_end: 2000,
            block_sizes: vec![100, 200, 300],
            block_starts: vec![0, 300, 700],
            thick_start,
            thick_end,
        }
    }

    #[test]
    fn test_block_transcript_split() {
        // exons: 1000-1100, 1300-1500, 1700-2000; CDS 1050-1800
        let t = block(1050, 1800).into_transcript().unwrap();
        assert_eq!(
            t.coding_exons,
            vec![
                FeatureInterval::new(1050, 1100),
                FeatureInterval::new(1300, 1500),
                FeatureInterval::new(1700, 1800)
            ]
        );
        assert_eq!(
            t.utrs,
            vec![
                FeatureInterval::new(1000, 1050),
                FeatureInterval::new(1800, 2000)
            ]
        );
        assert_eq!((t.start, t.end), (1000, 2000));
    }

    #[test]
    fn test_block_transcript_non_coding() {
        let t = block(2000, 2000).into_transcript().unwrap();
        assert!(t.coding_exons.is_empty());
        assert_eq!(t.utrs.len(), 3);
    }

    #[test]
    fn test_block_transcript_mismatched_blocks() {
        let mut b = block(1050, 1800);
        b.block_starts.pop();
        assert!(b.into_transcript().is_err());
    }

    #[test]
    fn test_block_window_filter() {
        // span 1000-2000
        let b = block(1050, 1800);
        assert!(b.overlaps(2000, 3000));
        assert!(b.overlaps(0, 1000));
        assert!(!b.overlaps(2001, 3000));
        assert!(!b.overlaps(0, 999));

        let mut far = block(1050, 1800);
        far.id = String::from("uc001far.1");
        far.chrom_start = 50_000;
        far.chrom_end = 51_000;
        let kept = block_transcripts_in_window(vec![b, far], 1500, 5000).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "uc001aaa.3");
        assert_eq!(kept[0].coding_exons.len(), 3);
    }

    #[test]
    fn test_block_window_skips_bad_blocks_outside() {
        let mut bad = block(1050, 1800);
        bad.block_starts.pop();
        assert!(block_transcripts_in_window(vec![bad.clone()], 10_000, 20_000)
            .unwrap()
            .is_empty());
        assert!(block_transcripts_in_window(vec![bad], 1000, 2000).is_err());
    }

    #[test]
    fn test_transcript_helpers() {
        let t = Transcript::new("t1", "g", "lncRNA", Strand::Reverse, 100, 500);
        assert!(!t.is_drawable());
        let t = t.with_utrs([(100, 150)]);
        assert!(t.is_drawable());
        assert_eq!(t.features(FeatureKind::Utr)[0].len(), 50);
        assert_eq!(FeatureKind::CodingExon.to_string(), "Coding Exon");
    }
}
