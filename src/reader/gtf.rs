use crate::maire_utils::{open_line_reader, Strand, ANNOTATIONCOLUMNS, UNKNOWN_BIOTYPE};
use crate::transcript::{FeatureInterval, FeatureKind, Transcript};
use anyhow::{bail, Context};
use lazy_static::lazy_static;
use noodles::gtf;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// What an annotation record contributes to a transcript.
///
/// # Variants
///
/// * `Span` - the `transcript` record, giving the transcript bounds.
/// * `Feature` - a coding exon (`CDS`) or an untranslated region (`UTR` and its
///   5'/3' spellings).
pub enum RecordRole {
    Span,
    Feature(FeatureKind),
}

lazy_static! {
    static ref RECORD_ROLES: HashMap<&'static str, RecordRole> = HashMap::from([
        ("transcript", RecordRole::Span),
        ("CDS", RecordRole::Feature(FeatureKind::CodingExon)),
        ("UTR", RecordRole::Feature(FeatureKind::Utr)),
        ("five_prime_utr", RecordRole::Feature(FeatureKind::Utr)),
        ("three_prime_utr", RecordRole::Feature(FeatureKind::Utr)),
        ("5UTR", RecordRole::Feature(FeatureKind::Utr)),
        ("3UTR", RecordRole::Feature(FeatureKind::Utr)),
    ]);
}

/// Returns the role of a GTF feature type, or `None` for records that are not drawn
/// (genes, plain exons, start/stop codons, ...).
pub fn record_role(feature_type: &str) -> Option<RecordRole> {
    RECORD_ROLES.get(feature_type).copied()
}

/// Column-wise buffer filled while parsing, turned into the table's [DataFrame] at the end.
struct GtfColumns {
    seqname: Vec<String>,
    feature_type: Vec<String>,
    start: Vec<i64>,
    end: Vec<i64>,
    strand: Vec<Option<String>>,
    gene_id: Vec<Option<String>>,
    gene_name: Vec<Option<String>>,
    transcript_id: Vec<Option<String>>,
    transcript_type: Vec<Option<String>>,
}

impl GtfColumns {
    fn with_capacity(n: usize) -> GtfColumns {
        GtfColumns {
            seqname: Vec::with_capacity(n),
            feature_type: Vec::with_capacity(n),
            start: Vec::with_capacity(n),
            end: Vec::with_capacity(n),
            strand: Vec::with_capacity(n),
            gene_id: Vec::with_capacity(n),
            gene_name: Vec::with_capacity(n),
            transcript_id: Vec::with_capacity(n),
            transcript_type: Vec::with_capacity(n),
        }
    }

    fn into_df(self) -> anyhow::Result<DataFrame> {
        let df = DataFrame::new(vec![
            Series::new("seqname", self.seqname),
            Series::new("feature_type", self.feature_type),
            Series::new("start", self.start),
            Series::new("end", self.end),
            Series::new("strand", self.strand),
            Series::new("gene_id", self.gene_id),
            Series::new("gene_name", self.gene_name),
            Series::new("transcript_id", self.transcript_id),
            Series::new("transcript_type", self.transcript_type),
        ])?;
        Ok(df)
    }
}

/// A transcript being collected from annotation rows.
struct PendingTranscript {
    id: String,
    gene_symbol: String,
    biotype: String,
    strand: Option<Strand>,
    span: Option<(i64, i64)>,
    coding_exons: Vec<FeatureInterval>,
    utrs: Vec<FeatureInterval>,
}

impl PendingTranscript {
    fn into_transcript(self, n_unknown_strand: &mut usize) -> Option<Transcript> {
        let (start, end) = match self.span {
            Some(span) => span,
            None => {
                let features = self.coding_exons.iter().chain(self.utrs.iter());
                let start = features.clone().map(|f| f.start).min()?;
                let end = features.map(|f| f.end).max()?;
                (start, end)
            }
        };
        let strand = self.strand.unwrap_or_else(|| {
            *n_unknown_strand += 1;
            Strand::Forward
        });
        Some(Transcript {
            id: self.id,
            gene_symbol: self.gene_symbol,
            biotype: self.biotype,
            strand,
            coding_exons: self.coding_exons,
            utrs: self.utrs,
            start,
            end,
        })
    }
}

#[derive(Clone, Debug)]
/// A gene annotation table holding the records needed to draw transcript tracks.
///
/// The table keeps one row per GTF record with the columns listed in
/// [ANNOTATIONCOLUMNS]: `seqname`, `feature_type`, `start`, `end`, `strand`, `gene_id`,
/// `gene_name`, `transcript_id` and `transcript_type`. Attribute columns may be null.
/// Coordinates are kept as written in the file (1-based, inclusive for GTF).
///
/// # Examples
///
/// ```rust,no_run
/// use maire::reader::gtf::AnnotationTable;
/// let table = AnnotationTable::from_gtf("genes.gtf.gz")?;
/// let transcripts = table.transcripts_for_gene("ACTA1")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct AnnotationTable {
    df: DataFrame,
}

impl AnnotationTable {
    /// Reads a GTF file, gzip compressed or not.
    ///
    /// ### Returns
    ///
    /// Returns an [`anyhow::Result<AnnotationTable>`]:
    /// * [Ok]`(AnnotationTable)`: one row per record of the file.
    /// * [Err]`(...)`: if the file cannot be opened or a record cannot be parsed.
    pub fn from_gtf<T: AsRef<Path>>(file_path: T) -> anyhow::Result<AnnotationTable> {
        let file_path = file_path.as_ref();
        let rdr = open_line_reader(file_path)
            .with_context(|| format!("Could not open the GTF file {:?}", file_path))?;
        AnnotationTable::from_gtf_reader(rdr)
            .with_context(|| format!("Failed parsing the GTF file {:?}", file_path))
    }

    /// Reads GTF records from any buffered reader.
    pub fn from_gtf_reader<R: BufRead>(inner: R) -> anyhow::Result<AnnotationTable> {
        let mut rdr = gtf::Reader::new(inner);
        let mut cols = GtfColumns::with_capacity(10_000);
        let mut n_comments = 0usize;
        let mut n_records = 0usize;

        for l in rdr.lines() {
            let line = l?;
            match line {
                gtf::Line::Record(r) => {
                    n_records += 1;
                    cols.seqname.push(r.reference_sequence_name().to_string());
                    cols.feature_type.push(r.ty().to_string());
                    cols.start.push(r.start().get() as i64);
                    cols.end.push(r.end().get() as i64);
                    cols.strand.push(r.strand().map(|st| st.as_ref().to_owned()));

                    let mut gene_id = None;
                    let mut gene_name = None;
                    let mut transcript_id = None;
                    let mut transcript_type = None;
                    let mut transcript_biotype = None;
                    for attr in r.attributes().iter() {
                        let value = Some(attr.value().to_string());
                        match attr.key().to_string().as_str() {
                            "gene_id" => gene_id = value,
                            "gene_name" => gene_name = value,
                            "transcript_id" => transcript_id = value,
                            "transcript_type" => transcript_type = value,
                            "transcript_biotype" => transcript_biotype = value,
                            _ => {}
                        }
                    }
                    cols.gene_id.push(gene_id);
                    cols.gene_name.push(gene_name);
                    cols.transcript_id.push(transcript_id);
                    cols.transcript_type.push(transcript_type.or(transcript_biotype));
                }
                gtf::Line::Comment(_) => {
                    n_comments += 1;
                    continue;
                }
            }
        }
        info!(
            "Finished parsing the input file. Found {} comments and {} records.",
            n_comments, n_records
        );

        AnnotationTable::from_df(cols.into_df()?)
    }

    /// Wraps an existing [DataFrame], checking that every column of [ANNOTATIONCOLUMNS]
    /// exists.
    pub fn from_df(df: DataFrame) -> anyhow::Result<AnnotationTable> {
        let missing: Vec<&str> = ANNOTATIONCOLUMNS
            .iter()
            .copied()
            .filter(|c| df.column(c).is_err())
            .collect();
        if !missing.is_empty() {
            bail!(
                "The annotation dataframe is missing the column(s) {:?}; cannot proceed.",
                missing
            )
        }
        Ok(AnnotationTable { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// The rows whose `gene_name` or `gene_id` equals `symbol`, in file order.
    pub fn gene_rows(&self, symbol: &str) -> anyhow::Result<DataFrame> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(
                col("gene_name")
                    .eq(lit(symbol))
                    .or(col("gene_id").eq(lit(symbol))),
            )
            .collect()?;
        Ok(df)
    }

    /// The chromosome and the inclusive extent of all records of a gene, if it exists.
    pub fn gene_locus(&self, symbol: &str) -> anyhow::Result<Option<(String, i64, i64)>> {
        let df = self.gene_rows(symbol)?;
        let seqname = match df.column("seqname")?.str()?.get(0) {
            Some(s) => s.to_string(),
            None => return Ok(None),
        };
        let start = df.column("start")?.i64()?.min();
        let end = df.column("end")?.i64()?.max();
        match (start, end) {
            (Some(s), Some(e)) => Ok(Some((seqname, s, e))),
            _ => Ok(None),
        }
    }

    /// Collects the transcripts of a gene.
    ///
    /// `transcript`, `CDS` and UTR records are grouped by `transcript_id`, keeping the
    /// order in which transcripts first appear. A transcript's bounds come from its
    /// `transcript` record, or from the extent of its features when that record is absent.
    /// Transcripts with features but no strand are drawn on the `+` strand.
    ///
    /// ### Returns
    ///
    /// Returns an [`anyhow::Result<Vec<Transcript>>`], empty if the gene is unknown.
    /// Transcripts without coding exons and UTRs are included; the layout skips them.
    pub fn transcripts_for_gene(&self, symbol: &str) -> anyhow::Result<Vec<Transcript>> {
        let df = self.gene_rows(symbol)?;
        let feature_type = df.column("feature_type")?.str()?;
        let start = df.column("start")?.i64()?;
        let end = df.column("end")?.i64()?;
        let strand = df.column("strand")?.str()?;
        let gene_id = df.column("gene_id")?.str()?;
        let gene_name = df.column("gene_name")?.str()?;
        let transcript_id = df.column("transcript_id")?.str()?;
        let transcript_type = df.column("transcript_type")?.str()?;

        let mut order: HashMap<String, usize> = HashMap::new();
        let mut pending: Vec<PendingTranscript> = Vec::new();
        let mut n_bad_strand = 0usize;

        for i in 0..df.height() {
            let role = match feature_type.get(i).and_then(record_role) {
                Some(role) => role,
                None => continue,
            };
            let tid = match transcript_id.get(i) {
                Some(tid) => tid,
                None => continue,
            };
            let (s, e) = match (start.get(i), end.get(i)) {
                (Some(s), Some(e)) => (s, e),
                _ => bail!("Found a record of transcript {} without start or end.", tid),
            };

            let idx = *order.entry(tid.to_string()).or_insert_with(|| {
                pending.push(PendingTranscript {
                    id: tid.to_string(),
                    gene_symbol: gene_name
                        .get(i)
                        .or(gene_id.get(i))
                        .unwrap_or(symbol)
                        .to_string(),
                    biotype: transcript_type
                        .get(i)
                        .unwrap_or(UNKNOWN_BIOTYPE)
                        .to_string(),
                    strand: None,
                    span: None,
                    coding_exons: Vec::new(),
                    utrs: Vec::new(),
                });
                pending.len() - 1
            });
            let tx = &mut pending[idx];

            if tx.strand.is_none() {
                match strand.get(i).map(|st| st.parse::<Strand>()) {
                    Some(Ok(st)) => tx.strand = Some(st),
                    Some(Err(_)) => n_bad_strand += 1,
                    None => {}
                }
            }

            match role {
                RecordRole::Span => tx.span = Some((s, e)),
                RecordRole::Feature(FeatureKind::CodingExon) => {
                    tx.coding_exons.push(FeatureInterval::new(s, e))
                }
                RecordRole::Feature(FeatureKind::Utr) => tx.utrs.push(FeatureInterval::new(s, e)),
            }
        }

        if n_bad_strand > 0 {
            warn!(
                "{} records of gene {} have an unparsable strand; ignored them",
                n_bad_strand, symbol
            );
        }

        let mut n_unknown_strand = 0usize;
        let transcripts: Vec<Transcript> = pending
            .into_iter()
            .filter_map(|p| p.into_transcript(&mut n_unknown_strand))
            .collect();
        if n_unknown_strand > 0 {
            warn!(
                "{} transcripts of gene {} have no strand information, set to '+'",
                n_unknown_strand, symbol
            );
        }
        debug!("found {} transcripts for gene {}", transcripts.len(), symbol);
        Ok(transcripts)
    }
}
