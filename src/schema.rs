//! Shaping of gene records, as returned by the database layer, into the lists the figure
//! builder consumes.

use crate::maire_utils::{round_to, Strand};
use crate::transcript::{FeatureInterval, MeasurementPoint, Transcript};
use tracing::debug;

/// Number of decimals kept for editing levels.
pub const LEVEL_DECIMALS: i32 = 3;

#[derive(Clone, Debug, Default)]
/// A transcript row with its CDS and UTR children.
pub struct TranscriptRecord {
    pub transcript_id: String,
    pub transcript_type: String,
    pub start: i64,
    pub end: i64,
    pub cds: Vec<(i64, i64)>,
    pub utrs: Vec<(i64, i64)>,
}

#[derive(Clone, Debug)]
pub struct TissueLevel {
    pub tissue: String,
    pub level: f64,
}

#[derive(Clone, Debug)]
/// An RNA editing site of a gene and its editing level in each tissue.
pub struct EditingSite {
    pub position: i64,
    pub levels: Vec<TissueLevel>,
}

#[derive(Clone, Debug)]
/// A gene record with its transcripts and editing sites.
///
/// # Fields
///
/// * `strand`: the numeric strand of the gene (`1` forward, anything else reverse). It is
///   applied to every transcript of the gene.
pub struct GeneRecord {
    pub symbol: String,
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub strand: i64,
    pub transcripts: Vec<TranscriptRecord>,
    pub editing_sites: Vec<EditingSite>,
}

/// Converts a gene record into the transcripts and measurement points of its figure.
///
/// Transcripts with neither CDS nor UTR rows are skipped. Every `(site, tissue level)`
/// pair becomes one measurement point with the level rounded to
/// [LEVEL_DECIMALS] decimals.
///
/// ### Example
///
/// ```rust
/// use maire::schema::*;
/// let gene = GeneRecord {
///     symbol: String::from("ACTA1"),
///     chromosome: String::from("chr1"),
///     start: 100,
///     end: 900,
///     strand: -1,
///     transcripts: vec![TranscriptRecord {
///         transcript_id: String::from("t1"),
///         transcript_type: String::from("protein_coding"),
///         start: 100,
///         end: 900,
///         cds: vec![(200, 300)],
///         utrs: vec![],
///     }],
///     editing_sites: vec![EditingSite {
///         position: 250,
///         levels: vec![TissueLevel { tissue: String::from("Brain"), level: 0.12345 }],
///     }],
/// };
/// let (transcripts, points) = gene_view_schema(&gene);
/// assert_eq!(transcripts.len(), 1);
/// assert_eq!(points[0].value, 0.123);
/// ```
pub fn gene_view_schema(gene: &GeneRecord) -> (Vec<Transcript>, Vec<MeasurementPoint>) {
    let strand = Strand::from_numeric(gene.strand);

    let transcripts: Vec<Transcript> = gene
        .transcripts
        .iter()
        .filter(|t| !(t.cds.is_empty() && t.utrs.is_empty()))
        .map(|t| Transcript {
            id: t.transcript_id.clone(),
            gene_symbol: gene.symbol.clone(),
            biotype: t.transcript_type.clone(),
            strand,
            coding_exons: t.cds.iter().copied().map(FeatureInterval::from).collect(),
            utrs: t.utrs.iter().copied().map(FeatureInterval::from).collect(),
            start: t.start,
            end: t.end,
        })
        .collect();

    let points: Vec<MeasurementPoint> = gene
        .editing_sites
        .iter()
        .flat_map(|site| {
            site.levels.iter().map(move |l| {
                MeasurementPoint::new(
                    site.position,
                    round_to(l.level, LEVEL_DECIMALS),
                    l.tissue.clone(),
                )
            })
        })
        .collect();

    debug!(
        "gene {}: {} of {} transcripts drawable, {} level points",
        gene.symbol,
        transcripts.len(),
        gene.transcripts.len(),
        points.len()
    );
    (transcripts, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, cds: Vec<(i64, i64)>, utrs: Vec<(i64, i64)>) -> TranscriptRecord {
        TranscriptRecord {
            transcript_id: id.to_string(),
            transcript_type: String::from("protein_coding"),
            start: 1000,
            end: 5000,
            cds,
            utrs,
        }
    }

    #[test]
    fn test_gene_view_schema() {
        let gene = GeneRecord {
            symbol: String::from("ADAR"),
            chromosome: String::from("chr1"),
            start: 1000,
            end: 5000,
            strand: 1,
            transcripts: vec![
                record("t1", vec![(1200, 1800)], vec![(1000, 1200)]),
                record("t2", vec![], vec![]),
                record("t3", vec![], vec![(4000, 5000)]),
            ],
            editing_sites: vec![
                EditingSite {
                    position: 1500,
                    levels: vec![
                        TissueLevel {
                            tissue: String::from("Brain"),
                            level: 0.33333,
                        },
                        TissueLevel {
                            tissue: String::from("Liver"),
                            level: 0.5,
                        },
                    ],
                },
                EditingSite {
                    position: 4200,
                    levels: vec![],
                },
            ],
        };
        let (transcripts, points) = gene_view_schema(&gene);
        let ids: Vec<&str> = transcripts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert!(transcripts.iter().all(|t| t.strand == Strand::Forward));
        assert!(transcripts.iter().all(|t| t.gene_symbol == "ADAR"));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], MeasurementPoint::new(1500, 0.333, "Brain"));
        assert_eq!(points[1].tissue_label, "Liver");
    }
}
