//! Track layout: which transcripts are drawn, at which height, with which merged
//! features and where their directional arrows sit.

use crate::maire_utils::Strand;
use crate::memo::BoundedLru;
use crate::options::PlotOptions;
use crate::transcript::{FeatureInterval, FeatureKind, Transcript};
use nutype::nutype;
use rust_lapper::{Interval, Lapper};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsRef))]
/// The vertical rank of a transcript track. The top track has the highest rank, the
/// bottom one has rank 1; the rank is also the track's y coordinate.
pub struct TrackRank(u32);

/// Rank of the track at `index` (0-based, top to bottom) among `row_count` tracks.
pub fn track_rank(index: usize, row_count: usize) -> TrackRank {
    TrackRank::new(row_count.saturating_sub(index) as u32)
}

/// Merges overlapping intervals into a minimal sorted set of disjoint spans.
///
/// Intervals are sorted by start; an interval joins the span accumulated so far when its
/// start is `<=` the span's end, otherwise it opens a new span. Touching intervals
/// (`end == next.start`) are therefore merged. This bounds the rectangles drawn for a
/// transcript to its number of disjoint spans, however many micro-exons it lists.
///
/// Malformed intervals (`start > end`) are not corrected; they take part in the sweep
/// like any other interval.
///
/// # Examples
///
/// ```rust
/// use maire::layout::merge_intervals;
/// use maire::transcript::FeatureInterval;
/// let merged = merge_intervals(&[
///     FeatureInterval::new(150, 300),
///     FeatureInterval::new(100, 200),
///     FeatureInterval::new(400, 500),
/// ]);
/// assert_eq!(merged, vec![FeatureInterval::new(100, 300), FeatureInterval::new(400, 500)]);
/// ```
pub fn merge_intervals(intervals: &[FeatureInterval]) -> Vec<FeatureInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_unstable();

    let mut merged: Vec<FeatureInterval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match merged.last_mut() {
            Some(prev) if iv.start <= prev.end => prev.end = prev.end.max(iv.end),
            _ => merged.push(iv),
        }
    }
    merged
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// The way a directional arrow points.
pub enum ArrowDirection {
    Right,
    Left,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// A directional arrow on a track: its head sits at `position` and its tail at
/// `position + tail_offset`. The direction follows the strand, whatever the tail length.
pub struct ArrowAnchor {
    pub position: i64,
    pub tail_offset: i64,
    direction: ArrowDirection,
}

impl ArrowAnchor {
    pub fn new(position: i64, strand: Strand, tail_bp: i64) -> ArrowAnchor {
        let direction = match strand {
            Strand::Forward => ArrowDirection::Right,
            Strand::Reverse => ArrowDirection::Left,
        };
        ArrowAnchor {
            position,
            tail_offset: strand.tail_sign() * tail_bp,
            direction,
        }
    }

    pub fn direction(&self) -> ArrowDirection {
        self.direction
    }
}

#[derive(Clone, Debug)]
/// One rendered transcript track.
///
/// # Fields
///
/// * `transcript`: the source transcript.
/// * `rank`: the vertical rank (y coordinate) of the track.
/// * `coding_exons` / `utrs`: merged spans of each feature kind.
/// * `arrows`: directional arrow anchors placed in intronic space where possible.
pub struct LayoutRow {
    pub transcript: Transcript,
    pub rank: TrackRank,
    pub coding_exons: Vec<FeatureInterval>,
    pub utrs: Vec<FeatureInterval>,
    pub arrows: Vec<ArrowAnchor>,
}

impl LayoutRow {
    pub fn merged(&self, kind: FeatureKind) -> &[FeatureInterval] {
        match kind {
            FeatureKind::CodingExon => &self.coding_exons,
            FeatureKind::Utr => &self.utrs,
        }
    }

    /// The track height as a scene coordinate.
    pub fn y(&self) -> f64 {
        self.rank.into_inner() as f64
    }
}

#[derive(Clone, Debug, Default)]
/// The result of laying out a gene's transcripts.
///
/// `total_transcripts` counts the drawable transcripts before the cap was applied and
/// `truncated` tells whether rows were dropped because of the cap.
pub struct LayoutPlan {
    pub rows: Vec<LayoutRow>,
    pub total_transcripts: usize,
    pub truncated: bool,
}

impl LayoutPlan {
    /// An empty plan means there is nothing to render; it is not an error.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The user-facing truncation notice, present only when rows were dropped.
    pub fn notice(&self) -> Option<String> {
        if self.truncated {
            Some(format!(
                "Showing {} of {} transcripts",
                self.rows.len(),
                self.total_transcripts
            ))
        } else {
            None
        }
    }

    /// The gene symbol of the top track.
    pub fn gene_symbol(&self) -> Option<&str> {
        self.rows.first().map(|r| r.transcript.gene_symbol.as_str())
    }

    /// `(min transcript start, max transcript end)` over all rows.
    pub fn genomic_extent(&self) -> Option<(i64, i64)> {
        let start = self.rows.iter().map(|r| r.transcript.start).min()?;
        let end = self.rows.iter().map(|r| r.transcript.end).max()?;
        Some((start, end))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Memo key for arrow anchors: the transcript geometry plus the arrow policy values that
/// influence the result. The strand is not part of it, it only decides the direction.
pub struct ArrowKey {
    pub start: i64,
    pub end: i64,
    pub length: i64,
    pub features: Vec<(i64, i64)>,
    pub spacing_bp: i64,
    pub max_arrows: usize,
}

/// Bounded memo of arrow anchor positions, keyed by [ArrowKey].
pub type ArrowMemo = BoundedLru<ArrowKey, Vec<i64>>;

type Iv = Interval<u64, ()>;

/// Builds an interval index over `occupied`, with coordinates shifted so that `origin`
/// maps to 0. Spans left of the origin are clipped and empty or reversed spans are
/// skipped. rust-lapper intervals are right-exclusive, hence the `+ 1`.
fn occupied_index(occupied: &[FeatureInterval], origin: i64) -> Lapper<u64, ()> {
    let ivs: Vec<Iv> = occupied
        .iter()
        .filter_map(|f| {
            let s = (f.start - origin).max(0);
            let e = f.end - origin + 1;
            if e <= s {
                None
            } else {
                Some(Iv {
                    start: s as u64,
                    stop: e as u64,
                    val: (),
                })
            }
        })
        .collect();
    Lapper::new(ivs)
}

/// Computes arrow anchor positions for a transcript span.
///
/// The arrow count is one per `arrow_spacing_bp` of transcript length, clamped to
/// `[1, max_arrows_per_transcript]`. Candidates are spread evenly strictly inside the
/// span, and those falling inside an occupied feature (inclusive bounds) are dropped. If
/// nothing is left, the arrows are centred in equal slices of the span without the
/// feature filter, so a track always carries at least one arrow.
pub fn arrow_positions(
    start: i64,
    end: i64,
    occupied: &[FeatureInterval],
    options: &PlotOptions,
) -> Vec<i64> {
    let length = end - start;
    let spacing = options.arrow_spacing_bp.max(1);
    let max_arrows = options.max_arrows_per_transcript.max(1);
    let n = usize::try_from(length / spacing)
        .unwrap_or(0)
        .clamp(1, max_arrows) as i64;

    let lapper = occupied_index(occupied, start);
    let in_feature = |pos: i64| {
        let rel = pos - start;
        rel >= 0 && lapper.find(rel as u64, rel as u64 + 1).next().is_some()
    };

    let positions: Vec<i64> = (1..=n)
        .map(|i| start + i * length / (n + 1))
        .filter(|p| !in_feature(*p))
        .collect();

    if !positions.is_empty() {
        return positions;
    }
    (0..n)
        .map(|i| start + (2 * i + 1) * length / (2 * n))
        .collect()
}

#[derive(Clone, Debug)]
/// Lays out transcripts as stacked tracks.
///
/// The planner is a pure function of its input apart from the optional arrow memo, which
/// only ever returns what it would have computed anyway. Each planner owns its memo; it is
/// never shared between planners.
///
/// # Examples
///
/// ```rust
/// use maire::layout::LayoutPlanner;
/// use maire::maire_utils::Strand;
/// use maire::options::PlotOptions;
/// use maire::transcript::Transcript;
///
/// let t = Transcript::new("t1", "ACTA1", "protein_coding", Strand::Forward, 1000, 5000)
///     .with_coding_exons([(1200, 1800)]);
/// let mut planner = LayoutPlanner::new(PlotOptions::default()).with_memo();
/// let plan = planner.plan(&[t]);
/// assert_eq!(plan.rows.len(), 1);
/// assert!(!plan.truncated);
/// ```
pub struct LayoutPlanner {
    options: PlotOptions,
    memo: Option<ArrowMemo>,
}

impl LayoutPlanner {
    pub fn new(options: PlotOptions) -> LayoutPlanner {
        LayoutPlanner {
            options,
            memo: None,
        }
    }

    /// Enables the arrow memo with the capacity given by the options.
    pub fn with_memo(mut self) -> LayoutPlanner {
        self.memo = Some(ArrowMemo::new(self.options.arrow_memo_capacity));
        self
    }

    pub fn options(&self) -> &PlotOptions {
        &self.options
    }

    pub fn memo(&self) -> Option<&ArrowMemo> {
        self.memo.as_ref()
    }

    /// Plans the tracks of `transcripts`.
    ///
    /// ### Returns
    ///
    /// A [LayoutPlan] holding at most `max_transcripts` rows, in input order, ranked from
    /// `row_count` (top) down to 1. Transcripts without coding exons and without UTRs are
    /// skipped before the cap is applied. An empty plan is returned when nothing is
    /// drawable.
    pub fn plan(&mut self, transcripts: &[Transcript]) -> LayoutPlan {
        let drawable: Vec<&Transcript> = transcripts.iter().filter(|t| t.is_drawable()).collect();
        let n_skipped = transcripts.len() - drawable.len();
        if n_skipped > 0 {
            debug!(
                "skipped {} transcript(s) without coding exons or UTRs",
                n_skipped
            );
        }

        let total_transcripts = drawable.len();
        let cap = self.options.max_transcripts.max(1);
        let truncated = total_transcripts > cap;
        if truncated {
            info!(
                "showing the first {} of {} transcripts",
                cap, total_transcripts
            );
        }

        let kept = &drawable[..total_transcripts.min(cap)];
        let row_count = kept.len();
        let rows = kept
            .iter()
            .enumerate()
            .map(|(index, t)| self.plan_row(t, track_rank(index, row_count)))
            .collect();

        LayoutPlan {
            rows,
            total_transcripts,
            truncated,
        }
    }

    fn plan_row(&mut self, transcript: &Transcript, rank: TrackRank) -> LayoutRow {
        let coding_exons = merge_intervals(&transcript.coding_exons);
        let utrs = merge_intervals(&transcript.utrs);

        let mut all = coding_exons.clone();
        all.extend_from_slice(&utrs);
        let occupied = merge_intervals(&all);

        let positions = self.cached_arrow_positions(transcript, &occupied);
        let arrows = positions
            .into_iter()
            .map(|p| ArrowAnchor::new(p, transcript.strand, self.options.arrow_tail_bp))
            .collect();

        LayoutRow {
            transcript: transcript.clone(),
            rank,
            coding_exons,
            utrs,
            arrows,
        }
    }

    fn cached_arrow_positions(
        &mut self,
        transcript: &Transcript,
        occupied: &[FeatureInterval],
    ) -> Vec<i64> {
        let memo = match self.memo.as_mut() {
            Some(memo) => memo,
            None => {
                return arrow_positions(transcript.start, transcript.end, occupied, &self.options)
            }
        };

        let key = ArrowKey {
            start: transcript.start,
            end: transcript.end,
            length: transcript.length(),
            features: occupied.iter().map(|f| (f.start, f.end)).collect(),
            spacing_bp: self.options.arrow_spacing_bp,
            max_arrows: self.options.max_arrows_per_transcript,
        };
        if let Some(hit) = memo.get(&key) {
            return hit.clone();
        }
        let positions = arrow_positions(transcript.start, transcript.end, occupied, &self.options);
        memo.insert(key, positions.clone());
        positions
    }
}

/// Plans `transcripts` without a memo. See [LayoutPlanner::plan].
pub fn plan(transcripts: &[Transcript], options: &PlotOptions) -> LayoutPlan {
    LayoutPlanner::new(options.clone()).plan(transcripts)
}
