use anyhow::bail;
use tracing::warn;

/// Default number of transcripts drawn for one gene.
pub const MAX_TRANSCRIPTS: usize = 5;
/// Default upper bound on directional arrows per transcript track.
pub const MAX_ARROWS_PER_TRANSCRIPT: usize = 3;
/// Default genomic distance covered by one directional arrow.
pub const ARROW_SPACING_BP: i64 = 1000;
/// Default distance between an arrow anchor and its tail.
pub const ARROW_TAIL_BP: i64 = 100;
/// Default padding added on both sides of the shared x axis.
pub const AXIS_MARGIN_BP: i64 = 1000;
/// Above this many measurement points the scatter uses the accelerated mode.
pub const SCATTER_GL_THRESHOLD: usize = 100;
/// Default capacity of the arrow-anchor memo.
pub const ARROW_MEMO_CAPACITY: usize = 256;

pub const EXON_COLOR: &str = "#1E90FF";
pub const UTR_COLOR: &str = "#FFA500";
pub const TRACK_COLOR: &str = "gray";
pub const SCATTER_COLOR: &str = "red";

#[derive(Clone, Debug, PartialEq)]
/// Rendering policy and layout configuration for a gene figure.
///
/// The defaults mirror the constants declared at the top of this module.
///
/// # Fields
///
/// * `max_transcripts`: the number of transcripts actually laid out, at least one; extra
///   transcripts are dropped (stable, input order) and a notice is added to the scene.
/// * `max_arrows_per_transcript`: the upper bound on directional arrows per track.
/// * `arrow_spacing_bp`: the target genomic distance per arrow.
/// * `arrow_tail_bp`: the distance from an arrow anchor to its tail.
/// * `axis_margin_bp`: padding applied to both ends of the shared x axis.
/// * `scatter_gl_threshold`: point count above which the scatter switches to the
///   accelerated mode.
/// * `structure_panel_fraction`: height share of the gene structure panel when a
///   measurement panel is present. The measurement panel receives the rest.
/// * `panel_spacing`: vertical gap between the two panels, as a fraction of the figure.
/// * `exon_half_height` / `utr_half_height`: half of the band height of coding exons and UTRs.
/// * `base_height_px` / `row_height_px`: the suggested pixel height is
///   `base_height_px + row_height_px * rows`.
/// * `arrow_memo_capacity`: number of transcript geometries whose arrow anchors are remembered.
/// * colors: fill and stroke colors of the scene elements.
///
/// # Examples
///
/// ```rust
/// use maire::options::PlotOptions;
/// let opts = PlotOptions::default().with_max_transcripts(10).with_axis_margin_bp(500);
/// assert!(opts.validate().is_ok());
/// assert_eq!(opts.max_transcripts, 10);
/// ```
pub struct PlotOptions {
    pub max_transcripts: usize,
    pub max_arrows_per_transcript: usize,
    pub arrow_spacing_bp: i64,
    pub arrow_tail_bp: i64,
    pub axis_margin_bp: i64,
    pub scatter_gl_threshold: usize,
    pub structure_panel_fraction: f64,
    pub panel_spacing: f64,
    pub exon_half_height: f64,
    pub utr_half_height: f64,
    pub base_height_px: u32,
    pub row_height_px: u32,
    pub arrow_memo_capacity: usize,
    pub exon_color: String,
    pub utr_color: String,
    pub track_color: String,
    pub scatter_color: String,
}

impl Default for PlotOptions {
    fn default() -> PlotOptions {
        PlotOptions {
            max_transcripts: MAX_TRANSCRIPTS,
            max_arrows_per_transcript: MAX_ARROWS_PER_TRANSCRIPT,
            arrow_spacing_bp: ARROW_SPACING_BP,
            arrow_tail_bp: ARROW_TAIL_BP,
            axis_margin_bp: AXIS_MARGIN_BP,
            scatter_gl_threshold: SCATTER_GL_THRESHOLD,
            structure_panel_fraction: 0.3,
            panel_spacing: 0.05,
            exon_half_height: 0.3,
            utr_half_height: 0.15,
            base_height_px: 400,
            row_height_px: 100,
            arrow_memo_capacity: ARROW_MEMO_CAPACITY,
            exon_color: String::from(EXON_COLOR),
            utr_color: String::from(UTR_COLOR),
            track_color: String::from(TRACK_COLOR),
            scatter_color: String::from(SCATTER_COLOR),
        }
    }
}

impl PlotOptions {
    pub fn with_max_transcripts(mut self, max_transcripts: usize) -> PlotOptions {
        self.max_transcripts = max_transcripts;
        self
    }

    pub fn with_max_arrows(mut self, max_arrows: usize) -> PlotOptions {
        self.max_arrows_per_transcript = max_arrows;
        self
    }

    pub fn with_arrow_spacing_bp(mut self, spacing: i64) -> PlotOptions {
        self.arrow_spacing_bp = spacing;
        self
    }

    pub fn with_axis_margin_bp(mut self, margin: i64) -> PlotOptions {
        self.axis_margin_bp = margin;
        self
    }

    pub fn with_scatter_gl_threshold(mut self, threshold: usize) -> PlotOptions {
        self.scatter_gl_threshold = threshold;
        self
    }

    pub fn with_structure_panel_fraction(mut self, fraction: f64) -> PlotOptions {
        self.structure_panel_fraction = fraction;
        self
    }

    /// Checks that the options describe a drawable, bounded figure.
    ///
    /// ### Returns
    ///
    /// Returns [Ok]`(())` if the options are usable, or an [anyhow::Error] naming the first
    /// offending field. The planner and the assembler themselves never fail, so callers
    /// that build options from user input should validate them first.
    ///
    /// ### Errors
    ///
    /// * a zero transcript or arrow cap, as it would render nothing;
    /// * a non-positive arrow spacing;
    /// * a negative margin or arrow tail;
    /// * panel fractions outside `(0, 1)`, or a spacing that leaves no room for the panels.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_transcripts == 0 {
            bail!("max_transcripts must be at least 1.")
        }
        if self.max_arrows_per_transcript == 0 {
            bail!("max_arrows_per_transcript must be at least 1; every track carries one arrow.")
        }
        if self.arrow_spacing_bp < 1 {
            bail!(
                "arrow_spacing_bp must be positive, got {}.",
                self.arrow_spacing_bp
            )
        }
        if self.axis_margin_bp < 0 || self.arrow_tail_bp < 0 {
            bail!("axis_margin_bp and arrow_tail_bp cannot be negative.")
        }
        if !(self.structure_panel_fraction > 0.0 && self.structure_panel_fraction < 1.0) {
            bail!(
                "structure_panel_fraction must lie in (0, 1), got {}.",
                self.structure_panel_fraction
            )
        }
        if !(0.0..1.0).contains(&self.panel_spacing) {
            bail!(
                "panel_spacing must lie in [0, 1), got {}.",
                self.panel_spacing
            )
        }
        if self.utr_half_height > self.exon_half_height {
            warn!("UTR bands are taller than coding exon bands; coding exons may be hidden.")
        }
        if self.arrow_memo_capacity == 0 {
            warn!("arrow_memo_capacity is 0; arrow anchors will not be memoized.")
        }
        Ok(())
    }

    /// Height share of the measurement panel when it is drawn.
    pub fn levels_panel_fraction(&self) -> f64 {
        1.0 - self.structure_panel_fraction
    }

    /// Suggested pixel height of a figure with `rows` transcript tracks.
    pub fn figure_height_px(&self, rows: usize) -> u32 {
        self.base_height_px + self.row_height_px * rows as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        let opts = PlotOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.max_transcripts, 5);
        assert_eq!(opts.max_arrows_per_transcript, 3);
        assert_eq!(opts.axis_margin_bp, 1000);
        assert_eq!(opts.scatter_gl_threshold, 100);
        assert_eq!(opts.figure_height_px(3), 700);
    }

    #[test]
    fn test_invalid_options() {
        assert!(PlotOptions::default()
            .with_max_transcripts(0)
            .validate()
            .is_err());
        assert!(PlotOptions::default().with_max_arrows(0).validate().is_err());
        assert!(PlotOptions::default()
            .with_arrow_spacing_bp(0)
            .validate()
            .is_err());
        assert!(PlotOptions::default()
            .with_axis_margin_bp(-1)
            .validate()
            .is_err());
        assert!(PlotOptions::default()
            .with_structure_panel_fraction(1.0)
            .validate()
            .is_err());
    }
}
