//! Figure assembly: turns a [LayoutPlan] and editing-level measurements into a [Scene].

use crate::layout::{LayoutPlan, LayoutPlanner, LayoutRow};
use crate::maire_utils::format_thousands;
use crate::memo::BoundedLru;
use crate::options::PlotOptions;
use crate::scene::*;
use crate::transcript::{FeatureInterval, FeatureKind, MeasurementPoint, Transcript};
use std::sync::Arc;
use tracing::debug;

const TRACK_LINE_WIDTH: f64 = 1.0;
const SCATTER_NAME: &str = "RNA editing level";

/// Styling of one feature kind, so coding exons and UTRs go through the same emit routine.
struct FeatureStyle<'a> {
    kind: FeatureKind,
    fill: &'a str,
    half_height: f64,
}

impl<'a> FeatureStyle<'a> {
    fn for_kind(kind: FeatureKind, options: &'a PlotOptions) -> FeatureStyle<'a> {
        match kind {
            FeatureKind::CodingExon => FeatureStyle {
                kind,
                fill: &options.exon_color,
                half_height: options.exon_half_height,
            },
            FeatureKind::Utr => FeatureStyle {
                kind,
                fill: &options.utr_color,
                half_height: options.utr_half_height,
            },
        }
    }
}

/// Tooltip text of one merged feature span.
pub fn feature_tooltip(transcript: &Transcript, kind: FeatureKind, iv: &FeatureInterval) -> String {
    format!(
        "Transcript: {}\nGene: {}\nType: {}\nElement: {}\nCoordinates: {}-{}\nLength: {}bp",
        transcript.id,
        transcript.gene_symbol,
        transcript.biotype,
        kind,
        format_thousands(iv.start),
        format_thousands(iv.end),
        format_thousands(iv.len()),
    )
}

/// Text of the label placed left of a track.
pub fn track_label(transcript: &Transcript) -> String {
    format!("{} ({})", transcript.id, transcript.gene_symbol)
}

/// Tooltip text of one measurement point.
pub fn measurement_tooltip(m: &MeasurementPoint) -> String {
    format!(
        "Position: {}\nValue: {}\nTissue: {}",
        format_thousands(m.position),
        m.value,
        m.tissue_label
    )
}

/// The x range shared by every panel: the genomic extent of the plan, padded by the
/// axis margin on both sides. Computed once per scene.
pub fn shared_x_range(plan: &LayoutPlan, options: &PlotOptions) -> Option<AxisRange> {
    let (start, end) = plan.genomic_extent()?;
    let margin = options.axis_margin_bp;
    Some(AxisRange::new((start - margin) as f64, (end + margin) as f64))
}

fn emit_features(scene: &mut Scene, row: &LayoutRow, style: &FeatureStyle, panel: PanelId) {
    let y = row.y();
    for iv in row.merged(style.kind) {
        scene.shapes.push(Shape {
            kind: ShapeKind::Rect,
            bounds: Bounds {
                x0: iv.start as f64,
                x1: iv.end as f64,
                y0: y - style.half_height,
                y1: y + style.half_height,
            },
            fill: Some(style.fill.to_string()),
            line_color: String::from("black"),
            line_width: TRACK_LINE_WIDTH,
            panel,
        });
        scene.markers.push(HoverMarker {
            x: iv.midpoint(),
            y,
            text: feature_tooltip(&row.transcript, style.kind, iv),
            panel,
        });
    }
}

fn emit_row(scene: &mut Scene, row: &LayoutRow, options: &PlotOptions) {
    let panel = PanelId::Structure;
    let y = row.y();

    scene.shapes.push(Shape {
        kind: ShapeKind::Line,
        bounds: Bounds {
            x0: row.transcript.start as f64,
            x1: row.transcript.end as f64,
            y0: y,
            y1: y,
        },
        fill: None,
        line_color: options.track_color.clone(),
        line_width: TRACK_LINE_WIDTH,
        panel,
    });

    for kind in [FeatureKind::CodingExon, FeatureKind::Utr] {
        emit_features(scene, row, &FeatureStyle::for_kind(kind, options), panel);
    }

    scene.labels.push(TrackLabel {
        text: track_label(&row.transcript),
        x: row.transcript.start as f64,
        y,
        anchor: TextAnchor::Right,
        panel,
    });

    for anchor in row.arrows.iter() {
        scene.arrows.push(Arrow {
            x: anchor.position as f64,
            y,
            tail_dx: anchor.tail_offset as f64,
            direction: anchor.direction(),
            color: options.track_color.clone(),
            panel,
        });
    }
}

/// Builds the scatter series over all measurements. The accelerated mode is used once
/// the point count exceeds `scatter_gl_threshold`.
pub fn scatter_series(measurements: &[MeasurementPoint], options: &PlotOptions) -> ScatterSeries {
    let mode = if measurements.len() > options.scatter_gl_threshold {
        ScatterMode::Accelerated
    } else {
        ScatterMode::Standard
    };
    ScatterSeries {
        name: String::from(SCATTER_NAME),
        x: measurements.iter().map(|m| m.position).collect(),
        y: measurements.iter().map(|m| m.value).collect(),
        text: measurements.iter().map(measurement_tooltip).collect(),
        mode,
        color: options.scatter_color.clone(),
        panel: PanelId::Levels,
    }
}

/// Assembles the scene of a planned gene.
///
/// ### Arguments
///
/// * `plan`: the planned tracks, see [crate::layout::plan].
/// * `measurements`: editing-level points; an empty slice means a single-panel figure.
/// * `options`: colors, band heights, scatter threshold and axis margin.
///
/// ### Returns
///
/// A [Scene] with one panel when `measurements` is empty and two otherwise (structure on
/// top). Both panels carry the same x range value. An empty plan yields
/// [Scene::placeholder]. This function never fails.
///
/// ### Example
///
/// ```rust
/// use maire::figure::assemble;
/// use maire::layout::plan;
/// use maire::maire_utils::Strand;
/// use maire::options::PlotOptions;
/// use maire::transcript::Transcript;
///
/// let opts = PlotOptions::default();
/// let t = Transcript::new("t1", "ACTA1", "protein_coding", Strand::Forward, 1000, 5000)
///     .with_coding_exons([(1200, 1800)]);
/// let scene = assemble(&plan(&[t], &opts), &[], &opts);
/// assert_eq!(scene.layout.panel_count(), 1);
/// assert_eq!(scene.layout.title.text, "ACTA1");
/// ```
pub fn assemble(plan: &LayoutPlan, measurements: &[MeasurementPoint], options: &PlotOptions) -> Scene {
    let x_range = match shared_x_range(plan, options) {
        Some(r) => r,
        None => {
            debug!("nothing to draw; returning the placeholder scene");
            return Scene::placeholder(options.base_height_px);
        }
    };

    let row_count = plan.rows.len();
    let has_levels = !measurements.is_empty();
    let title = plan.gene_symbol().unwrap_or_default();

    let mut scene = Scene::placeholder(options.figure_height_px(row_count));
    scene.layout.title = Title::centered(title);
    scene.layout.panels.clear();

    for row in plan.rows.iter() {
        emit_row(&mut scene, row, options);
    }

    let structure_fraction = if has_levels {
        options.structure_panel_fraction
    } else {
        1.0
    };
    scene.layout.panels.push(PanelLayout {
        id: PanelId::Structure,
        height_fraction: structure_fraction,
        x_range,
        y_range: Some(AxisRange::new(0.0, (row_count + 1) as f64)),
        y_visible: false,
        x_tick_labels: !has_levels,
        x_title: if has_levels {
            None
        } else {
            Some(String::from("Genomic Position"))
        },
        y_title: None,
    });

    if has_levels {
        scene.scatter = Some(scatter_series(measurements, options));
        scene.layout.panel_spacing = options.panel_spacing;
        scene.layout.panels.push(PanelLayout {
            id: PanelId::Levels,
            height_fraction: options.levels_panel_fraction(),
            x_range,
            y_range: None,
            y_visible: true,
            x_tick_labels: true,
            x_title: Some(String::from("Genomic Position")),
            y_title: Some(String::from("Editing Level")),
        });
    }

    if let Some(text) = plan.notice() {
        scene.notes.push(Note {
            text,
            x: 0.5,
            y: 1.0,
            interactive: false,
        });
    }

    debug!(
        "assembled scene: {} shapes, {} markers, {} arrows, {} panel(s)",
        scene.shapes.len(),
        scene.markers.len(),
        scene.arrows.len(),
        scene.layout.panel_count()
    );
    scene
}

/// Plans and assembles the figure of one gene. This is the usual entry point.
pub fn build_gene_figure(
    transcripts: &[Transcript],
    measurements: &[MeasurementPoint],
    options: &PlotOptions,
) -> Scene {
    let plan = LayoutPlanner::new(options.clone()).plan(transcripts);
    assemble(&plan, measurements, options)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SceneKey {
    pub gene_symbol: String,
    pub assembly: String,
}

#[derive(Debug)]
/// Bounded cache of finished scenes keyed by `(gene symbol, assembly version)`.
///
/// The cache is an explicit value owned by whoever serves figures; scenes are stored as
/// immutable [Arc] snapshots and only leave through LRU eviction or [SceneCache::clear].
pub struct SceneCache {
    inner: BoundedLru<SceneKey, Arc<Scene>>,
}

impl SceneCache {
    pub fn new(capacity: usize) -> SceneCache {
        SceneCache {
            inner: BoundedLru::new(capacity),
        }
    }

    /// Returns the cached scene for `(gene_symbol, assembly)`, building and storing it
    /// with `build` on a miss.
    pub fn get_or_build<F>(&mut self, gene_symbol: &str, assembly: &str, build: F) -> Arc<Scene>
    where
        F: FnOnce() -> Scene,
    {
        let key = SceneKey {
            gene_symbol: gene_symbol.to_string(),
            assembly: assembly.to_string(),
        };
        if let Some(scene) = self.inner.get(&key) {
            return Arc::clone(scene);
        }
        let scene = Arc::new(build());
        self.inner.insert(key, Arc::clone(&scene));
        scene
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maire_utils::Strand;

    fn acta1() -> Transcript {
        Transcript::new("t1", "ACTA1", "protein_coding", Strand::Forward, 1000, 5000)
            .with_coding_exons([(1200, 1800)])
    }

    #[test]
    fn test_feature_tooltip() {
        let t = acta1();
        let text = feature_tooltip(&t, FeatureKind::CodingExon, &FeatureInterval::new(1200, 1800));
        assert_eq!(
            text,
            "Transcript: t1\nGene: ACTA1\nType: protein_coding\nElement: Coding Exon\nCoordinates: 1,200-1,800\nLength: 600bp"
        );
    }

    #[test]
    fn test_measurement_tooltip() {
        let m = MeasurementPoint::new(1234567, 0.25, "Brain");
        assert_eq!(
            measurement_tooltip(&m),
            "Position: 1,234,567\nValue: 0.25\nTissue: Brain"
        );
    }

    #[test]
    fn test_rect_bands_and_markers() {
        let opts = PlotOptions::default();
        let t = acta1().with_utrs([(1000, 1200)]);
        let scene = build_gene_figure(&[t], &[], &opts);
        let rects: Vec<&Shape> = scene.shapes_of(ShapeKind::Rect).collect();
        assert_eq!(rects.len(), 2);
        // coding exon first, then UTR
        assert!((rects[0].bounds.y1 - rects[0].bounds.y0 - 0.6).abs() < 1e-9);
        assert!((rects[1].bounds.y1 - rects[1].bounds.y0 - 0.3).abs() < 1e-9);
        assert_eq!(rects[0].fill.as_deref(), Some("#1E90FF"));
        assert_eq!(rects[1].fill.as_deref(), Some("#FFA500"));
        assert_eq!(scene.markers.len(), 2);
        assert_eq!(scene.markers[0].x, 1500.0);
        assert_eq!(scene.markers[0].y, 1.0);
    }

    #[test]
    fn test_track_labels() {
        let opts = PlotOptions::default();
        let t2 = Transcript::new("t2", "ACTA1", "retained_intron", Strand::Reverse, 800, 4000)
            .with_utrs([(800, 900)]);
        let scene = build_gene_figure(&[acta1(), t2], &[], &opts);
        assert_eq!(scene.labels.len(), 2);
        assert_eq!(scene.labels[0].text, "t1 (ACTA1)");
        assert_eq!((scene.labels[0].x, scene.labels[0].y), (1000.0, 2.0));
        assert_eq!(scene.labels[1].text, "t2 (ACTA1)");
        assert_eq!((scene.labels[1].x, scene.labels[1].y), (800.0, 1.0));
        assert!(scene
            .labels
            .iter()
            .all(|l| l.anchor == TextAnchor::Right && l.panel == PanelId::Structure));
    }

    #[test]
    fn test_empty_plan_gives_placeholder() {
        let opts = PlotOptions::default();
        let scene = build_gene_figure(&[], &[MeasurementPoint::new(1, 0.5, "Liver")], &opts);
        assert!(scene.is_empty());
        assert!(scene.scatter.is_none());
    }

    #[test]
    fn test_scene_cache() {
        let opts = PlotOptions::default();
        let mut cache = SceneCache::new(2);
        let mut builds = 0;
        for _ in 0..3 {
            let scene = cache.get_or_build("ACTA1", "macFas5", || {
                builds += 1;
                build_gene_figure(&[acta1()], &[], &opts)
            });
            assert_eq!(scene.layout.title.text, "ACTA1");
        }
        assert_eq!(builds, 1);
        cache.get_or_build("ACTA1", "hg38", || Scene::placeholder(400));
        assert_eq!(cache.len(), 2);
    }
}
