//! Renderer-agnostic description of a gene figure.
//!
//! A [Scene] is plain data: shapes, hover markers, arrows, notes, an optional scatter
//! series and the layout of one or two vertically stacked panels sharing an x axis. Any
//! 2D plotting surface with layered shapes, scatter traces and annotations can draw it;
//! it serializes to JSON for hand-off.

use crate::layout::ArrowDirection;
use crate::maire_utils::UNKNOWN_GENE;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// The panel an element is drawn in.
pub enum PanelId {
    /// The stacked transcript tracks; always present.
    Structure,
    /// The editing-level scatter; present only when there are measurements.
    Levels,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Line,
    Rect,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A line or a filled rectangle in data coordinates.
pub struct Shape {
    pub kind: ShapeKind,
    pub bounds: Bounds,
    pub fill: Option<String>,
    pub line_color: String,
    pub line_width: f64,
    pub panel: PanelId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// An invisible point carrying a tooltip.
pub struct HoverMarker {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub panel: PanelId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A directional arrow with its head at `(x, y)` and its tail at `(x + tail_dx, y)`.
pub struct Arrow {
    pub x: f64,
    pub y: f64,
    pub tail_dx: f64,
    pub direction: ArrowDirection,
    pub color: String,
    pub panel: PanelId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A fixed text annotation positioned in figure (paper) coordinates, `[0, 1]` on both axes.
pub struct Note {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub interactive: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which side of the text sits on the label's x coordinate.
pub enum TextAnchor {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A text label in data coordinates, vertically centred on `y`. Track labels end at the
/// transcript start (`anchor: Right`) so they sit left of their track.
pub struct TrackLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub anchor: TextAnchor,
    pub panel: PanelId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// How the scatter should be rendered. `Accelerated` asks for a GPU-backed trace.
pub enum ScatterMode {
    Standard,
    Accelerated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub x: Vec<i64>,
    pub y: Vec<f64>,
    pub text: Vec<String>,
    pub mode: ScatterMode,
    pub color: String,
    pub panel: PanelId,
}

impl ScatterSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> AxisRange {
        AxisRange { min, max }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Axis configuration of one panel.
///
/// `y_range` is `None` when the renderer should fit the y axis to the data.
pub struct PanelLayout {
    pub id: PanelId,
    pub height_fraction: f64,
    pub x_range: AxisRange,
    pub y_range: Option<AxisRange>,
    pub y_visible: bool,
    pub x_tick_labels: bool,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// The figure title; `x` is in paper coordinates, so `0.5` centres it.
pub struct Title {
    pub text: String,
    pub x: f64,
}

impl Title {
    pub fn centered<S: Into<String>>(text: S) -> Title {
        Title {
            text: text.into(),
            x: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    pub title: Title,
    pub panels: Vec<PanelLayout>,
    pub panel_spacing: f64,
    pub height_px: u32,
}

impl SceneLayout {
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn panel(&self, id: PanelId) -> Option<&PanelLayout> {
        self.panels.iter().find(|p| p.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A complete gene figure.
///
/// Element collections keep their emission order: per track, the line first, then
/// rectangles, so renderers that draw in order put the line underneath.
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub markers: Vec<HoverMarker>,
    pub arrows: Vec<Arrow>,
    pub labels: Vec<TrackLabel>,
    pub notes: Vec<Note>,
    pub scatter: Option<ScatterSeries>,
    pub layout: SceneLayout,
}

impl Scene {
    /// The scene returned when there is nothing to draw: a single empty structure panel.
    pub fn placeholder(height_px: u32) -> Scene {
        Scene {
            shapes: Vec::new(),
            markers: Vec::new(),
            arrows: Vec::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            scatter: None,
            layout: SceneLayout {
                title: Title::centered(UNKNOWN_GENE),
                panels: vec![PanelLayout {
                    id: PanelId::Structure,
                    height_fraction: 1.0,
                    x_range: AxisRange::new(0.0, 1.0),
                    y_range: Some(AxisRange::new(0.0, 1.0)),
                    y_visible: false,
                    x_tick_labels: true,
                    x_title: None,
                    y_title: None,
                }],
                panel_spacing: 0.0,
                height_px,
            },
        }
    }

    /// `true` for the placeholder scene, i.e. when no track was drawn.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes_of(&self, kind: ShapeKind) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(move |s| s.kind == kind)
    }

    /// Serializes the scene to JSON.
    pub fn to_json(&self, pretty: bool) -> anyhow::Result<String> {
        let s = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let scene = Scene::placeholder(400);
        assert!(scene.is_empty());
        assert_eq!(scene.layout.panel_count(), 1);
        assert_eq!(scene.layout.title.text, "Unknown Gene");
        assert!(scene.layout.panel(PanelId::Levels).is_none());
    }

    #[test]
    fn test_json_tags() {
        let scene = Scene::placeholder(400);
        let json = scene.to_json(false).unwrap();
        assert!(json.contains("\"id\":\"structure\""));
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scene);
    }
}
