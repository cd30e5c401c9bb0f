//! Maire builds interactive gene-structure figures for [RNA editing](https://en.wikipedia.org/wiki/RNA_editing)
//! data in [Rust](https://www.rust-lang.org/). Given the transcripts of a gene and,
//! optionally, per-tissue editing levels, Maire plans stacked transcript tracks (coding
//! exons, UTRs and strand arrows placed between features) and assembles them, together
//! with a synchronized editing-level scatter, into a renderer-agnostic [Scene] that
//! serializes to JSON.
//!
//! Annotations can be read from GTF files into [Polars](https://pola.rs/) data frames
//! ([reader::gtf]), editing levels from tab-separated tables ([reader::levels]), or taken
//! from already materialized gene records ([schema]).

pub mod figure;
pub mod layout;
pub mod maire_utils;
pub mod memo;
pub mod options;
pub mod reader;
pub mod scene;
pub mod schema;
pub mod transcript;

pub use figure::{build_gene_figure, SceneCache};
pub use layout::{LayoutPlan, LayoutPlanner};
pub use maire_utils::Strand;
pub use options::PlotOptions;
pub use scene::Scene;
pub use transcript::{FeatureInterval, FeatureKind, MeasurementPoint, Transcript};
