use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use maire::options::{
    PlotOptions, ARROW_SPACING_BP, AXIS_MARGIN_BP, MAX_ARROWS_PER_TRANSCRIPT, MAX_TRANSCRIPTS,
    SCATTER_GL_THRESHOLD,
};
use maire::reader::gtf::AnnotationTable;
use maire::reader::levels::{read_levels, LevelsFilter};
use peak_alloc::PeakAlloc;
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Render the gene-structure figure of one gene as a JSON scene.
#[derive(Parser, Debug)]
#[command(name = "maire")]
#[command(author, version, about)]
struct Cli {
    /// Gene annotation in GTF format (optionally gzipped)
    #[arg(long)]
    gtf: PathBuf,

    /// Gene symbol or gene id to draw
    #[arg(long)]
    gene: String,

    /// Tab-separated editing levels: chromosome, position, tissue, level
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Maximum number of transcript tracks
    #[arg(long, default_value_t = MAX_TRANSCRIPTS)]
    max_transcripts: usize,

    /// Maximum number of strand arrows per transcript
    #[arg(long, default_value_t = MAX_ARROWS_PER_TRANSCRIPT)]
    max_arrows: usize,

    /// One arrow per this many base pairs of transcript length
    #[arg(long, default_value_t = ARROW_SPACING_BP)]
    arrow_spacing: i64,

    /// Base pairs of padding on each side of the x axis
    #[arg(long, default_value_t = AXIS_MARGIN_BP)]
    margin: i64,

    /// Number of points above which the scatter is drawn accelerated
    #[arg(long, default_value_t = SCATTER_GL_THRESHOLD)]
    gl_threshold: usize,

    /// Output file; the scene is written to stdout when absent
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON scene
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let options = PlotOptions::default()
        .with_max_transcripts(cli.max_transcripts)
        .with_max_arrows(cli.max_arrows)
        .with_arrow_spacing_bp(cli.arrow_spacing)
        .with_axis_margin_bp(cli.margin)
        .with_scatter_gl_threshold(cli.gl_threshold);
    options.validate()?;

    let start = Instant::now();
    let table = AnnotationTable::from_gtf(&cli.gtf)?;
    let duration: Duration = start.elapsed();
    info!("Parsed GTF in {:?}", duration);

    let transcripts = table.transcripts_for_gene(&cli.gene)?;
    if transcripts.is_empty() {
        warn!("No transcripts found for gene {}", cli.gene);
    }

    let measurements = match &cli.levels {
        Some(path) => {
            let filter = match table.gene_locus(&cli.gene)? {
                Some((chromosome, start, end)) => LevelsFilter::locus(chromosome, start, end),
                None => LevelsFilter::default(),
            };
            read_levels(path, &filter)?
        }
        None => Vec::new(),
    };

    let scene = maire::build_gene_figure(&transcripts, &measurements, &options);
    let json = scene.to_json(cli.pretty)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Could not write the scene to {:?}", path))?;
            info!("Wrote the scene to {:?}", path);
        }
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", json)?;
        }
    }

    debug!("Peak memory usage was {} MB", PEAK_ALLOC.peak_usage_as_mb());
    Ok(())
}
