use maire::figure::{assemble, build_gene_figure};
use maire::layout::{plan, ArrowDirection};
use maire::maire_utils::Strand;
use maire::options::PlotOptions;
use maire::reader::gtf::AnnotationTable;
use maire::reader::levels::{read_levels_from, LevelsFilter};
use maire::scene::{PanelId, ScatterMode, Scene, ShapeKind};
use maire::transcript::{MeasurementPoint, Transcript};

fn forward(id: &str, start: i64, end: i64) -> Transcript {
    Transcript::new(id, "ACTA1", "protein_coding", Strand::Forward, start, end)
}

fn points(n: usize) -> Vec<MeasurementPoint> {
    (0..n)
        .map(|i| MeasurementPoint::new(1000 + i as i64 * 10, 0.5, "Brain"))
        .collect()
}

#[test]
fn single_transcript_without_levels() {
    let opts = PlotOptions::default();
    let t = forward("t1", 1000, 5000).with_coding_exons([(1200, 1800)]);
    let scene = build_gene_figure(&[t], &[], &opts);

    assert_eq!(scene.layout.panel_count(), 1);
    let lines: Vec<_> = scene.shapes_of(ShapeKind::Line).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!((lines[0].bounds.x0, lines[0].bounds.x1), (1000.0, 5000.0));
    assert_eq!(scene.shapes_of(ShapeKind::Rect).count(), 1);
    assert!(!scene.arrows.is_empty());
    assert!(scene
        .arrows
        .iter()
        .all(|a| a.direction == ArrowDirection::Right && a.tail_dx < 0.0));

    let panel = scene.layout.panel(PanelId::Structure).unwrap();
    assert_eq!((panel.x_range.min, panel.x_range.max), (0.0, 6000.0));
    let y = panel.y_range.unwrap();
    assert_eq!((y.min, y.max), (0.0, 2.0));
    assert!(scene.scatter.is_none());
    assert!(scene.notes.is_empty());
}

#[test]
fn overlapping_exons_render_once() {
    let opts = PlotOptions::default();
    let t = forward("t1", 0, 1000).with_coding_exons([(100, 200), (150, 300)]);
    let scene = build_gene_figure(&[t], &[], &opts);
    let rects: Vec<_> = scene.shapes_of(ShapeKind::Rect).collect();
    assert_eq!(rects.len(), 1);
    assert_eq!((rects[0].bounds.x0, rects[0].bounds.x1), (100.0, 300.0));
    assert_eq!(scene.markers.len(), 1);
}

#[test]
fn transcript_cap_adds_notice() {
    let opts = PlotOptions::default();
    let ts: Vec<Transcript> = (0..7)
        .map(|i| forward(&format!("t{}", i), 1000, 5000).with_utrs([(1000, 1100)]))
        .collect();
    let scene = build_gene_figure(&ts, &[], &opts);
    assert_eq!(scene.shapes_of(ShapeKind::Line).count(), 5);
    assert_eq!(scene.notes.len(), 1);
    assert_eq!(scene.notes[0].text, "Showing 5 of 7 transcripts");
    assert!(!scene.notes[0].interactive);
    assert_eq!(scene.layout.height_px, 900);
}

#[test]
fn zero_transcript_cap_still_reports_truncation() {
    let opts = PlotOptions::default().with_max_transcripts(0);
    let ts = vec![
        forward("t1", 1000, 5000).with_coding_exons([(1200, 1800)]),
        forward("t2", 1000, 5000).with_coding_exons([(1200, 1800)]),
    ];
    let scene = build_gene_figure(&ts, &[], &opts);
    assert!(!scene.is_empty());
    assert_eq!(scene.labels.len(), 1);
    assert_eq!(scene.notes.len(), 1);
    assert_eq!(scene.notes[0].text, "Showing 1 of 2 transcripts");
}

#[test]
fn reverse_strand_arrows_point_left() {
    let opts = PlotOptions::default();
    let t = Transcript::new("t1", "ACTA1", "protein_coding", Strand::Reverse, 0, 3000)
        .with_coding_exons([(100, 200)]);
    let scene = build_gene_figure(&[t], &[], &opts);
    assert!(!scene.arrows.is_empty());
    assert!(scene.arrows.len() <= opts.max_arrows_per_transcript);
    assert!(scene
        .arrows
        .iter()
        .all(|a| a.tail_dx > 0.0 && a.direction == ArrowDirection::Left));
}

#[test]
fn scatter_mode_follows_point_count() {
    let opts = PlotOptions::default();
    let t = forward("t1", 1000, 5000).with_coding_exons([(1200, 1800)]);

    let dense = build_gene_figure(std::slice::from_ref(&t), &points(150), &opts);
    assert_eq!(dense.scatter.as_ref().unwrap().mode, ScatterMode::Accelerated);

    let sparse = build_gene_figure(&[t], &points(50), &opts);
    let scatter = sparse.scatter.as_ref().unwrap();
    assert_eq!(scatter.mode, ScatterMode::Standard);
    assert_eq!(scatter.len(), 50);
    assert_eq!(scatter.panel, PanelId::Levels);
}

#[test]
fn panels_share_the_x_range() {
    let opts = PlotOptions::default();
    let t = forward("t1", 1000, 5000).with_coding_exons([(1200, 1800)]);
    let scene = build_gene_figure(&[t], &points(3), &opts);
    assert_eq!(scene.layout.panel_count(), 2);
    let top = scene.layout.panel(PanelId::Structure).unwrap();
    let bottom = scene.layout.panel(PanelId::Levels).unwrap();
    assert_eq!(top.x_range, bottom.x_range);
    assert!(!top.x_tick_labels);
    assert_eq!(bottom.y_title.as_deref(), Some("Editing Level"));
    assert!((top.height_fraction + bottom.height_fraction - 1.0).abs() < 1e-9);
}

#[test]
fn arrows_stay_bounded_for_long_transcripts() {
    let opts = PlotOptions::default().with_max_arrows(2);
    let ts = vec![
        forward("long", 0, 1_000_000).with_coding_exons([(10, 20)]),
        forward("short", 0, 400).with_coding_exons([(10, 20)]),
    ];
    let p = plan(&ts, &opts);
    for row in p.rows.iter() {
        assert!(!row.arrows.is_empty());
        assert!(row.arrows.len() <= 2);
        for a in row.arrows.iter() {
            assert!(row.transcript.start <= a.position && a.position <= row.transcript.end);
        }
    }
}

#[test]
fn nothing_drawable_gives_placeholder() {
    let opts = PlotOptions::default();
    let scene = build_gene_figure(&[forward("t1", 0, 100)], &points(5), &opts);
    assert!(scene.is_empty());
    assert_eq!(scene.layout.panel_count(), 1);
    assert!(scene.scatter.is_none());

    let empty = assemble(&plan(&[], &opts), &[], &opts);
    assert_eq!(empty, Scene::placeholder(opts.base_height_px));
}

#[test]
fn scene_json_round_trip() -> anyhow::Result<()> {
    let opts = PlotOptions::default();
    let t = forward("t1", 1000, 5000)
        .with_coding_exons([(1200, 1800)])
        .with_utrs([(1000, 1199)]);
    let scene = build_gene_figure(&[t], &points(2), &opts);
    let json = scene.to_json(true)?;
    assert!(json.contains("\"kind\": \"rect\""));
    let back: Scene = serde_json::from_str(&json)?;
    assert_eq!(back, scene);
    Ok(())
}

const GTF: &[u8] = b"chr1\tHAVANA\ttranscript\t1000\t5000\t.\t+\t.\tgene_id \"ENSG1\"; transcript_id \"ENST1\"; gene_name \"ACTA1\"; transcript_type \"protein_coding\";\nchr1\tHAVANA\tCDS\t1200\t1800\t.\t+\t0\tgene_id \"ENSG1\"; transcript_id \"ENST1\"; gene_name \"ACTA1\"; transcript_type \"protein_coding\";\nchr1\tHAVANA\tUTR\t4500\t5000\t.\t+\t.\tgene_id \"ENSG1\"; transcript_id \"ENST1\"; gene_name \"ACTA1\"; transcript_type \"protein_coding\";\n";

const LEVELS: &[u8] =
    b"Chromosome\tpos\ttissue\tlevel\nchr1\t1500\tBrain\t0.25\nchr1\t9000\tBrain\t0.75\nchr2\t1500\tLiver\t0.1\n";

#[test]
fn gtf_and_levels_to_scene() -> anyhow::Result<()> {
    let opts = PlotOptions::default();
    let table = AnnotationTable::from_gtf_reader(GTF)?;
    let transcripts = table.transcripts_for_gene("ACTA1")?;
    assert_eq!(transcripts.len(), 1);

    let (chromosome, start, end) = table.gene_locus("ACTA1")?.unwrap();
    let filter = LevelsFilter::locus(chromosome, start, end);
    let measurements = read_levels_from(LEVELS, &filter)?;
    assert_eq!(measurements.len(), 1);

    let scene = build_gene_figure(&transcripts, &measurements, &opts);
    assert_eq!(scene.layout.title.text, "ACTA1");
    assert_eq!(scene.shapes_of(ShapeKind::Rect).count(), 2);
    assert_eq!(scene.layout.panel_count(), 2);
    let scatter = scene.scatter.as_ref().unwrap();
    assert_eq!(scatter.x, vec![1500]);
    assert!(scatter.text[0].contains("Position: 1,500"));
    Ok(())
}
