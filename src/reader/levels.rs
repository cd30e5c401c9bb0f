use crate::maire_utils::{open_line_reader, round_to};
use crate::schema::LEVEL_DECIMALS;
use crate::transcript::MeasurementPoint;
use anyhow::{bail, Context};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

const HEADER_PREFIX: &str = "Chromosome";
const N_COLUMNS: usize = 4;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Restricts which editing-level rows are kept.
///
/// * `chromosome`: keep only rows on this chromosome.
/// * `window`: keep only rows whose position lies in this inclusive range.
pub struct LevelsFilter {
    pub chromosome: Option<String>,
    pub window: Option<(i64, i64)>,
}

impl LevelsFilter {
    /// A filter selecting the sites of one gene locus.
    pub fn locus<S: Into<String>>(chromosome: S, start: i64, end: i64) -> LevelsFilter {
        LevelsFilter {
            chromosome: Some(chromosome.into()),
            window: Some((start, end)),
        }
    }

    pub fn keeps(&self, chromosome: &str, position: i64) -> bool {
        if let Some(c) = &self.chromosome {
            if c != chromosome {
                return false;
            }
        }
        match self.window {
            Some((start, end)) => start <= position && position <= end,
            None => true,
        }
    }
}

/// Reads an editing-level table, gzip compressed or not.
///
/// The file is tab separated with the columns `chromosome`, `position`, `tissue` and
/// `level`, and may start with a header line beginning with `Chromosome`.
pub fn read_levels<T: AsRef<Path>>(
    file_path: T,
    filter: &LevelsFilter,
) -> anyhow::Result<Vec<MeasurementPoint>> {
    let file_path = file_path.as_ref();
    let rdr = open_line_reader(file_path)
        .with_context(|| format!("Could not open the levels file {:?}", file_path))?;
    let points = read_levels_from(rdr, filter)
        .with_context(|| format!("Failed parsing the levels file {:?}", file_path))?;
    info!(
        "Read {} editing-level points from {:?}",
        points.len(),
        file_path
    );
    Ok(points)
}

/// Reads editing-level rows from any buffered reader. Empty lines are skipped.
pub fn read_levels_from<R: BufRead>(
    rdr: R,
    filter: &LevelsFilter,
) -> anyhow::Result<Vec<MeasurementPoint>> {
    let mut points = Vec::new();
    for (idx, l) in rdr.lines().enumerate() {
        let line = l?;
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || (idx == 0 && line.starts_with(HEADER_PREFIX)) {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != N_COLUMNS {
            bail!(
                "line {}: expected {} tab-separated columns, found {}",
                line_no,
                N_COLUMNS,
                fields.len()
            );
        }
        let position: i64 = fields[1]
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid position {:?}", line_no, fields[1]))?;
        let level: f64 = fields[3]
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid level {:?}", line_no, fields[3]))?;

        if filter.keeps(fields[0], position) {
            points.push(MeasurementPoint::new(
                position,
                round_to(level, LEVEL_DECIMALS),
                fields[2],
            ));
        }
    }
    Ok(points)
}
