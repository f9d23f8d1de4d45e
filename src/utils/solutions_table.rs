//! Galaxy Zoo solutions files
//!
//! Reads `solutions_training.csv` (a `GalaxyID` column followed by the 37
//! class columns) into a [`LabelTable`], and writes predictions back out in the
//! same layout with the same header row.

use crate::core_modules::label_vector::{LABEL_COUNT, LabelTable, LabelVector};
use crate::core_modules::prediction_assigner::PredictionTable;
use crate::error::{BenchmarkError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fields in every row: the galaxy id plus one per class.
pub const ROW_FIELDS: usize = LABEL_COUNT + 1;

pub fn read_solutions(path: &Path) -> Result<LabelTable> {
    let contents = fs::read_to_string(path).map_err(|err| BenchmarkError::io(path, err))?;
    let table = parse_solutions(&contents, path)?;
    info!(
        "Read {} training solutions from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Parses solutions text. `source` only labels error messages.
pub fn parse_solutions(contents: &str, source: &Path) -> Result<LabelTable> {
    let mut lines = contents.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) if !line.trim().is_empty() => split_fields(line),
        _ => return Err(BenchmarkError::parse(source, 1, "missing header row")),
    };
    if header.len() != ROW_FIELDS {
        return Err(BenchmarkError::parse(
            source,
            1,
            format!("header has {} fields, expected {}", header.len(), ROW_FIELDS),
        ));
    }

    let mut table = LabelTable::new(header);
    for (index, line) in lines {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_fields(line);
        if fields.len() != ROW_FIELDS {
            return Err(BenchmarkError::parse(
                source,
                line_number,
                format!("expected {} fields, found {}", ROW_FIELDS, fields.len()),
            ));
        }

        let identifier = fields[0].clone();
        if identifier.is_empty() {
            return Err(BenchmarkError::parse(source, line_number, "empty galaxy id"));
        }

        let values = fields[1..]
            .iter()
            .map(|field| parse_probability(field))
            .collect::<std::result::Result<Vec<f64>, String>>()
            .map_err(|message| BenchmarkError::parse(source, line_number, message))?;
        let labels = LabelVector::try_from(values)?;

        if table.insert(identifier.clone(), labels).is_err() {
            return Err(BenchmarkError::parse(
                source,
                line_number,
                format!("galaxy {} is listed twice", identifier),
            ));
        }
    }

    Ok(table)
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

fn parse_probability(field: &str) -> std::result::Result<f64, String> {
    let value: f64 = field
        .parse()
        .map_err(|_| format!("cannot convert {:?} to a number", field))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("value {} is outside [0, 1]", field));
    }
    Ok(value)
}

/// Formats one output row: the galaxy id followed by 37 plainly formatted numbers.
pub fn format_row(identifier: &str, labels: &LabelVector) -> Result<String> {
    let mut fields = Vec::with_capacity(ROW_FIELDS);
    fields.push(identifier.to_string());
    fields.extend(labels.iter().map(|value| value.to_string()));

    if fields.len() != ROW_FIELDS {
        return Err(BenchmarkError::DataIntegrity(format!(
            "row for galaxy {} has {} fields, expected {}",
            identifier,
            fields.len(),
            ROW_FIELDS
        )));
    }
    Ok(fields.join(","))
}

pub fn render_predictions(header: &[String], predictions: &PredictionTable) -> Result<String> {
    if header.len() != ROW_FIELDS {
        return Err(BenchmarkError::DataIntegrity(format!(
            "output header has {} fields, expected {}",
            header.len(),
            ROW_FIELDS
        )));
    }

    let mut out = String::new();
    out.push_str(&header.join(","));
    out.push('\n');
    for (identifier, labels) in predictions.iter() {
        out.push_str(&format_row(identifier, labels)?);
        out.push('\n');
    }
    Ok(out)
}

/// Writes the prediction file. The content goes to a sibling `.partial` file
/// first and is renamed into place, so a failed run leaves no output behind.
pub fn write_predictions(
    path: &Path,
    header: &[String],
    predictions: &PredictionTable,
) -> Result<usize> {
    let rendered = render_predictions(header, predictions)?;

    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    fs::write(&partial, rendered).map_err(|err| BenchmarkError::io(&partial, err))?;
    fs::rename(&partial, path).map_err(|err| BenchmarkError::io(path, err))?;

    info!(
        "Number of predictions made = {} ({})",
        predictions.len(),
        path.display()
    );
    Ok(predictions.len())
}
