//! Tabular adapter (Polars)
//!
//! Hosts hand batches over as DataFrames. This module converts a frame to
//! `TreeRecord`s, attaches derived label / cluster columns back onto it, and
//! reads or writes CSV for the command-line host.
//!
//! Column names are accepted in English or as on the estate field sheets:
//!
//! | record field | accepted columns |
//! |---|---|
//! | tree_id | tree_id, id_pohon |
//! | cluster_label | cluster_label, cluster (optional) |
//! | soil_ph | soil_ph, ph_tanah |
//! | moisture_pct | moisture_pct, kelembaban |
//! | bunch_count | bunch_count, jumlah_janjang |
//! | bunch_weight_kg | bunch_weight_kg, berat_tbs_kg, berat_tbs |
//! | height_cm | height_cm, tinggi_cm (optional) |
//! | has_disease | has_disease, penyakit (bool or 0/1) |

use polars::prelude::*;
use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::path::Path;

use crate::classifier::HealthScore;
use crate::clusterer::ClusteringResult;
use crate::error::HealthError;
use crate::record::TreeRecord;

const TREE_ID: &[&str] = &["tree_id", "id_pohon"];
const CLUSTER_LABEL: &[&str] = &["cluster_label", "cluster"];
const SOIL_PH: &[&str] = &["soil_ph", "ph_tanah"];
const MOISTURE: &[&str] = &["moisture_pct", "kelembaban"];
const BUNCHES: &[&str] = &["bunch_count", "jumlah_janjang"];
const WEIGHT: &[&str] = &["bunch_weight_kg", "berat_tbs_kg", "berat_tbs"];
const HEIGHT: &[&str] = &["height_cm", "tinggi_cm"];
const DISEASE: &[&str] = &["has_disease", "penyakit"];

/// First present column among the aliases
fn find_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Option<&'a Column> {
    aliases.iter().find_map(|name| df.column(name).ok())
}

fn require_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Result<&'a Column> {
    find_column(df, aliases).ok_or_else(|| {
        let available: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        anyhow!("Missing column {:?}. Available columns: {:?}", aliases, available)
    })
}

fn as_f64(column: &Column) -> Result<Float64Chunked> {
    let cast = column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", column.name()))?;
    Ok(cast.f64()?.clone())
}

fn as_str(column: &Column) -> Result<StringChunked> {
    let cast = column
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", column.name()))?;
    Ok(cast.str()?.clone())
}

/// Disease cells must be 0 / 1 (or a boolean cast to them)
fn disease_flag(value: f64, tree_id: &str) -> Result<bool> {
    if !value.is_finite() {
        return Err(HealthError::NonFinite {
            tree_id: tree_id.to_string(),
            field: "has_disease",
            value,
        }
        .into());
    }
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(HealthError::OutOfRange {
            tree_id: tree_id.to_string(),
            field: "has_disease",
            value,
            min: 0.0,
            max: 1.0,
        }
        .into())
    }
}

fn required(value: Option<f64>, tree_id: &str, field: &'static str) -> Result<f64> {
    value.ok_or_else(|| {
        HealthError::MissingField { tree_id: tree_id.to_string(), field }.into()
    })
}

/// Convert a frame to records, one per row
///
/// Null cells in required columns are errors; nothing is defaulted.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<TreeRecord>> {
    let ids = as_str(require_column(df, TREE_ID)?)?;
    let ph = as_f64(require_column(df, SOIL_PH)?)?;
    let moisture = as_f64(require_column(df, MOISTURE)?)?;
    let bunches = as_f64(require_column(df, BUNCHES)?)?;
    let weight = as_f64(require_column(df, WEIGHT)?)?;
    let disease = as_f64(require_column(df, DISEASE)?)?;
    let blocks = find_column(df, CLUSTER_LABEL).map(as_str).transpose()?;
    let heights = find_column(df, HEIGHT).map(as_f64).transpose()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let tree_id = ids
            .get(idx)
            .ok_or_else(|| anyhow!("Row {}: tree id is missing", idx))?
            .to_string();

        let bunch_value = required(bunches.get(idx), &tree_id, "bunch_count")?;
        if bunch_value < 0.0 || bunch_value > f64::from(u32::MAX) {
            return Err(HealthError::OutOfRange {
                tree_id,
                field: "bunch_count",
                value: bunch_value,
                min: 0.0,
                max: f64::from(u32::MAX),
            }
            .into());
        }
        if bunch_value.fract() != 0.0 {
            bail!("Tree '{}': bunch_count {} is not a whole number", tree_id, bunch_value);
        }

        records.push(TreeRecord {
            cluster_label: blocks.as_ref().and_then(|b| b.get(idx)).map(|s| s.to_string()),
            soil_ph: required(ph.get(idx), &tree_id, "soil_ph")?,
            moisture_pct: required(moisture.get(idx), &tree_id, "moisture_pct")?,
            bunch_count: bunch_value as u32,
            bunch_weight_kg: required(weight.get(idx), &tree_id, "bunch_weight_kg")?,
            height_cm: heights.as_ref().and_then(|h| h.get(idx)),
            has_disease: disease_flag(required(disease.get(idx), &tree_id, "has_disease")?, &tree_id)?,
            tree_id,
        });
    }

    Ok(records)
}

/// Build a frame with the English column names
pub fn records_to_frame(records: &[TreeRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new("tree_id".into(), records.iter().map(|r| r.tree_id.as_str()).collect::<Vec<_>>()),
        Column::new(
            "cluster_label".into(),
            records.iter().map(|r| r.cluster_label.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new("soil_ph".into(), records.iter().map(|r| r.soil_ph).collect::<Vec<_>>()),
        Column::new("moisture_pct".into(), records.iter().map(|r| r.moisture_pct).collect::<Vec<_>>()),
        Column::new("bunch_count".into(), records.iter().map(|r| r.bunch_count).collect::<Vec<_>>()),
        Column::new("bunch_weight_kg".into(), records.iter().map(|r| r.bunch_weight_kg).collect::<Vec<_>>()),
        Column::new("height_cm".into(), records.iter().map(|r| r.height_cm).collect::<Vec<_>>()),
        Column::new("has_disease".into(), records.iter().map(|r| r.has_disease).collect::<Vec<_>>()),
    ])
    .with_context(|| "Failed to build records frame")?;

    Ok(df)
}

/// Add `health` and `health_score` columns (row order must match)
pub fn attach_scores(df: &mut DataFrame, scores: &[HealthScore]) -> Result<()> {
    if scores.len() != df.height() {
        bail!("{} scores for a frame of {} rows", scores.len(), df.height());
    }

    let labels: Vec<&str> = scores.iter().map(|s| s.label.display_text()).collect();
    let totals: Vec<u32> = scores.iter().map(|s| s.total).collect();

    df.with_column(Series::new("health".into(), labels))?;
    df.with_column(Series::new("health_score".into(), totals))?;
    Ok(())
}

/// Add `cluster_ml` (batch-local index) and `cluster_name` columns
pub fn attach_clusters(df: &mut DataFrame, clustering: &ClusteringResult) -> Result<()> {
    if clustering.assignments.len() != df.height() {
        bail!(
            "{} cluster assignments for a frame of {} rows",
            clustering.assignments.len(),
            df.height()
        );
    }

    let indices: Vec<u32> = clustering.assignments.iter().map(|a| a.cluster_index as u32).collect();
    let names: Vec<&str> = clustering.assignments.iter().map(|a| a.rank.display_text()).collect();

    df.with_column(Series::new("cluster_ml".into(), indices))?;
    df.with_column(Series::new("cluster_name".into(), names))?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV: {:?}", path))
}
