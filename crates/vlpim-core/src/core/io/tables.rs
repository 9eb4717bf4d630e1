use crate::core::models::binding::AlleleBindingRecord;
use crate::core::models::candidate::{InterfaceMetrics, RankedCandidate};
use crate::core::models::epitope::{EpitopeRow, ExtendedEpitope};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// One line of the candidate manifest: where a candidate's predicted structure
/// lives and, optionally, its interface metrics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestRow {
    pub candidate_id: String,
    pub structure: PathBuf,
    #[serde(default)]
    pub dg_dsasa: Option<f64>,
    #[serde(default)]
    pub packstat: Option<f64>,
    #[serde(default)]
    pub buns: Option<f64>,
    #[serde(default)]
    pub interface_sc: Option<f64>,
}

impl ManifestRow {
    /// Interface metrics, present only when the three required values are.
    pub fn interface_metrics(&self) -> Option<InterfaceMetrics> {
        Some(InterfaceMetrics {
            dg_dsasa: self.dg_dsasa?,
            packstat: self.packstat?,
            buns: self.buns?,
            interface_sc: self.interface_sc,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub candidate_id: String,
    pub final_rank: Option<usize>,
    pub overall_immunogenicity_score: Option<f64>,
    pub rmsd: Option<f64>,
    pub method_used: Option<String>,
    pub dg_dsasa: Option<f64>,
    pub packstat: Option<f64>,
    pub buns: Option<f64>,
    pub interface_quality: Option<String>,
    pub rejected_reason: Option<String>,
}

impl ReportRow {
    pub fn new(candidate: &RankedCandidate, interface_quality: Option<String>) -> Self {
        Self {
            candidate_id: candidate.candidate_id.clone(),
            final_rank: candidate.final_rank,
            overall_immunogenicity_score: candidate.score.as_ref().map(|s| s.overall_score),
            rmsd: candidate.rmsd.as_ref().map(|r| r.value),
            method_used: candidate.rmsd.as_ref().map(|r| r.method_used.to_string()),
            dg_dsasa: candidate.interface.map(|m| m.dg_dsasa),
            packstat: candidate.interface.map(|m| m.packstat),
            buns: candidate.interface.map(|m| m.buns),
            interface_quality,
            rejected_reason: candidate.rejected_reason.as_ref().map(|r| r.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct EpitopeTableRow<'a> {
    epitope_id: &'a str,
    core_sequence: &'a str,
    core_start: usize,
    core_end: usize,
    sequence: &'a str,
    start: usize,
    end: usize,
    length: usize,
    truncated: bool,
    source: String,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| TableError::Csv {
            path: path_string(path),
            source: e,
        })?;

    reader
        .deserialize::<T>()
        .map(|row| {
            row.map_err(|e| TableError::Csv {
                path: path_string(path),
                source: e,
            })
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| TableError::Csv {
        path: path_string(path),
        source: e,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| TableError::Csv {
            path: path_string(path),
            source: e,
        })?;
    }
    writer.flush().map_err(|e| TableError::Io {
        path: path_string(path),
        source: e,
    })
}

/// Reads user epitopes from a `sequence,start,end` table.
pub fn read_epitope_rows(path: &Path) -> Result<Vec<EpitopeRow>, TableError> {
    read_rows(path)
}

/// Reads a `candidate_id,epitope_id,allele,value,metric` table.
pub fn read_binding_records(path: &Path) -> Result<Vec<AlleleBindingRecord>, TableError> {
    read_rows(path)
}

pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>, TableError> {
    read_rows(path)
}

pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), TableError> {
    write_rows(path, rows)
}

pub fn write_epitopes(path: &Path, epitopes: &[ExtendedEpitope]) -> Result<(), TableError> {
    write_rows(
        path,
        epitopes.iter().map(|e| EpitopeTableRow {
            epitope_id: &e.core.id,
            core_sequence: &e.core.sequence,
            core_start: e.core.start,
            core_end: e.core.end,
            sequence: &e.sequence,
            start: e.start,
            end: e.end,
            length: e.len(),
            truncated: e.truncated,
            source: e.core.source.to_string(),
        }),
    )
}
