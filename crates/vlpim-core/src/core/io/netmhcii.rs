//! Parser for MHC class II epitope-predictor text output.
//!
//! Two layouts are recognized:
//!
//! - **Standard**: whitespace separated rows
//!   `Pos Peptide ID Allele Core %Rank_EL BA_Rank BA_IC50 BA_Raw [Score]`, with
//!   an older 8-column variant `Pos Peptide ID Allele BA_Rank BA_IC50 BA_Raw Score`.
//! - **Wide**: tab separated, one block of seven columns
//!   (`Core Inverted Score Rank Score_BA nM Rank_BA`) per allele after
//!   `Pos Peptide ID Target`. The allele names appear in one of the first
//!   three lines.
//!
//! Comment lines, headers and rows that do not parse are skipped.

use crate::core::models::binding::BindingPrediction;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const WIDE_COLUMNS_PER_ALLELE: usize = 7;
const WIDE_FIRST_ALLELE_COLUMN: usize = 4;
const WIDE_HEADER_SCAN_LINES: usize = 3;

#[derive(Debug, Error)]
pub enum NetMhcError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No binding predictions could be parsed")]
    NoPredictions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    Standard,
    Wide,
}

fn is_allele_name(field: &str) -> bool {
    let upper = field.to_ascii_uppercase();
    upper.contains("HLA-") || upper.contains("DRB1_")
}

// The allele header is tab separated and is not itself a data row, which
// distinguishes it from standard rows that also mention allele names.
fn is_allele_header(line: &str) -> bool {
    let mut fields = line.split('\t');
    let first_is_position = fields
        .next()
        .is_some_and(|f| f.trim().parse::<usize>().is_ok());
    line.contains('\t') && !first_is_position && is_allele_name(line)
}

fn detect_layout(lines: &[String]) -> (OutputLayout, Vec<String>) {
    for line in lines.iter().take(WIDE_HEADER_SCAN_LINES) {
        if is_allele_header(line) {
            let alleles = line
                .split('\t')
                .map(str::trim)
                .filter(|part| is_allele_name(part))
                .map(str::to_string)
                .collect();
            return (OutputLayout::Wide, alleles);
        }
    }
    (OutputLayout::Standard, Vec::new())
}

fn core_or_none(core: &str) -> Option<String> {
    (!core.is_empty() && core != "NA").then(|| core.to_string())
}

fn parse_standard_row(parts: &[&str]) -> Option<BindingPrediction> {
    if parts.len() < 9 {
        return None;
    }
    let position = parts[0].parse().ok()?;
    let rank_el = parts[5].parse().ok()?;
    let rank_ba = parts[6].parse().ok()?;
    let ic50 = parts[7].parse().ok()?;
    let raw: f64 = parts[8].parse().ok()?;
    let score = parts.get(9).and_then(|s| s.parse().ok()).or(Some(raw));
    Some(BindingPrediction {
        position,
        peptide: parts[1].to_string(),
        sequence_id: parts[2].to_string(),
        allele: parts[3].to_string(),
        core: core_or_none(parts[4]),
        rank_el: Some(rank_el),
        rank_ba: Some(rank_ba),
        ic50: Some(ic50),
        score,
    })
}

fn parse_short_row(parts: &[&str]) -> Option<BindingPrediction> {
    if parts.len() < 8 {
        return None;
    }
    let position = parts[0].parse().ok()?;
    let rank_ba = parts[4].parse().ok()?;
    let ic50 = parts[5].parse().ok()?;
    let _raw: f64 = parts[6].parse().ok()?;
    let score = parts[7].parse().ok()?;
    Some(BindingPrediction {
        position,
        peptide: parts[1].to_string(),
        sequence_id: parts[2].to_string(),
        allele: parts[3].to_string(),
        core: None,
        rank_el: None,
        rank_ba: Some(rank_ba),
        ic50: Some(ic50),
        score: Some(score),
    })
}

fn parse_standard(lines: &[String]) -> Vec<BindingPrediction> {
    let mut predictions = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parse_standard_row(&parts).or_else(|| parse_short_row(&parts)) {
            Some(prediction) => predictions.push(prediction),
            None => debug!(line, "Skipping unparseable prediction row"),
        }
    }
    predictions
}

fn parse_wide(lines: &[String], alleles: &[String]) -> Vec<BindingPrediction> {
    let mut predictions = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
        if parts.len() < 5 {
            continue;
        }
        let Ok(position) = parts[0].parse::<usize>() else {
            continue;
        };
        let peptide = parts[1];
        let sequence_id = parts.get(2).copied().unwrap_or("Sequence");

        for (i, allele) in alleles.iter().enumerate() {
            let first = WIDE_FIRST_ALLELE_COLUMN + i * WIDE_COLUMNS_PER_ALLELE;
            let Some(block) = parts.get(first..first + WIDE_COLUMNS_PER_ALLELE) else {
                continue;
            };
            let numbers: Option<Vec<f64>> = block[2..].iter().map(|v| v.parse().ok()).collect();
            let Some(numbers) = numbers else {
                continue;
            };
            // numbers: Score, Rank, Score_BA, nM, Rank_BA
            predictions.push(BindingPrediction {
                position,
                peptide: peptide.to_string(),
                sequence_id: sequence_id.to_string(),
                allele: allele.clone(),
                core: core_or_none(block[0]),
                rank_el: Some(numbers[1]),
                rank_ba: Some(numbers[4]),
                ic50: Some(numbers[3]),
                score: Some(numbers[0]),
            });
        }
    }
    predictions
}

/// Parses predictor output, detecting the layout from the first lines.
pub fn read_predictions(reader: &mut impl BufRead) -> Result<Vec<BindingPrediction>, NetMhcError> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    let (layout, alleles) = detect_layout(&lines);

    let predictions = match layout {
        OutputLayout::Wide => {
            info!(alleles = alleles.len(), "Detected wide prediction layout");
            parse_wide(&lines, &alleles)
        }
        OutputLayout::Standard => {
            info!("Detected standard prediction layout");
            parse_standard(&lines)
        }
    };

    if predictions.is_empty() {
        return Err(NetMhcError::NoPredictions);
    }
    info!(count = predictions.len(), "Parsed binding predictions");
    Ok(predictions)
}

pub fn read_predictions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<BindingPrediction>, NetMhcError> {
    let file = File::open(path)?;
    read_predictions(&mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_predictions_parses_standard_layout() {
        let data = "\
# NetMHCIIpan output
Pos Peptide ID Allele Core %Rank_EL BA_Rank BA_IC50 BA_Raw Score
  1 PKYVKQNTLKLAT seq DRB1_0101 YVKQNTLKL 0.45 1.20 25.3 0.71 0.88
  2 KYVKQNTLKLATG seq DRB1_0101 NA 6.10 7.20 812.0 0.20
";
        let predictions = read_predictions(&mut Cursor::new(data)).unwrap();
        assert_eq!(predictions.len(), 2);

        let first = &predictions[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.peptide, "PKYVKQNTLKLAT");
        assert_eq!(first.core.as_deref(), Some("YVKQNTLKL"));
        assert_eq!(first.rank_el, Some(0.45));
        assert_eq!(first.ic50, Some(25.3));
        assert_eq!(first.score, Some(0.88));

        let second = &predictions[1];
        assert_eq!(second.core, None);
        assert_eq!(second.score, Some(0.20));
    }

    #[test]
    fn read_predictions_falls_back_to_short_layout() {
        let data = "3 YVKQNTLKLATGM seq DRB1_0401 2.5 150.0 0.40 0.55\n";
        let predictions = read_predictions(&mut Cursor::new(data)).unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].rank_el, None);
        assert_eq!(predictions[0].percentile_rank(), Some(2.5));
    }

    #[test]
    fn read_predictions_parses_wide_layout() {
        let data = "\
\t\t\t\tDRB1_0101\t\t\t\t\t\t\tHLA-DQA10501-DQB10201
Pos\tPeptide\tID\tTarget\tCore\tInverted\tScore\tRank\tScore_BA\tnM\tRank_BA\tCore\tInverted\tScore\tRank\tScore_BA\tnM\tRank_BA
1\tPKYVKQNTLKLAT\tseq\tNA\tYVKQNTLKL\t0\t0.9\t0.3\t0.7\t20.5\t1.1\tKQNTLKLAT\t0\t0.1\t12.0\t0.2\t900.0\t30.0
";
        let predictions = read_predictions(&mut Cursor::new(data)).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].allele, "DRB1_0101");
        assert_eq!(predictions[0].rank_el, Some(0.3));
        assert_eq!(predictions[0].ic50, Some(20.5));
        assert_eq!(predictions[1].allele, "HLA-DQA10501-DQB10201");
        assert_eq!(predictions[1].core.as_deref(), Some("KQNTLKLAT"));
        assert_eq!(predictions[1].rank_ba, Some(30.0));
    }

    #[test]
    fn read_predictions_without_rows_is_an_error() {
        let err = read_predictions(&mut Cursor::new("# nothing here\n")).unwrap_err();
        assert!(matches!(err, NetMhcError::NoPredictions));
    }
}
