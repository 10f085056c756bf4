use crate::error::{Result, SeqletError};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Reads sequences from a FASTA format file and converts them into a Polars DataFrame.
///
/// # Arguments
/// * `filename` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<DataFrame>` - A DataFrame with two columns:
///   - "label": The sequence identifiers (without '>' prefix)
///   - "sequence": The corresponding DNA sequences in uppercase
///
/// # Errors
/// * Returns `SeqletError::InvalidFileFormat` if no sequences are found or sequence data
///   precedes the first header
/// * Returns `SeqletError::DataError` if DataFrame creation fails
/// * Returns `SeqletError::Io` for file reading issues
pub fn read_fasta(filename: &str) -> Result<DataFrame> {
    let file = File::open(filename)?;
    parse_fasta(BufReader::new(file))
}

fn parse_fasta<R: BufRead>(reader: R) -> Result<DataFrame> {
    let mut records: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if let Some((label, sequence)) = current.take() {
                records.push((label, sequence.to_uppercase()));
            }
            current = Some((header.to_string(), String::new()));
        } else if !line.is_empty() {
            match current.as_mut() {
                Some((_, sequence)) => sequence.push_str(line),
                None => {
                    return Err(SeqletError::InvalidFileFormat(format!(
                        "sequence data before first header on line {}",
                        line_no + 1
                    )))
                }
            }
        }
    }

    if let Some((label, sequence)) = current {
        records.push((label, sequence.to_uppercase()));
    }

    if records.is_empty() {
        return Err(SeqletError::InvalidFileFormat("No sequences found".into()));
    }

    let (labels, sequences): (Vec<String>, Vec<String>) = records.into_iter().unzip();
    let df = DataFrame::new(vec![
        Column::new("label".into(), labels),
        Column::new("sequence".into(), sequences),
    ])
    .map_err(|_| SeqletError::DataError("Failed to create DataFrame".into()))?;

    Ok(df)
}
