//! Reading and writing minimal MEME motif files.

use crate::error::{Result, SeqletError};
use crate::pfm::{check_pseudocount, pfm_to_ppm};
use crate::types::{Pfm, PfmCollection, Ppm, DNA_ALPHABET};
use log::{debug, info};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::iter::Peekable;

/// Motif matrices indexed by motif ID, one row per position and one column per letter
pub type MotifCollection = BTreeMap<String, Array2<f64>>;

/// Motif ID written for a filter
pub fn motif_id(filter: usize) -> String {
    format!("filter{}", filter)
}

/// Number of seqlets behind a PFM, read off its first position
fn site_count(pfm: &Pfm) -> usize {
    pfm.rows()
        .into_iter()
        .next()
        .map_or(0.0, |row| row.sum())
        .round() as usize
}

/// Writes PFMs as a MEME version 4 file of letter-probability matrices.
///
/// Each filter becomes a `MOTIF filter<i>` entry whose `nsites` is the number of
/// contributing seqlets. Filters without any seqlets are left out. Every matrix is
/// checked before the file is created, so a failed call leaves nothing behind.
///
/// # Arguments
/// * `pfms` - Position frequency matrices indexed by filter
/// * `filename` - Path of the file to create
/// * `pseudocount` - Added to every count before normalizing
///
/// # Errors
/// * `SeqletError::InvalidArgument` if `pseudocount` is negative or not finite
/// * `SeqletError::InvalidShape` if a PFM does not have one column per DNA letter
/// * `SeqletError::Io` for file writing issues
pub fn write_meme(pfms: &PfmCollection, filename: &str, pseudocount: f64) -> Result<()> {
    check_pseudocount(pseudocount)?;

    let mut motifs: Vec<(usize, usize, Ppm)> = Vec::with_capacity(pfms.len());
    for (&filter, pfm) in pfms {
        if pfm.ncols() != DNA_ALPHABET.len() {
            return Err(SeqletError::invalid_shape(format!(
                "PFM for filter {} has {} columns, expected {}",
                filter,
                pfm.ncols(),
                DNA_ALPHABET.len()
            )));
        }
        let ppm = pfm_to_ppm(pfm, pseudocount)?;
        let nsites = site_count(pfm);
        if nsites == 0 {
            debug!("skipping filter {} with no seqlets", filter);
            continue;
        }
        motifs.push((filter, nsites, ppm));
    }

    let file = File::create(filename)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "MEME version 4")?;
    writeln!(out)?;
    writeln!(out, "ALPHABET= {}", DNA_ALPHABET.iter().collect::<String>())?;
    writeln!(out)?;
    writeln!(out, "strands: + -")?;
    writeln!(out)?;
    writeln!(out, "Background letter frequencies")?;
    let background = 1.0 / DNA_ALPHABET.len() as f64;
    let background: Vec<String> = DNA_ALPHABET
        .iter()
        .map(|letter| format!("{} {}", letter, background))
        .collect();
    writeln!(out, "{}", background.join(" "))?;

    for (filter, nsites, ppm) in &motifs {
        writeln!(out)?;
        writeln!(out, "MOTIF {}", motif_id(*filter))?;
        writeln!(out)?;
        writeln!(
            out,
            "letter-probability matrix: alength= {} w= {} nsites= {} E= 0",
            ppm.ncols(),
            ppm.nrows(),
            nsites
        )?;
        for row in ppm.rows() {
            let values: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
            writeln!(out, "{}", values.join("\t"))?;
        }
    }

    out.flush()?;
    info!("wrote {} motifs to {}", motifs.len(), filename);
    Ok(())
}

/// Advances the iterator until a MOTIF line is found
fn skip_until_motif<I>(lines: &mut Peekable<I>)
where
    I: Iterator<Item = std::io::Result<String>>,
{
    while let Some(Ok(line)) = lines.peek() {
        if line.starts_with("MOTIF") {
            break;
        }
        lines.next();
    }
}

/// Parses one motif, starting at its MOTIF line
fn parse_motif<I>(lines: &mut Peekable<I>) -> Result<Option<(String, Array2<f64>)>>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let motif_line = match lines.next() {
        Some(Ok(line)) if line.starts_with("MOTIF") => line,
        Some(Err(e)) => return Err(SeqletError::Io(e)),
        _ => return Ok(None),
    };

    let motif_id = motif_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| SeqletError::InvalidFileFormat("Missing motif ID".into()))?
        .to_string();

    // Find the matrix header
    loop {
        match lines.next() {
            Some(Ok(line)) if line.trim_start().starts_with("letter-probability matrix") => break,
            Some(Ok(line)) if line.starts_with("MOTIF") => {
                return Err(SeqletError::InvalidFileFormat(format!(
                    "Motif {} has no letter-probability matrix",
                    motif_id
                )))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SeqletError::Io(e)),
            None => {
                return Err(SeqletError::InvalidFileFormat(format!(
                    "Motif {} has no letter-probability matrix",
                    motif_id
                )))
            }
        }
    }

    // Matrix rows run until the first blank or non-numeric line
    let mut rows: Vec<Vec<f64>> = Vec::new();
    while let Some(Ok(line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || !trimmed.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            break;
        }
        let values = trimmed
            .split_whitespace()
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SeqletError::InvalidFileFormat(format!("Invalid matrix value: {}", e)))?;
        if values.len() != DNA_ALPHABET.len() {
            return Err(SeqletError::InvalidFileFormat(format!(
                "Motif {} row has {} values, expected {}",
                motif_id,
                values.len(),
                DNA_ALPHABET.len()
            )));
        }
        rows.push(values);
        lines.next();
    }

    if rows.is_empty() {
        return Err(SeqletError::InvalidFileFormat(format!(
            "Empty matrix for motif {}",
            motif_id
        )));
    }

    let width = rows.len();
    let matrix = Array2::from_shape_vec((width, DNA_ALPHABET.len()), rows.concat())?;
    Ok(Some((motif_id, matrix)))
}

/// Reads letter-probability matrices from a MEME format file
///
/// # Returns
/// * `Result<MotifCollection>` - Matrices indexed by motif ID, shaped (width, 4)
///
/// # Errors
/// * `SeqletError::Io` - If the file cannot be opened or read
/// * `SeqletError::InvalidFileFormat` - If a motif is malformed or the file holds no motifs
pub fn read_meme(filename: &str) -> Result<MotifCollection> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().peekable();
    let mut motifs = BTreeMap::new();

    skip_until_motif(&mut lines);

    while let Some((id, matrix)) = parse_motif(&mut lines)? {
        motifs.insert(id, matrix);
        skip_until_motif(&mut lines);
    }

    if motifs.is_empty() {
        return Err(SeqletError::InvalidFileFormat("No motifs found".into()));
    }

    Ok(motifs)
}
