//! One-hot encoding of DNA sequences into the (alphabet, length) layout the
//! convolution and the seqlet extractor expect.

use crate::error::{Result, SeqletError};
use crate::types::{DNA_ALPHABET, NUCLEOTIDE_INDEX};
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis};
use polars::prelude::*;

fn encode_into(sequence: &str, mut out: ArrayViewMut2<'_, f32>) -> Result<()> {
    for (position, nucleotide) in sequence.chars().enumerate() {
        let row = NUCLEOTIDE_INDEX
            .get(&nucleotide.to_ascii_uppercase())
            .ok_or_else(|| {
                SeqletError::invalid_sequence(
                    position,
                    format!("'{}' is not one of A, C, G, T", nucleotide),
                )
            })?;
        out[[*row, position]] = 1.0;
    }
    Ok(())
}

/// One-hot encodes a single DNA sequence.
///
/// # Returns
/// * `Result<Array2<f32>>` - Matrix shaped (4, length), rows in A, C, G, T order
///
/// # Errors
/// * `SeqletError::InvalidSequence` for any character other than A, C, G or T (case-insensitive)
pub fn one_hot_encode(sequence: &str) -> Result<Array2<f32>> {
    let mut encoded = Array2::zeros((DNA_ALPHABET.len(), sequence.chars().count()));
    encode_into(sequence, encoded.view_mut())?;
    Ok(encoded)
}

/// One-hot encodes equal-length sequences into a (sequences, 4, length) batch
///
/// # Errors
/// * `SeqletError::InvalidShape` if the batch is empty or the lengths differ
/// * `SeqletError::InvalidSequence` for characters outside A, C, G, T
pub fn one_hot_encode_batch<S: AsRef<str>>(sequences: &[S]) -> Result<Array3<f32>> {
    let length = sequences
        .first()
        .map(|s| s.as_ref().chars().count())
        .ok_or_else(|| SeqletError::invalid_shape("cannot encode an empty batch"))?;

    let mut batch = Array3::zeros((sequences.len(), DNA_ALPHABET.len(), length));
    for (idx, sequence) in sequences.iter().enumerate() {
        let sequence = sequence.as_ref();
        let this_length = sequence.chars().count();
        if this_length != length {
            return Err(SeqletError::invalid_shape(format!(
                "sequence {} has length {}, expected {}",
                idx, this_length, length
            )));
        }
        encode_into(sequence, batch.index_axis_mut(Axis(0), idx))?;
    }
    Ok(batch)
}

/// One-hot encodes the "sequence" column of a DataFrame such as the one returned by
/// [`crate::fasta::read_fasta`]
///
/// # Errors
/// * `SeqletError::DataError` if the column is missing, not a string column, or holds nulls
/// * Any error from [`one_hot_encode_batch`]
pub fn one_hot_encode_frame(df: &DataFrame) -> Result<Array3<f32>> {
    let sequences = df
        .column("sequence")
        .map_err(|e| SeqletError::DataError(e.to_string()))?
        .str()
        .map_err(|e| SeqletError::DataError(e.to_string()))?;

    let sequences: Vec<&str> = sequences
        .into_iter()
        .enumerate()
        .map(|(idx, seq)| {
            seq.ok_or_else(|| SeqletError::DataError(format!("missing sequence in row {}", idx)))
        })
        .collect::<Result<_>>()?;

    one_hot_encode_batch(&sequences)
}

/// Turns a one-hot window back into letters; columns with no active row decode to `N`
pub fn decode_one_hot(window: ArrayView2<'_, f32>) -> String {
    window
        .columns()
        .into_iter()
        .map(|column| {
            column
                .iter()
                .position(|&v| v > 0.5)
                .and_then(|idx| DNA_ALPHABET.get(idx).copied())
                .unwrap_or('N')
        })
        .collect()
}
