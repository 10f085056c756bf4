use crate::error::{Result, SeqletError};
use crate::types::{Pfm, PfmCollection, Ppm, SeqletMap, DNA_ALPHABET, NUCLEOTIDE_INDEX};
use log::{debug, warn};
use ndarray::{Array2, ArrayView2, Axis};
use polars::prelude::*;
use rayon::prelude::*;

/// Sums each filter's seqlets into a position frequency matrix.
///
/// PFMs are position-major: shape (kernel_size, alphabet), columns in A, C, G, T order.
/// For a filter with N seqlets every row sums to N. A filter with no seqlets gets an
/// all-zero matrix.
///
/// # Errors
/// * `SeqletError::InvalidArgument` if `kernel_size` is zero
/// * `SeqletError::InvalidShape` if a stack's window width differs from `kernel_size`
pub fn build_pfms(filter_seqlets: &SeqletMap, kernel_size: usize) -> Result<PfmCollection> {
    if kernel_size == 0 {
        return Err(SeqletError::invalid_argument(
            "kernel_size",
            kernel_size,
            "must be positive",
        ));
    }

    let pfms = filter_seqlets
        .par_iter()
        .map(|(&filter, stack)| {
            let (count, _, width) = stack.dim();
            if width != kernel_size {
                return Err(SeqletError::invalid_shape(format!(
                    "seqlets for filter {} are {} wide, expected kernel size {}",
                    filter, width, kernel_size
                )));
            }
            if count == 0 {
                warn!("filter {} has no seqlets, emitting an empty PFM", filter);
            }
            let pfm: Pfm = stack.sum_axis(Axis(0)).t().mapv(f64::from);
            debug!("filter {}: PFM from {} seqlets", filter, count);
            Ok((filter, pfm))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(pfms.into_iter().collect())
}

pub(crate) fn check_pseudocount(pseudocount: f64) -> Result<()> {
    if !pseudocount.is_finite() || pseudocount < 0.0 {
        return Err(SeqletError::invalid_argument(
            "pseudocount",
            pseudocount,
            "must be a non-negative number",
        ));
    }
    Ok(())
}

/// Normalizes a PFM into a position probability matrix.
///
/// Each cell becomes `(count + pseudocount) / (row_sum + alphabet * pseudocount)`.
/// A row with no counts and no pseudocount becomes uniform.
///
/// # Errors
/// * `SeqletError::InvalidArgument` if `pseudocount` is negative or not finite
pub fn pfm_to_ppm(pfm: &Pfm, pseudocount: f64) -> Result<Ppm> {
    check_pseudocount(pseudocount)?;

    let alphabet = pfm.ncols() as f64;
    let mut ppm = pfm.mapv(|count| count + pseudocount);
    for mut row in ppm.rows_mut() {
        let total = row.sum();
        if total > 0.0 {
            row.mapv_inplace(|v| v / total);
        } else {
            row.fill(1.0 / alphabet);
        }
    }
    Ok(ppm)
}

/// Most frequent letter at each position; `N` where a position has no counts.
/// Ties resolve to the earlier letter in A, C, G, T order.
pub fn consensus(pfm: &Pfm) -> String {
    pfm.rows()
        .into_iter()
        .map(|row| {
            let mut best: Option<(usize, f64)> = None;
            for (idx, &count) in row.iter().enumerate() {
                if count > 0.0 && best.map_or(true, |(_, b)| count > b) {
                    best = Some((idx, count));
                }
            }
            best.and_then(|(idx, _)| DNA_ALPHABET.get(idx).copied())
                .unwrap_or('N')
        })
        .collect()
}

/// Converts a position-major matrix into a DataFrame with one column per letter (A, C, G, T)
///
/// # Errors
/// * `SeqletError::InvalidShape` if the matrix does not have one column per DNA letter
/// * `SeqletError::DataError` if DataFrame creation fails
pub fn pfm_to_dataframe(matrix: ArrayView2<'_, f64>) -> Result<DataFrame> {
    if matrix.ncols() != DNA_ALPHABET.len() {
        return Err(SeqletError::invalid_shape(format!(
            "expected {} columns, got {}",
            DNA_ALPHABET.len(),
            matrix.ncols()
        )));
    }

    let columns: Vec<Column> = DNA_ALPHABET
        .iter()
        .enumerate()
        .map(|(idx, letter)| {
            Column::new(letter.to_string().into(), matrix.column(idx).to_vec())
        })
        .collect();

    DataFrame::new(columns).map_err(|e| SeqletError::DataError(e.to_string()))
}

/// Reads a DataFrame with columns A, C, G, T back into a position-major matrix
///
/// # Errors
/// * `SeqletError::DataError` if a letter column is missing, not numeric, or holds nulls
pub fn dataframe_to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let mut matrix = Array2::zeros((df.height(), DNA_ALPHABET.len()));

    for letter in DNA_ALPHABET {
        let idx = NUCLEOTIDE_INDEX[&letter];
        let values = df
            .column(&letter.to_string())
            .map_err(|e| SeqletError::DataError(e.to_string()))?
            .cast(&DataType::Float64)
            .map_err(|e| SeqletError::DataError(e.to_string()))?;
        let values = values
            .f64()
            .map_err(|e| SeqletError::DataError(e.to_string()))?;

        for (row, value) in values.into_iter().enumerate() {
            matrix[[row, idx]] = value.ok_or_else(|| {
                SeqletError::DataError(format!("null value in column {} row {}", letter, row))
            })?;
        }
    }

    Ok(matrix)
}
