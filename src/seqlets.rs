use crate::error::{Result, SeqletError};
use crate::types::{SelectionMap, SeqletMap, SeqletStack};
use log::debug;
use ndarray::{s, Array3, ArrayView, ArrayView3, Axis, Dimension, Ix3};
use rayon::prelude::*;

/// Slices the one-hot window under every selected activator.
///
/// Activation position `p` maps to sequence columns `p + padding .. p + padding + kernel_size`.
/// Windows are never clipped.
///
/// # Arguments
/// * `selections` - Ranked activators per filter, as returned by the scanner
/// * `sequences` - One-hot batch shaped (sequences, alphabet, length)
/// * `kernel_size` - Width of the convolution kernel
/// * `padding` - Offset between activation positions and sequence columns
///
/// # Returns
/// * `Result<SeqletMap>` - Per filter, a stack shaped (seqlets, alphabet, kernel_size) in the
///   same order as the selections
///
/// # Errors
/// * `SeqletError::InvalidShape` if `sequences` is not 3-dimensional or an activator points
///   at a sequence that is not in the batch
/// * `SeqletError::InvalidArgument` if `kernel_size` is zero, or longer than the sequences
///   when a filter has no activators
/// * `SeqletError::WindowOutOfBounds` if any window would read past the end of its sequence;
///   nothing is returned for the other filters in that case
pub fn extract_seqlets<D: Dimension>(
    selections: &SelectionMap,
    sequences: ArrayView<'_, f32, D>,
    kernel_size: usize,
    padding: usize,
) -> Result<SeqletMap> {
    if kernel_size == 0 {
        return Err(SeqletError::invalid_argument(
            "kernel_size",
            kernel_size,
            "must be positive",
        ));
    }
    let ndim = sequences.ndim();
    let sequences = sequences.into_dimensionality::<Ix3>().map_err(|_| {
        SeqletError::invalid_shape(format!(
            "sequences must be 3-dimensional (sequences, alphabet, length), got {} dimensions",
            ndim
        ))
    })?;

    let extracted = selections
        .par_iter()
        .map(|(&filter, activators)| -> Result<(usize, SeqletStack)> {
            let windows: Vec<(usize, usize)> = activators
                .iter()
                .map(|a| (a.sequence, a.position))
                .collect();
            let stack = stack_windows(filter, &windows, sequences, kernel_size, padding)?;
            debug!("filter {}: extracted {} seqlets", filter, stack.len_of(Axis(0)));
            Ok((filter, stack))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(extracted.into_iter().collect())
}

fn stack_windows(
    filter: usize,
    windows: &[(usize, usize)],
    sequences: ArrayView3<'_, f32>,
    kernel_size: usize,
    padding: usize,
) -> Result<SeqletStack> {
    let (num_sequences, alphabet, length) = sequences.dim();

    let mut bounds = Vec::with_capacity(windows.len());
    for &(sequence, position) in windows {
        if sequence >= num_sequences {
            return Err(SeqletError::invalid_shape(format!(
                "activator for filter {} refers to sequence {} but the batch holds {}",
                filter, sequence, num_sequences
            )));
        }
        // Saturates at usize::MAX, which always exceeds the sequence length
        let start = position.saturating_add(padding);
        let end = start.saturating_add(kernel_size);
        if end > length {
            return Err(SeqletError::WindowOutOfBounds {
                filter,
                sequence,
                start,
                end,
                length,
            });
        }
        bounds.push((sequence, start, end));
    }

    if kernel_size > length {
        return Err(SeqletError::invalid_argument(
            "kernel_size",
            kernel_size,
            format!("longer than the sequences ({})", length),
        ));
    }

    let mut stack = Array3::zeros((windows.len(), alphabet, kernel_size));
    for (row, &(sequence, start, end)) in bounds.iter().enumerate() {
        stack
            .index_axis_mut(Axis(0), row)
            .assign(&sequences.slice(s![sequence, .., start..end]));
    }

    Ok(stack)
}
