//! Ranks convolution activations to find, per filter, the (sequence, position)
//! pairs that fire hardest.

use crate::config::SelectionMethod;
use crate::error::{Result, SeqletError};
use crate::types::{Activator, SelectionMap};
use log::debug;
use ndarray::{ArrayView, ArrayView2, ArrayView3, Axis, Dimension, Ix3};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Descending activation, then lower sequence index, then lower position index.
fn rank(a: &Activator, b: &Activator) -> Ordering {
    b.activation
        .total_cmp(&a.activation)
        .then(a.sequence.cmp(&b.sequence))
        .then(a.position.cmp(&b.position))
}

fn as_activation_tensor<D: Dimension>(
    activations: ArrayView<'_, f32, D>,
) -> Result<ArrayView3<'_, f32>> {
    let ndim = activations.ndim();
    activations.into_dimensionality::<Ix3>().map_err(|_| {
        SeqletError::invalid_shape(format!(
            "activations must be 3-dimensional (sequences, filters, positions), got {} dimensions",
            ndim
        ))
    })
}

/// Resolves the filter indices to scan, rejecting indices past the filter axis
fn resolve_filters(num_filters: Option<&[usize]>, total: usize) -> Result<Vec<usize>> {
    match num_filters {
        None => Ok((0..total).collect()),
        Some(filters) => {
            if let Some(&bad) = filters.iter().find(|&&f| f >= total) {
                return Err(SeqletError::invalid_argument(
                    "num_filters",
                    bad,
                    format!("filter index out of range for {} filters", total),
                ));
            }
            let mut filters = filters.to_vec();
            filters.sort_unstable();
            filters.dedup();
            Ok(filters)
        }
    }
}

fn candidates(slice: ArrayView2<'_, f32>) -> Vec<Activator> {
    slice
        .indexed_iter()
        .map(|((sequence, position), &activation)| Activator {
            sequence,
            position,
            activation,
        })
        .collect()
}

fn top_k(slice: ArrayView2<'_, f32>, k: usize) -> Vec<Activator> {
    let mut all = candidates(slice);
    let k = k.min(all.len());
    if k == 0 {
        return Vec::new();
    }
    if k < all.len() {
        all.select_nth_unstable_by(k - 1, rank);
        all.truncate(k);
    }
    all.sort_unstable_by(rank);
    all
}

fn above_threshold(slice: ArrayView2<'_, f32>, threshold: f32) -> Vec<Activator> {
    let max = slice.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let cutoff = threshold * max;
    let mut hits: Vec<Activator> = candidates(slice)
        .into_iter()
        .filter(|a| a.activation > cutoff)
        .collect();
    hits.sort_unstable_by(rank);
    hits
}

fn scan<D, F>(
    activations: ArrayView<'_, f32, D>,
    num_filters: Option<&[usize]>,
    select: F,
) -> Result<SelectionMap>
where
    D: Dimension,
    F: Fn(ArrayView2<'_, f32>) -> Vec<Activator> + Sync,
{
    let activations = as_activation_tensor(activations)?;
    let filters = resolve_filters(num_filters, activations.len_of(Axis(1)))?;

    let selections: SelectionMap = filters
        .into_par_iter()
        .map(|filter| {
            let picked = select(activations.index_axis(Axis(1), filter));
            debug!("filter {}: selected {} activators", filter, picked.len());
            (filter, picked)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    Ok(selections)
}

/// Selects, for each filter, the `num_seqlets` highest activations across the whole batch.
///
/// # Arguments
/// * `activations` - Activation tensor shaped (sequences, filters, positions)
/// * `num_seqlets` - Number of activators to keep per filter
/// * `num_filters` - Optional subset of filter indices to scan; all filters when `None`
///
/// # Returns
/// * `Result<SelectionMap>` - Per filter, `min(num_seqlets, sequences * positions)` distinct
///   activators sorted by descending activation. Ties go to the lower sequence index, then
///   the lower position index.
///
/// # Errors
/// * `SeqletError::InvalidShape` if `activations` is not 3-dimensional
/// * `SeqletError::InvalidArgument` if `num_seqlets` is zero or a filter index is out of range
///
/// # Example
/// ```
/// use ndarray::array;
/// use seqlet_rs::scanner::select_top_positions;
///
/// let activations = array![[[0.1f32, 0.9, 0.2]], [[0.5, 0.05, 0.8]]];
/// let selected = select_top_positions(activations.view(), 2, None).unwrap();
/// assert_eq!(selected[&0][0].sequence, 0);
/// assert_eq!(selected[&0][1].position, 2);
/// ```
pub fn select_top_positions<D: Dimension>(
    activations: ArrayView<'_, f32, D>,
    num_seqlets: usize,
    num_filters: Option<&[usize]>,
) -> Result<SelectionMap> {
    if num_seqlets == 0 {
        return Err(SeqletError::invalid_argument(
            "num_seqlets",
            num_seqlets,
            "must be positive",
        ));
    }
    scan(activations, num_filters, |slice| top_k(slice, num_seqlets))
}

/// Selects, for each filter, every position whose activation is strictly greater than
/// `threshold` times that filter's maximum activation over the batch.
///
/// Filters whose maximum is not positive select nothing. Results are ordered like
/// [`select_top_positions`].
///
/// # Errors
/// * `SeqletError::InvalidShape` if `activations` is not 3-dimensional
/// * `SeqletError::InvalidArgument` if `threshold` is not within [0, 1] or a filter index is
///   out of range
pub fn select_threshold_positions<D: Dimension>(
    activations: ArrayView<'_, f32, D>,
    threshold: f32,
    num_filters: Option<&[usize]>,
) -> Result<SelectionMap> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(SeqletError::invalid_argument(
            "threshold",
            threshold,
            "must be a fraction between 0 and 1",
        ));
    }
    scan(activations, num_filters, |slice| {
        above_threshold(slice, threshold)
    })
}

/// Dispatches to the selection strategy named by `method`
pub fn select_positions<D: Dimension>(
    activations: ArrayView<'_, f32, D>,
    method: &SelectionMethod,
    num_filters: Option<&[usize]>,
) -> Result<SelectionMap> {
    match *method {
        SelectionMethod::TopK { num_seqlets } => {
            select_top_positions(activations, num_seqlets, num_filters)
        }
        SelectionMethod::Threshold { threshold } => {
            select_threshold_positions(activations, threshold, num_filters)
        }
    }
}
