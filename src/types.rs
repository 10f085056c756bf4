use ndarray::{Array2, Array3};
use phf::phf_map;
use std::collections::BTreeMap;

/// Letters of the DNA alphabet in one-hot row order
pub const DNA_ALPHABET: [char; 4] = ['A', 'C', 'G', 'T'];

/// One-hot row for each nucleotide (upper case only)
pub static NUCLEOTIDE_INDEX: phf::Map<char, usize> = phf_map! {
    'A' => 0,
    'C' => 1,
    'G' => 2,
    'T' => 3,
};

/// A single (sequence, position) candidate picked for a filter, with the
/// activation value that ranked it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activator {
    pub sequence: usize,
    pub position: usize,
    pub activation: f32,
}

/// Ranked activators per filter index
pub type SelectionMap = BTreeMap<usize, Vec<Activator>>;

/// Stack of one-hot windows for one filter, shaped (seqlets, alphabet, kernel_size)
pub type SeqletStack = Array3<f32>;

/// Seqlet stacks indexed by filter
pub type SeqletMap = BTreeMap<usize, SeqletStack>;

/// Represents a Position Frequency Matrix (PFM)
/// Stored position-major: one row per kernel position, one column per letter (A, C, G, T)
pub type Pfm = Array2<f64>;

/// Collection of PFMs indexed by filter
pub type PfmCollection = BTreeMap<usize, Pfm>;

/// Represents a Position Probability Matrix (PPM), same layout as [`Pfm`]
pub type Ppm = Array2<f64>;
