use crate::error::{Result, SeqletError};
use ndarray::{s, Array1, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};

/// Anything that maps a one-hot batch (sequences, alphabet, length) to convolution
/// activations (sequences, filters, positions).
pub trait ActivationModel {
    fn activations(&self, sequences: ArrayView3<'_, f32>) -> Result<Array3<f32>>;
}

impl<F> ActivationModel for F
where
    F: Fn(ArrayView3<'_, f32>) -> Result<Array3<f32>>,
{
    fn activations(&self, sequences: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self(sequences)
    }
}

/// Nonlinearity applied after the convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Relu,
    Identity,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Identity => x,
        }
    }
}

/// A stride-1, unpadded 1D convolution over one-hot sequences followed by a
/// nonlinearity, i.e. the first layer of a sequence CNN with known weights.
///
/// Produces (sequences, filters, length - kernel_size + 1) activations.
#[derive(Debug, Clone)]
pub struct Conv1dLayer {
    /// Shaped (filters, alphabet, kernel_size)
    weights: Array3<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl Conv1dLayer {
    /// # Errors
    /// * `SeqletError::InvalidShape` if the bias length differs from the filter count or the
    ///   kernel is empty
    pub fn new(weights: Array3<f32>, bias: Array1<f32>) -> Result<Self> {
        let (filters, _, kernel_size) = weights.dim();
        if kernel_size == 0 {
            return Err(SeqletError::invalid_shape("kernel width must be positive"));
        }
        if bias.len() != filters {
            return Err(SeqletError::invalid_shape(format!(
                "bias has {} entries for {} filters",
                bias.len(),
                filters
            )));
        }
        Ok(Self {
            weights,
            bias,
            activation: Activation::default(),
        })
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn kernel_size(&self) -> usize {
        self.weights.len_of(Axis(2))
    }

    pub fn num_filters(&self) -> usize {
        self.weights.len_of(Axis(0))
    }

    fn convolve(&self, sequence: ArrayView2<'_, f32>, mut out: ArrayViewMut2<'_, f32>) {
        let kernel_size = self.kernel_size();
        for (filter, kernel) in self.weights.outer_iter().enumerate() {
            for position in 0..out.ncols() {
                let window = sequence.slice(s![.., position..position + kernel_size]);
                let score = (&window * &kernel).sum() + self.bias[filter];
                out[[filter, position]] = self.activation.apply(score);
            }
        }
    }
}

impl ActivationModel for Conv1dLayer {
    fn activations(&self, sequences: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        let (num_sequences, alphabet, length) = sequences.dim();
        if alphabet != self.weights.len_of(Axis(1)) {
            return Err(SeqletError::invalid_shape(format!(
                "sequences have alphabet size {}, kernels expect {}",
                alphabet,
                self.weights.len_of(Axis(1))
            )));
        }
        if length < self.kernel_size() {
            return Err(SeqletError::invalid_shape(format!(
                "sequence length {} is shorter than kernel size {}",
                length,
                self.kernel_size()
            )));
        }
        let positions = length - self.kernel_size() + 1;

        let mut activations = Array3::zeros((num_sequences, self.num_filters(), positions));
        for (out, sequence) in activations
            .axis_iter_mut(Axis(0))
            .zip(sequences.axis_iter(Axis(0)))
        {
            self.convolve(sequence, out);
        }

        Ok(activations)
    }
}
