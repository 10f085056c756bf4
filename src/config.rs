use crate::error::{Result, SeqletError};
use serde::{Deserialize, Serialize};
use std::fs;

const DEFAULT_NUM_SEQLETS: usize = 100;

/// How activators are chosen for each filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SelectionMethod {
    /// The `num_seqlets` highest activations over the whole batch
    TopK { num_seqlets: usize },
    /// Every activation above `threshold` times the filter's maximum
    Threshold { threshold: f32 },
}

impl Default for SelectionMethod {
    fn default() -> Self {
        SelectionMethod::TopK {
            num_seqlets: DEFAULT_NUM_SEQLETS,
        }
    }
}

/// Parameters for one filter-interpretation run.
///
/// `kernel_size` and `padding` must match the convolution that produced the
/// activations; nothing here can infer them from the model.
///
/// # Example
/// ```
/// use seqlet_rs::config::{PipelineConfig, SelectionMethod};
///
/// let config = PipelineConfig::from_yaml_str(
///     "kernel_size: 19\nselection:\n  method: threshold\n  threshold: 0.5\n",
/// )
/// .unwrap();
/// assert_eq!(config.padding, 0);
/// assert_eq!(config.selection, SelectionMethod::Threshold { threshold: 0.5 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kernel_size: usize,
    #[serde(default)]
    pub padding: usize,
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Subset of filter indices to interpret; every filter when absent
    #[serde(default)]
    pub filters: Option<Vec<usize>>,
    /// Added to every count when converting PFMs to probabilities
    #[serde(default)]
    pub pseudocount: f64,
}

impl PipelineConfig {
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel_size,
            padding: 0,
            selection: SelectionMethod::default(),
            filters: None,
            pseudocount: 0.0,
        }
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_filters(mut self, filters: Vec<usize>) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    /// Parses and validates a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file
    pub fn from_yaml_file(filename: &str) -> Result<Self> {
        let yaml = fs::read_to_string(filename)?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks scalar parameters before any tensor is touched
    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 {
            return Err(SeqletError::invalid_argument(
                "kernel_size",
                self.kernel_size,
                "must be positive",
            ));
        }
        match self.selection {
            SelectionMethod::TopK { num_seqlets } if num_seqlets == 0 => {
                return Err(SeqletError::invalid_argument(
                    "num_seqlets",
                    num_seqlets,
                    "must be positive",
                ));
            }
            SelectionMethod::Threshold { threshold }
                if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) =>
            {
                return Err(SeqletError::invalid_argument(
                    "threshold",
                    threshold,
                    "must be a fraction between 0 and 1",
                ));
            }
            _ => {}
        }
        if !self.pseudocount.is_finite() || self.pseudocount < 0.0 {
            return Err(SeqletError::invalid_argument(
                "pseudocount",
                self.pseudocount,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}
