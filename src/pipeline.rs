//! Runs the scanner, extractor and PFM builder in sequence for one configuration.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::meme;
use crate::model::ActivationModel;
use crate::pfm::{build_pfms, consensus, pfm_to_ppm};
use crate::scanner::select_positions;
use crate::seqlets::extract_seqlets;
use crate::types::{PfmCollection, SelectionMap, SeqletMap};
use log::info;
use ndarray::{ArrayView, ArrayView3, Dimension};
use std::collections::BTreeMap;

/// Everything produced for one batch: the ranked activators, their seqlets and the PFMs
#[derive(Debug, Clone)]
pub struct FilterReport {
    pub activators: SelectionMap,
    pub seqlets: SeqletMap,
    pub pfms: PfmCollection,
    pseudocount: f64,
}

impl FilterReport {
    /// Position probability matrices using the configured pseudocount
    pub fn ppms(&self) -> Result<PfmCollection> {
        self.pfms
            .iter()
            .map(|(&filter, pfm)| pfm_to_ppm(pfm, self.pseudocount).map(|ppm| (filter, ppm)))
            .collect()
    }

    pub fn consensus(&self) -> BTreeMap<usize, String> {
        self.pfms
            .iter()
            .map(|(&filter, pfm)| (filter, consensus(pfm)))
            .collect()
    }

    /// Writes the PFMs as a MEME file, see [`meme::write_meme`]
    pub fn write_meme(&self, filename: &str) -> Result<()> {
        meme::write_meme(&self.pfms, filename, self.pseudocount)
    }
}

/// Interprets convolutional filters through their maximally activating seqlets
///
/// # Example
/// ```
/// use ndarray::array;
/// use seqlet_rs::config::{PipelineConfig, SelectionMethod};
/// use seqlet_rs::encoding::one_hot_encode_batch;
/// use seqlet_rs::pipeline::FilterInterpreter;
///
/// let sequences = one_hot_encode_batch(&["ACGTA", "TTGCA"]).unwrap();
/// let activations = array![[[0.1f32, 0.9, 0.2]], [[0.5, 0.05, 0.8]]];
/// let config = PipelineConfig::new(3).with_selection(SelectionMethod::TopK { num_seqlets: 2 });
///
/// let report = FilterInterpreter::new(config)
///     .unwrap()
///     .interpret(activations.view(), sequences.view())
///     .unwrap();
/// assert_eq!(report.pfms[&0].sum(), 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct FilterInterpreter {
    config: PipelineConfig,
}

impl FilterInterpreter {
    /// # Errors
    /// * Any error from [`PipelineConfig::validate`]
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs selection, extraction and PFM construction on precomputed activations
    pub fn interpret<D, E>(
        &self,
        activations: ArrayView<'_, f32, D>,
        sequences: ArrayView<'_, f32, E>,
    ) -> Result<FilterReport>
    where
        D: Dimension,
        E: Dimension,
    {
        let config = &self.config;

        let activators = select_positions(
            activations,
            &config.selection,
            config.filters.as_deref(),
        )?;
        info!(
            "selected {} activators across {} filters",
            activators.values().map(Vec::len).sum::<usize>(),
            activators.len()
        );

        let seqlets = extract_seqlets(&activators, sequences, config.kernel_size, config.padding)?;
        let pfms = build_pfms(&seqlets, config.kernel_size)?;
        info!("built {} PFMs", pfms.len());

        Ok(FilterReport {
            activators,
            seqlets,
            pfms,
            pseudocount: config.pseudocount,
        })
    }

    /// Computes activations with `model`, then runs [`FilterInterpreter::interpret`]
    pub fn interpret_model<M: ActivationModel + ?Sized>(
        &self,
        model: &M,
        sequences: ArrayView3<'_, f32>,
    ) -> Result<FilterReport> {
        let activations = model.activations(sequences)?;
        self.interpret(activations.view(), sequences)
    }
}
