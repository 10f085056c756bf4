use ndarray::{array, Array1, Array3, ArrayView3, Axis};
use seqlet_rs::config::{PipelineConfig, SelectionMethod};
use seqlet_rs::encoding::one_hot_encode_batch;
use seqlet_rs::error::{Result, SeqletError};
use seqlet_rs::meme::read_meme;
use seqlet_rs::model::{Activation, ActivationModel, Conv1dLayer};
use seqlet_rs::pipeline::FilterInterpreter;
use std::io::Write;
use tempfile::NamedTempFile;

/// One filter that scores exact "ACG" matches as 1.0 and everything else as 0.0
fn acg_detector() -> Conv1dLayer {
    let mut weights = Array3::<f32>::zeros((1, 4, 3));
    weights[[0, 0, 0]] = 1.0;
    weights[[0, 1, 1]] = 1.0;
    weights[[0, 2, 2]] = 1.0;
    Conv1dLayer::new(weights, Array1::from_elem(1, -2.0)).unwrap()
}

#[test]
fn test_worked_example() {
    let sequences = one_hot_encode_batch(&["ACGTA", "TTGCA"]).unwrap();
    let activations = array![[[0.1f32, 0.9, 0.2]], [[0.5, 0.05, 0.8]]];
    let config = PipelineConfig::new(2)
        .with_selection(SelectionMethod::TopK { num_seqlets: 2 });

    let report = FilterInterpreter::new(config)
        .unwrap()
        .interpret(activations.view(), sequences.view())
        .unwrap();

    let picks: Vec<(usize, usize)> = report.activators[&0]
        .iter()
        .map(|a| (a.sequence, a.position))
        .collect();
    assert_eq!(picks, vec![(0, 1), (1, 2)]);
    assert_eq!(report.seqlets[&0].len_of(Axis(0)), 2);

    let pfm = &report.pfms[&0];
    assert_eq!(pfm.dim(), (2, 4));
    for total in pfm.sum_axis(Axis(1)).iter() {
        assert_eq!(*total, 2.0);
    }
}

#[test]
fn test_conv_layer_activations() {
    let sequences = one_hot_encode_batch(&["TTACGTT", "ACGTTTT"]).unwrap();
    let activations = acg_detector().activations(sequences.view()).unwrap();

    assert_eq!(activations.dim(), (2, 1, 5));
    assert_eq!(activations[[0, 0, 2]], 1.0);
    assert_eq!(activations[[1, 0, 0]], 1.0);
    assert_eq!(activations.sum(), 2.0);

    let identity = acg_detector().with_activation(Activation::Identity);
    let raw = identity.activations(sequences.view()).unwrap();
    assert_eq!(raw[[0, 0, 0]], -2.0);
}

#[test]
fn test_conv_layer_rejects_mismatches() {
    let result = Conv1dLayer::new(Array3::zeros((2, 4, 3)), Array1::zeros(1));
    assert!(matches!(result, Err(SeqletError::InvalidShape(_))));

    let short = one_hot_encode_batch(&["AC"]).unwrap();
    let result = acg_detector().activations(short.view());
    assert!(matches!(result, Err(SeqletError::InvalidShape(_))));
}

#[test]
fn test_interpret_model_recovers_planted_motif() {
    let sequences = one_hot_encode_batch(&["TTACGTT", "ACGTTTT", "TTTTTTT"]).unwrap();
    let config = PipelineConfig::new(3)
        .with_selection(SelectionMethod::TopK { num_seqlets: 2 });
    let interpreter = FilterInterpreter::new(config).unwrap();

    let report = interpreter
        .interpret_model(&acg_detector(), sequences.view())
        .unwrap();
    assert_eq!(report.consensus()[&0], "ACG");
    assert_eq!(
        report.pfms[&0],
        array![
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 2.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 0.0]
        ]
    );

    // repeated runs agree exactly
    let again = interpreter
        .interpret_model(&acg_detector(), sequences.view())
        .unwrap();
    assert_eq!(report.activators, again.activators);
    assert_eq!(report.pfms, again.pfms);
}

/// Filter 0 fires on G, filter 1 never fires
fn g_detector(sequences: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
    let (n, _, length) = sequences.dim();
    let mut out = Array3::zeros((n, 2, length));
    for s in 0..n {
        for p in 0..length {
            out[[s, 0, p]] = sequences[[s, 2, p]];
        }
    }
    Ok(out)
}

#[test]
fn test_interpret_with_function_model() {
    let sequences = one_hot_encode_batch(&["ACGTAC", "GGGGGG"]).unwrap();
    let config = PipelineConfig::new(1)
        .with_selection(SelectionMethod::Threshold { threshold: 0.5 });

    let report = FilterInterpreter::new(config)
        .unwrap()
        .interpret_model(&g_detector, sequences.view())
        .unwrap();

    assert_eq!(report.activators[&0].len(), 7);
    assert_eq!(report.consensus()[&0], "G");
    // the silent filter still gets a PFM of the right shape
    assert_eq!(report.pfms[&1].dim(), (1, 4));
    assert_eq!(report.pfms[&1].sum(), 0.0);
}

#[test]
fn test_interpret_surfaces_padding_mismatch() {
    let sequences = one_hot_encode_batch(&["ACGTA"]).unwrap();
    let activations = array![[[0.1f32, 0.2, 0.9]]];
    let config = PipelineConfig::new(3).with_padding(1);

    let result = FilterInterpreter::new(config)
        .unwrap()
        .interpret(activations.view(), sequences.view());
    assert!(matches!(result, Err(SeqletError::WindowOutOfBounds { .. })));
}

#[test]
fn test_config_from_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "kernel_size: 3\npadding: 1\nselection:\n  method: top_k\n  num_seqlets: 50\nfilters: [0, 2]\npseudocount: 0.5"
    )
    .unwrap();

    let config = PipelineConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(
        config,
        PipelineConfig::new(3)
            .with_padding(1)
            .with_selection(SelectionMethod::TopK { num_seqlets: 50 })
            .with_filters(vec![0, 2])
            .with_pseudocount(0.5)
    );

    let defaults = PipelineConfig::from_yaml_str("kernel_size: 8").unwrap();
    assert_eq!(defaults.selection, SelectionMethod::TopK { num_seqlets: 100 });
    assert_eq!(defaults.filters, None);

    let result = PipelineConfig::from_yaml_str("kernel_size: 0");
    assert!(matches!(result, Err(SeqletError::InvalidArgument { .. })));

    let result = PipelineConfig::from_yaml_str("padding: 2");
    assert!(matches!(result, Err(SeqletError::Config(_))));

    let result = FilterInterpreter::new(
        PipelineConfig::new(3).with_selection(SelectionMethod::TopK { num_seqlets: 0 }),
    );
    assert!(result.is_err());
}

#[test]
fn test_report_writes_meme() {
    let sequences = one_hot_encode_batch(&["TTACGTT", "ACGTTTT", "TTTTTTT"]).unwrap();
    let config = PipelineConfig::new(3)
        .with_selection(SelectionMethod::TopK { num_seqlets: 2 })
        .with_pseudocount(1.0);
    let report = FilterInterpreter::new(config)
        .unwrap()
        .interpret_model(&acg_detector(), sequences.view())
        .unwrap();

    let ppms = report.ppms().unwrap();
    assert_eq!(ppms[&0].row(0).to_vec(), vec![0.5, 0.5 / 3.0, 0.5 / 3.0, 0.5 / 3.0]);

    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap();
    report.write_meme(path).unwrap();

    let motifs = read_meme(path).unwrap();
    assert_eq!(motifs["filter0"].dim(), (3, 4));
}
