use ndarray::{array, s, Array2};
use seqlet_rs::encoding::{decode_one_hot, one_hot_encode_batch};
use seqlet_rs::error::SeqletError;
use seqlet_rs::scanner::select_top_positions;
use seqlet_rs::seqlets::extract_seqlets;
use seqlet_rs::types::{Activator, SelectionMap};

fn selection(picks: &[(usize, usize)]) -> SelectionMap {
    let activators = picks
        .iter()
        .enumerate()
        .map(|(rank, &(sequence, position))| Activator {
            sequence,
            position,
            activation: 10.0 - rank as f32,
        })
        .collect();
    SelectionMap::from([(0, activators)])
}

#[test]
fn test_extract_seqlets() {
    let sequences = one_hot_encode_batch(&["ACGTA", "TTGCA"]).unwrap();
    let activations = array![[[0.1f32, 0.9, 0.2]], [[0.5, 0.05, 0.8]]];
    let selected = select_top_positions(activations.view(), 2, None).unwrap();

    let seqlets = extract_seqlets(&selected, sequences.view(), 2, 0).unwrap();
    let stack = &seqlets[&0];
    assert_eq!(stack.dim(), (2, 4, 2));

    // order follows the ranking: sequence 0 [1, 3) then sequence 1 [2, 4)
    assert_eq!(stack.slice(s![0, .., ..]), sequences.slice(s![0, .., 1..3]));
    assert_eq!(stack.slice(s![1, .., ..]), sequences.slice(s![1, .., 2..4]));
    assert_eq!(decode_one_hot(stack.slice(s![0, .., ..])), "CG");
    assert_eq!(decode_one_hot(stack.slice(s![1, .., ..])), "GC");
}

#[test]
fn test_padding_shifts_window() {
    let sequences = one_hot_encode_batch(&["AACCGGTT"]).unwrap();
    let seqlets = extract_seqlets(&selection(&[(0, 1)]), sequences.view(), 3, 2).unwrap();
    assert_eq!(decode_one_hot(seqlets[&0].slice(s![0, .., ..])), "CGG");
}

#[test]
fn test_window_out_of_bounds() {
    let sequences = one_hot_encode_batch(&["ACGTA", "TTGCA"]).unwrap();

    // last valid start for kernel 2 is 3
    let result = extract_seqlets(&selection(&[(0, 0), (1, 4)]), sequences.view(), 2, 0);
    match result {
        Err(SeqletError::WindowOutOfBounds {
            filter,
            sequence,
            start,
            end,
            length,
        }) => {
            assert_eq!((filter, sequence, start, end, length), (0, 1, 4, 6, 5));
        }
        other => panic!("expected WindowOutOfBounds, got {:?}", other),
    }

    // padding pushes an otherwise valid window off the end
    let result = extract_seqlets(&selection(&[(0, 3)]), sequences.view(), 2, 1);
    assert!(matches!(result, Err(SeqletError::WindowOutOfBounds { .. })));
}

#[test]
fn test_huge_padding_is_out_of_bounds() {
    let sequences = one_hot_encode_batch(&["ACGTA"]).unwrap();

    let result = extract_seqlets(&selection(&[(0, 1)]), sequences.view(), 2, usize::MAX);
    match result {
        Err(SeqletError::WindowOutOfBounds { end, length, .. }) => {
            assert_eq!(end, usize::MAX);
            assert_eq!(length, 5);
        }
        other => panic!("expected WindowOutOfBounds, got {:?}", other),
    }

    // start fits but start + kernel_size does not
    let result = extract_seqlets(&selection(&[(0, 0)]), sequences.view(), usize::MAX, 1);
    assert!(matches!(result, Err(SeqletError::WindowOutOfBounds { .. })));
}

#[test]
fn test_out_of_bounds_in_one_filter_fails_whole_call() {
    let sequences = one_hot_encode_batch(&["ACGTA"]).unwrap();
    let mut selected = selection(&[(0, 0)]);
    selected.insert(
        1,
        vec![Activator {
            sequence: 0,
            position: 4,
            activation: 1.0,
        }],
    );

    let result = extract_seqlets(&selected, sequences.view(), 2, 0);
    assert!(result.is_err());
}

#[test]
fn test_rejects_mismatched_inputs() {
    let sequences = one_hot_encode_batch(&["ACGTA"]).unwrap();

    // sequence index past the batch
    let result = extract_seqlets(&selection(&[(1, 0)]), sequences.view(), 2, 0);
    assert!(matches!(result, Err(SeqletError::InvalidShape(_))));

    let flat = Array2::<f32>::zeros((4, 5));
    let result = extract_seqlets(&selection(&[(0, 0)]), flat.view(), 2, 0);
    assert!(matches!(result, Err(SeqletError::InvalidShape(_))));

    let result = extract_seqlets(&selection(&[(0, 0)]), sequences.view(), 0, 0);
    assert!(matches!(result, Err(SeqletError::InvalidArgument { .. })));
}

#[test]
fn test_empty_selection_gives_empty_stack() {
    let sequences = one_hot_encode_batch(&["ACGTA"]).unwrap();
    let selected = SelectionMap::from([(2, Vec::new())]);

    let seqlets = extract_seqlets(&selected, sequences.view(), 3, 0).unwrap();
    assert_eq!(seqlets[&2].dim(), (0, 4, 3));

    // no window to check, but the kernel cannot fit any sequence
    let result = extract_seqlets(&selected, sequences.view(), usize::MAX, 0);
    assert!(matches!(result, Err(SeqletError::InvalidArgument { .. })));
}
