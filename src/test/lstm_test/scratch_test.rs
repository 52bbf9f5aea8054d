use super::*;
use crate::lstm::scratch::allocate;

#[test]
fn allocate_zero_fills() {
    let buffer: Vec<f32> = allocate(16);
    assert_eq!(buffer.len(), 16);
    assert!(buffer.iter().all(|&x| x == 0.0));
}

#[test]
fn fused_bias_sums_input_and_recurrent_sides() {
    // [Wb[i], Wb[o], Wb[f], Wb[c], Rb[i], Rb[o], Rb[f], Rb[c]]
    let source = [1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0];
    let bias = FusedBias::from_source(&source, 1).unwrap();

    assert_eq!(bias.input, vec![11.0]);
    assert_eq!(bias.output, vec![22.0]);
    assert_eq!(bias.forget, vec![33.0]);
    assert_eq!(bias.cell, vec![44.0]);

    assert!(matches!(
        FusedBias::from_source(&source[..6], 1),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn peephole_weights_borrow_caller_memory() {
    let source = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let peephole = PeepholeWeights::from_source(&source, 2).unwrap();

    assert_eq!(peephole.input, &[1.0, 2.0]);
    assert_eq!(peephole.output, &[3.0, 4.0]);
    assert_eq!(peephole.forget, &[5.0, 6.0]);
    assert_eq!(peephole.input.as_ptr(), source.as_ptr());

    assert!(matches!(
        PeepholeWeights::from_source(&source, 3),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn live_ranges_never_overlap() {
    let dims = LstmDimensions::new(4, 3, 5, 2).unwrap();

    for (direction, expected) in [(Direction::Forward, 4), (Direction::Reverse, 6)] {
        let scratch = ScratchBufferSet::new(&dims, direction);
        let ranges = scratch.live_ranges();
        assert_eq!(ranges.len(), expected);

        for (a, (name_a, range_a)) in ranges.iter().enumerate() {
            for (name_b, range_b) in ranges.iter().skip(a + 1) {
                let disjoint = range_a.end <= range_b.start || range_b.end <= range_a.start;
                assert!(disjoint, "{} overlaps {}", name_a, name_b);
            }
        }
    }
}

#[test]
fn scratch_sizes_follow_dimensions() {
    let dims = LstmDimensions::new(4, 3, 5, 2).unwrap();
    let scratch = ScratchBufferSet::new(&dims, Direction::Reverse);

    assert_eq!(scratch.gates().len(), 4 * 3 * 8);
    assert_eq!(scratch.cell().len(), 3 * 2);
}

#[test]
fn initial_state_is_kept_and_reapplied() {
    let dims = LstmDimensions::new(2, 1, 1, 2).unwrap();
    let mut scratch = ScratchBufferSet::new(&dims, Direction::Forward);

    scratch.set_initial_state(&[], &[0.5, -0.5]).unwrap();
    scratch.reset_cell_state();
    assert_eq!(scratch.cell(), &[0.5, -0.5]);

    assert!(matches!(
        scratch.set_initial_state(&[1.0], &[]),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn zero_dimensions_are_rejected() {
    assert!(matches!(
        LstmDimensions::new(0, 1, 1, 1),
        Err(ModelError::ConfigurationError(_))
    ));
    assert!(matches!(
        LstmDimensions::new(1, 1, 1, 0),
        Err(ModelError::ConfigurationError(_))
    ));
}
