// Test intent: flatten/unflatten round-trips bundles of arbitrary nesting and
// rejects vectors whose length disagrees with the layout.
use mrwave::{flatten, unflatten, Bundle, Layout, WaveletError};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

fn leaf(shape: Vec<usize>, seed: f64) -> Bundle<f64> {
    let n: usize = shape.iter().product();
    let values = (0..n).map(|i| seed + i as f64 * 0.25).collect();
    Bundle::Leaf(ArrayD::from_shape_vec(IxDyn(&shape), values).unwrap())
}

fn arb_shape() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..5, 1..4)
}

fn arb_bundle() -> impl Strategy<Value = Bundle<f64>> {
    let leaf_strategy = (arb_shape(), -100.0f64..100.0).prop_map(|(s, v)| leaf(s, v));
    leaf_strategy.prop_recursive(3, 24, 4, |inner| {
        proptest::collection::vec(inner, 0..4).prop_map(Bundle::Node)
    })
}

proptest! {
    #[test]
    fn prop_unflatten_inverts_flatten(bundle in arb_bundle()) {
        let (values, layout) = flatten(&bundle);
        prop_assert_eq!(values.len(), layout.len());
        let back = unflatten(&values, &layout).unwrap();
        prop_assert_eq!(back, bundle);
    }
}

#[test]
/// Leaves are concatenated depth-first, each in row-major order.
fn flatten_order_is_depth_first() {
    let a = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = ArrayD::from_shape_vec(IxDyn(&[3]), vec![5.0, 6.0, 7.0]).unwrap();
    let c = ArrayD::from_shape_vec(IxDyn(&[1]), vec![8.0]).unwrap();
    let bundle = Bundle::Node(vec![
        Bundle::Node(vec![Bundle::Leaf(a), Bundle::Leaf(b)]),
        Bundle::Leaf(c),
    ]);
    let (values, layout) = flatten(&bundle);
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(
        layout,
        Layout::Node(vec![
            Layout::Node(vec![Layout::Leaf(vec![2, 2]), Layout::Leaf(vec![3])]),
            Layout::Leaf(vec![1]),
        ])
    );
}

#[test]
/// A vector of the wrong length is a `ShapeMismatch`, never a panic.
fn length_mismatch_rejected() {
    let layout = Layout::Node(vec![Layout::Leaf(vec![2, 3]), Layout::Leaf(vec![4])]);
    assert_eq!(
        unflatten(&[0.0f32; 9], &layout),
        Err(WaveletError::ShapeMismatch { expected: 10, found: 9 })
    );
    assert_eq!(
        unflatten(&[0.0f32; 11], &layout),
        Err(WaveletError::ShapeMismatch { expected: 10, found: 11 })
    );
}
