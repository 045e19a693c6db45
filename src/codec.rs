//! Flatten/unflatten codec for nested coefficient bundles.
//!
//! A wavelet decomposition produces a ragged tree of sub-band arrays. The
//! optimizers consuming the operators want one contiguous vector, so
//! [`flatten`] concatenates every leaf in depth-first, left-to-right order and
//! returns a [`Layout`] recording the tree and the leaf shapes. [`unflatten`]
//! is the exact inverse for that layout:
//!
//! ```
//! use mrwave::codec::{flatten, unflatten, Bundle};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let band = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let coarse = ArrayD::from_shape_vec(IxDyn(&[1]), vec![5.0]).unwrap();
//! let bundle = Bundle::Node(vec![Bundle::Node(vec![Bundle::Leaf(band)]), Bundle::Leaf(coarse)]);
//!
//! let (values, layout) = flatten(&bundle);
//! assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
//! assert_eq!(unflatten(&values, &layout).unwrap(), bundle);
//! ```

use alloc::vec::Vec;
use ndarray::ArrayD;

use crate::error::WaveletError;
use crate::image::array_from_vec;

/// Possibly nested, ragged collection of coefficient arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum Bundle<T> {
    Leaf(ArrayD<T>),
    Node(Vec<Bundle<T>>),
}

/// Shape descriptor paired with a flattened bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Layout {
    Leaf(Vec<usize>),
    Node(Vec<Layout>),
}

impl Layout {
    /// Total number of values the layout describes, saturating at
    /// `usize::MAX` for layouts no buffer could hold.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Total number of values, or `None` if it overflows `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        match self {
            Layout::Leaf(shape) => leaf_len(shape),
            Layout::Node(children) => children
                .iter()
                .try_fold(0usize, |acc, child| acc.checked_add(child.checked_len()?)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Layout::Leaf(_) => 1,
            Layout::Node(children) => children.iter().map(Layout::leaf_count).sum(),
        }
    }

    /// Leaf shapes in traversal order.
    pub fn leaves(&self) -> Vec<&[usize]> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a [usize]>) {
        match self {
            Layout::Leaf(shape) => out.push(shape.as_slice()),
            Layout::Node(children) => children.iter().for_each(|c| c.collect_leaves(out)),
        }
    }
}

impl<T> Bundle<T> {
    /// Descriptor of this bundle, without copying any values.
    pub fn layout(&self) -> Layout {
        match self {
            Bundle::Leaf(arr) => Layout::Leaf(arr.shape().to_vec()),
            Bundle::Node(children) => Layout::Node(children.iter().map(Bundle::layout).collect()),
        }
    }

    /// Leaf arrays in traversal order.
    pub fn leaves(&self) -> Vec<&ArrayD<T>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ArrayD<T>>) {
        match self {
            Bundle::Leaf(arr) => out.push(arr),
            Bundle::Node(children) => children.iter().for_each(|c| c.collect_leaves(out)),
        }
    }

    /// Apply `f` to every value, keeping the nesting and shapes.
    pub fn map<U, F>(&self, f: F) -> Bundle<U>
    where
        T: Clone,
        F: Fn(T) -> U + Copy,
    {
        match self {
            Bundle::Leaf(arr) => Bundle::Leaf(arr.mapv(f)),
            Bundle::Node(children) => Bundle::Node(children.iter().map(|c| c.map(f)).collect()),
        }
    }

    pub fn into_leaf(self) -> Option<ArrayD<T>> {
        match self {
            Bundle::Leaf(arr) => Some(arr),
            Bundle::Node(_) => None,
        }
    }

    pub fn into_children(self) -> Option<Vec<Bundle<T>>> {
        match self {
            Bundle::Leaf(_) => None,
            Bundle::Node(children) => Some(children),
        }
    }
}

/// Concatenate every leaf of `bundle` into one vector.
pub fn flatten<T: Clone>(bundle: &Bundle<T>) -> (Vec<T>, Layout) {
    let layout = bundle.layout();
    let mut values = Vec::with_capacity(layout.len());
    for leaf in bundle.leaves() {
        values.extend(leaf.iter().cloned());
    }
    (values, layout)
}

fn leaf_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

/// Rebuild the bundle described by `layout` from `values`.
pub fn unflatten<T: Clone>(values: &[T], layout: &Layout) -> Result<Bundle<T>, WaveletError> {
    let expected = layout.len();
    if layout.checked_len().is_none() || values.len() != expected {
        return Err(WaveletError::ShapeMismatch {
            expected,
            found: values.len(),
        });
    }
    let mut offset = 0;
    rebuild(values, layout, &mut offset)
}

fn rebuild<T: Clone>(
    values: &[T],
    layout: &Layout,
    offset: &mut usize,
) -> Result<Bundle<T>, WaveletError> {
    match layout {
        Layout::Leaf(shape) => {
            let len = leaf_len(shape).ok_or(WaveletError::MalformedBundle)?;
            let start = *offset;
            *offset += len;
            let arr = array_from_vec(shape, values[start..*offset].to_vec())?;
            Ok(Bundle::Leaf(arr))
        }
        Layout::Node(children) => {
            let mut out = Vec::with_capacity(children.len());
            for child in children {
                out.push(rebuild(values, child, offset)?);
            }
            Ok(Bundle::Node(out))
        }
    }
}
