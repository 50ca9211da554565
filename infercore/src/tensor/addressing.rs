//! Strided walks over a tensor's flat row-major buffer.
//!
//! Nothing here allocates per element: pitches and skips are computed once per
//! shape, after which iteration is plain index arithmetic.
use std::ops::Deref;

use super::Tensor;

/// Element count of a shape. The empty shape (a scalar) holds one element.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Elements to advance for one step along each axis.
///
/// For shape `(2, 3, 4, 5)` the pitches are `(60, 20, 5, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorPitches(Vec<usize>);

impl TensorPitches {
    pub fn new(shape: &[usize]) -> Self {
        let mut pitches = vec![0usize; shape.len()];
        if let Some(last) = pitches.last_mut() {
            *last = 1;
        }
        for i in (0..shape.len().saturating_sub(1)).rev() {
            pitches[i] = pitches[i + 1] * shape[i + 1];
        }
        Self(pitches)
    }

    /// Flat offset of a multidimensional index. Panics on rank mismatch.
    pub fn offset(&self, indices: &[usize]) -> usize {
        assert_eq!(
            indices.len(),
            self.0.len(),
            "index rank {} does not match tensor rank {}",
            indices.len(),
            self.0.len()
        );
        indices.iter().zip(self.0.iter()).map(|(i, p)| i * p).sum()
    }
}

impl Deref for TensorPitches {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

/// Counter over every combination of the outer axes of a shape.
///
/// The innermost axis is not tracked; callers handle it as one contiguous
/// run. Shape `(2, 3, 4)` visits `(0,0) (0,1) (0,2) (1,0) (1,1) (1,2)`.
#[derive(Debug, Clone)]
pub struct TensorAxisCounters<'a> {
    shape: &'a [usize],
    indices: Vec<usize>,
    axis: usize,
    running: bool,
}

impl<'a> TensorAxisCounters<'a> {
    pub fn new(shape: &'a [usize]) -> Self {
        let outer = shape.len().saturating_sub(1);
        Self {
            shape,
            indices: vec![0; outer],
            axis: outer,
            running: numel(shape) != 0,
        }
    }

    pub fn for_tensor<T>(tensor: &'a Tensor<T>) -> Self {
        Self::new(tensor.shape())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current outer-axis position.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Outermost axis changed by the last `increment`.
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Move to the next row start. Returns true if a carry into a shallower
    /// axis happened; clears `is_running` once the outermost axis overflows.
    pub fn increment(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let mut axis = self.indices.len();
        let mut carried = false;
        loop {
            if axis == 0 {
                self.running = false;
                self.axis = 0;
                return carried;
            }
            axis -= 1;
            self.indices[axis] += 1;
            if self.indices[axis] != self.shape[axis] {
                self.axis = axis;
                return carried;
            }
            self.indices[axis] = 0;
            carried = true;
        }
    }

    /// Number of row starts this counter visits from a fresh start.
    pub fn row_count(shape: &[usize]) -> usize {
        if numel(shape) == 0 {
            0
        } else {
            numel(&shape[..shape.len().saturating_sub(1)])
        }
    }
}

/// Per-axis element skips for walking a slice of a tensor.
///
/// `skips[i]` is the distance from the element just past a finished extent
/// run along axis `i` to the first element of the next run one step up along
/// axis `i - 1`, i.e. `pitch[i - 1] - extent[i] * pitch[i]` with
/// `pitch[-1]` being the total element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSkips(Vec<usize>);

impl SliceSkips {
    pub fn new(shape: &[usize], extents: &[usize]) -> Self {
        assert_eq!(
            shape.len(),
            extents.len(),
            "slice extents rank {} does not match tensor rank {}",
            extents.len(),
            shape.len()
        );
        let mut skips = vec![0usize; shape.len()];
        let mut pitch = 1usize;
        for i in (0..shape.len()).rev() {
            assert!(
                extents[i] <= shape[i],
                "slice extent {} exceeds dim {} on axis {}",
                extents[i],
                shape[i],
                i
            );
            let outer_pitch = pitch * shape[i];
            skips[i] = outer_pitch - extents[i] * pitch;
            pitch = outer_pitch;
        }
        Self(skips)
    }
}

impl Deref for SliceSkips {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

/// Sequential walk over a rectangular sub-region of a tensor.
///
/// Element-wise iteration and `copy_innermost_axis` advance the same cursor
/// and can be mixed freely as long as bulk copies start on a run boundary.
#[derive(Debug, Clone)]
pub struct SliceIterator<'a, T> {
    data: &'a [T],
    pos: usize,
    extents: Vec<usize>,
    skips: SliceSkips,
    indices: Vec<usize>,
    inner_counter: usize,
    inner_extent: usize,
    remaining: usize,
}

impl<'a, T> SliceIterator<'a, T> {
    /// Panics if `starts`/`extents` do not match the rank of `shape` or the
    /// region falls outside the tensor.
    pub fn new(data: &'a [T], shape: &[usize], starts: &[usize], extents: &[usize]) -> Self {
        assert!(
            shape.len() == starts.len() && shape.len() == extents.len(),
            "slice rank mismatch: shape {:?}, starts {:?}, extents {:?}",
            shape,
            starts,
            extents
        );
        for axis in 0..shape.len() {
            assert!(
                starts[axis] + extents[axis] <= shape[axis],
                "slice [{}, {}) out of bounds for dim {} on axis {}",
                starts[axis],
                starts[axis] + extents[axis],
                shape[axis],
                axis
            );
        }
        assert_eq!(
            data.len(),
            numel(shape),
            "tensor data does not match shape {:?}",
            shape
        );
        let skips = SliceSkips::new(shape, extents);
        let pos = TensorPitches::new(shape).offset(starts);
        let inner_extent = extents.last().copied().unwrap_or(1);
        Self {
            data,
            pos,
            extents: extents.to_vec(),
            skips,
            indices: vec![0; extents.len()],
            inner_counter: 0,
            inner_extent,
            remaining: numel(extents),
        }
    }

    pub fn for_tensor(tensor: &'a Tensor<T>, starts: &[usize], extents: &[usize]) -> Self {
        Self::new(&tensor.data, tensor.shape(), starts, extents)
    }

    /// Flat buffer offset of the next element.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Elements not yet visited.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Length of one contiguous innermost run.
    pub fn inner_extent(&self) -> usize {
        self.inner_extent
    }

    fn advance_over_inner_extent(&mut self) {
        let mut axis = self.skips.len().saturating_sub(1);
        if let Some(skip) = self.skips.last() {
            self.pos += skip;
        }
        while axis > 0 {
            axis -= 1;
            self.indices[axis] += 1;
            if self.indices[axis] != self.extents[axis] {
                break;
            }
            self.indices[axis] = 0;
            self.pos += self.skips[axis];
        }
    }

    /// Copy one innermost run into `out[..inner_extent]`; returns the count,
    /// which is 0 once the slice is exhausted.
    ///
    /// Panics when called mid-run or with a short output buffer.
    pub fn copy_innermost_axis(&mut self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        if self.remaining == 0 {
            return 0;
        }
        assert_eq!(self.inner_counter, 0, "bulk copy must start on a run boundary");
        let n = self.inner_extent.min(self.remaining);
        out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        self.remaining -= n;
        self.advance_over_inner_extent();
        n
    }

    /// Fill `out` with the whole slice using bulk run copies.
    pub fn copy_to(mut self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        assert!(
            out.len() >= self.remaining,
            "output holds {} elements, slice has {}",
            out.len(),
            self.remaining
        );
        if self.inner_extent == 0 {
            return 0;
        }
        let mut written = 0;
        while self.remaining > 0 {
            written += self.copy_innermost_axis(&mut out[written..]);
        }
        written
    }
}

impl<'a, T> Iterator for SliceIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = &self.data[self.pos];
        self.pos += 1;
        self.remaining -= 1;
        self.inner_counter += 1;
        if self.inner_counter == self.inner_extent {
            self.inner_counter = 0;
            self.advance_over_inner_extent();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for SliceIterator<'_, T> {}
