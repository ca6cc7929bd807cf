use rand::prelude::*;
use std::fmt;

use crate::device::Device;
use crate::error::{NnError, Result};

/// Number of elements above which `Display` summarizes long dimensions.
const SUMMARIZE_THRESHOLD: usize = 1000;
/// Leading and trailing entries kept per dimension when summarizing.
const EDGE_ITEMS: usize = 3;

/// Dense row-major `f64` tensor with a device affinity.
///
/// Every operation returns a new tensor; the receiver is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
    device: Device,
}

/// Element count of a shape already backed by data, so it cannot overflow.
fn numel_of(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Element count of an arbitrary shape, failing instead of wrapping.
pub fn checked_numel(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| NnError::ShapeOverflow { shape: shape.to_vec() })
}

fn numel_or_panic(shape: &[usize]) -> usize {
    match checked_numel(shape) {
        Ok(n) => n,
        Err(e) => panic!("{e}"),
    }
}

impl Tensor {
    /// # Panics
    /// If the element count of `shape` overflows `usize`, like `vec!`.
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; numel_or_panic(shape)],
            device: Device::Cpu,
        }
    }

    /// Wraps row-major `data` in the given shape.
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Tensor> {
        if data.len() != checked_numel(shape)? {
            return Err(NnError::DataLength { len: data.len(), shape: shape.to_vec() });
        }
        Ok(Tensor { shape: shape.to_vec(), data, device: Device::Cpu })
    }

    /// Uniform samples on [0, 1) from the thread-local generator.
    pub fn rand(shape: &[usize]) -> Tensor {
        Tensor::rand_with(shape, &mut rand::thread_rng())
    }

    /// Uniform samples on [0, 1) drawn from `rng`.
    pub fn rand_with<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Tensor {
        Tensor::uniform_with(shape, 0.0, 1.0, rng)
    }

    /// Uniform samples on [low, high). A degenerate range fills with `low`.
    ///
    /// # Panics
    /// If the element count of `shape` overflows `usize`.
    pub fn uniform_with<R: Rng + ?Sized>(shape: &[usize], low: f64, high: f64, rng: &mut R) -> Tensor {
        let span = high - low;
        let data = (0..numel_or_panic(shape))
            .map(|_| low + rng.gen::<f64>() * span)
            .collect();
        Tensor { shape: shape.to_vec(), data, device: Device::Cpu }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Copy of this tensor placed on `device`.
    pub fn to(&self, device: Device) -> Tensor {
        Tensor { device, ..self.clone() }
    }

    /// Element at a full multi-index, or `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.ndim() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset).copied()
    }

    /// First `n` entries along dimension 0, or all of them if there are fewer.
    pub fn head(&self, n: usize) -> Tensor {
        if self.ndim() == 0 {
            return self.clone();
        }
        let n = n.min(self.shape[0]);
        let stride = numel_of(&self.shape[1..]);
        let mut shape = self.shape.clone();
        shape[0] = n;
        Tensor { shape, data: self.data[..n * stride].to_vec(), device: self.device }
    }

    pub fn ensure_same_device(&self, other: &Tensor) -> Result<()> {
        if self.device != other.device {
            return Err(NnError::DeviceMismatch { expected: other.device, got: self.device });
        }
        Ok(())
    }

    /// Splits the shape around `dim` into (outer, size, inner) extents.
    fn split_at_dim(&self, dim: usize) -> Result<(usize, usize, usize)> {
        if dim >= self.ndim() {
            return Err(NnError::DimOutOfRange { dim, ndim: self.ndim() });
        }
        let outer = numel_of(&self.shape[..dim]);
        let inner = numel_of(&self.shape[dim + 1..]);
        Ok((outer, self.shape[dim], inner))
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor> {
        if checked_numel(shape)? != self.numel() {
            return Err(NnError::DataLength { len: self.numel(), shape: shape.to_vec() });
        }
        Ok(Tensor { shape: shape.to_vec(), data: self.data.clone(), device: self.device })
    }

    /// Collapses every dimension from `start_dim` onward into one.
    pub fn flatten(&self, start_dim: usize) -> Result<Tensor> {
        self.reshape(&flattened_shape(&self.shape, start_dim)?)
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
            device: self.device,
        }
    }

    pub fn relu(&self) -> Tensor {
        self.map(|x| if x > 0.0 { x } else { 0.0 })
    }

    /// Affine map over the last dimension: `y = x · Wᵀ + b`.
    ///
    /// `weight` has shape `[out, in]`, `bias` (if any) shape `[out]`.
    /// Input `[..., in]` produces `[..., out]`.
    pub fn linear(&self, weight: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
        if weight.ndim() != 2 || weight.shape[1] == 0 {
            return Err(NnError::InvalidLayer(format!(
                "linear weight must be [out, in] with in > 0, got {:?}",
                weight.shape
            )));
        }
        let (out_f, in_f) = (weight.shape[0], weight.shape[1]);
        if self.shape.last() != Some(&in_f) {
            let mut expected = self.shape.clone();
            match expected.last_mut() {
                Some(last) => *last = in_f,
                None => expected.push(in_f),
            }
            return Err(NnError::ShapeMismatch {
                op: "linear".to_string(),
                expected,
                got: self.shape.clone(),
            });
        }
        self.ensure_same_device(weight)?;
        if let Some(b) = bias {
            if b.shape != [out_f] {
                return Err(NnError::ShapeMismatch {
                    op: "linear bias".to_string(),
                    expected: vec![out_f],
                    got: b.shape.clone(),
                });
            }
            b.ensure_same_device(weight)?;
        }

        let rows = self.numel() / in_f;
        let mut data = Vec::with_capacity(rows * out_f);
        for x in self.data.chunks_exact(in_f) {
            for (o, w) in weight.data.chunks_exact(in_f).enumerate() {
                let dot: f64 = x.iter().zip(w).map(|(a, b)| a * b).sum();
                data.push(dot + bias.map_or(0.0, |b| b.data[o]));
            }
        }

        let mut shape = self.shape.clone();
        if let Some(last) = shape.last_mut() {
            *last = out_f;
        }
        Ok(Tensor { shape, data, device: self.device })
    }

    /// Normalizes along `dim` into a probability distribution.
    pub fn softmax(&self, dim: usize) -> Result<Tensor> {
        let (outer, size, inner) = self.split_at_dim(dim)?;
        let mut data = self.data.clone();
        for o in 0..outer {
            for i in 0..inner {
                let at = |k: usize| (o * size + k) * inner + i;
                // Shift by the max so exp() cannot overflow.
                let max = (0..size).map(|k| data[at(k)]).fold(f64::NEG_INFINITY, f64::max);
                let mut sum = 0.0;
                for k in 0..size {
                    let e = (data[at(k)] - max).exp();
                    data[at(k)] = e;
                    sum += e;
                }
                for k in 0..size {
                    data[at(k)] /= sum;
                }
            }
        }
        Ok(Tensor { shape: self.shape.clone(), data, device: self.device })
    }

    /// Index of the largest entry along `dim` for every other position,
    /// in row-major order. The first index wins on ties.
    pub fn argmax(&self, dim: usize) -> Result<Vec<usize>> {
        let (outer, size, inner) = self.split_at_dim(dim)?;
        if size == 0 {
            return Err(NnError::ShapeMismatch {
                op: "argmax".to_string(),
                expected: vec![1],
                got: vec![0],
            });
        }
        let mut out = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            for i in 0..inner {
                let at = |k: usize| self.data[(o * size + k) * inner + i];
                let mut best = 0;
                for k in 1..size {
                    if at(k) > at(best) {
                        best = k;
                    }
                }
                out.push(best);
            }
        }
        Ok(out)
    }

    /// Sums along `dim`, removing it from the shape.
    pub fn sum_dim(&self, dim: usize) -> Result<Tensor> {
        let (outer, size, inner) = self.split_at_dim(dim)?;
        let mut data = vec![0.0; outer * inner];
        for o in 0..outer {
            for k in 0..size {
                for i in 0..inner {
                    data[o * inner + i] += self.data[(o * size + k) * inner + i];
                }
            }
        }
        let mut shape = self.shape.clone();
        shape.remove(dim);
        Ok(Tensor { shape, data, device: self.device })
    }

    fn fmt_dim(&self, out: &mut String, dim: usize, offset: usize, indent: usize, summarize: bool) {
        let size = self.shape[dim];
        let stride = numel_of(&self.shape[dim + 1..]);
        let last = dim + 1 == self.ndim();
        let indices: Vec<Option<usize>> = if summarize && size > 2 * EDGE_ITEMS {
            (0..EDGE_ITEMS)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((size - EDGE_ITEMS..size).map(Some))
                .collect()
        } else {
            (0..size).map(Some).collect()
        };

        let separator = if last {
            ", ".to_string()
        } else {
            format!(",{}{}", "\n".repeat(self.ndim() - dim - 1), " ".repeat(indent + dim + 1))
        };

        out.push('[');
        for (n, idx) in indices.into_iter().enumerate() {
            if n > 0 {
                out.push_str(&separator);
            }
            match idx {
                None => out.push_str("..."),
                Some(k) if last => out.push_str(&format!("{:.4}", self.data[offset + k])),
                Some(k) => self.fmt_dim(out, dim + 1, offset + k * stride, indent, summarize),
            }
        }
        out.push(']');
    }
}

/// Shape produced by flattening `shape` from `start_dim` to the end.
pub fn flattened_shape(shape: &[usize], start_dim: usize) -> Result<Vec<usize>> {
    if shape.is_empty() && start_dim == 0 {
        return Ok(vec![1]);
    }
    if start_dim >= shape.len() {
        return Err(NnError::DimOutOfRange { dim: start_dim, ndim: shape.len() });
    }
    let mut out = shape[..start_dim].to_vec();
    out.push(checked_numel(&shape[start_dim..]).map_err(|_| NnError::ShapeOverflow { shape: shape.to_vec() })?);
    Ok(out)
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREFIX: &str = "tensor(";
        let mut body = String::new();
        if self.ndim() == 0 {
            body.push_str(&format!("{:.4}", self.data.first().copied().unwrap_or_default()));
        } else {
            let summarize = self.numel() > SUMMARIZE_THRESHOLD;
            self.fmt_dim(&mut body, 0, 0, PREFIX.len(), summarize);
        }
        write!(f, "{PREFIX}{body}")?;
        if self.device.is_accelerator() {
            write!(f, ", device='{}'", self.device)?;
        }
        f.write_str(")")
    }
}
