//! CPU backend implementation using `ndarray`.

use crate::array::Array;
use crate::backend::Backend;
use crate::error::Error;
use crate::ops::{cpu_backward, cpu_ops};
use rand::Rng;
use rand_distr::Uniform;
use std::fmt::{self, Debug, Display};

/// Marker struct for the CPU backend.
/// Implements the `Backend` trait using `ndarray` operations via the `Array` wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuBackend;

impl Backend for CpuBackend {
    type Storage = Array;

    fn device(_storage: &Self::Storage) -> crate::Device {
        crate::Device::Cpu
    }

    // --- Factory Methods ---
    fn zeros(shape: &[usize]) -> Result<Self::Storage, Error> {
        Ok(Array::zeros(shape))
    }

    fn ones(shape: &[usize]) -> Result<Self::Storage, Error> {
        Ok(Array::ones(shape))
    }

    fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self::Storage, Error> {
        Array::from_vec(data, shape)
    }

    fn random_uniform(shape: &[usize], low: f32, high: f32) -> Result<Self::Storage, Error> {
        let size = shape.iter().product::<usize>();
        if size == 0 {
            // Return empty storage matching the shape
            return Ok(Array::zeros(shape));
        }
        let dist = Uniform::new(low, high).map_err(|_| Error::InitializationError)?;
        let mut rng = rand::rng();
        let mut data = Vec::with_capacity(size);
        for _ in 0..size {
            data.push(rng.sample(dist));
        }
        Array::from_vec(data, shape)
    }

    // --- Accessors ---
    fn shape(storage: &Self::Storage) -> &[usize] {
        storage.shape()
    }

    fn size(storage: &Self::Storage) -> usize {
        storage.size()
    }

    fn into_raw_vec(storage: Self::Storage) -> Result<Vec<f32>, Error> {
        Ok(storage.into_raw_vec())
    }

    fn copy_to_host(storage: &Self::Storage) -> Result<Vec<f32>, Error> {
        Ok(storage.clone().into_raw_vec())
    }

    // --- Sampling Kernels ---
    fn grid_sample(input: &Self::Storage, grid: &Self::Storage) -> Result<Self::Storage, Error> {
        cpu_ops::grid_sample(input, grid)
    }

    fn grid_sample_backward(
        input: &Self::Storage,
        grid: &Self::Storage,
        grad_output: &Self::Storage,
    ) -> Result<(Self::Storage, Self::Storage), Error> {
        cpu_backward::grid_sample_backward(input, grid, grad_output)
    }
}

// --- Implement Debug, Display for Array ---
// These are needed to satisfy the Backend::Storage trait bounds for Array.

impl Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to ndarray's Display implementation for ArrayD
        write!(f, "{}", self.get_data())
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Array(shape={:?}, data={:?})",
            self.shape(),
            self.get_data()
        )
    }
}
