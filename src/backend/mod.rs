//! Backend trait definition and module structure.

use crate::error::Error;
use std::fmt::Debug;

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;

/// A kernel provider for one device class.
///
/// The two implementations, `CpuBackend` and the feature-gated `CudaBackend`,
/// satisfy the same forward/backward contract; callers select one by where
/// their data resides.
pub trait Backend: Sized + Debug + Clone {
    type Storage: Clone + Debug;

    // --- Factory Methods (Creating Storage) ---

    /// Creates new storage filled with zeros.
    fn zeros(shape: &[usize]) -> Result<Self::Storage, Error>;
    /// Creates new storage filled with ones.
    fn ones(shape: &[usize]) -> Result<Self::Storage, Error>;
    /// Creates new storage from a flat vector and a shape.
    fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self::Storage, Error>;
    /// Creates new storage filled with values from a uniform distribution U(low, high).
    fn random_uniform(shape: &[usize], low: f32, high: f32) -> Result<Self::Storage, Error>;

    // --- Shape/Data Access ---

    /// Returns the device of the storage.
    fn device(storage: &Self::Storage) -> crate::Device;
    /// Returns the shape of the storage.
    fn shape(storage: &Self::Storage) -> &[usize];
    /// Returns the total number of elements in the storage.
    fn size(storage: &Self::Storage) -> usize;
    /// Consumes the storage and returns its data as a flat `Vec<f32>`.
    /// May involve device-to-host transfer for GPU storage.
    fn into_raw_vec(storage: Self::Storage) -> Result<Vec<f32>, Error>;
    /// Copies data from device storage to a host vector.
    /// For CPU backend, this clones the data.
    fn copy_to_host(storage: &Self::Storage) -> Result<Vec<f32>, Error>;

    // --- Sampling Kernels ---

    /// Bilinear grid sampling (NCHW input, NHoWo2 grid).
    ///
    /// Samples `input` of shape `[N, C, H, W]` at the normalized coordinates
    /// held by `grid` of shape `[N, Ho, Wo, 2]`, producing `[N, C, Ho, Wo]`.
    /// Grid coordinates live in `[-1, 1]`; out-of-bounds corner samples
    /// contribute zero (zero-padding policy).
    fn grid_sample(input: &Self::Storage, grid: &Self::Storage) -> Result<Self::Storage, Error>;

    /// Backward pass for grid_sample.
    ///
    /// Given the forward inputs and `grad_output` of shape `[N, C, Ho, Wo]`,
    /// returns `(grad_input, grad_grid)` shaped like `input` and `grid`.
    /// `grad_input` is the transpose of the forward map (scatter-add of
    /// weighted gradients); `grad_grid` chains the weight derivatives through
    /// the coordinate unnormalization.
    fn grid_sample_backward(
        input: &Self::Storage,
        grid: &Self::Storage,
        grad_output: &Self::Storage,
    ) -> Result<(Self::Storage, Self::Storage), Error>;
}
