//! A differentiable bilinear grid-sampling operator
//!
//! This library samples a 4-D feature map at normalized grid coordinates by
//! bilinear interpolation, and propagates gradients back to both the feature
//! map and the grid:
//! - CPU kernels (optionally parallelized with rayon) and a CUDA backend
//! - Zero-padding policy for out-of-bounds samples
//! - A save-for-backward context object bridging forward and backward calls
//!
//! # Features
//! - `parallel` (default) - Parallelizes the CPU kernels across output planes
//! - `cuda` - Enables the CUDA accelerated backend (requires CUDA toolkit)
//!
//! # Example
//! ```rust
//! use grid_sampler::{CpuBackend, Sampler, Backend};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1x1x2x2 feature map and a single grid point at the exact center
//!     let input = CpuBackend::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2])?;
//!     let grid = CpuBackend::from_vec(vec![0.0, 0.0], &[1, 1, 1, 2])?;
//!
//!     let mut sampler = Sampler::<CpuBackend>::new();
//!     let output = sampler.forward(&input, &grid)?;
//!     assert_eq!(CpuBackend::copy_to_host(&output)?, vec![2.5]);
//!
//!     // Backward with dO = 1 distributes the four bilinear weights
//!     let grad_output = CpuBackend::ones(&[1, 1, 1, 1])?;
//!     let (grad_input, _grad_grid) = sampler.backward(&grad_output)?;
//!     assert_eq!(CpuBackend::copy_to_host(&grad_input)?, vec![0.25; 4]);
//!     Ok(())
//! }
//! ```

// --- Central debug_println macro definition ---
/// Conditional logging macro. Prints if 'debug_logs' feature is enabled.
#[cfg(feature = "debug_logs")]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        ::std::println!("[DEBUG {}] {}", module_path!(), ::std::format_args!($($arg)*))
    };
}

/// Conditional logging macro (disabled version). Does nothing.
#[cfg(not(feature = "debug_logs"))]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {};
}

pub mod array;
pub mod backend;
pub mod error;
pub mod ops;

/// Represents the device where a storage buffer's data resides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// CPU device
    Cpu,
    /// CUDA GPU device with a specific device ID
    #[cfg(feature = "cuda")]
    Cuda(u32),
}

pub use array::Array;
pub use backend::cpu::CpuBackend;
#[cfg(feature = "cuda")]
pub use backend::cuda::CudaBackend;
pub use backend::Backend;
pub use error::Error;
pub use ops::{grid_sample, grid_sample_backward, Sampler};
