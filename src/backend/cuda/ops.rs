#![cfg(feature = "cuda")] // Ensure this file is only compiled when cuda feature is enabled

use super::context::get_global_context;
use super::storage::CudaStorage;
use crate::backend::cpu::CpuBackend;
use crate::backend::Backend;
use crate::error::Error;

use cust::launch;

// --- CudaBackend Struct ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaBackend;

impl Backend for CudaBackend {
    type Storage = CudaStorage;

    fn device(_storage: &Self::Storage) -> crate::Device {
        // Device id is not tracked per storage; the global context owns device 0.
        crate::Device::Cuda(0)
    }

    // --- Factory Methods ---
    fn zeros(shape: &[usize]) -> Result<Self::Storage, Error> {
        CudaStorage::zeros(shape)
    }

    fn ones(shape: &[usize]) -> Result<Self::Storage, Error> {
        let size = shape.iter().product::<usize>();
        let mut storage = CudaStorage::zeros(shape)?;
        let ones = vec![1.0f32; size];
        storage.copy_from_slice(&ones)?;
        Ok(storage)
    }

    fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self::Storage, Error> {
        let mut storage = CudaStorage::new(shape)?;
        storage.copy_from_slice(&data)?;
        Ok(storage)
    }

    fn random_uniform(shape: &[usize], low: f32, high: f32) -> Result<Self::Storage, Error> {
        // Generate on CPU and copy to GPU
        let cpu_storage = CpuBackend::random_uniform(shape, low, high)?;
        let host_data = CpuBackend::copy_to_host(&cpu_storage)?;
        Self::from_vec(host_data, shape)
    }

    // --- Shape/Data Access ---
    fn shape(storage: &Self::Storage) -> &[usize] {
        storage.shape()
    }

    fn size(storage: &Self::Storage) -> usize {
        storage.shape().iter().product()
    }

    fn into_raw_vec(storage: Self::Storage) -> Result<Vec<f32>, Error> {
        storage.to_vec()
    }

    fn copy_to_host(storage: &Self::Storage) -> Result<Vec<f32>, Error> {
        storage.to_vec()
    }

    // --- Sampling Kernels ---
    fn grid_sample(input: &Self::Storage, grid: &Self::Storage) -> Result<Self::Storage, Error> {
        let input_shape = input.shape();
        let grid_shape = grid.shape();
        if input_shape.len() != 4 || grid_shape.len() != 4 {
            return Err(Error::InvalidOperation(
                "grid_sample expects 4D input and grid".to_string(),
            ));
        }
        let (n, c, h, w) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );
        let (ho, wo) = (grid_shape[1], grid_shape[2]);

        let mut output = CudaStorage::zeros(&[n, c, ho, wo])?;
        let total = n * c * ho * wo;
        if total == 0 {
            return Ok(output);
        }

        let ctx = get_global_context()?;
        let kernel = ctx.get_kernel("grid_sample_forward_kernel").ok_or_else(|| {
            Error::CudaError(
                "grid_sample_forward_kernel not found. Check grid_sample.cu and build.rs."
                    .to_string(),
            )
        })?;
        let stream = ctx.get_stream();
        let block_size = 256u32;
        let grid_size = total.div_ceil(block_size as usize) as u32;

        unsafe {
            launch!(kernel<<<grid_size, block_size, 0, stream>>>(
                input.as_ptr(),      // *const float input [N, C, H, W]
                grid.as_ptr(),       // *const float grid [N, Ho, Wo, 2]
                output.as_mut_ptr(), // *mut float output [N, C, Ho, Wo]
                n as i32,
                c as i32,
                h as i32,
                w as i32,
                ho as i32,
                wo as i32
            ))
            .map_err(|e| Error::CudaError(e.to_string()))?;
        }

        stream
            .synchronize()
            .map_err(|e| Error::CudaError(e.to_string()))?;
        Ok(output)
    }

    fn grid_sample_backward(
        input: &Self::Storage,
        grid: &Self::Storage,
        grad_output: &Self::Storage,
    ) -> Result<(Self::Storage, Self::Storage), Error> {
        let input_shape = input.shape();
        let grid_shape = grid.shape();
        if input_shape.len() != 4 || grid_shape.len() != 4 {
            return Err(Error::InvalidOperation(
                "grid_sample_backward expects 4D input and grid".to_string(),
            ));
        }
        let (n, c, h, w) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );
        let (ho, wo) = (grid_shape[1], grid_shape[2]);

        // Gradients accumulate into zeroed buffers via atomicAdd
        let mut grad_input = CudaStorage::zeros(&[n, c, h, w])?;
        let mut grad_grid = CudaStorage::zeros(&[n, ho, wo, 2])?;

        // One thread per sample location; each thread loops over channels
        let total = n * ho * wo;
        if total == 0 || c == 0 || h == 0 || w == 0 {
            return Ok((grad_input, grad_grid));
        }

        let ctx = get_global_context()?;
        let kernel = ctx
            .get_kernel("grid_sample_backward_kernel")
            .ok_or_else(|| {
                Error::CudaError(
                    "grid_sample_backward_kernel not found. Check grid_sample.cu and build.rs."
                        .to_string(),
                )
            })?;
        let stream = ctx.get_stream();
        let block_size = 256u32;
        let grid_size = total.div_ceil(block_size as usize) as u32;

        unsafe {
            launch!(kernel<<<grid_size, block_size, 0, stream>>>(
                input.as_ptr(),          // *const float input [N, C, H, W]
                grid.as_ptr(),           // *const float grid [N, Ho, Wo, 2]
                grad_output.as_ptr(),    // *const float grad_output [N, C, Ho, Wo]
                grad_input.as_mut_ptr(), // *mut float grad_input [N, C, H, W]
                grad_grid.as_mut_ptr(),  // *mut float grad_grid [N, Ho, Wo, 2]
                n as i32,
                c as i32,
                h as i32,
                w as i32,
                ho as i32,
                wo as i32
            ))
            .map_err(|e| Error::CudaError(e.to_string()))?;
        }

        stream
            .synchronize()
            .map_err(|e| Error::CudaError(e.to_string()))?;
        Ok((grad_input, grad_grid))
    }
}
