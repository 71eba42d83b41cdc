//! CUDA kernel definitions

// Embedded for reference; build.rs compiles the .cu source to PTX at build time
pub const _GRID_SAMPLE_CU: &str = include_str!("grid_sample.cu");
