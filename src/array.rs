use crate::error::Error;

#[cfg(feature = "cuda")]
use crate::backend::cuda::CudaStorage;
#[cfg(feature = "cuda")]
use crate::backend::Backend;
use ndarray::{ArrayD, IxDyn, ShapeError};

#[derive(Clone)]
pub struct Array {
    pub(crate) data: ArrayD<f32>,
}

impl Array {
    pub fn new(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    pub fn into_ndarray(self) -> ArrayD<f32> {
        self.data
    }

    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self, Error> {
        let actual_len = data.len();
        let map_err = |_e: ShapeError| Error::ShapeMismatch {
            expected: shape.to_vec(),
            actual: vec![actual_len],
        };
        let array = ArrayD::from_shape_vec(IxDyn(shape), data).map_err(map_err)?;
        Ok(Self { data: array })
    }

    #[cfg(feature = "cuda")]
    pub fn from_cuda(storage: &CudaStorage) -> Result<Self, Error> {
        // Use the CudaBackend::copy_to_host method to get a Vec<f32>
        let data = crate::backend::cuda::CudaBackend::copy_to_host(storage)?;
        let shape = crate::backend::cuda::CudaBackend::shape(storage).to_vec();
        Self::from_vec(data, &shape)
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::ones(IxDyn(shape)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the array contains no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn get_data_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    pub fn into_raw_vec(self) -> Vec<f32> {
        self.data.into_raw_vec_and_offset().0
    }
}
