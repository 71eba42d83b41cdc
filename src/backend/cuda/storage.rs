use crate::array::Array;
use crate::error::Error;
use cust::memory::{CopyDestination, DeviceBuffer};

// Helper for CudaError conversion
fn map_cuda_error(e: cust::error::CudaError) -> Error {
    Error::CudaError(e.to_string())
}

pub struct CudaStorage {
    data: DeviceBuffer<f32>,
    shape: Vec<usize>,
}

impl CudaStorage {
    pub fn new(shape: &[usize]) -> Result<Self, Error> {
        debug_println!(
            "[CudaStorage::new] Creating new CudaStorage with shape {:?}",
            shape
        );
        // Allocate at least one element so empty shapes still get a valid buffer
        let size = shape.iter().product::<usize>().max(1);
        let data = unsafe { DeviceBuffer::<f32>::uninitialized(size) }.map_err(map_cuda_error)?;
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    pub fn zeros(shape: &[usize]) -> Result<Self, Error> {
        let size = shape.iter().product::<usize>().max(1);
        let data = DeviceBuffer::<f32>::zeroed(size).map_err(map_cuda_error)?;
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    pub fn from_cpu(array: &Array) -> Result<Self, Error> {
        let shape = array.shape();
        let data = array.clone().into_raw_vec();
        let mut storage = Self::new(shape)?;
        storage.copy_from_slice(&data)?;
        Ok(storage)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    pub fn as_ptr(&self) -> cust::memory::DevicePointer<f32> {
        self.data.as_device_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> cust::memory::DevicePointer<f32> {
        self.data.as_device_ptr()
    }

    pub fn copy_from_slice(&mut self, data: &[f32]) -> Result<(), Error> {
        let logical_size = self.shape.iter().product::<usize>();
        if data.len() != logical_size {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                actual: vec![data.len()],
            });
        }

        if logical_size > 0 {
            self.data.copy_from(data).map_err(map_cuda_error)?;
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<f32>, Error> {
        let logical_size = self.shape.iter().product::<usize>();
        let mut host_data = vec![0.0f32; logical_size];

        if logical_size > 0 && self.data.len() > 0 {
            let copy_len = std::cmp::min(logical_size, self.data.len());
            self.data
                .copy_to(&mut host_data[..copy_len])
                .map_err(map_cuda_error)?;
        }
        Ok(host_data)
    }
}

impl From<Array> for CudaStorage {
    fn from(value: Array) -> Self {
        let shape = value.shape().to_vec();
        let data = value.into_raw_vec();
        let mut storage =
            CudaStorage::new(&shape).expect("Failed to create CudaStorage from Array"); // This is a From impl, panic is acceptable
        storage
            .copy_from_slice(&data)
            .expect("Failed to copy Array data to CudaStorage"); // This is a From impl, panic is acceptable
        storage
    }
}

impl Clone for CudaStorage {
    fn clone(&self) -> Self {
        let mut new_data = unsafe { DeviceBuffer::<f32>::uninitialized(self.len()) }
            .expect("Failed to allocate device buffer for clone"); // Clone impl can panic
        if !self.is_empty() {
            new_data
                .copy_from(&self.data)
                .expect("Failed to copy device buffer for clone"); // Clone impl can panic
        }
        Self {
            data: new_data,
            shape: self.shape.clone(),
        }
    }
}

impl std::fmt::Debug for CudaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CudaStorage(shape={:?}, len={}, ptr={:?})",
            self.shape,
            self.len(),
            self.data.as_device_ptr()
        )
    }
}

impl std::fmt::Display for CudaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CudaStorage(shape={:?})", self.shape)
    }
}
