// CUDA context management using cust.
// Handles device initialization, the stream, and kernel loading.

use crate::error::Error;
use cust::context::{Context, CurrentContext};
use cust::device::Device;
use cust::function::Function;
use cust::module::Module;
use cust::stream::{Stream, StreamFlags};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

pub struct CudaContext {
    pub(crate) _context: Context,
    #[allow(dead_code)]
    device: Device,
    stream: Stream,
    modules: HashMap<String, Arc<Module>>,
    kernels: HashMap<String, Function<'static>>,
}

lazy_static! {
    static ref GLOBAL_CUDA_CONTEXT: Mutex<Option<Arc<CudaContext>>> = Mutex::new(None);
    static ref CUDA_INIT: Once = Once::new();
}

impl CudaContext {
    fn new(device_id: u32) -> Result<Self, Error> {
        cust::init(cust::CudaFlags::empty())?;
        let device = Device::get_device(device_id).map_err(|e| Error::CudaError(e.to_string()))?;
        let context = Context::new(device).map_err(|e| Error::CudaError(e.to_string()))?;
        let stream =
            Stream::new(StreamFlags::DEFAULT, None).map_err(|e| Error::CudaError(e.to_string()))?;

        let mut instance = Self {
            _context: context,
            device,
            stream,
            modules: HashMap::new(),
            kernels: HashMap::new(),
        };

        instance.load_kernels()?;
        debug_println!(
            "[DEBUG CudaContext] Loaded kernels: {:?}",
            instance.kernels.keys().collect::<Vec<_>>()
        );
        Ok(instance)
    }

    fn load_kernel_module(&mut self, name: &str, ptx_path: &Path) -> Result<(), Error> {
        debug_println!(
            "Loading kernel module: {} from {}",
            name,
            ptx_path.display()
        );
        let ptx_str = fs::read_to_string(ptx_path).map_err(|e| {
            Error::CudaError(format!(
                "Failed to read PTX file {}: {}",
                ptx_path.display(),
                e
            ))
        })?;

        CurrentContext::set_current(&self._context)?;

        let module = Module::from_ptx(&ptx_str, &[])
            .map_err(|e| Error::CudaError(format!("Failed to load module {}: {}", name, e)))?;

        let arc_module = Arc::new(module);

        let expected_kernels: &[&str] = match name {
            "grid_sample" => &["grid_sample_forward_kernel", "grid_sample_backward_kernel"],
            _ => {
                return Err(Error::CudaError(format!(
                    "Unknown module name: {}. Expected 'grid_sample'",
                    name
                )))
            }
        };

        let mut functions_to_add = HashMap::new();
        for &kernel_name in expected_kernels {
            match arc_module.get_function(kernel_name) {
                Ok(func) => {
                    debug_println!("Successfully loaded kernel: {}", kernel_name);
                    let static_func =
                        unsafe { std::mem::transmute::<Function<'_>, Function<'static>>(func) };
                    functions_to_add.insert(kernel_name.to_string(), static_func);
                }
                Err(e) => {
                    return Err(Error::CudaError(format!(
                        "Failed to load kernel '{}' from module '{}': {}",
                        kernel_name, name, e
                    )));
                }
            }
        }

        self.modules.insert(name.to_string(), arc_module);
        self.kernels.extend(functions_to_add);
        debug_println!("Successfully loaded all kernels for module: {}", name);
        Ok(())
    }

    fn load_kernels(&mut self) -> Result<(), Error> {
        let out_dir = std::env::var("OUT_DIR")
            .map_err(|_| Error::InternalLogicError("OUT_DIR not set".to_string()))?;
        let grid_sample_ptx_path = Path::new(&out_dir).join("grid_sample.ptx");
        self.load_kernel_module("grid_sample", &grid_sample_ptx_path)?;
        Ok(())
    }

    pub fn get_stream(&self) -> &Stream {
        &self.stream
    }

    pub fn get_kernel(&self, name: &str) -> Option<&Function<'static>> {
        self.kernels.get(name)
    }
}

impl Drop for CudaContext {
    fn drop(&mut self) {
        debug_println!("Dropping CudaContext");
    }
}

pub fn init_context(device_id: u32) -> Result<(), Error> {
    CUDA_INIT.call_once(|| {
        let mut global_ctx_guard = match GLOBAL_CUDA_CONTEXT.lock() {
            Ok(guard) => guard,
            Err(_) => {
                eprintln!("FATAL: CUDA context mutex was poisoned during initialization");
                return;
            }
        };

        if global_ctx_guard.is_none() {
            debug_println!("Initializing CUDA context for device {}...", device_id);
            match CudaContext::new(device_id) {
                Ok(context) => {
                    *global_ctx_guard = Some(Arc::new(context));
                    debug_println!("CUDA context initialization successful.");
                }
                Err(e) => {
                    eprintln!("FATAL: Failed to initialize CUDA context: {}", e);
                }
            }
        } else {
            debug_println!("CUDA context already initialized (skipped initialization logic).");
        }
    });

    let final_check_guard = match GLOBAL_CUDA_CONTEXT.lock() {
        Ok(guard) => guard,
        Err(_) => {
            eprintln!("FATAL: CUDA context mutex was poisoned after initialization check");
            return Err(Error::InternalLogicError(
                "CUDA context mutex was poisoned after initialization check".to_string(),
            ));
        }
    };

    if CUDA_INIT.is_completed() && final_check_guard.is_some() {
        Ok(())
    } else {
        Err(Error::CudaError(
            "CUDA context initialization failed or context is not available.".into(),
        ))
    }
}

pub fn get_global_context() -> Result<Arc<CudaContext>, Error> {
    let global_ctx = GLOBAL_CUDA_CONTEXT
        .lock()
        .map_err(|_| Error::InternalLogicError("CUDA context mutex was poisoned".to_string()))?;

    match global_ctx.as_ref() {
        Some(ctx) => Ok(ctx.clone()),
        None => Err(Error::UnsupportedCapability(
            "CUDA context not initialized. Call init_context first.".into(),
        )),
    }
}

pub struct CudaContextGuard {
    _context_arc: Arc<CudaContext>,
}

impl CudaContextGuard {
    pub fn new() -> Result<Self, Error> {
        let context = get_global_context()?;
        CurrentContext::set_current(&context._context)
            .map_err(|e| {
                Error::InternalLogicError(format!("Failed to set current CUDA context: {}", e))
            })
            .map(|_| CudaContextGuard {
                _context_arc: context,
            })
    }
}

// No Drop implementation needed, the Arc<CudaContext> handles cleanup
