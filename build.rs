use std::env;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    // Handle CUDA feature
    if env::var("CARGO_FEATURE_CUDA").is_ok() {
        println!("cargo:warning=CUDA feature enabled, compiling kernels...");

        // Find nvcc - Use `which` crate first for better cross-platform compatibility
        let nvcc_path = match which::which("nvcc") {
            Ok(path) => path,
            Err(_) => {
                // Fallback to checking CUDA_PATH or common locations if `which` fails
                if let Ok(cuda_path) = env::var("CUDA_PATH") {
                    PathBuf::from(cuda_path).join("bin").join("nvcc")
                } else {
                    ["/usr/local/cuda/bin/nvcc", "/opt/cuda/bin/nvcc"]
                        .iter()
                        .map(PathBuf::from)
                        .find(|p| p.exists())
                        .expect("nvcc not found. Ensure CUDA Toolkit is installed and nvcc is in PATH, or set CUDA_PATH.")
                }
            }
        };
        println!("cargo:warning=Using nvcc found at: {:?}", nvcc_path);

        let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

        let kernels_to_compile = [(
            "src/backend/cuda/kernels/grid_sample.cu",
            "grid_sample.ptx",
        )];

        for (src, ptx) in kernels_to_compile {
            let ptx_path = out_dir.join(ptx);
            let status = Command::new(&nvcc_path)
                .args(["-ptx", src, "-o"])
                .arg(&ptx_path)
                .status()
                .unwrap_or_else(|e| panic!("Failed to run nvcc on {}: {}", src, e));
            if !status.success() {
                panic!("nvcc failed to compile {} (exit status {})", src, status);
            }
            println!("cargo:rerun-if-changed={}", src);
        }
    }
}
