use approx::assert_relative_eq;
use grid_sampler::backend::cpu::CpuBackend;
use grid_sampler::{ops, Backend, Error};

// Helper to build the grid that samples every input pixel at its own center.
// Pixel centers in normalized coordinates are g = (2 * i + 1) / size - 1.
fn identity_grid(n: usize, h: usize, w: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(n * h * w * 2);
    for _ in 0..n {
        for i in 0..h {
            for j in 0..w {
                data.push((2.0 * j as f32 + 1.0) / w as f32 - 1.0);
                data.push((2.0 * i as f32 + 1.0) / h as f32 - 1.0);
            }
        }
    }
    data
}

#[test]
fn test_cpu_grid_sample_center_of_2x2() -> Result<(), Error> {
    let input = CpuBackend::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2])?;
    // (0, 0) unnormalizes to (0.5, 0.5), the exact center of the four pixels
    let grid = CpuBackend::from_vec(vec![0.0, 0.0], &[1, 1, 1, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    assert_eq!(CpuBackend::shape(&output), &[1, 1, 1, 1]);
    let data = CpuBackend::copy_to_host(&output)?;
    assert_relative_eq!(data[0], 2.5, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_cpu_grid_sample_identity_reproduces_input() -> Result<(), Error> {
    let (n, c, h, w) = (2, 3, 4, 5);
    let input = CpuBackend::random_uniform(&[n, c, h, w], -1.0, 1.0)?;
    let grid = CpuBackend::from_vec(identity_grid(n, h, w), &[n, h, w, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    assert_eq!(CpuBackend::shape(&output), &[n, c, h, w]);

    let input_data = CpuBackend::copy_to_host(&input)?;
    let output_data = CpuBackend::copy_to_host(&output)?;
    for (o, i) in output_data.iter().zip(input_data.iter()) {
        assert_relative_eq!(*o, *i, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
fn test_cpu_grid_sample_out_of_bounds_is_zero() -> Result<(), Error> {
    let input = CpuBackend::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2])?;
    // (3, 3) lands far outside the input; all four corners miss
    let grid = CpuBackend::from_vec(vec![3.0, 3.0], &[1, 1, 1, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    let data = CpuBackend::copy_to_host(&output)?;
    assert_eq!(data[0], 0.0);
    Ok(())
}

#[test]
fn test_cpu_grid_sample_corner_partial_coverage() -> Result<(), Error> {
    let input = CpuBackend::from_vec(vec![8.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2])?;
    // (-1, -1) unnormalizes to (-0.5, -0.5); only pixel (0, 0) is in bounds,
    // with bilinear weight 0.25
    let grid = CpuBackend::from_vec(vec![-1.0, -1.0], &[1, 1, 1, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    let data = CpuBackend::copy_to_host(&output)?;
    assert_relative_eq!(data[0], 2.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_cpu_grid_sample_output_shape_differs_from_input() -> Result<(), Error> {
    let (n, c, h, w) = (1, 2, 3, 3);
    let (ho, wo) = (5, 7);
    let input = CpuBackend::random_uniform(&[n, c, h, w], 0.0, 1.0)?;
    let grid = CpuBackend::random_uniform(&[n, ho, wo, 2], -1.0, 1.0)?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    assert_eq!(CpuBackend::shape(&output), &[n, c, ho, wo]);
    Ok(())
}

#[test]
fn test_cpu_grid_sample_multi_batch_channel() -> Result<(), Error> {
    // Two batches with distinct planes; batch 0 samples pixel (0, 0),
    // batch 1 samples pixel (1, 1)
    let input = CpuBackend::from_vec(
        vec![
            1.0, 2.0, 3.0, 4.0, // b0 c0
            10.0, 20.0, 30.0, 40.0, // b0 c1
            5.0, 6.0, 7.0, 8.0, // b1 c0
            50.0, 60.0, 70.0, 80.0, // b1 c1
        ],
        &[2, 2, 2, 2],
    )?;
    let grid = CpuBackend::from_vec(vec![-0.5, -0.5, 0.5, 0.5], &[2, 1, 1, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    let data = CpuBackend::copy_to_host(&output)?;
    assert_relative_eq!(data[0], 1.0, epsilon = 1e-6);
    assert_relative_eq!(data[1], 10.0, epsilon = 1e-6);
    assert_relative_eq!(data[2], 8.0, epsilon = 1e-6);
    assert_relative_eq!(data[3], 80.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_cpu_grid_sample_batch_mismatch_errors() -> Result<(), Error> {
    let input = CpuBackend::random_uniform(&[2, 1, 2, 2], 0.0, 1.0)?;
    let grid = CpuBackend::random_uniform(&[3, 1, 1, 2], -1.0, 1.0)?;

    let result = ops::grid_sample::<CpuBackend>(&input, &grid);
    assert!(matches!(result, Err(Error::IncompatibleShapes { .. })));
    Ok(())
}

#[test]
fn test_cpu_grid_sample_rank_errors() -> Result<(), Error> {
    let input3d = CpuBackend::random_uniform(&[1, 2, 2], 0.0, 1.0)?;
    let grid = CpuBackend::random_uniform(&[1, 1, 1, 2], -1.0, 1.0)?;
    let result = ops::grid_sample::<CpuBackend>(&input3d, &grid);
    assert!(matches!(result, Err(Error::DimensionMismatch(4, 3))));

    let input = CpuBackend::random_uniform(&[1, 1, 2, 2], 0.0, 1.0)?;
    let grid3d = CpuBackend::random_uniform(&[1, 1, 2], -1.0, 1.0)?;
    let result = ops::grid_sample::<CpuBackend>(&input, &grid3d);
    assert!(matches!(result, Err(Error::DimensionMismatch(4, 3))));
    Ok(())
}

#[test]
fn test_cpu_grid_sample_bad_coordinate_pair_errors() -> Result<(), Error> {
    let input = CpuBackend::random_uniform(&[1, 1, 2, 2], 0.0, 1.0)?;
    let grid = CpuBackend::random_uniform(&[1, 1, 1, 3], -1.0, 1.0)?;

    let result = ops::grid_sample::<CpuBackend>(&input, &grid);
    assert!(matches!(result, Err(Error::ShapeError(_))));
    Ok(())
}

#[test]
fn test_cpu_grid_sample_empty_grid() -> Result<(), Error> {
    let input = CpuBackend::random_uniform(&[1, 1, 2, 2], 0.0, 1.0)?;
    let grid = CpuBackend::zeros(&[1, 0, 0, 2])?;

    let output = ops::grid_sample::<CpuBackend>(&input, &grid)?;
    assert_eq!(CpuBackend::shape(&output), &[1, 1, 0, 0]);
    assert_eq!(CpuBackend::size(&output), 0);
    Ok(())
}
