//! GPU integration tests. Each test compares the wgpu backend against the CPU
//! reference renderer and is skipped when no adapter is available.
//!
//! Run with: `cargo test -p fotiq-gpu`

use std::sync::{Mutex, OnceLock};

use fotiq_core::grading::curves::CurvePoint;
use fotiq_core::image::{BitDepth, LinearImage};
use fotiq_core::mask::{MaskAdjustments, MaskGeometry, MaskKind};
use fotiq_core::transform::params::keys;
use fotiq_core::{
    AdjustmentState, CpuRenderer, EngineConfig, EngineError, OutputMode, RenderBackend,
};
use fotiq_gpu::{GpuContext, GpuRenderer};

const TOLERANCE: f32 = 2e-3;

fn gpu_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn create_test_renderer() -> Option<GpuRenderer> {
    match GpuContext::new_blocking() {
        Ok(context) => Some(GpuRenderer::from_context(&context, EngineConfig::default())),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn create_test_gradient(width: u32, height: u32) -> LinearImage {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = x as f32 / (width - 1) as f32;
            let g = y as f32 / (height - 1) as f32;
            pixels.push([r, g, 0.5, 1.0]);
        }
    }
    LinearImage {
        width,
        height,
        pixels,
        source_bit_depth: BitDepth::F32,
    }
}

fn cpu_render(source: &LinearImage, state: &AdjustmentState, mode: OutputMode) -> LinearImage {
    let mut cpu = CpuRenderer::new(EngineConfig::default());
    cpu.load_image(source.clone()).unwrap();
    cpu.set_output_mode(mode);
    cpu.render(state).unwrap()
}

fn assert_frames_close(gpu: &LinearImage, cpu: &LinearImage, what: &str) {
    assert_eq!((gpu.width, gpu.height), (cpu.width, cpu.height), "{what}: size");
    for (i, (g, c)) in gpu.pixels.iter().zip(&cpu.pixels).enumerate() {
        for ch in 0..4 {
            assert!(
                (g[ch] - c[ch]).abs() < TOLERANCE,
                "{what}: pixel {i} channel {ch}: gpu {} vs cpu {}",
                g[ch],
                c[ch]
            );
        }
    }
}

fn graded_state() -> AdjustmentState {
    AdjustmentState::default()
        .apply_adjustment(keys::EXPOSURE, 12.0)
        .apply_adjustment(keys::CONTRAST, 20.0)
        .apply_adjustment(keys::TEMPERATURE, 15.0)
        .apply_adjustment(keys::SHADOWS, 30.0)
        .apply_adjustment(keys::WHITES, -10.0)
        .apply_adjustment(keys::CURVE_DARKS, 25.0)
        .apply_adjustment(keys::VIBRANCE, 35.0)
        .apply_adjustment("hsl_blue_h", 30.0)
        .apply_adjustment("hsl_green_s", -40.0)
        .apply_adjustment("hsl_red_h", 20.0)
        .with_curve_points(vec![
            CurvePoint::new(0.0, 10.0),
            CurvePoint::new(128.0, 140.0),
            CurvePoint::new(255.0, 250.0),
        ])
}

#[test]
fn test_gpu_default_state_reproduces_source() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let source = create_test_gradient(16, 12);
    gpu.load_image(source.clone()).unwrap();
    let frame = gpu.render(&AdjustmentState::default()).unwrap();
    assert_frames_close(&frame, &source, "identity");
}

#[test]
fn test_gpu_matches_cpu_for_global_grade() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let source = create_test_gradient(32, 24);
    let state = graded_state();
    gpu.load_image(source.clone()).unwrap();
    let frame = gpu.render(&state).unwrap();
    assert_frames_close(&frame, &cpu_render(&source, &state, OutputMode::Normal), "graded");
}

#[test]
fn test_gpu_matches_cpu_for_masks_and_geometry() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let source = create_test_gradient(24, 24);
    let mut state = AdjustmentState::default()
        .apply_adjustment(keys::ROTATION, 12.0)
        .apply_adjustment(keys::DISTORTION, -30.0)
        .add_mask(MaskKind::Radial, 3)
        .add_mask(MaskKind::Linear, 3);

    let mut radial = state.masks()[0];
    radial.geometry = MaskGeometry::Radial {
        center: [0.4, 0.6],
        radius_x: 0.3,
        radius_y: 0.2,
        rotation: 25.0,
    };
    radial.adjustments = MaskAdjustments {
        exposure: 60.0,
        contrast: 0.0,
        saturation: -30.0,
    };
    let mut linear = state.masks()[1];
    linear.geometry = MaskGeometry::Linear {
        anchor: [0.5, 0.3],
        rotation: 90.0,
    };
    linear.inverted = true;
    linear.adjustments = MaskAdjustments {
        exposure: -40.0,
        contrast: 25.0,
        saturation: 0.0,
    };
    state = state.update_mask(radial).update_mask(linear);

    gpu.load_image(source.clone()).unwrap();
    let frame = gpu.render(&state).unwrap();
    assert_frames_close(&frame, &cpu_render(&source, &state, OutputMode::Normal), "masks");
}

#[test]
fn test_gpu_detail_and_scaled_render() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let source = create_test_gradient(20, 20);
    let state = AdjustmentState::default()
        .apply_adjustment(keys::SHARPEN_AMOUNT, 90.0)
        .apply_adjustment(keys::NOISE_REDUCTION, 40.0);
    gpu.load_image(source.clone()).unwrap();
    let frame = gpu.render_scaled(&state, 7, 5).unwrap();

    let mut cpu = CpuRenderer::new(EngineConfig::default());
    cpu.load_image(source).unwrap();
    let expected = cpu.render_scaled(&state, 7, 5).unwrap();
    assert_frames_close(&frame, &expected, "detail");
}

#[test]
fn test_gpu_preserves_alpha() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let mut source = create_test_gradient(8, 8);
    for (i, px) in source.pixels.iter_mut().enumerate() {
        px[3] = i as f32 / 63.0;
    }
    gpu.load_image(source.clone()).unwrap();
    let frame = gpu.render(&graded_state()).unwrap();
    for (s, f) in source.pixels.iter().zip(&frame.pixels) {
        assert!((s[3] - f[3]).abs() < 1e-6);
    }
}

#[test]
fn test_gpu_output_modes_match_cpu() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let mut source = create_test_gradient(8, 8);
    source.pixels[0] = [-0.5, -0.5, -0.5, 1.0];
    let state = AdjustmentState::default().apply_adjustment(keys::EXPOSURE, 30.0);
    gpu.load_image(source.clone()).unwrap();

    for mode in [OutputMode::GamutWarning, OutputMode::InkCoverage] {
        gpu.set_output_mode(mode);
        let frame = gpu.render(&state).unwrap();
        assert_frames_close(&frame, &cpu_render(&source, &state, mode), &format!("{mode:?}"));
    }
}

#[test]
fn test_gpu_histogram_counts_every_pixel() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    let source = create_test_gradient(16, 16);
    gpu.load_image(source.clone()).unwrap();
    assert_eq!(gpu.histogram().unwrap().total(), 256);

    let state = AdjustmentState::default().apply_adjustment(keys::EXPOSURE, -20.0);
    gpu.render(&state).unwrap();
    let histogram = gpu.histogram().unwrap();
    assert_eq!(histogram.total(), 256);
    assert_eq!(histogram.red.iter().sum::<u32>(), 256);
    assert_eq!(histogram.blue.iter().sum::<u32>(), 256);

    // An export at another size leaves the displayed histogram alone.
    let export = gpu.render_scaled(&state, 10, 6).unwrap();
    assert_eq!(export.pixels.len(), 60);
    assert_eq!(gpu.histogram().unwrap(), histogram);
}

#[test]
fn test_gpu_rejects_oversized_target() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut gpu) = create_test_renderer() else {
        return;
    };
    gpu.load_image(create_test_gradient(4, 4)).unwrap();
    let too_wide = gpu.max_dimension() + 1;
    let err = gpu
        .render_scaled(&AdjustmentState::default(), too_wide, 1)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedInput(_)));
}
