use optflow_image::{GrayImage, ImageError, VectorField};
use optflow_motion::{
    DenseMotionExtractor, ExtractorConfig, FlowError, HornSchunck, HornSchunckParams, LucasKanade,
    LucasKanadeParams, MotionExtractor, Proesmans, ProesmansParams, PyramidParams,
    PyramidalExtractor,
};

fn intensity(x: f32, y: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    128.0 + 40.0 * (tau * x / 40.0).sin() + 40.0 * (tau * y / 28.0).cos()
        + 20.0 * (tau * (x + y) / 23.0).sin()
}

/// A smooth texture and the same texture moved by `(dx, dy)` pixels.
fn shifted_pair(size: usize, dx: f32, dy: f32) -> Result<(GrayImage, GrayImage), ImageError> {
    let image1 = GrayImage::from_fn([size, size].into(), |x, y, _| {
        intensity(x as f32, y as f32).round() as u8
    })?;
    let image2 = GrayImage::from_fn([size, size].into(), |x, y, _| {
        intensity(x as f32 - dx, y as f32 - dy).round() as u8
    })?;
    Ok((image1, image2))
}

fn interior_mean(field: &VectorField, lo: usize, hi: usize) -> [f32; 2] {
    let (mut sum, mut count) = ([0.0f32; 2], 0);
    for y in lo..hi {
        for x in lo..hi {
            let v = field.vector(x, y);
            sum[0] += v[0];
            sum[1] += v[1];
            count += 1;
        }
    }
    [sum[0] / count as f32, sum[1] / count as f32]
}

#[test]
fn lucas_kanade_recovers_shift() -> Result<(), FlowError> {
    let _ = env_logger::builder().is_test(true).try_init();

    let (image1, image2) = shifted_pair(64, 3.0, 0.0)?;
    let driver = PyramidalExtractor::new(
        LucasKanade::new(LucasKanadeParams::default())?,
        PyramidParams::default(),
    )?;

    let field = driver.compute(&image1, &image2)?;
    assert_eq!(field.size(), image1.size());
    assert_eq!(field.num_channels(), 4);

    let [dx, dy] = interior_mean(&field, 16, 48);
    assert!((dx - 3.0).abs() < 0.5, "mean dx = {dx}");
    assert!(dy.abs() < 0.5, "mean dy = {dy}");
    Ok(())
}

#[test]
fn single_level_equals_direct_solve() -> Result<(), FlowError> {
    let (image1, image2) = shifted_pair(32, 1.0, 0.5)?;

    let hs = HornSchunck::new(HornSchunckParams {
        num_iterations: 30,
        ..Default::default()
    })?;
    let direct = hs.compute(&image1, &image2)?;
    let driver = PyramidalExtractor::new(hs, PyramidParams { num_levels: 1 })?;
    assert_eq!(driver.compute(&image1, &image2)?, direct);

    let lk = LucasKanade::new(LucasKanadeParams {
        window_radius: 4,
        ..Default::default()
    })?;
    let direct = lk.compute(&image1, &image2)?;
    let driver = PyramidalExtractor::new(lk, PyramidParams { num_levels: 1 })?;
    assert_eq!(driver.compute(&image1, &image2)?, direct);

    let proesmans = Proesmans::new(ProesmansParams {
        num_iterations: 10,
        ..Default::default()
    })?;
    let direct = proesmans.compute_dual(&image1, &image2)?;
    let driver = PyramidalExtractor::new(proesmans, PyramidParams { num_levels: 1 })?;
    assert_eq!(driver.compute_dual(&image1, &image2)?, direct);
    Ok(())
}

#[test]
fn every_algorithm_produces_full_fields() -> Result<(), FlowError> {
    let (image1, image2) = shifted_pair(37, 2.0, -1.0)?;

    for name in ["horn-schunck", "lucas-kanade", "proesmans"] {
        let mut config = ExtractorConfig::from_name(name)?;
        config.algorithm.set_num_iterations(3);
        config.pyramid.num_levels = 3;

        let driver: PyramidalExtractor<MotionExtractor> = config.build()?;
        let field = driver.compute(&image1, &image2)?;

        assert_eq!(field.size(), image1.size());
        assert_eq!(field.num_channels(), driver.extractor().num_channels());
        assert!(field.as_slice().iter().all(|v| v.is_finite()));
    }
    Ok(())
}

#[test]
fn dual_capability_is_explicit() -> Result<(), FlowError> {
    let (image1, image2) = shifted_pair(16, 1.0, 0.0)?;

    let single = PyramidalExtractor::new(
        MotionExtractor::from(LucasKanade::default()),
        PyramidParams { num_levels: 2 },
    )?;
    assert!(matches!(
        single.compute_dual(&image1, &image2),
        Err(FlowError::DualUnsupported("Lucas-Kanade"))
    ));

    let dual = PyramidalExtractor::new(
        MotionExtractor::from(Proesmans::new(ProesmansParams {
            num_iterations: 5,
            ..Default::default()
        })?),
        PyramidParams { num_levels: 2 },
    )?;
    let (forward, backward) = dual.compute_dual(&image1, &image2)?;
    assert_eq!(dual.compute(&image1, &image2)?, forward);
    assert_eq!(backward.size(), image1.size());
    Ok(())
}
