#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

use std::cell::Cell;
use std::path::Path;

use optflow::image::{GrayImage, Image, VectorField};
use optflow::imgproc::{draw::render_vector_field, histogram::equalize_channel};
use optflow::io::png;
use optflow::motion::{AlgorithmConfig, ExtractorConfig, ProgressSink};

/// Distance in pixels between the arrows of a vector field illustration.
pub const ARROW_SPACING: usize = 15;

/// Load the extractor configuration.
///
/// The parameters come from an optional json file, the algorithm named on the
/// command line takes precedence over the one in the file, and the level and
/// iteration counts override both.
pub fn load_config(
    algorithm: &str,
    config_path: Option<&Path>,
    levels: Option<usize>,
    iterations: Option<usize>,
) -> Result<ExtractorConfig, Box<dyn std::error::Error>> {
    // fail early with the list of known algorithms
    AlgorithmConfig::from_name(algorithm)?;

    let mut document = match config_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::Value::Object(Default::default()),
    };
    let Some(fields) = document.as_object_mut() else {
        return Err("the configuration file must hold a json object".into());
    };
    fields.insert("algorithm".to_string(), algorithm.into());

    let mut config: ExtractorConfig = serde_json::from_value(document)?;
    if let Some(levels) = levels {
        config.pyramid.num_levels = levels;
    }
    if let Some(iterations) = iterations {
        config.algorithm.set_num_iterations(iterations);
    }

    Ok(config)
}

/// Logs the progress of an extraction every tenth of the work.
#[derive(Debug, Default)]
pub struct DecileLogger {
    last_decile: Cell<i32>,
}

impl ProgressSink for DecileLogger {
    fn report(&self, fraction: f64) {
        let decile = (fraction * 10.0) as i32;
        if decile > self.last_decile.get() {
            self.last_decile.set(decile);
            log::info!("{}%", decile * 10);
        }
    }
}

/// Draw a vector field over its source image and save it as a PNG file.
pub fn write_illustration(
    path: impl AsRef<Path>,
    background: &GrayImage,
    field: &VectorField,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut illustration = Image::<u8, 3>::from_size_val(field.size(), 0)?;
    render_vector_field(background, field, ARROW_SPACING, &mut illustration)?;
    png::write_image_png_rgb8(&path, &illustration)?;
    log::info!("wrote {}", path.as_ref().display());
    Ok(())
}

/// Save every quality channel of a vector field as an equalized PNG file.
///
/// Channel `q` goes to `<prefix>-quality<q + 1>.png`.
pub fn write_quality_images(
    prefix: &str,
    field: &VectorField,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut image = GrayImage::from_size_val(field.size(), 0)?;
    for q in 0..field.num_quality_channels() {
        equalize_channel(field, 2 + q, &mut image)?;
        let path = format!("{prefix}-quality{}.png", q + 1);
        png::write_image_png_mono8(&path, &image)?;
        log::info!("wrote {path}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use optflow::motion::{BoundaryConditions, ProesmansParams};

    #[test]
    fn command_line_overrides_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "algorithm": "horn-schunck", "boundary_conditions": "dirichlet",
                 "num_iterations": 7, "pyramid": { "num_levels": 2 } }"#,
        )?;

        let config = load_config("proesmans", Some(&path), Some(3), Some(11))?;
        assert_eq!(
            config.algorithm,
            AlgorithmConfig::Proesmans(ProesmansParams {
                num_iterations: 11,
                boundary_conditions: BoundaryConditions::Dirichlet,
                ..Default::default()
            })
        );
        assert_eq!(config.pyramid.num_levels, 3);
        Ok(())
    }

    #[test]
    fn defaults_without_file() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_config("lucas-kanade", None, None, None)?;
        assert_eq!(config, ExtractorConfig::from_name("lucas-kanade")?);
        assert!(load_config("farneback", None, None, None).is_err());
        Ok(())
    }

    #[test]
    fn quality_images_are_numbered_from_one() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let prefix = tmp_dir.path().join("out");
        let prefix = prefix.to_string_lossy();

        let mut field = VectorField::new([4, 3].into(), 2);
        field.set_quality(1, 1, 0, 0.5);
        write_quality_images(&prefix, &field)?;

        let first = png::read_image_png_mono8(format!("{prefix}-quality1.png"))?;
        assert_eq!(first.get_pixel(1, 1, 0)?, 255);
        assert_eq!(first.get_pixel(0, 0, 0)?, 0);
        assert!(Path::new(&format!("{prefix}-quality2.png")).exists());
        assert!(!Path::new(&format!("{prefix}-quality3.png")).exists());
        Ok(())
    }
}
