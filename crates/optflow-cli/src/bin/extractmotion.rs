use argh::FromArgs;
use std::path::PathBuf;

use optflow::image::{GrayImage, VectorField};
use optflow::io::{png, vector_field};
use optflow::motion::DenseMotionExtractor;
use optflow_cli::{load_config, write_illustration, write_quality_images, DecileLogger};

#[derive(FromArgs)]
/// Compute the dense motion between two grayscale images.
///
/// Writes <prefix>-motion.pdvm and an illustration <prefix>-motion.png, or the
/// F and B variants of both for bidirectional algorithms, plus one equalized
/// <prefix>-quality<n>.png per quality channel of the forward field.
struct Args {
    /// path to the first image
    #[argh(positional)]
    image1: PathBuf,

    /// path to the second image
    #[argh(positional)]
    image2: PathBuf,

    /// the algorithm: horn-schunck, lucas-kanade or proesmans
    #[argh(positional)]
    algorithm: String,

    /// prefix of the written files
    #[argh(positional)]
    prefix: String,

    /// path to a json file with the extractor parameters
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// override the number of pyramid levels
    #[argh(option, short = 'l')]
    levels: Option<usize>,

    /// override the number of solver iterations
    #[argh(option, short = 'n')]
    iterations: Option<usize>,
}

fn write_field(
    prefix: &str,
    suffix: &str,
    background: &GrayImage,
    field: &VectorField,
) -> Result<(), Box<dyn std::error::Error>> {
    let field_path = format!("{prefix}-motion{suffix}.pdvm");
    vector_field::write_vector_field(&field_path, field)?;
    log::info!("wrote {field_path}");

    write_illustration(format!("{prefix}-motion{suffix}.png"), background, field)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = load_config(
        &args.algorithm,
        args.config.as_deref(),
        args.levels,
        args.iterations,
    )?;
    let extractor = config.build()?;

    let image1 = png::read_image_png_mono8(&args.image1)?;
    let image2 = png::read_image_png_mono8(&args.image2)?;

    let progress = DecileLogger::default();

    if extractor.extractor().is_dual() {
        let (forward, backward) =
            extractor.compute_dual_with_progress(&image1, &image2, &progress)?;
        write_field(&args.prefix, "F", &image1, &forward)?;
        write_field(&args.prefix, "B", &image2, &backward)?;
        write_quality_images(&args.prefix, &forward)?;
    } else {
        let field = extractor.compute_with_progress(&image1, &image2, &progress)?;
        write_field(&args.prefix, "", &image1, &field)?;
        write_quality_images(&args.prefix, &field)?;
    }

    Ok(())
}
