use argh::FromArgs;
use std::path::PathBuf;

use optflow::image::GrayImage;
use optflow::imgproc::warp::extrapolate_inverse;
use optflow::io::{png, vector_field};

#[derive(FromArgs)]
/// Extrapolate an image along a dense vector field
struct Args {
    /// path to the grayscale source image
    #[argh(positional)]
    image: PathBuf,

    /// path to the vector field file
    #[argh(positional)]
    field: PathBuf,

    /// the time multiplier applied to every vector
    #[argh(positional)]
    multiplier: f32,

    /// path to the output image
    #[argh(positional)]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let image = png::read_image_png_mono8(&args.image)?;
    let field = vector_field::read_vector_field(&args.field)?;
    log::info!(
        "extrapolating {}x{} image with multiplier {}",
        image.width(),
        image.height(),
        args.multiplier
    );

    let mut output = GrayImage::from_size_val(image.size(), 0)?;
    extrapolate_inverse(&image, &field, args.multiplier, &mut output)?;

    png::write_image_png_mono8(&args.output, &output)?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}
