use argh::FromArgs;
use std::path::PathBuf;

use optflow::image::GrayImage;
use optflow::imgproc::warp::morph;
use optflow::io::png;
use optflow_cli::{load_config, write_illustration, DecileLogger};

#[derive(FromArgs)]
/// Interpolate intermediate frames between two grayscale images.
///
/// Extracts the forward and backward motion with a bidirectional algorithm,
/// writes their illustrations to <prefix>-motion-1.png and <prefix>-motion-2.png
/// and the frames to <prefix>-morph-01.png onwards, the first frame being the
/// first image and the last frame the second image.
struct Args {
    /// path to the first image
    #[argh(positional)]
    image1: PathBuf,

    /// path to the second image
    #[argh(positional)]
    image2: PathBuf,

    /// number of frames to write, including both images
    #[argh(positional)]
    num_time_steps: usize,

    /// the algorithm, only proesmans computes both fields
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.num_time_steps == 0 {
        return Err("the number of time steps must be positive".into());
    }

    let config = load_config(
        &args.algorithm,
        args.config.as_deref(),
        args.levels,
        args.iterations,
    )?;
    let extractor = config.build()?;

    let image1 = png::read_image_png_mono8(&args.image1)?;
    let image2 = png::read_image_png_mono8(&args.image2)?;

    let (forward, backward) =
        extractor.compute_dual_with_progress(&image1, &image2, &DecileLogger::default())?;
    write_illustration(format!("{}-motion-1.png", args.prefix), &image1, &forward)?;
    write_illustration(format!("{}-motion-2.png", args.prefix), &image2, &backward)?;

    let mut frame = GrayImage::from_size_val(image1.size(), 0)?;
    let last = args.num_time_steps - 1;
    for step in 0..args.num_time_steps {
        let t = if last == 0 {
            0.0
        } else {
            step as f32 / last as f32
        };
        morph(&image1, &image2, &forward, &backward, t, &mut frame)?;

        let path = format!("{}-morph-{:02}.png", args.prefix, step + 1);
        png::write_image_png_mono8(&path, &frame)?;
        log::info!("wrote {path} at t = {t:.3}");
    }

    Ok(())
}
