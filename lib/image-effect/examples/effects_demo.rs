use anyhow::Result;
use image::ImageReader;
use image_effect::{
    Effect, Frame, ImageEffect,
    blur::GaussianBlurConfig,
    color_map::ColorMap,
    geometry::WidescreenConfig,
    monochrome::{EdgeDetectionConfig, SepiaConfig},
    thumbnail::thumbnail,
    tone::{ScaleConfig, WhiteBalanceConfig},
};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let img_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/test.png".to_string());
    let frame = Frame::from_rgb(ImageReader::open(&img_path)?.decode()?.to_rgb8());

    let effects = [
        ImageEffect::Scale(ScaleConfig::new().with_alpha(1.2).with_beta(20.0)),
        ImageEffect::WhiteBalance(
            WhiteBalanceConfig::new()
                .with_red_gain(1.4)
                .with_blue_gain(0.7),
        ),
        ImageEffect::SwapRedBlue,
        ImageEffect::GaussianBlur(GaussianBlurConfig::new().with_kernel_size(11).with_sigma(10.0)),
        ImageEffect::Grayscale,
        ImageEffect::EqualizeHistogram,
        ImageEffect::Sepia(SepiaConfig::new()),
        ImageEffect::EdgeDetection(EdgeDetectionConfig::new()),
        ImageEffect::ColorMap(ColorMap::Autumn),
        ImageEffect::ColorMap(ColorMap::Ocean),
        ImageEffect::ColorMap(ColorMap::Pink),
        ImageEffect::Widescreen(WidescreenConfig::new()),
    ];

    for effect in effects {
        let out = effect.apply(frame.clone())?;
        let filename = format!("{}.png", effect.name());
        out.to_rgb_image().save(output_dir.join(&filename))?;

        println!(
            "✓ Generated {} ({}x{}x{})",
            filename,
            out.width(),
            out.height(),
            out.channels()
        );
    }

    thumbnail(&frame, 160)?.save(output_dir.join("thumbnail.png"))?;

    println!("\n✓ All effects applied successfully!");
    println!("  Images saved to: tmp/");

    Ok(())
}
