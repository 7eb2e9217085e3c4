use std::path::PathBuf;

use claybook::{document, ColorPolicy, DocumentInfo, Filter, PdfOptions, SourceImage};
use structopt::StructOpt;

/// Bind images into a PDF, one page per image frame.
#[derive(StructOpt, Debug)]
#[structopt(name = "images2pdf")]
struct Opt {
    /// Output file
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Add the pages to the end of an existing output file
    #[structopt(short, long)]
    append: bool,

    /// Resolution assumed for images that do not carry one
    #[structopt(short, long, default_value = "72")]
    resolution: f64,

    /// JPEG quality used for DCT encoded pages
    #[structopt(short, long, default_value = "75")]
    quality: u8,

    /// Store pages losslessly with Flate instead of JPEG
    #[structopt(long)]
    lossless: bool,

    /// Convert every image to RGB instead of rejecting unusual pixel formats
    #[structopt(long)]
    convert: bool,

    /// Document title
    #[structopt(short, long)]
    title: Option<String>,

    /// Images in page order
    #[structopt(parse(from_os_str), required = true)]
    images: Vec<PathBuf>,
}

pub fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    let options = PdfOptions {
        resolution: opt.resolution,
        jpeg_quality: opt.quality,
        color_policy: if opt.convert {
            ColorPolicy::ConvertToRgb
        } else {
            ColorPolicy::Strict
        },
        filter: opt.lossless.then_some(Filter::Flate),
    };
    if let Err(e) = options.validate() {
        log::error!("{}", e);
        return;
    }

    let info = DocumentInfo {
        title: opt.title,
        ..DocumentInfo::default()
    };
    let sources: Vec<SourceImage> = opt.images.into_iter().map(SourceImage::from).collect();
    let progress = |done: usize, total: usize| log::info!("page {}/{}", done, total);

    let result = if opt.append {
        document::append_file(&opt.output, sources, info, &options, progress)
    } else {
        document::create_file(&opt.output, sources, info, &options, progress)
    };
    match result {
        Ok(pages) => {
            let recovered = pages.iter().filter(|page| page.recovered).count();
            println!("{} pages written to {}", pages.len(), opt.output.display());
            if recovered > 0 {
                println!("{} pages came from truncated images", recovered);
            }
        }
        Err(e) => log::error!("Could not write {}: {}", opt.output.display(), e),
    }
}
