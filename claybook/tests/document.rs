#![cfg(feature = "codec")]

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use claybook::{
    document, page_count, read_xref_chain, CbError, ColorMode, ColorPolicy, Document, DocumentInfo, Filter,
    PageRecord, PdfOptions, Raster, SourceImage,
};
use image::{
    codecs::{gif::GifEncoder, webp::WebPEncoder},
    Delay, ExtendedColorType, Frame, Rgb, RgbImage, Rgba, RgbaImage,
};
use lopdf::Object;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// RGB image with enough noise that its PNG data does not compress away.
fn noisy(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let [a, b, c, _] = state.to_be_bytes();
        Rgb([a, b, c])
    })
}

fn save_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

fn truncated_png(dir: &Path, name: &str, seed: u32) -> PathBuf {
    let path = save_png(dir, name, &noisy(64, 64, seed));
    let data = fs::read(&path).unwrap();
    fs::write(&path, &data[..data.len() * 2 / 3]).unwrap();
    path
}

fn media_box(doc: &lopdf::Document, page: lopdf::ObjectId) -> Vec<f32> {
    let page = doc.get_object(page).unwrap().as_dict().unwrap();
    page.get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect()
}

fn page_image(doc: &lopdf::Document, page: lopdf::ObjectId) -> lopdf::Dictionary {
    let page = doc.get_object(page).unwrap().as_dict().unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image = xobjects.get(b"Im").unwrap().as_reference().unwrap();
    doc.get_object(image).unwrap().as_stream().unwrap().dict.clone()
}

#[test]
fn pages_sized_by_resolution() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let sources = (0..3)
        .map(|i| SourceImage::from(save_png(dir.path(), &format!("{}.png", i), &noisy(800, 1200, i))))
        .collect();
    let target = dir.path().join("book.pdf");
    let options = PdfOptions {
        resolution: 96.0,
        ..PdfOptions::default()
    };

    let mut seen = Vec::new();
    let pages = document::create_file(&target, sources, DocumentInfo::default(), &options, |done, total| {
        seen.push((done, total))
    })
    .unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(seen.last(), Some(&(3, 3)));
    assert!(pages.iter().all(|page| page.size() == (600.0, 900.0) && !page.recovered));

    let doc = lopdf::Document::load(&target).unwrap();
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(page_ids.len(), 3);
    for page in page_ids {
        assert_eq!(media_box(&doc, page), vec![0.0, 0.0, 600.0, 900.0]);
        let image = page_image(&doc, page);
        assert_eq!(image.get(b"Width").unwrap().as_i64().unwrap(), 800);
        assert_eq!(image.get(b"Height").unwrap().as_i64().unwrap(), 1200);
        assert_eq!(image.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(image.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
    }

    let info = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_object(info).unwrap().as_dict().unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"book");
}

#[test]
fn xref_offsets_point_at_objects() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("offsets.pdf");
    let sources = vec![
        SourceImage::from(save_png(dir.path(), "a.png", &noisy(20, 10, 1))),
        SourceImage::from(save_png(dir.path(), "b.png", &noisy(10, 20, 2))),
    ];
    document::create_file(&target, sources, DocumentInfo::default(), &PdfOptions::default(), |_, _| {}).unwrap();

    let buf = fs::read(&target).unwrap();
    let chain = read_xref_chain(&buf).unwrap();
    assert_eq!(chain.offsets.len(), 9);
    for (number, (offset, _)) in &chain.offsets {
        let header = format!("{} 0 obj", number);
        assert!(buf[*offset..].starts_with(header.as_bytes()), "object {}", number);
    }
    assert_eq!(page_count(&target).unwrap(), 2);
}

#[test]
fn append_keeps_existing_pages() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("grow.pdf");
    let first = (0..2)
        .map(|i| SourceImage::from(save_png(dir.path(), &format!("a{}.png", i), &noisy(30, 40, i))))
        .collect();
    document::create_file(&target, first, DocumentInfo::default(), &PdfOptions::default(), |_, _| {}).unwrap();
    let before = fs::read(&target).unwrap();
    let old_chain = read_xref_chain(&before).unwrap();

    let more = (0..3)
        .map(|i| SourceImage::from(save_png(dir.path(), &format!("b{}.png", i), &noisy(40, 30, 10 + i))))
        .collect();
    let pages = document::append_file(&target, more, DocumentInfo::default(), &PdfOptions::default(), |_, _| {})
        .unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|page| page.ids.image.index as usize >= old_chain.trailer.size));

    let after = fs::read(&target).unwrap();
    assert!(after.starts_with(&before));
    let new_chain = read_xref_chain(&after).unwrap();
    assert_eq!(new_chain.trailer.previous, Some(old_chain.start_xref));
    for (number, offset) in &old_chain.offsets {
        // the page tree root is the only object rewritten by the update
        if *number != 2 {
            assert_eq!(new_chain.offsets.get(number), Some(offset), "object {}", number);
        }
    }
    assert_eq!(page_count(&target).unwrap(), 5);

    let doc = lopdf::Document::load(&target).unwrap();
    assert_eq!(doc.get_pages().len(), 5);
}

#[test]
fn every_truncated_image_is_recovered() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![
        SourceImage::from(truncated_png(dir.path(), "1.png", 1)),
        SourceImage::from(truncated_png(dir.path(), "2.png", 2)),
        SourceImage::from(save_png(dir.path(), "3.png", &noisy(64, 64, 3))),
    ];
    let target = dir.path().join("recovered.pdf");
    let pages =
        document::create_file(&target, sources, DocumentInfo::default(), &PdfOptions::default(), |_, _| {}).unwrap();

    let recovered: Vec<bool> = pages.iter().map(|page| page.recovered).collect();
    assert_eq!(recovered, vec![true, true, false]);
    assert_eq!(lopdf::Document::load(&target).unwrap().get_pages().len(), 3);
}

#[test]
fn strict_policy_rejects_alpha() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 128])).save(&path).unwrap();
    let target = dir.path().join("alpha.pdf");

    let err = document::create_file(
        &target,
        vec![SourceImage::from(path.clone())],
        DocumentInfo::default(),
        &PdfOptions::default(),
        |_, _| {},
    )
    .unwrap_err();
    assert!(matches!(err, CbError::UnsupportedPixelFormat(_)), "{}", err);

    let options = PdfOptions {
        color_policy: ColorPolicy::ConvertToRgb,
        ..PdfOptions::default()
    };
    let pages =
        document::create_file(&target, vec![SourceImage::from(path)], DocumentInfo::default(), &options, |_, _| {})
            .unwrap();
    assert_eq!(pages.len(), 1);
}

#[test]
fn animation_frames_become_pages() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anim.gif");
    {
        let file = fs::File::create(&path).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = [10u8, 200, 90].iter().map(|v| {
            Frame::from_parts(
                RgbaImage::from_pixel(6, 4, Rgba([*v, 0, 0, 255])),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }

    let target = dir.path().join("anim.pdf");
    let sources = vec![SourceImage::from(path)];
    let pages =
        document::create_file(&target, sources, DocumentInfo::default(), &PdfOptions::default(), |_, _| {}).unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|page| (page.width, page.height) == (6, 4)));
}

fn convert(path: PathBuf) -> Vec<PageRecord> {
    let target = path.with_extension("pdf");
    let pages = document::create_file(
        &target,
        vec![SourceImage::from(path)],
        DocumentInfo::default(),
        &PdfOptions::default(),
        |_, _| {},
    )
    .unwrap();
    assert_eq!(page_count(&target).unwrap(), pages.len());
    pages
}

#[test]
fn apng_frames_become_pages() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anim.png");
    {
        let file = io::BufWriter::new(fs::File::create(&path).unwrap());
        let mut encoder = png::Encoder::new(file, 6, 4);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(3, 0).unwrap();
        let mut writer = encoder.write_header().unwrap();
        for seed in 0..3 {
            writer.write_image_data(noisy(6, 4, seed).as_raw()).unwrap();
        }
        writer.finish().unwrap();
    }

    let pages = convert(path);
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|page| (page.width, page.height) == (6, 4)));
}

fn riff_chunk(out: &mut Vec<u8>, fourcc: &[u8], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn u24(value: u32) -> [u8; 3] {
    let [a, b, c, _] = value.to_le_bytes();
    [a, b, c]
}

/// Animated WebP built from lossless single-frame encodes.
fn animated_webp(frames: &[RgbaImage]) -> Vec<u8> {
    let (width, height) = frames[0].dimensions();
    let mut body = b"WEBP".to_vec();
    // alpha and animation flags, then the canvas size
    let mut vp8x = vec![0x12, 0, 0, 0];
    vp8x.extend(u24(width - 1));
    vp8x.extend(u24(height - 1));
    riff_chunk(&mut body, b"VP8X", &vp8x);
    riff_chunk(&mut body, b"ANIM", &[0; 6]);
    for frame in frames {
        let mut still = Vec::new();
        WebPEncoder::new_lossless(&mut still)
            .encode(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        // a still is `RIFF size WEBP` followed by its VP8L chunk
        let mut anmf = [u24(0), u24(0), u24(width - 1), u24(height - 1), u24(100)].concat();
        anmf.push(0);
        anmf.extend_from_slice(&still[12..]);
        riff_chunk(&mut body, b"ANMF", &anmf);
    }
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

#[test]
fn webp_animation_frames_become_pages() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let frames: Vec<_> = [10u8, 200, 90]
        .iter()
        .map(|v| RgbaImage::from_pixel(6, 4, Rgba([*v, 40, 0, 255])))
        .collect();
    let path = dir.path().join("anim.webp");
    fs::write(&path, animated_webp(&frames)).unwrap();

    let pages = convert(path);
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|page| (page.width, page.height) == (6, 4)));
}

#[test]
fn still_webp_is_one_page() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.webp");
    let mut data = Vec::new();
    WebPEncoder::new_lossless(&mut data)
        .encode(noisy(5, 3, 1).as_raw(), 5, 3, ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(&path, data).unwrap();

    assert_eq!(convert(path).len(), 1);
}

#[test]
fn every_color_mode_is_readable() {
    init();
    let mut palette = vec![0; 6];
    palette[3..].copy_from_slice(&[255, 0, 0]);
    let rasters = vec![
        Raster::new(4, 2, ColorMode::Bilevel, vec![0, 255, 0, 255, 255, 0, 255, 0]).unwrap(),
        Raster::new(4, 2, ColorMode::Grayscale, vec![7; 8]).unwrap(),
        Raster::new(4, 2, ColorMode::Palette(palette), vec![0, 1, 1, 0, 1, 0, 0, 1]).unwrap(),
        Raster::new(4, 2, ColorMode::Rgb, vec![9; 24]).unwrap(),
        Raster::new(4, 2, ColorMode::Cmyk, vec![3; 32]).unwrap(),
    ];
    let expected: [(&[u8], &[u8]); 5] = [
        (b"DCTDecode", b"DeviceGray"),
        (b"DCTDecode", b"DeviceGray"),
        (b"ASCIIHexDecode", b"Indexed"),
        (b"DCTDecode", b"DeviceRGB"),
        (b"DCTDecode", b"DeviceCMYK"),
    ];

    let mut document = Document::create(Vec::new(), DocumentInfo::default(), PdfOptions::default());
    let sources = rasters.into_iter().map(SourceImage::from).collect();
    document.write_images(sources, |_, _| {}).unwrap();
    let doc = lopdf::Document::load_mem(&document.into_inner()).unwrap();

    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(page_ids.len(), 5);
    let cmyk = page_image(&doc, page_ids[4]);
    let decode: Vec<i64> = cmyk
        .get(b"Decode")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_i64().unwrap())
        .collect();
    assert_eq!(decode, vec![1, 0, 1, 0, 1, 0, 1, 0]);
    assert!(page_image(&doc, page_ids[3]).get(b"Decode").is_err());
    for (page, (filter, space)) in page_ids.into_iter().zip(expected) {
        let image = page_image(&doc, page);
        assert_eq!(image.get(b"Filter").unwrap().as_name().unwrap(), filter);
        let color_space = match image.get(b"ColorSpace").unwrap() {
            Object::Array(array) => array[0].as_name().unwrap(),
            other => other.as_name().unwrap(),
        };
        assert_eq!(color_space, space);
    }
}

#[test]
fn lossless_filters() {
    init();
    for filter in [Filter::Flate, Filter::RunLength, Filter::AsciiHex] {
        let options = PdfOptions {
            filter: Some(filter),
            ..PdfOptions::default()
        };
        let raster = Raster::new(3, 3, ColorMode::Rgb, (0..27).collect()).unwrap();
        let mut document = Document::create(Vec::new(), DocumentInfo::default(), options);
        document.write_images(vec![raster.into()], |_, _| {}).unwrap();
        let doc = lopdf::Document::load_mem(&document.into_inner()).unwrap();
        let page = doc.get_pages().into_values().next().unwrap();
        let image = page_image(&doc, page);
        assert_eq!(image.get(b"Filter").unwrap().as_name().unwrap(), filter.name());
    }
}
