//! One source frame becomes three objects: the image XObject, the page and
//! the content stream painting the image over the whole page.

use crate::{
    config::PdfOptions,
    error::Result,
    filter::{self, Filter},
    pdf::{
        dictionary,
        document::{
            dict_types, K_BITS_PER_COMPONENT, K_COLOR_SPACE, K_CONTENTS, K_DECODE, K_FILTER, K_HEIGHT, K_MEDIA_BOX,
            K_PARENT, K_PROC_SET, K_RESOURCES, K_SUBTYPE, K_TYPE, K_WIDTH, K_XOBJECT,
        },
        CbString, Dictionary, IndirectObject, Name, Object, ObjectTable, Reference, Stream,
    },
    raster::{ColorMode, Raster},
    simple_encode::{format_real, SimpleEncoder},
    writer::{Encoder, Writer},
};

/// Resource name the image is painted under.
pub const IMAGE_RESOURCE: &[u8] = b"Im";

/// Object numbers reserved for one page before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIds {
    pub image: Reference,
    pub page: Reference,
    pub contents: Reference,
}

impl PageIds {
    pub fn allocate(table: &mut ObjectTable) -> Self {
        Self {
            image: table.allocate_object(),
            page: table.allocate_object(),
            contents: table.allocate_object(),
        }
    }
}

/// A page that has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub ids: PageIds,
    /// Pixel size of the image.
    pub width: u32,
    pub height: u32,
    /// DPI used for the MediaBox.
    pub resolution: f64,
    pub filter: Filter,
    /// The source needed truncation recovery.
    pub recovered: bool,
}

impl PageRecord {
    /// Page size in points.
    pub fn size(&self) -> (f64, f64) {
        (
            f64::from(self.width) * 72.0 / self.resolution,
            f64::from(self.height) * 72.0 / self.resolution,
        )
    }
}

fn name(n: &[u8]) -> Object {
    Object::from(Name::from(n))
}

fn color_space(mode: &ColorMode) -> Object {
    match mode {
        ColorMode::Bilevel | ColorMode::Grayscale => name(b"DeviceGray"),
        ColorMode::Rgb => name(b"DeviceRGB"),
        ColorMode::Cmyk => name(b"DeviceCMYK"),
        ColorMode::Palette(palette) => {
            // the lookup table always covers 256 entries
            let mut lookup = palette.clone();
            lookup.resize(768, 0);
            Object::from(vec![
                name(b"Indexed"),
                name(b"DeviceRGB"),
                Object::Integer(255),
                Object::from(CbString::from(lookup)),
            ])
        }
    }
}

fn proc_set(mode: &ColorMode) -> &'static [u8] {
    match mode {
        ColorMode::Bilevel | ColorMode::Grayscale => b"ImageB",
        ColorMode::Palette(_) => b"ImageI",
        ColorMode::Rgb | ColorMode::Cmyk => b"ImageC",
    }
}

fn write_object(writer: &mut dyn Writer, table: &mut ObjectTable, reference: Reference, object: Object) -> Result<()> {
    table.record_offset(reference, writer.position())?;
    SimpleEncoder::write_to(&IndirectObject::new(reference, object), writer);
    Ok(())
}

/// Encode `raster` and write its image, page and contents objects.
pub fn write_page(
    writer: &mut dyn Writer,
    table: &mut ObjectTable,
    ids: PageIds,
    parent: Reference,
    raster: &Raster,
    options: &PdfOptions,
) -> Result<PageRecord> {
    let resolution = match raster.resolution {
        Some(dpi) if dpi.is_finite() && dpi > 0.0 => dpi,
        Some(dpi) => {
            log::warn!("ignoring resolution {} of page {}", dpi, ids.page);
            options.resolution
        }
        None => options.resolution,
    };

    let filter = Filter::select(&raster.mode, options.filter);
    let encoded = filter::encode(raster, filter, options.jpeg_quality)?;
    log::debug!(
        "page {}: {}x{} {} as {:?}, {} bytes",
        ids.page,
        raster.width,
        raster.height,
        raster.mode,
        filter,
        encoded.data.len()
    );

    let mut image = Stream::new(
        dictionary([
            (K_TYPE, name(dict_types::XOBJECT)),
            (K_SUBTYPE, name(dict_types::IMAGE)),
            (K_WIDTH, Object::from(raster.width)),
            (K_HEIGHT, Object::from(raster.height)),
            (K_FILTER, name(encoded.filter.name())),
            (K_BITS_PER_COMPONENT, Object::from(u32::from(encoded.bits_per_component))),
            (K_COLOR_SPACE, color_space(&raster.mode)),
        ]),
        encoded.data,
    );
    if encoded.inverted {
        let decode = (0..raster.mode.bytes_per_pixel()).flat_map(|_| [Object::Integer(1), Object::Integer(0)]);
        image.dictionary.insert(Name::from(K_DECODE), Object::from(decode.collect::<Vec<_>>()));
    }
    write_object(writer, table, ids.image, Object::from(image))?;

    let record = PageRecord {
        ids,
        width: raster.width,
        height: raster.height,
        resolution,
        filter,
        recovered: false,
    };
    let (width, height) = record.size();

    let mut xobjects = Dictionary::default();
    xobjects.insert(Name::from(IMAGE_RESOURCE), Object::from(ids.image));
    let resources = dictionary([
        (
            K_PROC_SET,
            Object::from(vec![name(b"PDF"), name(proc_set(&raster.mode))]),
        ),
        (K_XOBJECT, Object::from(xobjects)),
    ]);
    let page = dictionary([
        (K_TYPE, name(dict_types::PAGE)),
        (K_PARENT, Object::from(parent)),
        (K_RESOURCES, Object::from(resources)),
        (
            K_MEDIA_BOX,
            Object::from(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Float(width),
                Object::Float(height),
            ]),
        ),
        (K_CONTENTS, Object::from(ids.contents)),
    ]);
    write_object(writer, table, ids.page, Object::from(page))?;

    let program = format!(
        "q {} 0 0 {} 0 0 cm /{} Do Q\n",
        format_real(width),
        format_real(height),
        String::from_utf8_lossy(IMAGE_RESOURCE)
    );
    let contents = Stream::new(Dictionary::default(), program.into_bytes());
    write_object(writer, table, ids.contents, Object::from(contents))?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(raster: &Raster, options: &PdfOptions) -> (String, PageRecord, ObjectTable) {
        let mut table = ObjectTable::new();
        let parent = table.allocate_object();
        let ids = PageIds::allocate(&mut table);
        let mut out = Vec::new();
        let record = write_page(&mut out, &mut table, ids, parent, raster, options).unwrap();
        (String::from_utf8_lossy(&out).into_owned(), record, table)
    }

    #[test]
    fn media_box_follows_resolution() {
        let raster = Raster::new(8, 12, ColorMode::Grayscale, vec![0; 96])
            .unwrap()
            .with_resolution(96.0);
        let options = PdfOptions {
            filter: Some(Filter::Flate),
            ..PdfOptions::default()
        };
        let (text, record, _) = written(&raster, &options);
        assert_eq!(record.size(), (6.0, 9.0));
        assert!(text.contains("/MediaBox [0 0 6 9]"), "{}", text);
        assert!(text.contains("q 6 0 0 9 0 0 cm /Im Do Q\n"));
        assert!(text.contains("/XObject <</Im 2 0 R>>"));
        assert!(text.contains("/Parent 1 0 R"));
        assert!(text.contains("/ProcSet [/PDF /ImageB]"));
    }

    #[test]
    fn objects_are_recorded_where_written() {
        let raster = Raster::new(2, 2, ColorMode::Rgb, vec![9; 12]).unwrap();
        let options = PdfOptions {
            filter: Some(Filter::AsciiHex),
            ..PdfOptions::default()
        };
        let mut table = ObjectTable::new();
        let parent = table.allocate_object();
        table.record_offset(parent, 0).unwrap();
        let ids = PageIds::allocate(&mut table);
        let mut out = b"1 0 obj\nnull\nendobj\n".to_vec();
        write_page(&mut out, &mut table, ids, parent, &raster, &options).unwrap();

        let xref = table.xref().unwrap();
        for used in xref.used_objects() {
            let expected = format!("{} 0 obj", used.number);
            assert!(out[used.byte_offset..].starts_with(expected.as_bytes()));
        }
        assert_eq!(xref.used_objects().count(), 4);
    }

    #[test]
    fn palette_color_space() {
        let raster = Raster::new(2, 1, ColorMode::Palette(vec![255, 0, 0, 0, 0, 255]), vec![0, 1]).unwrap();
        let (text, record, _) = written(&raster, &PdfOptions::default());
        assert_eq!(record.filter, Filter::AsciiHex);
        assert!(text.contains("/Filter /ASCIIHexDecode"));
        assert!(text.contains("/ColorSpace [/Indexed /DeviceRGB 255 ("));
        assert!(text.contains("/ProcSet [/PDF /ImageI]"));
        assert!(text.contains("0001>"));
    }

    #[cfg(feature = "codec")]
    #[test]
    fn cmyk_is_inverted_dct() {
        let raster = Raster::new(1, 1, ColorMode::Cmyk, vec![0, 0, 0, 255]).unwrap();
        let (text, record, _) = written(&raster, &PdfOptions::default());
        assert_eq!(record.filter, Filter::Dct);
        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.contains("/ColorSpace /DeviceCMYK"));
        assert!(text.contains("/Decode [1 0 1 0 1 0 1 0]"), "{}", text);
        assert!(text.contains("/MediaBox [0 0 1 1]"));
    }

    #[test]
    fn cmyk_flate_is_not_inverted() {
        let raster = Raster::new(1, 1, ColorMode::Cmyk, vec![0, 0, 0, 255]).unwrap();
        let options = PdfOptions {
            filter: Some(Filter::Flate),
            ..PdfOptions::default()
        };
        let (text, record, _) = written(&raster, &options);
        assert_eq!(record.filter, Filter::Flate);
        assert!(text.contains("/ColorSpace /DeviceCMYK"));
        assert!(!text.contains("/Decode"));
    }
}
