//! PDF text extraction using lopdf and pdf-extract, page rasterization
//! using pdfium with an embedded-image fallback.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
#[cfg(feature = "native")]
use pdfium_render::prelude::{PdfPageIndex, PdfRenderConfig, Pdfium, PdfiumError};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Split the whole-document text evenly by lines, for pages whose own
    /// text layer cannot be decoded.
    fn approximate_page_text(&self, page: u32) -> Result<String> {
        let full_text = self.extract_text()?;
        let lines: Vec<&str> = full_text.lines().collect();
        Ok(page_slice(&lines, page, self.page_count()).join("\n"))
    }

    /// All decodable images referenced by the page's XObject resources.
    fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;
        let mut images = Vec::new();

        if let Some(Object::Dictionary(resources)) = inherited_attribute(doc, page_id, b"Resources") {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = decode_image_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Found {} images on page {}", images.len(), page);
        Ok(images)
    }

    /// Page width in points from the (possibly inherited) MediaBox.
    fn page_width_points(&self, page: u32) -> Option<f32> {
        let doc = self.document().ok()?;
        let page_id = self.page_id(page).ok()?;
        match inherited_attribute(doc, page_id, b"MediaBox")? {
            Object::Array(values) if values.len() == 4 => {
                let x0 = number(&values[0])?;
                let x1 = number(&values[2])?;
                Some((x1 - x0).abs())
            }
            _ => None,
        }
    }

    /// Rasterize the page's full content (vector text included) with pdfium.
    #[cfg(feature = "native")]
    fn render_with_pdfium(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let render_error = |e: PdfiumError| PdfError::Render {
            page,
            reason: format!("{:?}", e),
        };

        let pdfium = bind_pdfium().map_err(render_error)?;
        let document = pdfium
            .load_pdf_from_byte_slice(&self.raw_data, None)
            .map_err(render_error)?;
        let pdf_page = document
            .pages()
            .get((page - 1) as PdfPageIndex)
            .map_err(render_error)?;

        let target_width = (pdf_page.width().value / POINTS_PER_INCH * dpi as f32)
            .round()
            .max(1.0) as i32;
        let bitmap = pdf_page
            .render_with_config(&PdfRenderConfig::new().set_target_width(target_width))
            .map_err(render_error)?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        trace!("pdfium rendered page {} at {}x{}", page, width, height);
        ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, bitmap.as_rgba_bytes())
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| PdfError::Render {
                page,
                reason: "bitmap size does not match its dimensions".to_string(),
            })
    }

    /// Largest embedded image on the page, upscaled to the target DPI.
    fn render_embedded(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let largest = self
            .page_images(page)?
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| PdfError::Render {
                page,
                reason: "page has no embedded images".to_string(),
            })?;

        let Some(width_pt) = self.page_width_points(page) else {
            return Ok(largest);
        };

        let target_width = (width_pt / POINTS_PER_INCH * dpi as f32).round() as u32;
        let (width, height) = largest.dimensions();
        if target_width <= width || width == 0 {
            return Ok(largest);
        }

        let scale = target_width as f32 / width as f32;
        let target_height = ((height as f32) * scale).round().max(1.0) as u32;
        trace!(
            "Upscaling page {} image {}x{} -> {}x{} for {} DPI",
            page, width, height, target_width, target_height, dpi
        );

        Ok(largest.resize_exact(
            target_width,
            target_height,
            image::imageops::FilterType::Lanczos3,
        ))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Statements are often "protected" with an empty user password
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }

        match doc.extract_text(&[page]) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!("Page {} text layer unreadable ({}), approximating from full text", page, e);
                self.approximate_page_text(page)
            }
        }
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        self.page_id(page)?;

        #[cfg(feature = "native")]
        {
            match self.render_with_pdfium(page, dpi) {
                Ok(image) => return Ok(image),
                Err(e) => debug!("{}, falling back to embedded images", e),
            }
        }

        self.render_embedded(page, dpi)
    }
}

/// Bind libpdfium from the working directory, then from system paths.
#[cfg(feature = "native")]
fn bind_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())?;
    Ok(Pdfium::new(bindings))
}

/// Lines belonging to `page` when `lines` are spread evenly over
/// `page_count` pages. The last page takes the remainder.
fn page_slice<'a>(lines: &'a [&'a str], page: u32, page_count: u32) -> &'a [&'a str] {
    if page == 0 || page > page_count {
        return &[];
    }

    let page_count = page_count as usize;
    let per_page = lines.len().div_ceil(page_count);
    let start = ((page as usize - 1) * per_page).min(lines.len());
    let end = if page as usize == page_count {
        lines.len()
    } else {
        (page as usize * per_page).min(lines.len())
    };

    &lines[start..end]
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Look up a page attribute, walking up the page tree for inherited values.
fn inherited_attribute(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(value) = dict.get(key) {
        if let Ok((_, resolved)) = doc.dereference(value) {
            return Some(resolved.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => inherited_attribute(doc, *parent_id, key),
        _ => None,
    }
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict: &Dictionary = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    raw_to_image(&data, width, height, color_space, bits)
}

fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let channels = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => return None,
    };

    if data.len() < pixels * channels {
        trace!(
            "Could not decode image: data_len={}, expected={}",
            data.len(),
            pixels * channels
        );
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for px in data[..pixels * channels].chunks(channels) {
        match px {
            [r, g, b] => rgba.extend_from_slice(&[*r, *g, *b, 255]),
            [gray] => rgba.extend_from_slice(&[*gray, *gray, *gray, 255]),
            _ => return None,
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
