//! PDF-backed page provider.
//!
//! Each requested page is cut out into its own single-page PDF inside a
//! per-run temp directory, its text is extracted from that file, and any
//! embedded images are written next to it: JPEG and JPEG 2000 as stored,
//! decodable pixel data as PNG. Everything created here is removed by
//! `release_resources`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{debug, info, warn};

use deckseg_core::config::PagesConfig;
use deckseg_core::{ImageRef, Page, PageError, PageIndex};

use crate::provider::PageProvider;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to open PDF {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },
    #[error("PDF {0} has no pages")]
    Empty(PathBuf),
}

pub struct PdfPageProvider {
    document: Arc<Document>,
    /// Page object ids in physical order (index 0 = first page).
    page_ids: Vec<ObjectId>,
    stem: String,
    run_dir: PathBuf,
    /// Every file written so far, so release can remove exactly those.
    created: Mutex<Vec<PathBuf>>,
}

impl PdfPageProvider {
    /// Open a PDF. Nothing is written to disk until the first page is requested.
    pub fn open(path: impl AsRef<Path>, config: &PagesConfig) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let document = Document::load(path).map_err(|e| OpenError::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(OpenError::Empty(path.to_path_buf()));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let run_dir = config
            .temp_dir
            .join(format!("{}-{}", stem, uuid::Uuid::new_v4().simple()));

        info!(path = %path.display(), pages = page_ids.len(), "opened PDF");

        Ok(Self {
            document: Arc::new(document),
            page_ids,
            stem,
            run_dir,
            created: Mutex::new(Vec::new()),
        })
    }

    /// Directory holding this run's split pages and images.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn record_created(&self, paths: &[PathBuf]) {
        if let Ok(mut created) = self.created.lock() {
            created.extend(paths.iter().cloned());
        }
    }
}

#[async_trait]
impl PageProvider for PdfPageProvider {
    async fn page(&self, index: PageIndex) -> Result<Page, PageError> {
        let page_count = self.page_ids.len();
        if index >= page_count {
            return Err(PageError::PageNotFound { index, page_count });
        }

        tokio::fs::create_dir_all(&self.run_dir)
            .await
            .map_err(|e| PageError::extraction(index, format!("create temp dir: {e}")))?;

        let document = Arc::clone(&self.document);
        let page_id = self.page_ids[index];
        let split_path = self.run_dir.join(format!("{}_pp_{}.pdf", self.stem, index));
        let image_prefix = self.run_dir.join(format!("{}_pp_{}_img_", self.stem, index));

        let extracted = tokio::task::spawn_blocking(move || {
            extract_page(&document, index, page_id, &split_path, &image_prefix)
        })
        .await
        .map_err(|e| PageError::extraction(index, format!("extraction task failed: {e}")))?;

        let (text, written) = extracted.map_err(|reason| PageError::extraction(index, reason))?;
        self.record_created(&written);

        // First written file is the split PDF; the rest are images.
        let images = written.into_iter().skip(1).map(ImageRef::new).collect::<Vec<_>>();
        debug!(page = index, chars = text.len(), images = images.len(), "extracted page");

        Ok(Page::new(index, text, images))
    }

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    async fn release_resources(&self) {
        let files = match self.created.lock() {
            Ok(mut created) => std::mem::take(&mut *created),
            Err(_) => Vec::new(),
        };

        let mut removed = 0usize;
        for file in &files {
            match tokio::fs::remove_file(file).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %file.display(), error = %e, "failed to remove temp file"),
            }
        }

        if let Err(e) = tokio::fs::remove_dir(&self.run_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.run_dir.display(), error = %e, "failed to remove temp dir");
            }
        }

        info!(removed, dir = %self.run_dir.display(), "released page artifacts");
    }
}

/// Split one page out, extract its text, dump its images.
///
/// Returns the text and every path written (split PDF first).
fn extract_page(
    document: &Document,
    index: PageIndex,
    page_id: ObjectId,
    split_path: &Path,
    image_prefix: &Path,
) -> Result<(String, Vec<PathBuf>), String> {
    let bytes = split_single_page(document, index as u32 + 1)?;
    std::fs::write(split_path, &bytes).map_err(|e| format!("write split page: {e}"))?;
    let mut written = vec![split_path.to_path_buf()];

    let text = match pdf_extract::extract_text_from_mem(&bytes) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            // Remove what we wrote: the caller never learns about these paths on error.
            let _ = std::fs::remove_file(split_path);
            return Err(format!("text extraction: {e}"));
        }
    };

    for (k, (ext, content)) in page_images(document, page_id).into_iter().enumerate() {
        let mut path = image_prefix.as_os_str().to_owned();
        path.push(format!("{k}.{ext}"));
        let path = PathBuf::from(path);
        match std::fs::write(&path, content) {
            Ok(()) => written.push(path),
            Err(e) => warn!(page = index, path = %path.display(), error = %e, "failed to write page image"),
        }
    }

    Ok((text, written))
}

/// Build a document holding only `page_number` (1-based).
fn split_single_page(document: &Document, page_number: u32) -> Result<Vec<u8>, String> {
    let page_count = document.get_pages().len() as u32;
    let mut single = document.clone();

    // One call: lopdf resolves every number against the same page list.
    let others: Vec<u32> = (1..=page_count).filter(|p| *p != page_number).collect();
    single.delete_pages(&others);
    single.prune_objects();

    let mut buffer = Vec::new();
    single
        .save_to(&mut buffer)
        .map_err(|e| format!("save split page: {e}"))?;
    Ok(buffer)
}

/// Nesting limit for page-tree parents and form XObjects.
const MAX_NESTING: usize = 16;

/// Images referenced from a page, as `(extension, file bytes)`.
///
/// JPEG and JPEG 2000 streams are written as stored. Raw, Flate and LZW pixel
/// data is re-encoded as PNG. Images inside form XObjects are included; each
/// image object is returned once. CCITT, JBIG2 and RunLength images and
/// stencil masks are skipped.
fn page_images(document: &Document, page_id: ObjectId) -> Vec<(&'static str, Vec<u8>)> {
    let mut images = Vec::new();
    if let Some(resources) = page_resources(document, page_id) {
        let mut seen = HashSet::new();
        collect_images(document, resources, &mut seen, &mut images, 0);
    }
    images
}

/// The page's `Resources`, or the nearest ancestor's when the page has none.
fn page_resources(document: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_NESTING {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(document, resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_images(
    document: &Document,
    resources: &Dictionary,
    seen: &mut HashSet<ObjectId>,
    images: &mut Vec<(&'static str, Vec<u8>)>,
    depth: usize,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|xo| resolve_dict(document, xo))
    else {
        return;
    };

    for (_, object) in xobjects.iter() {
        let Ok(id) = object.as_reference() else { continue };
        if !seen.insert(id) {
            continue;
        }
        let Ok(stream) = document.get_object(id).and_then(|o| o.as_stream()) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
            Ok(b"Image") => match encode_image(document, stream) {
                Some(image) => images.push(image),
                None => debug!(object = ?id, "skipping image in unsupported encoding"),
            },
            Ok(b"Form") if depth < MAX_NESTING => {
                if let Some(inner) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(document, r))
                {
                    collect_images(document, inner, seen, images, depth + 1);
                }
            }
            _ => {}
        }
    }
}

fn encode_image(document: &Document, stream: &Stream) -> Option<(&'static str, Vec<u8>)> {
    let dict = &stream.dict;
    if dict
        .get(b"ImageMask")
        .and_then(|m| m.as_bool())
        .unwrap_or(false)
    {
        return None;
    }

    let filters = image_filters(dict);
    match filters.as_slice() {
        [only] if *only == b"DCTDecode" => return Some(("jpg", stream.content.clone())),
        [only] if *only == b"JPXDecode" => return Some(("jp2", stream.content.clone())),
        _ => {}
    }
    if !filters
        .iter()
        .all(|f| *f == b"FlateDecode" || *f == b"LZWDecode")
    {
        return None;
    }

    let pixels = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().ok()?
    };
    let width = u32::try_from(dict.get(b"Width").and_then(|w| w.as_i64()).ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").and_then(|h| h.as_i64()).ok()?).ok()?;
    let bits = u8::try_from(
        dict.get(b"BitsPerComponent")
            .and_then(|b| b.as_i64())
            .ok()?,
    )
    .ok()?;
    let color = color_space(document, dict.get(b"ColorSpace").ok()?, 0)?;

    encode_png(width, height, bits, color, &pixels).map(|png| ("png", png))
}

/// Filter names in decode order.
fn image_filters(dict: &Dictionary) -> Vec<&[u8]> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(filters)) => filters.iter().filter_map(|f| f.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageColor {
    Gray,
    Rgb,
    Cmyk,
    /// RGB palette, three bytes per entry.
    Indexed(Vec<u8>),
}

impl ImageColor {
    fn components(&self) -> u32 {
        match self {
            ImageColor::Gray | ImageColor::Indexed(_) => 1,
            ImageColor::Rgb => 3,
            ImageColor::Cmyk => 4,
        }
    }
}

fn color_space(document: &Document, object: &Object, depth: usize) -> Option<ImageColor> {
    if depth > MAX_NESTING {
        return None;
    }
    match resolve(document, object)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ImageColor::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ImageColor::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ImageColor::Cmyk),
            _ => None,
        },
        Object::Array(items) => match items.first()?.as_name().ok()? {
            b"CalGray" => Some(ImageColor::Gray),
            b"CalRGB" => Some(ImageColor::Rgb),
            b"ICCBased" => {
                let profile = resolve(document, items.get(1)?)?.as_stream().ok()?;
                match profile.dict.get(b"N").and_then(|n| n.as_i64()).ok()? {
                    1 => Some(ImageColor::Gray),
                    3 => Some(ImageColor::Rgb),
                    4 => Some(ImageColor::Cmyk),
                    _ => None,
                }
            }
            b"Indexed" | b"I" => {
                // PNG palettes are RGB only.
                if color_space(document, items.get(1)?, depth + 1)? != ImageColor::Rgb {
                    return None;
                }
                let entries = usize::try_from(items.get(2)?.as_i64().ok()?).ok()? + 1;
                let lookup = match resolve(document, items.get(3)?)? {
                    Object::String(bytes, _) => bytes.clone(),
                    Object::Stream(table) => table
                        .decompressed_content()
                        .unwrap_or_else(|_| table.content.clone()),
                    _ => return None,
                };
                let palette = lookup.get(..entries * 3)?.to_vec();
                Some(ImageColor::Indexed(palette))
            }
            _ => None,
        },
        _ => None,
    }
}

/// PNG-encode decoded PDF samples. Rows are byte-aligned in both formats.
fn encode_png(
    width: u32,
    height: u32,
    bits: u8,
    color: ImageColor,
    pixels: &[u8],
) -> Option<Vec<u8>> {
    let row_bytes = (width as usize * color.components() as usize * bits as usize).div_ceil(8);
    let pixels = pixels.get(..row_bytes * height as usize)?;

    let (color_type, data, palette) = match color {
        ImageColor::Gray => (png::ColorType::Grayscale, pixels.to_vec(), None),
        ImageColor::Rgb => (png::ColorType::Rgb, pixels.to_vec(), None),
        ImageColor::Cmyk if bits == 8 => (png::ColorType::Rgb, cmyk_to_rgb(pixels), None),
        ImageColor::Cmyk => return None,
        ImageColor::Indexed(palette) => (png::ColorType::Indexed, pixels.to_vec(), Some(palette)),
    };

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::from_u8(bits)?);
    if let Some(palette) = palette {
        encoder.set_palette(palette);
    }
    let mut writer = encoder.write_header().ok()?;
    writer.write_image_data(&data).ok()?;
    writer.finish().ok()?;
    Some(out)
}

fn cmyk_to_rgb(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(document, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}
