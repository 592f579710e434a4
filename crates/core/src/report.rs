//! PDF report generation.
//!
//! Reports follow a fixed template: a centered title, the annotated image (or
//! a reference to the annotated video), an explanatory paragraph, a legend
//! and the list of tracked joints grouped by body region. Content that does
//! not fit on one A4 page flows onto the next.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use crate::naming::report_filename;
use crate::pose::landmarks::BodyRegion;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MM: f32 = 72.0 / 25.4;
const MARGIN: f32 = 10.0 * MM;

/// Rough average glyph advance of Helvetica, in em.
const AVG_GLYPH_EM: f32 = 0.52;

const FONT_REGULAR: Name<'static> = Name(b"F1");
const FONT_BOLD: Name<'static> = Name(b"F2");
const IMAGE_NAME: Name<'static> = Name(b"Im1");

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to embed image: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Image,
    Video,
}

/// How the annotated artifact appears in the report.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactRef<'a> {
    /// Embed the image file at this path.
    Embedded(&'a Path),
    /// Mention the artifact by name only.
    Named(&'a str),
}

/// Optional figures printed under the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportStats {
    pub frame_count: Option<u64>,
    pub frames_with_landmarks: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub kind: ReportKind,
    /// Sanitized upload name the report filename is derived from.
    pub source_filename: &'a str,
    pub artifact: ArtifactRef<'a>,
    pub stats: ReportStats,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ReportDocument {
    /// Write the document into `dir`, overwriting any previous report of the
    /// same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Template text
// ---------------------------------------------------------------------------

struct Template {
    title: &'static str,
    explanation: &'static str,
    legend: [&'static str; 2],
    bullet: &'static str,
}

const IMAGE_TEMPLATE: Template = Template {
    title: "Pose Estimation Report",
    explanation: "The red dotted points represent pose landmarks detected in the uploaded image. \
        These landmarks show major body joints such as the shoulders, elbows, wrists, hips, \
        knees, and ankles. Grey lines indicate body connections that form the posture shape.",
    legend: [
        "-> Red circles   : Detected joint positions",
        "-> Grey lines    : Body connections between joints",
    ],
    bullet: "-> ",
};

const VIDEO_TEMPLATE: Template = Template {
    title: "Pose Estimation Video Report",
    explanation: "The green dotted points represent pose landmarks detected frame-by-frame. \
        These landmarks show major joints like shoulders, elbows, wrists, hips, knees, \
        and ankles. The blue lines represent body posture in motion.",
    legend: [
        "* Green circles : Joint positions in each frame",
        "* Blue lines    : Body connections across frames",
    ],
    bullet: "* ",
};

impl ReportKind {
    fn template(self) -> &'static Template {
        match self {
            ReportKind::Image => &IMAGE_TEMPLATE,
            ReportKind::Video => &VIDEO_TEMPLATE,
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Top-down page flow. `y` is the distance from the top edge of the
/// current page.
struct Flow {
    finished: Vec<Content>,
    current: Content,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: Content::new(),
            y: MARGIN,
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - MARGIN && self.y > MARGIN {
            let full = std::mem::replace(&mut self.current, Content::new());
            self.finished.push(full);
            self.y = MARGIN;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn line(&mut self, font: Name<'_>, size: f32, height: f32, text: &str, align: Align) {
        self.ensure_room(height);
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN),
        };
        // Vertically center the glyphs in the line box.
        let baseline = PAGE_HEIGHT - (self.y + height / 2.0 + size * 0.35);
        self.current
            .begin_text()
            .set_font(font, size)
            .next_line(x, baseline)
            .show(Str(text.as_bytes()))
            .end_text();
        self.y += height;
    }

    fn paragraph(&mut self, font: Name<'_>, size: f32, height: f32, text: &str) {
        let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (size * AVG_GLYPH_EM)) as usize;
        for source_line in text.lines() {
            for wrapped in wrap(source_line, max_chars) {
                self.line(font, size, height, &wrapped, Align::Left);
            }
        }
    }

    fn image(&mut self, name: Name<'_>, x: f32, width: f32, height: f32) {
        self.ensure_room(height);
        let bottom = PAGE_HEIGHT - self.y - height;
        self.current
            .save_state()
            .transform([width, 0.0, 0.0, height, x, bottom])
            .x_object(name)
            .restore_state();
        self.y += height;
    }

    fn into_pages(mut self) -> Vec<Content> {
        self.finished.push(self.current);
        self.finished
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are kept whole.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

struct EmbeddedImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

fn load_embedded(path: &Path) -> Result<EmbeddedImage, ReportError> {
    let rgb = image::open(path)
        .map_err(|e| ReportError::Image(format!("{}: {e}", path.display())))?
        .to_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(|e| ReportError::Image(e.to_string()))?;
    Ok(EmbeddedImage {
        jpeg,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Render the report for one annotated artifact.
pub fn build_report(request: &ReportRequest<'_>) -> Result<ReportDocument, ReportError> {
    let template = request.kind.template();
    let embedded = match request.artifact {
        ArtifactRef::Embedded(path) => Some(load_embedded(path)?),
        ArtifactRef::Named(_) => None,
    };

    let mut flow = Flow::new();
    flow.line(FONT_REGULAR, 14.0, 10.0 * MM, template.title, Align::Center);

    match (&embedded, request.artifact) {
        (Some(img), _) => {
            flow.gap(6.0 * MM);
            let max_height = PAGE_HEIGHT - 2.0 * MARGIN - 90.0 * MM;
            let mut width = 150.0 * MM;
            let mut height = width * img.height as f32 / img.width.max(1) as f32;
            if height > max_height {
                width *= max_height / height;
                height = max_height;
            }
            let x = (PAGE_WIDTH - width) / 2.0;
            flow.image(IMAGE_NAME, x, width, height);
            flow.gap(6.0 * MM);
        }
        (None, ArtifactRef::Named(name)) => {
            flow.line(
                FONT_REGULAR,
                14.0,
                10.0 * MM,
                &format!("Processed video: {name}"),
                Align::Left,
            );
            flow.gap(10.0 * MM);
        }
        (None, ArtifactRef::Embedded(_)) => {}
    }

    if let Some(frames) = request.stats.frame_count {
        flow.line(
            FONT_REGULAR,
            12.0,
            8.0 * MM,
            &format!("Frames processed: {frames}"),
            Align::Left,
        );
    }
    if let Some(with_pose) = request.stats.frames_with_landmarks {
        flow.line(
            FONT_REGULAR,
            12.0,
            8.0 * MM,
            &format!("Frames with a detected pose: {with_pose}"),
            Align::Left,
        );
    }

    flow.paragraph(FONT_REGULAR, 12.0, 8.0 * MM, template.explanation);
    flow.gap(4.0 * MM);

    flow.line(FONT_REGULAR, 12.0, 8.0 * MM, "Legend:", Align::Left);
    for entry in template.legend {
        flow.line(FONT_REGULAR, 11.0, 6.0 * MM, entry, Align::Left);
    }
    flow.gap(4.0 * MM);

    flow.line(FONT_BOLD, 12.0, 8.0 * MM, "Main Body Joints Detected:", Align::Left);
    for region in BodyRegion::ALL {
        let entry = format!("{}{}", template.bullet, region.label());
        flow.line(FONT_REGULAR, 11.0, 6.0 * MM, &entry, Align::Left);
    }

    let bytes = assemble(flow.into_pages(), embedded.as_ref());
    Ok(ReportDocument {
        filename: report_filename(request.source_filename),
        bytes,
    })
}

fn assemble(pages: Vec<Content>, image: Option<&EmbeddedImage>) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let image_id = Ref::new(5);
    let first_page = 6;

    let page_ids: Vec<(Ref, Ref)> = (0..pages.len() as i32)
        .map(|i| (Ref::new(first_page + 2 * i), Ref::new(first_page + 2 * i + 1)))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_ids.len() as i32);

    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));

    if let Some(img) = image {
        let mut xobject = pdf.image_xobject(image_id, &img.jpeg);
        xobject.filter(Filter::DctDecode);
        xobject.width(img.width as i32);
        xobject.height(img.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();
    }

    for ((page_id, content_id), content) in page_ids.into_iter().zip(pages) {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(content_id);
        {
            let mut resources = page.resources();
            resources
                .fonts()
                .pair(FONT_REGULAR, regular_id)
                .pair(FONT_BOLD, bold_id);
            if image.is_some() {
                resources.x_objects().pair(IMAGE_NAME, image_id);
            }
        }
        page.finish();

        pdf.stream(content_id, &content.finish());
    }

    pdf.finish()
}
