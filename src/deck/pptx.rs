//! Minimal PresentationML (.pptx) writer.
//!
//! A .pptx file is a zip package of XML parts plus media. This module renders
//! the fixed parts (content types, presentation, one blank master/layout and
//! its theme) and one XML part per slide, from a small shape model the deck
//! module assembles. Geometry is given in inches and converted to EMU here;
//! the package is rewritten in full on every save.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// English Metric Units per inch.
const EMU_PER_INCH: f64 = 914_400.0;

/// Writer errors
#[derive(Debug, Error)]
pub(crate) enum PptxError {
    #[error("Failed to create presentation file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write presentation archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to flush presentation data: {0}")]
    Io(#[from] std::io::Error),
}

/// Shape position and size in inches.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rect {
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl Rect {
    pub(crate) fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rgb(pub(crate) u8, pub(crate) u8, pub(crate) u8);

impl Rgb {
    fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
}

/// One paragraph of a text box. Newlines in `text` become line breaks.
#[derive(Debug, Clone)]
pub(crate) struct Paragraph {
    pub(crate) text: String,
    pub(crate) size_pt: u32,
    pub(crate) bold: bool,
    pub(crate) color: Rgb,
    pub(crate) align: Align,
    pub(crate) space_after_pt: Option<u32>,
}

/// A shape on a slide. Pictures reference the deck's media list by index.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    TextBox {
        rect: Rect,
        paragraphs: Vec<Paragraph>,
        word_wrap: bool,
    },
    Picture {
        rect: Rect,
        media_index: usize,
    },
}

/// All shapes of one slide, in z-order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlideContent {
    pub(crate) shapes: Vec<Shape>,
}

/// Embedded image bytes plus the file extension they are stored under.
#[derive(Debug, Clone)]
pub(crate) struct MediaItem {
    pub(crate) bytes: Vec<u8>,
    pub(crate) extension: String,
}

/// Convert inches to EMU.
pub(crate) fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Escape text for use in XML content and attribute values.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write the complete package to `path`, replacing any existing file.
pub(crate) fn write_package(
    path: &Path,
    slides: &[SlideContent],
    media: &[MediaItem],
    slide_width_in: f64,
    slide_height_in: f64,
) -> Result<(), PptxError> {
    let file = fs::File::create(path).map_err(|e| PptxError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    write_part(
        &mut zip,
        "[Content_Types].xml",
        content_types_xml(slides.len(), media).as_bytes(),
    )?;
    write_part(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes())?;
    write_part(
        &mut zip,
        "ppt/presentation.xml",
        presentation_xml(slides.len(), slide_width_in, slide_height_in).as_bytes(),
    )?;
    write_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels_xml(slides.len()).as_bytes(),
    )?;
    write_part(
        &mut zip,
        "ppt/slideMasters/slideMaster1.xml",
        SLIDE_MASTER.as_bytes(),
    )?;
    write_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS.as_bytes(),
    )?;
    write_part(
        &mut zip,
        "ppt/slideLayouts/slideLayout1.xml",
        SLIDE_LAYOUT.as_bytes(),
    )?;
    write_part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS.as_bytes(),
    )?;
    write_part(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes())?;

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        write_part(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", n),
            slide_xml(slide).as_bytes(),
        )?;
        write_part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            slide_rels_xml(slide, media).as_bytes(),
        )?;
    }

    for (i, item) in media.iter().enumerate() {
        write_part(
            &mut zip,
            &format!("ppt/media/image{}.{}", i + 1, item.extension),
            &item.bytes,
        )?;
    }

    let mut inner = zip.finish()?;
    inner.flush()?;
    Ok(())
}

fn write_part(
    zip: &mut ZipWriter<BufWriter<fs::File>>,
    name: &str,
    body: &[u8],
) -> Result<(), PptxError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(body)?;
    Ok(())
}

fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpeg" | "jpg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn content_types_xml(slide_count: usize, media: &[MediaItem]) -> String {
    let mut defaults = String::new();
    let mut seen: Vec<&str> = Vec::new();
    for item in media {
        let ext = item.extension.as_str();
        if !seen.contains(&ext) {
            seen.push(ext);
            defaults.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                xml_escape(ext),
                content_type_for_extension(ext)
            ));
        }
    }

    let mut overrides = String::new();
    for n in 1..=slide_count {
        overrides.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
            n
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
{defaults}\
<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
{overrides}\
</Types>"
    )
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/>\
</Relationships>";

fn presentation_xml(slide_count: usize, slide_width_in: f64, slide_height_in: f64) -> String {
    let mut slide_ids = String::new();
    for n in 1..=slide_count {
        // rId1 is the master; slides start at rId2. Slide ids must be >= 256.
        slide_ids.push_str(&format!(
            "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
            255 + n,
            n + 1
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:presentation xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
<p:sldIdLst>{}</p:sldIdLst>\
<p:sldSz cx=\"{}\" cy=\"{}\"/>\
<p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
</p:presentation>",
        slide_ids,
        emu(slide_width_in),
        emu(slide_height_in)
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = String::from(
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"slideMasters/slideMaster1.xml\"/>",
    );
    for n in 1..=slide_count {
        rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide{}.xml\"/>",
            n + 1,
            n
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
        rels
    )
}

const SLIDE_MASTER: &str ="<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sldMaster xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
<p:cSld><p:spTree>\
<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
</p:spTree></p:cSld>\
<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" \
accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" \
accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
</p:sldMaster>";

const SLIDE_MASTER_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\" Target=\"../theme/theme1.xml\"/>\
</Relationships>";

const SLIDE_LAYOUT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sldLayout xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" type=\"blank\">\
<p:cSld name=\"Blank\"><p:spTree>\
<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>\
</p:sldLayout>";

const SLIDE_LAYOUT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"../slideMasters/slideMaster1.xml\"/>\
</Relationships>";

const THEME: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Office Theme\">\
<a:themeElements>\
<a:clrScheme name=\"Office\">\
<a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1>\
<a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1>\
<a:dk2><a:srgbClr val=\"1F497D\"/></a:dk2>\
<a:lt2><a:srgbClr val=\"EEECE1\"/></a:lt2>\
<a:accent1><a:srgbClr val=\"4F81BD\"/></a:accent1>\
<a:accent2><a:srgbClr val=\"C0504D\"/></a:accent2>\
<a:accent3><a:srgbClr val=\"9BBB59\"/></a:accent3>\
<a:accent4><a:srgbClr val=\"8064A2\"/></a:accent4>\
<a:accent5><a:srgbClr val=\"4BACC6\"/></a:accent5>\
<a:accent6><a:srgbClr val=\"F79646\"/></a:accent6>\
<a:hlink><a:srgbClr val=\"0000FF\"/></a:hlink>\
<a:folHlink><a:srgbClr val=\"800080\"/></a:folHlink>\
</a:clrScheme>\
<a:fontScheme name=\"Office\">\
<a:majorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
<a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
</a:fontScheme>\
<a:fmtScheme name=\"Office\">\
<a:fillStyleLst>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
</a:fillStyleLst>\
<a:lnStyleLst>\
<a:ln w=\"9525\" cap=\"flat\" cmpd=\"sng\" algn=\"ctr\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:prstDash val=\"solid\"/></a:ln>\
<a:ln w=\"25400\" cap=\"flat\" cmpd=\"sng\" algn=\"ctr\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:prstDash val=\"solid\"/></a:ln>\
<a:ln w=\"38100\" cap=\"flat\" cmpd=\"sng\" algn=\"ctr\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:prstDash val=\"solid\"/></a:ln>\
</a:lnStyleLst>\
<a:effectStyleLst>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
<a:effectStyle><a:effectLst/></a:effectStyle>\
</a:effectStyleLst>\
<a:bgFillStyleLst>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>\
</a:bgFillStyleLst>\
</a:fmtScheme>\
</a:themeElements>\
</a:theme>";

fn xfrm_xml(rect: Rect) -> String {
    format!(
        "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
        emu(rect.left),
        emu(rect.top),
        emu(rect.width),
        emu(rect.height)
    )
}

fn run_properties_xml(paragraph: &Paragraph) -> String {
    let bold = if paragraph.bold { " b=\"1\"" } else { "" };
    format!(
        "<a:rPr lang=\"en-US\" sz=\"{}\"{}><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></a:rPr>",
        paragraph.size_pt * 100,
        bold,
        paragraph.color.hex()
    )
}

fn paragraph_xml(paragraph: &Paragraph) -> String {
    let mut ppr_parts = String::new();
    let algn = match paragraph.align {
        Align::Left => "",
        Align::Center => " algn=\"ctr\"",
    };
    if let Some(pt) = paragraph.space_after_pt {
        ppr_parts.push_str(&format!(
            "<a:spcAft><a:spcPts val=\"{}\"/></a:spcAft>",
            pt * 100
        ));
    }
    let ppr = if algn.is_empty() && ppr_parts.is_empty() {
        String::new()
    } else {
        format!("<a:pPr{}>{}</a:pPr>", algn, ppr_parts)
    };

    // Newlines become <a:br/> between runs, matching how presentation text
    // represents line breaks.
    let rpr = run_properties_xml(paragraph);
    let mut body = String::new();
    for (i, line) in paragraph.text.split('\n').enumerate() {
        if i > 0 {
            body.push_str("<a:br/>");
        }
        if !line.is_empty() {
            body.push_str(&format!("<a:r>{}<a:t>{}</a:t></a:r>", rpr, xml_escape(line)));
        }
    }

    format!("<a:p>{}{}</a:p>", ppr, body)
}

fn text_box_xml(shape_id: u32, rect: Rect, paragraphs: &[Paragraph], word_wrap: bool) -> String {
    let wrap = if word_wrap { "square" } else { "none" };
    let mut paras = String::new();
    for paragraph in paragraphs {
        paras.push_str(&paragraph_xml(paragraph));
    }

    format!(
        "<p:sp>\
<p:nvSpPr><p:cNvPr id=\"{id}\" name=\"TextBox {id}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
<p:spPr>{xfrm}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
<p:txBody><a:bodyPr wrap=\"{wrap}\"/><a:lstStyle/>{paras}</p:txBody>\
</p:sp>",
        id = shape_id,
        xfrm = xfrm_xml(rect),
        wrap = wrap,
        paras = paras
    )
}

fn picture_xml(shape_id: u32, rect: Rect, rel_id: u32) -> String {
    format!(
        "<p:pic>\
<p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Picture {id}\"/>\
<p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>\
<p:blipFill><a:blip r:embed=\"rId{rel}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>\
<p:spPr>{xfrm}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>\
</p:pic>",
        id = shape_id,
        rel = rel_id,
        xfrm = xfrm_xml(rect)
    )
}

fn slide_xml(slide: &SlideContent) -> String {
    let mut shapes_xml = String::new();
    // Shape id 1 is the group shape; pictures take rIds after the layout rel.
    let mut shape_id = 2u32;
    let mut picture_rel = 2u32;
    for shape in &slide.shapes {
        match shape {
            Shape::TextBox {
                rect,
                paragraphs,
                word_wrap,
            } => {
                shapes_xml.push_str(&text_box_xml(shape_id, *rect, paragraphs, *word_wrap));
            }
            Shape::Picture { rect, .. } => {
                shapes_xml.push_str(&picture_xml(shape_id, *rect, picture_rel));
                picture_rel += 1;
            }
        }
        shape_id += 1;
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
<p:cSld><p:spTree>\
<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>\
{}\
</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>\
</p:sld>",
        shapes_xml
    )
}

fn slide_rels_xml(slide: &SlideContent, media: &[MediaItem]) -> String {
    let mut rels = String::from(
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>",
    );
    let mut picture_rel = 2u32;
    for shape in &slide.shapes {
        if let Shape::Picture { media_index, .. } = shape {
            let extension = media
                .get(*media_index)
                .map(|item| item.extension.as_str())
                .unwrap_or("png");
            rels.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"../media/image{}.{}\"/>",
                picture_rel,
                media_index + 1,
                extension
            ));
            picture_rel += 1;
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
        rels
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_conversion() {
        assert_eq!(emu(1.0), 914_400);
        assert_eq!(emu(7.5), 6_858_000);
        assert_eq!(emu(13.333), 12_191_695);
        assert_eq!(emu(0.0), 0);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape("A & B < C > \"D\" 'E'"),
            "A &amp; B &lt; C &gt; &quot;D&quot; &apos;E&apos;"
        );
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn test_paragraph_newlines_become_breaks() {
        let paragraph = Paragraph {
            text: "Line one\nLine two".to_string(),
            size_pt: 16,
            bold: false,
            color: Rgb(0x33, 0x33, 0x33),
            align: Align::Left,
            space_after_pt: None,
        };
        let xml = paragraph_xml(&paragraph);
        assert!(xml.contains("<a:t>Line one</a:t>"));
        assert!(xml.contains("<a:br/>"));
        assert!(xml.contains("<a:t>Line two</a:t>"));
        assert!(!xml.contains("<a:pPr"));
    }

    #[test]
    fn test_paragraph_styling_attributes() {
        let paragraph = Paragraph {
            text: "Summary".to_string(),
            size_pt: 24,
            bold: true,
            color: Rgb(0x2E, 0x74, 0xB5),
            align: Align::Center,
            space_after_pt: Some(12),
        };
        let xml = paragraph_xml(&paragraph);
        assert!(xml.contains("sz=\"2400\""));
        assert!(xml.contains("b=\"1\""));
        assert!(xml.contains("<a:srgbClr val=\"2E74B5\"/>"));
        assert!(xml.contains("algn=\"ctr\""));
        assert!(xml.contains("<a:spcPts val=\"1200\"/>"));
    }

    #[test]
    fn test_slide_xml_assigns_picture_rel_after_layout() {
        let slide = SlideContent {
            shapes: vec![
                Shape::TextBox {
                    rect: Rect::new(0.3, 0.2, 12.0, 0.6),
                    paragraphs: vec![],
                    word_wrap: false,
                },
                Shape::Picture {
                    rect: Rect::new(1.0, 1.0, 11.0, 5.8),
                    media_index: 0,
                },
            ],
        };
        let xml = slide_xml(&slide);
        assert!(xml.contains("r:embed=\"rId2\""));

        let media = vec![MediaItem {
            bytes: vec![1, 2, 3],
            extension: "png".to_string(),
        }];
        let rels = slide_rels_xml(&slide, &media);
        assert!(rels.contains("Target=\"../slideLayouts/slideLayout1.xml\""));
        assert!(rels.contains("Id=\"rId2\""));
        assert!(rels.contains("Target=\"../media/image1.png\""));
    }

    #[test]
    fn test_content_types_lists_each_extension_once() {
        let media = vec![
            MediaItem {
                bytes: vec![],
                extension: "png".to_string(),
            },
            MediaItem {
                bytes: vec![],
                extension: "png".to_string(),
            },
            MediaItem {
                bytes: vec![],
                extension: "jpeg".to_string(),
            },
        ];
        let xml = content_types_xml(2, &media);
        assert_eq!(xml.matches("Extension=\"png\"").count(), 1);
        assert_eq!(xml.matches("Extension=\"jpeg\"").count(), 1);
        assert_eq!(xml.matches("/ppt/slides/slide").count(), 2);
        assert!(xml.contains("slideMaster+xml"));
        assert!(xml.contains("theme+xml"));
    }

    #[test]
    fn test_presentation_xml_slide_ids() {
        let xml = presentation_xml(3, 13.333, 7.5);
        assert!(xml.contains("<p:sldId id=\"256\" r:id=\"rId2\"/>"));
        assert!(xml.contains("<p:sldId id=\"258\" r:id=\"rId4\"/>"));
        assert!(xml.contains("cx=\"12191695\""));
        assert!(xml.contains("cy=\"6858000\""));
    }

    #[test]
    fn test_write_package_produces_reopenable_zip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deck.pptx");

        let slide = SlideContent {
            shapes: vec![Shape::TextBox {
                rect: Rect::new(0.5, 2.5, 12.333, 1.5),
                paragraphs: vec![Paragraph {
                    text: "Educational Notes".to_string(),
                    size_pt: 44,
                    bold: true,
                    color: Rgb(0x2E, 0x74, 0xB5),
                    align: Align::Center,
                    space_after_pt: None,
                }],
                word_wrap: false,
            }],
        };
        write_package(&path, &[slide], &[], 13.333, 7.5).expect("write package");

        let file = std::fs::File::open(&path).expect("open package");
        let mut archive = zip::ZipArchive::new(file).expect("read archive");
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("entry").name().to_string())
            .collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"ppt/presentation.xml".to_string()));
        assert!(names.contains(&"ppt/slides/slide1.xml".to_string()));
        assert!(names.contains(&"ppt/slideMasters/slideMaster1.xml".to_string()));
        assert!(names.contains(&"ppt/theme/theme1.xml".to_string()));
    }
}
