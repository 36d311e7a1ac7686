//! PPTX slide reader.

use deckcheck_core::{Error, Result, Slide, SlideSource};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use zip::ZipArchive;

/// Regex to collapse runs of spaces and tabs inside a line.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Reads the text of every slide in a .pptx archive.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX archive into text slides, numbered from 1 in deck order.
    ///
    /// Slides without text are kept (as blank slides) so numbering matches
    /// what the audience sees.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<Slide>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        log::debug!("PPTX contains {} slides", slide_paths.len());

        let mut slides = Vec::with_capacity(slide_paths.len());
        for (idx, path) in slide_paths.iter().enumerate() {
            let xml = read_file_from_archive(&mut archive, path)?;
            let text = slide_text(&xml);
            slides.push(Slide::text(idx + 1, path.as_str(), text));
        }

        Ok(slides)
    }

    /// Slide part paths in presentation order.
    ///
    /// The order comes from `<p:sldIdLst>` in presentation.xml, resolved
    /// through the presentation relationships. If presentation.xml has no
    /// list, slides are ordered by the number in their part name.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let targets = parse_slide_relationships(&rels_content)?;

        let ordered_ids = match read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(xml) => parse_slide_id_list(&xml)?,
            Err(e) => {
                log::warn!("Could not read {}: {}", PRESENTATION_PATH, e);
                Vec::new()
            }
        };

        if !ordered_ids.is_empty() {
            let paths: Vec<String> = ordered_ids
                .iter()
                .filter_map(|id| targets.iter().find(|(rid, _)| rid == id))
                .map(|(_, path)| path.clone())
                .collect();
            if !paths.is_empty() {
                return Ok(paths);
            }
        }

        let mut paths: Vec<String> = targets.into_iter().map(|(_, path)| path).collect();
        paths.sort_by(|a, b| match (extract_slide_number(a), extract_slide_number(b)) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        });
        Ok(paths)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A .pptx file on disk as a slide source.
#[derive(Debug, Clone)]
pub struct PptxSource {
    path: PathBuf,
}

impl PptxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlideSource for PptxSource {
    fn load_slides(&self) -> Result<Vec<Slide>> {
        let file = File::open(&self.path)?;
        let slides = PptxParser::new().parse(BufReader::new(file))?;
        log::info!(
            "Read {} slides from {}",
            slides.len(),
            self.path.display()
        );
        Ok(slides)
    }
}

/// `(relationship id, archive path)` for every slide relationship.
fn parse_slide_relationships(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut slides = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                // Matches ".../relationships/slide" but not slideLayout/slideMaster.
                if !rel_type.ends_with("/slide") {
                    continue;
                }
                let (Some(id), Some(target)) = (attribute(e, b"Id"), attribute(e, b"Target")) else {
                    continue;
                };
                slides.push((id, resolve_target(&target)));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids from `<p:sldIdLst>`, in deck order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = e
                    .attributes()
                    .flatten()
                    .find(|a| local_name(a.key.as_ref()) == b"id" && a.key.as_ref() != b"id")
                    .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::PptxParseError(format!("Error parsing presentation.xml: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Text shape on a slide with its offset, for reading order.
#[derive(Debug, Default)]
struct ShapeText {
    text: String,
    x: f64,
    y: f64,
}

/// All text on a slide, shapes ordered top-to-bottom then left-to-right,
/// one paragraph per line.
fn slide_text(xml: &str) -> String {
    let mut shapes = extract_shapes(xml);
    shapes.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    shapes
        .iter()
        .flat_map(|s| s.text.lines())
        .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_shapes(xml: &str) -> Vec<ShapeText> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut current: Option<ShapeText> = None;
    let mut in_text_body = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"graphicFrame" => current = Some(ShapeText::default()),
                b"off" => set_offset(current.as_mut(), e),
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        if !shape.text.is_empty() {
                            shape.text.push('\n');
                        }
                    }
                }
                b"t" if in_text_body => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => set_offset(current.as_mut(), e),
                b"br" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                if let Some(shape) = current.as_mut() {
                    shape.text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"graphicFrame" => {
                    if let Some(mut shape) = current.take() {
                        shape.text = shape.text.trim().to_string();
                        if !shape.text.is_empty() {
                            shapes.push(shape);
                        }
                    }
                    in_text_body = false;
                    in_run_text = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error in slide (stopping early): {}", e);
                break;
            }
            _ => {}
        }
    }

    shapes
}

/// Record `<a:off x=".." y="..">` on the current shape, first one wins.
fn set_offset(shape: Option<&mut ShapeText>, e: &BytesStart) {
    let Some(shape) = shape else { return };
    if shape.x != 0.0 || shape.y != 0.0 {
        return;
    }
    if let Some(x) = attribute(e, b"x").and_then(|v| v.parse().ok()) {
        shape.x = x;
    }
    if let Some(y) = attribute(e, b"y").and_then(|v| v.parse().ok()) {
        shape.y = y;
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Turn a relationship target into an archive path.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a part name like "ppt/slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckcheck_core::SlideContent;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    const SLIDE_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    const LAYOUT_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

    fn shape(text_paragraphs: &[&str], x: i64, y: i64) -> String {
        let paragraphs: String = text_paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<p:sp><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp>"#
        )
    }

    fn slide_xml(shapes: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            shapes.concat()
        )
    }

    /// Build a pptx whose deck order is slide3, slide1, slide2 (by rId).
    fn build_pptx(with_id_list: bool) -> Vec<u8> {
        let rels = format!(
            r#"<?xml version="1.0"?><Relationships xmlns="r">
<Relationship Id="rId1" Type="{SLIDE_REL}" Target="slides/slide1.xml"/>
<Relationship Id="rId2" Type="{SLIDE_REL}" Target="slides/slide2.xml"/>
<Relationship Id="rId3" Type="{SLIDE_REL}" Target="/ppt/slides/slide3.xml"/>
<Relationship Id="rId9" Type="{LAYOUT_REL}" Target="slideLayouts/slideLayout1.xml"/>
</Relationships>"#
        );
        let id_list = if with_id_list {
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId1"/><p:sldId id="258" r:id="rId2"/></p:sldIdLst>"#
        } else {
            ""
        };
        let presentation = format!(
            r#"<?xml version="1.0"?><p:presentation xmlns:p="p" xmlns:r="r">{id_list}</p:presentation>"#
        );

        let files = vec![
            ("ppt/_rels/presentation.xml.rels".to_string(), rels),
            ("ppt/presentation.xml".to_string(), presentation),
            (
                "ppt/slides/slide1.xml".to_string(),
                slide_xml(&[
                    shape(&["Saves   45 minutes", "per deck"], 100, 500),
                    shape(&["Quarterly Results"], 100, 10),
                ]),
            ),
            ("ppt/slides/slide2.xml".to_string(), slide_xml(&[])),
            (
                "ppt/slides/slide3.xml".to_string(),
                slide_xml(&[shape(&["Right"], 900, 50), shape(&["Left &amp; first"], 10, 50)]),
            ),
        ];

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            writer.start_file(name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn texts(slides: &[Slide]) -> Vec<String> {
        slides
            .iter()
            .map(|s| match &s.content {
                SlideContent::Text(t) => t.clone(),
                SlideContent::Image { .. } => panic!("expected text slide"),
            })
            .collect()
    }

    #[test]
    fn test_deck_order_follows_slide_id_list() {
        let slides = PptxParser::new().parse(Cursor::new(build_pptx(true))).unwrap();

        let labels: Vec<&str> = slides.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["ppt/slides/slide3.xml", "ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]
        );
        assert_eq!(slides.iter().map(|s| s.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_falls_back_to_part_numbers() {
        let slides = PptxParser::new().parse(Cursor::new(build_pptx(false))).unwrap();

        let labels: Vec<&str> = slides.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml", "ppt/slides/slide3.xml"]
        );
    }

    #[test]
    fn test_text_in_reading_order() {
        let slides = PptxParser::new().parse(Cursor::new(build_pptx(true))).unwrap();
        let texts = texts(&slides);

        assert_eq!(texts[0], "Left & first\nRight");
        assert_eq!(texts[1], "Quarterly Results\nSaves 45 minutes\nper deck");
        assert!(slides[2].is_blank());
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxParser::new().parse(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }
}
