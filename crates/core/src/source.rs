//! Slide sources: where the ordered slides come from.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Slide;

/// Something that can produce the slides of a deck, numbered from 1.
pub trait SlideSource {
    fn load_slides(&self) -> Result<Vec<Slide>>;
}

/// Image extensions we accept, with their MIME types.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
];

/// MIME type for a slide image path, if it is one we accept.
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// A folder of exported slide images (`slide_1.jpg`, `slide_2.jpg`, ...).
///
/// Images are ordered by the last number in the file name, so `slide_10`
/// follows `slide_9`; files without a number come after, by name.
#[derive(Debug, Clone)]
pub struct FolderSource {
    dir: PathBuf,
}

impl FolderSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Image paths in slide order.
    pub fn image_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && image_mime_type(p).is_some())
            .collect();

        paths.sort_by(|a, b| {
            let name_a = file_name(a);
            let name_b = file_name(b);
            match (trailing_number(&name_a), trailing_number(&name_b)) {
                (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| name_a.cmp(&name_b)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => name_a.cmp(&name_b),
            }
        });

        Ok(paths)
    }
}

impl SlideSource for FolderSource {
    fn load_slides(&self) -> Result<Vec<Slide>> {
        let paths = self.image_paths()?;
        log::debug!("Found {} slide images in {}", paths.len(), self.dir.display());

        let mut slides = Vec::with_capacity(paths.len());
        for (idx, path) in paths.iter().enumerate() {
            let Some(mime_type) = image_mime_type(path) else {
                continue;
            };
            let data = fs::read(path)?;
            slides.push(Slide::image(idx + 1, file_name(path), mime_type, data));
        }

        Ok(slides)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Last run of ASCII digits in a file stem, e.g. "slide_12.jpg" -> 12.
fn trailing_number(name: &str) -> Option<u64> {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    stem[start..end].parse().ok()
}
