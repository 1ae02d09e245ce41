//! Document package I/O and the post-render patches applied to it.
//!
//! Both patches are plain string transforms over one part each. When a part is
//! missing, is not UTF-8, or lacks the anchor a patch needs, the part is left
//! exactly as it was.

use std::io::{Cursor, Read, Write};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PackageError;
use crate::escape::xml_escape_attr;
use crate::hyperlink::{Relationship, HYPERLINK_REL_TYPE};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const RELATIONSHIPS_CLOSE: &str = "</Relationships>";
const TBL_PR_OPEN: &str = "<w:tblPr";
const TBL_PR_CLOSE: &str = "</w:tblPr>";
const FIXED_LAYOUT: &str = "<w:tblLayout w:type=\"fixed\"/>";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// A ZIP-packaged document held in memory, entries kept in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackageError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: entry.name().to_string(),
                data,
                is_dir: entry.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn part_text(&self, name: &str) -> Option<&str> {
        self.part(name).and_then(|data| std::str::from_utf8(data).ok())
    }

    /// Replace a part's contents, appending it when the package lacks it.
    pub fn set_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.entries.iter_mut().find(|e| !e.is_dir && e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                is_dir: false,
            }),
        }
    }

    /// Serialize back to a ZIP archive. Media is stored, everything else deflated.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for entry in &self.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), stored)?;
                continue;
            }
            let opts = if entry.name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(entry.name.as_str(), opts)?;
            zip.write_all(&entry.data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// Append one external hyperlink relationship per entry just before the
/// closing `</Relationships>` tag. Entries with an empty id are skipped.
pub fn inject_hyperlink_rels(rels_xml: &str, rels: &[Relationship]) -> String {
    let entries: String = rels
        .iter()
        .filter(|rel| !rel.id.is_empty())
        .map(|rel| {
            format!(
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\" TargetMode=\"External\"/>",
                xml_escape_attr(&rel.id),
                HYPERLINK_REL_TYPE,
                xml_escape_attr(&rel.target),
            )
        })
        .collect();
    if entries.is_empty() {
        return rels_xml.to_string();
    }
    let Some(idx) = rels_xml.rfind(RELATIONSHIPS_CLOSE) else {
        return rels_xml.to_string();
    };
    let mut out = String::with_capacity(rels_xml.len() + entries.len());
    out.push_str(&rels_xml[..idx]);
    out.push_str(&entries);
    out.push_str(&rels_xml[idx..]);
    out
}

/// Give every `<w:tblPr>` that lacks a `<w:tblLayout>` a fixed layout as its
/// first child, so Word keeps the template's column widths.
pub fn enforce_fixed_table_layout(document_xml: &str) -> String {
    let s = document_xml;
    let mut out = String::with_capacity(s.len() + 64);
    let mut pos = 0;
    while let Some(rel) = s[pos..].find(TBL_PR_OPEN) {
        let start = pos + rel;
        let after_name = start + TBL_PR_OPEN.len();
        // Skip look-alikes such as <w:tblPrEx> and <w:tblPrChange>.
        let boundary = s[after_name..].chars().next();
        if !matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_whitespace()) {
            out.push_str(&s[pos..after_name]);
            pos = after_name;
            continue;
        }
        let Some(gt_rel) = s[after_name..].find('>') else {
            break;
        };
        let open_end = after_name + gt_rel + 1;
        let open_tag = &s[start..open_end];
        out.push_str(&s[pos..start]);

        if open_tag.ends_with("/>") {
            let attrs = open_tag[TBL_PR_OPEN.len()..open_tag.len() - 2].trim_end();
            out.push_str(TBL_PR_OPEN);
            out.push_str(attrs);
            out.push('>');
            out.push_str(FIXED_LAYOUT);
            out.push_str(TBL_PR_CLOSE);
            pos = open_end;
            continue;
        }

        let Some(close_rel) = s[open_end..].find(TBL_PR_CLOSE) else {
            out.push_str(&s[start..]);
            return out;
        };
        let close_end = open_end + close_rel + TBL_PR_CLOSE.len();
        let inner = &s[open_end..open_end + close_rel];
        if inner.to_ascii_lowercase().contains("<w:tbllayout") {
            out.push_str(&s[start..close_end]);
        } else {
            out.push_str(open_tag);
            out.push_str(FIXED_LAYOUT);
            out.push_str(&s[open_end..close_end]);
        }
        pos = close_end;
    }
    out.push_str(&s[pos..]);
    out
}

/// Apply the post-render patches: fixed table layout on the main document
/// part, then hyperlink relationship registration.
pub fn post_process(package: &mut Package, rels: &[Relationship]) {
    match package.part_text(DOCUMENT_PART) {
        Some(doc) => {
            let patched = enforce_fixed_table_layout(doc);
            if patched != doc {
                package.set_part(DOCUMENT_PART, patched);
            }
        }
        None => warn!(part = DOCUMENT_PART, "document part missing or not UTF-8; table layout untouched"),
    }

    if rels.is_empty() {
        return;
    }
    match package.part_text(DOCUMENT_RELS_PART) {
        Some(rels_xml) => {
            let patched = inject_hyperlink_rels(rels_xml, rels);
            if patched == rels_xml {
                warn!(part = DOCUMENT_RELS_PART, "relationships closing tag not found; hyperlinks not registered");
            } else {
                debug!(count = rels.len(), "registered hyperlink relationships");
                package.set_part(DOCUMENT_RELS_PART, patched);
            }
        }
        None => warn!(part = DOCUMENT_RELS_PART, "relationships part missing or not UTF-8; hyperlinks not registered"),
    }
}
