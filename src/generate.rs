use tracing::{debug, info, instrument};

use crate::error::{GenerateError, RenderError};
use crate::hyperlink::{RelIdAllocator, Relationship};
use crate::package::{post_process, Package, DOCUMENT_RELS_PART};
use crate::proposal::{ProposalData, ProposalRequest};
use crate::render::TemplateRenderer;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const FILENAME_SUFFIX: &str = "_pengajuan.docx";
const DEFAULT_FILENAME_STEM: &str = "proposal";
const FILENAME_STEM_MAX_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub relationships: Vec<Relationship>,
}

/// Event name reduced to `[A-Za-z0-9_-]`, at most 80 characters, plus the
/// proposal suffix.
pub fn proposal_filename(event_name: &str) -> String {
    let name = if event_name.is_empty() {
        DEFAULT_FILENAME_STEM
    } else {
        event_name
    };
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(FILENAME_STEM_MAX_CHARS)
        .collect();
    format!("{stem}{FILENAME_SUFFIX}")
}

/// Render a proposal from a template package. Package and renderer failures
/// are returned; the markup and patch stages themselves always complete.
#[instrument(skip_all, fields(event = %request.name))]
pub fn generate_proposal<R>(
    template: &[u8],
    request: &ProposalRequest,
    renderer: &R,
) -> Result<GeneratedDocument, GenerateError>
where
    R: TemplateRenderer + ?Sized,
{
    let mut package = Package::from_bytes(template)?;

    let mut ids = RelIdAllocator::from_rels_xml(package.part_text(DOCUMENT_RELS_PART));
    debug!(seed = ?ids.peek(), "relationship ids seeded");

    let (data, relationships) = ProposalData::assemble(request, &mut ids);
    debug!(
        categories = data.budget_by_category.len(),
        run_down = data.run_down.len(),
        hyperlinks = relationships.len(),
        "render data assembled"
    );

    let value = serde_json::to_value(&data).map_err(RenderError::from)?;
    renderer.render(&mut package, &value)?;

    post_process(&mut package, &relationships);
    let bytes = package.to_bytes()?;

    let filename = proposal_filename(&request.name);
    info!(%filename, size = bytes.len(), "proposal generated");
    Ok(GeneratedDocument {
        filename,
        content_type: DOCX_CONTENT_TYPE,
        bytes,
        relationships,
    })
}
