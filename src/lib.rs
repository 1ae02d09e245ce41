//! Event proposal documents: editor HTML to WordprocessingML, hyperlink
//! relationship allocation, and post-render patching of `.docx` packages.

pub mod budget;
pub mod config;
pub mod entities;
pub mod error;
pub mod escape;
pub mod generate;
pub mod hyperlink;
pub mod markup;
pub mod package;
pub mod plain_text;
pub mod proposal;
pub mod render;
pub mod rich_text;
pub mod telemetry;

pub use error::{GenerateError, PackageError, RenderError};
pub use generate::{generate_proposal, proposal_filename, GeneratedDocument, DOCX_CONTENT_TYPE};
pub use hyperlink::{resolve_description, RelIdAllocator, Relationship, ResolvedDescription};
pub use markup::{html_to_word_xml, Rendered};
pub use package::{enforce_fixed_table_layout, inject_hyperlink_rels, post_process, Package};
pub use proposal::{ProposalData, ProposalRequest};
pub use render::{ScalarRenderer, TemplateRenderer};
