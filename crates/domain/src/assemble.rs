//! Report assembly: attach identity, timestamp and the original input

use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{ReportFields, ValidationReport};

/// Stand-in idea text for requests that carried only an attachment
pub const ATTACHMENT_PLACEHOLDER: &str = "Attachment Analysis";

pub fn assemble_report(
    fields: ReportFields,
    original_idea: Option<&str>,
    id: Uuid,
    created_at: OffsetDateTime,
) -> ValidationReport {
    let original_idea = original_idea
        .map(str::trim)
        .filter(|idea| !idea.is_empty())
        .unwrap_or(ATTACHMENT_PLACEHOLDER)
        .to_string();

    ValidationReport {
        id,
        created_at,
        original_idea,
        fields,
    }
}
