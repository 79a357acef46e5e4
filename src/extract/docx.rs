//! DOCX paragraph extraction using the docx-rs crate

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

/// Text of every non-empty body paragraph, in document order
pub fn paragraphs(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let docx = read_docx(bytes).map_err(|e| format!("DOCX parse error: {}", e))?;

    let mut chunks = Vec::new();
    for child in docx.document.children.iter() {
        let DocumentChild::Paragraph(para) = child else {
            continue;
        };
        let text: String = para
            .children
            .iter()
            .filter_map(|pc| match pc {
                ParagraphChild::Run(run) => Some(run),
                _ => None,
            })
            .flat_map(|run| run.children.iter())
            .filter_map(|rc| match rc {
                RunChild::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        if !text.trim().is_empty() {
            chunks.push(text);
        }
    }
    Ok(chunks)
}
