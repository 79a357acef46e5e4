//! PDF text extraction using the pdf-extract crate

/// Extract the text layer of a PDF.
///
/// Runs on the blocking pool. A parser panic on a malformed file is
/// reported as an error instead of unwinding into the pipeline.
pub async fn extract_text(bytes: Vec<u8>) -> std::result::Result<String, String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| format!("PDF parser aborted: {}", e))?
        .map_err(|e| format!("PDF parse error: {}", e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Single-page PDF with one line of Helvetica text per entry
    pub(crate) fn make_test_pdf(lines: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL");
        for line in lines {
            content.push_str(&format!(" ({}) Tj T*", line));
        }
        content.push_str(" ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_extracts_text_layer() {
        let bytes = make_test_pdf(&["Quarterly report for the board"]);
        let text = extract_text(bytes).await.unwrap();
        assert!(text.contains("Quarterly"), "got: {:?}", text);
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_error() {
        assert!(extract_text(b"not a pdf".to_vec()).await.is_err());
    }
}
