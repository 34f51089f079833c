use unicode_normalization::UnicodeNormalization;

/// Canonical form of OCR text used for anchor matching: NFKC folds full-width
/// and circled digits (`１２`, `⑫`) to ASCII, and outer whitespace is trimmed.
pub fn normalize_ocr_text(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    folded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_full_width_digits() {
        assert_eq!(normalize_ocr_text("  １２. "), "12.");
    }

    #[test]
    fn folds_circled_digits() {
        assert_eq!(normalize_ocr_text("⑫"), "12");
        assert_eq!(normalize_ocr_text("③번"), "3번");
    }
}
