use crate::services::html_parser;

/// 水印文本，生命周期限于单次请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSpec {
    text: String,
}

impl WatermarkSpec {
    /// 从用户输入构造：看起来像 HTML 就去标签，空白输入视为没有水印
    pub fn from_input(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let text = if trimmed.contains('<') {
            html_parser::extract_text(trimmed)
        } else {
            trimmed.to_string()
        };
        if text.is_empty() {
            None
        } else {
            Some(Self { text })
        }
    }

    /// DOCX 使用大写
    pub fn for_docx(&self) -> String {
        self.text.to_uppercase()
    }

    /// PDF 原样输出
    pub fn for_pdf(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_is_stripped() {
        let spec = WatermarkSpec::from_input("<b>Confidential</b> draft").unwrap();
        assert_eq!(spec.for_pdf(), "Confidential draft");
        assert_eq!(spec.for_docx(), "CONFIDENTIAL DRAFT");
    }

    #[test]
    fn test_plain_text_kept_verbatim() {
        let spec = WatermarkSpec::from_input("  internal use  ").unwrap();
        assert_eq!(spec.for_pdf(), "internal use");
    }

    #[test]
    fn test_blank_input_means_no_watermark() {
        assert!(WatermarkSpec::from_input("   ").is_none());
        assert!(WatermarkSpec::from_input("<span> </span>").is_none());
    }
}
