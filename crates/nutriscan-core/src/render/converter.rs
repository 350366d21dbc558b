//! Markdown to sanitised HTML.

use pulldown_cmark::{Options, Parser, html};

use crate::StreamFailure;

/// Converts accumulated text into safe display markup.
///
/// Implementations must be pure: converting the same text twice yields
/// byte-identical output.
pub trait MarkupConverter: Send + Sync {
    /// Converts the text.
    ///
    /// # Errors
    ///
    /// Returns [`StreamFailure::Conversion`] if the text cannot be converted.
    fn convert(&self, text: &str) -> Result<String, StreamFailure>;
}

/// CommonMark renderer with tables, sanitised with `ammonia`.
///
/// Raw HTML in model output is passed through the sanitiser, so scripts,
/// event handlers and styles never reach the display. Task list items keep
/// their checkbox; any other `input` is coerced into one.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    options: Options,
    max_input_len: Option<usize>,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter {
    /// Creates a converter with tables, strikethrough and task lists enabled.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self {
            options,
            max_input_len: None,
        }
    }

    /// Rejects input longer than `max` bytes.
    pub fn with_max_input_len(mut self, max: usize) -> Self {
        self.max_input_len = Some(max);
        self
    }
}

impl MarkupConverter for MarkdownConverter {
    fn convert(&self, text: &str) -> Result<String, StreamFailure> {
        if let Some(max) = self.max_input_len
            && text.len() > max
        {
            return Err(StreamFailure::conversion(format!(
                "input of {} bytes exceeds the {max} byte limit",
                text.len()
            )));
        }

        let parser = Parser::new_ext(text, self.options);
        let mut unsafe_html = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut unsafe_html, parser);

        Ok(sanitize(&unsafe_html))
    }
}

/// Default `ammonia` policy plus the read-only checkboxes of task lists.
fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .add_tags(&["input"])
        .add_tag_attributes("input", &["checked", "disabled"])
        .set_tag_attribute_value("input", "type", "checkbox")
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_heading_and_paragraph() {
        let html = MarkdownConverter::new().convert("# Title\n\nok").unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn renders_tables() {
        let text = "| Nutrient | Per 100g |\n|---|---|\n| Sodium (mg) | 410 |\n";
        let html = MarkdownConverter::new().convert(text).unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>Sodium (mg)</td>"));
    }

    #[test]
    fn strips_scripts_and_handlers() {
        let text = "**bold**<script>alert(1)</script><img src=x onerror=alert(1)>";
        let html = MarkdownConverter::new().convert(text).unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn task_lists_keep_checkboxes() {
        let html = MarkdownConverter::new()
            .convert("- [x] Low sugar\n- [ ] Low sodium\n")
            .unwrap();
        assert_eq!(html.matches("<input").count(), 2);
        assert_eq!(html.matches(r#"type="checkbox""#).count(), 2);
        assert_eq!(html.matches("checked").count(), 1);
        assert!(html.contains("Low sodium"));
    }

    #[test]
    fn raw_inputs_become_inert_checkboxes() {
        let text = r#"<input type="text" value="x" onfocus="alert(1)">"#;
        let html = MarkdownConverter::new().convert(text).unwrap();
        assert!(!html.contains("onfocus"));
        assert!(!html.contains(r#"type="text""#));
        assert!(!html.contains("value"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let converter = MarkdownConverter::new();
        let text = "## Product Category\n- Snack\n- **Usage Frequency**: Weekly";
        assert_eq!(converter.convert(text), converter.convert(text));
    }

    #[test]
    fn enforces_input_limit() {
        let converter = MarkdownConverter::new().with_max_input_len(4);
        assert!(matches!(
            converter.convert("12345"),
            Err(StreamFailure::Conversion { .. })
        ));
        assert!(converter.convert("1234").is_ok());
    }
}
