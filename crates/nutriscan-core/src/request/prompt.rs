//! The fixed analysis instruction.

use std::fmt;

/// Instruction text sent after both images.
///
/// The text is a static asset and is reproduced verbatim; downstream
/// consumers rely on its section structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    text: &'static str,
}

impl PromptTemplate {
    /// Section headings the generated report is asked to follow, in order.
    pub const SECTIONS: [&'static str; 6] = [
        "Product Information",
        "Nutritional Details",
        "Proprietary Claims",
        "Product Category",
        "Additional Insights",
        "Demographic Considerations",
    ];

    /// Returns the food product analysis template.
    pub const fn analysis() -> Self {
        Self {
            text: include_str!("../../assets/analysis_prompt.txt"),
        }
    }

    /// Returns the template text.
    pub const fn as_str(&self) -> &'static str {
        self.text
    }

    /// Returns the template length in bytes.
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the template is empty.
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::analysis()
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_appear_in_order() {
        let text = PromptTemplate::analysis().as_str();
        let mut cursor = 0;
        for (index, section) in PromptTemplate::SECTIONS.iter().enumerate() {
            let heading = format!("{}. **{}**", index + 1, section);
            let found = text[cursor..]
                .find(&heading)
                .unwrap_or_else(|| panic!("missing section {heading}"));
            cursor += found + heading.len();
        }
    }

    #[test]
    fn nutrient_table_is_present() {
        let text = PromptTemplate::default().to_string();
        assert!(text.contains("| Nutrient          | Per 100g |"));
        assert!(text.contains("| Sodium (mg)       |          |"));
        assert!(text.starts_with("\n      Extract and organize the following key data"));
    }
}
