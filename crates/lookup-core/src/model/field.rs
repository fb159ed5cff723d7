//! Searchable/displayable attribute descriptor.

use serde::{Deserialize, Serialize};

use crate::config::SpecDefaults;

/// One attribute of a source that can be searched and/or shown.
///
/// The attribute name is fixed at creation. Every other property has a
/// chaining setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    attribute: String,
    searchable: bool,
    title_text: String,
    value_list_name: Option<String>,
    display_format: Option<String>,
    visible: bool,
    style_class: Option<String>,
    style_class_attribute: Option<String>,
    width: String,
}

impl FieldSpec {
    /// Create a field for `attribute` with default settings.
    pub fn new(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self {
            title_text: attribute.clone(),
            attribute,
            searchable: true,
            value_list_name: None,
            display_format: None,
            visible: true,
            style_class: None,
            style_class_attribute: None,
            width: SpecDefaults::FIELD_WIDTH.to_string(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Include (true) or exclude (false) this field from text matching.
    pub fn set_searchable(&mut self, searchable: bool) -> &mut Self {
        self.searchable = searchable;
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Human-readable label, also used as the alias of the search target.
    pub fn set_title_text(&mut self, title_text: impl Into<String>) -> &mut Self {
        self.title_text = title_text.into();
        self
    }

    pub fn title_text(&self) -> &str {
        &self.title_text
    }

    pub fn set_value_list_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.value_list_name = Some(name.into());
        self
    }

    pub fn value_list_name(&self) -> Option<&str> {
        self.value_list_name.as_deref()
    }

    pub fn set_display_format(&mut self, format: impl Into<String>) -> &mut Self {
        self.display_format = Some(format.into());
        self
    }

    pub fn display_format(&self) -> Option<&str> {
        self.display_format.as_deref()
    }

    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_style_class(&mut self, style_class: impl Into<String>) -> &mut Self {
        self.style_class = Some(style_class.into());
        self
    }

    pub fn style_class(&self) -> Option<&str> {
        self.style_class.as_deref()
    }

    /// Attribute whose per-record value supplies the style class.
    pub fn set_style_class_attribute(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.style_class_attribute = Some(attribute.into());
        self
    }

    pub fn style_class_attribute(&self) -> Option<&str> {
        self.style_class_attribute.as_deref()
    }

    pub fn set_width(&mut self, width: impl Into<String>) -> &mut Self {
        self.width = width.into();
        self
    }

    pub fn width(&self) -> &str {
        &self.width
    }

    /// Width as an integer, or `None` for `"auto"` and unparsable widths.
    ///
    /// Leading digits are accepted, so `"120px"` yields 120.
    pub fn width_as_integer(&self) -> Option<i64> {
        if self.width == SpecDefaults::FIELD_WIDTH {
            return None;
        }
        let trimmed = self.width.trim();
        let end = trimmed
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        trimmed[..end].parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let field = FieldSpec::new("last_name");
        assert_eq!(field.attribute(), "last_name");
        assert_eq!(field.title_text(), "last_name");
        assert!(field.is_searchable());
        assert!(field.is_visible());
        assert_eq!(field.width(), "auto");
        assert_eq!(field.value_list_name(), None);
        assert_eq!(field.display_format(), None);
    }

    #[test]
    fn test_setters_chain() {
        let mut field = FieldSpec::new("email");
        field
            .set_title_text("E-mail")
            .set_searchable(false)
            .set_visible(false)
            .set_style_class("muted")
            .set_style_class_attribute("email_style")
            .set_display_format("lower");

        assert_eq!(field.title_text(), "E-mail");
        assert!(!field.is_searchable());
        assert!(!field.is_visible());
        assert_eq!(field.style_class(), Some("muted"));
        assert_eq!(field.style_class_attribute(), Some("email_style"));
        assert_eq!(field.display_format(), Some("lower"));
    }

    #[test]
    fn test_width_as_integer() {
        let mut field = FieldSpec::new("code");
        assert_eq!(field.width_as_integer(), None);

        field.set_width("80");
        assert_eq!(field.width_as_integer(), Some(80));

        field.set_width("120px");
        assert_eq!(field.width_as_integer(), Some(120));

        field.set_width("wide");
        assert_eq!(field.width_as_integer(), None);
    }
}
