//! Host page seams
//!
//! The panel never owns the page it lives in. It reads the host page through
//! [`HostPage`] and writes feedback through [`RenderTarget`]; both are
//! implemented by whatever embeds the panel (a browser bridge, or the
//! in-memory [`StaticPage`](crate::StaticPage)).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Current state of the host edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    /// Element id of the form
    pub id: String,
    /// Attributes declared on the form element
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Field name/value pairs in document order
    #[serde(default)]
    pub fields: Vec<(String, String)>,
}

impl FormSnapshot {
    /// Create an empty form
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// With attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// With field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Non-empty attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A page control that can trigger a preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PreviewControl {
    /// `<button formaction=...>`
    Button {
        #[serde(default)]
        formaction: Option<String>,
    },
    /// `<a href=...>`
    Link {
        #[serde(default)]
        href: Option<String>,
    },
}

/// An element located by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Element id
    pub id: String,
    /// Id of the enclosing element, if any
    #[serde(default)]
    pub parent: Option<String>,
    /// Declared attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Current input value
    #[serde(default)]
    pub value: String,
}

impl ElementSnapshot {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Inside the element with `parent` id
    #[inline]
    #[must_use]
    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// With attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// With value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// `data-<key>` attribute, when non-empty
    #[must_use]
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(&format!("data-{key}"))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Read access to the page hosting the panel
pub trait HostPage: Send + Sync {
    /// Document origin, e.g. `https://cms.example.com/`
    fn origin(&self) -> Url;

    /// Current location path, e.g. `/admin/pages/3/edit/`
    fn path(&self) -> String;

    /// Raw cookie string, `name=value; other=value`
    fn cookies(&self) -> String;

    /// The form with this id
    fn form(&self, form_id: &str) -> Option<FormSnapshot>;

    /// Preview-capable controls in document order
    fn preview_controls(&self) -> Vec<PreviewControl>;

    /// The element with this id
    fn element(&self, id: &str) -> Option<ElementSnapshot>;

    /// Whether `id` sits somewhere below `ancestor_id`
    fn contains(&self, ancestor_id: &str, id: &str) -> bool;

    /// Absolute URL of the current location
    fn location(&self) -> Url {
        let origin = self.origin();
        origin.join(&self.path()).unwrap_or(origin)
    }
}

/// Sub-region of a category region
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Passing results, the `.success` list
    Success,
    /// Failing results, the `.errors` list
    Errors,
}

impl Outcome {
    /// CSS class of the list container
    #[inline]
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Errors => "errors",
        }
    }
}

/// Pass/fail icon marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Tick,
    Cross,
}

impl Icon {
    #[inline]
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Icon::Tick => "icon icon-tick",
            Icon::Cross => "icon icon-cross",
        }
    }
}

/// One rendered list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub icon: Icon,
    pub text: String,
}

impl ListItem {
    #[inline]
    #[must_use]
    pub fn new(icon: Icon, text: impl Into<String>) -> Self {
        Self {
            icon,
            text: text.into(),
        }
    }

    /// HTML fragment of the entry
    ///
    /// The message is engine-authored markup (it links to each check) and is
    /// inserted as is; only the icon wrapper is generated.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!("<li><i class=\"{}\"></i> {}</li>", self.icon.class(), self.text)
    }
}

/// Write access to the result regions
///
/// Missing regions are ignored by every method.
pub trait RenderTarget: Send + Sync {
    /// Whether the category region exists
    fn has_region(&self, region_id: &str) -> bool;

    /// Remove every entry of a sub-region
    fn clear(&self, region_id: &str, outcome: Outcome);

    /// Append an entry to a sub-region
    fn append(&self, region_id: &str, outcome: Outcome, item: ListItem);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_attributes_read_as_absent() {
        let form = FormSnapshot::new("page-edit-form").with_attribute("data-preview-url", "");
        assert_eq!(form.attribute("data-preview-url"), None);

        let el = ElementSnapshot::new("yoast_title").with_attribute("data-field", "seo_title");
        assert_eq!(el.data("field"), Some("seo_title"));
        assert_eq!(el.data("missing"), None);
    }

    #[test]
    fn list_item_keeps_message_markup() {
        let item = ListItem::new(
            Icon::Tick,
            "<a href='https://yoa.st/33q' target='_blank'>Text length</a>: Good job!",
        );
        assert_eq!(
            item.to_html(),
            "<li><i class=\"icon icon-tick\"></i> <a href='https://yoa.st/33q' target='_blank'>Text length</a>: Good job!</li>"
        );
    }

    #[test]
    fn controls_deserialize_by_kind() {
        let controls: Vec<PreviewControl> = serde_json::from_str(
            r#"[{"kind":"button","formaction":"/preview/"},{"kind":"link"}]"#,
        )
        .unwrap();
        assert_eq!(
            controls,
            vec![
                PreviewControl::Button {
                    formaction: Some("/preview/".to_string())
                },
                PreviewControl::Link { href: None },
            ]
        );
    }
}
