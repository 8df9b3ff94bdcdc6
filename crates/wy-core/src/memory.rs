//! In-memory host page
//!
//! A complete [`HostPage`] + [`RenderTarget`] backed by plain data. Used by the
//! command line harness (loaded from a JSON page description) and by tests.

use crate::error::PanelError;
use crate::page::{
    ElementSnapshot, FormSnapshot, HostPage, ListItem, Outcome, PreviewControl, RenderTarget,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Serializable description of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescription {
    pub origin: Url,
    pub path: String,
    #[serde(default)]
    pub cookies: String,
    #[serde(default)]
    pub forms: Vec<FormSnapshot>,
    #[serde(default)]
    pub controls: Vec<PreviewControl>,
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
    /// Ids of result regions present on the page
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Rendered entries of one category region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionContent {
    pub success: Vec<ListItem>,
    pub errors: Vec<ListItem>,
}

impl RegionContent {
    fn list(&self, outcome: Outcome) -> &Vec<ListItem> {
        match outcome {
            Outcome::Success => &self.success,
            Outcome::Errors => &self.errors,
        }
    }

    fn list_mut(&mut self, outcome: Outcome) -> &mut Vec<ListItem> {
        match outcome {
            Outcome::Success => &mut self.success,
            Outcome::Errors => &mut self.errors,
        }
    }
}

#[derive(Debug)]
struct PageState {
    path: String,
    cookies: String,
    forms: Vec<FormSnapshot>,
    controls: Vec<PreviewControl>,
    elements: BTreeMap<String, ElementSnapshot>,
    regions: BTreeMap<String, RegionContent>,
}

/// Page held entirely in memory
#[derive(Debug)]
pub struct StaticPage {
    origin: Url,
    state: RwLock<PageState>,
}

impl StaticPage {
    /// Create an empty page at `origin` + `path`
    #[must_use]
    pub fn new(origin: Url, path: impl Into<String>) -> Self {
        Self {
            origin,
            state: RwLock::new(PageState {
                path: path.into(),
                cookies: String::new(),
                forms: Vec::new(),
                controls: Vec::new(),
                elements: BTreeMap::new(),
                regions: BTreeMap::new(),
            }),
        }
    }

    /// Build a page from its description
    #[must_use]
    pub fn from_description(desc: PageDescription) -> Self {
        let page = Self::new(desc.origin, desc.path).with_cookies(desc.cookies);
        let page = desc.forms.into_iter().fold(page, Self::with_form);
        let page = desc.controls.into_iter().fold(page, Self::with_control);
        let page = desc.elements.into_iter().fold(page, Self::with_element);
        desc.regions.into_iter().fold(page, Self::with_region)
    }

    /// Parse a JSON page description
    pub fn from_json(raw: &str) -> Result<Self, PanelError> {
        let desc: PageDescription = serde_json::from_str(raw)
            .map_err(|e| PanelError::Config(format!("invalid page description: {e}")))?;
        Ok(Self::from_description(desc))
    }

    #[must_use]
    pub fn with_cookies(self, cookies: impl Into<String>) -> Self {
        self.state.write().cookies = cookies.into();
        self
    }

    #[must_use]
    pub fn with_form(self, form: FormSnapshot) -> Self {
        self.state.write().forms.push(form);
        self
    }

    #[must_use]
    pub fn with_control(self, control: PreviewControl) -> Self {
        self.state.write().controls.push(control);
        self
    }

    #[must_use]
    pub fn with_element(self, element: ElementSnapshot) -> Self {
        self.state.write().elements.insert(element.id.clone(), element);
        self
    }

    /// With an empty result region
    #[must_use]
    pub fn with_region(self, region_id: impl Into<String>) -> Self {
        self.state
            .write()
            .regions
            .insert(region_id.into(), RegionContent::default());
        self
    }

    /// Simulate typing into an input
    ///
    /// Inputs named `id_<field>` also update form field `<field>`.
    pub fn set_value(&self, id: &str, value: impl Into<String>) {
        let value = value.into();
        let mut state = self.state.write();

        if let Some(el) = state.elements.get_mut(id) {
            el.value = value.clone();
        }

        if let Some(field) = id.strip_prefix("id_") {
            for form in &mut state.forms {
                for (name, current) in &mut form.fields {
                    if name == field {
                        *current = value.clone();
                    }
                }
            }
        }
    }

    /// Remove the form with this id
    pub fn remove_form(&self, form_id: &str) {
        self.state.write().forms.retain(|f| f.id != form_id);
    }

    /// Entries currently rendered in a sub-region
    #[must_use]
    pub fn items(&self, region_id: &str, outcome: Outcome) -> Vec<ListItem> {
        self.state
            .read()
            .regions
            .get(region_id)
            .map(|r| r.list(outcome).clone())
            .unwrap_or_default()
    }

    /// Messages currently rendered in a sub-region
    #[must_use]
    pub fn texts(&self, region_id: &str, outcome: Outcome) -> Vec<String> {
        self.items(region_id, outcome)
            .into_iter()
            .map(|item| item.text)
            .collect()
    }

    /// HTML of a region, both sub-regions in order
    #[must_use]
    pub fn region_html(&self, region_id: &str) -> Option<String> {
        let state = self.state.read();
        let region = state.regions.get(region_id)?;

        let mut html = String::new();
        for outcome in [Outcome::Success, Outcome::Errors] {
            html.push_str(&format!("<ul class=\"{}\">", outcome.class()));
            for item in region.list(outcome) {
                html.push_str(&item.to_html());
            }
            html.push_str("</ul>");
        }
        Some(html)
    }
}

impl HostPage for StaticPage {
    fn origin(&self) -> Url {
        self.origin.clone()
    }

    fn path(&self) -> String {
        self.state.read().path.clone()
    }

    fn cookies(&self) -> String {
        self.state.read().cookies.clone()
    }

    fn form(&self, form_id: &str) -> Option<FormSnapshot> {
        self.state
            .read()
            .forms
            .iter()
            .find(|f| f.id == form_id)
            .cloned()
    }

    fn preview_controls(&self) -> Vec<PreviewControl> {
        self.state.read().controls.clone()
    }

    fn element(&self, id: &str) -> Option<ElementSnapshot> {
        self.state.read().elements.get(id).cloned()
    }

    fn contains(&self, ancestor_id: &str, id: &str) -> bool {
        let state = self.state.read();
        let mut current = state.elements.get(id).and_then(|el| el.parent.clone());

        // Bounded by the element count so a malformed parent cycle terminates
        for _ in 0..=state.elements.len() {
            match current {
                Some(ref parent) if parent == ancestor_id => return true,
                Some(parent) => {
                    current = state.elements.get(&parent).and_then(|el| el.parent.clone());
                }
                None => return false,
            }
        }
        false
    }
}

impl RenderTarget for StaticPage {
    fn has_region(&self, region_id: &str) -> bool {
        self.state.read().regions.contains_key(region_id)
    }

    fn clear(&self, region_id: &str, outcome: Outcome) {
        if let Some(region) = self.state.write().regions.get_mut(region_id) {
            region.list_mut(outcome).clear();
        }
    }

    fn append(&self, region_id: &str, outcome: Outcome, item: ListItem) {
        if let Some(region) = self.state.write().regions.get_mut(region_id) {
            region.list_mut(outcome).push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Icon;

    fn page() -> StaticPage {
        StaticPage::new(Url::parse("https://cms.example.com").unwrap(), "/admin/pages/3/edit/")
            .with_form(FormSnapshot::new("page-edit-form").with_field("title", "Old"))
            .with_element(ElementSnapshot::new("yoast_panel"))
            .with_element(ElementSnapshot::new("yoast_title").within("yoast_panel"))
            .with_element(ElementSnapshot::new("id_title").with_value("Old"))
            .with_region("yoast_results_readability")
    }

    #[test]
    fn set_value_updates_input_and_form_field() {
        let page = page();
        page.set_value("id_title", "New");

        assert_eq!(page.element("id_title").unwrap().value, "New");
        let form = page.form("page-edit-form").unwrap();
        assert_eq!(form.fields, vec![("title".to_string(), "New".to_string())]);
    }

    #[test]
    fn contains_follows_parents() {
        let page = page();
        assert!(page.contains("yoast_panel", "yoast_title"));
        assert!(!page.contains("yoast_panel", "id_title"));
        assert!(!page.contains("yoast_panel", "missing"));
    }

    #[test]
    fn writes_to_missing_region_are_ignored() {
        let page = page();
        page.append("nowhere", Outcome::Success, ListItem::new(Icon::Tick, "x"));
        assert!(!page.has_region("nowhere"));
        assert!(page.items("nowhere", Outcome::Success).is_empty());
    }

    #[test]
    fn region_html_lists_both_outcomes() {
        let page = page();
        page.append(
            "yoast_results_readability",
            Outcome::Errors,
            ListItem::new(Icon::Cross, "Too long"),
        );

        assert_eq!(
            page.region_html("yoast_results_readability").unwrap(),
            "<ul class=\"success\"></ul><ul class=\"errors\"><li><i class=\"icon icon-cross\"></i> Too long</li></ul>"
        );
    }

    #[test]
    fn loads_json_description() {
        let page = StaticPage::from_json(
            r#"{
                "origin": "https://cms.example.com/",
                "path": "/admin/pages/3/edit/",
                "cookies": "csrftoken=abc",
                "forms": [{"id": "page-edit-form", "fields": [["title", "Hello"]]}],
                "regions": ["yoast_results_seo"]
            }"#,
        )
        .unwrap();

        assert_eq!(page.cookies(), "csrftoken=abc");
        assert!(page.form("page-edit-form").is_some());
        assert!(page.has_region("yoast_results_seo"));
        assert_eq!(
            page.location().as_str(),
            "https://cms.example.com/admin/pages/3/edit/"
        );
    }

    #[test]
    fn malformed_description_is_a_config_error() {
        let err = StaticPage::from_json("{").unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }
}
