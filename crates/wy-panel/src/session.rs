//! Per-panel session
//!
//! Holds what binding located (field element ids, written once), the cycle
//! generation counter and the generation last rendered. Field values are never cached; they are read
//! from the page each time a snapshot is taken.

use crate::config::PanelConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use wy_core::{ContentSnapshot, HostPage, PanelError};

/// Metadata field fed into a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Keyword,
    Title,
    Description,
    Slug,
}

impl FieldRole {
    pub const ALL: [FieldRole; 4] = [
        FieldRole::Keyword,
        FieldRole::Title,
        FieldRole::Description,
        FieldRole::Slug,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Keyword => "keyword",
            FieldRole::Title => "title",
            FieldRole::Description => "description",
            FieldRole::Slug => "slug",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one field was bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBinding {
    pub role: FieldRole,
    /// Panel control the binding started from
    pub control_id: String,
    /// Form field named by the control's `data-field`, if any
    pub field_name: Option<String>,
    /// Input whose value feeds the snapshot
    pub input_id: Option<String>,
}

impl FieldBinding {
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.input_id.is_some()
    }
}

/// Outcome of locating the panel's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingReport {
    pub panel_id: String,
    pub fields: Vec<FieldBinding>,
}

impl BindingReport {
    #[must_use]
    pub fn field(&self, role: FieldRole) -> Option<&FieldBinding> {
        self.fields.iter().find(|f| f.role == role)
    }

    /// Roles with a located input
    #[must_use]
    pub fn located(&self) -> Vec<FieldRole> {
        self.fields
            .iter()
            .filter(|f| f.is_bound())
            .map(|f| f.role)
            .collect()
    }

    #[must_use]
    pub fn missing(&self) -> Vec<FieldRole> {
        self.fields
            .iter()
            .filter(|f| !f.is_bound())
            .map(|f| f.role)
            .collect()
    }
}

/// State of one bound panel
#[derive(Debug)]
pub struct PanelSession {
    report: BindingReport,
    generation: AtomicU64,
    rendered: Mutex<u64>,
    title_width: u32,
}

impl PanelSession {
    /// Locate the panel region and its fields
    ///
    /// # Errors
    /// `PanelRegionMissing` if the panel region is absent or none of its
    /// fields can be located
    pub fn locate(page: &dyn HostPage, config: &PanelConfig) -> Result<Self, PanelError> {
        let panel_id = config.panel_id.as_str();
        let missing = || PanelError::PanelRegionMissing {
            region_id: panel_id.to_string(),
        };
        if page.element(panel_id).is_none() {
            return Err(missing());
        }

        let fields: Vec<FieldBinding> = FieldRole::ALL
            .iter()
            .map(|&role| bind_field(page, panel_id, config, role))
            .collect();
        let report = BindingReport {
            panel_id: panel_id.to_string(),
            fields,
        };

        tracing::debug!(
            panel = panel_id,
            located = ?report.located(),
            missing = ?report.missing(),
            "bound panel fields"
        );
        if report.located().is_empty() {
            return Err(missing());
        }

        Ok(Self {
            report,
            generation: AtomicU64::new(0),
            rendered: Mutex::new(0),
            title_width: config.title_width,
        })
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &BindingReport {
        &self.report
    }

    /// Whether input on `element_id` should refresh the panel
    #[must_use]
    pub fn watches(&self, element_id: &str) -> bool {
        self.report
            .fields
            .iter()
            .any(|f| f.input_id.as_deref() == Some(element_id))
    }

    /// Current value of a bound field, empty when unbound or absent
    #[must_use]
    pub fn value(&self, page: &dyn HostPage, role: FieldRole) -> String {
        self.report
            .field(role)
            .and_then(|f| f.input_id.as_deref())
            .and_then(|id| page.element(id))
            .map(|el| el.value)
            .unwrap_or_default()
    }

    /// Snapshot of `html` with the fields' current values
    #[must_use]
    pub fn snapshot(&self, page: &dyn HostPage, html: String) -> ContentSnapshot {
        ContentSnapshot::new(html)
            .with_keyword(self.value(page, FieldRole::Keyword))
            .with_title(self.value(page, FieldRole::Title))
            .with_description(self.value(page, FieldRole::Description))
            .with_slug(self.value(page, FieldRole::Slug))
            .with_title_width(self.title_width)
    }

    /// Start a cycle; returns its generation
    pub fn begin_cycle(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Run `render` unless a later generation has already rendered
    ///
    /// A newer cycle that fails never renders, so it does not hold back an
    /// older cycle that succeeds. Renders are serialized.
    pub fn render_if_newest<R>(&self, generation: u64, render: impl FnOnce() -> R) -> Option<R> {
        let mut rendered = self.rendered.lock();
        if generation <= *rendered {
            return None;
        }
        *rendered = generation;
        Some(render())
    }
}

fn bind_field(
    page: &dyn HostPage,
    panel_id: &str,
    config: &PanelConfig,
    role: FieldRole,
) -> FieldBinding {
    let control_id = match role {
        FieldRole::Keyword => &config.fields.keyword,
        FieldRole::Title => &config.fields.title,
        FieldRole::Description => &config.fields.description,
        FieldRole::Slug => &config.fields.slug,
    };
    let control = page
        .element(control_id)
        .filter(|_| page.contains(panel_id, control_id));

    let (field_name, input_id) = match (role, control) {
        (_, None) => (None, None),
        // The keyword control is itself the input
        (FieldRole::Keyword, Some(el)) => (None, Some(el.id)),
        (_, Some(el)) => {
            let name = el.data("field").map(str::to_string);
            let input = name
                .as_ref()
                .map(|name| format!("id_{name}"))
                .filter(|id| page.element(id).is_some());
            (name, input)
        }
    };

    FieldBinding {
        role,
        control_id: control_id.clone(),
        field_name,
        input_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wy_core::{ElementSnapshot, StaticPage, Url};
    use wy_test_utils::{bare_edit_page, edit_page, ORIGIN};

    #[test]
    fn binds_indirect_fields_through_data_field() {
        let page = edit_page();
        let session = PanelSession::locate(&page, &PanelConfig::default()).unwrap();

        let title = session.report().field(FieldRole::Title).unwrap();
        assert_eq!(title.field_name.as_deref(), Some("title"));
        assert_eq!(title.input_id.as_deref(), Some("id_title"));
        assert_eq!(session.report().missing(), Vec::<FieldRole>::new());
        assert!(session.watches("id_slug"));
        assert!(session.watches("yoast_keywords"));
        assert!(!session.watches("yoast_title"));
    }

    #[test]
    fn snapshot_reads_values_at_call_time() {
        let page = edit_page();
        let session = PanelSession::locate(&page, &PanelConfig::default()).unwrap();

        page.set_value("yoast_keywords", "rust");
        page.set_value("id_title", "Changed");
        let snapshot = session.snapshot(&page, "<p></p>".to_string());

        assert_eq!(snapshot.keyword(), "rust");
        assert_eq!(snapshot.title(), "Changed");
        assert_eq!(snapshot.description(), "A first post");
        assert_eq!(snapshot.slug(), "hello-world");
        assert_eq!(snapshot.title_width(), 500);
    }

    #[test]
    fn missing_panel_is_soft() {
        let page = bare_edit_page(Url::parse(ORIGIN).unwrap(), "/admin/pages/3/edit/");
        let err = PanelSession::locate(&page, &PanelConfig::default()).unwrap_err();

        assert!(err.is_soft());
        assert_eq!(
            err,
            PanelError::PanelRegionMissing {
                region_id: "yoast_panel".to_string()
            }
        );
    }

    #[test]
    fn partial_binding_reports_missing_fields() {
        let page = bare_edit_page(Url::parse(ORIGIN).unwrap(), "/admin/pages/3/edit/")
            .with_element(ElementSnapshot::new("yoast_panel"))
            .with_element(ElementSnapshot::new("yoast_keywords").within("yoast_panel"))
            .with_element(
                ElementSnapshot::new("yoast_title")
                    .within("yoast_panel")
                    .with_attribute("data-field", "headline"),
            )
            // Outside the panel
            .with_element(ElementSnapshot::new("yoast_slug").with_attribute("data-field", "slug"));

        let session = PanelSession::locate(&page, &PanelConfig::default()).unwrap();
        let report = session.report();

        assert_eq!(report.located(), vec![FieldRole::Keyword]);
        assert_eq!(
            report.field(FieldRole::Title).unwrap().field_name.as_deref(),
            Some("headline")
        );
        assert_eq!(session.value(&page, FieldRole::Slug), "");
    }

    #[test]
    fn panel_without_fields_is_missing() {
        let page = StaticPage::new(Url::parse(ORIGIN).unwrap(), "/")
            .with_element(ElementSnapshot::new("yoast_panel"));
        assert!(PanelSession::locate(&page, &PanelConfig::default()).is_err());
    }

    #[test]
    fn rendered_later_cycle_supersedes_earlier() {
        let session = PanelSession::locate(&edit_page(), &PanelConfig::default()).unwrap();

        let first = session.begin_cycle();
        let second = session.begin_cycle();
        assert_eq!(session.render_if_newest(second, || "second"), Some("second"));
        assert_eq!(session.render_if_newest(first, || "first"), None);
        assert_eq!(session.render_if_newest(second, || "again"), None);
    }

    #[test]
    fn unrendered_later_cycle_does_not_block_earlier() {
        let session = PanelSession::locate(&edit_page(), &PanelConfig::default()).unwrap();

        let first = session.begin_cycle();
        // Started, then failed before rendering
        let _second = session.begin_cycle();
        assert_eq!(session.render_if_newest(first, || 1), Some(1));
    }
}
