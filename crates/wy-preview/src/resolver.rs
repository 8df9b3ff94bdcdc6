//! Preview endpoint resolution
//!
//! Resolution is an ordered list of pure strategies over a [`ResolverInput`];
//! the first strategy to produce a usable URL wins. Candidates are made
//! absolute against the document origin, and candidates that do not form an
//! http(s) URL are dropped so the next strategy gets its turn.

use url::Url;
use wy_core::{FormSnapshot, HostPage, PanelError, PreviewControl};

/// Form attributes that may declare the preview endpoint, in lookup order
pub const FORM_ATTRIBUTES: &[&str] = &["data-preview-url", "data-wagtail-preview-url"];

/// Everything a strategy may look at
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    pub origin: &'a Url,
    pub path: &'a str,
    pub form: Option<&'a FormSnapshot>,
    pub controls: &'a [PreviewControl],
}

/// A resolution strategy
pub type Strategy = fn(&ResolverInput<'_>) -> Option<Url>;

/// Make `candidate` absolute against `origin`
#[must_use]
pub fn normalize(origin: &Url, candidate: &str) -> Option<Url> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    origin
        .join(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Endpoint declared as data on the edit form
#[must_use]
pub fn from_form_attributes(input: &ResolverInput<'_>) -> Option<Url> {
    let form = input.form?;
    FORM_ATTRIBUTES
        .iter()
        .filter_map(|name| form.attribute(name))
        .find_map(|candidate| normalize(input.origin, candidate))
}

/// Endpoint of the first preview button or link
#[must_use]
pub fn from_preview_control(input: &ResolverInput<'_>) -> Option<Url> {
    input
        .controls
        .iter()
        .filter_map(|control| match control {
            PreviewControl::Button {
                formaction: Some(action),
            } if action.contains("preview") => Some(action.as_str()),
            PreviewControl::Link { href: Some(href) } if href.contains("/preview/") => {
                Some(href.as_str())
            }
            _ => None,
        })
        .find_map(|candidate| normalize(input.origin, candidate))
}

/// Endpoint inferred from an `.../edit/` or `.../add/` location
#[must_use]
pub fn from_location_path(input: &ResolverInput<'_>) -> Option<Url> {
    let inferred = infer_preview_path(input.path)?;
    normalize(input.origin, &inferred)
}

/// Replace a trailing `/edit/` or `/add/` segment with `/preview/`
///
/// The final slash is optional; any other path infers nothing.
#[must_use]
pub fn infer_preview_path(path: &str) -> Option<String> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let base = trimmed
        .strip_suffix("/edit")
        .or_else(|| trimmed.strip_suffix("/add"))?;
    Some(format!("{base}/preview/"))
}

/// Ordered endpoint resolution
#[derive(Debug, Clone)]
pub struct PreviewResolver {
    form_id: String,
    strategies: Vec<(&'static str, Strategy)>,
}

impl PreviewResolver {
    /// Resolver with the standard strategy order for the form `form_id`
    #[must_use]
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            strategies: vec![
                ("form attribute", from_form_attributes as Strategy),
                ("preview control", from_preview_control),
                ("location path", from_location_path),
            ],
        }
    }

    /// Resolver with a custom strategy order
    #[must_use]
    pub fn with_strategies(
        form_id: impl Into<String>,
        strategies: Vec<(&'static str, Strategy)>,
    ) -> Self {
        Self {
            form_id: form_id.into(),
            strategies,
        }
    }

    #[inline]
    #[must_use]
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// First strategy result for `input`
    #[must_use]
    pub fn resolve_input(&self, input: &ResolverInput<'_>) -> Option<Url> {
        self.strategies.iter().find_map(|(name, strategy)| {
            let url = strategy(input)?;
            tracing::debug!(strategy = name, %url, "preview endpoint resolved");
            Some(url)
        })
    }

    /// Resolve the preview endpoint of `page`
    ///
    /// # Errors
    /// `PreviewEndpointUnresolved` when no strategy yields a URL
    pub fn resolve(&self, page: &dyn HostPage) -> Result<Url, PanelError> {
        let origin = page.origin();
        let path = page.path();
        let form = page.form(&self.form_id);
        let controls = page.preview_controls();

        let input = ResolverInput {
            origin: &origin,
            path: &path,
            form: form.as_ref(),
            controls: &controls,
        };
        self.resolve_input(&input)
            .ok_or(PanelError::PreviewEndpointUnresolved)
    }
}

impl Default for PreviewResolver {
    fn default() -> Self {
        Self::new("page-edit-form")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wy_core::StaticPage;

    fn origin() -> Url {
        Url::parse("https://cms.example.com").unwrap()
    }

    fn input<'a>(
        origin: &'a Url,
        path: &'a str,
        form: Option<&'a FormSnapshot>,
        controls: &'a [PreviewControl],
    ) -> ResolverInput<'a> {
        ResolverInput {
            origin,
            path,
            form,
            controls,
        }
    }

    #[test]
    fn infers_from_edit_and_add_paths() {
        assert_eq!(
            infer_preview_path("/admin/pages/3/edit/").as_deref(),
            Some("/admin/pages/3/preview/")
        );
        assert_eq!(
            infer_preview_path("/admin/pages/3/edit").as_deref(),
            Some("/admin/pages/3/preview/")
        );
        assert_eq!(
            infer_preview_path("/admin/pages/add/blog/blogpage/2/add/").as_deref(),
            Some("/admin/pages/add/blog/blogpage/2/preview/")
        );
        assert_eq!(infer_preview_path("/admin/pages/3/"), None);
        assert_eq!(infer_preview_path("/admin/pages/3/editor/"), None);
    }

    #[test]
    fn form_attribute_wins_over_other_strategies() {
        let origin = origin();
        let form = FormSnapshot::new("page-edit-form")
            .with_attribute("data-wagtail-preview-url", "/declared/preview/");
        let controls = [PreviewControl::Link {
            href: Some("/link/preview/".to_string()),
        }];

        let url = PreviewResolver::default()
            .resolve_input(&input(&origin, "/admin/pages/3/edit/", Some(&form), &controls))
            .unwrap();
        assert_eq!(url.as_str(), "https://cms.example.com/declared/preview/");
    }

    #[test]
    fn attribute_names_are_tried_in_order() {
        let origin = origin();
        let form = FormSnapshot::new("page-edit-form")
            .with_attribute("data-preview-url", "/first/")
            .with_attribute("data-wagtail-preview-url", "/second/");

        let url = from_form_attributes(&input(&origin, "/", Some(&form), &[])).unwrap();
        assert_eq!(url.path(), "/first/");
    }

    #[test]
    fn control_strategy_matches_preview_targets_only() {
        let origin = origin();
        let controls = [
            PreviewControl::Button {
                formaction: Some("/admin/pages/3/publish/".to_string()),
            },
            PreviewControl::Link {
                href: Some("/admin/pages/3/previewish".to_string()),
            },
            PreviewControl::Button {
                formaction: Some("/admin/pages/3/preview/?mode=default".to_string()),
            },
        ];

        let url = from_preview_control(&input(&origin, "/", None, &controls)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/admin/pages/3/preview/?mode=default"
        );
    }

    #[test]
    fn path_inference_applies_when_alone() {
        let origin = origin();
        let url = PreviewResolver::default()
            .resolve_input(&input(&origin, "/admin/pages/7/edit/", None, &[]))
            .unwrap();
        assert_eq!(url.as_str(), "https://cms.example.com/admin/pages/7/preview/");
    }

    #[test]
    fn malformed_candidate_falls_through() {
        let origin = origin();
        let form = FormSnapshot::new("page-edit-form")
            .with_attribute("data-preview-url", "http://[::1");

        let url = PreviewResolver::default()
            .resolve_input(&input(&origin, "/admin/pages/9/edit/", Some(&form), &[]))
            .unwrap();
        assert_eq!(url.path(), "/admin/pages/9/preview/");
    }

    #[test]
    fn non_http_candidates_are_discarded() {
        assert_eq!(normalize(&origin(), "javascript:alert(1)"), None);
        assert_eq!(normalize(&origin(), "   "), None);
        assert_eq!(
            normalize(&origin(), "https://other.example.com/p/").unwrap().host_str(),
            Some("other.example.com")
        );
    }

    #[test]
    fn unresolvable_page_fails() {
        let page = StaticPage::new(origin(), "/admin/pages/")
            .with_form(FormSnapshot::new("page-edit-form"));

        let err = PreviewResolver::default().resolve(&page).unwrap_err();
        assert_eq!(err, PanelError::PreviewEndpointUnresolved);
    }

    #[test]
    fn resolves_from_host_page() {
        let page = StaticPage::new(origin(), "/admin/pages/3/edit/").with_form(
            FormSnapshot::new("page-edit-form").with_attribute("data-preview-url", "/p/3/"),
        );

        let url = PreviewResolver::default().resolve(&page).unwrap();
        assert_eq!(url.as_str(), "https://cms.example.com/p/3/");
    }
}
