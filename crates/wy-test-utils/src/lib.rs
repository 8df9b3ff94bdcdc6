//! Testing utilities for the wy workspace
//!
//! Shared fixtures: scripted pipeline stages and a ready-made edit page.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wy_core::{
    AnalysisEngine, AssessmentResult, CategorizedResultSet, Category, ContentSnapshot,
    ElementSnapshot, EngineConfig, FormSnapshot, HostPage, PanelError, PreviewSource, StaticPage,
    Url,
};

pub const ORIGIN: &str = "https://cms.example.com";
pub const EDIT_PATH: &str = "/admin/pages/3/edit/";

#[derive(Debug)]
struct Step<T> {
    delay: Duration,
    outcome: Result<T, PanelError>,
}

/// Queued replies, then a fallback reply once the queue is empty
#[derive(Debug)]
struct Script<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    fallback: T,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(fallback: T) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, delay: Duration, outcome: Result<T, PanelError>) {
        self.steps.lock().push_back(Step { delay, outcome });
    }

    async fn next(&self) -> Result<T, PanelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().pop_front();
        match step {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.outcome
            }
            None => Ok(self.fallback.clone()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Analysis engine replaying scripted result sets
#[derive(Debug)]
pub struct ScriptedEngine {
    script: Script<CategorizedResultSet>,
    initialized: AtomicUsize,
    snapshots: Mutex<Vec<ContentSnapshot>>,
}

impl ScriptedEngine {
    /// Engine answering every analysis with `results`
    pub fn new(results: CategorizedResultSet) -> Self {
        Self {
            script: Script::new(results),
            initialized: AtomicUsize::new(0),
            snapshots: Mutex::new(Vec::new()),
        }
    }

    pub fn then_respond(self, results: CategorizedResultSet) -> Self {
        self.script.push(Duration::ZERO, Ok(results));
        self
    }

    pub fn then_respond_after(self, delay: Duration, results: CategorizedResultSet) -> Self {
        self.script.push(delay, Ok(results));
        self
    }

    pub fn then_fail(self, error: PanelError) -> Self {
        self.script.push(Duration::ZERO, Err(error));
        self
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.script.calls()
    }

    /// Snapshots analyzed so far, in call order
    pub fn snapshots(&self) -> Vec<ContentSnapshot> {
        self.snapshots.lock().clone()
    }
}

#[async_trait]
impl AnalysisEngine for ScriptedEngine {
    async fn initialize(&self, _config: &EngineConfig) -> Result<(), PanelError> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn analyze(
        &self,
        snapshot: &ContentSnapshot,
    ) -> Result<CategorizedResultSet, PanelError> {
        self.snapshots.lock().push(snapshot.clone());
        self.script.next().await
    }
}

/// Preview source replaying scripted HTML
#[derive(Debug)]
pub struct ScriptedPreview {
    script: Script<String>,
}

impl ScriptedPreview {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            script: Script::new(html.into()),
        }
    }

    pub fn then_html_after(self, delay: Duration, html: impl Into<String>) -> Self {
        self.script.push(delay, Ok(html.into()));
        self
    }

    pub fn then_fail(self, error: PanelError) -> Self {
        self.script.push(Duration::ZERO, Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl PreviewSource for ScriptedPreview {
    async fn fetch(&self, _page: &dyn HostPage) -> Result<String, PanelError> {
        self.script.next().await
    }
}

/// Result set with the given readability and discoverability results
pub fn results(
    readability: Vec<AssessmentResult>,
    discoverability: Vec<AssessmentResult>,
) -> CategorizedResultSet {
    CategorizedResultSet::new()
        .with(Category::Readability, readability)
        .with(Category::Discoverability, discoverability)
}

/// A page edit view with the panel, its fields, and both result regions
pub fn edit_page() -> StaticPage {
    let origin = Url::parse(ORIGIN).unwrap();
    panel_elements(bare_edit_page(origin, EDIT_PATH))
}

/// Edit page without the panel
pub fn bare_edit_page(origin: Url, path: &str) -> StaticPage {
    StaticPage::new(origin, path)
        .with_cookies("sessionid=s1; csrftoken=t1")
        .with_form(
            FormSnapshot::new("page-edit-form")
                .with_field("title", "Hello world")
                .with_field("search_description", "A first post")
                .with_field("slug", "hello-world"),
        )
        .with_element(ElementSnapshot::new("id_title").with_value("Hello world"))
        .with_element(ElementSnapshot::new("id_search_description").with_value("A first post"))
        .with_element(ElementSnapshot::new("id_slug").with_value("hello-world"))
}

/// Add the panel region, its field controls and result regions
pub fn panel_elements(page: StaticPage) -> StaticPage {
    page.with_element(ElementSnapshot::new("yoast_panel"))
        .with_element(ElementSnapshot::new("yoast_keywords").within("yoast_panel"))
        .with_element(
            ElementSnapshot::new("yoast_title")
                .within("yoast_panel")
                .with_attribute("data-field", "title"),
        )
        .with_element(
            ElementSnapshot::new("yoast_search_description")
                .within("yoast_panel")
                .with_attribute("data-field", "search_description"),
        )
        .with_element(
            ElementSnapshot::new("yoast_slug")
                .within("yoast_panel")
                .with_attribute("data-field", "slug"),
        )
        .with_region("yoast_results_readability")
        .with_region("yoast_results_seo")
}
