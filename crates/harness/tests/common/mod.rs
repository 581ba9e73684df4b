//! In-memory browser engine for harness tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use sitecheck_harness::{
    BoundingBox, ElementHandle, Engine, HarnessConfig, HarnessError, HarnessResult, Page, Selector,
};

pub const BASE_URL: &str = "http://docs.test";

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    /// Selector alternatives this element matches
    pub matches: Vec<String>,
    pub bbox: Option<BoundingBox>,
    pub attrs: HashMap<String, String>,
    /// Element only exists once the page has answered this many queries
    pub appears_after_queries: usize,
}

impl FakeElement {
    pub fn new(matches: &[&str]) -> Self {
        Self {
            matches: matches.iter().map(|s| s.to_string()).collect(),
            bbox: Some(BoundingBox::sized(100.0, 40.0)),
            ..Default::default()
        }
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox::sized(width, height));
        self
    }

    pub fn unlaid(mut self) -> Self {
        self.bbox = None;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn appears_after(mut self, queries: usize) -> Self {
        self.appears_after_queries = queries;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub title: String,
    pub content: String,
    pub elements: Vec<FakeElement>,
    pub globals: HashMap<String, Value>,
    pub goto_delay: Duration,
    /// Every element query stalls this long, like a hung bridge
    pub query_delay: Duration,
}

impl FakeDocument {
    /// Page with a visible primary heading
    pub fn with_heading() -> Self {
        Self {
            title: "AI Tools Collection".to_string(),
            content: "<html><body><h1>Docs</h1></body></html>".to_string(),
            elements: vec![FakeElement::new(&["h1"]).sized(600.0, 40.0)],
            ..Default::default()
        }
    }

    pub fn element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn global(mut self, name: &str, value: Value) -> Self {
        self.globals.insert(name.to_string(), value);
        self
    }

    pub fn goto_delay(mut self, delay: Duration) -> Self {
        self.goto_delay = delay;
        self
    }

    pub fn query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }
}

/// A rendered diagram page: heading, mermaid script and `diagrams` diagrams
/// each with a few shapes
pub fn rendered_diagram_page(diagrams: usize) -> FakeDocument {
    let mut doc = FakeDocument::with_heading()
        .element(FakeElement::new(&["script[src*=\"mermaid\"]"]).unlaid())
        .global("mermaid", serde_json::json!({ "version": "10" }));
    for _ in 0..diagrams {
        doc = doc
            .element(FakeElement::new(&["svg.mermaid", ".mermaid svg"]).sized(640.0, 320.0))
            .element(FakeElement::new(&["svg.mermaid rect", ".mermaid svg rect"]))
            .element(FakeElement::new(&["svg.mermaid path", ".mermaid svg path"]))
            .element(FakeElement::new(&["svg.mermaid text", ".mermaid svg text"]));
    }
    doc
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub evaluations: AtomicUsize,
    pub network_idle_waits: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    pages: Arc<HashMap<String, FakeDocument>>,
    pub counters: Arc<Counters>,
    pub fail_open: bool,
}

impl FakeEngine {
    pub fn new(pages: Vec<(&str, FakeDocument)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(path, doc)| (format!("{}{}", BASE_URL, path), doc))
                    .collect(),
            ),
            counters: Arc::new(Counters::default()),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn page(&self) -> FakePage {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);
        FakePage {
            pages: self.pages.clone(),
            counters: self.counters.clone(),
            current: None,
            url: "about:blank".to_string(),
            queries: 0,
            last_matches: HashMap::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn open(&self) -> HarnessResult<Box<dyn Page>> {
        if self.fail_open {
            return Err(HarnessError::Engine("browser failed to launch".to_string()));
        }
        Ok(Box::new(self.page()))
    }
}

pub struct FakePage {
    pages: Arc<HashMap<String, FakeDocument>>,
    counters: Arc<Counters>,
    current: Option<FakeDocument>,
    url: String,
    queries: usize,
    last_matches: HashMap<String, Vec<usize>>,
    closed: bool,
}

impl FakePage {
    /// Page already showing `doc`, skipping navigation
    pub fn showing(doc: FakeDocument) -> Self {
        let mut page = FakeEngine::default().page();
        page.url = format!("{}/", BASE_URL);
        page.current = Some(doc);
        page
    }

    fn doc(&self) -> HarnessResult<&FakeDocument> {
        self.current
            .as_ref()
            .ok_or_else(|| HarnessError::Engine("no document loaded".to_string()))
    }

    fn element(&self, handle: &ElementHandle) -> HarnessResult<&FakeElement> {
        let index = self
            .last_matches
            .get(handle.css())
            .and_then(|m| m.get(handle.index()).copied())
            .ok_or_else(|| HarnessError::Engine(format!("stale handle {:?}", handle)))?;
        Ok(&self.doc()?.elements[index])
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> HarnessResult<()> {
        let doc = self.pages.get(url).cloned().unwrap_or_default();
        if !doc.goto_delay.is_zero() {
            tokio::time::sleep(doc.goto_delay).await;
        }
        self.url = url.to_string();
        self.current = Some(doc);
        self.queries = 0;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> HarnessResult<()> {
        self.counters.network_idle_waits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&mut self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let delay = self.doc()?.query_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.queries += 1;
        let queries = self.queries;
        let matched: Vec<usize> = self
            .doc()?
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| queries > el.appears_after_queries)
            .filter(|(_, el)| selector.alternatives().iter().any(|alt| el.matches.contains(alt)))
            .map(|(i, _)| i)
            .collect();

        let handles = ElementHandle::for_matches(selector, matched.len());
        self.last_matches.insert(selector.to_css(), matched);
        Ok(handles)
    }

    async fn bounding_box(&mut self, handle: &ElementHandle) -> HarnessResult<Option<BoundingBox>> {
        Ok(self.element(handle)?.bbox)
    }

    async fn attribute(&mut self, handle: &ElementHandle, name: &str) -> HarnessResult<Option<String>> {
        Ok(self.element(handle)?.attrs.get(name).cloned())
    }

    async fn content(&mut self) -> HarnessResult<String> {
        Ok(self.doc()?.content.clone())
    }

    async fn evaluate(&mut self, expression: &str) -> HarnessResult<Value> {
        self.counters.evaluations.fetch_add(1, Ordering::SeqCst);
        let name = expression
            .split("globalThis[")
            .nth(1)
            .and_then(|rest| rest.split(']').next())
            .and_then(|quoted| serde_json::from_str::<String>(quoted).ok())
            .ok_or_else(|| HarnessError::Engine(format!("unsupported expression {}", expression)))?;
        Ok(match self.doc()?.globals.get(&name) {
            None => Value::Null,
            Some(Value::Bool(b)) => Value::Bool(*b),
            Some(Value::Null) => Value::Bool(false),
            Some(_) => Value::Bool(true),
        })
    }

    async fn title(&mut self) -> HarnessResult<String> {
        Ok(self.doc()?.title.clone())
    }

    async fn url(&mut self) -> HarnessResult<String> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        if !self.closed {
            self.closed = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Config pointing at the fake site with a fast poll interval
pub fn config() -> HarnessConfig {
    HarnessConfig {
        base_url: BASE_URL.to_string(),
        poll_interval_ms: 5,
        ..HarnessConfig::default()
    }
}

pub fn sel(alternatives: &[&str]) -> Selector {
    Selector::any_of(alternatives.iter().copied()).unwrap()
}
