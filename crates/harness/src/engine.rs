//! Browser engine abstraction
//!
//! The harness never talks to a browser directly. An [`Engine`] hands out
//! isolated [`Page`] sessions and each page answers DOM queries. The shipped
//! implementation lives in [`crate::playwright`]; tests use in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;
use crate::selector::Selector;

/// Opaque reference to one element returned by [`Page::query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    css: String,
    index: usize,
}

impl ElementHandle {
    pub fn new(css: impl Into<String>, index: usize) -> Self {
        Self { css: css.into(), index }
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Handles for the first `count` matches of `selector`
    pub fn for_matches(selector: &Selector, count: usize) -> Vec<ElementHandle> {
        let css = selector.to_css();
        (0..count).map(|index| ElementHandle::new(css.clone(), index)).collect()
    }
}

/// Rendered box of a laid-out element, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn sized(width: f64, height: f64) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Factory for isolated browser contexts
#[async_trait]
pub trait Engine: Send + Sync {
    /// Open a fresh context with its own cookies, history and globals
    async fn open(&self) -> HarnessResult<Box<dyn Page>>;
}

/// One isolated browser context with a single page
#[async_trait]
pub trait Page: Send {
    async fn goto(&mut self, url: &str, timeout: Duration) -> HarnessResult<()>;

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> HarnessResult<()>;

    /// Elements matching any alternative of `selector`, in document order
    async fn query(&mut self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>>;

    /// `None` when the element is not laid out
    async fn bounding_box(&mut self, handle: &ElementHandle) -> HarnessResult<Option<BoundingBox>>;

    async fn attribute(&mut self, handle: &ElementHandle, name: &str) -> HarnessResult<Option<String>>;

    /// Serialized document
    async fn content(&mut self) -> HarnessResult<String>;

    /// Evaluate a JavaScript expression in the page
    async fn evaluate(&mut self, expression: &str) -> HarnessResult<serde_json::Value>;

    async fn title(&mut self) -> HarnessResult<String>;

    async fn url(&mut self) -> HarnessResult<String>;

    /// Tear the context down. Calling it twice is a no-op.
    async fn close(&mut self) -> HarnessResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_css() {
        let sel = Selector::any_of(["svg.mermaid", ".mermaid svg"]).unwrap();
        let handles = ElementHandle::for_matches(&sel, 3);
        assert_eq!(handles.len(), 3);
        assert_eq!(handles[2].css(), "svg.mermaid, .mermaid svg");
        assert_eq!(handles[2].index(), 2);
    }

    #[test]
    fn test_has_area() {
        assert!(BoundingBox::sized(1.0, 1.0).has_area());
        assert!(!BoundingBox::sized(0.0, 100.0).has_area());
    }

    #[test]
    fn test_box_parses_playwright_shape() {
        let b: BoundingBox =
            serde_json::from_str(r#"{"x": 8, "y": 120.5, "width": 640, "height": 320}"#).unwrap();
        assert_eq!(b.width, 640.0);
        assert_eq!(b.y, 120.5);
    }
}
