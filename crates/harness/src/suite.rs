//! Built-in scenarios for the documentation site
//!
//! Diagram pages are checked for rendered mermaid output: the library script
//! is loaded, at least one diagram container exists and is visible, and the
//! diagram has drawable shapes. Exact per-page diagram counts are not
//! asserted.

use crate::scenario::{Expectation, Scenario};
use crate::selector::Selector;

/// Pages that embed mermaid diagrams
pub const DIAGRAM_PAGES: &[&str] = &[
    "/docs/guides/information-sharing-workflow",
    "/instructions/memory-bank",
    "/docs/explain/llm-information-flow",
];

/// Markers left in the page when a fenced diagram block was never rendered
pub const RAW_DIAGRAM_MARKERS: &[&str] = &["```mermaid", "class=\"language-mermaid\""];

/// Wait for a rendered diagram to become visible
pub const DIAGRAM_VISIBLE_TIMEOUT_MS: u64 = 15_000;

/// Wait for the primary heading
pub const HEADING_VISIBLE_TIMEOUT_MS: u64 = 10_000;

/// Containers produced by the diagram renderer, across its markup versions
pub fn diagram_containers() -> Selector {
    Selector::literals(&["svg.mermaid", "pre.mermaid svg", ".mermaid svg"])
}

/// Drawable shapes inside a rendered diagram
pub fn diagram_shapes() -> Selector {
    Selector::literals(&["svg.mermaid", ".mermaid svg"])
        .descendants(&Selector::literals(&["path", "rect", "text"]))
}

fn diagram_nodes() -> Selector {
    Selector::literals(&["svg.mermaid", ".mermaid svg"]).descendants(&Selector::literals(&[".node", "rect"]))
}

fn diagram_text() -> Selector {
    Selector::literals(&["svg.mermaid", ".mermaid svg"]).descendants(&Selector::literals(&["text"]))
}

fn mermaid_script() -> Selector {
    Selector::literals(&["script[src*=\"mermaid\"]"])
}

fn heading() -> Selector {
    Selector::literals(&["h1"])
}

/// Last path segment, used to name per-page scenarios
fn slug(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Rendered diagrams on one page
pub fn diagram_page(path: &str) -> Scenario {
    Scenario::new(format!("mermaid-renders-{}", slug(path)), path)
        .describe(format!("Mermaid diagrams render on {}", path))
        .tag("mermaid")
        .wait_for_network_idle()
        .expect(Expectation::visible(heading(), HEADING_VISIBLE_TIMEOUT_MS))
        .expect(Expectation::ElementCount {
            selector: mermaid_script(),
            min: 1,
            max: Some(1),
        })
        .expect(Expectation::count_at_least(diagram_containers(), 1))
        .expect(Expectation::first_visible(diagram_containers(), DIAGRAM_VISIBLE_TIMEOUT_MS))
        .expect(Expectation::count_at_least(diagram_shapes(), 1))
}

/// Rendered diagrams have real dimensions and flowchart content
pub fn diagram_styling() -> Scenario {
    let diagrams = Selector::literals(&["svg.mermaid", ".mermaid svg"]);
    Scenario::new("mermaid-diagram-dimensions", DIAGRAM_PAGES[0])
        .describe("Mermaid diagrams are laid out with visible size, nodes and labels")
        .tag("mermaid")
        .wait_for_network_idle()
        .expect(Expectation::first_visible(diagrams.clone(), DIAGRAM_VISIBLE_TIMEOUT_MS))
        .expect(Expectation::BoundingBoxAtLeast {
            selector: diagrams,
            min_width: 50.0,
            min_height: 50.0,
        })
        .expect(Expectation::count_at_least(diagram_nodes(), 1))
        .expect(Expectation::count_at_least(diagram_text(), 1))
}

/// The diagram library initialized on the home page
pub fn library_loaded() -> Scenario {
    Scenario::new("mermaid-library-loaded", "/")
        .describe("The mermaid global is defined on every page")
        .tag("mermaid")
        .tag("smoke")
        .expect(Expectation::global_flag("mermaid"))
}

/// No fenced diagram source is left unrendered on one page
pub fn no_raw_blocks(path: &str) -> Scenario {
    RAW_DIAGRAM_MARKERS.iter().fold(
        Scenario::new(format!("mermaid-no-raw-blocks-{}", slug(path)), path)
            .describe(format!("No unrendered mermaid blocks remain on {}", path))
            .tag("mermaid")
            .wait_for_network_idle(),
        |scenario, marker| scenario.expect(Expectation::text_absent(*marker)),
    )
}

/// Home page title and top-level navigation
pub fn home_navigation() -> Scenario {
    Scenario::new("home-page-navigation", "/")
        .describe("Home page loads and links to the prompts section")
        .tag("site")
        .tag("smoke")
        .expect(Expectation::TitleMatches {
            pattern: "(?i)AI Tools Collection".to_string(),
        })
        .expect(Expectation::LinkTarget {
            selector: Selector::literals(&["a:has-text(\"Prompts\")"]),
            href_pattern: "/prompts/".to_string(),
            optional: false,
        })
}

/// Prompt index links to prompt detail pages when they exist
pub fn prompts_index() -> Scenario {
    Scenario::new("prompts-index", "/prompts/")
        .describe("Prompts index lists prompt pages and links to prompt details")
        .tag("site")
        .expect(Expectation::count_at_least(
            Selector::literals(&["a[href*=\"/prompts/\"]"]),
            1,
        ))
        .expect(Expectation::LinkTarget {
            selector: Selector::literals(&["a:has-text(\"Code Review Assistant\")"]),
            href_pattern: "code-review-assistant".to_string(),
            optional: true,
        })
}

/// Every built-in scenario, in a stable order
pub fn builtin() -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = DIAGRAM_PAGES.iter().map(|p| diagram_page(p)).collect();
    scenarios.push(diagram_styling());
    scenarios.push(library_loaded());
    scenarios.extend(DIAGRAM_PAGES.iter().map(|p| no_raw_blocks(p)));
    scenarios.push(home_navigation());
    scenarios.push(prompts_index());
    scenarios
}
