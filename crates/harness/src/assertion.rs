//! Assertion engine
//!
//! Evaluates one [`Expectation`] against the current state of a [`Page`].
//! Every check is read-only. A passing check yields an [`Observation`] with
//! the measured values; a failing one yields the typed [`HarnessError`].

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::{BoundingBox, ElementHandle, Page};
use crate::error::{HarnessError, HarnessResult};
use crate::scenario::Expectation;
use crate::selector::Selector;
use crate::wait::Poller;

/// What a passing expectation measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: String,
    pub detail: String,
}

impl Observation {
    fn new(label: String, detail: impl Into<String>) -> Self {
        Self { label, detail: detail.into() }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.detail)
    }
}

pub type AssertionOutcome = HarnessResult<Observation>;

#[derive(Debug, Clone)]
pub struct AssertionEngine {
    poll_interval: Duration,
}

impl AssertionEngine {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub async fn evaluate(&self, expectation: &Expectation, page: &mut dyn Page) -> AssertionOutcome {
        let label = expectation.label();
        debug!("Evaluating {}", label);

        match expectation {
            Expectation::ElementCount { selector, min, max } => {
                count_elements(label, page, selector, *min, *max).await
            }
            Expectation::Visible { selector, timeout_ms, first } => {
                self.wait_visible(label, page, selector, *timeout_ms, *first).await
            }
            Expectation::BoundingBoxAtLeast { selector, min_width, min_height } => {
                box_at_least(label, page, selector, *min_width, *min_height).await
            }
            Expectation::TextAbsent { pattern } => text_absent(label, page, pattern).await,
            Expectation::GlobalFlagTrue { flag } => global_flag(label, page, flag).await,
            Expectation::TitleMatches { pattern } => {
                let title = page.title().await?;
                matches_pattern(label, pattern, &title, "title")
            }
            Expectation::UrlMatches { pattern } => {
                let url = page.url().await?;
                matches_pattern(label, pattern, &url, "url")
            }
            Expectation::LinkTarget { selector, href_pattern, optional } => {
                link_target(label, page, selector, href_pattern, *optional).await
            }
        }
    }

    async fn wait_visible(
        &self,
        label: String,
        page: &mut dyn Page,
        selector: &Selector,
        timeout_ms: u64,
        first: bool,
    ) -> AssertionOutcome {
        let mut poller = Poller::new(Duration::from_millis(timeout_ms), self.poll_interval);
        loop {
            if let Some((handle, bbox)) = find_laid_out(page, selector, first).await? {
                return Ok(Observation::new(
                    label,
                    format!(
                        "element #{} visible at {}x{} after {} ms",
                        handle.index(),
                        bbox.width,
                        bbox.height,
                        poller.elapsed().as_millis()
                    ),
                ));
            }
            if !poller.tick().await {
                return Err(HarnessError::VisibilityTimeout {
                    selector: selector.to_string(),
                    timeout_ms,
                });
            }
        }
    }
}

/// First element matching `selector` that has a non-zero rendered box.
/// With `first_only`, the first match is the only candidate.
pub(crate) async fn find_laid_out(
    page: &mut dyn Page,
    selector: &Selector,
    first_only: bool,
) -> HarnessResult<Option<(ElementHandle, BoundingBox)>> {
    let mut handles = page.query(selector).await?;
    if first_only {
        handles.truncate(1);
    }
    for handle in handles {
        if let Some(bbox) = page.bounding_box(&handle).await? {
            if bbox.has_area() {
                return Ok(Some((handle, bbox)));
            }
        }
    }
    Ok(None)
}

async fn count_elements(
    label: String,
    page: &mut dyn Page,
    selector: &Selector,
    min: usize,
    max: Option<usize>,
) -> AssertionOutcome {
    let count = page.query(selector).await?.len();

    let too_many = max.map_or(false, |max| count > max);
    if count < min || too_many {
        let expected = match max {
            Some(max) => format!("between {} and {}", min, max),
            None => format!(">= {}", min),
        };
        return Err(HarnessError::mismatch(
            label,
            expected,
            format!("found {} matching elements", count),
        ));
    }

    Ok(Observation::new(
        label,
        format!("found {} element(s) matching {}", count, selector),
    ))
}

async fn box_at_least(
    label: String,
    page: &mut dyn Page,
    selector: &Selector,
    min_width: f64,
    min_height: f64,
) -> AssertionOutcome {
    let expected = format!("at least {}x{}", min_width, min_height);
    let handles = page.query(selector).await?;
    let Some(first) = handles.first() else {
        return Err(HarnessError::mismatch(
            label,
            expected,
            format!("no element matching {}", selector),
        ));
    };

    let Some(bbox) = page.bounding_box(first).await? else {
        return Err(HarnessError::mismatch(label, expected, "element is not laid out"));
    };

    if bbox.width < min_width || bbox.height < min_height {
        return Err(HarnessError::mismatch(
            label,
            expected,
            format!("measured {}x{}", bbox.width, bbox.height),
        ));
    }

    Ok(Observation::new(
        label,
        format!("measured {}x{}", bbox.width, bbox.height),
    ))
}

async fn text_absent(label: String, page: &mut dyn Page, pattern: &str) -> AssertionOutcome {
    let content = page.content().await?;
    let occurrences = content.matches(pattern).count();
    if occurrences > 0 {
        return Err(HarnessError::mismatch(
            label,
            "no occurrence in page content",
            format!("found {} occurrence(s)", occurrences),
        ));
    }
    Ok(Observation::new(
        label,
        format!("absent from {} bytes of content", content.len()),
    ))
}

async fn global_flag(label: String, page: &mut dyn Page, flag: &str) -> AssertionOutcome {
    let expression = format!(
        "(() => {{ const v = globalThis[{}]; return v === undefined ? null : Boolean(v); }})()",
        serde_json::to_string(flag)?
    );
    let value = page.evaluate(&expression).await?;

    if value.is_null() {
        return Err(HarnessError::EnvironmentError {
            flag: flag.to_string(),
            reason: "not defined".to_string(),
        });
    }
    if !truthy(&value) {
        return Err(HarnessError::EnvironmentError {
            flag: flag.to_string(),
            reason: "falsy".to_string(),
        });
    }
    Ok(Observation::new(label, "defined and truthy"))
}

/// JavaScript truthiness of a JSON value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn compile(label: &str, pattern: &str) -> HarnessResult<Regex> {
    Regex::new(pattern).map_err(|e| HarnessError::InvalidScenario {
        name: label.to_string(),
        reason: e.to_string(),
    })
}

fn matches_pattern(label: String, pattern: &str, actual: &str, what: &str) -> AssertionOutcome {
    let re = compile(&label, pattern)?;
    if !re.is_match(actual) {
        return Err(HarnessError::mismatch(
            label,
            format!("{} matching /{}/", what, pattern),
            format!("{} was '{}'", what, actual),
        ));
    }
    Ok(Observation::new(label, format!("{} '{}'", what, actual)))
}

async fn link_target(
    label: String,
    page: &mut dyn Page,
    selector: &Selector,
    href_pattern: &str,
    optional: bool,
) -> AssertionOutcome {
    let re = compile(&label, href_pattern)?;
    let handles = page.query(selector).await?;
    let Some(first) = handles.first() else {
        if optional {
            return Ok(Observation::new(label, "no matching link (optional)"));
        }
        return Err(HarnessError::mismatch(
            label,
            format!("a link matching {}", selector),
            "found 0 matching elements",
        ));
    };

    let href = page.attribute(first, "href").await?;
    match href {
        Some(href) if re.is_match(&href) => Ok(Observation::new(label, format!("href '{}'", href))),
        Some(href) => Err(HarnessError::mismatch(
            label,
            format!("href matching /{}/", href_pattern),
            format!("href was '{}'", href),
        )),
        None => Err(HarnessError::mismatch(
            label,
            format!("href matching /{}/", href_pattern),
            "link has no href",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness_follows_javascript() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!({})));
        assert!(truthy(&json!([])));
    }

    #[test]
    fn test_pattern_mismatch_reports_actual() {
        let err = matches_pattern("title:x".into(), "(?i)ai tools collection", "Home", "title")
            .unwrap_err();
        assert!(err.to_string().contains("title was 'Home'"));

        let ok = matches_pattern("title:x".into(), "(?i)ai tools collection", "AI Tools Collection", "title")
            .unwrap();
        assert_eq!(ok.detail, "title 'AI Tools Collection'");
    }
}
