//! Retrying element locator built on a template matcher

use crate::collaborators::{ElementLocator, LocateError, SearchOptions};
use async_trait::async_trait;
use mp_core::Point;
use tracing::{debug, trace};

/// A template found on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Top-left corner
    pub origin: Point,
    pub width: i32,
    pub height: i32,
}

impl Match {
    pub fn centre(&self) -> Point {
        Point::new(
            self.origin.x + self.width / 2,
            self.origin.y + self.height / 2,
        )
    }
}

/// Image matching backend
pub trait TemplateMatcher: Send + Sync {
    /// Whether the template image can be loaded
    fn has_template(&self, template: &str) -> bool;

    /// Whether the template is visible in the search region around `at`
    fn matches_near(&self, template: &str, at: Point) -> bool;

    /// Best match of the template anywhere on screen
    fn find_on_screen(&self, template: &str) -> Option<Match>;
}

/// [`ElementLocator`] that checks the recorded position a few times, then
/// optionally searches the whole screen
pub struct TemplateLocator<M> {
    matcher: M,
}

impl<M: TemplateMatcher> TemplateLocator<M> {
    pub fn new(matcher: M) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }
}

#[async_trait]
impl<M: TemplateMatcher> ElementLocator for TemplateLocator<M> {
    async fn confirm_or_locate(
        &self,
        template: &str,
        at: Point,
        options: &SearchOptions,
    ) -> Result<Point, LocateError> {
        // Nothing recorded under the click
        if template.is_empty() {
            return Ok(at);
        }
        if !self.matcher.has_template(template) {
            return Err(LocateError::TemplateNotFound(template.to_string()));
        }

        for attempt in 1..=options.attempts {
            if self.matcher.matches_near(template, at) {
                trace!(template, attempt, "Element confirmed at {}", at);
                return Ok(at);
            }
            if attempt < options.attempts {
                tokio::time::sleep(options.backoff).await;
            }
        }

        if !options.full_screen {
            return Err(LocateError::ElementNotFound(template.to_string()));
        }

        match self.matcher.find_on_screen(template) {
            Some(found) => {
                let centre = found.centre();
                debug!(template, "Element moved from {} to {}", at, centre);
                Ok(centre)
            }
            None => Err(LocateError::ElementNotFound(template.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Matches near the recorded position after `misses` failed checks
    struct FakeMatcher {
        misses: u32,
        checks: AtomicU32,
        on_screen: Option<Match>,
    }

    impl FakeMatcher {
        fn new(misses: u32, on_screen: Option<Match>) -> Self {
            Self {
                misses,
                checks: AtomicU32::new(0),
                on_screen,
            }
        }
    }

    impl TemplateMatcher for FakeMatcher {
        fn has_template(&self, template: &str) -> bool {
            template != "missing.png"
        }

        fn matches_near(&self, _template: &str, _at: Point) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst) >= self.misses
        }

        fn find_on_screen(&self, _template: &str) -> Option<Match> {
            self.on_screen
        }
    }

    fn options(attempts: u32, full_screen: bool) -> SearchOptions {
        SearchOptions {
            attempts,
            backoff: Duration::ZERO,
            full_screen,
        }
    }

    #[test]
    fn test_empty_template_confirms() {
        let locator = TemplateLocator::new(FakeMatcher::new(u32::MAX, None));
        let at = Point::new(5, 6);
        let found = tokio_test::block_on(locator.confirm_or_locate("", at, &options(3, true)));
        assert_eq!(found, Ok(at));
        assert_eq!(locator.matcher().checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_template() {
        let locator = TemplateLocator::new(FakeMatcher::new(0, None));
        assert_eq!(
            locator
                .confirm_or_locate("missing.png", Point::new(0, 0), &options(3, true))
                .await,
            Err(LocateError::TemplateNotFound("missing.png".to_string()))
        );
    }

    #[tokio::test]
    async fn test_confirmed_after_retries() {
        let locator = TemplateLocator::new(FakeMatcher::new(2, None));
        let at = Point::new(10, 20);
        assert_eq!(
            locator.confirm_or_locate("ok.png", at, &options(3, false)).await,
            Ok(at)
        );
        assert_eq!(locator.matcher().checks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_without_full_screen() {
        let locator = TemplateLocator::new(FakeMatcher::new(u32::MAX, None));
        assert_eq!(
            locator
                .confirm_or_locate("ok.png", Point::new(1, 1), &options(2, false))
                .await,
            Err(LocateError::ElementNotFound("ok.png".to_string()))
        );
        assert_eq!(locator.matcher().checks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_screen_returns_centre() {
        let found = Match {
            origin: Point::new(100, 200),
            width: 40,
            height: 20,
        };
        let locator = TemplateLocator::new(FakeMatcher::new(u32::MAX, Some(found)));
        assert_eq!(
            locator
                .confirm_or_locate("ok.png", Point::new(1, 1), &options(1, true))
                .await,
            Ok(Point::new(120, 210))
        );
    }

    #[tokio::test]
    async fn test_zero_attempts_goes_straight_to_screen() {
        let locator = TemplateLocator::new(FakeMatcher::new(0, None));
        assert_eq!(
            locator
                .confirm_or_locate("ok.png", Point::new(1, 1), &options(0, true))
                .await,
            Err(LocateError::ElementNotFound("ok.png".to_string()))
        );
        assert_eq!(locator.matcher().checks.load(Ordering::SeqCst), 0);
    }
}
