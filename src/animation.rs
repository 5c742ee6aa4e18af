//! Optional verdict animations.
//!
//! Animations are cosmetic Lottie JSON documents fetched once at startup. A
//! failed fetch yields `None` and the verdict is shown without one.

use serde_json::Value;
use std::time::Duration;

use crate::category::WasteCategory;

pub const BIODEGRADABLE_ANIMATION_URL: &str =
    "https://lottie.host/5a706692-2346-4444-93e5-827299042220/M4lq4iUkwP.json";
pub const NON_BIODEGRADABLE_ANIMATION_URL: &str =
    "https://lottie.host/96230f81-5d97-4089-9e8c-572776c94412/1vVw9bB9tV.json";

/// Fetches an animation document; `None` means "no data".
pub trait AnimationSource {
    fn fetch(&self, url: &str) -> Option<Value>;
}

/// Source that never returns anything (offline runs, tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAnimations;

impl AnimationSource for NoAnimations {
    fn fetch(&self, _url: &str) -> Option<Value> {
        None
    }
}

/// HTTP GET source. Non-200 responses, network errors and invalid JSON all map to `None`.
pub struct HttpAnimationSource {
    #[cfg(feature = "remote-animations")]
    agent: ureq::Agent,
}

impl HttpAnimationSource {
    #[cfg(feature = "remote-animations")]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    #[cfg(not(feature = "remote-animations"))]
    pub fn new(_timeout: Duration) -> Self {
        Self {}
    }
}

impl Default for HttpAnimationSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl AnimationSource for HttpAnimationSource {
    #[cfg(feature = "remote-animations")]
    fn fetch(&self, url: &str) -> Option<Value> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(err) => {
                log::debug!("animation fetch {} failed: {}", url, err);
                return None;
            }
        };
        if response.status() != 200 {
            log::debug!("animation fetch {} returned {}", url, response.status());
            return None;
        }
        match response.into_json::<Value>() {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("animation {} is not JSON: {}", url, err);
                None
            }
        }
    }

    #[cfg(not(feature = "remote-animations"))]
    fn fetch(&self, url: &str) -> Option<Value> {
        log::debug!("remote-animations disabled; skipping {}", url);
        None
    }
}

/// Animations for each verdict kind, loaded once.
#[derive(Clone, Debug, Default)]
pub struct AnimationSet {
    biodegradable: Option<Value>,
    non_biodegradable: Option<Value>,
}

impl AnimationSet {
    pub fn load(
        source: &dyn AnimationSource,
        biodegradable_url: &str,
        non_biodegradable_url: &str,
    ) -> Self {
        Self {
            biodegradable: source.fetch(biodegradable_url),
            non_biodegradable: source.fetch(non_biodegradable_url),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Unknown items share the non-biodegradable animation.
    pub fn for_category(&self, category: WasteCategory) -> Option<&Value> {
        if category.is_biodegradable() {
            self.biodegradable.as_ref()
        } else {
            self.non_biodegradable.as_ref()
        }
    }
}
