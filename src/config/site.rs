//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in petur.toml - site metadata.
///
/// # Example
/// ```toml
/// [site]
/// title = "My Notes"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Title of the home index page.
    #[serde(default = "defaults::site::title")]
    #[educe(Default = defaults::site::title())]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_site_title() {
        let config: SiteConfig = toml::from_str("[site]\ntitle = \"Notes\"").unwrap();
        assert_eq!(config.site.title, "Notes");
    }

    #[test]
    fn test_site_defaults() {
        let config: SiteConfig = toml::from_str("[site]").unwrap();
        assert_eq!(config.site.title, "փետուր");
    }
}
