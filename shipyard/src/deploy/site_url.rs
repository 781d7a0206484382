//! Site URL resolution for one deployment attempt

use crate::models::deployment::with_scheme;

/// Where the site URL baked into SEO artifacts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteUrlSource {
    CustomDomain,
    Recorded,
    Provisional,
}

/// The site URL chosen before files are finalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrlDecision {
    pub url: String,
    pub source: SiteUrlSource,
    /// Set when the URL is a provisional guess that may not match the live site
    pub used_placeholder: bool,
}

impl SiteUrlDecision {
    /// Custom domain > previously recorded URL > provisional URL
    pub fn resolve(
        custom_domain: Option<&str>,
        recorded_url: Option<&str>,
        provisional_url: &str,
    ) -> Self {
        fn non_blank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(domain) = non_blank(custom_domain) {
            return Self {
                url: with_scheme(domain),
                source: SiteUrlSource::CustomDomain,
                used_placeholder: false,
            };
        }
        if let Some(url) = non_blank(recorded_url) {
            return Self {
                url: with_scheme(url),
                source: SiteUrlSource::Recorded,
                used_placeholder: false,
            };
        }
        Self {
            url: with_scheme(provisional_url),
            source: SiteUrlSource::Provisional,
            used_placeholder: true,
        }
    }

    /// The token to look for when reconciling, if this decision used one
    pub fn placeholder(&self) -> Option<&str> {
        self.used_placeholder.then_some(self.url.as_str())
    }
}
