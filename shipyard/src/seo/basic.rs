//! Small built-in SEO processor
//!
//! Checks the head of each HTML page for the usual tags, fixes what can be
//! filled in from the request, and writes `sitemap.xml` / `robots.txt`.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::LaunchError;
use crate::models::project::DeployBatch;
use crate::scaffold::templates::escape_html;
use crate::seo::{
    EnhancedHtml, FixedHtml, Generated, IssueKind, SeoAnalysis, SeoContext, SeoFix, SeoIssue,
    SeoProcessor, SitemapOptions,
};

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>\s*[^<\s][^<]*</title>").unwrap());
static EMPTY_TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>\s*</title>").unwrap());
static HTML_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html\b([^>]*)>").unwrap());
static HEAD_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").unwrap());
static H1_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<h1[\s>]").unwrap());
static IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());

const DEFAULT_LANG: &str = "en";

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSeo;

impl BasicSeo {
    pub fn new() -> Self {
        Self
    }
}

fn is_html_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Public route served for an HTML file, `None` for files that are not pages
pub fn route_for(path: &str) -> Option<String> {
    if !is_html_path(path) || path.starts_with("node_modules/") || path.starts_with("dist/") {
        return None;
    }
    let path = path.strip_prefix("public/").unwrap_or(path);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name.starts_with("404") || file_name.starts_with('_') {
        return None;
    }

    let stem = path
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(path);
    if stem == "index" {
        Some("/".to_string())
    } else if let Some(dir) = stem.strip_suffix("/index") {
        Some(format!("/{}/", dir))
    } else {
        Some(format!("/{}", stem))
    }
}

fn has_attr(lower_html: &str, attr: &str, value: &str) -> bool {
    lower_html.contains(&format!("{}=\"{}\"", attr, value))
        || lower_html.contains(&format!("{}='{}'", attr, value))
}

fn has_lang(html: &str) -> bool {
    HTML_OPEN_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .is_some_and(|attrs| attrs.as_str().to_ascii_lowercase().contains("lang="))
}

fn lang_of(ctx: &SeoContext<'_>) -> String {
    ctx.config
        .locale
        .as_deref()
        .map(|l| l.trim().replace('_', "-"))
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

fn title_of<'a>(ctx: &'a SeoContext<'_>) -> &'a str {
    ctx.config
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(ctx.title)
}

fn description_of(ctx: &SeoContext<'_>) -> String {
    ctx.config
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| title_of(ctx).to_string())
}

/// Insert tags at the end of `<head>`, creating the head when there is none
fn insert_into_head(html: &str, snippet: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if let Some(idx) = lower.find("</head>") {
        let line_start = html[..idx].rfind('\n').map(|i| i + 1).unwrap_or(idx);
        let at = if html[line_start..idx].trim().is_empty() {
            line_start
        } else {
            idx
        };
        return format!("{}    {}\n{}", &html[..at], snippet, &html[at..]);
    }
    if let Some(m) = HEAD_OPEN_REGEX.find(html) {
        return format!("{}\n    {}{}", &html[..m.end()], snippet, &html[m.end()..]);
    }
    if let Some(m) = HTML_OPEN_REGEX.find(html) {
        return format!(
            "{}\n  <head>\n    {}\n  </head>{}",
            &html[..m.end()],
            snippet,
            &html[m.end()..]
        );
    }
    format!("{}\n{}", snippet, html)
}

fn site_root(site_url: &str) -> &str {
    site_url.trim_end_matches('/')
}

impl SeoProcessor for BasicSeo {
    fn analyze(&self, batch: &DeployBatch, _ctx: &SeoContext<'_>) -> Result<SeoAnalysis, LaunchError> {
        let mut issues = Vec::new();
        let mut first_page = None;

        for file in batch.files().filter(|f| is_html_path(f.path())) {
            let Some(html) = file.as_text() else {
                continue;
            };
            let path = file.path();
            first_page.get_or_insert(path);
            let lower = html.to_ascii_lowercase();
            let mut flag = |kind: IssueKind, message: &str| {
                issues.push(SeoIssue {
                    kind,
                    path: path.to_string(),
                    message: message.to_string(),
                })
            };

            if !TITLE_REGEX.is_match(html) {
                flag(IssueKind::MissingTitle, "Page has no title");
            }
            if !has_attr(&lower, "name", "description") {
                flag(IssueKind::MissingDescription, "Missing meta description");
            }
            if !has_attr(&lower, "name", "viewport") {
                flag(IssueKind::MissingViewport, "Missing viewport meta tag");
            }
            if !lower.contains("charset=") {
                flag(IssueKind::MissingCharset, "Missing charset declaration");
            }
            if !has_lang(html) {
                flag(IssueKind::MissingLang, "Missing lang attribute on <html>");
            }
            if !has_attr(&lower, "rel", "canonical") {
                flag(IssueKind::MissingCanonical, "Missing canonical link");
            }
            for img in IMG_REGEX.find_iter(html) {
                if !img.as_str().to_ascii_lowercase().contains("alt=") {
                    flag(IssueKind::ImageWithoutAlt, "Image without alt text");
                }
            }
        }

        // Pages are often rendered by script, so any source file may carry the heading
        let has_h1 = batch
            .files()
            .filter_map(|f| f.as_text())
            .any(|text| H1_REGEX.is_match(text));
        if let (Some(path), false) = (first_page, has_h1) {
            issues.push(SeoIssue {
                kind: IssueKind::MissingH1,
                path: path.to_string(),
                message: "No <h1> heading found".to_string(),
            });
        }

        let penalty: u32 = issues.iter().map(|i| u32::from(i.kind.weight())).sum();
        Ok(SeoAnalysis {
            score: 100u32.saturating_sub(penalty) as u8,
            issues,
        })
    }

    fn auto_fixable_issues(&self, analysis: &SeoAnalysis) -> Vec<SeoFix> {
        analysis
            .issues
            .iter()
            .filter(|issue| issue.kind.is_auto_fixable())
            .map(|issue| SeoFix {
                path: issue.path.clone(),
                kind: issue.kind,
            })
            .collect()
    }

    fn apply_fixes(
        &self,
        html: &str,
        fixes: &[SeoFix],
        ctx: &SeoContext<'_>,
    ) -> Result<FixedHtml, LaunchError> {
        let mut html = html.to_string();
        let mut applied = 0;

        for fix in fixes {
            let lower = html.to_ascii_lowercase();
            let fixed = match fix.kind {
                IssueKind::MissingViewport if !has_attr(&lower, "name", "viewport") => {
                    Some(insert_into_head(
                        &html,
                        r#"<meta name="viewport" content="width=device-width, initial-scale=1.0" />"#,
                    ))
                }
                IssueKind::MissingCharset if !lower.contains("charset=") => {
                    Some(insert_into_head(&html, r#"<meta charset="UTF-8" />"#))
                }
                IssueKind::MissingLang if !has_lang(&html) => {
                    let lang = escape_html(&lang_of(ctx));
                    Some(
                        HTML_OPEN_REGEX
                            .replace(&html, |c: &regex::Captures| {
                                format!("<html lang=\"{}\"{}>", lang, &c[1])
                            })
                            .into_owned(),
                    )
                }
                IssueKind::MissingTitle if !TITLE_REGEX.is_match(&html) => {
                    let tag = format!("<title>{}</title>", escape_html(title_of(ctx)));
                    if EMPTY_TITLE_REGEX.is_match(&html) {
                        Some(EMPTY_TITLE_REGEX.replace(&html, regex::NoExpand(&tag)).into_owned())
                    } else {
                        Some(insert_into_head(&html, &tag))
                    }
                }
                IssueKind::MissingDescription if !has_attr(&lower, "name", "description") => {
                    Some(insert_into_head(
                        &html,
                        &format!(
                            r#"<meta name="description" content="{}" />"#,
                            escape_html(&description_of(ctx))
                        ),
                    ))
                }
                IssueKind::MissingCanonical if !has_attr(&lower, "rel", "canonical") => {
                    match (ctx.deploy_url, route_for(&fix.path)) {
                        (Some(url), Some(route)) => Some(insert_into_head(
                            &html,
                            &format!(
                                r#"<link rel="canonical" href="{}{}" />"#,
                                escape_html(site_root(url)),
                                route
                            ),
                        )),
                        _ => None,
                    }
                }
                _ => None,
            };
            if let Some(fixed) = fixed {
                html = fixed;
                applied += 1;
            }
        }

        Ok(FixedHtml { html, applied })
    }

    fn generate_sitemap(
        &self,
        paths: &[&str],
        site_url: &str,
        options: &SitemapOptions,
    ) -> Result<Generated, LaunchError> {
        let mut routes: Vec<String> = Vec::new();
        let extra = options.extra_routes.iter().map(|r| {
            let r = r.trim();
            if r.starts_with('/') {
                r.to_string()
            } else {
                format!("/{}", r)
            }
        });
        for route in paths.iter().filter_map(|p| route_for(p)).chain(extra) {
            if !routes.contains(&route) {
                routes.push(route);
            }
        }

        let root = escape_html(site_root(site_url));
        let lastmod = options.lastmod.format("%Y-%m-%d");
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for route in &routes {
            let priority = if route == "/" { "1.0" } else { "0.8" };
            xml.push_str(&format!(
                "  <url>\n    <loc>{}{}</loc>\n    <lastmod>{}</lastmod>\n    \
                 <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
                root,
                escape_html(route),
                lastmod,
                escape_html(&options.change_frequency),
                priority
            ));
        }
        xml.push_str("</urlset>\n");

        Ok(Generated {
            content: xml,
            count: routes.len(),
        })
    }

    fn generate_robots_txt(&self, site_url: &str, disallow: &[String]) -> Result<Generated, LaunchError> {
        let mut content = String::from("User-agent: *\nAllow: /\n");
        for path in disallow.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            content.push_str(&format!("Disallow: {}\n", path));
        }
        content.push_str(&format!("\nSitemap: {}/sitemap.xml\n", site_root(site_url)));

        let count = content.lines().filter(|l| l.starts_with("Allow") || l.starts_with("Disallow")).count();
        Ok(Generated { content, count })
    }

    fn enhance_html(&self, html: &str, ctx: &SeoContext<'_>) -> Result<EnhancedHtml, LaunchError> {
        let lower = html.to_ascii_lowercase();
        let config = ctx.config;
        let title = title_of(ctx);
        let description = description_of(ctx);
        let image = config.og_image.as_deref().filter(|s| !s.trim().is_empty());

        let mut candidates: Vec<(&str, &str, String)> = vec![
            ("property", "og:title", title.to_string()),
            ("property", "og:description", description.clone()),
            ("property", "og:type", "website".to_string()),
        ];
        if let Some(url) = ctx.deploy_url {
            candidates.push(("property", "og:url", site_root(url).to_string()));
        }
        if let Some(image) = image {
            candidates.push(("property", "og:image", image.to_string()));
        }
        if let Some(site_name) = config.site_name.as_deref() {
            candidates.push(("property", "og:site_name", site_name.to_string()));
        }
        if let Some(locale) = config.locale.as_deref() {
            candidates.push(("property", "og:locale", locale.to_string()));
        }
        let card = if image.is_some() { "summary_large_image" } else { "summary" };
        candidates.push(("name", "twitter:card", card.to_string()));
        if let Some(handle) = config.twitter_handle.as_deref().filter(|h| !h.is_empty()) {
            let handle = if handle.starts_with('@') {
                handle.to_string()
            } else {
                format!("@{}", handle)
            };
            candidates.push(("name", "twitter:site", handle));
        }
        candidates.push(("name", "twitter:title", title.to_string()));
        candidates.push(("name", "twitter:description", description));
        if !config.keywords.is_empty() {
            candidates.push(("name", "keywords", config.keywords.join(", ")));
        }

        let mut tags = Vec::new();
        let mut changes = Vec::new();
        for (attr, name, content) in candidates {
            if has_attr(&lower, attr, name) {
                continue;
            }
            tags.push(format!(
                r#"<meta {}="{}" content="{}" />"#,
                attr,
                name,
                escape_html(&content)
            ));
            changes.push(name.to_string());
        }
        if let Some(url) = ctx.deploy_url {
            if !has_attr(&lower, "rel", "canonical") {
                tags.push(format!(
                    r#"<link rel="canonical" href="{}/" />"#,
                    escape_html(site_root(url))
                ));
                changes.push("canonical".to_string());
            }
        }

        if tags.is_empty() {
            return Ok(EnhancedHtml {
                html: html.to_string(),
                changes,
            });
        }
        Ok(EnhancedHtml {
            html: insert_into_head(html, &tags.join("\n    ")),
            changes,
        })
    }
}
