use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;

use super::stack::LayerKind;
use crate::story::{LayerContent, Narrative, ObjectResolver};

pub const NO_CONTENT_HTML: &str = "<p>No content available.</p>";

/// A glossary term referenced from panel HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryLink {
    pub term_id: String,
    pub label: String,
}

/// Title and HTML body of one panel layer, plus the glossary terms it links to
#[derive(Debug, Clone, PartialEq)]
pub struct PanelContent {
    pub title: String,
    pub html: String,
    pub glossary_links: Vec<GlossaryLink>,
}

impl PanelContent {
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            title: title.into(),
            glossary_links: glossary_links(&html),
            html,
        }
    }

    pub fn placeholder(kind: LayerKind) -> Self {
        Self {
            title: kind.default_title().to_string(),
            html: NO_CONTENT_HTML.to_string(),
            glossary_links: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.html == NO_CONTENT_HTML
    }
}

/// Resolve what a panel shows. Never fails: unknown ids get the placeholder.
pub fn resolve_panel_content(
    narrative: &Narrative,
    resolver: &dyn ObjectResolver,
    kind: LayerKind,
    content_id: &str,
) -> PanelContent {
    let content = match kind {
        LayerKind::Primary => primary(narrative, resolver, content_id),
        LayerKind::Secondary => narrative.step_by_content_id(content_id).map(|step| {
            let layer = step.layer2.as_ref();
            PanelContent::new(
                layer
                    .and_then(|l| l.title.clone())
                    .unwrap_or_else(|| kind.default_title().to_string()),
                format_layer(layer, resolver),
            )
        }),
        LayerKind::Glossary => narrative.glossary_term(content_id).map(|term| {
            let title = if term.title.trim().is_empty() {
                kind.default_title().to_string()
            } else {
                term.title.clone()
            };
            PanelContent::new(
                title,
                glossary_html(term.short_definition.as_deref(), term.definition.as_deref()),
            )
        }),
    };

    content.unwrap_or_else(|| {
        warn!(panel = kind.panel_id(), content = %content_id, "No panel content found");
        PanelContent::placeholder(kind)
    })
}

fn primary(narrative: &Narrative, resolver: &dyn ObjectResolver, content_id: &str) -> Option<PanelContent> {
    let step = narrative.step_by_content_id(content_id)?;
    let layer = step.layer1.as_ref();
    let mut html = format_layer(layer, resolver);

    if let Some(deeper) = step
        .layer2
        .as_ref()
        .filter(|l| l.title.is_some() || l.text.is_some())
    {
        let label = deeper.button_label.as_deref().unwrap_or("Go deeper");
        html.push_str(&format!(
            "<p><button class=\"panel-trigger\" data-panel=\"layer2\" data-step=\"{}\">{} →</button></p>",
            step.content_id, label
        ));
    }

    Some(PanelContent::new(
        layer
            .and_then(|l| l.title.clone())
            .unwrap_or_else(|| LayerKind::Primary.default_title().to_string()),
        html,
    ))
}

fn format_layer(layer: Option<&LayerContent>, resolver: &dyn ObjectResolver) -> String {
    let Some(layer) = layer else {
        return NO_CONTENT_HTML.to_string();
    };

    let mut html = String::new();
    if let Some(text) = &layer.text {
        html.push_str(&fix_image_urls(text, resolver));
    }
    if let Some(media) = &layer.media_url {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"Panel image\" class=\"img-fluid\">",
            resolver.site_url(media)
        ));
    }

    if html.is_empty() {
        NO_CONTENT_HTML.to_string()
    } else {
        html
    }
}

fn glossary_html(short: Option<&str>, definition: Option<&str>) -> String {
    let mut html = String::new();
    if let Some(short) = short.map(str::trim).filter(|s| !s.is_empty()) {
        html.push_str(&format!("<p><em>{}</em></p>", short));
    }
    if let Some(definition) = definition.map(str::trim).filter(|s| !s.is_empty()) {
        if definition.starts_with('<') {
            html.push_str(definition);
        } else {
            html.push_str(&format!("<p>{}</p>", definition));
        }
    }
    if html.is_empty() {
        NO_CONTENT_HTML.to_string()
    } else {
        html
    }
}

/// Prefix site-relative `<img src>` paths with the site base path
fn fix_image_urls(html: &str, resolver: &dyn ObjectResolver) -> String {
    static IMG_SRC: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = IMG_SRC.get_or_init(|| Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*")([^"]*)(")"#).ok());

    match pattern {
        Some(re) => re
            .replace_all(html, |caps: &Captures| {
                format!("{}{}{}", &caps[1], resolver.site_url(&caps[2]), &caps[3])
            })
            .into_owned(),
        None => html.to_string(),
    }
}

/// Collect `<a class="glossary-term-link">` targets in document order, deduplicated.
///
/// The term id comes from `data-term-id`, or else the last path segment of `data-term-url`.
pub fn glossary_links(html: &str) -> Vec<GlossaryLink> {
    static ANCHOR: OnceLock<Option<Regex>> = OnceLock::new();
    static ATTR: OnceLock<Option<Regex>> = OnceLock::new();
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();

    let anchor = ANCHOR.get_or_init(|| Regex::new(r#"(?is)<a\b([^>]*)>(.*?)</a\s*>"#).ok());
    let attr = ATTR.get_or_init(|| Regex::new(r#"(?i)([a-z][a-z0-9-]*)\s*=\s*"([^"]*)""#).ok());
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").ok());
    let (Some(anchor), Some(attr), Some(tag)) = (anchor, attr, tag) else {
        return Vec::new();
    };

    let mut links: Vec<GlossaryLink> = Vec::new();
    for caps in anchor.captures_iter(html) {
        let mut is_term = false;
        let mut term_id = None;
        let mut term_url = None;
        for a in attr.captures_iter(&caps[1]) {
            match a[1].to_ascii_lowercase().as_str() {
                "class" => is_term = a[2].split_whitespace().any(|c| c == "glossary-term-link"),
                "data-term-id" => term_id = Some(a[2].trim().to_string()),
                "data-term-url" => term_url = Some(a[2].to_string()),
                _ => {}
            }
        }
        if !is_term {
            continue;
        }

        let term_id = term_id
            .filter(|id| !id.is_empty())
            .or_else(|| term_url.as_deref().and_then(term_from_url));
        let Some(term_id) = term_id else {
            warn!("Glossary link without a term id");
            continue;
        };
        if links.iter().any(|l| l.term_id == term_id) {
            continue;
        }

        let label = tag.replace_all(&caps[2], "").trim().to_string();
        links.push(GlossaryLink {
            label: if label.is_empty() { term_id.clone() } else { label },
            term_id,
        });
    }
    links
}

fn term_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .map(|s| s.trim_end_matches(".html").to_string())
        .filter(|s| !s.is_empty())
}
