//! The batch page: one iframe per enabled site.

use std::collections::HashMap;
use std::path::Path;

use chatcast_protocols::{GridLayout, SiteHandlersConfig, UserSettings};
use url::form_urlencoded;
use url::Url;

use crate::error::RouteError;

/// Permissions granted to every site iframe.
const IFRAME_ALLOW: &str = "clipboard-read; clipboard-write; microphone; camera; geolocation; \
autoplay; fullscreen; picture-in-picture; storage-access; web-share; compute-pressure";

/// Render the batch page. `overrides` maps a site name to the URL its iframe
/// should open instead of the site's home page (restored conversations).
pub fn render_batch_page(
    catalog: &SiteHandlersConfig,
    settings: &UserSettings,
    overrides: &HashMap<String, String>,
) -> String {
    let sites = catalog.select(&settings.enabled_sites);
    let columns = match settings.grid_layout {
        GridLayout::SideBySide => sites.len().max(1),
        GridLayout::Grid => usize::from(settings.grid_columns),
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"");
    html.push_str(&escape(&settings.language));
    html.push_str("\">\n<head>\n<meta charset=\"utf-8\">\n<title>chatcast</title>\n<style>\n");
    html.push_str("html, body { margin: 0; height: 100%; }\n");
    html.push_str(&format!(
        "main {{ display: grid; grid-template-columns: repeat({}, 1fr); gap: 4px; height: 100%; }}\n",
        columns
    ));
    html.push_str(".site { display: flex; flex-direction: column; min-height: 0; }\n");
    html.push_str(".site header { font: 12px sans-serif; padding: 2px 6px; }\n");
    html.push_str(".site iframe { flex: 1; border: 0; width: 100%; }\n");
    html.push_str("</style>\n</head>\n");
    html.push_str(&format!(
        "<body data-theme=\"{}\" data-layout=\"{}\">\n<main>\n",
        escape(&settings.theme),
        match settings.grid_layout {
            GridLayout::SideBySide => "side-by-side",
            GridLayout::Grid => "grid",
        }
    ));
    for site in sites {
        let src = overrides.get(&site.name).unwrap_or(&site.url);
        let name = escape(&site.name);
        html.push_str(&format!(
            "<section class=\"site\" data-site=\"{name}\">\n<header>{name}</header>\n\
             <iframe data-site=\"{name}\" src=\"{src}\" allow=\"{allow}\"></iframe>\n</section>\n",
            name = name,
            src = escape(src),
            allow = IFRAME_ALLOW,
        ));
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// `file://` URL of the page at `path`, carrying `query` as `#/?q=<encoded>`.
pub fn batch_page_url(path: &Path, query: Option<&str>) -> Result<String, RouteError> {
    let mut url = Url::from_file_path(path)
        .map_err(|_| RouteError::Failed(format!("Not an absolute path: {}", path.display())))?;
    if let Some(query) = query.filter(|q| !q.trim().is_empty()) {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        url.set_fragment(Some(&format!("/?q={}", encoded)));
    }
    Ok(url.to_string())
}

/// The query carried in a batch page URL, if any.
pub fn query_from_url(url: &str) -> Option<String> {
    let fragment = Url::parse(url).ok()?.fragment()?.to_string();
    let (_, params) = fragment.split_once('?')?;
    form_urlencoded::parse(params.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|q| !q.trim().is_empty())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
