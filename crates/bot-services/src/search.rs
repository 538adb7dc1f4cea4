//! National news headlines and web search, both scraped from HTML pages.

use crate::error::ServiceError;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

const NEWS_URL: &str = "http://chile.infoflow.cloud/p.php/infoflow2017/noticias-nacionales";
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Results shown per search.
const MAX_RESULTS: usize = 5;

/// Chat messages past this size get cut at a line boundary.
const MAX_NEWS_CHARS: usize = 4000;

fn selector(css: &str) -> Result<Selector, ServiceError> {
    Selector::parse(css)
        .map_err(|e| ServiceError::ExternalService(format!("bad selector {}: {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone)]
pub struct NewsService {
    client: Client,
    url: String,
}

impl NewsService {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, NEWS_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Latest national headlines, formatted for chat.
    pub async fn latest(&self) -> Result<String, ServiceError> {
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let news = page_text(&html)?;
        if news.is_empty() {
            return Err(ServiceError::ExternalService("news page had no text".into()));
        }
        Ok(format!("📰 *Noticias Nacionales - Última Hora:*\n\n{}", news))
    }
}

/// Visible body text with markup leftovers removed and blank runs collapsed.
fn page_text(html: &str) -> Result<String, ServiceError> {
    let document = Html::parse_document(html);
    let body_selector = selector("body")?;
    let Some(body) = document.select(&body_selector).next() else {
        return Ok(String::new());
    };

    let mut raw = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
            .unwrap_or(false);
        if !hidden {
            raw.push_str(text);
        }
    }

    let cleaned = raw.replace("editor-card", "");
    let mut lines: Vec<&str> = Vec::new();
    for line in cleaned.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }

    let mut text = String::new();
    for line in lines {
        if text.len() + line.len() + 1 > MAX_NEWS_CHARS {
            break;
        }
        text.push_str(line);
        text.push('\n');
    }
    Ok(text.trim_end().to_string())
}

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Clone)]
pub struct WebSearchService {
    client: Client,
    url: String,
}

impl WebSearchService {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, SEARCH_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Top results for `query`, formatted for chat.
    pub async fn search(&self, query: &str) -> Result<String, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidArguments("Empty search query".into()));
        }

        let html = self
            .client
            .get(&self.url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_results(&html)?;
        if results.is_empty() {
            return Ok(format!("No se encontraron resultados para *\"{}\"*.", query));
        }

        let mut reply = format!("Resultados de búsqueda para *\"{}\"*:\n\n", query);
        for (i, result) in results.iter().enumerate() {
            reply.push_str(&format!("*{}. {}*\n", i + 1, result.title));
            reply.push_str(&format!("_{}_\n", result.snippet));
            reply.push_str(&format!("{}\n\n", result.link));
        }
        Ok(reply.trim_end().to_string())
    }
}

fn parse_results(html: &str) -> Result<Vec<SearchResult>, ServiceError> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result")?;
    let title_selector = selector(".result__title a")?;
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let results = document
        .select(&result_selector)
        .filter_map(|result| {
            let title = element_text(result.select(&title_selector).next()?);
            let href = result.select(&link_selector).next()?.value().attr("href")?;
            let snippet = element_text(result.select(&snippet_selector).next()?);
            if title.is_empty() || href.is_empty() || snippet.is_empty() {
                return None;
            }
            Some(SearchResult {
                title,
                link: target_link(href),
                snippet,
            })
        })
        .take(MAX_RESULTS)
        .collect();
    Ok(results)
}

/// Unwrap DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn target_link(href: &str) -> String {
    let target = href
        .split_once('?')
        .map(|(_, query)| query)
        .into_iter()
        .flat_map(|query| query.split('&'))
        .find_map(|pair| pair.strip_prefix("uddg="))
        .and_then(|encoded| urlencoding::decode(encoded).ok());

    match target {
        Some(target) => target.into_owned(),
        None if href.starts_with("//") => format!("https:{}", href),
        None => href.to_string(),
    }
}
