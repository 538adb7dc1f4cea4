//! Spanish Wikipedia search.

use crate::error::ServiceError;
use reqwest::Client;
use serde::Deserialize;

const WIKIPEDIA_URL: &str = "https://es.wikipedia.org";

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Clone)]
pub struct WikipediaService {
    client: Client,
    base_url: String,
}

impl WikipediaService {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, WIKIPEDIA_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Top three articles for a search term, formatted for chat.
    pub async fn search(&self, term: &str) -> Result<String, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::InvalidArguments("Empty search term".into()));
        }

        let response: SearchResponse = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", term),
                ("utf8", "1"),
                ("srlimit", "3"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.query.search.is_empty() {
            return Ok(format!(
                "No se encontraron resultados en Wikipedia para \"{}\".",
                term
            ));
        }

        let mut reply = format!("Resultados de Wikipedia para *\"{}\"*:\n\n", term);
        for hit in &response.query.search {
            let link = format!(
                "{}/wiki/{}",
                WIKIPEDIA_URL,
                urlencoding::encode(&hit.title.replace(' ', "_"))
            );
            reply.push_str(&format!("*{}*\n", hit.title));
            reply.push_str(&format!("_{}..._\n", clean_snippet(&hit.snippet)));
            reply.push_str(&format!("{}\n\n", link));
        }
        Ok(reply.trim_end().to_string())
    }
}

/// Turn search-match highlights into chat bold and drop any other markup.
fn clean_snippet(snippet: &str) -> String {
    let highlighted = snippet
        .replace("<span class=\"searchmatch\">", "*")
        .replace("</span>", "*");

    let mut clean = String::with_capacity(highlighted.len());
    let mut in_tag = false;
    for c in highlighted.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => clean.push(c),
            _ => {}
        }
    }
    clean.replace("&quot;", "\"").replace("&amp;", "&")
}
