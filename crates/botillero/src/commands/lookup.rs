//! Commands backed by HTTP and network lookups.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::platform::CommandContext;
use async_trait::async_trait;
use bot_services::{
    EarthquakeService, NetworkService, NewsService, OutageService, PharmacyService,
    ServiceError, WeatherService, WebSearchService, WikipediaService,
};
use tracing::warn;

pub struct WeatherHandler {
    service: WeatherService,
}

impl WeatherHandler {
    pub fn new(service: WeatherService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for WeatherHandler {
    fn name(&self) -> &str {
        "clima"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let city = ctx.message.args_text();
        if city.is_empty() {
            return Ok("Ya po, dime la ciudad. Ej: `!clima arica`".into());
        }

        match self.service.report(&city).await {
            Ok(report) => Ok(Reply::Text(report)),
            Err(ServiceError::ExternalService(_)) => Ok(Reply::Text(format!(
                "No encontré la ciudad \"{}\". ¿La escribiste bien?",
                city
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct EarthquakeHandler {
    service: EarthquakeService,
}

impl EarthquakeHandler {
    pub fn new(service: EarthquakeService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for EarthquakeHandler {
    fn name(&self) -> &str {
        "sismos"
    }

    async fn execute(&self, _ctx: &CommandContext) -> AppResult<Reply> {
        Ok(Reply::Text(self.service.report().await?))
    }
}

pub struct PharmacyHandler {
    service: PharmacyService,
}

impl PharmacyHandler {
    pub fn new(service: PharmacyService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for PharmacyHandler {
    fn name(&self) -> &str {
        "far"
    }

    fn shows_loading(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let commune = ctx.message.args_text();
        if commune.is_empty() {
            return Ok("Pone la comuna po, wn. Ej: `!far santiago`".into());
        }
        Ok(Reply::Text(self.service.report(&commune).await?))
    }
}

pub struct WikiHandler {
    service: WikipediaService,
}

impl WikiHandler {
    pub fn new(service: WikipediaService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for WikiHandler {
    fn name(&self) -> &str {
        "wiki"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let term = ctx.message.args_text();
        if term.is_empty() {
            return Ok("Dime qué buscar. Ej: `!wiki Arturo Prat`".into());
        }
        Ok(Reply::Text(self.service.search(&term).await?))
    }
}

/// `!noticias`: national headlines.
pub struct NewsHandler {
    service: NewsService,
}

impl NewsHandler {
    pub fn new(service: NewsService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for NewsHandler {
    fn name(&self) -> &str {
        "noticias"
    }

    fn shows_loading(&self) -> bool {
        true
    }

    async fn execute(&self, _ctx: &CommandContext) -> AppResult<Reply> {
        match self.service.latest().await {
            Ok(news) => Ok(Reply::Text(news)),
            Err(e) => {
                warn!("News lookup failed: {}", e);
                Ok("Lo siento, no pude obtener las noticias en este momento.".into())
            }
        }
    }
}

/// `!g`: web search.
pub struct WebSearchHandler {
    service: WebSearchService,
}

impl WebSearchHandler {
    pub fn new(service: WebSearchService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for WebSearchHandler {
    fn name(&self) -> &str {
        "g"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let query = ctx.message.args_text();
        if query.is_empty() {
            return Ok("Escribe algo para buscar. Ej: `!g gatitos`".into());
        }
        match self.service.search(&query).await {
            Ok(results) => Ok(Reply::Text(results)),
            Err(e) => {
                warn!("Web search failed: {}", e);
                Ok("Hubo un error al buscar en internet.".into())
            }
        }
    }
}

pub struct NetworkHandler {
    service: NetworkService,
}

impl NetworkHandler {
    pub fn new(service: NetworkService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for NetworkHandler {
    fn name(&self) -> &str {
        "net"
    }

    fn aliases(&self) -> &[&'static str] {
        &["whois", "nic"]
    }

    fn shows_loading(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let Some(target) = ctx.message.args.first() else {
            return Ok("Indica un dominio o IP. Ej: `!net google.com`".into());
        };
        Ok(Reply::Text(self.service.report(target).await?))
    }
}

/// `!sec [región]` and `!secrm` (Metropolitana).
pub struct OutageHandler {
    service: OutageService,
}

impl OutageHandler {
    pub fn new(service: OutageService) -> Self {
        Self { service }
    }

    fn region(ctx: &CommandContext) -> Option<String> {
        if ctx.message.command.as_deref() == Some("secrm") {
            return Some("Metropolitana".into());
        }
        Some(ctx.message.args_text()).filter(|r| !r.is_empty())
    }
}

#[async_trait]
impl CommandHandler for OutageHandler {
    fn name(&self) -> &str {
        "sec"
    }

    fn aliases(&self) -> &[&'static str] {
        &["secrm"]
    }

    fn shows_loading(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let region = Self::region(ctx);
        Ok(Reply::Text(self.service.report(region.as_deref()).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MockChatTransport, NormalizedMessage};
    use chrono::FixedOffset;
    use reqwest::Client;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx(text: &str) -> CommandContext {
        CommandContext::new(
            NormalizedMessage::from_text("120363@g.us", text),
            Arc::new(MockChatTransport::new()),
        )
    }

    #[tokio::test]
    async fn test_usage_replies_without_arguments() {
        let http = Client::new();
        let cases: Vec<(Box<dyn CommandHandler>, &str)> = vec![
            (Box::new(WeatherHandler::new(WeatherService::new(http.clone()))), "!clima"),
            (Box::new(PharmacyHandler::new(PharmacyService::new(http.clone()))), "!far"),
            (Box::new(WikiHandler::new(WikipediaService::new(http.clone()))), "!wiki"),
            (Box::new(WebSearchHandler::new(WebSearchService::new(http.clone()))), "!g"),
            (Box::new(NetworkHandler::new(NetworkService::new(http))), "!net"),
        ];

        for (handler, text) in cases {
            match handler.execute(&ctx(text)).await.unwrap() {
                Reply::Text(usage) => assert!(usage.contains("Ej"), "{}: {}", text, usage),
                Reply::Handled => panic!("{} should reply with usage", text),
            }
        }
    }

    #[tokio::test]
    async fn test_weather_unknown_city_is_friendly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let service = WeatherService::with_base_urls(Client::new(), server.uri(), server.uri());
        let reply = WeatherHandler::new(service)
            .execute(&ctx("!clima Macondo"))
            .await
            .unwrap();

        assert_eq!(
            reply,
            Reply::Text("No encontré la ciudad \"Macondo\". ¿La escribiste bien?".into())
        );
    }

    #[tokio::test]
    async fn test_earthquake_upstream_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = EarthquakeService::with_url(Client::new(), server.uri());
        assert!(EarthquakeHandler::new(service)
            .execute(&ctx("!sismos"))
            .await
            .is_err());
    }

    #[test]
    fn test_outage_region() {
        assert_eq!(OutageHandler::region(&ctx("!secrm")).as_deref(), Some("Metropolitana"));
        assert_eq!(OutageHandler::region(&ctx("!sec Los Lagos")).as_deref(), Some("Los Lagos"));
        assert_eq!(OutageHandler::region(&ctx("!sec")), None);
    }

    #[tokio::test]
    async fn test_secrm_filters_metropolitana() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/GetHoraServer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "FECHA": "05/03/2024 14:07" }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/GetPorFecha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "NOMBRE_REGION": "Metropolitana", "NOMBRE_COMUNA": "Maipú", "CLIENTES_AFECTADOS": 1200 },
                { "NOMBRE_REGION": "Maule", "NOMBRE_COMUNA": "Talca", "CLIENTES_AFECTADOS": 5 }
            ])))
            .mount(&server)
            .await;

        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let service = OutageService::with_base_url(Client::new(), server.uri(), offset);
        let reply = OutageHandler::new(service)
            .execute(&ctx("!secrm"))
            .await
            .unwrap();

        match reply {
            Reply::Text(text) => {
                assert!(text.contains("Región Metropolitana"));
                assert!(text.contains("- *Maipú:* 1.200 clientes"));
                assert!(!text.contains("Talca"));
            }
            Reply::Handled => panic!("expected a text reply"),
        }
    }

    #[tokio::test]
    async fn test_news_failure_is_friendly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let handler = NewsHandler::new(NewsService::with_url(Client::new(), server.uri()));
        assert!(handler.shows_loading());
        let reply = handler.execute(&ctx("!noticias")).await.unwrap();

        assert_eq!(
            reply,
            Reply::Text("Lo siento, no pude obtener las noticias en este momento.".into())
        );
    }

    #[tokio::test]
    async fn test_web_search_passes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "empanadas de pino"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="result"><h2 class="result__title"><a class="result__a" href="https://pino.cl/">Receta</a></h2><a class="result__snippet">Con pasas.</a></div>"#,
            ))
            .mount(&server)
            .await;

        let service = WebSearchService::with_url(Client::new(), server.uri());
        let reply = WebSearchHandler::new(service)
            .execute(&ctx("!g empanadas de pino"))
            .await
            .unwrap();

        assert_eq!(
            reply,
            Reply::Text(
                "Resultados de búsqueda para *\"empanadas de pino\"*:\n\n*1. Receta*\n_Con pasas._\nhttps://pino.cl/"
                    .into()
            )
        );
    }
}
