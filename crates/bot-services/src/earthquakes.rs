//! Recent earthquakes in Chile.

use crate::error::ServiceError;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const EARTHQUAKES_URL: &str = "https://api.gael.cloud/general/public/sismos";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Earthquake {
    pub fecha: String,
    pub ref_geografica: String,
    pub magnitud: String,
    #[serde(default)]
    pub escala: String,
    pub profundidad: String,
}

#[derive(Clone)]
pub struct EarthquakeService {
    client: Client,
    url: String,
}

impl EarthquakeService {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, EARTHQUAKES_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn latest(&self, limit: usize) -> Result<Vec<Earthquake>, ServiceError> {
        let mut quakes: Vec<Earthquake> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Fetched {} earthquakes", quakes.len());

        quakes.truncate(limit);
        Ok(quakes)
    }

    /// The last five earthquakes, formatted for chat.
    pub async fn report(&self) -> Result<String, ServiceError> {
        let quakes = self.latest(5).await?;
        if quakes.is_empty() {
            return Ok("🌋 No hay sismos registrados recientemente.".into());
        }

        let mut reply = String::from("🌋 *Los últimos 5 temblores en Chilito:*\n\n");
        for quake in &quakes {
            reply.push_str(&format!("*Fecha:* {}\n", format_date(&quake.fecha)));
            reply.push_str(&format!("*Lugar:* {}\n", quake.ref_geografica));
            reply.push_str(&format!("*Magnitud:* {} {}\n", quake.magnitud, quake.escala));
            reply.push_str(&format!("*Profundidad:* {} km\n\n", quake.profundidad));
        }
        Ok(reply.trim_end().to_string())
    }
}

fn format_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|date| date.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
