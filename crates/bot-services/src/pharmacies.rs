//! Pharmacies on duty, from the Ministry of Health open data.

use crate::error::ServiceError;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const PHARMACIES_URL: &str = "https://midas.minsal.cl/farmacia_v2/WS/getLocalesTurnos.php";

#[derive(Debug, Clone, Deserialize)]
pub struct Pharmacy {
    pub local_nombre: String,
    pub comuna_nombre: String,
    pub local_direccion: String,
    #[serde(default)]
    pub funcionamiento_hora_apertura: String,
    #[serde(default)]
    pub funcionamiento_hora_cierre: String,
}

#[derive(Clone)]
pub struct PharmacyService {
    client: Client,
    url: String,
}

impl PharmacyService {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, PHARMACIES_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Pharmacies on duty whose commune contains `commune` (case-insensitive).
    pub async fn on_duty(&self, commune: &str) -> Result<Vec<Pharmacy>, ServiceError> {
        let commune = commune.trim().to_lowercase();
        if commune.is_empty() {
            return Err(ServiceError::InvalidArguments("Empty commune".into()));
        }

        let pharmacies: Vec<Pharmacy> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Fetched {} pharmacies on duty", pharmacies.len());

        Ok(pharmacies
            .into_iter()
            .filter(|p| p.comuna_nombre.to_lowercase().contains(&commune))
            .collect())
    }

    /// Up to five pharmacies on duty in a commune, formatted for chat.
    pub async fn report(&self, commune: &str) -> Result<String, ServiceError> {
        let found = self.on_duty(commune).await?;
        let commune = commune.trim();

        if found.is_empty() {
            return Ok(format!("No pillé farmacias de turno en {}, compa.", commune));
        }

        let mut reply = format!(
            "🏥 Estas son las farmacias de turno que pillé en *{}*:\n\n",
            capitalize(commune)
        );
        for pharmacy in found.iter().take(5) {
            reply.push_str(&format!("*{}*\n", pharmacy.local_nombre.trim()));
            reply.push_str(&format!("Dirección: {}\n", pharmacy.local_direccion.trim()));
            reply.push_str(&format!(
                "Horario: {} a {}\n\n",
                pharmacy.funcionamiento_hora_apertura, pharmacy.funcionamiento_hora_cierre
            ));
        }
        Ok(reply.trim_end().to_string())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
