//! Power outage figures published by the electricity regulator (SEC).

use crate::error::ServiceError;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const SEC_URL: &str = "https://apps.sec.cl/INTONLINEv1/ClientesAfectados";

/// Regions above this many affected clients get a warning marker.
const HIGH_IMPACT: u64 = 1000;

#[derive(Debug, Deserialize)]
struct ServerTime {
    #[serde(rename = "FECHA")]
    fecha: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
struct TimeQuery {
    anho: u32,
    mes: u32,
    dia: u32,
    hora: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutageEntry {
    #[serde(rename = "NOMBRE_REGION")]
    pub region: String,
    #[serde(rename = "NOMBRE_COMUNA")]
    pub commune: String,
    #[serde(rename = "CLIENTES_AFECTADOS")]
    pub affected: u64,
}

#[derive(Clone)]
pub struct OutageService {
    client: Client,
    base_url: String,
    offset: FixedOffset,
}

impl OutageService {
    pub fn new(client: Client, offset: FixedOffset) -> Self {
        Self::with_base_url(client, SEC_URL, offset)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            offset,
        }
    }

    /// Server clock as `(year, month, day, hour)`; the data endpoint is keyed by it.
    async fn server_time(&self) -> Result<TimeQuery, ServiceError> {
        let times: Vec<ServerTime> = self
            .client
            .post(format!("{}/GetHoraServer", self.base_url))
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        times
            .first()
            .and_then(|t| parse_server_time(&t.fecha))
            .ok_or_else(|| ServiceError::ExternalService("SEC returned no server time".into()))
    }

    pub async fn affected(&self) -> Result<Vec<OutageEntry>, ServiceError> {
        let time = self.server_time().await?;
        debug!(?time, "Fetching SEC outage data");

        let entries = self
            .client
            .post(format!("{}/GetPorFecha", self.base_url))
            .json(&time)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries)
    }

    /// Nationwide summary, or per-commune detail when `region` is given.
    pub async fn report(&self, region: Option<&str>) -> Result<String, ServiceError> {
        let entries = self.affected().await?;
        let now = Utc::now().with_timezone(&self.offset);
        Ok(format_report(&entries, region, now))
    }
}

fn parse_server_time(raw: &str) -> Option<TimeQuery> {
    let (date, time) = raw.trim().split_once(' ')?;
    let mut date = date.split(['-', '/']);
    let dia = date.next()?.parse().ok()?;
    let mes = date.next()?.parse().ok()?;
    let anho = date.next()?.parse().ok()?;
    let hora = time.split(':').next()?.parse().ok()?;
    Some(TimeQuery {
        anho,
        mes,
        dia,
        hora,
    })
}

/// Group digits with dots, Chilean style.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

fn format_report(
    entries: &[OutageEntry],
    region: Option<&str>,
    now: DateTime<FixedOffset>,
) -> String {
    let total: u64 = entries.iter().map(|e| e.affected).sum();

    match region {
        Some(filter) => {
            let mut communes: BTreeMap<&str, u64> = BTreeMap::new();
            let mut region_name = None;
            for entry in entries
                .iter()
                .filter(|e| e.region.to_lowercase() == filter.to_lowercase())
            {
                region_name.get_or_insert(entry.region.as_str());
                *communes.entry(entry.commune.as_str()).or_default() += entry.affected;
            }

            let Some(region_name) = region_name else {
                return format!(
                    "No se encontraron datos para la región especificada: *{}*.",
                    filter
                );
            };

            let region_total: u64 = communes.values().sum();
            let mut sorted: Vec<_> = communes.into_iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1));

            let mut message = format!(
                "💡 *Detalle para la Región {}*\nTotal Regional: *{}* afectados.\n\n",
                region_name,
                format_thousands(region_total)
            );
            for (commune, clients) in sorted {
                message.push_str(&format!(
                    "- *{}:* {} clientes\n",
                    commune,
                    format_thousands(clients)
                ));
            }
            message.trim_end().to_string()
        }
        None => {
            let mut regions: BTreeMap<&str, u64> = BTreeMap::new();
            for entry in entries {
                *regions.entry(entry.region.as_str()).or_default() += entry.affected;
            }
            let mut sorted: Vec<_> = regions.into_iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1));

            let mut message = format!(
                "💡🇨🇱 *Clientes Sin Suministro Eléctrico*\nTotal Nacional: *{}* afectados.\n_{}_\n\n📍 *Detalle por Región:*\n",
                format_thousands(total),
                now.format("%d-%m-%Y %H:%M")
            );
            for (region, clients) in sorted {
                let marker = if clients > HIGH_IMPACT { "⚠️ " } else { "" };
                message.push_str(&format!(
                    "- {}*{}:* {} clientes\n",
                    marker,
                    region,
                    format_thousands(clients)
                ));
            }
            message.trim_end().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn santiago() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn entry(region: &str, commune: &str, affected: u64) -> OutageEntry {
        OutageEntry {
            region: region.into(),
            commune: commune.into(),
            affected,
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1.000");
        assert_eq!(format_thousands(1234567), "1.234.567");
    }

    #[test]
    fn test_parse_server_time() {
        let time = parse_server_time("05/03/2024 14:07").unwrap();
        assert_eq!(
            time,
            TimeQuery {
                anho: 2024,
                mes: 3,
                dia: 5,
                hora: 14
            }
        );
        assert!(parse_server_time("ayer").is_none());
    }

    #[test]
    fn test_national_report_sorted_by_region() {
        let entries = vec![
            entry("Maule", "Talca", 300),
            entry("Metropolitana", "Maipú", 1500),
            entry("Metropolitana", "Ñuñoa", 200),
        ];
        let now = santiago().with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();

        let report = format_report(&entries, None, now);

        assert!(report.contains("Total Nacional: *2.000* afectados."));
        assert!(report.contains("_05-03-2024 14:07_"));
        let metro = report.find("⚠️ *Metropolitana:* 1.700 clientes").unwrap();
        let maule = report.find("- *Maule:* 300 clientes").unwrap();
        assert!(metro < maule);
    }

    #[test]
    fn test_region_report() {
        let entries = vec![
            entry("Metropolitana", "Ñuñoa", 200),
            entry("Metropolitana", "Maipú", 1500),
            entry("Maule", "Talca", 300),
        ];
        let now = santiago().with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();

        let report = format_report(&entries, Some("metropolitana"), now);

        assert!(report.starts_with("💡 *Detalle para la Región Metropolitana*"));
        assert!(report.contains("Total Regional: *1.700* afectados."));
        assert!(!report.contains("Talca"));
        assert!(report.find("Maipú").unwrap() < report.find("Ñuñoa").unwrap());
    }

    #[test]
    fn test_unknown_region() {
        let now = santiago().with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let report = format_report(&[entry("Maule", "Talca", 1)], Some("Atacama"), now);
        assert_eq!(
            report,
            "No se encontraron datos para la región especificada: *Atacama*."
        );
    }

    #[tokio::test]
    async fn test_report_queries_by_server_time() {
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
            .and(body_json(serde_json::json!({
                "anho": 2024, "mes": 3, "dia": 5, "hora": 14
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "NOMBRE_REGION": "Biobío", "NOMBRE_COMUNA": "Concepción", "CLIENTES_AFECTADOS": 42 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let service = OutageService::with_base_url(Client::new(), server.uri(), santiago());
        let report = service.report(None).await.unwrap();

        assert!(report.contains("- *Biobío:* 42 clientes"));
    }
}
