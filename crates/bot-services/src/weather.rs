//! Weather lookup using Open-Meteo (free, no API key required).

use crate::error::ServiceError;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
const FORECAST_URL: &str = "https://api.open-meteo.com";

/// Weather service backed by Open-Meteo.
#[derive(Clone)]
pub struct WeatherService {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

#[derive(Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

#[derive(Deserialize)]
struct WeatherResponse {
    current_weather: CurrentWeather,
    daily: Option<DailyForecast>,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Deserialize)]
struct DailyForecast {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

impl WeatherService {
    pub fn new(client: Client) -> Self {
        Self::with_base_urls(client, GEOCODING_URL, FORECAST_URL)
    }

    pub fn with_base_urls(
        client: Client,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    fn weather_code_to_description(code: i32) -> &'static str {
        match code {
            0 => "Despejado",
            1..=3 => "Parcialmente nublado",
            45 | 48 => "Neblina",
            51 | 53 | 55 => "Llovizna",
            61 | 63 | 65 => "Lluvia",
            66 | 67 => "Lluvia helada",
            71 | 73 | 75 => "Nieve",
            77 => "Granizo fino",
            80..=82 => "Chubascos",
            85 | 86 => "Chubascos de nieve",
            95 => "Tormenta eléctrica",
            96 | 99 => "Tormenta con granizo",
            _ => "Desconocido",
        }
    }

    /// Current conditions and today's forecast for a city, formatted for chat.
    pub async fn report(&self, location: &str) -> Result<String, ServiceError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ServiceError::InvalidArguments("Empty location".into()));
        }

        // Step 1: Geocode the location
        debug!(location = %location, "Geocoding location");
        let geocode_url = format!(
            "{}/v1/search?name={}&count=1&language=es&format=json",
            self.geocoding_url,
            urlencoding::encode(location)
        );

        let geo_response: GeocodingResponse = self
            .client
            .get(&geocode_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let geo = geo_response
            .results
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| {
                ServiceError::ExternalService(format!("Location '{}' not found", location))
            })?;

        // Step 2: Get weather data
        debug!(lat = geo.latitude, lon = geo.longitude, "Fetching weather");
        let weather_url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current_weather=true\
             &daily=temperature_2m_max,temperature_2m_min,precipitation_probability_max\
             &timezone=auto&forecast_days=1",
            self.forecast_url, geo.latitude, geo.longitude
        );

        let weather: WeatherResponse = self
            .client
            .get(&weather_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let location_name = match (&geo.admin1, &geo.country) {
            (Some(admin), Some(country)) => format!("{}, {}, {}", geo.name, admin, country),
            (None, Some(country)) => format!("{}, {}", geo.name, country),
            _ => geo.name,
        };

        let current = &weather.current_weather;
        let mut reply = format!(
            "🌤️ *El tiempo en {}*\n\n- *Ahora mismo:* {:.1}°C, {}\n- *Viento:* {:.1} km/h",
            location_name,
            current.temperature,
            Self::weather_code_to_description(current.weathercode),
            current.windspeed
        );

        if let Some(daily) = &weather.daily {
            let first = |values: &[Option<f64>]| values.first().copied().flatten();
            if let (Some(max), Some(min)) = (
                first(&daily.temperature_2m_max),
                first(&daily.temperature_2m_min),
            ) {
                reply.push_str(&format!("\n\n- *Hoy (Máx/Mín):* {:.1}°C / {:.1}°C", max, min));
            }
            if let Some(rain) = first(&daily.precipitation_probability_max) {
                reply.push_str(&format!("\n- *¿Llueve?:* {:.0}% de prob.", rain));
            }
        }

        Ok(reply)
    }
}
