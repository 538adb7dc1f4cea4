//! External lookups used by bot commands.
//!
//! Each service owns a `reqwest::Client` clone and a base URL that tests
//! point at a mock server.

mod error;
pub mod earthquakes;
pub mod network;
pub mod outages;
pub mod pharmacies;
pub mod scripts;
pub mod search;
pub mod weather;
pub mod wikipedia;

pub use earthquakes::{Earthquake, EarthquakeService};
pub use error::ServiceError;
pub use network::NetworkService;
pub use outages::OutageService;
pub use pharmacies::{Pharmacy, PharmacyService};
pub use scripts::{script_error, ScriptRunner};
pub use search::{NewsService, SearchResult, WebSearchService};
pub use weather::WeatherService;
pub use wikipedia::WikipediaService;
