//! Network lookups: WHOIS, DNS and IP geolocation.

use crate::error::ServiceError;
use futures::future::join;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

const IANA_WHOIS: &str = "whois.iana.org";
const NIC_CL_WHOIS: &str = "whois.nic.cl";
const GEOIP_URL: &str = "http://ip-api.com";

/// Fields pulled out of a generic WHOIS response.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WhoisRecord {
    pub domain_name: String,
    pub registrar: String,
    pub creation_date: String,
    pub updated_date: String,
    pub expiry_date: String,
    pub name_servers: Vec<String>,
    pub status: Vec<String>,
}

/// Fields pulled out of a NIC Chile WHOIS response.
#[derive(Debug, Clone, PartialEq)]
pub struct NicClRecord {
    pub holder: String,
    pub registrar: String,
    pub creation_date: String,
    pub expiry_date: String,
    pub name_servers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    status: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(rename = "regionName", default)]
    region_name: String,
    #[serde(default)]
    isp: String,
}

#[derive(Clone)]
pub struct NetworkService {
    client: Client,
    whois_root: String,
    nic_cl_server: String,
    whois_port: u16,
    geoip_url: String,
    timeout: Duration,
}

impl NetworkService {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            whois_root: IANA_WHOIS.into(),
            nic_cl_server: NIC_CL_WHOIS.into(),
            whois_port: 43,
            geoip_url: GEOIP_URL.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Point WHOIS queries at other servers (both generic and `.cl`).
    pub fn with_whois_servers(
        mut self,
        root: impl Into<String>,
        nic_cl: impl Into<String>,
        port: u16,
    ) -> Self {
        self.whois_root = root.into();
        self.nic_cl_server = nic_cl.into();
        self.whois_port = port;
        self
    }

    pub fn with_geoip_url(mut self, url: impl Into<String>) -> Self {
        self.geoip_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Raw WHOIS query against one server.
    #[instrument(skip(self))]
    pub async fn whois_raw(&self, server: &str, query: &str) -> Result<String, ServiceError> {
        let secs = self.timeout.as_secs();
        let exchange = async {
            let mut stream = TcpStream::connect((server, self.whois_port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };

        let bytes = timeout(self.timeout, exchange)
            .await
            .map_err(|_| ServiceError::Timeout(secs))??;

        // NIC Chile answers in Latin-1; fall back to a byte-wise decode when
        // the payload is not valid UTF-8.
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
        })
    }

    /// Generic WHOIS: ask the root server, then follow its `refer:` line.
    pub async fn whois(&self, query: &str) -> Result<WhoisRecord, ServiceError> {
        let root = self.whois_raw(&self.whois_root, query).await?;
        let raw = match referral(&root) {
            Some(server) if server != self.whois_root => {
                debug!(server = %server, "Following WHOIS referral");
                self.whois_raw(&server, query).await?
            }
            _ => root,
        };
        Ok(parse_whois(&raw))
    }

    /// WHOIS against NIC Chile. `None` when the domain is not registered.
    pub async fn nic_cl(&self, domain: &str) -> Result<Option<NicClRecord>, ServiceError> {
        let raw = self.whois_raw(&self.nic_cl_server, domain).await?;
        if raw.contains("no existe") {
            return Ok(None);
        }
        Ok(Some(parse_nic_cl(&raw)))
    }

    /// IPv4 addresses of a host name.
    pub async fn resolve_ipv4(&self, host: &str) -> Vec<IpAddr> {
        match timeout(self.timeout, lookup_host((host, 0))).await {
            Ok(Ok(addrs)) => {
                let mut ips: Vec<IpAddr> = addrs
                    .map(|a| a.ip())
                    .filter(IpAddr::is_ipv4)
                    .collect();
                ips.dedup();
                ips
            }
            Ok(Err(e)) => {
                debug!(host = %host, "DNS lookup failed: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!(host = %host, "DNS lookup timed out");
                Vec::new()
            }
        }
    }

    /// Geolocation section for an IP, formatted for chat.
    pub async fn geolocate(&self, ip: IpAddr) -> String {
        let url = format!("{}/json/{}", self.geoip_url, ip);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r.json::<GeoIpResponse>().await,
            Err(e) => Err(e),
        };

        match response {
            Ok(geo) if geo.status == "success" => format!(
                "*📍 Geolocalización (IP: {})*\n- *País:* {}\n- *Ciudad:* {}, {}\n- *Proveedor:* {}",
                ip, geo.country, geo.city, geo.region_name, geo.isp
            ),
            Ok(_) => "*📍 Geolocalización*\n- No se pudo obtener la información.".into(),
            Err(e) => {
                warn!("GeoIP lookup failed: {}", e);
                "*📍 Geolocalización*\n- Error al consultar el servicio.".into()
            }
        }
    }

    /// Full network report for a domain or IP, formatted for chat.
    pub async fn report(&self, query: &str) -> Result<String, ServiceError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(ServiceError::InvalidArguments("Empty query".into()));
        }

        if query.ends_with(".cl") {
            return Ok(match self.nic_cl(&query).await {
                Ok(Some(record)) => format_nic_cl(&query, &record),
                Ok(None) => format!(
                    "El dominio *{}* no se encuentra registrado en NIC Chile.",
                    query
                ),
                Err(e) => {
                    warn!("NIC Chile lookup failed: {}", e);
                    format!(
                        "No se pudo encontrar información para *{}*. El servidor de NIC.cl podría no estar disponible.",
                        query
                    )
                }
            });
        }

        let literal_ip = query.parse::<IpAddr>().ok();
        let (whois, ips) = join(self.whois(&query), async {
            match literal_ip {
                Some(ip) => vec![ip],
                None => self.resolve_ipv4(&query).await,
            }
        })
        .await;

        let whois_section = match whois {
            Ok(record) => format_whois(&record),
            Err(e) => {
                debug!("WHOIS failed: {}", e);
                "*📄 Info WHOIS*\n- No se encontró información de registro.".into()
            }
        };

        let dns_section = if literal_ip.is_some() {
            None
        } else if ips.is_empty() {
            Some("*DNS Records*\n- No se encontraron registros DNS.".to_string())
        } else {
            let list: Vec<String> = ips.iter().map(ToString::to_string).collect();
            Some(format!("*DNS Records*\n- *A (IPv4):* `{}`", list.join(", ")))
        };

        let mut reply = format!("*🔎 Análisis de Red para \"{}\"*\n{}", query, whois_section);
        if let Some(dns) = dns_section {
            reply.push_str("\n\n");
            reply.push_str(&dns);
        }
        if let Some(ip) = ips.first() {
            reply.push_str("\n\n");
            reply.push_str(&self.geolocate(*ip).await);
        }
        Ok(reply)
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Server named in a `refer:` / `whois:` line of an IANA answer.
pub fn referral(raw: &str) -> Option<String> {
    raw.lines()
        .filter_map(key_value)
        .find(|(key, value)| {
            (key.eq_ignore_ascii_case("refer") || key.eq_ignore_ascii_case("whois"))
                && !value.is_empty()
        })
        .map(|(_, value)| value.to_string())
}

pub fn parse_whois(raw: &str) -> WhoisRecord {
    let mut record = WhoisRecord::default();
    for (key, value) in raw.lines().filter_map(key_value) {
        let key = key.to_lowercase();
        if key.contains("domain name") && record.domain_name.is_empty() {
            record.domain_name = value.to_string();
        } else if key.contains("registrar") && !key.contains("url") && !key.contains("whois")
            && !key.contains("abuse") && !key.contains("iana") && record.registrar.is_empty()
        {
            record.registrar = value.to_string();
        } else if key.contains("creation date") {
            record.creation_date = value.to_string();
        } else if key.contains("updated date") {
            record.updated_date = value.to_string();
        } else if key.contains("expiry date") || key.contains("expiration date") {
            record.expiry_date = value.to_string();
        } else if key.contains("name server") && !value.is_empty() {
            record.name_servers.push(value.to_lowercase());
        } else if key.contains("domain status") {
            if let Some(status) = value.split_whitespace().next() {
                record.status.push(status.to_string());
            }
        }
    }
    record
}

pub fn parse_nic_cl(raw: &str) -> NicClRecord {
    let unknown = || "No disponible".to_string();
    let mut record = NicClRecord {
        holder: unknown(),
        registrar: unknown(),
        creation_date: unknown(),
        expiry_date: unknown(),
        name_servers: Vec::new(),
    };
    for (key, value) in raw.lines().filter_map(key_value) {
        match key {
            "Titular" => record.holder = value.to_string(),
            "Agente Registrador" => record.registrar = value.to_string(),
            "Fecha de creación" => record.creation_date = value.to_string(),
            "Fecha de expiración" => record.expiry_date = value.to_string(),
            k if k.starts_with("Servidor de Nombre") => record.name_servers.push(value.to_string()),
            _ => {}
        }
    }
    record
}

fn format_whois(record: &WhoisRecord) -> String {
    if record.domain_name.is_empty() {
        return "*📄 Info WHOIS*\n- No se encontró información de registro.".into();
    }
    let servers: Vec<String> = record
        .name_servers
        .iter()
        .map(|ns| format!("  - `{}`", ns))
        .collect();
    format!(
        "*📄 Info WHOIS*\n- *Dominio:* {}\n- *Registrador:* {}\n- *Creado:* {}\n- *Expira:* {}\n- *Estado:* {}\n- *Servidores de Nombre (NS):*\n{}",
        record.domain_name,
        record.registrar,
        record.creation_date,
        record.expiry_date,
        record.status.join(", "),
        servers.join("\n")
    )
}

fn format_nic_cl(domain: &str, record: &NicClRecord) -> String {
    let servers: Vec<String> = record
        .name_servers
        .iter()
        .map(|ns| format!("- `{}`", ns))
        .collect();
    format!(
        "*🇨🇱 Información de NIC Chile para \"{}\"*\n\n- *Titular:* {}\n- *Registrador:* {}\n- *Fecha de Creación:* {}\n- *Fecha de Expiración:* {}\n\n*Servidores de Nombre (NS):*\n{}",
        domain,
        record.holder,
        record.registrar,
        record.creation_date,
        record.expiry_date,
        servers.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VERISIGN_SAMPLE: &str = "   Domain Name: EXAMPLE.COM\r\n\
   Registrar WHOIS Server: whois.iana.org\r\n\
   Updated Date: 2024-08-14T07:01:34Z\r\n\
   Creation Date: 1995-08-14T04:00:00Z\r\n\
   Registry Expiry Date: 2025-08-13T04:00:00Z\r\n\
   Registrar: RESERVED-Internet Assigned Numbers Authority\r\n\
   Registrar IANA ID: 376\r\n\
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited\r\n\
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited\r\n\
   Name Server: A.IANA-SERVERS.NET\r\n\
   Name Server: B.IANA-SERVERS.NET\r\n";

    const NIC_CL_SAMPLE: &str = "%%\n\
Nombre de dominio: ejemplo.cl\n\
Titular: Empresa Ejemplo SpA\n\
Agente Registrador: NIC Chile\n\
Fecha de creación: 2001-05-10 12:00:00 CLST\n\
Fecha de expiración: 2026-05-10 12:00:00 CLST\n\
Servidor de Nombre: ns1.ejemplo.cl\n\
Servidor de Nombre: ns2.ejemplo.cl\n";

    /// Serve one canned WHOIS answer per connection.
    async fn whois_server(answer: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 256];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(answer.as_bytes()).await;
            }
        });
        port
    }

    #[test]
    fn test_parse_whois() {
        let record = parse_whois(VERISIGN_SAMPLE);

        assert_eq!(record.domain_name, "EXAMPLE.COM");
        assert_eq!(record.registrar, "RESERVED-Internet Assigned Numbers Authority");
        assert_eq!(record.creation_date, "1995-08-14T04:00:00Z");
        assert_eq!(record.expiry_date, "2025-08-13T04:00:00Z");
        assert_eq!(record.name_servers, vec!["a.iana-servers.net", "b.iana-servers.net"]);
        assert_eq!(
            record.status,
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
    }

    #[test]
    fn test_referral() {
        let iana = "domain:       COM\n\nrefer:        whois.verisign-grs.com\n";
        assert_eq!(referral(iana), Some("whois.verisign-grs.com".into()));
        assert_eq!(referral("% no match\n"), None);
    }

    #[test]
    fn test_parse_nic_cl() {
        let record = parse_nic_cl(NIC_CL_SAMPLE);

        assert_eq!(record.holder, "Empresa Ejemplo SpA");
        assert_eq!(record.registrar, "NIC Chile");
        assert_eq!(record.creation_date, "2001-05-10 12:00:00 CLST");
        assert_eq!(record.name_servers, vec!["ns1.ejemplo.cl", "ns2.ejemplo.cl"]);
    }

    #[tokio::test]
    async fn test_report_nic_cl() {
        let port = whois_server(NIC_CL_SAMPLE).await;
        let service =
            NetworkService::new(Client::new()).with_whois_servers("127.0.0.1", "127.0.0.1", port);

        let report = service.report("Ejemplo.cl").await.unwrap();

        assert!(report.starts_with("*🇨🇱 Información de NIC Chile para \"ejemplo.cl\"*"));
        assert!(report.contains("- *Titular:* Empresa Ejemplo SpA"));
        assert!(report.contains("- `ns2.ejemplo.cl`"));
    }

    #[tokio::test]
    async fn test_report_nic_cl_unregistered() {
        let port = whois_server("%%\nejemplo.cl: no existe\n").await;
        let service =
            NetworkService::new(Client::new()).with_whois_servers("127.0.0.1", "127.0.0.1", port);

        let report = service.report("ejemplo.cl").await.unwrap();

        assert_eq!(
            report,
            "El dominio *ejemplo.cl* no se encuentra registrado en NIC Chile."
        );
    }

    #[tokio::test]
    async fn test_report_ip_with_geolocation() {
        let port = whois_server(VERISIGN_SAMPLE).await;
        let geo = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "country": "United States",
                "city": "Ashburn",
                "regionName": "Virginia",
                "isp": "Google LLC"
            })))
            .mount(&geo)
            .await;

        let service = NetworkService::new(Client::new())
            .with_whois_servers("127.0.0.1", "127.0.0.1", port)
            .with_geoip_url(geo.uri());

        let report = service.report("8.8.8.8").await.unwrap();

        assert!(report.contains("*📄 Info WHOIS*"));
        assert!(report.contains("*📍 Geolocalización (IP: 8.8.8.8)*"));
        assert!(report.contains("- *Proveedor:* Google LLC"));
        assert!(!report.contains("*DNS Records*"));
    }

    #[tokio::test]
    async fn test_report_empty_query() {
        let service = NetworkService::new(Client::new());
        assert!(matches!(
            service.report(" ").await,
            Err(ServiceError::InvalidArguments(_))
        ));
    }
}
