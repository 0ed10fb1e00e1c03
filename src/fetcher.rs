//! Search API client: one query per poll cycle for today's freshest event

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::io::HttpClient;

/// Credentials for the search backend, held only while a session is active
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Inclusive UTC range covering the current calendar day
pub fn day_window() -> (String, String) {
    let today = Utc::now().date_naive();
    let gte = format!("{}T00:00:00.000Z", today.format("%Y-%m-%d"));
    let lte = format!("{}T23:59:59.005Z", today.format("%Y-%m-%d"));
    (gte, lte)
}

/// The search body: newest matching document only, with flattened field
/// projections so the qualifier can read first-element values.
fn build_query(term: &str, gte: &str, lte: &str) -> Value {
    json!({
        "sort": [
            {"@timestamp": {"order": "desc", "format": "strict_date_optional_time", "unmapped_type": "boolean"}},
            {"_doc": {"order": "desc", "unmapped_type": "boolean"}}
        ],
        "track_total_hits": true,
        "fields": [
            {"field": "*", "include_unmapped": "true"},
            {"field": "@timestamp", "format": "strict_date_optional_time"},
            {"field": "notification.data.modifierDate", "format": "strict_date_optional_time"},
            {"field": "notification.transition.end", "format": "strict_date_optional_time"},
            {"field": "notification.transition.start", "format": "strict_date_optional_time"},
            {"field": "sheetData.modifierDate", "format": "strict_date_optional_time"}
        ],
        "size": 1,
        "version": true,
        "_source": false,
        "query": {
            "bool": {
                "must": [{"query_string": {"query": term, "analyze_wildcard": true, "time_zone": "Europe/Berlin"}}],
                "filter": [{
                    "range": {
                        "@timestamp": {
                            "format": "strict_date_optional_time",
                            "gte": gte,
                            "lte": lte
                        }
                    }
                }]
            }
        }
    })
}

/// Client for the log-search API
pub struct LogFetcher {
    url: String,
    query: String,
    headers: Vec<(String, String)>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for LogFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFetcher")
            .field("url", &self.url)
            .field("query", &self.query)
            .finish()
    }
}

impl LogFetcher {
    pub fn new(settings: &Settings, http: Arc<dyn HttpClient>) -> Self {
        let headers = vec![
            ("Host".to_string(), settings.host.clone()),
            ("kbn-xsrf".to_string(), "true".to_string()),
            ("Content-Type".to_string(), settings.content_type.clone()),
            ("Accept".to_string(), "*/*".to_string()),
            ("Accept-Encoding".to_string(), "gzip, deflate, br".to_string()),
            ("Connection".to_string(), "keep-alive".to_string()),
            ("Referer".to_string(), settings.referer.clone()),
            ("User-Agent".to_string(), settings.user_agent.clone()),
        ];

        tracing::debug!("Created LogFetcher for {}", settings.url);

        Self {
            url: settings.url.clone(),
            query: settings.query.clone(),
            headers,
            http,
        }
    }

    /// Fetch the single most recent matching document of the current UTC
    /// day. Any failure is returned as an error the caller can surface and
    /// keep polling through.
    pub async fn fetch(&self, credentials: &Credentials) -> crate::Result<Value> {
        let (gte, lte) = day_window();
        let body = build_query(&self.query, &gte, &lte);

        let response = self
            .http
            .post_json(
                &self.url,
                &self.headers,
                &credentials.username,
                &credentials.password,
                &body,
            )
            .await?;

        if !(200..300).contains(&response.status) {
            return Err(crate::HydramonError::Fetch(format!(
                "Search API returned status {}: {}",
                response.status,
                response.body.chars().take(200).collect::<String>()
            )));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            crate::HydramonError::Fetch(format!("Malformed search response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};

    fn test_settings() -> Settings {
        Settings {
            tts_alert_message: "Attention, red alarm".to_string(),
            wait_time_seconds: 60,
            url: "https://search.example.com/query".to_string(),
            host: "search.example.com".to_string(),
            user_agent: "hydramon/0.1".to_string(),
            content_type: "application/json".to_string(),
            referer: "https://search.example.com/app".to_string(),
            query: "FLY_CBE WETIM".to_string(),
            insecure_skip_tls_verify: false,
            shutdown_on_stop: false,
            notify_timeout_seconds: 5,
        }
    }

    fn test_credentials() -> Credentials {
        Credentials {
            username: "user".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn day_window_covers_one_utc_day() {
        let (gte, lte) = day_window();
        assert_eq!(&gte[..10], &lte[..10]);
        assert!(gte.ends_with("T00:00:00.000Z"));
        assert!(lte.ends_with("T23:59:59.005Z"));
        assert!(gte <= lte);
    }

    #[test]
    fn query_body_requests_newest_single_hit() {
        let body = build_query("FLY_CBE WETIM", "2026-01-01T00:00:00.000Z", "2026-01-01T23:59:59.005Z");
        assert_eq!(body["size"], 1);
        assert_eq!(body["_source"], false);
        assert_eq!(body["sort"][0]["@timestamp"]["order"], "desc");
        assert_eq!(body["sort"][1]["_doc"]["order"], "desc");
        assert_eq!(
            body["query"]["bool"]["must"][0]["query_string"]["query"],
            "FLY_CBE WETIM"
        );
        let range = &body["query"]["bool"]["filter"][0]["range"]["@timestamp"];
        assert_eq!(range["gte"], "2026-01-01T00:00:00.000Z");
        assert_eq!(range["lte"], "2026-01-01T23:59:59.005Z");
    }

    #[tokio::test]
    async fn fetch_posts_with_headers_and_auth() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json()
            .withf(|url, headers, username, password, body| {
                url == "https://search.example.com/query"
                    && headers.contains(&("kbn-xsrf".to_string(), "true".to_string()))
                    && headers.contains(&("Host".to_string(), "search.example.com".to_string()))
                    && headers.contains(&("User-Agent".to_string(), "hydramon/0.1".to_string()))
                    && username == "user"
                    && password == "secret"
                    && body["size"] == 1
            })
            .returning(|_, _, _, _, _| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: r#"{"hits": {"hits": []}}"#.to_string(),
                    })
                })
            });

        let fetcher = LogFetcher::new(&test_settings(), Arc::new(mock));
        let result = fetcher.fetch(&test_credentials()).await.unwrap();
        assert!(result["hits"]["hits"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_maps_non_2xx_to_fetch_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().returning(|_, _, _, _, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 401,
                    body: "Unauthorized".to_string(),
                })
            })
        });

        let fetcher = LogFetcher::new(&test_settings(), Arc::new(mock));
        let err = fetcher.fetch(&test_credentials()).await.unwrap_err();
        match &err {
            crate::HydramonError::Fetch(msg) => assert!(msg.contains("401"), "{msg}"),
            other => panic!("expected HydramonError::Fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_maps_malformed_body_to_fetch_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().returning(|_, _, _, _, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: "not json".to_string(),
                })
            })
        });

        let fetcher = LogFetcher::new(&test_settings(), Arc::new(mock));
        let err = fetcher.fetch(&test_credentials()).await.unwrap_err();
        assert!(err.to_string().contains("Malformed search response"));
    }

    #[tokio::test]
    async fn fetch_propagates_transport_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().returning(|_, _, _, _, _| {
            Box::pin(async {
                Err(crate::HydramonError::Http(
                    "connection refused".to_string(),
                ))
            })
        });

        let fetcher = LogFetcher::new(&test_settings(), Arc::new(mock));
        let err = fetcher.fetch(&test_credentials()).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let debug = format!("{:?}", test_credentials());
        assert!(debug.contains("user"));
        assert!(!debug.contains("secret"));
    }
}
