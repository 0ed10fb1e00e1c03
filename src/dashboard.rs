//! Web dashboard: credential form, start/stop controls, and the alert table

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::controller::MonitorController;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub controller: Arc<MonitorController>,
}

/// Build the dashboard axum router
pub fn build_router(controller: Arc<MonitorController>) -> Router {
    let dashboard_state = DashboardState { controller };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/start", post(start_handler))
        .route("/api/stop", post(stop_handler))
        .route("/api/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn start_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<StartRequest>,
) -> impl IntoResponse {
    let outcome = dashboard
        .controller
        .start(&request.username, &request.password)
        .await;
    Json(serde_json::json!({ "message": outcome.message() }))
}

async fn stop_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let outcome = dashboard.controller.stop().await;
    Json(serde_json::json!({ "message": outcome.message() }))
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.controller.status().await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn index_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Hydra Alarm Monitoring</title>
    <script>
        function send(path, body) {
            fetch(path, {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify(body || {})
            })
                .then(r => r.json())
                .then(data => {
                    document.getElementById('output').textContent = data.message;
                    refreshData();
                });
        }
        function startMonitoring() {
            send('/api/start', {
                username: document.getElementById('username').value,
                password: document.getElementById('password').value
            });
        }
        function stopMonitoring() {
            send('/api/stop');
        }
        function refreshData() {
            fetch('/api/status')
                .then(r => r.json())
                .then(data => {
                    document.getElementById('phase').textContent = data.phase;
                    document.getElementById('output').textContent = data.message;
                    const tbody = document.getElementById('alert-body');
                    // Field values come from the backend; render them as
                    // text, never as markup
                    tbody.replaceChildren(...data.rows.map(row => {
                        const tr = document.createElement('tr');
                        tr.style.borderBottom = '1px solid #dee2e6';
                        [row.name, row.status_color, row.statement, row.status_code].forEach((value, index) => {
                            const td = document.createElement('td');
                            td.style.padding = '0.5rem';
                            if (index === 1) {
                                td.style.color = '#721c24';
                                td.style.fontWeight = '600';
                            }
                            td.textContent = value;
                            tr.appendChild(td);
                        });
                        return tr;
                    }));
                });
        }
        setInterval(refreshData, 5000);
        window.addEventListener('load', refreshData);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Hydra Alarm Monitoring</h1>
    <p>Automatically detects hydra alarms and notifies when an alarm goes
        <strong style="color: #721c24;">RED</strong>. Use your DiMon username and password.</p>
    <div style="margin-bottom: 1rem;">
        <input id="username" placeholder="Username" style="padding: 0.4rem; margin-right: 0.5rem;">
        <input id="password" placeholder="Password" type="password" style="padding: 0.4rem; margin-right: 0.5rem;">
        <button onclick="startMonitoring()" style="padding: 0.4rem 1rem;">Start Monitoring</button>
        <button onclick="stopMonitoring()" style="padding: 0.4rem 1rem;">Stop Monitoring</button>
    </div>
    <p>Session: <span id="phase">Idle</span></p>
    <pre id="output" style="background: #f8f9fa; padding: 0.75rem; min-height: 1.5em;"></pre>
    <section>
        <h2>Alerts</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Name</th>
                    <th style="padding: 0.5rem; text-align: left;">Color</th>
                    <th style="padding: 0.5rem; text-align: left;">Statement</th>
                    <th style="padding: 0.5rem; text-align: left;">Status</th>
                </tr>
            </thead>
            <tbody id="alert-body"></tbody>
        </table>
    </section>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Settings;
    use crate::engine::MonitorLoop;
    use crate::fetcher::LogFetcher;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::session::{new_session_handle, AlertRow, SessionHandle};
    use tokio_util::sync::CancellationToken;

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
            notify_timeout_seconds: 1,
        }
    }

    fn setup() -> (Router, Arc<MonitorController>, SessionHandle) {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json().returning(|_, _, _, _, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: r#"{"hits": {"hits": []}}"#.to_string(),
                })
            })
        });
        let session = new_session_handle();
        let fetcher = Arc::new(LogFetcher::new(&test_settings(), Arc::new(mock)));
        let engine = Arc::new(MonitorLoop::new(
            &test_settings(),
            fetcher,
            Vec::new(),
            Arc::clone(&session),
        ));
        let controller = Arc::new(MonitorController::new(
            engine,
            Arc::clone(&session),
            false,
            CancellationToken::new(),
        ));
        (
            build_router(Arc::clone(&controller)),
            controller,
            session,
        )
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _, _) = setup();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn index_returns_html() {
        let (app, _, _) = setup();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Hydra Alarm Monitoring"));
        assert!(html.contains("Start Monitoring"));
        assert!(html.contains("Stop Monitoring"));
        // Backend-supplied row fields must never reach innerHTML
        assert!(!html.contains("innerHTML"));
        assert!(html.contains("td.textContent = value"));
    }

    #[tokio::test]
    async fn start_with_empty_credentials_reports_validation_message() {
        let (app, _, _) = setup();
        let response = app
            .oneshot(post_json(
                "/api/start",
                r#"{"username": "", "password": "x"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("username and password"));
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_status_shows_running_session() {
        let (app, controller, _) = setup();
        let response = app
            .oneshot(post_json(
                "/api/start",
                r#"{"username": "user", "password": "secret"}"#,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["message"], "Monitoring started for user.");

        let snapshot = controller.status().await;
        assert_eq!(snapshot.phase.to_string(), "Running");
        controller.stop().await;
    }

    #[tokio::test]
    async fn stop_without_start_reports_not_started() {
        let (app, _, _) = setup();
        let response = app.oneshot(post_json("/api/stop", "{}")).await.unwrap();
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("not started"));
    }

    #[tokio::test]
    async fn status_returns_phase_message_and_rows() {
        let (app, _, session) = setup();
        {
            let mut s = session.write().await;
            s.set_status("Notification status color: green".to_string());
            s.push_row(AlertRow {
                name: "Circuit breaker CBE-4".to_string(),
                status_color: "RED".to_string(),
                statement: "Breaker tripped".to_string(),
                status_code: "K2".to_string(),
            });
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["message"], "Notification status color: green");
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert_eq!(json["rows"][0]["name"], "Circuit breaker CBE-4");
        assert_eq!(json["rows"][0]["status_color"], "RED");
    }
}
