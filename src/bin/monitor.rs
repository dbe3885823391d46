//! Console event monitor: follows the live feed the way the dashboard
//! client does, through the same caches and reconciliation rules.
//!
//! Usage: `monitor [base-url]`, defaulting to `http://localhost:4000`.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use log::warn;
use serde::de::DeserializeOwned;
use url::Url;

use pulseguard::client::{AlertCache, ClientEvent, DeviceCache};
use pulseguard::db::models::{Alert, Device};
use pulseguard::messaging::EventMessage;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:4000".to_string());
    let base = base.trim_end_matches('/').to_string();

    let http = reqwest::Client::new();

    // Seed the caches from the snapshot endpoints. A failed fetch degrades
    // to an empty list, the same as the dashboard.
    let mut alerts = AlertCache::new();
    alerts.merge_snapshot(fetch_snapshot::<Alert>(&http, &base, "alerts").await);
    let mut devices = DeviceCache::new();
    devices.merge_snapshot(fetch_snapshot::<Device>(&http, &base, "devices").await);

    println!(
        "connected: {} alerts, {} devices",
        alerts.len(),
        devices.len()
    );

    let ws_url = ws_endpoint(&base)?;
    let (stream, _) = connect_async(ws_url.as_str())
        .await
        .context("WebSocket connect failed")?;
    let (_write, mut read) = stream.split();

    while let Some(frame) = read.next().await {
        let frame = frame.context("WebSocket stream failed")?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let message: EventMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Undecodable frame: {}", e);
                continue;
            }
        };

        match ClientEvent::from_message(&message) {
            Ok(ClientEvent::NewAlert(alert)) => {
                println!(
                    "+ {} {} ({}) confidence {:.2}",
                    alert.id, alert.kind, alert.weapon, alert.confidence
                );
                alerts.apply_new_alert(alert);
            }
            Ok(ClientEvent::UpdateAlert(alert)) => {
                let id = alert.id.clone();
                alerts.apply_update(alert);
                if let Some(shown) = alerts.get(&id) {
                    println!("~ {} -> {}", shown.id, shown.status);
                }
            }
            Ok(ClientEvent::DeviceUpdate(device)) => {
                let id = device.id.clone();
                devices.apply_update(device);
                if let Some(shown) = devices.get(&id) {
                    println!("* {} {} ({})", shown.id, shown.status, shown.name);
                }
            }
            Err(e) => warn!("Undecodable event payload: {}", e),
        }
    }

    Ok(())
}

async fn fetch_snapshot<T: DeserializeOwned>(
    http: &reqwest::Client,
    base: &str,
    path: &str,
) -> Vec<T> {
    let url = format!("{}/api/{}", base, path);
    let result = async {
        http.get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<T>>()
            .await
    }
    .await;

    match result {
        Ok(list) => list,
        Err(e) => {
            warn!("Initial {} fetch failed, starting empty: {}", path, e);
            Vec::new()
        }
    }
}

fn ws_endpoint(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).context("invalid base url")?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("invalid base url scheme"))?;
    url.set_path("/ws");
    Ok(url)
}
