use anyhow::{Context, Result};
use blockbuilders_application::{EdgeGate, GateDecision};
use blockbuilders_core::gateway::GateRequest;
use std::path::PathBuf;

use crate::services::{Services, load_config};

pub async fn run(config_path: Option<PathBuf>, path: &str, token: Option<String>) -> Result<()> {
    let services = Services::new(load_config(config_path)?)?;
    let origin = services.config.app_origin().context("Invalid app origin")?;
    let url = origin
        .join(path)
        .with_context(|| format!("Invalid path: {}", path))?;

    let mut request = GateRequest::new(url);
    if let Some(token) = token {
        request = request.with_cookies(format!("{}={}", services.config.cookie.name, token));
    }

    let gate = EdgeGate::new(services.gateway.clone());
    match gate.evaluate(&request).await {
        GateDecision::Pass => println!("✅ pass {}", request.url),
        GateDecision::Redirect(location) => println!("↪ redirect {}", location),
    }
    Ok(())
}
