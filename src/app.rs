use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api;
use crate::config;
use crate::data::{CatalogService, HttpCatalogService, HttpRelatedService, RelatedService};
use crate::logging;
use crate::player::Launcher;
use crate::ui;

/// Command line overrides layered on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_file: Option<PathBuf>,
    pub server: Option<String>,
    pub play: Option<String>,
}

pub fn run(options: RunOptions) -> Result<()> {
    let mut cfg = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;
    if let Some(server) = options.server.as_ref() {
        cfg.server.base_url = server.clone();
    }

    let _log_guard = logging::init(&cfg.log).context("init logging")?;

    let config_path = options.config_file.clone().or_else(config::default_path);
    let display_path = friendly_path(config_path.as_deref());

    let client = api::Client::new(api::ClientConfig {
        base_url: cfg.server.base_url.clone(),
        user_agent: cfg.server.user_agent.clone(),
        timeout: Some(cfg.server.timeout),
        http_client: None,
    })
    .context("build library client")?;
    let client = Arc::new(client);
    tracing::info!(server = client.base_url(), "starting vidtree");

    let catalog_service: Arc<dyn CatalogService + Send + Sync> =
        Arc::new(HttpCatalogService::new(client.clone()));
    let related_service: Arc<dyn RelatedService + Send + Sync> =
        Arc::new(HttpRelatedService::new(client.clone()));

    let now_playing = options
        .play
        .as_deref()
        .map(crate::catalog::normalize_path)
        .filter(|path| !path.is_empty());

    let mut model = ui::Model::new(ui::Options {
        catalog_service: Some(catalog_service),
        related_service: Some(related_service),
        play_client: Some(client.clone()),
        launcher: Launcher::new(&cfg.player),
        default_view: cfg.ui.default_view,
        related_view: cfg.ui.related_view,
        now_playing,
        server_label: client.base_url().to_string(),
        config_path: display_path,
    });

    let result = model.run();
    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal session ended with an error");
    }
    result
}

fn friendly_path(path: Option<&Path>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/vidtree/config.yaml".to_string()
    }
}
