//! State shared by the commands of one invocation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chatcast_browser_cdp::{BatchTab, BrowserManager, BrowserManagerConfig, OpenMode};
use chatcast_config::{load_sites, Config};
use chatcast_protocols::{SiteConfig, SiteHandlersConfig};
use chatcast_router::{
    batch_page_url, render_batch_page, Broadcaster, CommandHandler, Pacing, RuntimeRouter,
    ShareService, SiteMessenger, StatusBoard,
};
use chatcast_store::{
    ExportHistoryStore, FloatStateStore, HistoryStore, JsonFileStore, KeyValueStore, SettingsStore,
};
use tracing::{info, warn};

/// How long the batch page gets to show its site frames.
const PAGE_READY: Duration = Duration::from_secs(60);

pub(crate) struct App {
    pub config: Config,
    pub catalog: Arc<SiteHandlersConfig>,
    pub settings: Arc<SettingsStore>,
    pub history: Arc<HistoryStore>,
    pub exports: Arc<ExportHistoryStore>,
    pub floats: Arc<FloatStateStore>,
}

impl App {
    pub async fn load(config: Config) -> Result<Self> {
        let catalog = load_sites(config.sites.config_path.as_deref())
            .context("Failed to load the site catalog")?;
        let data_dir = config.data_dir();
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::new(&data_dir)
                .await
                .with_context(|| format!("Failed to open the store in {}", data_dir.display()))?,
        );
        Ok(Self {
            catalog: Arc::new(catalog),
            settings: Arc::new(SettingsStore::new(store.clone())),
            history: Arc::new(HistoryStore::new(store.clone())),
            exports: Arc::new(ExportHistoryStore::new(store.clone())),
            floats: Arc::new(FloatStateStore::new(store)),
            config,
        })
    }

    pub fn site(&self, name: &str) -> Result<&SiteConfig> {
        self.catalog.find(name).ok_or_else(|| {
            let known: Vec<&str> = self.catalog.sites.iter().map(|s| s.name.as_str()).collect();
            anyhow!("Unknown site: {} (known: {})", name, known.join(", "))
        })
    }

    pub fn browser_config(&self) -> BrowserManagerConfig {
        let browser = &self.config.browser;
        BrowserManagerConfig {
            debug_port: browser.debug_port,
            endpoint: browser.endpoint.clone(),
            profile_dir: Some(self.config.profile_dir()),
            headless: browser.headless,
            launch: browser.launch,
            executable: self.config.browser_executable(),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            stagger: self.config.batch.stagger(),
            capture_delays: self.config.capture.delays(),
            capture_collect: self.config.capture.collect(),
        }
    }

    /// Render the batch page to disk and return its path.
    pub async fn write_batch_page(&self, overrides: &HashMap<String, String>) -> Result<PathBuf> {
        let settings = self.settings.get().await?;
        let html = render_batch_page(&self.catalog, &settings, overrides);
        let path = self.config.batch_page_path();
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write the batch page, show it in the browser and wire both message planes to it.
    pub async fn open(
        &self,
        query: Option<&str>,
        overrides: &HashMap<String, String>,
        mode: OpenMode,
    ) -> Result<Live> {
        let path = self.write_batch_page(overrides).await?;
        let page_url = batch_page_url(&path, query)?;
        let base_url = batch_page_url(&path, None)?;

        let browser = BrowserManager::new(self.browser_config());
        let timeouts = &self.config.timeouts;
        let batch = browser
            .open_batch(
                &page_url,
                self.catalog.clone(),
                timeouts.bridge(),
                timeouts.file_focus(),
                mode,
            )
            .await
            .context("Failed to open the batch page")?;

        let settings = self.settings.get().await?;
        let expected = self.catalog.select(&settings.enabled_sites).len();
        match batch.wait_ready(expected, PAGE_READY).await {
            Ok(frames) => info!(frames, "batch page ready"),
            Err(e) => warn!("{}", e),
        }

        let status = StatusBoard::new();
        let router = Arc::new(RuntimeRouter::new(
            batch.tabs(),
            self.floats.clone(),
            self.catalog.clone(),
            base_url,
        ));
        let handler = Arc::new(CommandHandler::new(
            router,
            self.catalog.clone(),
            self.settings.clone(),
            self.floats.clone(),
            status.clone(),
        ));
        let messenger = Arc::new(
            SiteMessenger::new(batch.host())
                .with_runtime_fallback(handler.clone())
                .with_timeouts(timeouts.reply(), timeouts.inject()),
        );

        Ok(Live {
            browser,
            batch,
            handler,
            messenger,
            status,
            page_url,
        })
    }
}

/// A batch page open in the browser.
pub(crate) struct Live {
    browser: BrowserManager,
    pub batch: BatchTab,
    pub handler: Arc<CommandHandler>,
    pub messenger: Arc<SiteMessenger>,
    pub status: StatusBoard,
    pub page_url: String,
}

impl Live {
    pub fn broadcaster(&self, app: &App) -> Broadcaster {
        Broadcaster::new(
            app.catalog.clone(),
            self.messenger.clone(),
            app.history.clone(),
            app.settings.clone(),
            self.status.clone(),
        )
        .with_pacing(app.pacing())
    }

    pub fn share(&self, app: &App) -> ShareService {
        ShareService::new(
            app.catalog.clone(),
            self.messenger.clone(),
            app.settings.clone(),
            app.exports.clone(),
        )
    }

    /// Drop the browser connection. The browser and the page stay open.
    pub async fn close(self) -> Result<()> {
        info!(tab = %self.batch.tab_id(), "leaving batch page open");
        self.browser.close().await?;
        Ok(())
    }
}
