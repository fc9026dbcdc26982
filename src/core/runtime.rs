//! Always-on polling loop: fetch a window, analyze it, publish the result.

use crate::detectors::AssetClass;
use crate::error::{AnalysisError, ConfigError};
use crate::models::Decision;
use crate::services::WindowSource;
use crate::signals::engine::AnalysisEngine;
use crate::signals::timeframes::Timeframe;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for the polling runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub poll_interval: Duration,
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Bound of the update channel
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            symbols: Vec::new(),
            timeframes: vec![Timeframe::H1],
            channel_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `STRELITZIA_POLL_INTERVAL_SECONDS`,
    /// `STRELITZIA_SYMBOLS` and `STRELITZIA_TIMEFRAMES` (comma separated)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("STRELITZIA_POLL_INTERVAL_SECONDS") {
            let seconds: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidSetting {
                key: "STRELITZIA_POLL_INTERVAL_SECONDS".to_string(),
                value: raw.clone(),
            })?;
            if seconds == 0 {
                return Err(ConfigError::InvalidSetting {
                    key: "STRELITZIA_POLL_INTERVAL_SECONDS".to_string(),
                    value: raw,
                });
            }
            config.poll_interval = Duration::from_secs(seconds);
        }
        if let Some(raw) = lookup("STRELITZIA_SYMBOLS") {
            config.symbols = split_list(&raw).map(str::to_string).collect();
        }
        if let Some(raw) = lookup("STRELITZIA_TIMEFRAMES") {
            config.timeframes = split_list(&raw)
                .map(|tf| {
                    tf.parse().map_err(|_| ConfigError::InvalidSetting {
                        key: "STRELITZIA_TIMEFRAMES".to_string(),
                        value: tf.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(config)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// One analysis outcome published by the poller
#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub asset_class: AssetClass,
    pub result: Result<Decision, AnalysisError>,
}

/// Periodically analyzes every configured symbol and timeframe.
///
/// Errors (missing data, short windows) are published as updates and the
/// loop keeps going.
pub struct AnalysisPoller {
    engine: Arc<AnalysisEngine>,
    source: Arc<dyn WindowSource>,
    config: RuntimeConfig,
    handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl AnalysisPoller {
    pub fn new(
        engine: Arc<AnalysisEngine>,
        source: Arc<dyn WindowSource>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            engine,
            source,
            config,
            handle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Fetch and analyze one series synchronously
    pub fn poll_once(
        engine: &AnalysisEngine,
        source: &dyn WindowSource,
        symbol: &str,
        timeframe: Timeframe,
    ) -> PollUpdate {
        let asset_class = AssetClass::from_symbol(symbol);
        let result = engine
            .min_window(asset_class)
            .and_then(|min_length| source.get_window(symbol, timeframe, min_length))
            .and_then(|window| engine.analyze(&window, asset_class));

        if let Err(e) = &result {
            warn!(
                symbol = %symbol,
                timeframe = %timeframe,
                error = %e,
                "AnalysisPoller: analysis of {} {} failed: {}",
                symbol,
                timeframe,
                e
            );
        }

        PollUpdate {
            symbol: symbol.to_string(),
            timeframe,
            asset_class,
            result,
        }
    }

    /// Start polling and return the receiving end of the update channel.
    /// A poller that is already running is restarted.
    pub async fn start(&self) -> mpsc::Receiver<PollUpdate> {
        self.stop().await;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let engine = self.engine.clone();
        let source = self.source.clone();
        let config = self.config.clone();
        let period = config.poll_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            info!(
                symbols = ?config.symbols,
                timeframes = ?config.timeframes,
                interval_ms = period.as_millis() as u64,
                "AnalysisPoller: started"
            );

            loop {
                ticker.tick().await;
                for symbol in &config.symbols {
                    for &timeframe in &config.timeframes {
                        let engine = engine.clone();
                        let source = source.clone();
                        let symbol = symbol.clone();
                        let outcome = tokio::task::spawn_blocking(move || {
                            Self::poll_once(&engine, source.as_ref(), &symbol, timeframe)
                        })
                        .await;

                        match outcome {
                            Ok(update) => {
                                debug!(
                                    symbol = %update.symbol,
                                    timeframe = %update.timeframe,
                                    ok = update.result.is_ok(),
                                    "AnalysisPoller: publishing update"
                                );
                                if tx.send(update).await.is_err() {
                                    info!("AnalysisPoller: receiver dropped, stopping");
                                    return;
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "AnalysisPoller: analysis task failed: {}", e);
                            }
                        }
                    }
                }
            }
        });

        *self.handle.write().await = Some(handle);
        rx
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("AnalysisPoller: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}
