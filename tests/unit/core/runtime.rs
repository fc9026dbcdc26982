//! Unit tests for the polling runtime

use crate::fixtures::*;
use std::sync::Arc;
use std::time::Duration;
use strelitzia::config::EngineSettings;
use strelitzia::core::{AnalysisPoller, RuntimeConfig};
use strelitzia::detectors::AssetClass;
use strelitzia::services::InMemoryWindowSource;
use strelitzia::signals::Timeframe;
use strelitzia::{AnalysisEngine, AnalysisError};
use tokio::time::timeout;
use tokio_test::assert_ok;

fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn test_runtime_config_defaults() {
    let config = assert_ok!(RuntimeConfig::from_lookup(|_| None));
    assert_eq!(config, RuntimeConfig::default());
    assert_eq!(config.poll_interval, Duration::from_secs(60));
    assert_eq!(config.timeframes, vec![Timeframe::H1]);
    assert!(config.symbols.is_empty());
}

#[test]
fn test_runtime_config_overrides() {
    let pairs = [
        ("STRELITZIA_POLL_INTERVAL_SECONDS", "15"),
        ("STRELITZIA_SYMBOLS", "EURUSD, Volatility 75 Index,,AAPL"),
        ("STRELITZIA_TIMEFRAMES", "15m,H4,d1"),
    ];
    let config = assert_ok!(RuntimeConfig::from_lookup(lookup(&pairs)));
    assert_eq!(config.poll_interval, Duration::from_secs(15));
    assert_eq!(config.symbols, vec!["EURUSD", "Volatility 75 Index", "AAPL"]);
    assert_eq!(
        config.timeframes,
        vec![Timeframe::M15, Timeframe::H4, Timeframe::D1]
    );
}

#[test]
fn test_runtime_config_rejects_bad_values() {
    assert!(RuntimeConfig::from_lookup(lookup(&[("STRELITZIA_POLL_INTERVAL_SECONDS", "0")])).is_err());
    assert!(RuntimeConfig::from_lookup(lookup(&[("STRELITZIA_POLL_INTERVAL_SECONDS", "soon")])).is_err());
    assert!(RuntimeConfig::from_lookup(lookup(&[("STRELITZIA_TIMEFRAMES", "H1,2h")])).is_err());
}

#[test]
fn test_poll_once_reports_missing_data() {
    let engine = AnalysisEngine::new(EngineSettings::default()).unwrap();
    let source = InMemoryWindowSource::new();
    source.insert("EURUSD", Timeframe::H1, window(rising(10)));

    let update = AnalysisPoller::poll_once(&engine, &source, "EURUSD", Timeframe::H1);
    assert_eq!(update.asset_class, AssetClass::Forex);
    assert_eq!(
        update.result,
        Err(AnalysisError::DataUnavailable {
            symbol: "EURUSD".to_string(),
            timeframe: "H1".to_string(),
            available: 10,
            required: 20,
        })
    );

    source.insert("EURUSD", Timeframe::H1, window(rising(60)));
    let update = AnalysisPoller::poll_once(&engine, &source, "EURUSD", Timeframe::H1);
    assert_eq!(
        update.result,
        engine.analyze(&window(rising(60)), AssetClass::Forex)
    );
}

#[tokio::test]
async fn test_poller_publishes_updates_until_stopped() {
    let engine = Arc::new(AnalysisEngine::new(EngineSettings::default()).unwrap());
    let source = Arc::new(InMemoryWindowSource::new());
    source.insert("EURUSD", Timeframe::H1, window(rising(60)));

    let config = RuntimeConfig {
        poll_interval: Duration::from_millis(20),
        symbols: vec!["EURUSD".to_string(), "AAPL".to_string()],
        timeframes: vec![Timeframe::H1],
        channel_capacity: 8,
    };
    let poller = AnalysisPoller::new(engine, source, config);
    assert!(!poller.is_running().await);

    let mut rx = poller.start().await;
    assert!(poller.is_running().await);

    let first = assert_ok!(timeout(Duration::from_secs(10), rx.recv()).await).unwrap();
    assert_eq!(first.symbol, "EURUSD");
    assert!(first.result.is_ok());

    let second = assert_ok!(timeout(Duration::from_secs(10), rx.recv()).await).unwrap();
    assert_eq!(second.symbol, "AAPL");
    assert_eq!(second.asset_class, AssetClass::General);
    assert!(matches!(
        second.result,
        Err(AnalysisError::DataUnavailable { available: 0, .. })
    ));

    // the loop keeps going after a failed series
    let third = assert_ok!(timeout(Duration::from_secs(10), rx.recv()).await).unwrap();
    assert_eq!(third.symbol, "EURUSD");

    poller.stop().await;
    assert!(!poller.is_running().await);
}

#[tokio::test]
async fn test_poller_exits_when_receiver_dropped() {
    let engine = Arc::new(AnalysisEngine::new(EngineSettings::default()).unwrap());
    let source = Arc::new(InMemoryWindowSource::new());
    let poller = AnalysisPoller::new(
        engine,
        source,
        RuntimeConfig {
            poll_interval: Duration::from_millis(5),
            symbols: vec!["AAPL".to_string()],
            channel_capacity: 1,
            ..RuntimeConfig::default()
        },
    );

    let rx = poller.start().await;
    drop(rx);
    let mut stopped = false;
    for _ in 0..200 {
        if !poller.is_running().await {
            stopped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(stopped);
}
