//! Default detector tables per asset class.

use super::candlestick::{candlestick_templates, CandlestickDetector};
use super::chart::{ChartParams, ChartPatternDetector, ChartTemplate};
use super::indicator::{IndicatorDetector, IndicatorRule, MacdWeights};
use super::registry::{AssetClass, AssetProfile, DetectorRegistry};
use super::Detector;
use crate::config::EngineSettings;
use crate::error::ConfigError;
use crate::signals::categories::CategoryWeights;
use crate::structure::StructureTracker;
use std::sync::Arc;

/// Indicator rows shared by every profile
fn core_rules() -> Vec<IndicatorRule> {
    vec![
        IndicatorRule::EmaCross { fast: 20, slow: 50 },
        IndicatorRule::Adx {
            period: 14,
            threshold: 20.0,
        },
        IndicatorRule::Supertrend {
            period: 10,
            multiplier: 3.0,
        },
        IndicatorRule::PriceSlope { period: 20 },
        IndicatorRule::Rsi {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        },
        IndicatorRule::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
            weights: MacdWeights::default(),
        },
        IndicatorRule::Stochastic {
            period: 14,
            smoothing: 3,
            oversold: 20.0,
            overbought: 80.0,
        },
        IndicatorRule::Roc { period: 12 },
        IndicatorRule::Bollinger {
            period: 20,
            std_dev: 2.0,
            squeeze_history: 50,
        },
        IndicatorRule::AtrExpansion {
            period: 14,
            ratio: 1.5,
        },
        IndicatorRule::VolumeSpike {
            period: 20,
            ratio: 2.0,
        },
        IndicatorRule::SupportResistance {
            lookback: 50,
            pivot_width: 3,
            proximity_atr: 0.5,
        },
        IndicatorRule::RangeBreakout { period: 20 },
    ]
}

/// Indicator rows for `asset_class`
pub fn indicator_rules(asset_class: AssetClass) -> Vec<IndicatorRule> {
    let mut rules = core_rules();
    match asset_class {
        AssetClass::General => {
            rules.push(IndicatorRule::Obv {
                period: 20,
                min_change: 0.1,
            });
            rules.push(IndicatorRule::Vwap { period: 20 });
        }
        AssetClass::Forex => {
            rules.push(IndicatorRule::Obv {
                period: 20,
                min_change: 0.1,
            });
            rules.push(IndicatorRule::Vwap { period: 20 });
            rules.push(IndicatorRule::SessionMomentum { lookback: 48 });
            rules.push(IndicatorRule::FairValueGap {
                lookback: 30,
                min_gap_atr: 0.25,
            });
            rules.push(IndicatorRule::OrderBlock {
                lookback: 30,
                impulse_atr: 1.5,
            });
            rules.push(IndicatorRule::LiquiditySweep {
                lookback: 40,
                pivot_width: 3,
            });
        }
        AssetClass::Synthetic => {
            rules.push(IndicatorRule::Jump {
                period: 20,
                ratio: 2.5,
            });
            rules.push(IndicatorRule::Spike {
                period: 14,
                ratio: 3.0,
            });
        }
    }
    rules
}

/// Full detector list for `asset_class`: indicators, candlestick templates,
/// chart templates and the structure tracker.
pub fn default_detectors(
    asset_class: AssetClass,
    tracker: &StructureTracker,
    chart_params: &ChartParams,
) -> Vec<Arc<dyn Detector>> {
    let mut detectors: Vec<Arc<dyn Detector>> = indicator_rules(asset_class)
        .into_iter()
        .map(|rule| Arc::new(IndicatorDetector::new(rule)) as Arc<dyn Detector>)
        .collect();

    detectors.extend(
        candlestick_templates()
            .into_iter()
            .map(|t| Arc::new(CandlestickDetector::new(t)) as Arc<dyn Detector>),
    );
    detectors.extend(ChartTemplate::ALL.iter().map(|&t| {
        Arc::new(ChartPatternDetector::new(t, chart_params.clone())) as Arc<dyn Detector>
    }));
    detectors.push(Arc::new(tracker.clone()));
    detectors
}

pub fn default_profile(
    asset_class: AssetClass,
    settings: &EngineSettings,
) -> Result<AssetProfile, ConfigError> {
    let tracker = StructureTracker::new(settings.structure.clone());
    AssetProfile::new(
        asset_class,
        CategoryWeights::for_asset_class(asset_class),
        default_detectors(asset_class, &tracker, &settings.chart),
        settings.min_window,
    )
}

/// Registry with the forex, synthetic and general profiles
pub fn default_registry(settings: &EngineSettings) -> Result<DetectorRegistry, ConfigError> {
    let mut registry = DetectorRegistry::new().with_parallel(settings.parallel_detectors);
    for asset_class in AssetClass::ALL {
        registry.register(default_profile(asset_class, settings)?);
    }
    Ok(registry)
}
