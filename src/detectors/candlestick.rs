//! Candlestick patterns: one parameterised matcher driven by a table of
//! named templates.
//!
//! Shapes are expressed as ratios of each candle's high-low range, so a
//! template fits any price scale. A template matches when every band and
//! relation holds; strength then grows with how close the candles sit to the
//! template's ideal geometry.

use super::{Detector, DetectorKind};
use crate::error::DetectorError;
use crate::models::{Candle, CandleWindow, Direction, Signal, SignalCategory};
use serde::{Deserialize, Serialize};

/// Inclusive band of a ratio with its ideal value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub ideal: f64,
}

impl Band {
    pub const ANY: Band = Band {
        min: 0.0,
        max: 1.0,
        ideal: 0.5,
    };

    pub const fn at_most(max: f64) -> Band {
        Band {
            min: 0.0,
            max,
            ideal: 0.0,
        }
    }

    pub const fn at_least(min: f64) -> Band {
        Band {
            min,
            max: 1.0,
            ideal: 1.0,
        }
    }

    pub const fn between(min: f64, max: f64, ideal: f64) -> Band {
        Band { min, max, ideal }
    }

    /// 1.0 at the ideal, falling to 0.0 at the band edge; `None` outside
    pub fn closeness(&self, value: f64) -> Option<f64> {
        if value < self.min || value > self.max {
            return None;
        }
        if *self == Band::ANY {
            return Some(1.0);
        }
        let span = if value >= self.ideal {
            self.max - self.ideal
        } else {
            self.ideal - self.min
        };
        if span <= 0.0 {
            return Some(1.0);
        }
        Some((1.0 - (value - self.ideal).abs() / span).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Any,
    Bullish,
    Bearish,
}

/// Geometry of a single candle, as fractions of its range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleShape {
    pub body: Band,
    pub upper_wick: Band,
    pub lower_wick: Band,
    pub color: Color,
}

impl CandleShape {
    pub const fn new(body: Band, upper_wick: Band, lower_wick: Band, color: Color) -> Self {
        Self {
            body,
            upper_wick,
            lower_wick,
            color,
        }
    }

    /// Body at least `min` of the range, any wicks
    pub const fn solid(min: f64, color: Color) -> Self {
        Self::new(Band::at_least(min), Band::ANY, Band::ANY, color)
    }

    fn score(&self, candle: &Candle) -> Option<f64> {
        let range = candle.range();
        if range <= 0.0 {
            return None;
        }
        let color_ok = match self.color {
            Color::Any => true,
            Color::Bullish => candle.is_bullish(),
            Color::Bearish => candle.is_bearish(),
        };
        if !color_ok {
            return None;
        }
        let body = self.body.closeness(candle.body() / range)?;
        let upper = self.upper_wick.closeness(candle.upper_wick() / range)?;
        let lower = self.lower_wick.closeness(candle.lower_wick() / range)?;
        Some((body + upper + lower) / 3.0)
    }
}

/// Constraint between candles of a pattern; indices are 0 = oldest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Body of `outer` contains the body of `inner` and is larger
    BodyEngulfs { outer: usize, inner: usize },
    /// Body of `candle` is at most `ratio` times the body of `reference`
    SmallerBody {
        candle: usize,
        reference: usize,
        ratio: f64,
    },
    /// Close of `candle` is past the body midpoint of `reference`
    ClosesPastMidpoint {
        candle: usize,
        reference: usize,
        above: bool,
    },
    /// Close of `candle` stays inside the body of `reference`
    ClosesWithinBody { candle: usize, reference: usize },
    /// Open of `candle` is at or beyond the close of `reference`
    OpensBeyondClose {
        candle: usize,
        reference: usize,
        below: bool,
    },
    /// Every close steps in one direction
    StepwiseCloses { rising: bool },
    /// Every open after the first sits inside the previous body
    OpensWithinPriorBody,
    /// Lows (or highs) of `a` and `b` agree within `tolerance` of the larger range
    EqualExtremes {
        a: usize,
        b: usize,
        highs: bool,
        tolerance: f64,
    },
}

impl Relation {
    fn score(&self, candles: &[Candle]) -> Option<f64> {
        let get = |i: usize| candles.get(i);
        match *self {
            Relation::BodyEngulfs { outer, inner } => {
                let (o, i) = (get(outer)?, get(inner)?);
                let holds = o.body_high() >= i.body_high()
                    && o.body_low() <= i.body_low()
                    && o.body() > i.body();
                holds.then(|| 1.0 - i.body() / o.body())
            }
            Relation::SmallerBody {
                candle,
                reference,
                ratio,
            } => {
                let (c, r) = (get(candle)?, get(reference)?);
                let limit = ratio * r.body();
                (limit > 0.0 && c.body() <= limit).then(|| 1.0 - c.body() / limit)
            }
            Relation::ClosesPastMidpoint {
                candle,
                reference,
                above,
            } => {
                let (c, r) = (get(candle)?, get(reference)?);
                let half = r.body() / 2.0;
                let penetration = if above {
                    c.close - r.body_midpoint()
                } else {
                    r.body_midpoint() - c.close
                };
                (half > 0.0 && penetration > 0.0).then(|| (penetration / half).min(1.0))
            }
            Relation::ClosesWithinBody { candle, reference } => {
                let (c, r) = (get(candle)?, get(reference)?);
                (c.close > r.body_low() && c.close < r.body_high()).then_some(1.0)
            }
            Relation::OpensBeyondClose {
                candle,
                reference,
                below,
            } => {
                let (c, r) = (get(candle)?, get(reference)?);
                let holds = if below {
                    c.open <= r.close
                } else {
                    c.open >= r.close
                };
                holds.then_some(1.0)
            }
            Relation::StepwiseCloses { rising } => candles
                .windows(2)
                .all(|pair| {
                    if rising {
                        pair[1].close > pair[0].close
                    } else {
                        pair[1].close < pair[0].close
                    }
                })
                .then_some(1.0),
            Relation::OpensWithinPriorBody => candles
                .windows(2)
                .all(|pair| pair[1].open >= pair[0].body_low() && pair[1].open <= pair[0].body_high())
                .then_some(1.0),
            Relation::EqualExtremes {
                a,
                b,
                highs,
                tolerance,
            } => {
                let (x, y) = (get(a)?, get(b)?);
                let diff = if highs {
                    (x.high - y.high).abs()
                } else {
                    (x.low - y.low).abs()
                };
                let allowed = tolerance * x.range().max(y.range());
                if allowed <= 0.0 {
                    return (diff == 0.0).then_some(1.0);
                }
                (diff <= allowed).then(|| 1.0 - diff / allowed)
            }
        }
    }
}

/// Required direction of closes before the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drift {
    Rising,
    Falling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTemplate {
    pub name: String,
    pub direction: Direction,
    /// Strength of a perfect match
    pub base_strength: f64,
    pub shapes: Vec<CandleShape>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_drift: Option<Drift>,
    #[serde(default = "default_context_bars")]
    pub context_bars: usize,
}

fn default_context_bars() -> usize {
    5
}

impl PatternTemplate {
    fn new(name: &str, direction: Direction, base_strength: f64, shapes: Vec<CandleShape>) -> Self {
        Self {
            name: name.to_string(),
            direction,
            base_strength,
            shapes,
            relations: Vec::new(),
            prior_drift: None,
            context_bars: default_context_bars(),
        }
    }

    fn relate(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    fn after(mut self, drift: Drift) -> Self {
        self.prior_drift = Some(drift);
        self
    }

    pub fn min_lookback(&self) -> usize {
        match self.prior_drift {
            Some(_) => self.shapes.len() + self.context_bars + 1,
            None => self.shapes.len(),
        }
    }

    /// Match the template against the tail of `candles`.
    ///
    /// Returns the closeness in [0, 1] of a match, `None` when any band,
    /// relation or context requirement fails.
    pub fn match_tail(&self, candles: &[Candle]) -> Option<f64> {
        let k = self.shapes.len();
        if k == 0 || candles.len() < self.min_lookback() {
            return None;
        }
        let start = candles.len() - k;
        let pattern = &candles[start..];

        if let Some(drift) = self.prior_drift {
            let before = candles[start - 1].close;
            let earlier = candles[start - 1 - self.context_bars].close;
            let holds = match drift {
                Drift::Rising => before > earlier,
                Drift::Falling => before < earlier,
            };
            if !holds {
                return None;
            }
        }

        let mut scores = Vec::with_capacity(k + self.relations.len());
        for (shape, candle) in self.shapes.iter().zip(pattern) {
            scores.push(shape.score(candle)?);
        }
        for relation in &self.relations {
            scores.push(relation.score(pattern)?);
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Named templates shipped with every profile
pub fn candlestick_templates() -> Vec<PatternTemplate> {
    use Color::{Any, Bearish, Bullish};
    use Direction as D;

    let doji_body = Band::at_most(0.05);
    let small_body = Band::at_most(0.35);

    vec![
        PatternTemplate::new(
            "doji",
            D::Neutral,
            0.5,
            vec![CandleShape::new(doji_body, Band::ANY, Band::ANY, Any)],
        ),
        PatternTemplate::new(
            "dragonfly_doji",
            D::Bullish,
            0.6,
            vec![CandleShape::new(
                doji_body,
                Band::at_most(0.1),
                Band::at_least(0.6),
                Any,
            )],
        ),
        PatternTemplate::new(
            "gravestone_doji",
            D::Bearish,
            0.6,
            vec![CandleShape::new(
                doji_body,
                Band::at_least(0.6),
                Band::at_most(0.1),
                Any,
            )],
        ),
        PatternTemplate::new(
            "spinning_top",
            D::Neutral,
            0.4,
            vec![CandleShape::new(
                Band::between(0.1, 0.3, 0.2),
                Band::at_least(0.25),
                Band::at_least(0.25),
                Any,
            )],
        ),
        PatternTemplate::new(
            "hammer",
            D::Bullish,
            0.7,
            vec![CandleShape::new(
                small_body,
                Band::at_most(0.15),
                Band::at_least(0.55),
                Any,
            )],
        )
        .after(Drift::Falling),
        PatternTemplate::new(
            "hanging_man",
            D::Bearish,
            0.6,
            vec![CandleShape::new(
                small_body,
                Band::at_most(0.15),
                Band::at_least(0.55),
                Any,
            )],
        )
        .after(Drift::Rising),
        PatternTemplate::new(
            "inverted_hammer",
            D::Bullish,
            0.6,
            vec![CandleShape::new(
                small_body,
                Band::at_least(0.55),
                Band::at_most(0.15),
                Any,
            )],
        )
        .after(Drift::Falling),
        PatternTemplate::new(
            "shooting_star",
            D::Bearish,
            0.7,
            vec![CandleShape::new(
                small_body,
                Band::at_least(0.55),
                Band::at_most(0.15),
                Any,
            )],
        )
        .after(Drift::Rising),
        PatternTemplate::new(
            "bullish_marubozu",
            D::Bullish,
            0.7,
            vec![CandleShape::solid(0.9, Bullish)],
        ),
        PatternTemplate::new(
            "bearish_marubozu",
            D::Bearish,
            0.7,
            vec![CandleShape::solid(0.9, Bearish)],
        ),
        PatternTemplate::new(
            "bullish_engulfing",
            D::Bullish,
            0.8,
            vec![CandleShape::solid(0.3, Bearish), CandleShape::solid(0.5, Bullish)],
        )
        .relate(Relation::BodyEngulfs { outer: 1, inner: 0 }),
        PatternTemplate::new(
            "bearish_engulfing",
            D::Bearish,
            0.8,
            vec![CandleShape::solid(0.3, Bullish), CandleShape::solid(0.5, Bearish)],
        )
        .relate(Relation::BodyEngulfs { outer: 1, inner: 0 }),
        PatternTemplate::new(
            "bullish_harami",
            D::Bullish,
            0.55,
            vec![CandleShape::solid(0.5, Bearish), CandleShape::solid(0.0, Bullish)],
        )
        .relate(Relation::BodyEngulfs { outer: 0, inner: 1 })
        .after(Drift::Falling),
        PatternTemplate::new(
            "bearish_harami",
            D::Bearish,
            0.55,
            vec![CandleShape::solid(0.5, Bullish), CandleShape::solid(0.0, Bearish)],
        )
        .relate(Relation::BodyEngulfs { outer: 0, inner: 1 })
        .after(Drift::Rising),
        PatternTemplate::new(
            "piercing_line",
            D::Bullish,
            0.65,
            vec![CandleShape::solid(0.5, Bearish), CandleShape::solid(0.4, Bullish)],
        )
        .relate(Relation::OpensBeyondClose {
            candle: 1,
            reference: 0,
            below: true,
        })
        .relate(Relation::ClosesPastMidpoint {
            candle: 1,
            reference: 0,
            above: true,
        })
        .relate(Relation::ClosesWithinBody {
            candle: 1,
            reference: 0,
        }),
        PatternTemplate::new(
            "dark_cloud_cover",
            D::Bearish,
            0.65,
            vec![CandleShape::solid(0.5, Bullish), CandleShape::solid(0.4, Bearish)],
        )
        .relate(Relation::OpensBeyondClose {
            candle: 1,
            reference: 0,
            below: false,
        })
        .relate(Relation::ClosesPastMidpoint {
            candle: 1,
            reference: 0,
            above: false,
        })
        .relate(Relation::ClosesWithinBody {
            candle: 1,
            reference: 0,
        }),
        PatternTemplate::new(
            "morning_star",
            D::Bullish,
            0.8,
            vec![
                CandleShape::solid(0.5, Bearish),
                CandleShape::new(Band::at_most(0.3), Band::ANY, Band::ANY, Any),
                CandleShape::solid(0.5, Bullish),
            ],
        )
        .relate(Relation::SmallerBody {
            candle: 1,
            reference: 0,
            ratio: 0.5,
        })
        .relate(Relation::ClosesPastMidpoint {
            candle: 2,
            reference: 0,
            above: true,
        }),
        PatternTemplate::new(
            "evening_star",
            D::Bearish,
            0.8,
            vec![
                CandleShape::solid(0.5, Bullish),
                CandleShape::new(Band::at_most(0.3), Band::ANY, Band::ANY, Any),
                CandleShape::solid(0.5, Bearish),
            ],
        )
        .relate(Relation::SmallerBody {
            candle: 1,
            reference: 0,
            ratio: 0.5,
        })
        .relate(Relation::ClosesPastMidpoint {
            candle: 2,
            reference: 0,
            above: false,
        }),
        PatternTemplate::new(
            "three_white_soldiers",
            D::Bullish,
            0.75,
            vec![CandleShape::solid(0.5, Bullish); 3],
        )
        .relate(Relation::StepwiseCloses { rising: true })
        .relate(Relation::OpensWithinPriorBody),
        PatternTemplate::new(
            "three_black_crows",
            D::Bearish,
            0.75,
            vec![CandleShape::solid(0.5, Bearish); 3],
        )
        .relate(Relation::StepwiseCloses { rising: false })
        .relate(Relation::OpensWithinPriorBody),
        PatternTemplate::new(
            "tweezer_bottom",
            D::Bullish,
            0.55,
            vec![CandleShape::solid(0.2, Bearish), CandleShape::solid(0.2, Bullish)],
        )
        .relate(Relation::EqualExtremes {
            a: 0,
            b: 1,
            highs: false,
            tolerance: 0.1,
        })
        .after(Drift::Falling),
        PatternTemplate::new(
            "tweezer_top",
            D::Bearish,
            0.55,
            vec![CandleShape::solid(0.2, Bullish), CandleShape::solid(0.2, Bearish)],
        )
        .relate(Relation::EqualExtremes {
            a: 0,
            b: 1,
            highs: true,
            tolerance: 0.1,
        })
        .after(Drift::Rising),
    ]
}

/// Detector for one candlestick template
#[derive(Debug, Clone)]
pub struct CandlestickDetector {
    id: String,
    template: PatternTemplate,
}

impl CandlestickDetector {
    pub fn new(template: PatternTemplate) -> Self {
        Self {
            id: format!("candlestick.{}", template.name),
            template,
        }
    }

    pub fn template(&self) -> &PatternTemplate {
        &self.template
    }
}

impl Detector for CandlestickDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::CandlestickPattern
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Candlestick
    }

    fn min_lookback(&self) -> usize {
        self.template.min_lookback()
    }

    fn evaluate(&self, window: &CandleWindow) -> Result<Option<Signal>, DetectorError> {
        let Some(closeness) = self.template.match_tail(window.candles()) else {
            return Ok(None);
        };
        let strength = self.template.base_strength * (0.5 + 0.5 * closeness);
        Ok(Some(
            Signal::new(
                self.id.clone(),
                SignalCategory::Candlestick,
                self.template.direction,
                strength.clamp(0.0, 1.0),
            )
            .with_evidence("closeness", closeness)
            .with_evidence("candles", self.template.shapes.len() as f64),
        ))
    }
}
