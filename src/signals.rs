// =============================================================================
// Signal Aggregation — merging indicator and classifier readings into tags
// =============================================================================
//
// The tag vocabulary is closed: every signal the engine can emit is a
// variant of `SignalTag`. Aggregation is a deterministic set union with
// first-seen insertion order:
//
//   1. momentum classification      (overbought / oversold, skipped if neutral)
//   2. convergence comparison       (bullish_macd when line > signal,
//                                    bearish_macd otherwise, skipped when the
//                                    triple is unknown)
//   3. trend following              (trend_following_buy / _sell)
//   4. volatility                   (high_volatility when high)
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::macd::MacdTriple;
use crate::types::{MomentumSignal, Trend, Volatility};

/// Closed vocabulary of signal tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTag {
    Overbought,
    Oversold,
    BullishMacd,
    BearishMacd,
    StrongBuy,
    Buy,
    StrongSell,
    Sell,
    TrendFollowingBuy,
    TrendFollowingSell,
    HighVolatility,
}

impl SignalTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overbought => "overbought",
            Self::Oversold => "oversold",
            Self::BullishMacd => "bullish_macd",
            Self::BearishMacd => "bearish_macd",
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::StrongSell => "strong_sell",
            Self::Sell => "sell",
            Self::TrendFollowingBuy => "trend_following_buy",
            Self::TrendFollowingSell => "trend_following_sell",
            Self::HighVolatility => "high_volatility",
        }
    }

    /// A tag votes bullish when its name carries "buy" or "bullish".
    pub fn is_bullish(&self) -> bool {
        let name = self.as_str();
        name.contains("buy") || name.contains("bullish")
    }

    /// A tag votes bearish when its name carries "sell" or "bearish".
    pub fn is_bearish(&self) -> bool {
        let name = self.as_str();
        name.contains("sell") || name.contains("bearish")
    }

    /// The momentum/convergence tags that feed the win-rate estimate.
    pub fn adjusts_win_rate(&self) -> bool {
        matches!(
            self,
            Self::Oversold | Self::BullishMacd | Self::Overbought | Self::BearishMacd
        )
    }
}

impl std::fmt::Display for SignalTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of signal tags: duplicates collapse, first-seen order is
/// preserved. Never mutated after aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalSet {
    tags: Vec<SignalTag>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag unless it is already present.
    pub fn insert(&mut self, tag: SignalTag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn contains(&self, tag: SignalTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn as_slice(&self) -> &[SignalTag] {
        &self.tags
    }
}

impl FromIterator<SignalTag> for SignalSet {
    fn from_iter<I: IntoIterator<Item = SignalTag>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Merge the qualitative readings into one signal set.
pub fn aggregate(
    momentum: MomentumSignal,
    convergence: Option<&MacdTriple>,
    trend: Trend,
    volatility: Volatility,
) -> SignalSet {
    let mut set = SignalSet::new();

    match momentum {
        MomentumSignal::Overbought => set.insert(SignalTag::Overbought),
        MomentumSignal::Oversold => set.insert(SignalTag::Oversold),
        MomentumSignal::Neutral => {}
    }

    if let Some(triple) = convergence {
        if triple.line > triple.signal {
            set.insert(SignalTag::BullishMacd);
        } else {
            set.insert(SignalTag::BearishMacd);
        }
    }

    match trend {
        Trend::Uptrend => set.insert(SignalTag::TrendFollowingBuy),
        Trend::Downtrend => set.insert(SignalTag::TrendFollowingSell),
        Trend::Sideways => {}
    }

    if volatility == Volatility::High {
        set.insert(SignalTag::HighVolatility);
    }

    set
}
