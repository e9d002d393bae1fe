// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the analysis
// engine reads. Every public calculation returns `Option<T>` (or a
// fixed-shape default) so callers are forced to treat insufficient data and
// numerical edge cases as first-class outcomes, never as errors.

pub mod macd;
pub mod rsi;
pub mod volume;
