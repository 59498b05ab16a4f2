//! Interpretation of a [`ComparisonResult`]: significance verdict,
//! advisories and recommendations shown beneath the comparison table.

use crate::analysis::{ComparisonResult, Metric};

/// p-value below which an improvement counts as statistically significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Improvement (in percent) beyond which an advisory is raised.
pub const NOTABLE_IMPROVEMENT_PCT: f64 = 5.0;

/// Advisory notes derived from a comparison result.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// AI assignment cut processing time by more than the notable margin.
    /// Carries the absolute percentage.
    AiFasterProcessing(f64),
    /// AI assignment raised the completion rate by more than the notable
    /// margin.
    HigherCompletionRate(f64),
    /// The sample does not support a significant conclusion.
    InsufficientSignificance,
}

impl Advisory {
    pub fn message(&self) -> String {
        match self {
            Advisory::AiFasterProcessing(pct) => format!(
                "AI assignment is markedly faster: processing time is {pct:.1}% lower than manual assignment"
            ),
            Advisory::HigherCompletionRate(pct) => format!(
                "Completion rate under AI assignment is {pct:.1}% higher than manual assignment"
            ),
            Advisory::InsufficientSignificance => {
                "Not statistically significant: the sample may be too small to draw a \
                 conclusion; widen the date range or collect more data"
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    KeepOptimisingAiRouting,
    ReevaluateAiRouting,
    CompletionRateHealthy,
    ReviewWorkloadBalance,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Recommendation::KeepOptimisingAiRouting => {
                "Keep refining the AI routing model to hold its lead."
            }
            Recommendation::ReevaluateAiRouting => {
                "Re-evaluate the AI routing strategy and consider tuning the model."
            }
            Recommendation::CompletionRateHealthy => {
                "The current routing strategy performs well on completion rate."
            }
            Recommendation::ReviewWorkloadBalance => {
                "Review how tickets are distributed and check assignee workload."
            }
        }
    }
}

impl ComparisonResult {
    /// `true` when the reported p-value is strictly below
    /// [`SIGNIFICANCE_THRESHOLD`].
    pub fn is_significant(&self) -> bool {
        self.statistical_significance < SIGNIFICANCE_THRESHOLD
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        let mut advisories = Vec::new();
        let improvements = &self.improvements;

        if improvements.processing_time < -NOTABLE_IMPROVEMENT_PCT {
            advisories.push(Advisory::AiFasterProcessing(
                improvements.processing_time.abs(),
            ));
        }
        if improvements.completion_rate > NOTABLE_IMPROVEMENT_PCT {
            advisories.push(Advisory::HigherCompletionRate(
                improvements.completion_rate,
            ));
        }
        if !self.is_significant() {
            advisories.push(Advisory::InsufficientSignificance);
        }

        advisories
    }

    /// One recommendation on processing time, one on completion rate.
    pub fn recommendations(&self) -> [Recommendation; 2] {
        let improvements = &self.improvements;
        let routing = if improvements.is_favorable(Metric::ProcessingTime) {
            Recommendation::KeepOptimisingAiRouting
        } else {
            Recommendation::ReevaluateAiRouting
        };
        let completion = if improvements.is_favorable(Metric::CompletionRate) {
            Recommendation::CompletionRateHealthy
        } else {
            Recommendation::ReviewWorkloadBalance
        };
        [routing, completion]
    }
}
