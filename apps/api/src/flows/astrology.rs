//! Full astrology chart interpretation.

use serde::{Deserialize, Serialize};

use crate::flows::prompts::{ASTROLOGER_SYSTEM, CHART_PROMPT_TEMPLATE};
use crate::flows::validation::{Checks, ValidationError};
use crate::flows::{all_blank, null_as_default, string_object_schema, BirthDetails, Flow, FlowOutput, ReadingKind};
use crate::llm_client::ModelRequest;
use crate::zodiac::AstrologySystem;

const CHART_FIELDS: [&str; 6] = [
    "personalityTraits",
    "lifeTendencies",
    "keyInsights",
    "nextMonthForecast",
    "nextThreeYearsForecast",
    "significantEvents",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstrologyChartInput {
    #[serde(flatten)]
    pub birth: BirthDetails,
    #[serde(default)]
    pub astrology_system: AstrologySystem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstrologyChart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personality_traits: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub life_tendencies: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_insights: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_month_forecast: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_three_years_forecast: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub significant_events: String,
}

impl FlowOutput for AstrologyChart {
    fn is_incomplete(&self) -> bool {
        all_blank(&[
            &self.personality_traits,
            &self.life_tendencies,
            &self.key_insights,
            &self.next_month_forecast,
            &self.next_three_years_forecast,
            &self.significant_events,
        ])
    }
}

pub struct AstrologyChartFlow;

impl Flow for AstrologyChartFlow {
    const NAME: &'static str = "interpretAstrologicalChart";
    const KIND: ReadingKind = ReadingKind::AstrologyChart;
    type Input = AstrologyChartInput;
    type Output = AstrologyChart;

    fn prepare(input: &AstrologyChartInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        input.birth.check(&mut checks);
        checks.finish()?;

        let prompt = input.birth.fill(
            CHART_PROMPT_TEMPLATE,
            &[("astrology_system", input.astrology_system.label())],
        );

        Ok(ModelRequest {
            flow: Self::NAME,
            system: ASTROLOGER_SYSTEM.to_string(),
            prompt,
            output_schema: string_object_schema(&CHART_FIELDS, &CHART_FIELDS),
            media: None,
        })
    }
}
