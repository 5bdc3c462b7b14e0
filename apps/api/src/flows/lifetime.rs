//! Year-by-year lifetime horoscope.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::flows::prompts::{ASTROLOGER_SYSTEM, LIFETIME_PROMPT_TEMPLATE};
use crate::flows::validation::{Checks, ValidationError};
use crate::flows::{null_as_default, BirthDetails, Flow, FlowOutput, ReadingKind};
use crate::llm_client::ModelRequest;

pub const DEFAULT_NUMBER_OF_YEARS: u32 = 80;
pub const MAX_NUMBER_OF_YEARS: u32 = 100;

fn default_number_of_years() -> u32 {
    DEFAULT_NUMBER_OF_YEARS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeHoroscopeInput {
    #[serde(flatten)]
    pub birth: BirthDetails,
    /// Defaults to the birth year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default = "default_number_of_years")]
    pub number_of_years: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyForecast {
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub forecast: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeHoroscope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub forecasts: Vec<YearlyForecast>,
}

impl FlowOutput for LifetimeHoroscope {
    fn is_incomplete(&self) -> bool {
        self.forecasts.iter().all(|f| f.forecast.trim().is_empty())
    }
}

pub struct LifetimeHoroscopeFlow;

impl Flow for LifetimeHoroscopeFlow {
    const NAME: &'static str = "lifetimeHoroscope";
    const KIND: ReadingKind = ReadingKind::LifetimeHoroscope;
    type Input = LifetimeHoroscopeInput;
    type Output = LifetimeHoroscope;

    fn prepare(input: &LifetimeHoroscopeInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        let birth_date = input.birth.check(&mut checks);
        if !(1..=MAX_NUMBER_OF_YEARS).contains(&input.number_of_years) {
            checks.fail(
                "numberOfYears",
                format!("Number of years must be between 1 and {MAX_NUMBER_OF_YEARS}."),
            );
        }
        let start_year = checks.finish_with(input.start_year.or(birth_date.map(|d| d.year())))?;

        let start_year = start_year.to_string();
        let number_of_years = input.number_of_years.to_string();
        let prompt = input.birth.fill(
            LIFETIME_PROMPT_TEMPLATE,
            &[
                ("start_year", start_year.as_str()),
                ("number_of_years", number_of_years.as_str()),
            ],
        );

        Ok(ModelRequest {
            flow: Self::NAME,
            system: ASTROLOGER_SYSTEM.to_string(),
            prompt,
            output_schema: json!({
                "type": "object",
                "properties": {
                    "forecasts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "year": { "type": "integer" },
                                "forecast": { "type": "string" }
                            },
                            "required": ["year", "forecast"]
                        }
                    }
                },
                "required": ["forecasts"]
            }),
            media: None,
        })
    }
}
