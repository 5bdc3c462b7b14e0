//! Monthly and yearly forecasts, and the combined report that fans out to both.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::flows::prompts::{ASTROLOGER_SYSTEM, MONTHLY_PROMPT_TEMPLATE, YEARLY_PROMPT_TEMPLATE};
use crate::flows::validation::{parse_birth_date, Checks, ValidationError};
use crate::flows::{
    all_blank, null_as_default, run, string_object_schema, BirthDetails, Flow, FlowError,
    FlowOutput, ReadingKind,
};
use crate::llm_client::{ModelBackend, ModelRequest};

// ────────────────────────────────────────────────────────────────────────────
// Monthly
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecastInput {
    #[serde(flatten)]
    pub birth: BirthDetails,
    /// `YYYY-MM-DD`
    pub current_date: String,
}

impl MonthlyForecastInput {
    pub fn as_of(birth: BirthDetails, today: NaiveDate) -> Self {
        Self {
            birth,
            current_date: today.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecast {
    #[serde(default, deserialize_with = "null_as_default")]
    pub this_month_forecast: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_month_forecast: String,
}

impl FlowOutput for MonthlyForecast {
    fn is_incomplete(&self) -> bool {
        all_blank(&[&self.this_month_forecast, &self.next_month_forecast])
    }
}

pub struct MonthlyForecastFlow;

impl Flow for MonthlyForecastFlow {
    const NAME: &'static str = "monthlyForecast";
    const KIND: ReadingKind = ReadingKind::MonthlyForecast;
    type Input = MonthlyForecastInput;
    type Output = MonthlyForecast;

    fn prepare(input: &MonthlyForecastInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        input.birth.check(&mut checks);
        checks.check("currentDate", parse_birth_date(&input.current_date));
        checks.finish()?;

        let fields = ["thisMonthForecast", "nextMonthForecast"];
        Ok(ModelRequest {
            flow: Self::NAME,
            system: ASTROLOGER_SYSTEM.to_string(),
            prompt: input.birth.fill(
                MONTHLY_PROMPT_TEMPLATE,
                &[("current_date", input.current_date.trim())],
            ),
            output_schema: string_object_schema(&fields, &fields),
            media: None,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Yearly
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyPredictionsInput {
    #[serde(flatten)]
    pub birth: BirthDetails,
    /// e.g. "July 26, 2024"
    pub current_full_date: String,
    pub current_year: i32,
    pub next_year: i32,
    pub year_after_next: i32,
}

impl YearlyPredictionsInput {
    pub fn as_of(birth: BirthDetails, today: NaiveDate) -> Self {
        let year = today.year();
        Self {
            birth,
            current_full_date: today.format("%B %-d, %Y").to_string(),
            current_year: year,
            next_year: year + 1,
            year_after_next: year + 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyPredictions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub this_year_outlook: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_year_outlook: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year_after_next_outlook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_significant_events: Option<String>,
}

impl FlowOutput for YearlyPredictions {
    fn is_incomplete(&self) -> bool {
        all_blank(&[
            &self.this_year_outlook,
            &self.next_year_outlook,
            &self.year_after_next_outlook,
        ])
    }
}

pub struct YearlyPredictionsFlow;

impl Flow for YearlyPredictionsFlow {
    const NAME: &'static str = "yearlyPredictions";
    const KIND: ReadingKind = ReadingKind::YearlyPredictions;
    type Input = YearlyPredictionsInput;
    type Output = YearlyPredictions;

    fn prepare(input: &YearlyPredictionsInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        input.birth.check(&mut checks);
        if input.current_full_date.trim().is_empty() {
            checks.fail("currentFullDate", "Current date is required.");
        }
        if input.next_year != input.current_year + 1
            || input.year_after_next != input.current_year + 2
        {
            checks.fail("nextYear", "Forecast years must be consecutive.");
        }
        checks.finish()?;

        let current_year = input.current_year.to_string();
        let next_year = input.next_year.to_string();
        let year_after_next = input.year_after_next.to_string();
        let prompt = input.birth.fill(
            YEARLY_PROMPT_TEMPLATE,
            &[
                ("current_full_date", input.current_full_date.trim()),
                ("current_year", current_year.as_str()),
                ("next_year", next_year.as_str()),
                ("year_after_next", year_after_next.as_str()),
            ],
        );

        Ok(ModelRequest {
            flow: Self::NAME,
            system: ASTROLOGER_SYSTEM.to_string(),
            prompt,
            output_schema: string_object_schema(
                &[
                    "thisYearOutlook",
                    "nextYearOutlook",
                    "yearAfterNextOutlook",
                    "generalSignificantEvents",
                ],
                &["thisYearOutlook", "nextYearOutlook", "yearAfterNextOutlook"],
            ),
            media: None,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Combined report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedForecastInput {
    #[serde(flatten)]
    pub birth: BirthDetails,
    pub as_of: NaiveDate,
}

/// Monthly and yearly forecasts merged into one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedForecast {
    pub this_month_forecast: String,
    pub next_month_forecast: String,
    pub this_year_outlook: String,
    pub next_year_outlook: String,
    pub year_after_next_outlook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_significant_events: Option<String>,
}

fn or_fallback(text: Option<String>, fallback: impl FnOnce() -> String) -> String {
    text.filter(|t| !t.trim().is_empty()).unwrap_or_else(fallback)
}

/// Runs the monthly and yearly flows concurrently.
///
/// Either half may fail on its own; its sections are then replaced with fixed
/// "could not generate" sentences. Fails only when both halves fail, with the monthly
/// error.
pub async fn combined_forecast(
    backend: &dyn ModelBackend,
    input: &CombinedForecastInput,
) -> Result<CombinedForecast, FlowError> {
    let mut checks = Checks::new();
    input.birth.check(&mut checks);
    checks.finish()?;

    let monthly_input = MonthlyForecastInput::as_of(input.birth.clone(), input.as_of);
    let yearly_input = YearlyPredictionsInput::as_of(input.birth.clone(), input.as_of);

    let (monthly, yearly) = tokio::join!(
        run::<MonthlyForecastFlow>(backend, &monthly_input),
        run::<YearlyPredictionsFlow>(backend, &yearly_input),
    );

    let (monthly, yearly) = match (monthly, yearly) {
        (Err(monthly_err), Err(yearly_err)) => {
            warn!(%monthly_err, %yearly_err, "both forecast halves failed");
            return Err(monthly_err);
        }
        (monthly, yearly) => (log_half("monthly", monthly), log_half("yearly", yearly)),
    };

    let year = yearly_input.current_year;
    let (this_month, next_month) = match monthly {
        Some(m) => (Some(m.this_month_forecast), Some(m.next_month_forecast)),
        None => (None, None),
    };
    let (this_year, next_year, after_next, general) = match yearly {
        Some(y) => (
            Some(y.this_year_outlook),
            Some(y.next_year_outlook),
            Some(y.year_after_next_outlook),
            y.general_significant_events,
        ),
        None => (None, None, None, None),
    };

    Ok(CombinedForecast {
        this_month_forecast: or_fallback(this_month, || {
            "Could not generate this month's forecast.".to_string()
        }),
        next_month_forecast: or_fallback(next_month, || {
            "Could not generate next month's forecast.".to_string()
        }),
        this_year_outlook: or_fallback(this_year, || {
            format!("Could not generate outlook for {year}.")
        }),
        next_year_outlook: or_fallback(next_year, || {
            format!("Could not generate outlook for {}.", year + 1)
        }),
        year_after_next_outlook: or_fallback(after_next, || {
            format!("Could not generate outlook for {}.", year + 2)
        }),
        general_significant_events: general.filter(|g| !g.trim().is_empty()),
    })
}

fn log_half<T>(half: &'static str, result: Result<T, FlowError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(half, error = %e, "forecast half failed, using fallback text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::GenerationError;
    use crate::llm_client::LlmError;
    use crate::test_support::ScriptedBackend;
    use serde_json::json;

    fn birth() -> BirthDetails {
        BirthDetails {
            birth_date: "1990-07-15".to_string(),
            birth_time: "14:30".to_string(),
            birth_location: "Mumbai, India".to_string(),
        }
    }

    fn july_26() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 26).unwrap()
    }

    fn monthly_json() -> serde_json::Value {
        json!({"thisMonthForecast": "Focus on home.", "nextMonthForecast": "Travel opens up."})
    }

    fn yearly_json() -> serde_json::Value {
        json!({
            "thisYearOutlook": "Consolidation.",
            "nextYearOutlook": "Expansion.",
            "yearAfterNextOutlook": "Harvest.",
            "generalSignificantEvents": "A move abroad."
        })
    }

    #[test]
    fn test_yearly_input_as_of_uses_long_date() {
        let input = YearlyPredictionsInput::as_of(birth(), july_26());
        assert_eq!(input.current_full_date, "July 26, 2024");
        assert_eq!(
            (input.current_year, input.next_year, input.year_after_next),
            (2024, 2025, 2026)
        );
    }

    #[test]
    fn test_yearly_prompt_names_each_year() {
        let request =
            YearlyPredictionsFlow::prepare(&YearlyPredictionsInput::as_of(birth(), july_26()))
                .unwrap();
        assert!(request.prompt.contains("thisYearOutlook: 2024"));
        assert!(request.prompt.contains("yearAfterNextOutlook: 2026"));
        assert!(request.prompt.contains("Today is July 26, 2024."));
    }

    #[test]
    fn test_monthly_rejects_bad_current_date() {
        let mut input = MonthlyForecastInput::as_of(birth(), july_26());
        input.current_date = "26/07/2024".to_string();
        let err = MonthlyForecastFlow::prepare(&input).unwrap_err();
        assert!(err.message_for("currentDate").is_some());
    }

    #[tokio::test]
    async fn test_combined_report_merges_both_halves() {
        let backend = ScriptedBackend::default()
            .for_flow(MonthlyForecastFlow::NAME, Ok(Some(monthly_json())))
            .for_flow(YearlyPredictionsFlow::NAME, Ok(Some(yearly_json())));
        let input = CombinedForecastInput {
            birth: birth(),
            as_of: july_26(),
        };

        let report = combined_forecast(&backend, &input).await.unwrap();

        assert_eq!(backend.calls(), 2);
        assert_eq!(report.this_month_forecast, "Focus on home.");
        assert_eq!(report.year_after_next_outlook, "Harvest.");
        assert_eq!(report.general_significant_events.as_deref(), Some("A move abroad."));
    }

    #[tokio::test]
    async fn test_failed_half_gets_fallback_sentences() {
        let backend = ScriptedBackend::default()
            .for_flow(MonthlyForecastFlow::NAME, Ok(Some(monthly_json())))
            .for_flow(
                YearlyPredictionsFlow::NAME,
                Err(LlmError::Api {
                    status: 500,
                    message: "boom".to_string(),
                }),
            );
        let input = CombinedForecastInput {
            birth: birth(),
            as_of: july_26(),
        };

        let report = combined_forecast(&backend, &input).await.unwrap();

        assert_eq!(report.next_month_forecast, "Travel opens up.");
        assert_eq!(report.this_year_outlook, "Could not generate outlook for 2024.");
        assert_eq!(report.next_year_outlook, "Could not generate outlook for 2025.");
        assert_eq!(report.year_after_next_outlook, "Could not generate outlook for 2026.");
        assert!(report.general_significant_events.is_none());
    }

    #[tokio::test]
    async fn test_both_halves_failing_is_an_error() {
        let backend = ScriptedBackend::new(vec![Ok(None), Ok(None)]);
        let input = CombinedForecastInput {
            birth: birth(),
            as_of: july_26(),
        };

        let err = combined_forecast(&backend, &input).await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Generation(GenerationError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn test_combined_report_validates_before_fanning_out() {
        let backend = ScriptedBackend::replying(vec![]);
        let mut details = birth();
        details.birth_date = String::new();
        let input = CombinedForecastInput {
            birth: details,
            as_of: july_26(),
        };

        let err = combined_forecast(&backend, &input).await.unwrap_err();

        assert!(matches!(err, FlowError::Validation(_)));
        assert_eq!(backend.calls(), 0);
    }
}
