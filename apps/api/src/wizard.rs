//! Reading wizard state machine.
//!
//! Astrology: `Input → Confirmation → [Correction →] Generating → Result`.
//! Image readings skip the sign check: `Input → Generating → Result`.
//! A failed generation always returns to `Input`; there is no automatic retry.
//!
//! The correction branch only records that the user disagreed with the quick tropical
//! check. The chart itself is still computed under the system the user selected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::zodiac::ZodiacSign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardStep {
    Input,
    Confirmation {
        sign: ZodiacSign,
    },
    Correction {
        suggested: ZodiacSign,
    },
    /// Loading overlay while the reading is produced.
    Generating {
        quick_check: Option<ZodiacSign>,
        chosen: Option<ZodiacSign>,
    },
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    /// The quick tropical check produced a sign to confirm.
    SignDerived(ZodiacSign),
    /// An image reading was submitted; no confirmation step.
    Submitted,
    Confirm,
    Reject,
    Correct(Option<ZodiacSign>),
    Generated,
    Failed,
}

impl WizardEvent {
    fn name(self) -> &'static str {
        match self {
            WizardEvent::SignDerived(_) => "derive a sign",
            WizardEvent::Submitted => "submit",
            WizardEvent::Confirm => "confirm",
            WizardEvent::Reject => "reject",
            WizardEvent::Correct(_) => "correct the sign",
            WizardEvent::Generated => "finish generating",
            WizardEvent::Failed => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Please select a sign")]
    MissingCorrectedSign,

    #[error("Cannot {event} at the {step} step")]
    IllegalTransition {
        step: &'static str,
        event: &'static str,
    },
}

impl WizardStep {
    pub fn name(&self) -> &'static str {
        match self {
            WizardStep::Input => "input",
            WizardStep::Confirmation { .. } => "confirmation",
            WizardStep::Correction { .. } => "correction",
            WizardStep::Generating { .. } => "generating",
            WizardStep::Result => "result",
        }
    }

    pub fn apply(self, event: WizardEvent) -> Result<WizardStep, WizardError> {
        use WizardEvent as E;
        use WizardStep as S;

        match (self, event) {
            (_, E::Failed) => Ok(S::Input),
            (S::Input, E::SignDerived(sign)) => Ok(S::Confirmation { sign }),
            (S::Input, E::Submitted) => Ok(S::Generating {
                quick_check: None,
                chosen: None,
            }),
            (S::Confirmation { sign }, E::Confirm) => Ok(S::Generating {
                quick_check: Some(sign),
                chosen: Some(sign),
            }),
            (S::Confirmation { sign }, E::Reject) => Ok(S::Correction { suggested: sign }),
            (S::Correction { .. }, E::Correct(None)) => Err(WizardError::MissingCorrectedSign),
            (S::Correction { suggested }, E::Correct(Some(chosen))) => Ok(S::Generating {
                quick_check: Some(suggested),
                chosen: Some(chosen),
            }),
            (S::Generating { .. }, E::Generated) => Ok(S::Result),
            (step, event) => Err(WizardError::IllegalTransition {
                step: step.name(),
                event: event.name(),
            }),
        }
    }
}

/// The user's answer to the confirmation prompt, as sent with a chart request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAnswer {
    #[default]
    Confirmed,
    Corrected(Option<ZodiacSign>),
}

/// Replays a chart request's answer through the machine, ending at `Generating`.
pub fn replay_chart_answer(
    quick_check: ZodiacSign,
    answer: WizardAnswer,
) -> Result<WizardStep, WizardError> {
    let step = WizardStep::Input.apply(WizardEvent::SignDerived(quick_check))?;
    match answer {
        WizardAnswer::Confirmed => step.apply(WizardEvent::Confirm),
        WizardAnswer::Corrected(sign) => step
            .apply(WizardEvent::Reject)?
            .apply(WizardEvent::Correct(sign)),
    }
}
