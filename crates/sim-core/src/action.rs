//! Player intents and their outcomes.

use crate::state::{RoundId, UpgradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDirection {
    Up,
    Down,
}

/// Every mutation the presentation layer may request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ProduceOne,
    PurchaseResourceBatch { batch_size: u32 },
    AdjustPrice { direction: PriceDirection },
    PurchaseUpgrade { upgrade_id: UpgradeId },
    PurchaseMarketingLevel,
    RaiseFundingRound { round_id: RoundId },
    LaunchMvp,
    SetupHolding,
    TriggerExit,
    AcknowledgeMilestone,
    RestartSession,
}

/// Why an action was turned down. Rejections are ordinary gameplay, not
/// faults: the state is left untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("the session is over")]
    SessionOver,
    #[error("paused for a milestone")]
    Paused,
    #[error("not enough resource: need {needed}, have {available:.2}")]
    InsufficientResource { needed: f64, available: f64 },
    #[error("not enough cash: need {needed}, have {available}")]
    InsufficientCash { needed: Decimal, available: Decimal },
    #[error("batch size must be positive")]
    EmptyBatch,
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(UpgradeId),
    #[error("unknown funding round: {0}")]
    UnknownRound(RoundId),
    #[error("{what} unlocks at {required} lines of code")]
    Locked { what: String, required: f64 },
    #[error("valuation {current} is below the {round} threshold of {required}")]
    ValuationTooLow {
        round: RoundId,
        required: Decimal,
        current: Decimal,
    },
    #[error("requires the {0} round to be closed first")]
    RoundRequired(RoundId),
    #[error("{0} already done")]
    AlreadyDone(String),
    #[error("no milestone to acknowledge")]
    NoMilestone,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Applied,
    Rejected(Rejection),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ActionOutcome::Applied => None,
            ActionOutcome::Rejected(r) => Some(r),
        }
    }
}

impl From<Result<(), Rejection>> for ActionOutcome {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(r) => ActionOutcome::Rejected(r),
        }
    }
}
