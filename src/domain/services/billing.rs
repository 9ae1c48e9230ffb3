use crate::domain::models::{Event, EventStatus, FlagKey, GlobalConfig, NumberKey, Student};
use crate::domain::services::policy;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Monetary value of a lesson instance under the cancellation-fee policy.
///
/// A canceled lesson is free unless cancellation charging is enabled, the fee
/// percentage is nonzero, and the cancellation lead time (start minus
/// `canceled_at`) strictly exceeds the free-cancellation window in hours; the
/// boundary itself stays free. The fee is a percentage of the would-have-been
/// charge, so it scales with price and duration like a completed lesson.
pub fn event_value(event: &Event, student: Option<&Student>, config: &GlobalConfig) -> f64 {
    if event.experimental {
        return 0.0;
    }

    let owner = student.map(|s| &s.policy);
    let number = |key| policy::resolve_number(&event.policy, owner, config, key);
    let flag = |key| policy::resolve_flag(&event.policy, owner, config, key);

    let mut fee_pct = 100.0;
    if event.status == EventStatus::Canceled {
        if !flag(FlagKey::ChargeCancelation) {
            return 0.0;
        }
        let fee = number(NumberKey::CancelationFee);
        if fee == 0.0 {
            return 0.0;
        }
        let Some(canceled_at) = event.canceled_at else {
            return 0.0;
        };
        let Some(start) = event.start() else {
            return 0.0;
        };
        let lead_ms = (start - canceled_at).num_milliseconds() as f64;
        let grace_ms = number(NumberKey::FreeCancelationBefore) * MS_PER_HOUR;
        if lead_ms <= grace_ms {
            return 0.0;
        }
        fee_pct = fee;
    }

    let cost = number(NumberKey::Cost);
    let base = if flag(FlagKey::VariableCost) {
        cost * number(NumberKey::Duration)
    } else {
        cost
    };
    base * fee_pct / 100.0
}
