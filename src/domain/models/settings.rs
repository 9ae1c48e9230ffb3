use serde::{Deserialize, Serialize};

/// A single policy setting as stored on an entity. The source data is loosely
/// typed: a field may hold a number, a numeric string, a boolean, or nothing
/// at all, and "nothing" must stay distinguishable from zero or `false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    #[default]
    Unset,
    Flag(bool),
    Num(f64),
    Text(String),
}

impl Setting {
    /// Numeric view: accepts numbers and non-empty numeric-coercible strings.
    /// Zero is a value; only unset / empty / non-numeric text count as absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Setting::Num(n) => Some(*n),
            Setting::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// Boolean view: only a literal boolean counts, everything else is absent.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Setting::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Setting::Unset)
    }
}

impl From<f64> for Setting {
    fn from(value: f64) -> Self {
        Setting::Num(value)
    }
}

impl From<bool> for Setting {
    fn from(value: bool) -> Self {
        Setting::Flag(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKey {
    Cost,
    Duration,
    FreeCancelationBefore,
    CancelationFee,
    MinutesBefore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKey {
    VariableCost,
    ChargeCancelation,
}

/// Per-entity overrides of the billing and notification policy. Present on
/// both students and events; unset fields fall through to the next tier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverrides {
    pub cost: Setting,
    pub duration: Setting,
    pub variable_cost: Setting,
    pub charge_cancelation: Setting,
    pub free_cancelation_before: Setting,
    pub cancelation_fee: Setting,
    pub minutes_before: Setting,
}

impl PolicyOverrides {
    pub fn number(&self, key: NumberKey) -> &Setting {
        match key {
            NumberKey::Cost => &self.cost,
            NumberKey::Duration => &self.duration,
            NumberKey::FreeCancelationBefore => &self.free_cancelation_before,
            NumberKey::CancelationFee => &self.cancelation_fee,
            NumberKey::MinutesBefore => &self.minutes_before,
        }
    }

    pub fn flag(&self, key: FlagKey) -> &Setting {
        match key {
            FlagKey::VariableCost => &self.variable_cost,
            FlagKey::ChargeCancelation => &self.charge_cancelation,
        }
    }
}

/// User-level defaults and agenda behavior switches. The final tier of the
/// policy cascade, always concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub cost: f64,
    /// Default lesson length in hours.
    pub duration: f64,
    pub variable_cost: bool,
    pub charge_cancelation: bool,
    /// Cancellation lead time in hours beyond which the fee applies.
    pub free_cancelation_before: f64,
    /// Percentage of the would-have-been charge.
    pub cancelation_fee: f64,
    /// Event reminder lead time in minutes.
    pub minutes_before: f64,

    /// Generation horizon in days (today inclusive on both ends).
    pub number_of_days: u32,
    pub auto_create_events: bool,
    pub auto_finish_events: bool,
    /// Minutes past a lesson start after which it counts as finished.
    pub auto_finish_offset: i64,
    pub auto_remove_past_events: bool,
    pub removal_grace_hours: i64,

    pub notify_birthday: bool,
    pub notify_birthday_day_before: bool,
    /// "YYYY-MM-DD" of the last full notification refresh.
    pub last_refresh_date: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            cost: 50.0,
            duration: 1.0,
            variable_cost: true,
            charge_cancelation: false,
            free_cancelation_before: 1.0,
            cancelation_fee: 50.0,
            minutes_before: 15.0,
            number_of_days: 14,
            auto_create_events: true,
            auto_finish_events: false,
            auto_finish_offset: 30,
            auto_remove_past_events: false,
            removal_grace_hours: 48,
            notify_birthday: true,
            notify_birthday_day_before: true,
            last_refresh_date: None,
        }
    }
}

impl GlobalConfig {
    pub fn default_number(&self, key: NumberKey) -> f64 {
        match key {
            NumberKey::Cost => self.cost,
            NumberKey::Duration => self.duration,
            NumberKey::FreeCancelationBefore => self.free_cancelation_before,
            NumberKey::CancelationFee => self.cancelation_fee,
            NumberKey::MinutesBefore => self.minutes_before,
        }
    }

    pub fn default_flag(&self, key: FlagKey) -> bool {
        match key {
            FlagKey::VariableCost => self.variable_cost,
            FlagKey::ChargeCancelation => self.charge_cancelation,
        }
    }
}
