use crate::domain::models::{FlagKey, GlobalConfig, NumberKey, PolicyOverrides};

/// Resolves a numeric policy setting through the Event -> Student -> Config
/// cascade. A tier wins if its value passes the numeric validity test; an
/// absent owner skips straight to the config default.
pub fn resolve_number(
    entity: &PolicyOverrides,
    owner: Option<&PolicyOverrides>,
    config: &GlobalConfig,
    key: NumberKey,
) -> f64 {
    if let Some(value) = entity.number(key).as_number() {
        return value;
    }
    if let Some(value) = owner.and_then(|o| o.number(key).as_number()) {
        return value;
    }
    config.default_number(key)
}

/// Boolean counterpart: a tier wins only with a literal boolean.
pub fn resolve_flag(
    entity: &PolicyOverrides,
    owner: Option<&PolicyOverrides>,
    config: &GlobalConfig,
    key: FlagKey,
) -> bool {
    if let Some(value) = entity.flag(key).as_flag() {
        return value;
    }
    if let Some(value) = owner.and_then(|o| o.flag(key).as_flag()) {
        return value;
    }
    config.default_flag(key)
}
