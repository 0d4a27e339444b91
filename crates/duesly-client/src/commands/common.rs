use std::path::Path;

use chrono::NaiveDateTime;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ClientResult;
use crate::intelligence::date::resolve_now;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    if let Some(home) = home_override {
        return ensure_initialized_at(home);
    }
    ensure_initialized()
}

pub(crate) fn command_now(now_override: Option<NaiveDateTime>) -> NaiveDateTime {
    resolve_now(now_override)
}

/// Seeded when a caller needs reproducible message selection or ids.
pub(crate) fn command_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
