//! Run gate: decides whether a run may proceed and with which toggles

use cadence_domain::SyncSettings;

use super::error::ReconcileError;

/// Settings a run proceeds with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub bidirectional: bool,
    pub auto_create_meeting_link: bool,
    /// The run only proceeds because it was forced past a disabled or missing
    /// configuration.
    pub forced: bool,
}

/// Evaluate the gate.
///
/// A missing record counts as disabled with every toggle off. A forced run
/// keeps whatever toggles the stored record carries.
pub fn evaluate(
    force: bool,
    stored: Option<SyncSettings>,
) -> Result<EffectiveSettings, ReconcileError> {
    let settings = stored.unwrap_or_default();
    if !settings.enabled && !force {
        return Err(ReconcileError::SyncDisabled);
    }

    Ok(EffectiveSettings {
        bidirectional: settings.bidirectional,
        auto_create_meeting_link: settings.auto_create_meeting_link,
        forced: !settings.enabled,
    })
}
