use crate::models::settings::AnalyticsSettings;
use crate::services::settings_service::SettingsUpdateInput;

use super::{AppState, CommandResult};

pub fn settings_get(state: &AppState) -> CommandResult<AnalyticsSettings> {
    Ok(state.settings().get()?)
}

pub fn settings_update(
    state: &AppState,
    payload: SettingsUpdateInput,
) -> CommandResult<AnalyticsSettings> {
    Ok(state.update_settings(payload)?)
}
