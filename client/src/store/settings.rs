use crate::error::StorageError;
use crate::storage::Storage;
use shared::models::{AppSettings, ReasoningEffort, Strategy, Theme, Vendor};

pub const SETTINGS_KEY: &str = "fabric.settings";

#[derive(Clone, Debug, PartialEq)]
pub enum SettingsAction {
    /// Also switches the model to the vendor's default.
    SetVendor(Vendor),
    SetModel(String),
    SetTemperature(f32),
    SetTopP(f32),
    SetCredential { vendor: Vendor, key: String },
    SetOllamaUrl(String),
    SetServerUrl(String),
    SetTheme(Theme),
    SetReasoningEffort(ReasoningEffort),
    /// `None` turns the strategy off.
    SetStrategy(Option<Strategy>),
}

fn clamp_or(value: f32, max: f32, previous: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        previous
    }
}

pub fn reduce(state: &AppSettings, action: SettingsAction) -> AppSettings {
    let mut next = state.clone();
    match action {
        SettingsAction::SetVendor(vendor) => {
            next.vendor = vendor;
            next.model = vendor.default_model().to_string();
        }
        SettingsAction::SetModel(model) => {
            let model = model.trim();
            if !model.is_empty() {
                next.model = model.to_string();
            }
        }
        SettingsAction::SetTemperature(value) => {
            next.temperature = clamp_or(value, 2.0, state.temperature);
        }
        SettingsAction::SetTopP(value) => {
            next.top_p = clamp_or(value, 1.0, state.top_p);
        }
        SettingsAction::SetCredential { vendor, key } => {
            next.credentials.insert(vendor, key.trim().to_string());
        }
        SettingsAction::SetOllamaUrl(url) => next.ollama_url = url.trim().to_string(),
        SettingsAction::SetServerUrl(url) => next.server_url = url.trim().to_string(),
        SettingsAction::SetTheme(theme) => next.theme = theme,
        SettingsAction::SetReasoningEffort(effort) => next.reasoning_effort = effort,
        SettingsAction::SetStrategy(strategy) => next.strategy = strategy,
    }
    next
}

/// Settings read once from storage and written back after every change.
pub struct SettingsStore<S: Storage> {
    storage: S,
    settings: AppSettings,
}

impl<S: Storage> SettingsStore<S> {
    pub fn load(storage: S) -> Self {
        let mut settings: AppSettings = storage.get(SETTINGS_KEY).unwrap_or_default();
        settings.temperature = clamp_or(settings.temperature, 2.0, 0.7);
        settings.top_p = clamp_or(settings.top_p, 1.0, 0.95);
        Self { storage, settings }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn credential(&self, vendor: Vendor) -> Option<&str> {
        self.settings.credential(vendor)
    }

    pub fn dispatch(&mut self, action: SettingsAction) -> Result<(), StorageError> {
        self.settings = reduce(&self.settings, action);
        self.storage.set(SETTINGS_KEY, &self.settings)
    }
}
