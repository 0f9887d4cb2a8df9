use serde::{Deserialize, Serialize};

pub const MIN_WIDTH: u32 = 300;
pub const MIN_HEIGHT: u32 = 200;
const DEFAULT_WIDTH: u32 = 400;
const DEFAULT_HEIGHT: u32 = 600;

/// Which nodes an apply or remap pass touches in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    #[default]
    Page,
    Document,
    Selection,
}

/// Preferences of the token editor UI, persisted under one client-storage key.
///
/// Every field has a default, so partial or older records read cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub width: u32,
    pub height: u32,
    pub show_empty_groups: bool,
    pub update_mode: UpdateMode,
    pub update_remote: bool,
    pub update_on_change: bool,
    pub update_styles: bool,
    pub ignore_first_part_for_styles: bool,
    pub inspect_deep: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            show_empty_groups: true,
            update_mode: UpdateMode::Page,
            update_remote: true,
            update_on_change: true,
            update_styles: true,
            ignore_first_part_for_styles: false,
            inspect_deep: false,
        }
    }
}

impl UiSettings {
    /// Raises the window size to its minimums.
    pub fn clamped(mut self) -> Self {
        self.width = self.width.max(MIN_WIDTH);
        self.height = self.height.max(MIN_HEIGHT);
        self
    }
}
