pub mod controller;
pub mod viewport;

pub use controller::InteractionController;
pub use viewport::{PointerEvent, ViewTransform};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[ts(export)]
pub enum EditMode {
    #[default]
    View,
    Masking,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[ts(export)]
pub enum ActiveTool {
    #[default]
    Polygon,
    BrushAdd,
    BrushRemove,
}

impl ActiveTool {
    pub fn brush(self) -> Option<crate::types::BrushTool> {
        match self {
            ActiveTool::Polygon => None,
            ActiveTool::BrushAdd => Some(crate::types::BrushTool::Add),
            ActiveTool::BrushRemove => Some(crate::types::BrushTool::Remove),
        }
    }
}
