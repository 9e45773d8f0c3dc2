use std::sync::{Arc, RwLock};

use rmcp::{
    Error as McpError, ServerHandler,
    handler::server::tool::IntoCallToolResult,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    algorithms::DetectorKind,
    config::SimulatorConfig,
    manager::{WallMaskCommand, WallMaskManager},
    types::{DetectedWall, DetectionResult},
};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadMaskRequest {
    #[schemars(description = "Path to a grayscale wall mask image (white = wall)")]
    pub path: String,
    #[schemars(description = "Pixels above this value count as wall (default 127)")]
    pub threshold: Option<u8>,
    #[schemars(description = "Width of the photo the outlines should be reported in")]
    pub native_width: Option<u32>,
    #[schemars(description = "Height of the photo the outlines should be reported in")]
    pub native_height: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SimplificationRequest {
    #[schemars(
        description = "Simplification tolerance in working pixels (higher = fewer points)",
        range(min = 0.1, max = 20.0)
    )]
    pub tolerance: f32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StrategyRequest {
    #[schemars(description = "column_scan, centroid_raycast, moore_trace or border_following")]
    pub strategy: String,
}

#[derive(Debug, Serialize, schemars::JsonSchema, TS)]
#[ts(export)]
pub struct DetectionToolResponse {
    #[schemars(description = "Number of wall outlines detected; 0 means mask manually")]
    pub wall_count: usize,
    #[schemars(description = "Photo dimensions the outlines are expressed in")]
    pub image_dimensions: ImageDimensions,
    #[schemars(description = "Detected outlines in photo pixel coordinates")]
    pub polygons: Vec<DetectedWall>,
    #[schemars(description = "GeoJSON representation of the outlines")]
    #[ts(type = "unknown")]
    pub geojson: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema, TS)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl DetectionToolResponse {
    fn error(message: String) -> Self {
        Self {
            wall_count: 0,
            image_dimensions: ImageDimensions { width: 0, height: 0 },
            polygons: Vec::new(),
            geojson: serde_json::Value::Null,
            error: Some(message),
        }
    }
}

impl From<DetectionResult> for DetectionToolResponse {
    fn from(result: DetectionResult) -> Self {
        let geojson = serde_json::to_value(result.to_geojson()).unwrap_or(serde_json::Value::Null);
        Self {
            wall_count: result.walls.len(),
            image_dimensions: ImageDimensions {
                width: result.native_width,
                height: result.native_height,
            },
            polygons: result.walls,
            geojson,
            error: None,
        }
    }
}

impl IntoCallToolResult for DetectionToolResponse {
    fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&self).unwrap_or_else(|_| format!("{:?}", self)),
        )]))
    }
}

/// MCP server exposing wall detection over a loaded segmentation mask.
#[derive(Clone)]
pub struct WallMaskMcpServer {
    manager: Arc<RwLock<Option<WallMaskManager>>>,
    config: Arc<SimulatorConfig>,
}

impl WallMaskMcpServer {
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        Self {
            manager: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
        }
    }

    fn run(&self, command: WallMaskCommand) -> DetectionToolResponse {
        let guard = match self.manager.read() {
            Ok(guard) => guard,
            Err(_) => return DetectionToolResponse::error("Server state is poisoned".to_string()),
        };
        let Some(manager) = guard.as_ref() else {
            return DetectionToolResponse::error("No mask loaded. Please load a mask first.".to_string());
        };
        match manager.execute(command) {
            Ok(result) if result.is_empty() => {
                let mut response = DetectionToolResponse::from(result);
                response.error = Some("No wall found, please mask the wall manually".to_string());
                response
            }
            Ok(result) => result.into(),
            Err(e) => DetectionToolResponse::error(format!("Wall detection failed: {e}")),
        }
    }
}

impl Default for WallMaskMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool(tool_box)]
impl WallMaskMcpServer {
    #[tool(description = "Load a wall segmentation mask from a file path")]
    fn load_mask(&self, #[tool(aggr)] request: LoadMaskRequest) -> String {
        let LoadMaskRequest {
            path,
            threshold,
            native_width,
            native_height,
        } = request;
        let native = native_width.zip(native_height);
        let mut manager = WallMaskManager::with_config(self.config.detection.clone());
        if let Err(e) = manager.load_mask(&path, threshold.unwrap_or(127), native) {
            return format!("Failed to load mask from {path}: {e}");
        }
        let fraction = manager.map().map(|m| m.wall_fraction()).unwrap_or(0.0);
        match self.manager.write() {
            Ok(mut slot) => {
                *slot = Some(manager);
                format!("Mask loaded from {path} ({:.1}% wall)", fraction * 100.0)
            }
            Err(_) => "Server state is poisoned".to_string(),
        }
    }

    #[tool(description = "Detect the dominant wall outline in the loaded mask")]
    fn detect_wall(&self) -> DetectionToolResponse {
        self.run(WallMaskCommand::DetectWall)
    }

    #[tool(description = "Detect every connected wall region as a separate outline")]
    fn detect_multiple_walls(&self) -> DetectionToolResponse {
        self.run(WallMaskCommand::DetectMultipleWalls)
    }

    #[tool(description = "Detect the dominant wall and simplify its outline with Douglas-Peucker")]
    fn detect_with_simplification(
        &self,
        #[tool(aggr)] SimplificationRequest { tolerance }: SimplificationRequest,
    ) -> DetectionToolResponse {
        self.run(WallMaskCommand::DetectWithSimplification { tolerance })
    }

    #[tool(description = "Detect the dominant wall with a named boundary strategy")]
    fn detect_with_strategy(
        &self,
        #[tool(aggr)] StrategyRequest { strategy }: StrategyRequest,
    ) -> DetectionToolResponse {
        match strategy.parse::<DetectorKind>() {
            Ok(strategy) => self.run(WallMaskCommand::DetectWithStrategy { strategy }),
            Err(_) => DetectionToolResponse::error(format!(
                "Unknown strategy '{strategy}', expected one of {}",
                DetectorKind::names().join(", ")
            )),
        }
    }

    #[tool(description = "Get information about available commands and their parameters")]
    fn get_command_info(&self) -> String {
        let mut info = String::from("Available WallMaskCommands:\n\n");
        for (i, name) in WallMaskCommand::command_names().iter().enumerate() {
            info.push_str(&format!("{}. {}\n", i + 1, name));
        }

        info.push_str("\nCommand Details:\n");
        let commands = [
            WallMaskCommand::DetectWall,
            WallMaskCommand::DetectMultipleWalls,
            WallMaskCommand::DetectWithSimplification { tolerance: 2.0 },
            WallMaskCommand::DetectWithStrategy {
                strategy: DetectorKind::MooreTrace,
            },
        ];
        for cmd in commands {
            info.push_str(&format!("\n- {}\n", cmd));
            info.push_str(&format!("  Description: {}\n", cmd.description()));
            let params = cmd.parameters_info();
            if !params.is_empty() {
                info.push_str("  Parameters:\n");
                for (name, desc, required) in params {
                    let marker = if required { " (required)" } else { " (optional)" };
                    info.push_str(&format!("    - {name}{marker}: {desc}\n"));
                }
            }
        }
        info
    }

    #[tool(description = "Get the JSON schema for WallMaskCommand")]
    fn get_command_schema(&self) -> String {
        serde_json::to_string_pretty(&WallMaskCommand::schema())
            .unwrap_or_else(|e| format!("Failed to serialize schema: {e}"))
    }

    #[tool(description = "Get the JSON schema for the simulator configuration file")]
    fn get_config_schema(&self) -> String {
        serde_json::to_string_pretty(&SimulatorConfig::schema())
            .unwrap_or_else(|e| format!("Failed to serialize schema: {e}"))
    }
}

#[tool(tool_box)]
impl ServerHandler for WallMaskMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Wall detection server - load a wall segmentation mask, then detect wall outlines \
                 (column scan, centroid raycast, Moore tracing or border following) in photo coordinates."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
