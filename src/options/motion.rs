use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::motion::DEFAULT_FADE_TIME;

/// Per-frame motion and render-buffer options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Motion", inline)]
#[serde(default)]
pub struct MotionOptions {
    /// Seconds over which lines fade in after birth and out before death.
    #[schemars(title = "Fade Time", range(min = 0.0))]
    pub fade_time: f64,
    /// Append the path lines to the render buffers.
    #[schemars(title = "Render Flow Line")]
    pub render_flow_line: bool,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            fade_time: DEFAULT_FADE_TIME,
            render_flow_line: false,
        }
    }
}
