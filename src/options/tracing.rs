use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default vertices per path-line half.
pub const DEFAULT_POINTS_ON_PATH_LINE: usize = 200;
/// Default vertices per key frame.
pub const DEFAULT_POINTS_ON_FIELDLINES: usize = 100;

/// How source files are traced into matched path lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Tracing", inline)]
#[serde(default)]
pub struct TracingOptions {
    /// Vector variable traced to build path lines.
    #[schemars(title = "Tracing Variable")]
    pub tracing_variable: String,
    /// Vertices per path-line half.
    #[schemars(title = "Points on Path Line", range(min = 2))]
    pub number_of_points_on_path_line: usize,
    /// Vertices per field line.
    #[schemars(title = "Points on Field Lines", range(min = 2))]
    pub number_of_points_on_fieldlines: usize,
    /// Seconds added to the source start time.
    #[schemars(title = "Manual Time Offset")]
    pub manual_time_offset: f64,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            tracing_variable: "u_perp_b".to_owned(),
            number_of_points_on_path_line: DEFAULT_POINTS_ON_PATH_LINE,
            number_of_points_on_fieldlines: DEFAULT_POINTS_ON_FIELDLINES,
            manual_time_offset: 0.0,
        }
    }
}

impl TracingOptions {
    /// Replace point counts below 2 with the defaults.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.number_of_points_on_path_line < 2 {
            log::warn!(
                "number_of_points_on_path_line = {} is too small, using {DEFAULT_POINTS_ON_PATH_LINE}",
                self.number_of_points_on_path_line
            );
            self.number_of_points_on_path_line = DEFAULT_POINTS_ON_PATH_LINE;
        }
        if self.number_of_points_on_fieldlines < 2 {
            log::warn!(
                "number_of_points_on_fieldlines = {} is too small, using {DEFAULT_POINTS_ON_FIELDLINES}",
                self.number_of_points_on_fieldlines
            );
            self.number_of_points_on_fieldlines = DEFAULT_POINTS_ON_FIELDLINES;
        }
        self
    }
}
