use serde::{Deserialize, Serialize};

/// Fractional placement of a rectangle on a dashboard page, each value in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBox {
    pub rel_x: f64,
    pub rel_y: f64,
    pub rel_height: f64,
    pub rel_width: f64,
}

impl LayoutBox {
    pub fn new(rel_x: f64, rel_y: f64, rel_width: f64, rel_height: f64) -> Self {
        Self {
            rel_x,
            rel_y,
            rel_height,
            rel_width,
        }
    }

    /// The whole page.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn is_valid(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.rel_x)
            && unit.contains(&self.rel_y)
            && unit.contains(&self.rel_width)
            && unit.contains(&self.rel_height)
            && self.rel_x + self.rel_width <= 1.0 + f64::EPSILON
            && self.rel_y + self.rel_height <= 1.0 + f64::EPSILON
    }
}

impl Default for LayoutBox {
    fn default() -> Self {
        Self::full()
    }
}

/// One rectangle placement on a dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutElement {
    /// `None` until the instance exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_instance_id: Option<String>,
    pub module_name: String,
    #[serde(flatten)]
    pub layout: LayoutBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximized: Option<bool>,
}

impl LayoutElement {
    pub fn new(module_name: impl Into<String>, layout: LayoutBox) -> Self {
        Self {
            module_instance_id: None,
            module_name: module_name.into(),
            layout,
            minimized: None,
            maximized: None,
        }
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.module_instance_id = Some(id.into());
        self
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized.unwrap_or(false)
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized.unwrap_or(false)
    }
}
