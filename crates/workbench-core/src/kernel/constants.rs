/// Application name
pub const APP_NAME: &str = "Workbench";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory of the local key-value store
pub const DEFAULT_DATA_DIR: &str = ".workbench";

/// Default config file name, looked up inside the data directory
pub const DEFAULT_CONFIG_FILE: &str = "workbench.toml";

/// Log filter applied when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name given to dashboards created without one
pub const DEFAULT_DASHBOARD_NAME: &str = "Dashboard";

/// Pointer travel in pixels before a press turns into a drag
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// TOP/BOTTOM band height on plain items, as a fraction of the item height
pub const ITEM_EDGE_FRACTION: f64 = 0.5;

/// TOP/BOTTOM band height on groups, as a fraction of the group height
pub const GROUP_EDGE_FRACTION: f64 = 0.5;

/// Cap on the group bands in pixels
pub const GROUP_EDGE_CAP_PX: f64 = 10.0;

/// Height of the auto-scroll trigger band at each edge of the scroll container
pub const SCROLL_BAND_PX: f64 = 50.0;

/// Pixels scrolled per auto-scroll step
pub const SCROLL_STEP_PX: f64 = 10.0;

pub const SCROLL_INITIAL_DELAY_MS: u64 = 100;

pub const SCROLL_MIN_DELAY_MS: u64 = 16;

/// Delay multiplier applied after each auto-scroll step
pub const SCROLL_ACCELERATION: f64 = 0.85;
