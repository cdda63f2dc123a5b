/// Application name, used for config and data directory names.
pub const APP_NAME: &str = "wpm";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "wpm.yaml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV: &str = "WPM_CONFIG";

/// Default AddOns directory of a standard Windows client installation.
pub const WINDOWS_ADDONS_DIR: &str = r"C:\Program Files (x86)\World of Warcraft\Interface\AddOns";
