use crate::domain::DiffViewType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables of the engine. Every threshold the loader, registry, expansion
/// and tree builder use lives here so it can be overridden from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size of the first batch request.
    pub per_page: u32,
    /// Review one file at a time (first page size forced to 1).
    pub single_file_mode: bool,
    /// Growth multiplier in tenths: 14 means 1.4.
    pub initial_growth_tenths: u32,
    pub growth_step_tenths: u32,
    pub max_growth_tenths: u32,
    pub max_page_size: u32,
    /// Gaps smaller than this are expanded in both directions at once.
    pub expand_both_threshold: u32,
    pub render_immediately_threshold: usize,
    pub auto_collapse_threshold: usize,
    pub max_rendering_diff_lines: usize,
    pub start_rendering_index: usize,
    pub max_rendering_bulk_rows: usize,
    pub tree_name_max_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            per_page: 5,
            single_file_mode: false,
            initial_growth_tenths: 14,
            growth_step_tenths: 2,
            max_growth_tenths: 20,
            max_page_size: 30,
            expand_both_threshold: 20,
            render_immediately_threshold: 100,
            auto_collapse_threshold: 2000,
            max_rendering_diff_lines: 500,
            start_rendering_index: 200,
            max_rendering_bulk_rows: 30,
            tree_name_max_width: 40,
        }
    }
}

impl EngineConfig {
    /// Size of the first page, honoring single file mode.
    pub fn first_page_size(&self) -> u32 {
        if self.single_file_mode {
            1
        } else {
            self.per_page.max(1)
        }
    }
}

/// Reviewer preferences persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub diff_view_type: DiffViewType,
    pub show_tree_list: bool,
    pub render_tree_list: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            diff_view_type: DiffViewType::Inline,
            show_tree_list: true,
            render_tree_list: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub view: ViewPreferences,
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|err| {
        log::warn!("Ignoring unreadable config {}: {err}", path.display());
        AppConfig::default()
    })
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).unwrap_or_default();
    std::fs::write(path, contents)
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DIFFSTATE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("DIFFSTATE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("diffstate");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("diffstate");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("diffstate");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("diffstate");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".diffstate")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.engine.per_page = 12;
        config.engine.expand_both_threshold = 10;
        config.view.diff_view_type = DiffViewType::Parallel;
        save_config_to(&path, &config).unwrap();

        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nsingle_file_mode = true\n").unwrap();

        let config = load_config_from(&path);
        assert!(config.engine.single_file_mode);
        assert_eq!(config.engine.first_page_size(), 1);
        assert_eq!(config.engine.max_page_size, 30);
        assert!(config.view.show_tree_list);
    }

    #[test]
    fn test_missing_or_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config_from(&dir.path().join("absent.toml")),
            AppConfig::default()
        );

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "engine = [").unwrap();
        assert_eq!(load_config_from(&path), AppConfig::default());
    }
}
