//! Layered loading of `superai.toml` files and `SUPERAI_*` variables

use super::file_config::{ConfigError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["superai.toml", ".superai.toml"];

/// Finds config files and merges them over the built-in defaults
pub struct ConfigLoader;

impl ConfigLoader {
    /// Merge every source; later layers win
    ///
    /// Highest first:
    /// 1. Environment: `SUPERAI_*`, `__` separating nested keys
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./superai.toml` or `./.superai.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/superai/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        Self::figment(config_path).extract().map_err(|e| Box::new(e).into())
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("SUPERAI_").split("__"))
    }

    /// Built-in defaults only, for `--no-config`
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `<config dir>/superai/config.toml`; `$XDG_CONFIG_HOME` on Linux
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("superai").join("config.toml"))
    }

    /// First project file present in the working directory
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// List each source and whether it was found, for `--show-config`
    pub fn print_config_sources(explicit: Option<&Path>) {
        println!("superai configuration sources, highest priority first:");
        println!("  [ENV  ] SUPERAI_* variables");

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./superai.toml or ./.superai.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use superai_domain::TriggerPolicy;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.aggregation.provider_timeout_seconds, 60);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("superai"));
    }

    #[test]
    fn test_project_file_and_env_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "superai.toml",
                r#"
[aggregation]
trigger = "all"

[providers.gpt]
model = "gpt-4o"
"#,
            )?;
            jail.set_env("SUPERAI_SERVER__BIND", "0.0.0.0:9000");

            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.bind, "0.0.0.0:9000");
            assert_eq!(config.trigger_policy().unwrap(), TriggerPolicy::AllSettled);
            assert_eq!(
                config.providers["gpt"].model.as_deref(),
                Some("gpt-4o")
            );
            // Untouched sections keep their defaults
            assert_eq!(config.synthesis.max_tokens, 2000);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_overrides_project() {
        Jail::expect_with(|jail| {
            jail.create_file(".superai.toml", "[server]\nbind = \"127.0.0.1:1\"\n")?;
            jail.create_file("custom.toml", "[server]\nbind = \"127.0.0.1:2\"\n")?;

            let explicit = PathBuf::from("custom.toml");
            let config = ConfigLoader::load(Some(&explicit)).map_err(|e| e.to_string())?;
            assert_eq!(config.server.bind, "127.0.0.1:2");
            Ok(())
        });
    }

    #[test]
    fn test_bad_type_is_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("superai.toml", "[aggregation]\nprovider_timeout_seconds = \"x\"\n")?;
            let err = ConfigLoader::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
