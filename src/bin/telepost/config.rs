use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use telepost::config::{read_config, Config};

use crate::config_data::write_sample_cfg;
use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cur_dir = env::current_dir().ok();

    [exe_dir, cur_dir, dirs::config_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Reads the config file, if any, then applies the variables returned by `var`
/// on top of it. With no file at all the configuration comes from `var` alone.
pub(crate) fn open_config<F>(cfg_path: Option<PathBuf>, var: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match cfg_path.or_else(get_config_path) {
        Some(path) => {
            println!("Reading config from {}", path.display());
            read_config(&path)?
        }
        None => {
            println!("No {} found, using environment variables", CFG_FILE_NAME);
            Config::default()
        }
    };

    config.apply_env(var)?;
    config.validate()?;

    if let Some(ref log) = config.log {
        match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log enabled on console"),
        }
    }

    Ok(config)
}

pub(crate) fn generate_cfg(config_path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match config_path {
        Some(path) => path,
        None => dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find user config dir"))?
            .join(CFG_FILE_NAME),
    };

    if path.exists() {
        return Err(anyhow!("{} already exists, not overwriting it", path.display()));
    }

    println!("Writing sample config to {}", path.display());
    write_sample_cfg(&path)
        .with_context(|| format!("Error writing {}", path.display()))?;

    Ok(path)
}
