//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置来源的加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 读取并解析配置文件，文件不存在时返回 `ConfigError::FileNotFound`
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 解析TOML文本
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 检查合并后的配置
    ///
    /// 加载阶段不做验证，目标列表可能在命令行或环境变量中才给出。
    fn validate(&self, config: &Config) -> Result<()>;
}

/// 基于TOML文件的配置加载器
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否展开 `${VAR}` 引用
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// # 参数
    /// * `enable_env_substitution` - 解析前是否展开文件中的 `${VAR}` 引用
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 展开 `${VAR}` 引用
    ///
    /// 替换一次完成，变量值中出现的 `${...}` 不会再次展开。
    /// 引用了未设置的变量时返回第一个缺失变量的错误。
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("变量引用模式无效: {}", e)))?;

        let mut missing: Option<String> = None;
        let expanded = pattern.replace_all(content, |caps: &regex::Captures<'_>| {
            match std::env::var(&caps[1]) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(var) => Err(ConfigError::EnvVarError { var }.into()),
            None => Ok(expanded.into_owned()),
        }
    }

    fn parse_toml(&self, content: &str) -> Result<Config> {
        let expanded = self.substitute_env_vars(content)?;
        toml::from_str(&expanded)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)).into())
    }

    /// 得到命令行覆盖之前的基础配置
    ///
    /// 显式给出的路径必须存在。未给出时使用默认路径上的文件，
    /// 默认路径也没有文件则退回内置默认值。
    pub async fn load_or_default(&self, path: Option<&Path>) -> Result<Config> {
        if let Some(path) = path {
            return self.load_from_file(path).await;
        }

        let default_path = get_default_config_path();
        if !default_path.exists() {
            log::debug!("{} 不存在，使用内置默认配置", default_path.display());
            return Ok(Config::default());
        }
        self.load_from_file(&default_path).await
    }
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("无法读取 {}: {}", path.display(), e)))?;
        let config = self.parse_toml(&content)?;

        log::info!("已加载配置文件 {}（{} 个目标）", path.display(), config.targets.len());
        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        self.parse_toml(content)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 默认配置文件位置
///
/// 工作目录下的 `config.toml` 优先，其次是用户配置目录下的
/// `health-guardian/config.toml`。
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }

    match dirs::config_dir() {
        Some(dir) => dir.join(crate::APP_NAME).join("config.toml"),
        None => local,
    }
}
