use crate::config::config::{AppConfig, MAX_OTP_TTL_SECS, MailBackend};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "SHELFQUEST_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 内置默认值
    /// 2. `SHELFQUEST_CONFIG` 指定的文件，或 ./config.toml
    /// 3. `SHELFQUEST_` 前缀的环境变量，`__` 分隔嵌套字段
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var(format!("{}CONFIG", ENV_PREFIX))
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(&path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.books.genres.iter().all(|g| g.trim().is_empty()) {
            return Err(ConfigValidationError::NoGenres);
        }

        if !(1..=40).contains(&config.books.cache_limit) {
            return Err(ConfigValidationError::InvalidCacheLimit(
                config.books.cache_limit,
            ));
        }

        if !(4..=9).contains(&config.otp.code_length) {
            return Err(ConfigValidationError::InvalidCodeLength(
                config.otp.code_length,
            ));
        }

        if !(1..=MAX_OTP_TTL_SECS).contains(&config.otp.ttl_secs) {
            return Err(ConfigValidationError::InvalidTtl);
        }

        if config.otp.max_attempts == 0 {
            return Err(ConfigValidationError::InvalidMaxAttempts);
        }

        if config.mail.backend == MailBackend::Http && config.mail.endpoint.is_empty() {
            return Err(ConfigValidationError::MissingMailEndpoint);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("server port must be greater than 0")]
    InvalidPort,

    #[error("books.genres must contain at least one genre")]
    NoGenres,

    #[error("books.cache_limit must be within 1..=40, got {0}")]
    InvalidCacheLimit(u32),

    #[error("otp.code_length must be within 4..=9, got {0}")]
    InvalidCodeLength(u32),

    #[error("otp.ttl_secs must be within 1..=86400")]
    InvalidTtl,

    #[error("otp.max_attempts must be greater than 0")]
    InvalidMaxAttempts,

    #[error("mail.endpoint is required when mail.backend = \"http\"")]
    MissingMailEndpoint,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigLoader::validate(&AppConfig::development()).is_ok());
        assert!(ConfigLoader::validate(&AppConfig::production()).is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_from(Path::new("/nonexistent/shelfquest.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.books.genres.len(), 8);
        assert_eq!(config.otp.code_length, 6);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("shelfquest-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[books]\ngenres = [\"fantasy\", \"scifi\"]\ncache_limit = 5\n\n[mail]\nbackend = \"http\"\nendpoint = \"http://mail.local/send\""
        )
        .unwrap();

        let config = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.books.genres, vec!["fantasy", "scifi"]);
        assert_eq!(config.books.cache_limit, 5);
        assert_eq!(config.mail.backend, MailBackend::Http);
        assert_eq!(config.otp.ttl_secs, 600);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_bounds_ttl() {
        let mut config = AppConfig::development();
        config.otp.ttl_secs = MAX_OTP_TTL_SECS;
        assert!(ConfigLoader::validate(&config).is_ok());

        config.otp.ttl_secs = MAX_OTP_TTL_SECS + 1;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTtl)
        );

        config.otp.ttl_secs = u64::MAX;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTtl)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::development();
        config.otp.code_length = 3;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidCodeLength(3))
        );

        let mut config = AppConfig::development();
        config.books.cache_limit = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidCacheLimit(0))
        );

        let mut config = AppConfig::development();
        config.mail.backend = MailBackend::Http;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingMailEndpoint)
        );

        let mut config = AppConfig::development();
        config.books.genres.clear();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::NoGenres)
        );
    }
}
