use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

/// 书籍 API 与类型缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksConfig {
    /// Google Books volumes 接口地址
    pub api_url: String,
    /// API key，可选
    pub api_key: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 需要预缓存的书籍类型
    pub genres: Vec<String>,
    /// 每个类型缓存的书籍数量
    pub cache_limit: u32,
    /// 按类型实时查询的默认数量
    pub default_limit: u32,
    /// 启动时预热缓存
    pub warm_on_startup: bool,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.googleapis.com/books/v1/volumes".into(),
            api_key: None,
            timeout_secs: 10,
            genres: [
                "romance", "fiction", "thriller", "action", "mystery", "history", "horror",
                "fantasy",
            ]
            .iter()
            .map(|g| g.to_string())
            .collect(),
            cache_limit: 7,
            default_limit: 7,
            warm_on_startup: false,
        }
    }
}

/// OTP 有效期上限（秒）
pub const MAX_OTP_TTL_SECS: u64 = 86_400;

/// OTP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    /// OTP 有效期（秒）
    pub ttl_secs: u64,
    /// OTP 位数
    pub code_length: u32,
    /// 最大错误尝试次数，达到后 OTP 作废
    pub max_attempts: u32,
    /// 过期清理间隔（秒），0 表示关闭后台清理
    pub sweep_interval_secs: u64,
    /// 验证邮件主题
    pub email_subject: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            code_length: 6,
            max_attempts: 5,
            sweep_interval_secs: 300,
            email_subject: "Verify your ShelfQuest email.".into(),
        }
    }
}

/// 邮件发送后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// 只写日志，开发环境使用
    Log,
    /// 通过 HTTP 邮件服务发送
    Http,
}

/// 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// 发送后端
    pub backend: MailBackend,
    /// HTTP 邮件服务地址
    pub endpoint: String,
    /// HTTP 邮件服务密钥
    pub api_key: Option<String>,
    /// 发件人
    pub sender: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::Log,
            endpoint: String::new(),
            api_key: None,
            sender: "no-reply@shelfquest.app".into(),
            timeout_secs: 10,
        }
    }
}

/// 安全配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Rate limiting 启用
    pub rate_limit_enabled: bool,
    /// 单个客户端每分钟 OTP 请求数
    pub otp_requests_per_minute: u32,
    /// 允许的 CORS 来源，"*" 表示任意
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_enabled: true,
            otp_requests_per_minute: 10,
            cors_origins: vec!["*".into()],
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 启动时预置的账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAccount {
    pub username: String,
    pub email: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 书籍配置
    pub books: BooksConfig,
    /// OTP 配置
    pub otp: OtpConfig,
    /// 邮件配置
    pub mail: MailConfig,
    /// 安全配置
    pub security: SecurityConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 预置账户
    pub accounts: Vec<SeedAccount>,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig::default(),
            books: BooksConfig::default(),
            otp: OtpConfig::default(),
            mail: MailConfig::default(),
            security: SecurityConfig {
                rate_limit_enabled: false,
                ..SecurityConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".into(),
                ..LoggingConfig::default()
            },
            accounts: Vec::new(),
            app_name: "shelfquest".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.security.rate_limit_enabled = true;
        config.books.warm_on_startup = true;
        config
    }
}
