//! 可观测性模块
//!
//! 提供 Prometheus 格式指标、结构化日志和健康检查。

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::config::LoggingConfig;
use crate::error::{AppError, Result};

// ===== Simple Metrics (atomics) =====

/// 应用指标
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub cache_populations_total: AtomicU64,
    pub cache_hits_total: AtomicU64,
    pub cache_misses_total: AtomicU64,
    pub otp_issued_total: AtomicU64,
    pub otp_verified_total: AtomicU64,
    pub otp_rejected_total: AtomicU64,
    pub upstream_errors_total: AtomicU64,
    pub rate_limited_total: AtomicU64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// 记录缓存填充
    pub fn record_cache_population(&self) {
        self.cache_populations_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录缓存读取
    pub fn record_cache_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.cache_hits_total
        } else {
            &self.cache_misses_total
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录 OTP 签发
    pub fn record_otp_issued(&self) {
        self.otp_issued_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录 OTP 验证结果
    pub fn record_otp_verification(&self, success: bool) {
        let counter = if success {
            &self.otp_verified_total
        } else {
            &self.otp_rejected_total
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录外部服务错误
    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录被限流的请求
    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let counters = [
            ("http_requests_total", "Total HTTP requests", &self.http_requests_total),
            (
                "cache_populations_total",
                "Successful genre cache populations",
                &self.cache_populations_total,
            ),
            ("cache_hits_total", "Genre cache hits", &self.cache_hits_total),
            ("cache_misses_total", "Genre cache misses", &self.cache_misses_total),
            ("otp_issued_total", "OTPs issued", &self.otp_issued_total),
            ("otp_verified_total", "OTPs verified", &self.otp_verified_total),
            ("otp_rejected_total", "OTP verifications rejected", &self.otp_rejected_total),
            (
                "upstream_errors_total",
                "Book source or mail service failures",
                &self.upstream_errors_total,
            ),
            ("rate_limited_total", "Requests rejected by rate limiting", &self.rate_limited_total),
        ];

        let mut output = String::new();
        for (name, help, counter) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        output.push_str(&format!(
            "# HELP http_request_duration_seconds HTTP request duration in seconds\n\
# TYPE http_request_duration_seconds summary\n\
http_request_duration_seconds_sum {}\n\
http_request_duration_seconds_count {}\n",
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::Relaxed),
        ));
        output
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub checked_at: String,
}

/// 依赖服务最近一次的检查结果
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub name: String,
    pub healthy: bool,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(name: &str, message: &str) -> Self {
        Self::new(name, true, message)
    }

    pub fn unhealthy(name: &str, message: &str) -> Self {
        Self::new(name, false, message)
    }

    fn new(name: &str, healthy: bool, message: &str) -> Self {
        Self {
            name: name.to_string(),
            healthy,
            message: message.to_string(),
            checked_at: Utc::now(),
        }
    }
}

/// 可观测性状态
#[derive(Debug)]
pub struct ObservabilityState {
    pub metrics: AppMetrics,
    /// 按依赖名称保存最近一次结果
    pub health_checks: Mutex<BTreeMap<String, HealthCheckResult>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: &str) -> Self {
        Self {
            metrics: AppMetrics::default(),
            health_checks: Mutex::new(BTreeMap::new()),
            start_time: Utc::now(),
            version: version.to_string(),
        }
    }

    /// 更新某个依赖的健康检查结果
    pub async fn report(&self, result: HealthCheckResult) {
        let mut checks = self.health_checks.lock().await;
        checks.insert(result.name.clone(), result);
    }

    /// 根据外部调用结果更新健康状态并统计错误
    pub async fn observe_upstream<T>(&self, dependency: &str, result: &Result<T>) {
        match result {
            Ok(_) => self.report(HealthCheckResult::healthy(dependency, "ok")).await,
            Err(AppError::Upstream(message)) => {
                self.metrics.record_upstream_error();
                self.report(HealthCheckResult::unhealthy(dependency, message))
                    .await
            }
            Err(_) => {}
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    async fn all_healthy(&self) -> bool {
        self.health_checks.lock().await.values().all(|c| c.healthy)
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    let all_healthy = checks.values().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: checks
            .values()
            .map(|c| HealthCheck {
                name: c.name.clone(),
                status: if c.healthy { "healthy" } else { "unhealthy" }.to_string(),
                message: Some(c.message.clone()),
                checked_at: c.checked_at.to_rfc3339(),
            })
            .collect(),
    };

    let status_code = if all_healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查（检查依赖服务）
pub async fn readiness(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    if state.all_healthy().await {
        (axum::http::StatusCode::OK, "Ready")
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "Not Ready")
    }
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let output = state.metrics.gather();
    (axum::http::StatusCode::OK, output)
}

/// 版本信息端点
pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别。配置了 `log_dir` 时按天滚动写入文件，
/// 否则写到标准输出。返回的 guard 需要在进程生命周期内保持存活。
pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::Config(format!("invalid log level: {}", e)))?;

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "shelfquest.log"))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(writer);

    let installed = if config.structured {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Config(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(state): State<Arc<ObservabilityState>>,
    req: Request,
    next: Next,
) -> Response {
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    state
        .metrics
        .record_http_request(start.elapsed().as_millis() as u64);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::default();
        metrics.record_http_request(100);
        metrics.record_cache_lookup(true);
        metrics.record_cache_lookup(false);
        metrics.record_otp_issued();
        metrics.record_otp_verification(false);
        metrics.record_upstream_error();

        let output = metrics.gather();
        assert!(output.contains("http_requests_total 1"));
        assert!(output.contains("cache_hits_total 1"));
        assert!(output.contains("cache_misses_total 1"));
        assert!(output.contains("otp_issued_total 1"));
        assert!(output.contains("otp_verified_total 0"));
        assert!(output.contains("otp_rejected_total 1"));
        assert!(output.contains("upstream_errors_total 1"));
        assert!(output.contains("http_request_duration_seconds_sum 0.1"));
    }

    #[tokio::test]
    async fn test_upstream_failure_marks_dependency_unhealthy() {
        let state = ObservabilityState::new("0.1.0");
        assert!(state.all_healthy().await);

        let failed: Result<()> = Err(AppError::Upstream("503".into()));
        state.observe_upstream("book_source", &failed).await;
        assert!(!state.all_healthy().await);
        assert_eq!(
            state.metrics.upstream_errors_total.load(Ordering::Relaxed),
            1
        );

        let recovered: Result<()> = Ok(());
        state.observe_upstream("book_source", &recovered).await;
        assert!(state.all_healthy().await);
    }

    #[tokio::test]
    async fn test_non_upstream_errors_do_not_affect_health() {
        let state = ObservabilityState::new("0.1.0");
        let miss: Result<()> = Err(AppError::GenreNotCached("fantasy".into()));
        state.observe_upstream("book_source", &miss).await;
        assert!(state.all_healthy().await);
        assert!(state.health_checks.lock().await.is_empty());
    }
}
