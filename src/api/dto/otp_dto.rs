//! OTP DTO

use serde::Deserialize;

/// 发送 OTP 请求
///
/// 字段缺失时反序列化为空字符串，由服务层统一报告 MalformedRequest。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendOtpRequest {
    pub username: String,
    pub email: String,
}

/// 验证 OTP 请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOtpRequest {
    pub username: String,
    pub otp: String,
}
