//! 验证码生成
//!
//! 使用操作系统 CSPRNG，拒绝采样避免取模偏差。

use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

/// 数字验证码生成器
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    length: u32,
}

impl CodeGenerator {
    /// 位数限制在 4..=9
    pub fn new(length: u32) -> Self {
        Self {
            length: length.clamp(4, 9),
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// 生成一个定长数字验证码，保留前导零
    pub fn generate(&self) -> Result<String> {
        let modulus = 10u64.pow(self.length);
        let span = 1u64 << 32;
        let zone = span - span % modulus;

        let mut rng = OsRng;
        loop {
            let value = rng
                .try_next_u32()
                .map_err(|e| AppError::Internal(format!("OS random source unavailable: {}", e)))?
                as u64;
            if value < zone {
                return Ok(format!(
                    "{:0width$}",
                    value % modulus,
                    width = self.length as usize
                ));
            }
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

/// 常量时间比较
pub fn codes_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}
