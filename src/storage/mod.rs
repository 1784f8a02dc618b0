//! 存储层模块
//!
//! 提供内存状态：OTP 记录、账户目录以及按用户名的互斥锁。

pub mod account_directory;
pub mod keyed_lock;
pub mod otp_store;

pub use account_directory::{AccountDirectory, InMemoryAccountDirectory};
pub use keyed_lock::KeyedLocks;
pub use otp_store::OtpStore;
