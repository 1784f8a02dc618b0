//! 核心数据模型模块
//!
//! 定义 ShelfQuest 的数据结构：BookRecord, OtpRecord, Account 等。

pub mod account;
pub mod book;
pub mod otp;

pub use account::{Account, EmailMessage};
pub use book::{BookRecord, SimilarQuery, normalize_genre};
pub use otp::OtpRecord;
