//! ShelfQuest - 图书发现与邮箱验证服务
//!
//! 提供按类型缓存的书籍检索、相似书籍推荐，以及基于一次性验证码的
//! 邮箱验证流程。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;
