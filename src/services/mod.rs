//! 服务模块

pub mod book_source;
pub mod genre_cache;
pub mod notification;
pub mod otp;

pub use book_source::{BookSource, GoogleBooksSource, create_book_source};
pub use genre_cache::{GenreCache, PopulationReport};
pub use notification::{
    HttpMailGateway, LogNotificationGateway, NotificationGateway, create_notification_gateway,
};
pub use otp::{IssuedOtp, OtpLifecycleManager, OtpPolicy};
