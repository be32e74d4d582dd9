//! 核心框架模块
//!
//! - Event: 发布/订阅与退订句柄

pub mod event;

pub use event::{Emitter, Subscription};
