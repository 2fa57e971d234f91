//! Infrastructure layer: concrete storage, delivery, and wire conversion.

pub mod conversion;
pub mod message_pusher;
pub mod repository;
