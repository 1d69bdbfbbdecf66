pub mod circuit_breaker;
pub mod email;
pub mod health;
pub mod item;
pub mod message;
pub mod notification;
pub mod response;
pub mod retry;
pub mod status;
pub mod upload;
pub mod validation;
