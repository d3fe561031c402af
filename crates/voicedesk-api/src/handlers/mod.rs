//! Request handlers

pub mod agents;
pub mod calls;
pub mod conversations;
pub mod health;
pub mod voices;
