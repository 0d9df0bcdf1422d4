//! Pure helper functions shared by the engine and adapters

pub mod email;
pub mod title;
