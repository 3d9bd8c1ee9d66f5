// src/models/mod.rs

pub mod account;
pub mod class_level;
pub mod question;
pub mod quiz_record;
