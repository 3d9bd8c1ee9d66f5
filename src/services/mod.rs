// src/services/mod.rs

pub mod accounts;
pub mod console;
pub mod question_bank;
