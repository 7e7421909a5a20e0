//! API route handlers

pub mod chain;
pub mod price;
pub mod wallets;
