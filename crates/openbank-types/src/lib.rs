//! OpenBank Types — canonical domain types for the OpenBanking sandbox.
//!
//! This crate has zero dependencies on other openbank crates. It defines
//! the complete type system for:
//!
//! - Identity types (AccountId, ConsentId, PaymentId, ClientId, ...)
//! - Currency and fixed-point money types
//! - The consent domain (five kinds sharing one state machine)
//! - Accounts, transactions, cards
//! - Payments and inter-bank transfers
//! - Product agreements and bank capital
//! - The shared error taxonomy

pub mod account;
pub mod capital;
pub mod card;
pub mod client;
pub mod consent;
pub mod currency;
pub mod error;
pub mod identity;
pub mod merchant;
pub mod money;
pub mod notification;
pub mod payment;
pub mod product;

pub use account::*;
pub use capital::*;
pub use card::*;
pub use client::*;
pub use consent::*;
pub use currency::*;
pub use error::*;
pub use identity::*;
pub use merchant::*;
pub use money::*;
pub use notification::*;
pub use payment::*;
pub use product::*;

/// Version of the OpenBank domain type schema.
pub const TYPES_VERSION: &str = "0.1.0";
