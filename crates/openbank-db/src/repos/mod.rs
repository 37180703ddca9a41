//! Repository implementations

mod account;
mod bank_settings;
mod capital;
mod card;
mod client;
mod consent;
mod notification;
mod payment;
mod product;

pub use account::{AccountRepo, CloseDisposition};
pub use bank_settings::BankSettingsRepo;
pub use capital::BankCapitalRepo;
pub use card::CardRepo;
pub use client::ClientRepo;
pub use consent::{ConsentRepo, RequestOutcome};
pub use notification::NotificationRepo;
pub use payment::{PaymentGate, PaymentRepo};
pub use product::{ProductAgreementRepo, ProductRepo};
