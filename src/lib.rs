//! # DPP - Digital Product Passport identity core
//!
//! Decentralized identity for supply-chain product passports:
//! - **Identity**: DID identifiers, identity documents, Ed25519 keys
//! - **Key Store**: signing keys encrypted at rest under a password
//! - **Credentials**: issuance, verification and provenance chains
//! - **Ledger**: best-effort resolution of anchored identity documents
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dpp::core::PassportConfig;
//! use dpp::identity::Identifier;
//! use dpp::service::PassportService;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> dpp::Result<()> {
//!     let service = PassportService::open(PassportConfig::default()).await?;
//!     let farmer = service.create_identity("farm-password").await?;
//!     let lot = Identifier::parse("did:dpp:lot-0001")?;
//!
//!     let credential = service
//!         .issue_credential(&farmer.identifier, &lot, json!({"origin": "Ecuador"}), "farm-password")
//!         .await?;
//!     let result = service.verify_credential(&credential.to_json()?).await;
//!     println!("valid: {}", result.is_valid);
//!
//!     service.close().await
//! }
//! ```

pub mod core;
pub mod credential;
pub mod identity;
pub mod keystore;
pub mod ledger;
pub mod monitoring;
pub mod service;
pub mod storage;

pub use core::error::{Error, Result};
