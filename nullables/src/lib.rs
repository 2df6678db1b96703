//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! The ledger service is abstracted behind the `LedgerService` trait. This
//! crate provides an in-memory implementation that:
//! - Builds transactions with deterministic ids
//! - Enforces permission thresholds and capability masks on broadcast
//! - Can be steered programmatically (funding, injected rejections)
//! - Never touches the network
//!
//! Usage: pass a `NullLedger` wherever a wallet operation takes a service.

pub mod ledger;

pub use ledger::NullLedger;
