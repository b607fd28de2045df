//! ACME certificate orchestration CLI.
//!
//! Wraps an external ACME client (`acme.sh`) for issuing, installing, and
//! renewing TLS certificates: domain certificates via DNS-01 challenges and
//! short-lived IP certificates via HTTP-01. The crate never speaks the ACME
//! protocol itself. It manages provider credentials, invokes the client with
//! the right arguments and environment, installs the issued material to a
//! predictable layout, and keeps a non-destructive cron renewal job alive.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Business logic (store, registry, scanner, renewal, issuance)
//! - `models` — Data structures
//! - `util` — System utilities (fs, cron, acme.sh subprocess)

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
