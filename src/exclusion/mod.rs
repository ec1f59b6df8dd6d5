//! Category exclusions: the authoritative local ledger and its remote mirror.

pub mod ledger;
pub mod mirror;
