//! Auth types shared across the Harvest workspace.
//!
//! Provides JWT session-token issue/validation and the [`identity::Identity`]
//! bearer-token extractor.

pub mod identity;
pub mod token;
