// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod gateway;
pub mod profile;
pub mod search;
pub mod token;

pub use gateway::RegistryClient;
pub use profile::{ProfileOptions, ProfileService, ProfileSource};
pub use search::{SearchOptions, SearchService};
pub use token::TokenManager;
