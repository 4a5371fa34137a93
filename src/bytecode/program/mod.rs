// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod core;
#[cfg(feature = "listing")]
mod listing;

pub use core::{Program, RawDataReplacement};
#[cfg(feature = "listing")]
pub use listing::{generate_listing, ListingConfig};
