// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod expr;
pub mod literals;
pub mod operators;
pub mod references;

pub use expr::*;
pub use literals::*;
pub use operators::*;
pub use references::*;
