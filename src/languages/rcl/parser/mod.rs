// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod condition_parser;
mod error;
mod primary;

pub use condition_parser::{parse_expression, parse_expression_with_limits, RclParser};
pub use error::ParseError;
