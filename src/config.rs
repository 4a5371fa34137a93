// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tunable limits shared by the parser, compiler and decompiler.

/// Bounds applied to untrusted text and bytecode.
///
/// Every operation of the codec is total: input that exceeds these limits is
/// rejected with an error instead of exhausting the stack or memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum nesting depth of parentheses, `NOT` chains and mapped-tracker keys.
    pub max_nesting_depth: usize,
    /// Maximum number of words in a single instruction set.
    pub max_instructions: usize,
}

impl CodecLimits {
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;
    pub const DEFAULT_MAX_INSTRUCTIONS: usize = 4096;

    pub const fn new(max_nesting_depth: usize, max_instructions: usize) -> Self {
        Self {
            max_nesting_depth,
            max_instructions,
        }
    }
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_NESTING_DEPTH,
            Self::DEFAULT_MAX_INSTRUCTIONS,
        )
    }
}
