// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{ParamType, SymbolError};

/// One parameter of a calling function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameter {
    pub name: String,
    pub raw_type: String,
    pub p_type: ParamType,
}

/// Parsed `name(type arg, ...)` function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<SignatureParameter>,
}

impl FunctionSignature {
    /// Parse a signature such as `transfer(address to, uint256 amount)`.
    ///
    /// Every parameter must be named; the names become the argument symbols
    /// that conditions refer to.
    pub fn parse(signature: &str) -> Result<Self, SymbolError> {
        let invalid = |reason: &str| SymbolError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        let signature_text = signature.trim();
        let (name, rest) = signature_text
            .split_once('(')
            .ok_or_else(|| invalid("missing '('"))?;
        let params = rest
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing ')'"))?;

        let name = name.trim();
        if name.is_empty() || !is_identifier(name) {
            return Err(invalid("function name is not an identifier"));
        }

        let mut parameters: Vec<SignatureParameter> = Vec::new();
        if !params.trim().is_empty() {
            for param in params.split(',') {
                let mut parts = param.split_whitespace();
                let (Some(raw_type), Some(arg_name), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(invalid("each parameter must be written as '<type> <name>'"));
                };
                let p_type = ParamType::from_type_name(raw_type)
                    .ok_or_else(|| invalid("unsupported parameter type"))?;
                if !is_identifier(arg_name) {
                    return Err(invalid("parameter name is not an identifier"));
                }
                if parameters.iter().any(|p| p.name == arg_name) {
                    return Err(invalid("duplicate parameter name"));
                }
                parameters.push(SignatureParameter {
                    name: arg_name.to_string(),
                    raw_type: raw_type.to_string(),
                    p_type,
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            parameters,
        })
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn parse_named_parameters() {
        let sig = FunctionSignature::parse("transfer(address to, uint256 amount)").unwrap();
        assert_eq!(sig.name, "transfer");
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0].name, "to");
        assert_eq!(sig.parameters[0].p_type, ParamType::Address);
        assert_eq!(sig.parameters[1].raw_type, "uint256");
    }

    #[test]
    fn parse_empty_parameter_list() {
        let sig = FunctionSignature::parse("pause()").unwrap();
        assert!(sig.parameters.is_empty());
    }

    #[test]
    fn reject_malformed() {
        for bad in [
            "transfer",
            "transfer(address to",
            "transfer(address)",
            "transfer(address to, address to)",
            "transfer(float x)",
            "(address to)",
        ] {
            assert!(FunctionSignature::parse(bad).is_err(), "{bad}");
        }
    }
}
