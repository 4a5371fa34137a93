// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::String;
use alloc::vec::Vec;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A foreign call visible to the rules of one calling function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForeignCallDeclaration {
    pub name: String,
    pub id: u32,
    /// External function, e.g. `isAllowed(address,uint256)`
    pub signature: String,
    pub return_type: String,
    /// Comma separated arguments handed to the call
    #[serde(default)]
    pub values_to_pass: String,
    pub calling_function: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackerDeclaration {
    pub name: String,
    pub id: u32,
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(default)]
    pub initial_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappedTrackerDeclaration {
    pub name: String,
    pub id: u32,
    pub key_type: String,
    pub value_type: String,
    #[serde(default)]
    pub initial_keys: Vec<String>,
    #[serde(default)]
    pub initial_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallingFunctionDeclaration {
    pub name: String,
    /// Named signature, e.g. `transfer(address to, uint256 amount)`
    pub function_signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleDocument {
    pub condition: String,
    #[serde(default)]
    pub positive_effects: Vec<String>,
    #[serde(default)]
    pub negative_effects: Vec<String>,
    pub calling_function: String,
}

/// Everything a set of rules refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub policy_name: String,
    #[serde(default)]
    pub calling_functions: Vec<CallingFunctionDeclaration>,
    #[serde(default)]
    pub foreign_calls: Vec<ForeignCallDeclaration>,
    #[serde(default)]
    pub trackers: Vec<TrackerDeclaration>,
    #[serde(default)]
    pub mapped_trackers: Vec<MappedTrackerDeclaration>,
    #[serde(default)]
    pub rules: Vec<RuleDocument>,
}

impl PolicyDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Declaration matching `calling_function` by name or by signature.
    pub fn calling_function(&self, calling_function: &str) -> Option<&CallingFunctionDeclaration> {
        self.calling_functions.iter().find(|cf| {
            cf.name == calling_function || cf.function_signature == calling_function
        })
    }
}
