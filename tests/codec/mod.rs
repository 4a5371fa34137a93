// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use rcl_codec::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, Debug)]
struct Declaration {
    name: String,
    id: u32,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    key_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Symbols {
    signature: String,
    #[serde(default)]
    foreign_calls: Vec<Declaration>,
    #[serde(default)]
    trackers: Vec<Declaration>,
    #[serde(default)]
    mapped_trackers: Vec<Declaration>,
}

fn param_type(name: &str) -> Result<ParamType> {
    match ParamType::from_type_name(name) {
        Some(p_type) => Ok(p_type),
        None => bail!("unknown type {name}"),
    }
}

impl Symbols {
    fn context(&self) -> Result<SymbolContext> {
        let mut ctx = SymbolContext::from_signature(&self.signature)?;
        for fc in &self.foreign_calls {
            ctx.add_foreign_call(&fc.name, fc.id, param_type(&fc.type_name)?)?;
        }
        for tracker in &self.trackers {
            ctx.add_tracker(&tracker.name, tracker.id, param_type(&tracker.type_name)?)?;
        }
        for tracker in &self.mapped_trackers {
            let Some(key_type) = &tracker.key_type else {
                bail!("mapped tracker {} needs a key_type", tracker.name);
            };
            ctx.add_mapped_tracker(
                &tracker.name,
                tracker.id,
                param_type(key_type)?,
                param_type(&tracker.type_name)?,
            )?;
        }
        Ok(ctx)
    }
}

#[derive(Deserialize, Debug)]
struct TestCase {
    note: String,
    #[serde(default)]
    symbols: Option<Symbols>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    valid_grammar: Option<bool>,
    #[serde(default)]
    program: Option<Program>,
    #[serde(default)]
    effect: Option<String>,
    #[serde(default)]
    encoded_effect: Option<EncodedEffect>,
    #[serde(default)]
    want_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    symbols: Symbols,
    cases: Vec<TestCase>,
}

fn check_result(result: Result<String>, case: &TestCase, fallback: Option<&str>) -> Result<()> {
    match (result, &case.error) {
        (Ok(text), None) => {
            let want = case.want_text.as_deref().or(fallback).unwrap_or_default();
            if text != want {
                bail!("expected `{want}`, got `{text}`");
            }
        }
        (Ok(text), Some(error)) => bail!("expected error containing `{error}`, got `{text}`"),
        (Err(e), Some(error)) => {
            let actual = e.to_string();
            if !actual.contains(error.as_str()) {
                bail!("expected error containing `{error}`, got `{actual}`");
            }
        }
        (Err(e), None) => return Err(e),
    }
    Ok(())
}

fn run_condition(codec: &Codec, case: &TestCase, condition: &str) -> Result<()> {
    if let Some(valid) = case.valid_grammar {
        if codec.is_valid_grammar(condition) != valid {
            bail!("grammar validity of `{condition}` should be {valid}");
        }
        return Ok(());
    }

    let decoded = codec
        .compile_condition(condition)
        .and_then(|program| codec.decompile(&program));
    check_result(decoded, case, None)?;

    if case.error.is_none() {
        // Decompiled text is valid RCL that compiles back to the same program.
        let text = codec.decompile(&codec.compile_condition(condition)?)?;
        if !codec.is_valid_grammar(&text) {
            bail!("decompiled `{text}` is not valid RCL");
        }
        if codec.compile_condition(&text)? != codec.compile_condition(condition)? {
            bail!("`{text}` does not compile to the same program as `{condition}`");
        }
    }
    Ok(())
}

fn run_program(codec: &Codec, case: &TestCase, program: &Program) -> Result<()> {
    let first = codec.decompile(program);
    if let (Ok(first), Ok(second)) = (&first, &codec.decompile(program)) {
        if first != second {
            bail!("decompiling twice gave `{first}` and `{second}`");
        }
    }
    check_result(first, case, None)
}

fn run_effect(codec: &Codec, case: &TestCase, effect: &str) -> Result<()> {
    let decoded = codec
        .encode_effect(effect)
        .and_then(|encoded| codec.decode_effect(&encoded));
    check_result(decoded, case, Some(effect))
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");
    let default_symbols = test.symbols.context()?;

    for case in &test.cases {
        print!("case {} ", case.note);
        let symbols = match &case.symbols {
            Some(symbols) => symbols.context()?,
            None => default_symbols.clone(),
        };
        let codec = Codec::new(symbols);

        if let Some(condition) = &case.condition {
            run_condition(&codec, case, condition)?;
        } else if let Some(program) = &case.program {
            run_program(&codec, case, program)?;
        } else if let Some(effect) = &case.effect {
            run_effect(&codec, case, effect)?;
        } else if let Some(encoded) = &case.encoded_effect {
            check_result(codec.decode_effect(encoded), case, None)?;
        } else {
            bail!("case {} has nothing to run", case.note);
        }
        println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/codec/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
