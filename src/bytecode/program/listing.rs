// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::format;
use alloc::string::{String, ToString as _};
use core::fmt::{self, Write as _};

use num_traits::ToPrimitive;

use crate::bytecode::instructions::{Instruction, Opcode};
use crate::bytecode::placeholder::decode_placeholder;
use crate::bytecode::program::Program;
use crate::symbols::SymbolContext;

// Writing into a String via fmt never fails, so we intentionally ignore writeln! results.
fn push_line(buf: &mut String, args: fmt::Arguments) {
    let _ = buf.write_fmt(args);
    let _ = buf.write_char('\n');
}

/// Configuration for assembly listing output
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Show the memory address each group writes
    pub show_addresses: bool,
    /// Show the flat position of each opcode cell
    pub show_positions: bool,
    /// Annotate placeholders and raw data
    pub show_comments: bool,
    /// Column position for comments
    pub comment_column: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            show_addresses: true,
            show_positions: false,
            show_comments: true,
            comment_column: 32,
        }
    }
}

/// Generate an annotated listing for a compiled program.
///
/// Placeholders are rendered as RCL references when a symbol context is given.
/// A malformed instruction set is listed up to the first bad group.
pub fn generate_listing(
    program: &Program,
    ctx: Option<&SymbolContext>,
    config: &ListingConfig,
) -> String {
    let mut output = String::new();

    push_line(
        &mut output,
        format_args!(
            "; RCL program - {} words, {} placeholders, {} raw data entries",
            program.instruction_set.len(),
            program.placeholders.len(),
            program.raw_data.len()
        ),
    );

    if !program.placeholders.is_empty() {
        push_line(&mut output, format_args!(";"));
        push_line(&mut output, format_args!("; PLACEHOLDERS:"));
        for (idx, placeholder) in program.placeholders.iter().enumerate() {
            let text = ctx
                .and_then(|ctx| decode_placeholder(placeholder, idx, ctx).ok())
                .map(|decoded| decoded.text)
                .unwrap_or_else(|| format!("{:?}", placeholder.target()));
            push_line(
                &mut output,
                format_args!(
                    ";   P{:2}: {} ({}, flags 0x{:02x})",
                    idx, text, placeholder.p_type, placeholder.flags
                ),
            );
        }
    }
    push_line(&mut output, format_args!(";"));

    for (address, group) in program.instructions().enumerate() {
        let group = match group {
            Ok(group) => group,
            Err(err) => {
                push_line(&mut output, format_args!("; error: {err}"));
                break;
            }
        };

        let mut line = String::new();
        if config.show_positions {
            let _ = write!(line, "[{:4}] ", group.position);
        }
        if config.show_addresses {
            let _ = write!(line, "@{address:<4} ");
        }
        let _ = write!(line, "{group}");

        if config.show_comments {
            if let Some(comment) = comment(program, ctx, &group) {
                let pad = config.comment_column.saturating_sub(line.len()).max(1);
                let _ = write!(line, "{:pad$}; {comment}", "");
            }
        }
        push_line(&mut output, format_args!("{line}"));
    }

    output
}

fn comment(program: &Program, ctx: Option<&SymbolContext>, group: &Instruction<'_>) -> Option<String> {
    match group.opcode {
        Opcode::Number => program
            .raw_data_at(group.operand_position(0))
            .map(|raw| format!("{} '{}'", raw.argument_type, raw.original_data)),
        Opcode::Placeholder | Opcode::MappedPlaceholder => {
            let index = group.operands.first()?.to_usize()?;
            let placeholder = program.placeholders.get(index)?;
            let ctx = ctx?;
            decode_placeholder(placeholder, index, ctx)
                .ok()
                .map(|decoded| decoded.text)
        }
        Opcode::TrackerUpdate | Opcode::MappedTrackerUpdate => {
            let id = group.operands.first()?.to_u32()?;
            let ctx = ctx?;
            ctx.tracker_by_index(id)
                .map(|t| t.name.to_string())
                .or_else(|| ctx.mapped_tracker_by_index(id).map(|t| t.name.to_string()))
                .map(|name| format!("update {name}"))
        }
        _ => None,
    }
}
