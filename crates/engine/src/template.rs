// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template pass over action fields before validation.
//!
//! Uses `{[{ ... }]}` delimiters (chosen to avoid collision with shell and
//! YAML braces) rendered against [`ExecutionVars`]: `{[{workdir}]}` and
//! `{[{stepvars.<key>}]}`. Missing keys are errors, not empty strings.

use crate::{ExecError, ExecutionVars};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use minijinja::syntax::SyntaxConfig;
use minijinja::{context, Environment, UndefinedBehavior};

/// Whether a string contains template markers and needs a render pass.
///
/// Document-level validation skips fields for which this returns true; they
/// are re-validated after the per-step template pass.
pub fn is_templated(input: &str) -> bool {
    input.contains("{[{") || input.contains("{[%")
}

/// Render `input` against the execution vars.
pub fn render(input: &str, vars: &ExecutionVars) -> Result<String, ExecError> {
    if !is_templated(input) {
        return Ok(input.to_string());
    }
    let env = environment()?;
    let workdir = vars.work_dir.display().to_string();
    let rendered = env.render_str(
        input,
        context! {
            workdir => workdir,
            stepvars => vars.step_vars.clone(),
        },
    )?;
    Ok(rendered)
}

/// Render each field in place. Used by actions to template their declared
/// fields.
pub fn render_fields<'a>(
    vars: &ExecutionVars,
    fields: impl IntoIterator<Item = &'a mut String>,
) -> Result<(), ExecError> {
    for field in fields {
        *field = render(field, vars)?;
    }
    Ok(())
}

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let syntax = SyntaxConfig::builder()
        .block_delimiters("{[%", "%]}")
        .variable_delimiters("{[{", "}]}")
        .comment_delimiters("{[#", "#]}")
        .build()?;
    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_filter("b64enc", b64enc);
    env.add_filter("b64dec", b64dec);
    Ok(env)
}

fn b64enc(value: String) -> String {
    BASE64.encode(value)
}

fn b64dec(value: String) -> Result<String, minijinja::Error> {
    let bytes = BASE64.decode(value).map_err(|e| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("invalid base64: {e}"),
        )
    })?;
    String::from_utf8(bytes).map_err(|e| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("decoded base64 is not utf-8: {e}"),
        )
    })
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
