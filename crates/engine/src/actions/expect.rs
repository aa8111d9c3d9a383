// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expect action: drive an interactive program through a pseudo-terminal.
//!
//! The inline script runs under a pty; a background driver walks the
//! declared prompt/response pairs, closes the tty to signal EOF, and waits
//! for the process. Each prompt wait is bounded by the step's timeout.

use crate::actions::{Action, InlineScript};
use crate::process::{self, Interpreter};
use crate::{template, vars, ActionResult, ExecError, ExecutionContext};
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

/// Default bound on each prompt wait.
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pty-driven interactive execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectScript {
    pub expect: ExpectSpec,
}

/// Body of the `expect:` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    pub inline: String,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub responses: Vec<ExpectResponse>,
    /// Seconds to wait for each prompt (default 30).
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Plain command run as this step's cleanup.
    #[serde(default)]
    pub cleanup: Option<String>,
}

/// One prompt/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectResponse {
    pub prompt: String,
    pub response: String,
}

impl ExpectScript {
    fn interpreter(&self) -> Result<Interpreter, ExecError> {
        match self.expect.executor.as_deref() {
            Some(name) => Interpreter::from_name(name),
            None => Ok(Interpreter::Bash),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expect.inline.trim().is_empty()
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        let spec = &mut self.expect;
        let mut fields = vec![&mut spec.inline];
        for pair in spec.responses.iter_mut() {
            fields.push(&mut pair.prompt);
            fields.push(&mut pair.response);
        }
        template::render_fields(&ctx.vars, fields)
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("expect inline script is empty".into()));
        }
        if self.interpreter()? == Interpreter::Binary {
            return Err(ExecError::Validation(
                "the binary executor cannot run expect scripts".into(),
            ));
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let interpreter = self.interpreter()?;
        let program = interpreter.program().to_string();
        let inline = vars::expand_str(&self.expect.inline, &ctx.record)?;
        let mut responses = Vec::with_capacity(self.expect.responses.len());
        for pair in &self.expect.responses {
            responses.push((
                pair.prompt.clone(),
                vars::expand_str(&pair.response, &ctx.record)?,
            ));
        }
        let prompt_timeout = self
            .expect
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROMPT_TIMEOUT);
        let work_dir = ctx.vars.work_dir.clone();

        tracing::info!(executor = %program, prompts = responses.len(), "driving pty session");
        let driver = tokio::task::spawn_blocking(move || {
            drive(&program, &inline, &responses, prompt_timeout, &work_dir)
        });
        let (transcript, exit_code) =
            match tokio::time::timeout(process::DEFAULT_TIMEOUT, driver).await {
                Ok(joined) => {
                    joined.map_err(|e| ExecError::Protocol(format!("pty driver failed: {e}")))??
                }
                Err(_) => {
                    return Err(ExecError::Timeout {
                        timeout: process::DEFAULT_TIMEOUT,
                    })
                }
            };

        {
            let mut sink = ctx.cfg.stdout.lock();
            sink.write_all(transcript.as_bytes())?;
            sink.flush()?;
        }
        if exit_code != 0 {
            return Err(ExecError::NonZeroExit { code: exit_code });
        }
        Ok(ActionResult {
            stdout: transcript,
            exit_code,
            ..ActionResult::default()
        })
    }

    pub fn default_cleanup(&self) -> Option<Action> {
        self.expect
            .cleanup
            .as_ref()
            .map(|command| Action::Inline(InlineScript::new(command.clone())))
    }
}

/// Blocking pty driver: spawn, answer prompts, close the tty, wait.
fn drive(
    program: &str,
    inline: &str,
    responses: &[(String, String)],
    prompt_timeout: Duration,
    work_dir: &Path,
) -> Result<(String, i32), ExecError> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(["-c", inline]);
    cmd.current_dir(work_dir);
    let mut session = expectrl::session::Session::spawn(cmd)
        .map_err(|e| ExecError::Protocol(format!("pty spawn failed: {e}")))?;
    session.set_expect_timeout(Some(prompt_timeout));

    let mut transcript: Vec<u8> = Vec::new();
    for (prompt, response) in responses {
        let found = session
            .expect(expectrl::Regex(prompt.as_str()))
            .map_err(|e| ExecError::Protocol(format!("waiting for prompt {prompt:?}: {e}")))?;
        transcript.extend_from_slice(found.before());
        if let Some(matched) = found.get(0) {
            transcript.extend_from_slice(matched);
        }
        session
            .send_line(response)
            .map_err(|e| ExecError::Protocol(format!("sending response for {prompt:?}: {e}")))?;
    }

    // Close our side of the tty so the child sees EOF, then drain the rest.
    if let Err(e) = session.send(expectrl::ControlCode::EOT) {
        tracing::debug!(error = %e, "failed to send EOT to pty");
    }
    match session.expect(expectrl::Eof) {
        Ok(found) => transcript.extend_from_slice(found.before()),
        Err(e) => tracing::debug!(error = %e, "pty did not reach EOF cleanly"),
    }

    let status = session
        .get_process()
        .wait()
        .map_err(|e| ExecError::Protocol(format!("waiting for pty child: {e}")))?;
    let exit_code = match status {
        expectrl::WaitStatus::Exited(_, code) => code,
        _ => -1,
    };
    Ok((String::from_utf8_lossy(&transcript).into_owned(), exit_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        let (tx, _rx) = tokio::sync::broadcast::channel(1);
        ExecutionContext::new(crate::ExecutionConfig::default(), std::env::temp_dir(), tx)
    }

    fn action(yaml: &str) -> ExpectScript {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn deserializes_prompt_response_pairs() {
        let expect = action(concat!(
            "expect:\n",
            "  inline: ftp host\n",
            "  timeout: 5\n",
            "  responses:\n",
            "    - prompt: 'Name:'\n",
            "      response: anonymous\n",
            "  cleanup: rm -f ftp.log\n",
        ));
        assert_eq!(expect.expect.responses.len(), 1);
        assert_eq!(expect.expect.timeout, Some(5));
    }

    #[test]
    fn empty_inline_fails_validation() {
        let mut expect = action("expect:\n  inline: ''\n");
        assert!(expect.validate(&ctx()).is_err());
    }

    #[test]
    fn declared_cleanup_becomes_an_inline_action() {
        let expect = action("expect:\n  inline: cat\n  cleanup: rm -f state\n");
        let Some(Action::Inline(inline)) = expect.default_cleanup() else {
            panic!("expected inline cleanup");
        };
        assert_eq!(inline.inline, "rm -f state");
    }

    #[test]
    fn no_cleanup_means_no_default() {
        let expect = action("expect:\n  inline: cat\n");
        assert!(expect.default_cleanup().is_none());
    }

    #[tokio::test]
    async fn drives_a_simple_interactive_session() {
        let mut ctx = ctx();
        let mut expect = action(concat!(
            "expect:\n",
            "  inline: \"read -p 'name? ' n && echo \\\"hello $n\\\"\"\n",
            "  timeout: 10\n",
            "  responses:\n",
            "    - prompt: \"name\\\\? \"\n",
            "      response: operator\n",
        ));
        expect.validate(&ctx).unwrap();
        let result = expect.execute(&mut ctx).await.unwrap();
        assert!(result.stdout.contains("hello operator"), "{}", result.stdout);
        assert_eq!(result.exit_code, 0);
    }
}
