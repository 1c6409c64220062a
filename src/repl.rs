use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

use crate::error::{ChatError, ChatErrorKind};
use crate::model::Message;
use crate::model_gateway::{ModelGateway, ModelGatewayRequest};
use crate::remediation::write_failure_report;

const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Why the conversation loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Farewell,
    EndOfInput,
    Failed(ChatErrorKind),
}

pub async fn run_repl(gateway: &impl ModelGateway) -> Result<LoopExit> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_conversation(gateway, &mut input, &mut output).await
}

/// Each line becomes a fresh single-message request; nothing from earlier
/// turns is sent. The first failure ends the loop.
pub async fn run_conversation(
    gateway: &impl ModelGateway,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<LoopExit> {
    writeln!(
        output,
        "Chatbot ready! Type 'exit', 'quit', or 'bye' to end the conversation.\n"
    )
    .context("Failed to write banner")?;

    let mut turns = 0usize;
    loop {
        write!(output, "Ask: ").context("Failed to write prompt")?;
        output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = match input.read_line(&mut line) {
            Ok(read) => read,
            Err(err) => {
                let err = ChatError::unclassified(format!("Failed to read input: {err}"));
                return report_failure(output, turns, &err);
            }
        };
        if read == 0 {
            writeln!(output).context("Failed to write stdout")?;
            info!(turns, "input closed; ending conversation");
            return Ok(LoopExit::EndOfInput);
        }

        let text = line.trim_end_matches(['\r', '\n']);
        if is_exit_keyword(text) {
            writeln!(output, "Thank you! Bye..").context("Failed to write farewell")?;
            info!(turns, "exit keyword received; ending conversation");
            return Ok(LoopExit::Farewell);
        }

        turns += 1;
        debug!(turn = turns, input_len = text.len(), "starting chat turn");
        let request = ModelGatewayRequest {
            messages: vec![Message::user(text)],
        };

        match gateway.chat(request).await {
            Ok(response) => {
                writeln!(output, "Answer: {}\n", response.reply.content)
                    .context("Failed to write answer")?;
            }
            Err(err) => return report_failure(output, turns, &err),
        }
    }
}

fn report_failure(output: &mut impl Write, turns: usize, err: &ChatError) -> Result<LoopExit> {
    let kind = err.kind();
    warn!(
        turn = turns,
        kind = kind.as_str(),
        status = ?err.status(),
        "chat turn failed; stopping"
    );
    write_failure_report(output, err).context("Failed to write error report")?;
    output.flush().context("Failed to flush stdout")?;
    Ok(LoopExit::Failed(kind))
}

fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
}
