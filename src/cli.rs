//! CLI driver: stdin/stdout REPL over the customer queue.
//!
//! Commands: `/next` moves to the next customer, `/summary` summarises the
//! current conversation for the supervisor, `/quit` exits. Anything else is
//! sent to the agent as the customer's message.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::conversation::ConversationController;
use crate::error::Error;
use crate::notify::SupervisorNotifier;

/// Run the REPL on the process's stdin and stdout.
pub async fn run(
    controller: &mut ConversationController,
    notifier: &SupervisorNotifier,
) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_repl(controller, notifier, stdin, &mut stdout).await
}

pub async fn run_repl<R, W>(
    controller: &mut ConversationController,
    notifier: &SupervisorNotifier,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let agent = controller.agent_name().to_string();
    open_conversation(controller, output, &agent).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/next" => match controller.advance_customer() {
                Ok(Some(_)) => open_conversation(controller, output, &agent).await?,
                Ok(None) => {
                    write_line(output, "No more customers.").await?;
                    break;
                }
                Err(e) => write_line(output, &format!("Error: {e}")).await?,
            },
            "/summary" => {
                let Some(session) = controller.session() else {
                    write_line(output, "No conversation to summarise.").await?;
                    continue;
                };
                match notifier.notify(&session.customer, &session.transcript).await {
                    Ok(summary) => {
                        write_line(output, &format!("Summary:\n{}", summary.summary)).await?;
                        if summary.sent {
                            write_line(output, "(sent to supervisor)").await?;
                        }
                    }
                    Err(e) => write_line(output, &format!("Error: {e}")).await?,
                }
            }
            message => match controller.submit_user_message(message).await {
                Ok(reply) => {
                    write_line(output, &format!("{agent}: {}", reply.utterance)).await?;
                    if reply.ended {
                        write_line(output, "(conversation ended; /next for the next customer)")
                            .await?;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Turn failed");
                    write_line(output, &format!("Error: {e}")).await?;
                }
            },
        }
    }

    Ok(())
}

async fn open_conversation<W: AsyncWrite + Unpin>(
    controller: &mut ConversationController,
    output: &mut W,
    agent: &str,
) -> std::io::Result<()> {
    if let Some(customer) = controller.customer() {
        write_line(
            output,
            &format!("\n--- Conversation with {} ---", customer.full_name()),
        )
        .await?;
    }
    match controller.next_agent_turn().await {
        Ok(opening) => write_line(output, &format!("{agent}: {opening}")).await,
        Err(Error::State(e)) => write_line(output, &format!("Error: {e}")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Opening message failed");
            write_line(output, &format!("Error: {e}")).await
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await
}
