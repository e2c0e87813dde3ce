use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use ratedesk_agent::{AgentRuntime, InMemorySessionStore, RuntimeSettings, TurnError};
use ratedesk_core::config::AppConfig;
use ratedesk_core::domain::session::SessionId;
use ratedesk_core::errors::{ApplicationError, InterfaceError};
use ratedesk_db::repositories::SqlRateRepository;
use ratedesk_db::DbPool;
use tokio::runtime::Runtime;

use crate::commands::{async_runtime, load_config, open_database, CommandResult};

const EXIT_WORDS: &[&str] = &["exit", "quit"];

/// Answers one message. Sessions live only for the process, so a one-shot
/// call always starts from an empty session.
pub fn run(message: &str, session: Option<&str>) -> CommandResult {
    let (runtime, pool, agent) = match prepare() {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(agent.answer(message, session));
    runtime.block_on(pool.close());

    match result {
        Ok(reply) => CommandResult { exit_code: 0, output: reply },
        Err(error) => turn_failure(error),
    }
}

/// Reads one turn per line from `input` until EOF or `exit`/`quit`, writing
/// each reply to `output`. A failed lookup is reported and the loop goes on
/// with the session intact.
pub fn run_interactive(
    input: impl BufRead,
    mut output: impl Write,
    session: Option<&str>,
) -> CommandResult {
    let (runtime, pool, agent) = match prepare() {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let outcome = converse(&runtime, &agent, input, &mut output, session);
    runtime.block_on(pool.close());

    match outcome {
        Ok(()) => CommandResult { exit_code: 0, output: String::new() },
        Err(error) => CommandResult::failure("ask", "io", error.to_string(), 7),
    }
}

fn converse(
    runtime: &Runtime,
    agent: &AgentRuntime,
    input: impl BufRead,
    output: &mut impl Write,
    session: Option<&str>,
) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&message.to_ascii_lowercase().as_str()) {
            break;
        }

        match runtime.block_on(agent.answer(message, session)) {
            Ok(reply) => writeln!(output, "{reply}\n")?,
            Err(error) => {
                let interface = interface_error(error);
                writeln!(output, "{}\n", interface.user_message())?;
            }
        }
        output.flush()?;
    }
    Ok(())
}

fn prepare() -> Result<(Runtime, DbPool, AgentRuntime), CommandResult> {
    let config = load_config("ask")?;
    let runtime = async_runtime("ask")?;
    let pool = runtime.block_on(open_database(&config)).map_err(
        |(error_class, message, exit_code)| {
            CommandResult::failure("ask", error_class, message, exit_code)
        },
    )?;
    let agent = chat_runtime(&config, pool.clone());
    Ok((runtime, pool, agent))
}

fn chat_runtime(config: &AppConfig, pool: DbPool) -> AgentRuntime {
    AgentRuntime::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(SqlRateRepository::new(pool)),
        RuntimeSettings {
            default_session_id: SessionId::from(config.dialogue.default_session_id.as_str()),
            query_timeout: Duration::from_secs(config.database.query_timeout_secs),
        },
    )
}

fn interface_error(error: TurnError) -> InterfaceError {
    ApplicationError::from(error).into_interface("cli")
}

fn turn_failure(error: TurnError) -> CommandResult {
    let interface = interface_error(error);
    let error_class = match interface {
        InterfaceError::ServiceUnavailable { .. } => "lookup_unavailable",
        InterfaceError::Internal { .. } => "internal",
    };
    CommandResult::failure("ask", error_class, interface.user_message(), 6)
}
