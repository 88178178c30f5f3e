use std::io::{self, BufRead, Write};
use std::sync::Arc;

use kunan_agent::{AgentRuntime, ChatCompletionClient, OrderSession};
use kunan_core::domain::order::OrderId;
use kunan_core::errors::{ApplicationError, DomainError};
use kunan_core::flows::{FlowTransitionError, SessionState, Stage};
use kunan_db::order_repository_from_config;

use crate::commands::{current_thread_runtime, load_config, CommandResult};

const COMMAND: &str = "session";

#[derive(Debug, Default)]
pub struct SessionSummary {
    pub confirmed: Vec<OrderId>,
}

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let llm = Arc::new(ChatCompletionClient::from_config(&config.llm));
    let agent = Arc::new(AgentRuntime::from_config(llm, &config.llm));
    let orders = order_repository_from_config(&config.storage);
    let mut session = OrderSession::new(agent, orders);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = runtime.block_on(drive(&mut session, stdin.lock(), &mut stdout.lock()));

    match outcome {
        Ok(summary) => CommandResult::success(
            COMMAND,
            format!("session closed with {} confirmed order(s)", summary.confirmed.len()),
        ),
        Err(error) => {
            CommandResult::failure(COMMAND, "io", format!("terminal i/o failed: {error}"), 1)
        }
    }
}

/// Reads commands line by line until `salir` or end of input.
///
/// Idle: any text is a request. Quote: `pagar`, `editar`. Payment panel:
/// `confirmar`, `cancelar`. A confirmed order starts a new cycle.
pub async fn drive<R: BufRead, W: Write>(
    session: &mut OrderSession,
    mut input: R,
    output: &mut W,
) -> io::Result<SessionSummary> {
    let mut summary = SessionSummary::default();

    loop {
        render_prompt(session.state(), output)?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let command = line.trim();
        if command.eq_ignore_ascii_case("salir") {
            break;
        }

        let stage = session.state().stage();
        let payment_open = session.state().payment_open();
        let verb = command.to_lowercase();

        let result = match stage {
            Stage::Idle => session.submit(command).await.map(|_| ()),
            Stage::Quote => match (verb.as_str(), payment_open) {
                ("editar", false) => session.edit().await.map(|_| ()),
                ("pagar", false) => session.open_payment().await.map(|_| ()),
                ("cancelar", true) => session.close_payment().await.map(|_| ()),
                ("confirmar", true) => session.confirm_payment().await.map(|_| ()),
                _ => {
                    writeln!(output, "Comando no reconocido.")?;
                    continue;
                }
            },
            Stage::Loading | Stage::Confirm => Ok(()),
        };

        if let Err(error) = result {
            writeln!(output, "! {}", describe(&error, command))?;
        }

        if let SessionState::Confirmed { order } = session.state() {
            writeln!(
                output,
                "Pedido confirmado: {} ({}). Estado: {}.",
                order.quote.task,
                order.id.0,
                order.status.as_str()
            )?;
            summary.confirmed.push(order.id.clone());
            session.reset();
        }
    }

    output.flush()?;
    Ok(summary)
}

fn render_prompt<W: Write>(state: &SessionState, output: &mut W) -> io::Result<()> {
    match state {
        SessionState::Idle { last_error } => {
            if let Some(error) = last_error {
                writeln!(output, "! {error}")?;
            }
            writeln!(output, "Describe tu pedido (o 'salir'):")?;
        }
        SessionState::Quoted { quote, payment_open, last_error, .. } => {
            writeln!(output, "Cotización [{}] {}", quote.category, quote.task)?;
            writeln!(output, "  Precio: {}", quote.formatted_price())?;
            writeln!(output, "  Tiempo estimado: {}", quote.eta)?;
            writeln!(output, "  {}", quote.justification)?;
            if quote.is_declined() {
                writeln!(output, "  Este pedido no puede ser atendido.")?;
            }
            if let Some(error) = last_error {
                writeln!(output, "! {error}")?;
            }
            if *payment_open {
                writeln!(
                    output,
                    "Pago con Yape por {}. Escribe 'confirmar' cuando hayas pagado o 'cancelar'.",
                    quote.formatted_price()
                )?;
            } else {
                writeln!(output, "Escribe 'pagar', 'editar' o 'salir'.")?;
            }
        }
        SessionState::Loading { .. } | SessionState::Confirmed { .. } => {}
    }
    output.flush()
}

fn describe(error: &ApplicationError, command: &str) -> String {
    match error {
        ApplicationError::Domain(DomainError::FlowTransition(
            FlowTransitionError::RequestTooShort { min_chars },
        )) => {
            if command.is_empty() {
                "Describe tu pedido para cotizar.".to_string()
            } else {
                format!("Tu pedido debe tener más de {min_chars} caracteres.")
            }
        }
        ApplicationError::Domain(DomainError::FlowTransition(
            FlowTransitionError::InvalidTransition { .. },
        )) => "Esa acción no está disponible ahora.".to_string(),
        other => other.clone().into_interface(COMMAND).user_message().to_string(),
    }
}
