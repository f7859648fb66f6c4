//! Interactive REPL (Read-Eval-Print-Loop)
//!
//! The line editor blocks, so it lives on its own input thread and hands each
//! submitted line to the async loop, which multiplexes it with frames pushed
//! by the server. The thread only prompts again once the loop has dealt with
//! the previous line.

use crate::classify::render_frame;
use crate::client::{Client, SessionEvent};
use crate::history::{CommandHistory, Recall};
use crate::logging::PrinterSlot;
use crate::{ClientError, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{
    Cmd, Config, ConditionalEventHandler, DefaultEditor, Event, EventContext, EventHandler,
    KeyCode, KeyEvent, Modifiers, Movement, RepeatCount,
};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const PROMPT: &str = "rctl> ";

/// What a line typed at the prompt asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand<'a> {
    /// Nothing typed
    Empty,
    /// Clear the screen
    Clear,
    /// Leave the shell
    Exit,
    /// Send to the server
    Forward(&'a str),
}

impl<'a> ShellCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => ShellCommand::Empty,
            "clear" => ShellCommand::Clear,
            "exit" | "quit" => ShellCommand::Exit,
            command => ShellCommand::Forward(command),
        }
    }
}

/// Why the shell stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit`, `quit` or end of input
    UserExit,
    /// Ctrl-C at the prompt
    Interrupted,
    /// The server closed the connection
    ServerClosed { code: Option<u16>, reason: String },
}

enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Interactive REPL
pub struct Repl {
    /// Client connection
    client: Arc<Client>,

    /// Where server lines and log records are printed
    printer: PrinterSlot,

    /// Submitted commands, shared with the Up/Down key handlers
    history: Arc<Mutex<CommandHistory>>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(client: Arc<Client>, printer: PrinterSlot) -> Self {
        Self {
            client,
            printer,
            history: Arc::new(Mutex::new(CommandHistory::default())),
        }
    }

    /// Run the REPL until the user leaves or the server goes away
    pub async fn run(&self) -> Result<ExitReason> {
        let config = Config::builder().auto_add_history(false).build();
        let mut editor = DefaultEditor::with_config(config)?;
        self.bind_history_keys(&mut editor);

        match editor.create_external_printer() {
            Ok(printer) => self.printer.install(Box::new(printer)),
            Err(e) => debug!(error = %e, "No external printer, printing directly"),
        }

        self.print_header();

        let (input_tx, mut input_rx) = mpsc::unbounded_channel();
        let (resume_tx, resume_rx) = std_mpsc::channel();
        spawn_input_thread(editor, input_tx, resume_rx);

        let result = loop {
            tokio::select! {
                event = self.client.next_event() => {
                    if let Some(reason) = self.handle_event(event) {
                        break Ok(reason);
                    }
                }
                input = input_rx.recv() => match input {
                    Some(Input::Line(line)) => {
                        if !self.handle_line(&line).await {
                            break Ok(ExitReason::UserExit);
                        }
                        if resume_tx.send(()).is_err() {
                            break Ok(ExitReason::UserExit);
                        }
                    }
                    Some(Input::Interrupted) => break Ok(ExitReason::Interrupted),
                    Some(Input::Eof) | None => {
                        info!("Goodbye!");
                        break Ok(ExitReason::UserExit);
                    }
                    Some(Input::Failed(e)) => {
                        error!("Readline error: {}", e);
                        break Err(ClientError::Repl(e));
                    }
                },
            }
        };

        self.printer.clear();
        result
    }

    /// Handle one event pushed by the server; returns the exit reason once
    /// the session is over
    fn handle_event(&self, event: SessionEvent) -> Option<ExitReason> {
        match event {
            SessionEvent::Message(text) => {
                if let Some(rendered) = render_frame(&text) {
                    self.printer.print(rendered);
                }
                None
            }
            SessionEvent::TransportError(e) => {
                error!("{}", e);
                None
            }
            SessionEvent::Closed { code, reason } => {
                info!(?code, reason = %reason, "Connection closed by server");
                Some(ExitReason::ServerClosed { code, reason })
            }
        }
    }

    /// Handle one submitted line; returns `false` when the shell should stop
    async fn handle_line(&self, line: &str) -> bool {
        match ShellCommand::parse(line) {
            ShellCommand::Empty => true,
            ShellCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H"); // ANSI clear screen
                self.print_header();
                true
            }
            ShellCommand::Exit => {
                info!("Goodbye!");
                false
            }
            ShellCommand::Forward(command) => {
                self.remember(command);

                match self.client.send(command).await {
                    Ok(()) => {}
                    Err(ClientError::NotConnected) => warn!("{}", ClientError::NotConnected),
                    Err(e) => error!("Failed to send command: {}", e),
                }
                true
            }
        }
    }

    fn remember(&self, command: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.push(command);
        }
    }

    fn bind_history_keys(&self, editor: &mut DefaultEditor) {
        for (key, direction) in [(KeyCode::Up, Direction::Older), (KeyCode::Down, Direction::Newer)] {
            editor.bind_sequence(
                KeyEvent(key, Modifiers::NONE),
                EventHandler::Conditional(Box::new(HistoryRecall {
                    history: self.history.clone(),
                    direction,
                })),
            );
        }
    }

    /// Print the static header
    fn print_header(&self) {
        println!("{}", "rctl remote control".bold().green());
        println!(
            "Connected to {}. Type 'clear' to clear the screen, 'exit' to quit\n",
            self.client.config().target
        );
    }
}

fn spawn_input_thread(
    mut editor: DefaultEditor,
    tx: mpsc::UnboundedSender<Input>,
    resume: std_mpsc::Receiver<()>,
) {
    let prompt = PROMPT.cyan().to_string();

    std::thread::spawn(move || loop {
        let input = match editor.readline(&prompt) {
            Ok(line) => Input::Line(line),
            Err(ReadlineError::Interrupted) => Input::Interrupted,
            Err(ReadlineError::Eof) => Input::Eof,
            Err(e) => Input::Failed(e.to_string()),
        };

        let last = !matches!(input, Input::Line(_));
        if tx.send(input).is_err() || last {
            break;
        }

        // Wait until the line has been handled before prompting again
        if resume.recv().is_err() {
            break;
        }
    });
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Older,
    Newer,
}

/// Up/Down handler backed by [`CommandHistory`]
struct HistoryRecall {
    history: Arc<Mutex<CommandHistory>>,
    direction: Direction,
}

impl ConditionalEventHandler for HistoryRecall {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        _ctx: &EventContext,
    ) -> Option<Cmd> {
        let mut history = self.history.lock().ok()?;
        let recall = match self.direction {
            Direction::Older => history.older(),
            Direction::Newer => history.newer(),
        };

        Some(recall_command(recall))
    }
}

/// Editor command that applies a history recall to the input line
fn recall_command(recall: Recall) -> Cmd {
    match recall {
        Recall::Entry(line) => Cmd::Replace(Movement::WholeLine, Some(line)),
        Recall::Clear => Cmd::Replace(Movement::WholeLine, Some(String::new())),
        Recall::Stay => Cmd::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::transport::{Frame, MockTransport, Transport};
    use rustyline::ExternalPrinter;

    struct Capture(Arc<Mutex<Vec<String>>>);

    impl ExternalPrinter for Capture {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            if let Ok(mut lines) = self.0.lock() {
                lines.push(msg);
            }
            Ok(())
        }
    }

    /// Slot that records everything printed through it
    fn capturing_slot() -> (PrinterSlot, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let slot = PrinterSlot::new();
        slot.install(Box::new(Capture(lines.clone())));
        (slot, lines)
    }

    async fn authenticated_repl() -> (Repl, Arc<MockTransport>, MockTransport) {
        let (client_end, server_end) = MockTransport::create_pair();
        let client_end = Arc::new(client_end);
        let client = Client::with_transport(ClientConfig::new("localhost", None), client_end.clone());

        server_end
            .send(r#"{"type":"auth_ok"}"#.to_string())
            .await
            .unwrap();
        client.authenticate().await.unwrap();
        assert_eq!(
            server_end.receive().await.unwrap(),
            Frame::Text(r#"{"type":"auth","passkey":""}"#.to_string())
        );

        (
            Repl::new(Arc::new(client), PrinterSlot::new()),
            client_end,
            server_end,
        )
    }

    fn history_entries(repl: &Repl) -> Vec<String> {
        repl.history
            .lock()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_local_commands() {
        assert_eq!(ShellCommand::parse(""), ShellCommand::Empty);
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
        assert_eq!(ShellCommand::parse("clear"), ShellCommand::Clear);
        assert_eq!(ShellCommand::parse("exit"), ShellCommand::Exit);
        assert_eq!(ShellCommand::parse(" quit "), ShellCommand::Exit);
        assert_eq!(
            ShellCommand::parse("restart nginx"),
            ShellCommand::Forward("restart nginx")
        );
        assert_eq!(
            ShellCommand::parse("exit now"),
            ShellCommand::Forward("exit now")
        );
    }

    #[tokio::test]
    async fn test_forwarded_command_reaches_server() {
        let (repl, _, server) = authenticated_repl().await;

        assert!(repl.handle_line("uptime").await);
        assert_eq!(
            server.receive().await.unwrap(),
            Frame::Text("uptime".to_string())
        );
        assert_eq!(history_entries(&repl), vec!["uptime"]);
    }

    #[tokio::test]
    async fn test_repeated_command_sent_twice_stored_once() {
        let (repl, client_end, _server) = authenticated_repl().await;

        repl.handle_line("status").await;
        repl.handle_line("status").await;

        assert_eq!(history_entries(&repl), vec!["status"]);
        // auth + two commands
        assert_eq!(client_end.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_local_commands_not_forwarded() {
        let (repl, client_end, _server) = authenticated_repl().await;

        assert!(repl.handle_line("").await);
        assert!(!repl.handle_line("exit").await);
        assert!(!repl.handle_line("quit").await);

        assert_eq!(client_end.sent_count(), 1);
        assert!(history_entries(&repl).is_empty());
    }

    #[tokio::test]
    async fn test_send_when_not_connected_keeps_shell_running() {
        let (client_end, _server_end) = MockTransport::create_pair();
        let client_end = Arc::new(client_end);
        let client = Client::with_transport(ClientConfig::new("localhost", None), client_end.clone());
        let repl = Repl::new(Arc::new(client), PrinterSlot::new());

        assert!(repl.handle_line("status").await);
        assert_eq!(client_end.sent_count(), 0);
        assert_eq!(history_entries(&repl), vec!["status"]);
    }

    #[tokio::test]
    async fn test_server_frames_printed_until_close() {
        let (repl, _, server) = authenticated_repl().await;
        let (slot, lines) = capturing_slot();
        let repl = Repl::new(repl.client.clone(), slot);

        server.send("[OK] restarted".to_string()).await.unwrap();
        server
            .send(r#"{"type":"status","ok":true}"#.to_string())
            .await
            .unwrap();
        server.send("[internal] tick".to_string()).await.unwrap();
        server.send_close(1000, "bye").unwrap();

        let mut exit = None;
        while exit.is_none() {
            exit = repl.handle_event(repl.client.next_event().await);
        }

        assert_eq!(
            exit,
            Some(ExitReason::ServerClosed {
                code: Some(1000),
                reason: "bye".to_string()
            })
        );
        let expected = format!("{}\n", render_frame("[OK] restarted").unwrap());
        assert_eq!(*lines.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn test_transport_error_keeps_session_open() {
        let (repl, _, _server) = authenticated_repl().await;
        let (slot, lines) = capturing_slot();
        let repl = Repl::new(repl.client.clone(), slot);

        let exit = repl.handle_event(SessionEvent::TransportError(ClientError::Transport(
            "reset".to_string(),
        )));

        assert_eq!(exit, None);
        assert!(lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_connected_reported_once_per_command() {
        let (client_end, _server_end) = MockTransport::create_pair();
        let client = Client::with_transport(ClientConfig::new("localhost", None), Arc::new(client_end));
        let (slot, lines) = capturing_slot();
        let repl = Repl::new(Arc::new(client), slot.clone());

        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_writer(slot)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        assert!(repl.handle_line("status").await);

        let lines = lines.lock().unwrap();
        let notices: Vec<_> = lines
            .iter()
            .filter(|line| line.contains("Not connected to server"))
            .collect();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("WARN"));
        assert!(notices[0].ends_with('\n'));
    }

    #[test]
    fn test_recall_commands() {
        assert_eq!(
            recall_command(Recall::Entry("uptime".to_string())),
            Cmd::Replace(Movement::WholeLine, Some("uptime".to_string()))
        );
        assert_eq!(
            recall_command(Recall::Clear),
            Cmd::Replace(Movement::WholeLine, Some(String::new()))
        );
        assert_eq!(recall_command(Recall::Stay), Cmd::Noop);
    }
}
