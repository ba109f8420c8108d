use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
    EventStream, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use futures::StreamExt;
use rand::Rng;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use otp_field::{AutofillSession, NullAutofill, OtpField, OtpProvider, OtpSignal};

const HEADER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);
const SUBMIT_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);

#[derive(Parser)]
#[command(
    name = "otp-field",
    about = "Demo for the segmented one-time-password entry widget."
)]
struct Cli {
    /// Number of digit boxes
    #[arg(long, default_value_t = otp_field::DEFAULT_LENGTH)]
    length: usize,

    /// Placeholder character shown in empty boxes
    #[arg(long, default_value = "")]
    placeholder: String,

    /// Start with the field disabled (Ctrl+D toggles)
    #[arg(long)]
    disabled: bool,

    /// Code the simulated SMS delivers (default: random)
    #[arg(long = "sms-code")]
    sms_code: Option<String>,

    /// Milliseconds before the simulated SMS arrives
    #[arg(long = "sms-delay-ms", default_value_t = 2500)]
    sms_delay_ms: u64,

    /// Run without any autofill capability
    #[arg(long = "no-autofill")]
    no_autofill: bool,

    /// Write tracing output to this file instead of discarding it
    #[arg(long = "log-file")]
    log_file: Option<String>,
}

/// Simulated platform SMS bridge: one code, delivered after a delay.
struct DemoSms {
    code: String,
    delay: Duration,
}

#[async_trait]
impl OtpProvider for DemoSms {
    async fn retrieve(&self) -> otp_field::Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.code.clone())
    }
}

struct Status {
    value: String,
    submitted: Option<String>,
    autofill: &'static str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = std::fs::File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let mut field = OtpField::new(cli.length)?
        .with_placeholder(cli.placeholder.clone())
        .with_disabled(cli.disabled);

    let sms_code = cli.sms_code.clone().unwrap_or_else(|| {
        let mut rng = rand::thread_rng();
        (0..cli.length).map(|_| rng.gen_range(0..10).to_string()).collect()
    });
    let provider: Arc<dyn OtpProvider> = if cli.no_autofill {
        Arc::new(NullAutofill)
    } else {
        Arc::new(DemoSms {
            code: sms_code,
            delay: Duration::from_millis(cli.sms_delay_ms),
        })
    };

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableBracketedPaste, EnableMouseCapture)?;

    let result = run(&mut terminal, &mut field, provider, &cli).await;

    execute!(stdout(), DisableMouseCapture, DisableBracketedPaste)?;
    ratatui::restore();
    result
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    field: &mut OtpField,
    provider: Arc<dyn OtpProvider>,
    cli: &Cli,
) -> Result<()> {
    let (codes_tx, mut codes_rx) = mpsc::unbounded_channel();
    let mut session = if field.is_disabled() {
        None
    } else {
        Some(AutofillSession::start(
            Arc::clone(&provider),
            codes_tx.clone(),
        ))
    };

    let mut status = Status {
        value: String::new(),
        submitted: None,
        autofill: if cli.no_autofill {
            "autofill: unavailable"
        } else if field.is_disabled() {
            "autofill: idle"
        } else {
            "autofill: waiting for SMS"
        },
    };

    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| draw(frame, field, &status))?;
        let size = terminal.size()?;
        let field_area = field_rect(field, Rect::new(0, 0, size.width, size.height));

        let mut signals = Vec::new();
        tokio::select! {
            maybe_event = events.next() => {
                let Some(Ok(event)) = maybe_event else { break };
                match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                        match key.code {
                            KeyCode::Esc => break,
                            KeyCode::Char('c') if ctrl => break,
                            KeyCode::Char('r') if ctrl => {
                                signals = field.reset();
                                status.submitted = None;
                            }
                            KeyCode::Char('d') if ctrl => {
                                let disable = !field.is_disabled();
                                field.set_disabled(disable);
                                if disable {
                                    // Dropping the session cancels the in-flight request.
                                    session.take();
                                    if !cli.no_autofill {
                                        status.autofill = "autofill: canceled";
                                    }
                                } else if !cli.no_autofill {
                                    session = Some(AutofillSession::start(
                                        Arc::clone(&provider),
                                        codes_tx.clone(),
                                    ));
                                    status.autofill = "autofill: waiting for SMS";
                                }
                            }
                            _ => signals = field.handle_key_event(key),
                        }
                    }
                    _ => signals = field.handle_event(&event, field_area),
                }
            }
            code = codes_rx.recv() => {
                if let Some(code) = code {
                    signals = field.handle_autofill(&code);
                    if !signals.is_empty() {
                        status.autofill = "autofill: code delivered";
                    }
                }
            }
        }

        for signal in signals {
            match signal {
                OtpSignal::Changed(value) => status.value = value,
                OtpSignal::Submitted(value) => status.submitted = Some(value),
            }
        }
        field.settle();
    }

    drop(session);
    Ok(())
}

/// Centered rectangle for the boxes, shared by drawing and mouse hit-testing.
fn field_rect(field: &OtpField, area: Rect) -> Rect {
    let rows = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(field.desired_height()),
        Constraint::Fill(2),
    ])
    .split(area);
    let width = field.desired_width().min(rows[1].width);
    let x = rows[1].x + (rows[1].width - width) / 2;
    Rect::new(x, rows[1].y, width, rows[1].height)
}

fn draw(frame: &mut Frame<'_>, field: &OtpField, status: &Status) {
    let area = frame.area();
    let rows = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Fill(1),   // field (positioned by field_rect)
        Constraint::Length(1), // submitted
        Constraint::Length(1), // live value + autofill state
        Constraint::Length(1), // keys
    ])
    .split(area);

    let title = if field.is_disabled() {
        format!("Enter the {}-digit code (disabled)", field.len())
    } else {
        format!("Enter the {}-digit code", field.len())
    };
    frame.render_widget(
        Paragraph::new(title).centered().style(HEADER_STYLE),
        rows[0],
    );

    field.render(frame, field_rect(field, area));

    if let Some(code) = &status.submitted {
        frame.render_widget(
            Paragraph::new(format!("submitted: {code}"))
                .centered()
                .style(SUBMIT_STYLE),
            rows[2],
        );
    }
    frame.render_widget(
        Paragraph::new(format!("value: {}  |  {}", status.value, status.autofill))
            .centered()
            .style(FOOTER_STYLE),
        rows[3],
    );
    frame.render_widget(
        Paragraph::new(
            "type digits  paste  click  Backspace  Ctrl+R:reset  Ctrl+D:disable  Esc:quit",
        )
        .centered()
        .style(FOOTER_STYLE),
        rows[4],
    );
}
