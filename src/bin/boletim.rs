//! Terminal front-end for encceja-boletim.
//!
//! A thin shim over the library crate: maps CLI flags to `FlowConfig`,
//! renders each screen of the flow and forwards the participant's answers
//! to `FlowController`.

use anyhow::{Context, Result};
use clap::Parser;
use encceja_boletim::config::{DEFAULT_API_BASE_URL, DEFAULT_MODEL, DEFAULT_WEBHOOK_URL};
use encceja_boletim::pipeline::input::is_cpf_complete;
use encceja_boletim::{
    messages, review_rows, AppStep, DeliveryHandle, FlowConfig, FlowController, FlowObserver,
    FlowState, ReviewIntent, RowStatus, SelectedFile, SubmissionPayload,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Spinner while the boletim is analysed ────────────────────────────────────

/// Shows an indicatif spinner for as long as the flow is on `analyzing`.
struct CliObserver {
    enabled: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliObserver {
    fn new(enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            enabled,
            spinner: Mutex::new(None),
        })
    }

    fn start_spinner(&self) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.red} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(messages::ANALYZING);
        bar.set_message(dim(messages::ANALYZING_DETAIL));
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut slot| slot.take()) {
            bar.finish_and_clear();
        }
    }
}

impl FlowObserver for CliObserver {
    fn on_step_change(&self, from: AppStep, to: AppStep) {
        if !self.enabled {
            return;
        }
        if to == AppStep::Analyzing {
            self.start_spinner();
        } else if from == AppStep::Analyzing {
            self.stop_spinner();
        }
    }

    fn on_submission_dispatched(&self, payload: &SubmissionPayload) {
        if self.enabled {
            eprintln!("{}", dim(&format!("Enviando dados para planilha ({})…", payload.data_envio)));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive session
  boletim

  # Prefill the first form
  boletim --cpf 12345678901 boletim.jpg

  # Send submissions to a test sheet
  boletim --webhook-url https://script.google.com/macros/s/<id>/exec

During the session type `sair` (or press Ctrl-D) to leave.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY        Google AI Studio key (API_KEY is also accepted)
  BOLETIM_MODEL         Override the Gemini model
  BOLETIM_WEBHOOK_URL   Override the spreadsheet webhook
"#;

/// Read Encceja boletim scores with Gemini and register them in the spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "boletim",
    version,
    about = "Read Encceja boletim scores with Gemini and register them in the spreadsheet",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Boletim to analyse first (JPG, PNG or PDF).
    file: Option<PathBuf>,

    /// CPF for the first form; digits only or already formatted.
    #[arg(long)]
    cpf: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "BOLETIM_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Gemini REST API.
    #[arg(long, env = "BOLETIM_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Spreadsheet webhook receiving confirmed submissions.
    #[arg(long, env = "BOLETIM_WEBHOOK_URL", default_value = DEFAULT_WEBHOOK_URL)]
    webhook_url: String,

    /// Path to a text file replacing the built-in extraction instruction.
    #[arg(long, env = "BOLETIM_EXTRACTION_PROMPT")]
    extraction_prompt: Option<PathBuf>,

    /// Extraction call timeout in seconds.
    #[arg(long, env = "BOLETIM_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Webhook POST timeout in seconds.
    #[arg(long, env = "BOLETIM_WEBHOOK_TIMEOUT", default_value_t = 15)]
    webhook_timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "BOLETIM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOLETIM_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "BOLETIM_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the screens, so they stay off
    // unless asked for.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    let observer = CliObserver::new(!cli.no_progress && !cli.quiet);
    let mut flow = FlowController::from_config(&config)
        .context("Failed to set up the extraction and webhook clients")?
        .with_observer(observer.clone());

    let mut prefill = Prefill {
        cpf: cli.cpf.clone(),
        file: cli.file.clone(),
    };
    let mut deliveries: Vec<DeliveryHandle> = Vec::new();

    print_header();

    loop {
        let keep_going = match flow.step() {
            AppStep::Form => run_form(&mut flow, &mut prefill, &mut prompt).await?,
            // `submit` only returns once analysis is over.
            AppStep::Analyzing => true,
            AppStep::Review => run_review(&mut flow, &mut deliveries)?,
            AppStep::Success => run_success(&mut flow)?,
        };
        if !keep_going {
            break;
        }
    }

    observer.stop_spinner();

    // Let in-flight webhook posts finish before the runtime shuts down.
    for delivery in deliveries {
        delivery.settled().await;
    }
    print_footer();

    Ok(())
}

/// Map CLI args to `FlowConfig`.
async fn build_config(cli: &Cli) -> Result<FlowConfig> {
    let mut builder = FlowConfig::builder()
        .model(&cli.model)
        .api_base_url(&cli.api_base_url)
        .webhook_url(&cli.webhook_url)
        .api_timeout_secs(cli.api_timeout)
        .webhook_timeout_secs(cli.webhook_timeout);

    if let Some(key) = cli.api_key.clone().or_else(|| FlowConfig::from_env().api_key) {
        builder = builder.api_key(key);
    }

    if let Some(ref path) = cli.extraction_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read extraction prompt from {:?}", path))?;
        builder = builder.extraction_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

// ── Screens ──────────────────────────────────────────────────────────────────

/// Values from the command line used for the first form only.
struct Prefill {
    cpf: Option<String>,
    file: Option<PathBuf>,
}

/// What the form needs from the participant next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
    AskCpf,
    AskFile,
    /// The last analysis failed; wait for Enter or another file.
    AskRetry,
    Submit,
}

fn form_action(state: &FlowState) -> FormAction {
    if !is_cpf_complete(state.cpf()) {
        FormAction::AskCpf
    } else if state.file().is_none() {
        FormAction::AskFile
    } else if state.awaiting_retry() {
        FormAction::AskRetry
    } else {
        FormAction::Submit
    }
}

/// Fill in what is missing, then submit at most once.
///
/// `ask` prints a label and reads one answer (`None` when the participant
/// leaves). Returns `false` when the participant leaves.
async fn run_form<A>(flow: &mut FlowController, prefill: &mut Prefill, ask: &mut A) -> Result<bool>
where
    A: FnMut(&str) -> Result<Option<String>>,
{
    println!();
    println!("{}", bold(messages::FORM_INTRO));
    if let Some(msg) = flow.state().error_message() {
        println!("{}", red(msg));
    }

    loop {
        match form_action(flow.state()) {
            FormAction::AskCpf => {
                let raw = match prefill.cpf.take() {
                    Some(cpf) => cpf,
                    None => match ask(&format!(
                        "{} {}",
                        messages::CPF_LABEL,
                        dim(messages::CPF_PLACEHOLDER)
                    ))? {
                        Some(line) => line,
                        None => return Ok(false),
                    },
                };
                let masked = flow.input_cpf(&raw).to_string();
                println!("  {}", cyan(&masked));
                if !is_cpf_complete(&masked) {
                    println!("{}", red(messages::CPF_INCOMPLETE));
                }
            }
            FormAction::AskFile => {
                let path = match prefill.file.take() {
                    Some(path) => path,
                    None => match ask(&format!(
                        "{} {}",
                        messages::FILE_LABEL,
                        dim(messages::FILE_FORMATS)
                    ))? {
                        Some(line) if !line.is_empty() => PathBuf::from(line),
                        Some(_) => {
                            println!("{}", red(messages::FILE_MISSING));
                            continue;
                        }
                        None => return Ok(false),
                    },
                };
                select(flow, &path);
            }
            FormAction::AskRetry => match ask(messages::RETRY_PROMPT)? {
                Some(line) if line.is_empty() => return submit(flow).await,
                Some(line) => select(flow, &PathBuf::from(line)),
                None => return Ok(false),
            },
            FormAction::Submit => return submit(flow).await,
        }
    }
}

async fn submit(flow: &mut FlowController) -> Result<bool> {
    println!("{}", bold(&format!("▶ {}", messages::SUBMIT_BUTTON)));
    flow.submit().await;
    Ok(true)
}

fn select(flow: &mut FlowController, path: &Path) {
    match SelectedFile::detect(path) {
        Ok(file) => {
            flow.select_file(file);
            print_selection(flow);
        }
        Err(e) => println!("{}", red(&e.to_string())),
    }
}

fn print_selection(flow: &FlowController) {
    let Some(file) = flow.state().file() else {
        return;
    };
    println!("  {} {}", dim(messages::FILE_SELECTED), file.name());
    if let Some(preview) = flow.state().preview_path() {
        let kind = if file.is_pdf() { "PDF" } else { "imagem" };
        println!("  {}", dim(&format!("{kind}: {}", preview.display())));
    }
}

fn run_review(flow: &mut FlowController, deliveries: &mut Vec<DeliveryHandle>) -> Result<bool> {
    let Some(data) = flow.state().result().cloned() else {
        // Nothing to review; go back to the form.
        flow.retake();
        return Ok(true);
    };

    println!();
    println!("{}", cyan(&format!("ℹ {}", messages::REVIEW_NOTICE)));
    println!();
    println!("  {}", bold(&messages::REVIEW_TITLE.to_uppercase()));
    if let Some(ref name) = data.student_name {
        println!("  {}", dim(name));
    }
    for row in review_rows(&data) {
        let line = row.to_string();
        let line = match row.status {
            RowStatus::Pass => green(&line),
            RowStatus::Fail => red(&line),
            RowStatus::Unknown => dim(&line),
        };
        println!("  {line}");
    }
    println!();
    println!("  [1] {}", bold(messages::CONFIRM_BUTTON));
    println!("  [2] {}", messages::RETAKE_BUTTON);

    loop {
        let Some(answer) = prompt(">")? else {
            return Ok(false);
        };
        let intent = match answer.to_lowercase().as_str() {
            "1" | "c" | "confirmar" => ReviewIntent::Confirm,
            "2" | "t" | "tentar" => ReviewIntent::Retake,
            _ => continue,
        };
        if let Some(delivery) = flow.handle_review(intent) {
            deliveries.push(delivery);
        }
        return Ok(true);
    }
}

fn run_success(flow: &mut FlowController) -> Result<bool> {
    println!();
    println!("  {} {}", green("✔"), bold(messages::SUCCESS_TITLE));
    println!();
    println!("  {}", messages::SUCCESS_BODY);
    println!("  {}", messages::SUCCESS_CALL_TO_ACTION);
    println!(
        "  {} {}",
        green(&bold(messages::WHATSAPP_BUTTON)),
        cyan(messages::WHATSAPP_URL)
    );
    println!();

    let Some(answer) = prompt(&format!("{}? [s/N]", messages::SUBMIT_ANOTHER))? else {
        return Ok(false);
    };
    if matches!(answer.to_lowercase().as_str(), "s" | "sim") {
        flow.submit_another();
        Ok(true)
    } else {
        Ok(false)
    }
}

fn print_header() {
    println!("{}", red(&bold(&messages::HEADER_TITLE.to_uppercase())));
    println!("{}", messages::HEADER_SUBTITLE);
}

fn print_footer() {
    println!();
    println!("{}", dim(messages::FOOTER));
}

/// Print `label` and read one trimmed line. `None` on EOF or `sair`.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label} ");
    io::stdout().flush().context("Failed to write to stdout")?;

    let mut line = String::new();
    // block_in_place keeps the blocking read off the executor's hot path.
    let read = tokio::task::block_in_place(|| io::stdin().read_line(&mut line))
        .context("Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("sair") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}
