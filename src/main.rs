mod config;
mod controller;
mod detail;
mod gateway;
mod richtext;
mod session;
mod transcript;
mod tui;
mod upload;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use config::{ConfigFile, ResolvedConfig};
use controller::{Controller, SendAction};
use detail::Mode;
use gateway::HttpGateway;
use transcript::{Attachment, Author};

#[derive(Parser, Debug)]
#[command(
    name = "jobot",
    about = "A terminal chat client for career and skills-training advice",
    long_about = None,
)]
struct Args {
    /// Question to ask directly (omit to enter interactive TUI mode)
    question: Option<String>,

    /// Profile to use from config file
    #[arg(short, long, env = "JOBOT_PROFILE")]
    profile: Option<String>,

    /// Override backend endpoint URL
    #[arg(long, env = "JOBOT_ENDPOINT")]
    endpoint: Option<String>,

    /// Advice mode at startup (career or skill)
    #[arg(short, long, env = "JOBOT_MODE")]
    mode: Option<Mode>,

    /// Attach a PDF resume to the question
    #[arg(short, long, value_name = "FILE")]
    attach: Option<std::path::PathBuf>,

    /// Show timestamps on messages
    #[arg(long)]
    timestamps: bool,

    /// Write a default config file to ~/.config/jobot/config.toml and exit
    #[arg(long)]
    init: bool,

    /// List available profiles and exit
    #[arg(long)]
    profiles: bool,

    /// Generate shell completions and print to stdout (bash, zsh, fish, elvish)
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── --init ────────────────────────────────────────────────────────────────
    if args.init {
        let path = ConfigFile::write_default_if_missing()?;
        println!("Config written to: {}", path.display());
        println!("Edit it, then run: jobot");
        return Ok(());
    }

    // ── --completions ─────────────────────────────────────────────────────────
    if let Some(shell_name) = &args.completions {
        return generate_completions(shell_name);
    }

    let file = ConfigFile::load()?;

    // ── --profiles ────────────────────────────────────────────────────────────
    if args.profiles {
        print_profiles(&file);
        return Ok(());
    }

    let resolved = ResolvedConfig::resolve(
        &file,
        args.profile.as_deref(),
        args.endpoint.as_deref(),
        args.mode,
    );

    // ── One-shot mode (plain stdout, no TUI) ──────────────────────────────────
    if args.question.is_some() || args.attach.is_some() {
        return run_one_shot(args, resolved).await;
    }

    // ── Interactive TUI mode ──────────────────────────────────────────────────
    tui::run(resolved, args.timestamps).await
}

// ── One-shot mode ─────────────────────────────────────────────────────────────

/// Ask a single question (optionally with a resume attached) and print the
/// transcript, including any recommendation titles, to stdout.
async fn run_one_shot(args: Args, resolved: ResolvedConfig) -> Result<()> {
    println!();
    println!(
        "  ▲ jobot  {}  ·  {}  ·  {}",
        resolved.profile_name,
        resolved.mode.label(),
        resolved.endpoint
    );
    println!();

    let gateway = HttpGateway::new(resolved.endpoint.clone(), resolved.timeout_secs)?;
    let mut controller = Controller::new(resolved.mode);

    if let Some(path) = &args.attach {
        controller.stage_file(path);
    }

    let question = args.question.unwrap_or_default();
    if let SendAction::Dispatch(req, token) = controller.prepare_send(&question) {
        let outcome = gateway.submit_turn(req).await.map_err(|e| e.to_string());
        controller.apply_turn(token, outcome);
    }

    print_transcript_plain(&controller, args.timestamps);
    Ok(())
}

fn print_transcript_plain(controller: &Controller, timestamps: bool) {
    for entry in controller.transcript().snapshot() {
        let label = match entry.author {
            Author::User => "you",
            Author::Assistant => "jobot",
        };
        let stamp = if timestamps {
            format!("{} ", entry.timestamp.format("%H:%M"))
        } else {
            String::new()
        };
        let mut lines = entry.body.as_plain();
        if lines.is_empty() {
            lines.push(' ');
        }
        let mut first = true;
        for line in lines.lines() {
            if first {
                first = false;
                println!("  {stamp}{label}  {line}");
            } else {
                println!("  {:width$}{line}", "", width = stamp.len() + label.len() + 2);
            }
        }
        if let Some(Attachment::Recommendations(recs)) = &entry.attachment {
            for (i, rec) in recs.iter().enumerate() {
                println!("      {}. {}", i + 1, rec.title);
            }
        }
    }
}

// ── Profiles listing ──────────────────────────────────────────────────────────

fn print_profiles(file: &ConfigFile) {
    let mut entries: Vec<(String, String, String)> = file
        .profiles
        .iter()
        .map(|(name, p)| (name.clone(), p.endpoint.clone(), p.default_mode.label().to_string()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    println!();
    println!("  Profiles");
    for (name, endpoint, mode) in &entries {
        let marker = if *name == file.default_profile { " ←" } else { "" };
        println!("  {name}{marker}");
        println!("    endpoint  {endpoint}");
        println!("    mode      {mode}");
        println!();
    }
}

// ── Shell completions ─────────────────────────────────────────────────────────

fn generate_completions(shell_name: &str) -> Result<()> {
    use clap_complete::{Shell, generate};

    let shell: Shell = match shell_name.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        _ => {
            eprintln!("Unknown shell: {shell_name}");
            eprintln!("Supported: bash, zsh, fish, elvish");
            std::process::exit(1);
        }
    };

    let mut cmd = Args::command();
    generate(shell, &mut cmd, "jobot", &mut std::io::stdout());
    Ok(())
}
