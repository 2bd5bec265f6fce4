use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use legacy_stripper::config::{self, StripPlan};
use legacy_stripper::region::line_of;
use legacy_stripper::{
    strip, DecodeMode, GapFate, GapPolicy, SourceDocument, StripError, StripOutcome,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

const TARGET_ENV: &str = "LEGACY_STRIP_TARGET";

#[derive(Parser)]
#[command(name = "legacy-stripper")]
#[command(about = "Remove legacy script blocks from a source file", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove the planned blocks and overwrite the file
    Apply {
        /// File to edit (overrides LEGACY_STRIP_TARGET and the plan)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Strip plan TOML (defaults to the built-in legacy cleanup)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Dry run - show what would be removed without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// What to do with text between two blocks (overrides the plan)
        #[arg(long, value_enum)]
        gaps: Option<GapArg>,
    },

    /// Locate the planned blocks without modifying the file
    Check {
        /// File to inspect (overrides LEGACY_STRIP_TARGET and the plan)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Strip plan TOML (defaults to the built-in legacy cleanup)
        #[arg(short, long)]
        plan: Option<PathBuf>,
    },

    /// Print the resolved strip plan and its replacement template
    Plan {
        /// Strip plan TOML (defaults to the built-in legacy cleanup)
        #[arg(short, long)]
        plan: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GapArg {
    Preserve,
    Discard,
}

impl From<GapArg> for GapPolicy {
    fn from(arg: GapArg) -> Self {
        match arg {
            GapArg::Preserve => GapPolicy::Preserve,
            GapArg::Discard => GapPolicy::Discard,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            file,
            plan,
            dry_run,
            diff,
            gaps,
        } => cmd_apply(file, plan, dry_run, diff, gaps.map(GapPolicy::from)),

        Commands::Check { file, plan } => cmd_check(file, plan),

        Commands::Plan { plan } => cmd_plan(plan),
    }
}

fn load_plan(path: Option<PathBuf>) -> Result<StripPlan> {
    match path {
        Some(path) => config::load_from_path(&path)
            .with_context(|| format!("loading strip plan {}", path.display())),
        None => config::builtin().context("loading built-in strip plan"),
    }
}

/// Resolve the file to edit.
///
/// Priority order:
/// 1. Explicit --file flag
/// 2. LEGACY_STRIP_TARGET environment variable
/// 3. The plan's `target.file`
fn resolve_target(cli_file: Option<PathBuf>, plan: &StripPlan) -> Result<PathBuf> {
    if let Some(path) = cli_file {
        return Ok(path);
    }

    if let Ok(env_path) = env::var(TARGET_ENV) {
        if !env_path.trim().is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }

    if let Some(path) = &plan.target {
        return Ok(path.clone());
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}",
        "No target file to edit.".red(),
        "Try one of:".bold(),
        "1. Specify explicitly: legacy-stripper apply --file path/to/index.html",
        "2. Set environment variable: export LEGACY_STRIP_TARGET=path/to/index.html"
    )
}

fn load_document(path: &Path) -> Result<SourceDocument> {
    let doc = SourceDocument::load(path)?;
    if let DecodeMode::Lossy { dropped_bytes } = doc.decode_mode() {
        eprintln!(
            "{}",
            format!(
                "Note: ignored {} undecodable byte(s) while reading {}",
                dropped_bytes,
                path.display()
            )
            .yellow()
        );
    }
    Ok(doc)
}

/// Run the plan against the document, printing conflict hints on failure.
fn strip_document(doc: &SourceDocument, plan: &StripPlan, gaps: GapPolicy) -> Result<StripOutcome> {
    match strip(doc.text(), &plan.anchors, &plan.template, gaps) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            eprintln!("{} {}", "✗".red(), err);
            match &err {
                StripError::AnchorNotFound { .. } => {
                    eprintln!("  {}", "CONFLICT: anchor matched no location".red());
                    eprintln!("  Possible causes:");
                    eprintln!("    - The block was already removed (this plan only runs once)");
                    eprintln!("    - The declaration was renamed or reformatted");
                    eprintln!("    - Blocks appear in a different order than the plan");
                }
                StripError::Region { .. } => {
                    eprintln!("  {}", "CONFLICT: block braces never balance".red());
                    eprintln!("  Check for a brace inside a string or comment in the block");
                }
                StripError::NoAnchors => {}
            }
            anyhow::bail!("no changes written to {}", doc.path().display())
        }
    }
}

fn report_outcome(doc: &SourceDocument, outcome: &StripOutcome) {
    let text = doc.text();
    for located in &outcome.regions {
        let (first, last) = located.region.line_range(text);
        println!(
            "{} Found {}: lines ~{} to ~{} {}",
            "✓".green(),
            located.anchor,
            first,
            last,
            format!("({})", located.region.kind).dimmed()
        );
    }

    for gap in &outcome.gaps {
        let line = line_of(text, gap.span.start);
        match gap.fate {
            GapFate::Collapsed => {}
            GapFate::Kept => println!(
                "{}",
                format!(
                    "  kept {} byte(s) of text between blocks at line ~{}",
                    gap.span.len(),
                    line
                )
                .dimmed()
            ),
            GapFate::Discarded => eprintln!(
                "{}",
                format!(
                    "Warning: discarding {} byte(s) of non-block text at line ~{}",
                    gap.span.len(),
                    line
                )
                .yellow()
            ),
        }
    }

    let new_chars = outcome.text.chars().count();
    println!();
    println!(
        "New file: {} characters, {} lines",
        new_chars,
        outcome.text.lines().count()
    );
    println!(
        "Removed: {} characters",
        doc.char_count() as i64 - new_chars as i64
    );
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (stripped)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(
    file: Option<PathBuf>,
    plan_path: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    gaps: Option<GapPolicy>,
) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let target = resolve_target(file, &plan)?;
    let doc = load_document(&target)?;

    println!("Plan: {}", plan.name);
    println!("File: {}", target.display());
    println!(
        "Original file: {} characters, {} lines",
        doc.char_count(),
        doc.line_count()
    );
    println!();

    let outcome = strip_document(&doc, &plan, gaps.unwrap_or(plan.gaps))?;
    report_outcome(&doc, &outcome);

    if show_diff {
        display_diff(&target, doc.text(), &outcome.text);
    }

    if dry_run {
        println!();
        println!("{}", "[DRY RUN - no changes written]".cyan());
        return Ok(());
    }

    doc.write_back(&outcome.text)?;

    println!();
    println!(
        "{} {}",
        "✓".green(),
        format!(
            "Successfully removed {} legacy block(s) from {}",
            outcome.regions.len(),
            target.display()
        )
        .green()
        .bold()
    );

    Ok(())
}

fn cmd_check(file: Option<PathBuf>, plan_path: Option<PathBuf>) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let target = resolve_target(file, &plan)?;
    let doc = load_document(&target)?;

    println!("{}", "Checking strip plan...".bold());
    println!("Plan: {}", plan.name);
    println!("File: {}", target.display());
    println!(
        "Original file: {} characters, {} lines",
        doc.char_count(),
        doc.line_count()
    );
    println!();

    let outcome = strip_document(&doc, &plan, plan.gaps)?;
    report_outcome(&doc, &outcome);

    println!();
    println!(
        "{} all {} anchor(s) located; file not modified",
        "✓".green(),
        outcome.regions.len()
    );

    Ok(())
}

fn cmd_plan(plan_path: Option<PathBuf>) -> Result<()> {
    let plan = load_plan(plan_path)?;

    println!("{}", plan.name.bold());
    if let Some(description) = &plan.description {
        println!("{}", description.dimmed());
    }
    println!();
    match &plan.target {
        Some(target) => println!("Target: {}", target.display()),
        None => println!("Target: {}", "(none, use --file)".dimmed()),
    }
    println!("Gaps: {}", plan.gaps);
    println!();

    println!("{}", "Anchors:".bold());
    for (idx, anchor) in plan.anchors.iter().enumerate() {
        let skip = String::from_utf8_lossy(&anchor.trailing.skip).escape_debug().to_string();
        println!(
            "  {}. {} [{}] {}",
            idx + 1,
            anchor.name,
            anchor.kind,
            anchor.matcher
        );
        println!("     {}", format!("trailing: \"{}\"", skip).dimmed());
    }
    println!();

    println!("{}", "Template:".bold());
    for line in plan.template.split_inclusive('\n') {
        print!("  {} {}", "|".dimmed(), line);
    }
    println!();

    Ok(())
}
