//! Corpus CLI
//!
//! Terminal client for the study database: review due cards, manage content,
//! inspect statistics.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use corpus_core::{
    Card, CardState, CardType, CardUpdate, CorpusConfig, DailyStats, MemoryState, NewCard, Rating,
    Storage, DEFAULT_DUE_LIMIT, DEFAULT_SEARCH_LIMIT,
};

/// Corpus - spaced-repetition study CLI
#[derive(Parser)]
#[command(name = "corpus")]
#[command(author = "Corpus Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Corpus study database")]
#[command(long_about = "Corpus schedules flashcards with FSRS-4.5.\n\nCards are organised into pillars, domains and topics; every review can be undone.")]
struct Cli {
    /// Custom data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cards due for review
    Due {
        /// Maximum number of cards
        #[arg(long, default_value_t = DEFAULT_DUE_LIMIT)]
        limit: i64,
        /// Apply today's review and new-card budgets
        #[arg(long)]
        session: bool,
    },

    /// Rate a card: again, hard, good, easy (or 1-4)
    Review {
        /// Card id
        id: i64,
        /// Rating
        rating: String,
        /// Time spent answering in milliseconds
        #[arg(long, default_value_t = 0)]
        duration_ms: i64,
    },

    /// Revert the most recent review of a card
    Undo {
        /// Card id
        id: i64,
    },

    /// Show the next interval for each rating
    Preview {
        /// Card id
        id: i64,
    },

    /// Add a card to a topic
    Add {
        /// Topic id, e.g. technical-mastery/python/decorators
        topic: String,
        /// Question side
        front: String,
        /// Answer side
        back: String,
        /// Card type: basic or cloze
        #[arg(long, default_value = "basic")]
        card_type: String,
    },

    /// Edit a card's text or topic
    Edit {
        /// Card id
        id: i64,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        /// Move to another topic
        #[arg(long)]
        topic: Option<String>,
    },

    /// Delete a card and its review history
    Delete {
        /// Card id
        id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// List the cards of a topic
    List {
        /// Topic id
        topic: String,
    },

    /// Full-text search over card content
    Search {
        /// Search text
        query: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: i64,
    },

    /// Show the dashboard: due, new, streak and pillar progress
    Dashboard,

    /// Show daily statistics for a date range
    Stats {
        /// First date (YYYY-MM-DD), default six days before --to
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD), default today
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Show pillars, domains and topics
    Taxonomy {
        /// Only this pillar
        #[arg(long)]
        pillar: Option<String>,
    },

    /// Populate the taxonomy and sample cards on an empty database
    Seed,

    /// Write a consistent copy of the database
    Backup {
        /// Output file path for the backup
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CorpusConfig::from_env().with_data_dir(cli.data_dir);
    let storage = Storage::from_config(&config)?;

    let result = match cli.command {
        Commands::Due { limit, session } => run_due(&storage, limit, session),
        Commands::Review { id, rating, duration_ms } => run_review(&storage, id, &rating, duration_ms),
        Commands::Undo { id } => run_undo(&storage, id),
        Commands::Preview { id } => run_preview(&storage, id),
        Commands::Add {
            topic,
            front,
            back,
            card_type,
        } => run_add(&storage, topic, front, back, &card_type),
        Commands::Edit { id, front, back, topic } => run_edit(&storage, id, front, back, topic),
        Commands::Delete { id, yes } => run_delete(&storage, id, yes),
        Commands::List { topic } => run_list(&storage, &topic),
        Commands::Search { query, limit } => run_search(&storage, &query, limit),
        Commands::Dashboard => run_dashboard(&storage),
        Commands::Stats { from, to } => run_stats(&storage, from, to),
        Commands::Taxonomy { pillar } => run_taxonomy(&storage, pillar.as_deref()),
        Commands::Seed => run_seed(&storage),
        Commands::Backup { output } => run_backup(&storage, output),
    };

    if let Err(e) = storage.close() {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }
    result
}

// ============================================================================
// REVIEW
// ============================================================================

/// Run due command
fn run_due(storage: &Storage, limit: i64, session: bool) -> anyhow::Result<()> {
    let cards = if session {
        storage.get_review_session(limit)?
    } else {
        storage.get_due_cards(limit)?
    };

    let title = if session { "=== Review Session ===" } else { "=== Due Cards ===" };
    println!("{}", title.cyan().bold());
    println!();

    if cards.is_empty() {
        println!("{}", "Nothing due. Come back later.".dimmed());
        return Ok(());
    }

    for card in &cards {
        print_card_line(card);
    }

    let new = cards.iter().filter(|c| c.memory.state == CardState::New).count();
    println!();
    println!(
        "{}: {} ({} new, {} scheduled)",
        "Total".white().bold(),
        cards.len(),
        new,
        cards.len() - new
    );
    Ok(())
}

/// Run review command
fn run_review(storage: &Storage, id: i64, rating: &str, duration_ms: i64) -> anyhow::Result<()> {
    let rating = Rating::from_str(rating).map_err(anyhow::Error::msg)?;
    let outcome = storage.process_review(id, rating, duration_ms)?;

    println!("{}", "=== Review ===".cyan().bold());
    println!();
    println!("{}: {}", "Card".white().bold(), truncate(&outcome.card.front, 70));
    println!("{}: {}", "Rating".white().bold(), color_rating(rating));
    println!(
        "{}: {} -> {}",
        "State".white().bold(),
        outcome.log.state,
        outcome.card.memory.state
    );
    print_memory(&outcome.card.memory);
    println!();
    println!(
        "{}",
        format!("Next review in {}", format_interval(outcome.card.memory.scheduled_days))
            .green()
            .bold()
    );
    Ok(())
}

/// Run undo command
fn run_undo(storage: &Storage, id: i64) -> anyhow::Result<()> {
    println!("{}", "=== Undo Review ===".cyan().bold());
    println!();

    match storage.undo_review(id)? {
        Some(card) => {
            println!("{}: {}", "Card".white().bold(), truncate(&card.front, 70));
            println!("{}: {}", "State".white().bold(), card.memory.state);
            print_memory(&card.memory);
            println!();
            println!("{}", "Last review reverted.".green().bold());
        }
        None => println!("{}", format!("Card {} has no review to undo.", id).yellow()),
    }
    Ok(())
}

/// Run preview command
fn run_preview(storage: &Storage, id: i64) -> anyhow::Result<()> {
    let card = storage
        .get_card(id)?
        .ok_or_else(|| anyhow::anyhow!("Card {} not found", id))?;
    let preview = storage.preview_review(id)?;

    println!("{}", "=== Preview ===".cyan().bold());
    println!();
    println!("{}: {}", "Card".white().bold(), truncate(&card.front, 70));
    println!("{}: {}", "State".white().bold(), card.memory.state);
    println!();

    for rating in Rating::ALL {
        let next = preview.get(rating);
        println!(
            "  {:>5}  {:>8}  {}",
            color_rating(rating),
            format_interval(next.scheduled_days),
            next.state.to_string().dimmed()
        );
    }
    Ok(())
}

// ============================================================================
// CONTENT
// ============================================================================

/// Run add command
fn run_add(storage: &Storage, topic: String, front: String, back: String, card_type: &str) -> anyhow::Result<()> {
    let card_type = CardType::from_str(card_type).map_err(anyhow::Error::msg)?;
    let card = storage.create_card(NewCard {
        topic_id: topic,
        front,
        back,
        card_type,
        image_url: None,
    })?;

    println!(
        "{}",
        format!("Created card {} in {}", card.id, card.topic_id).green().bold()
    );
    Ok(())
}

/// Run edit command
fn run_edit(
    storage: &Storage,
    id: i64,
    front: Option<String>,
    back: Option<String>,
    topic: Option<String>,
) -> anyhow::Result<()> {
    let update = CardUpdate {
        front,
        back,
        topic_id: topic,
    };
    if update.is_empty() {
        anyhow::bail!("Nothing to change. Pass --front, --back or --topic.");
    }

    storage.update_card(id, update)?;
    println!("{}", format!("Updated card {}", id).green().bold());
    Ok(())
}

/// Run delete command
fn run_delete(storage: &Storage, id: i64, yes: bool) -> anyhow::Result<()> {
    let card = storage
        .get_card(id)?
        .ok_or_else(|| anyhow::anyhow!("Card {} not found", id))?;

    if !yes {
        let reviews = storage.get_review_logs(id)?.len();
        print!(
            "{} Delete \"{}\" and {} review(s)? This cannot be undone. [y/N] ",
            "WARNING:".red().bold(),
            truncate(&card.front, 50),
            reviews
        );
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    storage.delete_card(id)?;
    println!("{}", format!("Deleted card {}", id).green().bold());
    Ok(())
}

/// Run list command
fn run_list(storage: &Storage, topic: &str) -> anyhow::Result<()> {
    let topic = storage
        .get_topic(topic)?
        .ok_or_else(|| anyhow::anyhow!("Topic not found: {}", topic))?;
    let cards = storage.get_cards_by_topic(&topic.id)?;

    println!("{}", format!("=== {} ===", topic.name).cyan().bold());
    println!("{}", topic.id.dimmed());
    println!();

    if cards.is_empty() {
        println!("{}", "No cards yet.".dimmed());
        return Ok(());
    }
    for card in &cards {
        print_card_line(card);
    }
    Ok(())
}

/// Run search command
fn run_search(storage: &Storage, query: &str, limit: i64) -> anyhow::Result<()> {
    let hits = storage.search(query, limit)?;

    println!("{}", "=== Search ===".cyan().bold());
    println!();

    if hits.is_empty() {
        println!("{}", format!("No matches for \"{}\".", query).dimmed());
        return Ok(());
    }

    for hit in &hits {
        println!("  {} {}", format!("[{}]", hit.entity_id).dimmed(), hit.title.white().bold());
        let snippet = hit.snippet.replace("<mark>", "\u{1b}[1m").replace("</mark>", "\u{1b}[0m");
        println!("      {}", truncate(&snippet, 120));
    }
    println!();
    println!("{}: {}", "Matches".white().bold(), hits.len());
    Ok(())
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Run dashboard command
fn run_dashboard(storage: &Storage) -> anyhow::Result<()> {
    let data = storage.get_dashboard_data()?;

    println!("{}", "=== Corpus Dashboard ===".cyan().bold());
    println!();
    println!("{}: {}", "Due Today".white().bold(), data.due_today);
    println!("{}: {}", "New Available".white().bold(), data.new_available);
    println!("{}: {}", "Reviewed Today".white().bold(), data.reviewed_today);
    let streak = format!("{} day(s)", data.streak);
    println!(
        "{}: {}",
        "Streak".white().bold(),
        if data.streak > 0 { streak.green() } else { streak.dimmed() }
    );

    println!();
    println!("{}", "=== Pillar Progress ===".yellow().bold());
    for pillar in &data.pillar_progress {
        print_progress_bar(&pillar.name, pillar.mastered, pillar.total);
    }

    println!();
    println!("{}", "=== Last 7 Days ===".magenta().bold());
    if data.recent_activity.is_empty() {
        println!("{}", "No reviews this week.".dimmed());
    }
    for day in &data.recent_activity {
        print_day(day);
    }
    Ok(())
}

/// Run stats command
fn run_stats(storage: &Storage, from: Option<NaiveDate>, to: Option<NaiveDate>) -> anyhow::Result<()> {
    let to = to.unwrap_or_else(|| storage.today());
    let from = from.unwrap_or_else(|| to.checked_sub_days(Days::new(6)).unwrap_or(to));
    if from > to {
        anyhow::bail!("--from {} is after --to {}", from, to);
    }

    let rows = storage.get_stats_range(from, to)?;

    println!("{}", format!("=== Statistics {} .. {} ===", from, to).cyan().bold());
    println!();

    if rows.is_empty() {
        println!("{}", "No reviews in this range.".dimmed());
    }
    for day in &rows {
        print_day(day);
    }

    let reviewed: i64 = rows.iter().map(|d| d.cards_reviewed).sum();
    let new: i64 = rows.iter().map(|d| d.cards_new).sum();
    let time_ms: i64 = rows.iter().map(|d| d.time_spent_ms).sum();
    println!();
    println!("{}: {}", "Reviewed".white().bold(), reviewed);
    println!("{}: {}", "New Cards".white().bold(), new);
    println!("{}: {}", "Time Spent".white().bold(), format_duration_ms(time_ms));
    println!("{}: {} day(s)", "Current Streak".white().bold(), storage.calculate_streak()?);
    Ok(())
}

// ============================================================================
// MAINTENANCE
// ============================================================================

/// Run taxonomy command
fn run_taxonomy(storage: &Storage, pillar: Option<&str>) -> anyhow::Result<()> {
    let pillars: Vec<_> = storage
        .get_pillars()?
        .into_iter()
        .filter(|p| pillar.is_none_or(|id| p.id == id))
        .collect();

    println!("{}", "=== Taxonomy ===".cyan().bold());
    println!();

    if pillars.is_empty() {
        println!("{}", "No pillars. Run `corpus seed` first.".dimmed());
        return Ok(());
    }

    for pillar in &pillars {
        println!("{} {}", pillar.name.white().bold(), format!("({})", pillar.id).dimmed());
        for domain in storage.get_domains(Some(&pillar.id))? {
            println!("  {} {}", format!("T{}", domain.tier).dimmed(), domain.name);
            for topic in storage.get_topics(Some(&domain.id))? {
                println!("      - {} {}", topic.name, format!("({})", topic.id).dimmed());
            }
        }
        println!();
    }
    Ok(())
}

/// Run seed command
fn run_seed(storage: &Storage) -> anyhow::Result<()> {
    if storage.seed_initial_data()? {
        println!("{}", "Seeded pillars, domains and sample cards.".green().bold());
    } else {
        println!("{}", "Database already has a taxonomy; nothing seeded.".yellow());
    }
    Ok(())
}

/// Run backup command
fn run_backup(storage: &Storage, output: PathBuf) -> anyhow::Result<()> {
    println!("{}", "=== Corpus Backup ===".cyan().bold());
    println!();

    if output.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", output.display());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    println!("  {} {}", "From:".dimmed(), storage.path().display());
    println!("  {}   {}", "To:".dimmed(), output.display());
    storage.backup_to(&output)?;

    let file_size = std::fs::metadata(&output)?.len();
    let size_display = if file_size >= 1024 * 1024 {
        format!("{:.2} MB", file_size as f64 / (1024.0 * 1024.0))
    } else if file_size >= 1024 {
        format!("{:.1} KB", file_size as f64 / 1024.0)
    } else {
        format!("{} bytes", file_size)
    };

    println!();
    println!(
        "{}",
        format!("Backup complete: {} ({})", output.display(), size_display)
            .green()
            .bold()
    );
    Ok(())
}

// ============================================================================
// FORMATTING
// ============================================================================

fn print_card_line(card: &Card) {
    let due = match card.memory.due {
        Some(due) => due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "new".to_string(),
    };
    println!(
        "  {:>5}  {:<10}  {:<16}  {}",
        card.id.to_string().dimmed(),
        color_state(card.memory.state),
        due,
        truncate(&card.front, 60)
    );
}

fn print_memory(memory: &MemoryState) {
    println!("{}: {:.2}", "Stability".white(), memory.stability);
    println!("{}: {:.2}", "Difficulty".white(), memory.difficulty);
    println!("{}: {} / {}", "Reps / Lapses".white(), memory.reps, memory.lapses);
}

fn print_day(day: &DailyStats) {
    println!(
        "  {}  {:>4} reviewed  {:>3} new  {:>8}",
        day.date,
        day.cards_reviewed,
        day.cards_new,
        format_duration_ms(day.time_spent_ms).dimmed()
    );
}

/// Print a progress bar of mastered over total cards
fn print_progress_bar(label: &str, done: i64, total: i64) {
    let percentage = if total > 0 {
        (done as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));

    println!(
        "  {:28} [{:30}] {:>4}/{:<4} ({:>5.1}%)",
        truncate(label, 28),
        bar.green(),
        done,
        total,
        percentage
    );
}

fn color_state(state: CardState) -> colored::ColoredString {
    let label = state.as_str();
    match state {
        CardState::New => label.blue(),
        CardState::Learning => label.yellow(),
        CardState::Review => label.green(),
        CardState::Relearning => label.red(),
    }
}

fn color_rating(rating: Rating) -> colored::ColoredString {
    let label = rating.as_str();
    match rating {
        Rating::Again => label.red().bold(),
        Rating::Hard => label.yellow().bold(),
        Rating::Good => label.green().bold(),
        Rating::Easy => label.cyan().bold(),
    }
}

/// Human interval from fractional days: 10m, 5h, 3d, 2.5mo, 1.2y
fn format_interval(days: f64) -> String {
    let minutes = days * 24.0 * 60.0;
    if minutes < 60.0 {
        format!("{}m", minutes.round().max(1.0))
    } else if minutes < 24.0 * 60.0 {
        format!("{}h", (minutes / 60.0).round())
    } else if days < 30.0 {
        format!("{}d", days.round())
    } else if days < 365.0 {
        format!("{:.1}mo", days / 30.0)
    } else {
        format!("{:.1}y", days / 365.0)
    }
}

fn format_duration_ms(ms: i64) -> String {
    let secs = ms / 1000;
    if secs >= 3600 {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate a string for display (UTF-8 safe)
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
