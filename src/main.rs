use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use console::Emoji;

use mediateca::{
    CatalogItem, EventSink, FilterState, JsonFileStore, LibraryEvent, NoopSink, PlaybackPhase,
    Session, SharedEventSink, SortKey, ViewMode, read_catalog_file,
};

// Emoji with fallback for terminals without Unicode support
static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static HEART: Emoji<'_, '_> = Emoji("❤️  ", "[*] ");
static BROKEN_HEART: Emoji<'_, '_> = Emoji("💔 ", "[ ] ");
static PLAY: Emoji<'_, '_> = Emoji("▶️  ", "[>] ");
static PAUSE: Emoji<'_, '_> = Emoji("⏸️  ", "[=] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[>>] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[x] ");
static FLOPPY: Emoji<'_, '_> = Emoji("💾 ", "[s] ");
static SPARKLES: Emoji<'_, '_> = Emoji("✨ ", "[+] ");

/// Browse, filter and play a media library from the terminal
#[derive(Parser, Debug)]
#[command(name = "mediateca")]
#[command(about = "Browse, filter and play a media library from the terminal")]
#[command(version)]
struct Args {
    /// Path to the catalog JSON document
    #[arg(short, long, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Path to the persistent state file
    #[arg(short, long, default_value = "mediateca-state.json")]
    state: PathBuf,

    /// Quiet mode - suppress event output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// Filter selections shared by `list` and `preset save`
#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// Category, "favoritos", "recentes" or "todos"
    #[arg(long, default_value = "todos")]
    category: String,

    /// Free-text search term
    #[arg(long, default_value = "")]
    search: String,

    /// Year bucket: all, before, after or an exact year
    #[arg(long, default_value = "all")]
    year: String,

    /// Page bucket: all, 1-10, 11-20, 21-30, 31-50 or 51+
    #[arg(long, default_value = "all")]
    pages: String,

    /// Exact language match
    #[arg(long)]
    language: Option<String>,

    /// Exact item type match
    #[arg(long = "type")]
    item_type: Option<String>,

    /// Popularity bucket: all, mais-baixados, recentes or classicos
    #[arg(long, default_value = "all")]
    popularity: String,
}

impl FilterArgs {
    fn build(&self) -> Result<FilterState> {
        Ok(FilterState {
            category: self.category.parse().expect("category parse is infallible"),
            search_term: self.search.clone(),
            year: self.year.parse().map_err(anyhow::Error::msg)?,
            pages: self.pages.parse().map_err(anyhow::Error::msg)?,
            language: self.language.clone(),
            item_type: self.item_type.clone(),
            popularity: self.popularity.parse().map_err(anyhow::Error::msg)?,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog items through the active filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Sort key, e.g. title-asc, year-desc, downloads-desc
        #[arg(long, default_value = "relevance")]
        sort: String,
    },

    /// Show one item in detail
    Show { id: u32 },

    /// Toggle an item's favorite state
    Fav { id: u32 },

    /// List favorites in the order they were marked
    Favs,

    /// Play an item, or resume the active one
    Play { id: Option<u32> },

    /// Pause playback
    Pause,

    /// Move the playhead, in seconds
    Seek { seconds: f64 },

    /// Skip to the next item (wraps around)
    Next,

    /// Back to the previous item (wraps around)
    Prev,

    /// Show or set the volume
    Volume {
        /// New volume between 0.0 and 1.0
        value: Option<f64>,

        /// Mute, or restore the default volume when already muted
        #[arg(long)]
        mute: bool,
    },

    /// Show the playback state
    Status,

    /// Switch between grid and list rendering
    View { mode: String },

    /// Manage saved filter presets
    Preset {
        #[command(subcommand)]
        action: PresetCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// Save a set of filters under a name
    Save {
        name: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List saved presets
    List,

    /// Apply a saved preset and list the result
    Apply { name: String },

    /// Delete a saved preset
    Delete { name: String },
}

/// Event sink rendering engine events as terminal feedback
struct TerminalSink;

impl EventSink for TerminalSink {
    fn emit(&self, event: LibraryEvent) {
        match event {
            LibraryEvent::ItemSkipped { reason } => {
                eprintln!("{WARNING}{}", reason.yellow());
            }

            LibraryEvent::CatalogLoaded { total, skipped } if skipped > 0 => {
                eprintln!(
                    "{WARNING}{} items loaded, {} skipped",
                    total.to_string().cyan(),
                    skipped.to_string().yellow()
                );
            }

            LibraryEvent::FavoriteToggled { favorited, .. } => {
                if favorited {
                    println!("{HEART}{}", "Adicionado aos favoritos".green());
                } else {
                    println!("{BROKEN_HEART}{}", "Removido dos favoritos".yellow());
                }
            }

            LibraryEvent::PlaybackStarted { title, .. } => {
                println!("{PLAY}{}", title.bold().green());
            }

            LibraryEvent::PlaybackPaused {
                position_seconds, ..
            } => {
                println!("{PAUSE}Paused at {}", format_time(position_seconds).cyan());
            }

            LibraryEvent::PlaybackAdvanced { from, to } => {
                println!(
                    "{SKIP}{} {} {}",
                    from.to_string().dimmed(),
                    "→".dimmed(),
                    to.to_string().cyan()
                );
            }

            LibraryEvent::PlaybackFailed { reason, .. } => {
                eprintln!("{FAILURE}{}", reason.red());
            }

            LibraryEvent::VolumeChanged { volume, muted } => {
                if muted {
                    println!("{}", "Volume: mute".dimmed());
                } else {
                    println!("Volume: {}", format!("{:.0}%", volume * 100.0).cyan());
                }
            }

            LibraryEvent::PresetSaved { name } => {
                println!("{FLOPPY}Filtro {} salvo", name.bold());
            }

            LibraryEvent::PresetDeleted { name } => {
                println!("Filtro {} removido", name.bold());
            }

            LibraryEvent::StorageFailed { key, error } => {
                eprintln!(
                    "{WARNING}{} ({key}): {error}",
                    "State not persisted".yellow()
                );
            }

            // Loaded/ended/marked-played/filter/view feedback is implicit in
            // the command output itself.
            _ => {}
        }
    }
}

/// Format seconds as M:SS
fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn print_item_row(session: &Session, item: &CatalogItem) {
    let fav = if session.is_favorite(item.id) {
        "❤".red().to_string()
    } else {
        " ".to_string()
    };
    let played = if session.favorites().is_played(item.id) {
        "ouvido".dimmed().to_string()
    } else {
        String::new()
    };
    let metric = match (item.duration_seconds, item.pages) {
        (Some(secs), _) => format_time(f64::from(secs)),
        (None, Some(pages)) => format!("{pages} pág."),
        (None, None) => String::new(),
    };

    println!(
        "{:>4}  {} {:<52} {:<22} {}  {:<10} {}",
        item.id.to_string().cyan(),
        fav,
        truncate_title(&item.title, 50),
        item.author.dimmed(),
        item.year,
        metric,
        played
    );
}

fn print_item_card(session: &Session, item: &CatalogItem) {
    print_item_row(session, item);
    if let Some(subtitle) = &item.subtitle {
        println!("      {}", subtitle.dimmed());
    }
    if !item.tags.is_empty() {
        println!("      {}", item.tags.join(" · ").blue());
    }
}

fn print_listing(session: &Session, items: &[&CatalogItem]) {
    if items.is_empty() {
        println!("\n{}", "Nenhum item encontrado.".yellow());
        return;
    }

    for item in items {
        match session.view() {
            ViewMode::Grid => print_item_row(session, item),
            ViewMode::List => print_item_card(session, item),
        }
    }
    println!(
        "\n{} {}",
        items.len().to_string().bold(),
        if items.len() == 1 { "item" } else { "itens" }
    );
}

fn print_status(session: &Session) {
    let snapshot = session.playback();

    let phase = match snapshot.phase {
        PlaybackPhase::Idle => "idle".dimmed().to_string(),
        PlaybackPhase::Loaded => "loaded".cyan().to_string(),
        PlaybackPhase::Playing => "playing".green().bold().to_string(),
        PlaybackPhase::Paused => "paused".yellow().to_string(),
        PlaybackPhase::Ended => "ended".dimmed().to_string(),
    };

    match snapshot.item_id.and_then(|id| session.catalog().get(id)) {
        Some(item) => {
            println!("{HEADPHONES}{} [{phase}]", item.title.bold());
            let duration = snapshot
                .duration_seconds
                .map(format_time)
                .unwrap_or_else(|| "?".to_string());
            println!(
                "   {} / {}   volume {:.0}%",
                format_time(snapshot.position_seconds).cyan(),
                duration,
                snapshot.volume * 100.0
            );
        }
        None => println!("{HEADPHONES}Nothing loaded [{phase}]"),
    }

    if let Some(error) = &snapshot.load_error {
        println!("   {FAILURE}{}", error.red());
    }
}

fn run(session: &mut Session, command: Command) -> Result<()> {
    match command {
        Command::List { filters, sort } => {
            let sort: SortKey = sort.parse().map_err(anyhow::Error::msg)?;
            session.set_filter(filters.build()?);
            session.set_sort(sort);
            print_listing(session, &session.filtered());

            if session.filter_state().is_default() {
                let badges: Vec<String> = session
                    .category_counts()
                    .iter()
                    .map(|(category, count)| format!("{category} ({count})"))
                    .collect();
                println!("{}", badges.join("  ").dimmed());
            }
        }

        Command::Show { id } => {
            let item = session
                .catalog()
                .get(id)
                .with_context(|| format!("item {id} is not in the catalog"))?;
            print_item_card(session, item);
            println!("      {}", item.media_url.as_str().underline());
        }

        Command::Fav { id } => {
            session.toggle_favorite(id);
        }

        Command::Favs => {
            let favorites: Vec<&CatalogItem> = session
                .favorites()
                .list()
                .iter()
                .filter_map(|&id| session.catalog().get(id))
                .collect();
            print_listing(session, &favorites);
        }

        Command::Play { id } => {
            session.play(id)?;
            print_status(session);
        }

        Command::Pause => {
            session.pause();
        }

        Command::Seek { seconds } => {
            let landed = session.seek(seconds)?;
            println!("Playhead at {}", format_time(landed).cyan());
        }

        Command::Next => {
            session.next()?;
            print_status(session);
        }

        Command::Prev => {
            session.prev()?;
            print_status(session);
        }

        Command::Volume { value, mute } => {
            if mute {
                session.toggle_mute();
            } else if let Some(value) = value {
                session.set_volume(value);
            } else {
                println!("Volume: {:.0}%", session.playback().volume * 100.0);
            }
        }

        Command::Status => print_status(session),

        Command::View { mode } => {
            let mode: ViewMode = mode.parse().map_err(anyhow::Error::msg)?;
            session.set_view(mode);
            println!("View: {}", mode.to_string().cyan());
        }

        Command::Preset { action } => run_preset(session, action)?,
    }

    Ok(())
}

fn run_preset(session: &mut Session, action: PresetCommand) -> Result<()> {
    match action {
        PresetCommand::Save { name, filters } => {
            session.set_filter(filters.build()?);
            session.save_preset(&name);
        }

        PresetCommand::List => {
            if session.presets().is_empty() {
                println!("{}", "Nenhum filtro salvo.".dimmed());
            }
            for preset in session.presets() {
                println!(
                    "{:<24} {}  {}",
                    preset.name.bold(),
                    preset.id.dimmed(),
                    preset.saved_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                );
            }
        }

        PresetCommand::Apply { name } => {
            session.apply_preset(&name)?;
            print_listing(session, &session.filtered());
        }

        PresetCommand::Delete { name } => {
            session.delete_preset(&name)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            BOOKS,
            "mediateca".bold().magenta(),
            "- Biblioteca Digital".dimmed()
        );
    }

    let raw_items = read_catalog_file(&args.catalog)
        .with_context(|| format!("Failed to load catalog from {}", args.catalog.display()))?;

    let store = JsonFileStore::open(&args.state)
        .with_context(|| format!("Failed to open state file {}", args.state.display()))?;

    let events: SharedEventSink = if args.quiet {
        NoopSink::shared()
    } else {
        Arc::new(TerminalSink)
    };

    let mut session = Session::open(raw_items, Box::new(store), events);

    if session.record_visit() && !args.quiet {
        println!("{SPARKLES}{}", "Novos itens desde a sua última visita!".green());
    }

    let result = run(&mut session, args.command);

    // Page-unload analog: flush the playback position before exiting.
    session.close();

    result
}
