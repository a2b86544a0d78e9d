// CardForge - main.rs
// Command-line front end over the card store.

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use log::{error, info, warn};

use cardforge::deck::preloaded;
use cardforge::scheduler::{format_interval, preview_intervals};
use cardforge::{Card, CardStore, Clock, Config, NewCard, Quality, Rating, ReviewSession, SystemClock};

const USAGE: &str = "Usage: cardforge <command> [args]

Commands:
  add <deck-id> <deck-name> <front> <back> [front-image-url] [back-image-url]
  due [deck-id]                 list cards due today
  decks                         list decks with their due counts
  review <card-id> <quality>    record a 0-5 rating for one card
  delete <card-id>
  delete-deck <deck-id>
  preloaded                     list the built-in decks
  import <preloaded-id>         add a built-in deck's cards
  study <deck-id> [--all]       review a deck interactively

Environment: CARDFORGE_DATA_DIR, CARDFORGE_BACKEND (sqlite|json|memory),
CARDFORGE_REVIEW_LOG (1|0), RUST_LOG";

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Err("no command given".to_string());
    };
    let rest = &args[1..];

    // Listing the built-in decks needs no store.
    if command == "preloaded" {
        for deck in preloaded::builtin_decks() {
            println!("{:<20} {} ({} cards, {}): {}", deck.id, deck.name, deck.entries.len(), deck.category, deck.description);
        }
        return Ok(());
    }

    let config = Config::from_env().map_err(|e| e.to_string())?;
    let storage = config.open_storage().map_err(|e| e.to_string())?;
    let (mut store, warnings) = CardStore::open(storage, Box::new(SystemClock)).map_err(|e| e.to_string())?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    match (command.as_str(), rest) {
        ("add", [deck_id, deck_name, front, back, images @ ..]) if images.len() <= 2 => {
            let new_card = NewCard::new(front, back, deck_id, deck_name)
                .with_images(images.first().cloned(), images.get(1).cloned());
            let card = store.create(new_card).map_err(|e| e.to_string())?;
            println!("{}", card.id);
        }
        ("due", [] | [_]) => {
            let deck_id = rest.first().map(String::as_str);
            for card in store.due_cards(deck_id) {
                println!("{}", card_line(&card));
            }
        }
        ("decks", []) => {
            for deck in store.decks_summary() {
                println!("{:<24} {:<20} {} due", deck.deck_name, deck.deck_id, deck.due_count);
            }
        }
        ("review", [card_id, quality]) => {
            let quality = parse_quality(quality)?;
            let card = store.review(card_id, quality).map_err(|e| e.to_string())?;
            if let Some(logger) = config.review_logger().map_err(|e| e.to_string())? {
                if let Err(e) = logger.log_review(&card, quality, SystemClock.now()) {
                    warn!("Could not write review log: {}", e);
                }
            }
            println!("{}", card_line(&card));
        }
        ("delete", [card_id]) => {
            if !store.delete(card_id).map_err(|e| e.to_string())? {
                info!("No card {}; nothing to delete.", card_id);
            }
        }
        ("delete-deck", [deck_id]) => {
            let removed = store.delete_deck(deck_id).map_err(|e| e.to_string())?;
            println!("Deleted {} cards.", removed);
        }
        ("import", [deck_id]) => {
            let deck = preloaded::find_required(deck_id).map_err(|e| e.to_string())?;
            let added = store.import_preloaded(&deck).map_err(|e| e.to_string())?;
            if added > 0 {
                println!("{} new cards from \"{}\" have been added to your collection.", added, deck.name);
            } else {
                println!("All cards from \"{}\" are already in your collection.", deck.name);
            }
        }
        ("study", [deck_id]) => study(&mut store, &config, deck_id, false)?,
        ("study", [deck_id, flag]) if flag == "--all" => study(&mut store, &config, deck_id, true)?,
        _ => {
            eprintln!("{}", USAGE);
            return Err(format!("invalid command: {}", args.join(" ")));
        }
    }
    Ok(())
}

fn parse_quality(text: &str) -> Result<Quality, String> {
    let value: i64 = text.trim().parse().map_err(|_| format!("quality must be a number, got `{}`", text))?;
    Quality::new(value).map_err(|e| e.to_string())
}

fn card_line(card: &Card) -> String {
    let front = card.front.lines().next().unwrap_or("");
    format!(
        "{}  [{}]  next {}  ivl {}  ef {:.2}  {}",
        card.id,
        card.deck_id,
        card.next_review_date.date_naive(),
        format_interval(card.interval),
        card.ease_factor,
        front
    )
}

/// Reads one trimmed line. `None` at end of input.
fn prompt(stdin: &mut impl BufRead, text: &str) -> Result<Option<String>, String> {
    print!("{}", text);
    io::stdout().flush().map_err(|e| e.to_string())?;
    let mut line = String::new();
    let read = stdin.read_line(&mut line).map_err(|e| e.to_string())?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

fn study(store: &mut CardStore, config: &Config, deck_id: &str, review_all: bool) -> Result<(), String> {
    let mut session = if review_all {
        ReviewSession::all(store, deck_id)
    } else {
        ReviewSession::due(store, deck_id)
    };
    if let Some(logger) = config.review_logger().map_err(|e| e.to_string())? {
        session = session.with_logger(logger);
    }

    if session.total_session_cards() == 0 {
        println!("No cards due in {}.", deck_id);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    while let Some(card) = session.next_card(store) {
        println!("\n[{}/{}] {}", session.reviews_complete() + 1, session.total_session_cards(), card.front);
        if let Some(url) = &card.front_image_url {
            println!("  (image: {})", url);
        }
        if prompt(&mut input, "Press Enter to show the answer...")?.is_none() {
            return Ok(());
        }
        println!("{}", card.back);
        if let Some(url) = &card.back_image_url {
            println!("  (image: {})", url);
        }

        let preview = preview_intervals(&card.scheduling_state());
        println!(
            "  0-2 -> {}   3 -> {}   4 -> {}   5 -> {}",
            format_interval(preview[0]),
            format_interval(preview[3]),
            format_interval(preview[4]),
            format_interval(preview[5])
        );

        let quality = loop {
            let Some(answer) = prompt(&mut input, "Rate 0-5, y (knew it), n (didn't), q to stop: ")? else {
                return Ok(());
            };
            match answer.as_str() {
                "q" => return Ok(()),
                "y" => break Rating::Knew.quality(),
                "n" => break Rating::DidNotKnow.quality(),
                other => match parse_quality(other) {
                    Ok(quality) => break quality,
                    Err(msg) => println!("{}", msg),
                },
            }
        };

        let updated = session.answer(store, quality, SystemClock.now()).map_err(|e| e.to_string())?;
        println!("Next review in {} ({}).", format_interval(updated.interval), updated.next_review_date.date_naive());
    }

    println!("\nSession complete: {} cards reviewed, {} to revisit.", session.reviews_complete(), session.failed_cards().len());
    if let Some(next) = store.next_review_date(deck_id) {
        println!("Next review for this deck: {}", next.date_naive());
    }
    Ok(())
}
