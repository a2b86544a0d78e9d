// src/deck/preloaded.rs
// Decks that ship with the application and can be imported in one go.

use super::NewCard;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadedEntry {
    pub front: &'static str,
    pub back: &'static str,
    pub front_image_url: Option<&'static str>,
    pub back_image_url: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadedDeck {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub entries: Vec<PreloadedEntry>,
}

impl PreloadedDeck {
    /// The creation request for every entry, tagged with this deck.
    pub fn new_cards(&self) -> impl Iterator<Item = NewCard> + '_ {
        self.entries.iter().map(move |entry| {
            NewCard::new(entry.front, entry.back, self.id, self.name).with_images(
                entry.front_image_url.map(String::from),
                entry.back_image_url.map(String::from),
            )
        })
    }
}

const fn text(front: &'static str, back: &'static str) -> PreloadedEntry {
    PreloadedEntry { front, back, front_image_url: None, back_image_url: None }
}

pub fn builtin_decks() -> Vec<PreloadedDeck> {
    vec![
        PreloadedDeck {
            id: "python-basics",
            name: "Python Basics",
            description: "Fundamental concepts of Python programming language.",
            category: "Programming",
            entries: vec![
                text("What is Python?", "Python is a high-level, interpreted programming language known for its readability and versatility."),
                text("What are variables in Python?", "Variables are used to store data values. Python has no command for declaring a variable; it is created the moment you first assign a value to it."),
                text("What is a list in Python?", "A list is a collection which is ordered and changeable. Allows duplicate members. Written with square brackets."),
                text("What is a dictionary in Python?", "A dictionary is a collection which is unordered, changeable and indexed. No duplicate members. Written with curly braces, and have keys and values."),
                text("How do you write a comment in Python?", "Comments start with a `#`, and Python will ignore them."),
                text("`print(\"Hello, World!\")`\n\nWhat does this Python code do?", "It outputs the string \"Hello, World!\" to the console."),
                text("What is the output of `len([\"apple\", \"banana\", \"cherry\"])`?", "The output is `3`, as `len()` returns the number of items in a list."),
            ],
        },
        PreloadedDeck {
            id: "world-capitals",
            name: "World Capitals",
            description: "Test your knowledge of world capitals.",
            category: "Geography",
            entries: vec![
                text("What is the capital of France?", "Paris"),
                text("What is the capital of Japan?", "Tokyo"),
                text("What is the capital of Canada?", "Ottawa"),
                text("What is the capital of Australia?", "Canberra"),
                text("What is the capital of Germany?", "Berlin"),
                text("What is the capital of Brazil?", "Brasília"),
                PreloadedEntry {
                    front: "Which city is the capital of Italy?",
                    back: "Rome",
                    front_image_url: Some("https://placehold.co/300x200.png"),
                    back_image_url: Some("https://placehold.co/300x200.png"),
                },
            ],
        },
        PreloadedDeck {
            id: "basic-math",
            name: "Basic Math Operations",
            description: "Fundamental mathematical operations and concepts.",
            category: "Mathematics",
            entries: vec![
                text("What is 2 + 2?", "4"),
                text("What is 10 - 3?", "7"),
                text("What is 5 * 4?", "20"),
                text("What is 12 / 3?", "4"),
                text("What is the square root of 9?", "3"),
                text("Simplify: `(3 + 5) * 2`", "The result is `16`."),
            ],
        },
        PreloadedDeck {
            id: "us-history-early",
            name: "Early US History Facts",
            description: "Key events and figures in early United States history.",
            category: "History",
            entries: vec![
                text("In what year was the Declaration of Independence signed?", "1776"),
                text("Who was the first President of the United States?", "George Washington"),
                text("The US Constitution was ratified in which year?", "1788 (It was written in 1787, but ratification completed in 1788, and it went into effect in 1789)"),
                text("What was the primary cause of the American Revolutionary War?", "Issues of taxation without representation, and British control over colonial affairs."),
                PreloadedEntry {
                    front: "The image shows the signing of which important document?",
                    back: "The Declaration of Independence.",
                    front_image_url: Some("https://placehold.co/400x250.png"),
                    back_image_url: None,
                },
            ],
        },
    ]
}

pub fn find(id: &str) -> Option<PreloadedDeck> {
    builtin_decks().into_iter().find(|deck| deck.id == id)
}

/// Like `find`, but an unknown id is an `UnknownPreloadedDeck` error.
pub fn find_required(id: &str) -> Result<PreloadedDeck> {
    find(id).ok_or_else(|| Error::UnknownPreloadedDeck(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_find_required() {
        assert_eq!(find_required("world-capitals").unwrap().id, "world-capitals");
        assert!(matches!(find_required("klingon"), Err(Error::UnknownPreloadedDeck(id)) if id == "klingon"));
    }

    #[test]
    fn test_deck_ids_are_unique() {
        let decks = builtin_decks();
        let ids: HashSet<_> = decks.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), decks.len());
        assert!(decks.iter().all(|d| !d.entries.is_empty()));
    }

    #[test]
    fn test_new_cards_carry_deck_and_images() {
        let deck = find("world-capitals").unwrap();
        let cards: Vec<NewCard> = deck.new_cards().collect();
        assert_eq!(cards.len(), 7);
        assert!(cards.iter().all(|c| c.deck_id == "world-capitals" && c.deck_name == "World Capitals"));
        assert_eq!(cards[6].front_image_url.as_deref(), Some("https://placehold.co/300x200.png"));
        assert!(find("klingon").is_none());
    }
}
