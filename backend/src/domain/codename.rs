//! Codename generator.
//!
//! A codename is `Adjective + Noun + Verb` in PascalCase, for example
//! `SwiftPhantomStrikes`. Names are not checked for uniqueness; the
//! combination space keeps collisions rare.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::Codename;

const ADJECTIVES: &[&str] = &[
    "Swift", "Silent", "Sneaky", "Shadow", "Crafty", "Daring", "Nimble", "Clever", "Cunning",
    "Stealthy", "Bold", "Quiet", "Rapid", "Sly", "Brave", "Mystic", "Golden", "Velvet",
    "Midnight", "Phantom", "Wily", "Fearless", "Lucky", "Hidden", "Electric",
];

const NOUNS: &[&str] = &[
    "Phantom", "Falcon", "Panther", "Raven", "Fox", "Viper", "Ghost", "Cobra", "Jaguar",
    "Wolf", "Owl", "Tiger", "Shadow", "Hawk", "Lynx", "Badger", "Otter", "Panda", "Mantis",
    "Cipher", "Comet", "Specter", "Weasel", "Gecko", "Heron",
];

const VERBS: &[&str] = &[
    "Strikes", "Sneaks", "Prowls", "Dashes", "Vanishes", "Lurks", "Pounces", "Glides",
    "Sprints", "Slips", "Schemes", "Plots", "Creeps", "Dances", "Whispers", "Leaps",
    "Hides", "Roams", "Swoops", "Flickers", "Darts", "Tiptoes", "Escapes", "Shadows",
    "Wanders",
];

const MAX_ATTEMPTS: usize = 100;

/// Generate a codename using the thread-local random source.
///
/// # Examples
/// ```
/// let name = pocket_heist::domain::generate_codename();
/// assert!(name.as_str().starts_with(|c: char| c.is_ascii_uppercase()));
/// ```
#[must_use]
pub fn generate_codename() -> Codename {
    generate_codename_with(&mut rand::thread_rng())
}

/// Generate a codename drawing from `rng`.
///
/// Each segment is drawn independently from its own list. A segment retries
/// up to 100 times to avoid repeating a word already used in the same name
/// (some words appear in more than one list), then keeps its last draw.
pub fn generate_codename_with<R: Rng + ?Sized>(rng: &mut R) -> Codename {
    let mut used: HashSet<&'static str> = HashSet::with_capacity(3);
    let mut name = String::new();
    for words in [ADJECTIVES, NOUNS, VERBS] {
        let word = pick_unused(words, &used, rng);
        used.insert(word);
        name.push_str(word);
    }
    Codename::from_generated(name)
}

fn pick_unused<R: Rng + ?Sized>(
    words: &'static [&'static str],
    used: &HashSet<&'static str>,
    rng: &mut R,
) -> &'static str {
    let mut word = "";
    for _ in 0..MAX_ATTEMPTS {
        word = words.choose(rng).copied().unwrap_or_default();
        if !used.contains(word) {
            break;
        }
    }
    word
}
