//! Replies for messages that call the bot by name.

use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Words that count as calling the bot.
pub const TRIGGERS: &[&str] = &[
    "bot", "boot", "bott", "b0t", "bto", "botillero", "botiyero", "votillero",
];

const PHRASES: &[&str] = &[
    "¿Qué pasa, wn? Aquí estoy.",
    "Dime, pos. ¿Qué necesitai?",
    "¿Me llamaste? Escribe `!menu` pa' ver lo que cacho hacer.",
    "Presente, jefe. 🫡",
    "Aquí el Botillero, ¿en qué te ayudo?",
    "No me molestí que estoy ocupado... mentira, dime.",
    "¿Otra vez tú? Ya po, ¿qué querí?",
    "Estoy más despierto que nunca. 🤖",
    "¿Alguien dijo bot? 👀",
    "Si necesitai algo, prueba con `!ayuda`.",
];

/// Recent picks kept to avoid repeating a phrase.
const RECENT_CAPACITY: usize = 5;

/// True when any word of `clean_text` is a trigger.
pub fn is_mention(clean_text: &str) -> bool {
    clean_text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| TRIGGERS.contains(&word))
}

/// Picks phrases at random, skipping the last few used.
pub struct MentionResponder {
    phrases: Vec<String>,
    recent: Mutex<VecDeque<usize>>,
    capacity: usize,
}

impl Default for MentionResponder {
    fn default() -> Self {
        Self::new(PHRASES.iter().map(|p| p.to_string()).collect())
    }
}

impl MentionResponder {
    pub fn new(phrases: Vec<String>) -> Self {
        // Keep at least one phrase eligible.
        let capacity = RECENT_CAPACITY.min(phrases.len().saturating_sub(1));
        Self {
            phrases,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn pick(&self) -> String {
        let mut recent = self.recent.lock().await;

        let candidates: Vec<usize> = (0..self.phrases.len())
            .filter(|i| !recent.contains(i))
            .collect();
        let Some(&choice) = candidates.choose(&mut rand::thread_rng()) else {
            return String::from("🤖");
        };

        if self.capacity > 0 {
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(choice);
        }
        self.phrases[choice].clone()
    }

    /// Reply text addressed to `tag` (an `@number` mention).
    pub async fn respond(&self, tag: &str) -> String {
        format!("{} {}", self.pick().await, tag)
    }
}
