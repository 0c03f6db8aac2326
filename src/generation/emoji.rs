//! Emoji vocabulary and reply garnish.

use rand::Rng;
use rand::seq::SliceRandom;

/// Emoji the persona uses and the learner counts.
pub const EMOJIS: &[&str] = &[
    // Positive
    "😊", "👍", "😂", "🔥", "💯", "👏", "😁", "🤣", "😎", "🙂", "😉", "🤩",
    // Reactions
    "🤔", "👀", "😅", "🤨", "🧐", "😮", "😯", "🤷‍♂️", "🤷‍♀️", "👆", "💪",
    // Topical
    "💻", "🚀", "📱", "🤖", "💡", "⚡", "✨", "🌟", "💰", "📈", "🎯", "🔍",
    // Trendy
    "💅", "🙌", "🫡", "🫠", "🤌", "✌️", "🫂", "🤝", "🙏", "🎉", "🔄",
    // Emphasis
    "❗", "❓", "⁉️", "‼️", "💭", "💬", "📢", "👇", "👈", "👉", "👋",
];

/// Pick one emoji uniformly.
pub fn random_emoji<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    EMOJIS.choose(rng).copied().unwrap_or("🙂")
}

/// Whether `text` already contains any known emoji.
#[must_use]
pub fn contains_emoji(text: &str) -> bool {
    EMOJIS.iter().any(|e| text.contains(e))
}

/// Every known emoji occurrence in `text`, one entry per occurrence.
///
/// Multi-codepoint sequences (e.g. the shrug variants) count as a single
/// emoji rather than as their component code points.
#[must_use]
pub fn emojis_in(text: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    for emoji in EMOJIS {
        for _ in text.matches(emoji) {
            found.push(*emoji);
        }
    }
    found
}

/// Where a garnish emoji goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    End,
    Start,
    Middle,
}

fn pick_placement<R: Rng + ?Sized>(rng: &mut R) -> Placement {
    // 70 / 10 / 20 split.
    match rng.gen_range(0..100) {
        0..70 => Placement::End,
        70..80 => Placement::Start,
        _ => Placement::Middle,
    }
}

/// Maybe add one emoji to `text` with the given probability.
///
/// Text that already has an emoji is returned unchanged. A middle placement
/// only applies to replies longer than three words; shorter ones are left
/// bare.
pub fn decorate<R: Rng + ?Sized>(text: &str, probability: f64, rng: &mut R) -> String {
    if contains_emoji(text) || !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return text.to_owned();
    }
    let emoji = random_emoji(rng);
    match pick_placement(rng) {
        Placement::End => format!("{text} {emoji}"),
        Placement::Start => format!("{emoji} {text}"),
        Placement::Middle => {
            let words: Vec<&str> = text.split_whitespace().collect();
            if words.len() > 3 {
                let mid = words.len() / 2;
                format!(
                    "{} {emoji} {}",
                    words[..mid].join(" "),
                    words[mid..].join(" ")
                )
            } else {
                text.to_owned()
            }
        }
    }
}

/// Append an emoji to `text` with the given probability.
pub fn maybe_append<R: Rng + ?Sized>(text: &str, probability: f64, rng: &mut R) -> String {
    if rng.gen_bool(probability.clamp(0.0, 1.0)) {
        format!("{text} {}", random_emoji(rng))
    } else {
        text.to_owned()
    }
}
