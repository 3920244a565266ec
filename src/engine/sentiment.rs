//! Lexicon-based sentiment scoring for short news and social text.
//!
//! Each known word carries a valence on a -4..=4 scale. A booster word right
//! before a valenced word raises its magnitude, and a negator in the three
//! preceding tokens flips and damps it. The summed valence is squashed into
//! (-1, 1) with `s / sqrt(s² + ALPHA)`.

use crate::dataset::SentimentLabel;
use std::collections::HashMap;

const ALPHA: f64 = 15.0;
const BOOST: f64 = 0.293;
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NEGATION_WINDOW: usize = 3;

/// Compound scores at or beyond these bounds get a polar label.
pub const POSITIVE_CUTOFF: f64 = 0.05;
pub const NEGATIVE_CUTOFF: f64 = -0.05;

const LEXICON: &[(&str, f64)] = &[
    // positive
    ("good", 1.9), ("great", 3.1), ("excellent", 3.2), ("amazing", 2.8), ("awesome", 3.1),
    ("best", 3.2), ("better", 1.9), ("love", 3.2), ("loving", 2.9), ("like", 1.5),
    ("happy", 2.7), ("win", 2.8), ("wins", 2.7), ("won", 2.7), ("success", 2.7),
    ("successful", 2.8), ("breakthrough", 2.3), ("innovative", 2.0), ("innovation", 1.8),
    ("growth", 1.6), ("grow", 1.3), ("gain", 2.0), ("gains", 1.9), ("surge", 1.6),
    ("surges", 1.6), ("rally", 1.8), ("rallies", 1.8), ("record", 1.0), ("boost", 1.7),
    ("boosts", 1.7), ("strong", 2.3), ("stronger", 2.1), ("profit", 1.9), ("profits", 1.9),
    ("profitable", 2.0), ("beat", 1.2), ("beats", 1.2), ("improve", 1.9), ("improved", 2.1),
    ("improves", 1.8), ("optimistic", 2.4), ("optimism", 2.5), ("promising", 2.1),
    ("opportunity", 1.8), ("opportunities", 1.8), ("benefit", 2.0), ("benefits", 1.9),
    ("secure", 1.4), ("safe", 1.9), ("progress", 1.8), ("upgrade", 1.5), ("praise", 2.6),
    ("praised", 2.4), ("positive", 2.6), ("exciting", 2.2), ("excited", 2.4), ("impressive", 2.6),
    ("recover", 1.6), ("recovery", 1.4), ("robust", 1.8), ("thrive", 2.4), ("thriving", 2.4),
    ("welcome", 2.0), ("welcomed", 1.9), ("support", 1.7), ("efficient", 1.8), ("easy", 1.9),
    ("bullish", 2.0), ("outperform", 1.9), ("upbeat", 2.1), ("approve", 1.8), ("approved", 1.8),
    // negative
    ("bad", -2.5), ("worse", -2.1), ("worst", -3.1), ("terrible", -2.1), ("awful", -2.0),
    ("hate", -2.7), ("fail", -2.5), ("fails", -2.2), ("failed", -2.3), ("failure", -2.3),
    ("loss", -1.3), ("losses", -1.7), ("lose", -1.7), ("losing", -1.6), ("lost", -1.3),
    ("crash", -1.7), ("crashes", -1.8), ("plunge", -1.8), ("plunges", -1.8), ("drop", -1.1),
    ("drops", -1.1), ("decline", -1.4), ("declines", -1.4), ("fall", -1.1), ("falls", -1.1),
    ("weak", -1.9), ("weaker", -1.9), ("risk", -1.1), ("risks", -1.1), ("risky", -1.4),
    ("threat", -2.4), ("threats", -2.2), ("fear", -2.2), ("fears", -1.8), ("worry", -1.9),
    ("worried", -1.2), ("concern", -1.4), ("concerns", -1.4), ("crisis", -3.1), ("scandal", -2.2),
    ("fraud", -2.8), ("lawsuit", -1.6), ("sued", -1.6), ("ban", -2.6), ("banned", -2.0),
    ("layoffs", -2.0), ("layoff", -2.0), ("cut", -1.1), ("cuts", -1.1), ("warning", -1.4),
    ("warn", -1.3), ("warns", -1.3), ("danger", -2.4), ("dangerous", -2.1), ("problem", -1.7),
    ("problems", -1.7), ("bug", -1.1), ("breach", -2.0), ("hack", -1.6), ("hacked", -1.7),
    ("attack", -2.1), ("negative", -2.7), ("slump", -1.9), ("recession", -2.2), ("bearish", -1.7),
    ("controversy", -1.5), ("criticism", -1.9), ("criticized", -1.9), ("sad", -2.1),
    ("angry", -2.3), ("disappointing", -2.2), ("disappointed", -1.9), ("broken", -2.1),
    ("harm", -2.5), ("harmful", -2.6), ("misleading", -1.9), ("chaos", -2.7), ("collapse", -2.3),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without",
    "cannot", "cant", "can't", "don't", "dont", "doesn't", "doesnt", "didn't", "didnt",
    "isn't", "isnt", "aren't", "arent", "wasn't", "wasnt", "weren't", "werent",
    "won't", "wont", "wouldn't", "wouldnt", "shouldn't", "shouldnt", "hardly", "rarely",
];

const BOOSTERS: &[&str] = &[
    "very", "extremely", "incredibly", "highly", "hugely", "really", "so", "most",
    "deeply", "especially", "exceptionally", "remarkably", "significantly", "sharply",
    "totally", "truly", "absolutely", "major", "massive",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub compound: f64,
    pub label: SentimentLabel,
}

pub fn label_for(compound: f64) -> SentimentLabel {
    if compound >= POSITIVE_CUTOFF {
        SentimentLabel::Positive
    } else if compound <= NEGATIVE_CUTOFF {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
        }
    }

    pub fn score(&self, text: &str) -> SentimentScore {
        let tokens = tokenize(text);
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&valence) = self.lexicon.get(token.as_str()) else { continue };
            let mut v = valence;

            if i > 0 && BOOSTERS.contains(&tokens[i - 1].as_str()) {
                v += BOOST * v.signum();
            }

            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|t| NEGATORS.contains(&t.as_str())) {
                v *= NEGATION_SCALAR;
            }

            sum += v;
        }

        if sum != 0.0 {
            let bangs = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64;
            sum += bangs * EXCLAMATION_BOOST * sum.signum();
        }

        let compound = normalize(sum);
        SentimentScore {
            compound,
            label: label_for(compound),
        }
    }
}

fn normalize(sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.replace('\u{2019}', "'").trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
