use serde::{Deserialize, Serialize};

use super::MovieId;

/// Cap on recently watched movies (wizard step 1)
pub const MAX_RECENT_MOVIES: usize = 8;

/// Cap on all-time favorites (wizard step 2)
pub const MAX_FAVORITE_MOVIES: usize = 10;

/// Answers collected by the onboarding wizard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingData {
    #[serde(default)]
    pub recent_movies: Vec<MovieId>,
    #[serde(default)]
    pub favorite_movies: Vec<MovieId>,
    #[serde(default)]
    pub selected_vibes: Vec<String>,
    #[serde(default)]
    pub custom_vibe_text: String,
}

impl OnboardingData {
    /// Empty onboarding state
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops duplicate ids and enforces the per-step caps, keeping first occurrences
    pub fn normalized(mut self) -> Self {
        self.recent_movies = dedup_capped(self.recent_movies, MAX_RECENT_MOVIES);
        self.favorite_movies = dedup_capped(self.favorite_movies, MAX_FAVORITE_MOVIES);
        self.selected_vibes = dedup_capped(self.selected_vibes, VIBE_OPTIONS.len());
        self
    }

    /// Vibe ids that are not one of the preset options
    pub fn unknown_vibes(&self) -> Vec<&str> {
        self.selected_vibes
            .iter()
            .map(String::as_str)
            .filter(|id| Vibe::find(id).is_none())
            .collect()
    }

    pub fn has_vibe_answer(&self) -> bool {
        !self.selected_vibes.is_empty() || !self.custom_vibe_text.trim().is_empty()
    }

    /// Every wizard step has an answer
    pub fn is_complete(&self) -> bool {
        !self.recent_movies.is_empty() && !self.favorite_movies.is_empty() && self.has_vibe_answer()
    }
}

fn dedup_capped<T: PartialEq>(items: Vec<T>, cap: usize) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len().min(cap));
    for item in items {
        if out.len() == cap {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Preset taste tag offered on the vibes step
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Vibe {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
}

impl Vibe {
    pub fn find(id: &str) -> Option<&'static Vibe> {
        VIBE_OPTIONS.iter().find(|vibe| vibe.id == id)
    }
}

pub static VIBE_OPTIONS: [Vibe; 12] = [
    Vibe { id: "mind-bending", label: "Mind-bending plot twists", emoji: "🌀" },
    Vibe { id: "feel-good", label: "Feel-good comfort watch", emoji: "☀️" },
    Vibe { id: "ensemble", label: "Ensemble cast with great chemistry", emoji: "👥" },
    Vibe { id: "slow-burn", label: "Slow burn & atmospheric", emoji: "🌙" },
    Vibe { id: "visual", label: "Visually stunning cinematography", emoji: "🎨" },
    Vibe { id: "witty", label: "Witty dialogue & banter", emoji: "💬" },
    Vibe { id: "emotional", label: "Emotional & moving", emoji: "🥲" },
    Vibe { id: "action", label: "Non-stop action & thrills", emoji: "💥" },
    Vibe { id: "thought-provoking", label: "Thought-provoking themes", emoji: "🧠" },
    Vibe { id: "dark", label: "Dark & gritty", emoji: "🖤" },
    Vibe { id: "funny", label: "Laugh-out-loud funny", emoji: "😂" },
    Vibe { id: "romantic", label: "Romantic & heartfelt", emoji: "💕" },
];
