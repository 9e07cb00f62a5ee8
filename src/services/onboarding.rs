use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::{
    db::KeyValueStore,
    error::{AppError, AppResult},
    models::{MovieId, OnboardingData, Vibe, MAX_FAVORITE_MOVIES, MAX_RECENT_MOVIES},
    picker::{MoviePicker, PickerOptions, SelectionConsumer},
    services::providers::MovieLookup,
};

const ONBOARDING_KEY: &str = "movierec:onboarding";
const COMPLETED_AT_KEY: &str = "movierec:onboarding_completed_at";

/// Wizard steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    RecentMovies,
    FavoriteMovies,
    Vibes,
}

impl OnboardingStep {
    pub const COUNT: usize = 3;

    /// 1-based position, as shown in "Step 2 of 3"
    pub fn number(self) -> usize {
        match self {
            OnboardingStep::RecentMovies => 1,
            OnboardingStep::FavoriteMovies => 2,
            OnboardingStep::Vibes => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            OnboardingStep::RecentMovies => "What have you watched recently?",
            OnboardingStep::FavoriteMovies => "What are your all-time favorites?",
            OnboardingStep::Vibes => "What vibes do you love?",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            OnboardingStep::RecentMovies => "Pick a few movies you've seen in the past few months",
            OnboardingStep::FavoriteMovies => "The movies you'd rewatch anytime",
            OnboardingStep::Vibes => "Help us understand your taste",
        }
    }

    /// Picker cap for movie steps
    pub fn max_selections(self) -> Option<usize> {
        match self {
            OnboardingStep::RecentMovies => Some(MAX_RECENT_MOVIES),
            OnboardingStep::FavoriteMovies => Some(MAX_FAVORITE_MOVIES),
            OnboardingStep::Vibes => None,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            OnboardingStep::RecentMovies => Some(OnboardingStep::FavoriteMovies),
            OnboardingStep::FavoriteMovies => Some(OnboardingStep::Vibes),
            OnboardingStep::Vibes => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            OnboardingStep::RecentMovies => None,
            OnboardingStep::FavoriteMovies => Some(OnboardingStep::RecentMovies),
            OnboardingStep::Vibes => Some(OnboardingStep::FavoriteMovies),
        }
    }
}

/// Result of pressing Next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The current step has no answer yet
    Blocked,
    Moved(OnboardingStep),
    Completed(OnboardingData),
}

/// Three-step onboarding flow: recent movies, favorites, vibes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    data: OnboardingData,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new(OnboardingData::new())
    }
}

impl OnboardingWizard {
    /// Starts on step 1 with previously saved answers
    pub fn new(data: OnboardingData) -> Self {
        Self {
            step: OnboardingStep::RecentMovies,
            data: data.normalized(),
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn data(&self) -> &OnboardingData {
        &self.data
    }

    pub fn can_proceed(&self) -> bool {
        match self.step {
            OnboardingStep::RecentMovies => !self.data.recent_movies.is_empty(),
            OnboardingStep::FavoriteMovies => !self.data.favorite_movies.is_empty(),
            OnboardingStep::Vibes => self.data.has_vibe_answer(),
        }
    }

    /// Skip is offered on the first step only
    pub fn can_skip(&self) -> bool {
        self.step == OnboardingStep::RecentMovies
    }

    pub fn next(&mut self) -> Advance {
        if !self.can_proceed() {
            return Advance::Blocked;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                Advance::Moved(step)
            }
            None => Advance::Completed(self.data.clone()),
        }
    }

    /// Goes back one step; stays put on step 1
    pub fn back(&mut self) -> OnboardingStep {
        if let Some(step) = self.step.previous() {
            self.step = step;
        }
        self.step
    }

    /// Picker change callback for the recent-movies step
    pub fn set_recent_movies(&mut self, ids: &[MovieId]) {
        self.data.recent_movies = ids.iter().copied().take(MAX_RECENT_MOVIES).collect();
    }

    /// Picker change callback for the favorites step
    pub fn set_favorite_movies(&mut self, ids: &[MovieId]) {
        self.data.favorite_movies = ids.iter().copied().take(MAX_FAVORITE_MOVIES).collect();
    }

    /// Toggles a preset vibe. Unknown ids are rejected.
    pub fn toggle_vibe(&mut self, vibe_id: &str) -> AppResult<bool> {
        if Vibe::find(vibe_id).is_none() {
            return Err(AppError::InvalidInput(format!("Unknown vibe: {}", vibe_id)));
        }

        if let Some(position) = self.data.selected_vibes.iter().position(|v| v == vibe_id) {
            self.data.selected_vibes.remove(position);
            Ok(false)
        } else {
            self.data.selected_vibes.push(vibe_id.to_string());
            Ok(true)
        }
    }

    pub fn set_custom_vibe_text(&mut self, text: impl Into<String>) {
        self.data.custom_vibe_text = text.into();
    }
}

/// Writes a movie step's picker changes back into a shared wizard
pub struct StepSelection {
    wizard: Arc<Mutex<OnboardingWizard>>,
    step: OnboardingStep,
}

impl SelectionConsumer for StepSelection {
    fn on_selection_change(&self, ids: &[MovieId]) {
        let Ok(mut wizard) = self.wizard.lock() else {
            tracing::error!(step = self.step.number(), "Onboarding wizard lock poisoned");
            return;
        };
        match self.step {
            OnboardingStep::RecentMovies => wizard.set_recent_movies(ids),
            OnboardingStep::FavoriteMovies => wizard.set_favorite_movies(ids),
            OnboardingStep::Vibes => {}
        }
    }
}

/// Mounts the picker for the wizard's current step, seeded with that step's saved ids
///
/// Returns `None` on the vibes step, which has no picker.
pub async fn mount_step_picker(
    wizard: &Arc<Mutex<OnboardingWizard>>,
    lookup: Arc<dyn MovieLookup>,
    options: PickerOptions,
) -> Option<MoviePicker> {
    let (step, selected) = {
        let wizard = wizard.lock().ok()?;
        let step = wizard.step();
        let selected = match step {
            OnboardingStep::RecentMovies => wizard.data().recent_movies.clone(),
            OnboardingStep::FavoriteMovies => wizard.data().favorite_movies.clone(),
            OnboardingStep::Vibes => return None,
        };
        (step, selected)
    };

    let max_selections = step.max_selections()?;
    let consumer = StepSelection {
        wizard: wizard.clone(),
        step,
    };

    Some(
        MoviePicker::mount(
            lookup,
            Arc::new(consumer),
            selected,
            options.with_max_selections(max_selections),
        )
        .await,
    )
}

/// Onboarding answers in the injected key-value store
#[derive(Clone)]
pub struct OnboardingRepository {
    store: Arc<dyn KeyValueStore>,
}

impl OnboardingRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved answers, or the empty state when nothing has been saved
    ///
    /// A corrupt entry is logged and treated as empty rather than blocking onboarding.
    pub async fn load(&self) -> AppResult<OnboardingData> {
        let Some(json) = self.store.get(ONBOARDING_KEY).await? else {
            return Ok(OnboardingData::new());
        };

        match serde_json::from_str::<OnboardingData>(&json) {
            Ok(data) => Ok(data.normalized()),
            Err(e) => {
                tracing::warn!(error = %e, store = self.store.name(), "Discarding unreadable onboarding data");
                Ok(OnboardingData::new())
            }
        }
    }

    pub async fn save(&self, data: &OnboardingData) -> AppResult<()> {
        let json = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Onboarding serialization error: {}", e)))?;
        self.store.set(ONBOARDING_KEY, json).await?;

        tracing::info!(
            recent = data.recent_movies.len(),
            favorites = data.favorite_movies.len(),
            vibes = data.selected_vibes.len(),
            store = self.store.name(),
            "Onboarding data saved"
        );
        Ok(())
    }

    /// Saves the final answers and stamps completion. Incomplete answers are rejected.
    pub async fn complete(&self, data: &OnboardingData) -> AppResult<DateTime<Utc>> {
        if !data.is_complete() {
            return Err(AppError::InvalidInput(
                "Onboarding needs a recent movie, a favorite and a vibe".to_string(),
            ));
        }

        self.save(data).await?;

        let completed_at = Utc::now();
        self.store
            .set(COMPLETED_AT_KEY, completed_at.to_rfc3339())
            .await?;

        tracing::info!(%completed_at, "Onboarding completed");
        Ok(completed_at)
    }

    pub async fn completed_at(&self) -> AppResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(COMPLETED_AT_KEY).await? else {
            return Ok(None);
        };

        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| AppError::Internal(format!("Invalid completion timestamp: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Movie;
    use crate::services::providers::MockMovieLookup;

    fn complete_data() -> OnboardingData {
        OnboardingData {
            recent_movies: vec![603],
            favorite_movies: vec![27205],
            selected_vibes: vec!["mind-bending".to_string()],
            custom_vibe_text: String::new(),
        }
    }

    #[test]
    fn test_step_metadata() {
        assert_eq!(OnboardingStep::RecentMovies.number(), 1);
        assert_eq!(OnboardingStep::Vibes.number(), OnboardingStep::COUNT);
        assert_eq!(OnboardingStep::RecentMovies.max_selections(), Some(8));
        assert_eq!(OnboardingStep::FavoriteMovies.max_selections(), Some(10));
        assert_eq!(OnboardingStep::Vibes.max_selections(), None);
        assert_eq!(
            OnboardingStep::FavoriteMovies.title(),
            "What are your all-time favorites?"
        );
    }

    #[test]
    fn test_next_is_blocked_until_step_answered() {
        let mut wizard = OnboardingWizard::default();
        assert!(wizard.can_skip());
        assert_eq!(wizard.next(), Advance::Blocked);

        wizard.set_recent_movies(&[603]);
        assert_eq!(wizard.next(), Advance::Moved(OnboardingStep::FavoriteMovies));
        assert!(!wizard.can_skip());

        assert_eq!(wizard.next(), Advance::Blocked);
        wizard.set_favorite_movies(&[27205]);
        assert_eq!(wizard.next(), Advance::Moved(OnboardingStep::Vibes));
    }

    #[test]
    fn test_custom_text_alone_completes_vibes_step() {
        let mut wizard = OnboardingWizard::new(OnboardingData {
            recent_movies: vec![1],
            favorite_movies: vec![2],
            ..OnboardingData::new()
        });
        wizard.next();
        wizard.next();
        assert_eq!(wizard.step(), OnboardingStep::Vibes);

        wizard.set_custom_vibe_text("   ");
        assert_eq!(wizard.next(), Advance::Blocked);

        wizard.set_custom_vibe_text("ragtag crews with chemistry");
        match wizard.next() {
            Advance::Completed(data) => {
                assert_eq!(data.custom_vibe_text, "ragtag crews with chemistry")
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_back_stops_at_first_step() {
        let mut wizard = OnboardingWizard::new(complete_data());
        wizard.next();
        wizard.next();

        assert_eq!(wizard.back(), OnboardingStep::FavoriteMovies);
        assert_eq!(wizard.back(), OnboardingStep::RecentMovies);
        assert_eq!(wizard.back(), OnboardingStep::RecentMovies);
    }

    #[test]
    fn test_toggle_vibe() {
        let mut wizard = OnboardingWizard::default();

        assert!(wizard.toggle_vibe("witty").unwrap());
        assert!(wizard.toggle_vibe("dark").unwrap());
        assert!(!wizard.toggle_vibe("witty").unwrap());
        assert_eq!(wizard.data().selected_vibes, vec!["dark".to_string()]);

        assert!(wizard.toggle_vibe("spooky").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_picker_feeds_wizard() {
        let mut mock = MockMovieLookup::new();
        mock.expect_fetch_by_id().never();
        let lookup: Arc<dyn MovieLookup> = Arc::new(mock);
        let wizard = Arc::new(Mutex::new(OnboardingWizard::default()));

        let picker = mount_step_picker(&wizard, lookup.clone(), PickerOptions::default())
            .await
            .unwrap();
        assert_eq!(picker.options().max_selections, MAX_RECENT_MOVIES);

        picker
            .select(Movie {
                id: 603,
                title: "The Matrix".to_string(),
                release_year: Some("1999".to_string()),
                poster_path: None,
            })
            .await;
        picker.wait_idle().await;

        let mut guard = wizard.lock().unwrap();
        assert_eq!(guard.data().recent_movies, vec![603]);
        assert_eq!(guard.next(), Advance::Moved(OnboardingStep::FavoriteMovies));
        guard.set_favorite_movies(&[1]);
        guard.next();
        drop(guard);

        assert!(mount_step_picker(&wizard, lookup, PickerOptions::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_load_defaults_to_empty() {
        let repo = OnboardingRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.load().await.unwrap(), OnboardingData::new());
        assert_eq!(repo.completed_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repo = OnboardingRepository::new(Arc::new(MemoryStore::new()));
        repo.save(&complete_data()).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), complete_data());
    }

    #[tokio::test]
    async fn test_corrupt_entry_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(ONBOARDING_KEY, "{not json".to_string())
            .await
            .unwrap();

        let repo = OnboardingRepository::new(store);
        assert_eq!(repo.load().await.unwrap(), OnboardingData::new());
    }

    #[tokio::test]
    async fn test_complete_requires_every_step() {
        let repo = OnboardingRepository::new(Arc::new(MemoryStore::new()));
        let partial = OnboardingData {
            recent_movies: vec![1],
            ..OnboardingData::new()
        };

        assert!(matches!(
            repo.complete(&partial).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(repo.completed_at().await.unwrap(), None);

        let stamped = repo.complete(&complete_data()).await.unwrap();
        assert_eq!(repo.completed_at().await.unwrap(), Some(stamped));
    }
}
