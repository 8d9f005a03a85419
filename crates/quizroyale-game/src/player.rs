//! Per-player game state.
//!
//! A [`PlayerState`] belongs to exactly one client actor. Nothing else
//! mutates it: opponent effects arrive at that actor as commands and are
//! applied through [`PlayerState::afflict`] on the actor's own task.

use rand::Rng;

use crate::{
    Difficulty, GameConfig, GameError, Multiplier, Powerup, PowerupCatalog,
    Question, QuestionGenerator,
};

/// The result of a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub score: u32,
    pub coins: u32,
    /// Difficulty for the next question.
    pub difficulty: Difficulty,
    pub leveled_up: bool,
    /// Hard modes lifted by this answer; each one was reported to the
    /// lobby as an active effect.
    pub hard_modes_cleared: u32,
}

/// What a submitted answer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Not playing, or the answer was wrong.
    Ignored,
    /// Correct, but swallowed by a pending double tap. The same question
    /// stays open.
    Absorbed,
    Correct(Award),
}

/// A completed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    pub powerup: Powerup,
    pub new_coins: u32,
    /// The current question was replaced and a new one must be asked.
    pub needs_question: bool,
}

/// The local outcome of an opponent's power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affliction {
    pub needs_question: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    score: u32,
    coins: u32,
    score_multiplier: Multiplier,
    coin_multiplier: Multiplier,
    difficulty: Difficulty,
    streak: u32,
    expected_answer: Option<i32>,
    playing: bool,
    double_taps: u32,
    hard_modes: u32,
    /// Levels added on top of `difficulty` until the hard question is
    /// answered.
    hard_mode_boost: u8,
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            score: 0,
            coins: 0,
            score_multiplier: Multiplier::ONE,
            coin_multiplier: Multiplier::ONE,
            difficulty: Difficulty::MIN,
            streak: 0,
            expected_answer: None,
            playing: false,
            double_taps: 0,
            hard_modes: 0,
            hard_mode_boost: 0,
        }
    }

    // -- accessors --------------------------------------------------------

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn score_multiplier(&self) -> Multiplier {
        self.score_multiplier
    }

    pub fn coin_multiplier(&self) -> Multiplier {
        self.coin_multiplier
    }

    /// The level questions are asked at, including a pending hard mode.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty.raised(self.hard_mode_boost)
    }

    /// The level earned through answers and easy mode alone.
    pub fn base_difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn expected_answer(&self) -> Option<i32> {
        self.expected_answer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // -- lifecycle ----------------------------------------------------------

    /// Resets difficulty and multipliers and starts accepting answers.
    pub fn start(&mut self) {
        self.difficulty = Difficulty::MIN;
        self.score_multiplier = Multiplier::ONE;
        self.coin_multiplier = Multiplier::ONE;
        self.streak = 0;
        self.double_taps = 0;
        self.hard_modes = 0;
        self.hard_mode_boost = 0;
        self.playing = true;
    }

    /// Stops accepting answers and purchases.
    pub fn stop(&mut self) {
        self.playing = false;
        self.expected_answer = None;
    }

    /// Generates the next question at the current difficulty and makes
    /// its answer the expected one.
    pub fn ask<R: Rng>(
        &mut self,
        questions: &mut QuestionGenerator<R>,
    ) -> Question {
        let question = questions.generate(self.difficulty());
        self.expected_answer = Some(question.answer);
        question
    }

    // -- requests -----------------------------------------------------------

    pub fn submit(&mut self, answer: i32, config: &GameConfig) -> Submission {
        if !self.playing || self.expected_answer != Some(answer) {
            return Submission::Ignored;
        }
        if self.double_taps > 0 {
            self.double_taps -= 1;
            return Submission::Absorbed;
        }

        self.streak += 1;
        let leveled_up = self.streak >= config.streak_for_level_up;
        if leveled_up {
            self.streak = 0;
            self.difficulty = self.difficulty.raised(1);
            tracing::trace!(difficulty = %self.difficulty, "difficulty raised");
        }

        self.score = self
            .score
            .saturating_add(self.score_multiplier.apply(config.points_per_correct));
        self.coins = self
            .coins
            .saturating_add(self.coin_multiplier.apply(config.coins_per_correct));

        let hard_modes_cleared = std::mem::take(&mut self.hard_modes);
        self.hard_mode_boost = 0;
        Submission::Correct(Award {
            score: self.score,
            coins: self.coins,
            difficulty: self.difficulty,
            leveled_up,
            hard_modes_cleared,
        })
    }

    /// Buys a power-up and applies any effect on the buyer.
    ///
    /// Opponent-targeted power-ups only cost coins here; delivering them
    /// is the lobby's job.
    pub fn purchase(
        &mut self,
        powerup_id: u8,
        catalog: &PowerupCatalog,
        config: &GameConfig,
    ) -> Result<Purchase, GameError> {
        if !self.playing {
            return Err(GameError::NotPlaying);
        }
        let (powerup, cost) = catalog.lookup(powerup_id)?;
        if cost > self.coins {
            return Err(GameError::InsufficientBalance {
                cost,
                balance: self.coins,
            });
        }
        self.coins -= cost;

        let mut needs_question = false;
        match powerup {
            Powerup::CoinMultiplier => {
                self.coin_multiplier = self
                    .coin_multiplier
                    .increased(config.multiplier_step_percent);
            }
            Powerup::ScoreMultiplier => {
                self.score_multiplier = self
                    .score_multiplier
                    .increased(config.multiplier_step_percent);
            }
            Powerup::SkipQuestion => needs_question = true,
            Powerup::EasyMode => {
                self.difficulty =
                    self.difficulty.lowered(config.easy_mode_levels);
                self.streak = 0;
                needs_question = true;
            }
            Powerup::DoubleTap | Powerup::CoinLeak | Powerup::HardMode => {}
        }

        Ok(Purchase {
            powerup,
            new_coins: self.coins,
            needs_question,
        })
    }

    /// Applies an opponent's power-up to this player.
    pub fn afflict(
        &mut self,
        powerup: Powerup,
        config: &GameConfig,
    ) -> Affliction {
        let mut needs_question = false;
        match powerup {
            Powerup::DoubleTap => self.double_taps += 1,
            Powerup::CoinLeak => {
                self.coin_multiplier =
                    self.coin_multiplier.decreased(config.coin_leak_percent);
            }
            // One question only; stacked hard modes do not add up.
            Powerup::HardMode => {
                self.hard_mode_boost = config.hard_mode_levels;
                self.streak = 0;
                self.hard_modes += 1;
                needs_question = true;
            }
            Powerup::CoinMultiplier
            | Powerup::ScoreMultiplier
            | Powerup::SkipQuestion
            | Powerup::EasyMode => {
                tracing::warn!(%powerup, "self-targeted power-up sent as affliction");
            }
        }
        Affliction { needs_question }
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> (PlayerState, QuestionGenerator) {
        let mut state = PlayerState::new();
        state.start();
        let mut questions = QuestionGenerator::seeded(11);
        state.ask(&mut questions);
        (state, questions)
    }

    fn answer_correctly(
        state: &mut PlayerState,
        questions: &mut QuestionGenerator,
        config: &GameConfig,
    ) -> Submission {
        let answer = state.expected_answer().unwrap();
        let outcome = state.submit(answer, config);
        state.ask(questions);
        outcome
    }

    // =====================================================================
    // Scoring
    // =====================================================================

    #[test]
    fn test_correct_answer_at_unit_multipliers() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();

        let outcome = answer_correctly(&mut state, &mut questions, &config);
        let Submission::Correct(award) = outcome else {
            panic!("expected a correct submission, got {outcome:?}");
        };
        assert_eq!(award.score, 100);
        assert_eq!(award.coins, 10);
        assert!(!award.leveled_up);
    }

    #[test]
    fn test_correct_answer_with_raised_multipliers() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();
        state.score_multiplier = Multiplier::from_percent(130);
        state.coin_multiplier = Multiplier::from_percent(120);

        let Submission::Correct(award) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!(award.score, 130);
        assert_eq!(award.coins, 12);
    }

    #[test]
    fn test_multipliers_bought_through_catalog() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, mut questions) = playing();
        state.coins = 130;

        for _ in 0..3 {
            state
                .purchase(Powerup::ScoreMultiplier.id(), &catalog, &config)
                .unwrap();
        }
        for _ in 0..2 {
            state
                .purchase(Powerup::CoinMultiplier.id(), &catalog, &config)
                .unwrap();
        }
        assert_eq!(state.coins(), 0);
        assert_eq!(state.score_multiplier().as_f64(), 1.3);
        assert_eq!(state.coin_multiplier().as_f64(), 1.2);

        let Submission::Correct(award) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!((award.score, award.coins), (130, 12));
    }

    #[test]
    fn test_wrong_answer_is_ignored() {
        let config = GameConfig::default();
        let (mut state, _) = playing();
        let wrong = state.expected_answer().unwrap().wrapping_add(1);

        assert_eq!(state.submit(wrong, &config), Submission::Ignored);
        assert_eq!(state.score(), 0);
        assert_eq!(state.streak(), 0);
    }

    #[test]
    fn test_answers_ignored_when_not_playing() {
        let config = GameConfig::default();
        let mut state = PlayerState::new();
        let mut questions = QuestionGenerator::seeded(3);
        let q = state.ask(&mut questions);

        assert_eq!(state.submit(q.answer, &config), Submission::Ignored);

        state.start();
        state.stop();
        assert_eq!(state.submit(q.answer, &config), Submission::Ignored);
    }

    // =====================================================================
    // Difficulty progression
    // =====================================================================

    #[test]
    fn test_five_correct_raise_difficulty_once() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();

        for _ in 0..4 {
            answer_correctly(&mut state, &mut questions, &config);
        }
        assert_eq!(state.difficulty().get(), 1);
        assert_eq!(state.streak(), 4);

        let Submission::Correct(award) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert!(award.leveled_up);
        assert_eq!(award.difficulty.get(), 2);
        assert_eq!(state.streak(), 0);
    }

    #[test]
    fn test_difficulty_caps_at_ten() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();

        for _ in 0..100 {
            answer_correctly(&mut state, &mut questions, &config);
        }
        assert_eq!(state.difficulty(), Difficulty::MAX);
        assert_eq!(state.score(), 100 * 100);
    }

    #[test]
    fn test_start_resets_progress() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();
        for _ in 0..10 {
            answer_correctly(&mut state, &mut questions, &config);
        }
        state.coin_multiplier = Multiplier::from_percent(150);

        state.start();
        assert_eq!(state.difficulty(), Difficulty::MIN);
        assert_eq!(state.coin_multiplier(), Multiplier::ONE);
        assert_eq!(state.score(), 1000);
    }

    // =====================================================================
    // Purchases
    // =====================================================================

    #[test]
    fn test_purchase_insufficient_balance() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, _) = playing();
        state.coins = 19;

        assert_eq!(
            state.purchase(0, &catalog, &config),
            Err(GameError::InsufficientBalance {
                cost: 20,
                balance: 19
            })
        );
        assert_eq!(state.coins(), 19);
        assert_eq!(state.coin_multiplier(), Multiplier::ONE);
    }

    #[test]
    fn test_purchase_invalid_id_and_not_playing() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, _) = playing();
        state.coins = 1_000;

        assert_eq!(
            state.purchase(9, &catalog, &config),
            Err(GameError::InvalidPowerupId(9))
        );
        state.stop();
        assert_eq!(
            state.purchase(0, &catalog, &config),
            Err(GameError::NotPlaying)
        );
        assert_eq!(state.coins(), 1_000);
    }

    #[test]
    fn test_purchase_reports_reduced_balance() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, _) = playing();
        state.coins = 600;

        let purchase = state.purchase(6, &catalog, &config).unwrap();
        assert_eq!(purchase.powerup, Powerup::HardMode);
        assert_eq!(purchase.new_coins, 100);
        assert!(!purchase.needs_question);
        assert_eq!(state.difficulty(), Difficulty::MIN);
    }

    #[test]
    fn test_skip_question_requests_new_question() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, _) = playing();
        state.coins = 50;

        let purchase = state.purchase(2, &catalog, &config).unwrap();
        assert!(purchase.needs_question);
        assert_eq!(purchase.new_coins, 0);
    }

    #[test]
    fn test_easy_mode_lowers_difficulty_and_resets_streak() {
        let config = GameConfig::default();
        let catalog = config.catalog();
        let (mut state, _) = playing();
        state.difficulty = Difficulty::new(6);
        state.streak = 3;
        state.coins = 200;

        let purchase = state.purchase(3, &catalog, &config).unwrap();
        assert!(purchase.needs_question);
        assert_eq!(state.difficulty().get(), 4);
        assert_eq!(state.streak(), 0);
    }

    // =====================================================================
    // Afflictions
    // =====================================================================

    #[test]
    fn test_coin_leak_floors_at_zero() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();
        for _ in 0..12 {
            state.afflict(Powerup::CoinLeak, &config);
        }
        assert_eq!(state.coin_multiplier().percent(), 0);

        let Submission::Correct(award) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!(award.coins, 0);
        assert_eq!(award.score, 100);
    }

    #[test]
    fn test_hard_mode_raises_difficulty_until_answered() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();
        state.difficulty = Difficulty::new(7);

        let affliction = state.afflict(Powerup::HardMode, &config);
        assert!(affliction.needs_question);
        assert_eq!(state.difficulty(), Difficulty::MAX);
        state.ask(&mut questions);

        let Submission::Correct(first) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!(first.hard_modes_cleared, 1);
        assert_eq!(first.difficulty.get(), 7);
        assert_eq!(state.difficulty().get(), 7);

        let Submission::Correct(second) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!(second.hard_modes_cleared, 0);
        assert_eq!(state.difficulty().get(), 7);
    }

    #[test]
    fn test_hard_mode_returns_to_base_difficulty() {
        let config = GameConfig::default();
        let (mut state, mut questions) = playing();

        state.afflict(Powerup::HardMode, &config);
        let hard = state.ask(&mut questions);
        assert_eq!(state.difficulty().get(), 6);
        assert_eq!(state.base_difficulty(), Difficulty::MIN);
        assert_eq!(state.expected_answer(), Some(hard.answer));

        let Submission::Correct(award) =
            answer_correctly(&mut state, &mut questions, &config)
        else {
            panic!("expected a correct submission");
        };
        assert_eq!(award.hard_modes_cleared, 1);
        assert_eq!(award.difficulty, Difficulty::MIN);
        assert_eq!(state.difficulty(), Difficulty::MIN);
    }

    #[test]
    fn test_stacked_hard_modes_raise_once() {
        let config = GameConfig::default();
        let (mut state, _) = playing();

        state.afflict(Powerup::HardMode, &config);
        state.afflict(Powerup::HardMode, &config);
        assert_eq!(state.difficulty().get(), 6);
    }

    #[test]
    fn test_double_tap_absorbs_one_correct_answer() {
        let config = GameConfig::default();
        let (mut state, _) = playing();
        let answer = state.expected_answer().unwrap();

        let affliction = state.afflict(Powerup::DoubleTap, &config);
        assert!(!affliction.needs_question);

        assert_eq!(state.submit(answer, &config), Submission::Absorbed);
        assert_eq!(state.score(), 0);
        assert!(matches!(
            state.submit(answer, &config),
            Submission::Correct(_)
        ));
        assert_eq!(state.score(), 100);
    }

    #[test]
    fn test_stacked_double_taps_each_absorb_once() {
        let config = GameConfig::default();
        let (mut state, _) = playing();
        let answer = state.expected_answer().unwrap();
        state.afflict(Powerup::DoubleTap, &config);
        state.afflict(Powerup::DoubleTap, &config);

        assert_eq!(state.submit(answer, &config), Submission::Absorbed);
        assert_eq!(state.submit(answer, &config), Submission::Absorbed);
        assert!(matches!(
            state.submit(answer, &config),
            Submission::Correct(_)
        ));
    }
}
