//! Arithmetic question generation.
//!
//! Each difficulty level has its own operand ranges and operators:
//!
//! | level | shape |
//! |---|---|
//! | 1 | one-digit `+` / `-` |
//! | 2 | two-digit `+` / `-` |
//! | 3 | one-digit `×` |
//! | 4 | one-digit `×` two-digit, either order |
//! | 5 | `÷` by 1–9 with a quotient of 2–9 |
//! | 6 | `a × b + c` or `a + b × c`, one-digit |
//! | 7 | three-digit `+` / `-` |
//! | 8 | `a × b × c`, one-digit |
//! | 9 | `÷` by 2–9 with a two-digit quotient |
//! | 10 | two-digit `×` |
//!
//! Division questions are built from the quotient, so every answer is an
//! integer. Subtraction may go negative.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Difficulty;

/// A question as shown to the player, with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub answer: i32,
}

impl Question {
    fn new(text: String, answer: i32) -> Self {
        Self { text, answer }
    }
}

/// Produces questions from an injectable randomness source.
pub struct QuestionGenerator<R = StdRng> {
    rng: R,
}

impl QuestionGenerator<StdRng> {
    /// A generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// A reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QuestionGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, difficulty: Difficulty) -> Question {
        match difficulty.get() {
            1 => self.add_or_sub(1, 9),
            2 => self.add_or_sub(10, 99),
            3 => {
                let (a, b) = (self.digit(), self.digit());
                Question::new(format!("{a} × {b} = "), a * b)
            }
            4 => {
                let (mut a, mut b) = (self.digit(), self.rng.random_range(10..=99));
                if self.rng.random_bool(0.5) {
                    std::mem::swap(&mut a, &mut b);
                }
                Question::new(format!("{a} × {b} = "), a * b)
            }
            5 => self.division(1..=9, 2..=9),
            6 => {
                let (a, b, c) = (self.digit(), self.digit(), self.digit());
                if self.rng.random_bool(0.5) {
                    Question::new(format!("{a} × {b} + {c} = "), a * b + c)
                } else {
                    Question::new(format!("{a} + {b} × {c} = "), a + b * c)
                }
            }
            7 => self.add_or_sub(100, 999),
            8 => {
                let (a, b, c) = (self.digit(), self.digit(), self.digit());
                Question::new(format!("{a} × {b} × {c} = "), a * b * c)
            }
            9 => self.division(2..=9, 10..=99),
            _ => {
                let a = self.rng.random_range(10..=99);
                let b = self.rng.random_range(10..=99);
                Question::new(format!("{a} × {b} = "), a * b)
            }
        }
    }

    fn digit(&mut self) -> i32 {
        self.rng.random_range(1..=9)
    }

    fn add_or_sub(&mut self, lo: i32, hi: i32) -> Question {
        let a = self.rng.random_range(lo..=hi);
        let b = self.rng.random_range(lo..=hi);
        if self.rng.random_bool(0.5) {
            Question::new(format!("{a} + {b} = "), a + b)
        } else {
            Question::new(format!("{a} - {b} = "), a - b)
        }
    }

    fn division(
        &mut self,
        divisor: std::ops::RangeInclusive<i32>,
        quotient: std::ops::RangeInclusive<i32>,
    ) -> Question {
        let b = self.rng.random_range(divisor);
        let result = self.rng.random_range(quotient);
        Question::new(format!("{} ÷ {b} = ", b * result), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evaluates the generated text with the usual precedence.
    fn evaluate(text: &str) -> i32 {
        let tokens: Vec<&str> = text
            .trim_end()
            .trim_end_matches('=')
            .split_whitespace()
            .collect();

        // Fold × and ÷ first, keeping + and - for a second pass.
        let mut terms: Vec<i32> = vec![tokens[0].parse().unwrap()];
        let mut ops: Vec<&str> = Vec::new();
        for pair in tokens[1..].chunks(2) {
            let (op, n) = (pair[0], pair[1].parse::<i32>().unwrap());
            match op {
                "×" => *terms.last_mut().unwrap() *= n,
                "÷" => {
                    let last = terms.last_mut().unwrap();
                    assert_eq!(*last % n, 0, "inexact division in {text:?}");
                    *last /= n;
                }
                _ => {
                    ops.push(op);
                    terms.push(n);
                }
            }
        }
        let mut total = terms[0];
        for (op, n) in ops.iter().zip(&terms[1..]) {
            match *op {
                "+" => total += n,
                "-" => total -= n,
                other => panic!("unexpected operator {other}"),
            }
        }
        total
    }

    fn operands(text: &str) -> Vec<i32> {
        text.split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect()
    }

    #[test]
    fn test_same_seed_same_questions() {
        let mut a = QuestionGenerator::seeded(7);
        let mut b = QuestionGenerator::seeded(7);
        for level in 1..=10 {
            let d = Difficulty::new(level);
            assert_eq!(a.generate(d), b.generate(d));
        }
    }

    #[test]
    fn test_answers_match_text_at_every_level() {
        let mut questions = QuestionGenerator::seeded(2024);
        for level in 1..=10 {
            for _ in 0..200 {
                let q = questions.generate(Difficulty::new(level));
                assert_eq!(evaluate(&q.text), q.answer, "level {level}: {q:?}");
                assert!(q.text.ends_with(" = "));
            }
        }
    }

    #[test]
    fn test_level_one_uses_single_digits() {
        let mut questions = QuestionGenerator::seeded(1);
        for _ in 0..200 {
            let q = questions.generate(Difficulty::new(1));
            assert!(operands(&q.text).iter().all(|n| (1..=9).contains(n)));
            assert!(q.text.contains(" + ") || q.text.contains(" - "));
        }
    }

    #[test]
    fn test_level_seven_uses_three_digits() {
        let mut questions = QuestionGenerator::seeded(3);
        for _ in 0..200 {
            let q = questions.generate(Difficulty::new(7));
            assert!(operands(&q.text).iter().all(|n| (100..=999).contains(n)));
        }
    }

    #[test]
    fn test_division_quotient_ranges() {
        let mut questions = QuestionGenerator::seeded(5);
        for _ in 0..200 {
            let easy = questions.generate(Difficulty::new(5));
            assert!(easy.text.contains('÷'));
            assert!((2..=9).contains(&easy.answer));

            let hard = questions.generate(Difficulty::new(9));
            assert!((10..=99).contains(&hard.answer));
            assert!((2..=9).contains(&operands(&hard.text)[1]));
        }
    }

    #[test]
    fn test_level_ten_two_digit_product() {
        let mut questions = QuestionGenerator::seeded(9);
        let q = questions.generate(Difficulty::MAX);
        let ops = operands(&q.text);
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|n| (10..=99).contains(n)));
        assert_eq!(q.answer, ops[0] * ops[1]);
    }
}
