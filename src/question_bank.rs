use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DATA_DIR: Dir = include_dir!("src/data");

const BUILTIN_DATASET: &str = "questions.json";

/// Number of options shown for every question
pub const OPTIONS_PER_QUESTION: usize = 3;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file {0} not found")]
    Missing(&'static str),
    #[error("dataset is not valid utf-8")]
    Encoding,
    #[error("unable to deserialize dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dataset contains no questions")]
    Empty,
    #[error("question for {color} must have exactly one correct option, found {found}")]
    CorrectOptionCount { color: String, found: usize },
}

/// The color a question asks about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub name: String,
    /// `#RRGGBB`
    pub hex: String,
}

impl ColorSwatch {
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let digits = self.hex.strip_prefix('#').unwrap_or(&self.hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some((channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub label: String,
    pub image: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub color: ColorSwatch,
    pub options: [AnswerOption; OPTIONS_PER_QUESTION],
}

impl Question {
    /// Position of the correct option. Always `Some` for questions that went
    /// through `QuestionBank::new`.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.is_correct)
    }
}

/// Validated, immutable set of questions a session is drawn from
#[derive(Debug, Clone)]
pub struct QuestionBank {
    entries: Vec<Question>,
}

impl QuestionBank {
    pub fn new(entries: Vec<Question>) -> Result<Self, DatasetError> {
        if entries.is_empty() {
            return Err(DatasetError::Empty);
        }
        for q in &entries {
            let found = q.options.iter().filter(|o| o.is_correct).count();
            if found != 1 {
                return Err(DatasetError::CorrectOptionCount {
                    color: q.color.name.clone(),
                    found,
                });
            }
        }
        Ok(Self { entries })
    }

    /// The dataset compiled into the binary
    pub fn builtin() -> Result<Self, DatasetError> {
        let file = DATA_DIR
            .get_file(BUILTIN_DATASET)
            .ok_or(DatasetError::Missing(BUILTIN_DATASET))?;
        let contents = file.contents_utf8().ok_or(DatasetError::Encoding)?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let entries: Vec<Question> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[Question] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Question> {
        shuffle(&self.entries, rng)
    }
}

/// Returns fresh copies of `entries` with the question order and each
/// question's options independently permuted. `entries` is left untouched.
pub fn shuffle<R: Rng + ?Sized>(entries: &[Question], rng: &mut R) -> Vec<Question> {
    let mut questions = entries.to_vec();
    fisher_yates(&mut questions, &mut *rng);
    for q in questions.iter_mut() {
        fisher_yates(&mut q.options, &mut *rng);
    }
    questions
}

/// Unbiased in-place permutation: walk down from the last index, swapping
/// each slot with a uniformly drawn slot in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
