//! Password strength policy.
//!
//! Advisory only: the codec encrypts under any password. Hosts run this
//! before asking the user to confirm a new wallet password.

use std::fmt;

/// Minimum length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Highest attainable score.
pub const MAX_SCORE: u8 = 7;

/// A rule the password breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordIssue {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSymbol,
    /// Three ascending characters in a row, such as `abc` or `123`.
    SequentialRun,
    /// The same character three times in a row.
    RepeatedRun,
}

impl PasswordIssue {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooShort => "PASSWORD_TOO_SHORT",
            Self::MissingUppercase => "PASSWORD_NO_UPPERCASE",
            Self::MissingLowercase => "PASSWORD_NO_LOWERCASE",
            Self::MissingDigit => "PASSWORD_NO_DIGIT",
            Self::MissingSymbol => "PASSWORD_NO_SYMBOL",
            Self::SequentialRun => "PASSWORD_SEQUENTIAL",
            Self::RepeatedRun => "PASSWORD_REPEATED",
        }
    }
}

impl fmt::Display for PasswordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::TooShort => "must be at least 8 characters",
            Self::MissingUppercase => "must contain an uppercase letter",
            Self::MissingLowercase => "must contain a lowercase letter",
            Self::MissingDigit => "must contain a digit",
            Self::MissingSymbol => "must contain a punctuation mark or symbol",
            Self::SequentialRun => "must not contain sequential characters like abc or 123",
            Self::RepeatedRun => "must not repeat a character three times in a row",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    fn from_score(score: u8) -> Self {
        match score {
            6.. => Self::VeryStrong,
            5 => Self::Strong,
            4 => Self::Medium,
            2..=3 => Self::Weak,
            _ => Self::VeryWeak,
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VeryWeak => "very weak",
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very strong",
        })
    }
}

/// Result of [`assess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReport {
    pub issues: Vec<PasswordIssue>,
    /// One point per rule satisfied, 0..=7.
    pub score: u8,
    pub strength: Strength,
}

impl PasswordReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Score a password against every rule. Issues are listed in rule order.
pub fn assess(password: &str) -> PasswordReport {
    let chars: Vec<char> = password.chars().collect();
    let lower: Vec<char> = password.to_lowercase().chars().collect();

    let checks = [
        (chars.len() >= MIN_PASSWORD_LEN, PasswordIssue::TooShort),
        (chars.iter().any(|c| c.is_uppercase()), PasswordIssue::MissingUppercase),
        (chars.iter().any(|c| c.is_lowercase()), PasswordIssue::MissingLowercase),
        (chars.iter().any(|c| c.is_numeric()), PasswordIssue::MissingDigit),
        (chars.iter().any(|c| is_symbol(*c)), PasswordIssue::MissingSymbol),
        (!has_sequential_run(&lower), PasswordIssue::SequentialRun),
        (!has_repeated_run(&chars), PasswordIssue::RepeatedRun),
    ];

    let issues: Vec<PasswordIssue> = checks
        .iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, issue)| *issue)
        .collect();
    let score = MAX_SCORE - issues.len() as u8;

    PasswordReport {
        issues,
        score,
        strength: Strength::from_score(score),
    }
}

/// Punctuation or symbol: anything printable that is neither alphanumeric
/// nor whitespace.
fn is_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
}

fn has_sequential_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| {
        let (a, b, c) = (w[0] as u32, w[1] as u32, w[2] as u32);
        a + 1 == b && b + 1 == c
    })
}

fn has_repeated_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}
