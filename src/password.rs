//! Password input as an explicit three-state value.
//!
//! An empty password ("encrypt with nothing") and a dismissed prompt are
//! different answers and flow through different paths: import treats a
//! cancelled container prompt as "abort", but a cancelled prompt for an
//! encrypted PEM key merely skips the key.

/// The outcome of asking the user for a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordInput {
    /// A non-empty password was typed.
    Provided(String),
    /// The prompt was confirmed with an empty field: "no password".
    Empty,
    /// The prompt was dismissed.
    Cancelled,
}

impl PasswordInput {
    /// Wraps a typed password, normalizing the empty string to [`Empty`].
    ///
    /// [`Empty`]: PasswordInput::Empty
    pub fn provided(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            PasswordInput::Empty
        } else {
            PasswordInput::Provided(value)
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PasswordInput::Cancelled)
    }

    /// The password characters, with [`Empty`] reading as `""`.
    /// Returns `None` when the prompt was cancelled.
    ///
    /// [`Empty`]: PasswordInput::Empty
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PasswordInput::Provided(value) => Some(value),
            PasswordInput::Empty => Some(""),
            PasswordInput::Cancelled => None,
        }
    }
}

/// External collaborator that can ask the user for a password.
///
/// The label describes what the password unlocks (typically a file name).
pub trait PasswordPrompt {
    fn request(&mut self, label: &str) -> PasswordInput;
}

/// A prompt that always cancels; useful when no human is available.
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    fn request(&mut self, _label: &str) -> PasswordInput {
        PasswordInput::Cancelled
    }
}

impl<F> PasswordPrompt for F
where
    F: FnMut(&str) -> PasswordInput,
{
    fn request(&mut self, label: &str) -> PasswordInput {
        self(label)
    }
}
