use thiserror::Error;

/// Raised by a strategy's `try_build()` when its configuration violates a
/// data-dependent constraint (a threshold out of range, a window too short). Every
/// violation found is reported at once, rather than failing on the first.
///
/// Programmer errors — calling `build()` twice, omitting a field that has no sane
/// default (a cache key extractor), composing the same strategy instance twice into
/// one pipeline — remain panics, matching the builder-misuse convention the rest of
/// this workspace inherited from its Tower-based ancestor.
#[derive(Debug, Error)]
#[error("invalid configuration for '{name}': {}", .violations.join("; "))]
pub struct ValidationError {
    pub name: String,
    pub violations: Vec<String>,
}

/// Accumulates configuration violations so a builder can report every problem in one
/// error instead of stopping at the first.
pub struct Validator {
    name: String,
    violations: Vec<String>,
}

impl Validator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            violations: Vec::new(),
        }
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.violations.push(message.into());
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                name: self.name,
                violations: self.violations,
            })
        }
    }
}
