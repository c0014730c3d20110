use std::fmt;

/// The result of an execution: exactly one of a successful result or a handled
/// exception. Unlike `Result`, an `Outcome` is the value a strategy inspects to decide
/// whether to retry, trip a breaker, or substitute a fallback — the classification of
/// "handled" is a property of the strategy's predicate, not of the variant itself.
#[derive(Clone)]
pub enum Outcome<T, E> {
    Result(T),
    Exception(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_result(&self) -> bool {
        matches!(self, Outcome::Result(_))
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Outcome::Exception(_))
    }

    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Result(value),
            Err(error) => Outcome::Exception(error),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Result(value) => Ok(value),
            Outcome::Exception(error) => Err(error),
        }
    }

    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Outcome::Result(value) => Outcome::Result(value),
            Outcome::Exception(error) => Outcome::Exception(error),
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Outcome::Result(value) => Some(value),
            Outcome::Exception(_) => None,
        }
    }

    pub fn exception(&self) -> Option<&E> {
        match self {
            Outcome::Exception(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }

    pub fn map_result<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U, E> {
        match self {
            Outcome::Result(value) => Outcome::Result(f(value)),
            Outcome::Exception(error) => Outcome::Exception(error),
        }
    }

    pub fn map_exception<F>(self, f: impl FnOnce(E) -> F) -> Outcome<T, F> {
        match self {
            Outcome::Result(value) => Outcome::Result(value),
            Outcome::Exception(error) => Outcome::Exception(f(error)),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Result(value) => f.debug_tuple("Result").field(value).finish(),
            Outcome::Exception(error) => f.debug_tuple("Exception").field(error).finish(),
        }
    }
}

/// Marker type used as `T` for operations with no meaningful return value, so a
/// void-returning user callback still flows through the same `Outcome<T, E>` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Void;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_result() {
        let outcome: Outcome<u32, &str> = Outcome::from_result(Ok(5));
        assert!(outcome.is_result());
        assert_eq!(outcome.into_result(), Ok(5));

        let outcome: Outcome<u32, &str> = Outcome::from_result(Err("boom"));
        assert!(outcome.is_exception());
        assert_eq!(outcome.into_result(), Err("boom"));
    }

    #[test]
    fn map_only_touches_matching_arm() {
        let outcome: Outcome<u32, &str> = Outcome::Result(2);
        assert_eq!(outcome.map_result(|v| v * 10).into_result(), Ok(20));

        let outcome: Outcome<u32, &str> = Outcome::Exception("boom");
        assert_eq!(outcome.map_result(|v| v * 10).into_result(), Err("boom"));
    }
}
