//! The result vocabulary shared by every container in this crate.

use core::fmt::{self, Debug, Display, Formatter};

/// The closed set of outcomes an operation can report besides success.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The allocator denied a capacity change. The container is left intact,
    /// only its capacity stays where it was.
    AllocationFailure,
    /// A key or rank lookup did not match any stored element.
    NotFound,
    /// An insertion collided with an element stored under the same key.
    AlreadyExists,
    /// An iterator is exhausted. This is a control signal, not a fault.
    Stop,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::AllocationFailure => "memory allocation failed",
            Error::NotFound => "element not found",
            Error::AlreadyExists => "element already exists",
            Error::Stop => "iterator exhausted",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

/// An [`Error`] together with an element handed back to the caller.
///
/// Operations that take an element by value return it this way whenever
/// they do not keep it, so no element is ever lost on an error path:
///
/// * a rejected insertion hands back the value it was given;
/// * a removal whose shrinking step was denied hands back the element it
///   removed (the removal itself took effect);
/// * a lookup-and-remove that found nothing hands back the probe.
pub struct Failure<T> {
    kind: Error,
    value: T,
}

impl<T> Failure<T> {
    #[inline]
    pub(crate) fn new(kind: Error, value: T) -> Self {
        Failure { kind, value }
    }

    /// Returns the reported outcome.
    #[inline]
    pub fn kind(&self) -> Error {
        self.kind
    }

    /// Returns a reference to the element carried by this failure.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the failure, returning the element it carries.
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Decomposes the failure into its outcome and element.
    #[inline]
    pub fn into_parts(self) -> (Error, T) {
        (self.kind, self.value)
    }
}

impl<T> Debug for Failure<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> Display for Failure<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.kind, f)
    }
}

impl<T> core::error::Error for Failure<T> {}

impl<T> From<Failure<T>> for Error {
    fn from(failure: Failure<T>) -> Self {
        failure.kind
    }
}

/// A [`Failure`] from an insertion that refuses duplicates, which also
/// exposes the element already stored under the colliding key.
///
/// [`existing`](Rejected::existing) is `Some` exactly when the kind is
/// [`Error::AlreadyExists`].
pub struct Rejected<'a, T> {
    failure: Failure<T>,
    existing: Option<&'a T>,
}

impl<'a, T> Rejected<'a, T> {
    #[inline]
    pub(crate) fn duplicate(value: T, existing: &'a T) -> Self {
        Rejected {
            failure: Failure::new(Error::AlreadyExists, value),
            existing: Some(existing),
        }
    }

    /// Returns the reported outcome.
    #[inline]
    pub fn kind(&self) -> Error {
        self.failure.kind
    }

    /// Returns a reference to the element that was turned down.
    #[inline]
    pub fn value(&self) -> &T {
        &self.failure.value
    }

    /// Returns the element already stored under the same key, if the
    /// insertion collided with one.
    #[inline]
    pub fn existing(&self) -> Option<&'a T> {
        self.existing
    }

    /// Drops the reference to the stored element, keeping the failure.
    #[inline]
    pub fn into_failure(self) -> Failure<T> {
        self.failure
    }

    /// Decomposes the rejection into its outcome and the element that was
    /// turned down.
    #[inline]
    pub fn into_parts(self) -> (Error, T) {
        self.failure.into_parts()
    }
}

impl<T> From<Failure<T>> for Rejected<'_, T> {
    fn from(failure: Failure<T>) -> Self {
        Rejected {
            failure,
            existing: None,
        }
    }
}

impl<T: Debug> Debug for Rejected<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("kind", &self.failure.kind)
            .field("existing", &self.existing)
            .finish_non_exhaustive()
    }
}

impl<T> Display for Rejected<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.failure.kind, f)
    }
}

impl<T> From<Rejected<'_, T>> for Error {
    fn from(rejected: Rejected<'_, T>) -> Self {
        rejected.failure.kind
    }
}
