use super::datum::{Datum, OPTION_WRAPPER};

/// Recognizes and opens an optional-value wrapper returned by a getter.
///
/// Strategies are consulted in registration order; the first one whose
/// [`supports`](Self::supports) holds decides whether the value is present.
pub trait WrapperStrategy: Send + Sync {
    fn supports(&self, datum: &Datum<'_>) -> bool;

    fn is_present(&self, datum: &Datum<'_>) -> bool;

    /// The wrapped value, or `None` when the wrapper is empty.
    fn unwrap<'a>(&self, datum: Datum<'a>) -> Option<Datum<'a>>;
}

/// Opens `Option<T>` property values.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionWrapperStrategy;

impl WrapperStrategy for OptionWrapperStrategy {
    fn supports(&self, datum: &Datum<'_>) -> bool {
        matches!(datum, Datum::Wrapped { wrapper, .. } if *wrapper == OPTION_WRAPPER)
    }

    fn is_present(&self, datum: &Datum<'_>) -> bool {
        matches!(datum, Datum::Wrapped { inner: Some(_), .. })
    }

    fn unwrap<'a>(&self, datum: Datum<'a>) -> Option<Datum<'a>> {
        match datum {
            Datum::Wrapped { inner, .. } => inner.map(|inner| *inner),
            _ => None,
        }
    }
}
