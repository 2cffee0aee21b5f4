//! The catchable exception value.

use std::fmt;

use crate::Object;

/// A raised exception: the payload object plus its chain.
///
/// `cause` is set by `raise X from Y`; `context` records the exception that
/// was being handled when this one was raised.
#[derive(Clone)]
pub struct BaseException {
    payload: Object,
    cause: Option<Box<BaseException>>,
    context: Option<Box<BaseException>>,
}

impl BaseException {
    pub fn new(payload: Object) -> Self {
        BaseException {
            payload,
            cause: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: BaseException) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: BaseException) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// The exception produced when `later` is raised while `earlier` is still
    /// pending: `later`'s payload, chained with `later` as cause and
    /// `earlier` as context.
    pub fn superseding(later: BaseException, earlier: BaseException) -> Self {
        BaseException {
            payload: later.payload.clone(),
            cause: Some(Box::new(later)),
            context: Some(Box::new(earlier)),
        }
    }

    #[inline]
    pub fn payload(&self) -> &Object {
        &self.payload
    }

    pub fn cause(&self) -> Option<&BaseException> {
        self.cause.as_deref()
    }

    pub fn context(&self) -> Option<&BaseException> {
        self.context.as_deref()
    }

    /// The class of the raised value.
    ///
    /// A type raised directly (`raise StopIteration`) is its own class.
    pub fn class(&self) -> Option<Object> {
        if self.payload.is_type() {
            Some(self.payload.clone())
        } else {
            self.payload.class()
        }
    }

    /// Whether this exception is an instance of `class` (MRO membership).
    pub fn matches(&self, class: &Object) -> bool {
        self.class().is_some_and(|own| own.is_subclass(class))
    }

    /// Name of the exception class, e.g. `"TypeError"`.
    pub fn type_name(&self) -> String {
        self.class()
            .and_then(|class| class.name())
            .unwrap_or_else(|| "BaseException".to_owned())
    }

    /// The rendered message (`str(exc)`).
    pub fn message(&self) -> String {
        if self.payload.is_type() {
            String::new()
        } else {
            self.payload.display_string()
        }
    }
}

impl fmt::Display for BaseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message();
        if message.is_empty() {
            f.write_str(&self.type_name())
        } else {
            write!(f, "{}: {message}", self.type_name())
        }
    }
}

impl fmt::Debug for BaseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseException")
            .field("type", &self.type_name())
            .field("message", &self.message())
            .field("cause", &self.cause)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests;
