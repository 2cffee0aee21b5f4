use pretty_assertions::assert_eq;

use super::*;
use crate::{Builtins, ExceptionKind};

#[test]
fn test_superseding_chains_cause_and_context() {
    let builtins = Builtins::new(true);
    let earlier = builtins.new_exception(ExceptionKind::TypeError, "first");
    let later = builtins.new_exception(ExceptionKind::NameError, "second");

    let chained = BaseException::superseding(later.clone(), earlier.clone());

    assert!(chained.payload().is(later.payload()));
    assert!(chained.cause().is_some_and(|cause| cause.payload().is(later.payload())));
    assert!(chained
        .context()
        .is_some_and(|context| context.payload().is(earlier.payload())));
    assert_eq!(chained.type_name(), "NameError");
}

#[test]
fn test_matches_walks_mro() {
    let builtins = Builtins::new(true);
    let exception = builtins.new_exception(ExceptionKind::ModuleNotFoundError, "no module");
    assert!(exception.matches(builtins.exception_class(ExceptionKind::ImportError)));
    assert!(exception.matches(builtins.exception_class(ExceptionKind::Exception)));
    assert!(!exception.matches(builtins.exception_class(ExceptionKind::TypeError)));
}

#[test]
fn test_raised_type_is_its_own_class() {
    let builtins = Builtins::new(true);
    let class = builtins.exception_class(ExceptionKind::StopIteration).clone();
    let exception = BaseException::new(class.clone());
    assert!(exception.class().is_some_and(|own| own.is(&class)));
    assert_eq!(exception.to_string(), "StopIteration");
}

#[test]
fn test_with_cause_and_context() {
    let builtins = Builtins::new(true);
    let cause = builtins.new_exception(ExceptionKind::RuntimeError, "cause");
    let context = builtins.new_exception(ExceptionKind::RuntimeError, "context");
    let exception = builtins
        .new_exception(ExceptionKind::TypeError, "outer")
        .with_cause(cause)
        .with_context(context);
    assert_eq!(exception.cause().map(BaseException::message), Some("cause".to_owned()));
    assert_eq!(
        exception.context().map(BaseException::message),
        Some("context".to_owned())
    );
}
