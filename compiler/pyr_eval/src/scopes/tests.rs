use super::*;

#[test]
fn test_next_on_empty_stack_is_idle() {
    let mut scopes = Scopes::default();
    assert!(matches!(scopes.next(), Next::Idle));
    assert!(matches!(scopes.next(), Next::Idle));
    assert!(scopes.is_empty());
}

#[test]
fn test_next_pops_empty_frame_then_scope() {
    let mut scopes = Scopes::default();
    scopes.enter_scope(Scope::owned(Object::namespace()));
    assert!(scopes.enter().is_ok());
    assert!(matches!(scopes.next(), Next::FrameDone));
    assert!(matches!(scopes.next(), Next::ScopeDone));
    assert!(matches!(scopes.next(), Next::Idle));
}

#[test]
fn test_steps_pop_in_lifo_order() {
    let mut scopes = Scopes::default();
    scopes.enter_scope(Scope::owned(Object::namespace()));
    assert!(scopes.enter().is_ok());
    assert!(scopes.push(Step::Call(1)).is_ok());
    assert!(scopes.push(Step::Call(2)).is_ok());
    assert!(matches!(scopes.next(), Next::Step(Step::Call(2))));
    assert!(matches!(scopes.next(), Next::Step(Step::Call(1))));
}

#[test]
fn test_push_without_frame_is_fault() {
    let mut scopes = Scopes::default();
    assert_eq!(scopes.push(Step::Dup).err(), Some(Fault::NoActiveScope));
    scopes.enter_scope(Scope::owned(Object::namespace()));
    assert_eq!(scopes.push(Step::Dup).err(), Some(Fault::NoActiveFrame));
    assert_eq!(scopes.enter().err(), None);
}

#[test]
fn test_exit_is_pop_if_present() {
    let mut scopes = Scopes::default();
    scopes.exit();
    scopes.enter_scope(Scope::owned(Object::namespace()));
    scopes.exit();
    assert!(scopes.enter().is_ok());
    assert!(scopes.push(Step::Dup).is_ok());
    // A Frame with pending Steps is still discarded by an explicit exit.
    scopes.exit();
    assert_eq!(scopes.frame_count(), 0);
}

#[test]
fn test_function_scope_creates_namespace_lazily() {
    let mut scope = Scope::function(Arc::from([]), Arc::from("f"));
    let first = scope.self_object();
    let second = scope.self_object();
    assert!(first.is(&second));
    assert_eq!(scope.qualname(), Some("f"));
}

#[test]
fn test_shared_scope_reuses_namespaces() {
    let outer = Object::namespace();
    let mut scope = Scope::function(Arc::from([outer.clone()]), Arc::from("g"));
    let mut shared = scope.share();
    assert!(shared.self_object().is(&scope.self_object()));
    assert!(shared.outer()[0].is(&outer));
}
