mod fixture;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use lrc_core::{Args, FieldError, ID_ARG, LrResource, ResourceRef, Value};

use fixture::{DemoFile, DemoUser, MqlDemoFile, MqlDemoUser, args, runtime};

fn file(resource: &ResourceRef) -> Arc<MqlDemoFile> {
    Value::Resource(resource.clone())
        .into_resource::<MqlDemoFile>()
        .expect("demo.file instance")
}

fn user(resource: &ResourceRef) -> Arc<MqlDemoUser> {
    Value::Resource(resource.clone())
        .into_resource::<MqlDemoUser>()
        .expect("demo.user instance")
}

#[test]
fn test_static_field_and_identity() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();

    assert_eq!(res.mql_resource().name(), "demo.file");
    assert_eq!(res.mql_resource().id(), "/etc/hosts");
    assert_eq!(file(&res).path().unwrap(), "/etc/hosts");
    assert_eq!(res.field("path").unwrap(), Value::from("/etc/hosts"));
    assert!(res.validate().is_ok());
}

#[test]
fn test_identity_override() {
    let runtime = runtime();
    let res = runtime
        .create_resource(
            "demo.file",
            args([
                ("path", Value::from("/etc/hosts")),
                (ID_ARG, Value::from("hosts")),
            ]),
        )
        .unwrap();
    assert_eq!(res.mql_resource().id(), "hosts");
}

#[test]
fn test_identity_override_must_be_string() {
    let runtime = runtime();
    let err = runtime
        .create_resource(
            "demo.file",
            args([("path", Value::from("/a")), (ID_ARG, Value::Int(1))]),
        )
        .err()
        .unwrap();
    assert!(matches!(err, FieldError::TypeMismatch { .. }));
}

#[test]
fn test_unknown_argument() {
    let runtime = runtime();
    let err = runtime
        .create_resource(
            "demo.file",
            args([("path", Value::from("/a")), ("colour", Value::from("red"))]),
        )
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "initialized \"demo.file\" with unknown argument \"colour\""
    );
}

#[test]
fn test_argument_type_mismatch() {
    let runtime = runtime();
    let err = runtime
        .create_resource("demo.file", args([("path", Value::Int(3))]))
        .err()
        .unwrap();
    match err {
        FieldError::TypeMismatch {
            resource,
            field,
            expected,
        } => {
            assert_eq!(resource, "demo.file");
            assert_eq!(field, "path");
            assert_eq!(expected, "string");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_null_argument_is_stored_unchecked() {
    let runtime = runtime();
    let res = runtime
        .create_resource(
            "demo.file",
            args([("path", Value::Null), (ID_ARG, Value::from("nowhere"))]),
        )
        .unwrap();
    assert!(res.validate().is_ok());
    assert!(matches!(
        file(&res).path().unwrap_err(),
        FieldError::CastFailed { .. }
    ));
}

#[test]
fn test_validate_reports_missing_static_field() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([(ID_ARG, Value::from("x"))]))
        .unwrap();
    assert!(matches!(
        res.validate().unwrap_err(),
        FieldError::NoValue { field, .. } if field == "path"
    ));
}

#[test]
fn test_missing_identity_source_fails_creation() {
    let runtime = runtime();
    let err = runtime.create_resource("demo.file", Args::new()).err().unwrap();
    assert!(matches!(err, FieldError::NoValue { .. }));
}

#[test]
fn test_computed_field_is_fetched_once() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let res = file(&res);
    let before = fixture::size_calls();

    assert_eq!(res.size().unwrap(), 10);
    assert_eq!(res.size().unwrap(), 10);
    assert_eq!(res.field("size").unwrap(), Value::Int(10));
    assert_eq!(fixture::size_calls() - before, 1);
}

#[test]
fn test_fetch_error_is_cached() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/root/denied"))]))
        .unwrap();
    let res = file(&res);
    let before = fixture::size_calls();

    assert_eq!(res.size().unwrap_err().to_string(), "permission denied");
    assert_eq!(res.size().unwrap_err().to_string(), "permission denied");
    assert_eq!(fixture::size_calls() - before, 1);
}

#[test]
fn test_not_ready_releases_claim() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/tmp/x"))]))
        .unwrap();
    let res = file(&res);

    fixture::set_size_ready(false);
    assert!(res.size().unwrap_err().is_not_ready());
    assert!(!res.mql_resource().cache().is_pending("size"));
    assert!(!res.mql_resource().cache().contains("size"));

    fixture::set_size_ready(true);
    assert_eq!(res.size().unwrap(), 6);
}

#[test]
fn test_dependent_field_waits_for_trigger() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let res = file(&res);

    res.register("perms").unwrap();
    assert!(res.perms().unwrap_err().is_not_ready());

    runtime.trigger(&*res, "path");
    assert_eq!(res.perms().unwrap(), "/etc/hosts:10");
}

#[test]
fn test_computing_dependency_triggers_watchers() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/a/b"))]))
        .unwrap();
    let res = file(&res);

    res.register("perms").unwrap();
    res.register("perms").unwrap();
    assert_eq!(res.size().unwrap(), 4);
    assert_eq!(res.perms().unwrap(), "/a/b:4");
}

#[test]
fn test_dependency_error_is_cached_on_dependent() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/denied"))]))
        .unwrap();
    let res = file(&res);

    res.register("perms").unwrap();
    runtime.trigger(&*res, "path");
    assert_eq!(res.perms().unwrap_err().to_string(), "permission denied");
}

#[test]
fn test_invalidate_cascades_to_watchers() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let res = file(&res);

    res.register("perms").unwrap();
    runtime.trigger(&*res, "path");
    assert!(res.perms().is_ok());
    let before = fixture::size_calls();

    runtime.invalidate(&*res, "size");
    assert!(!res.mql_resource().cache().contains("size"));
    assert!(res.perms().unwrap_err().is_not_ready());

    assert_eq!(res.size().unwrap(), 10);
    assert_eq!(fixture::size_calls() - before, 1);
    assert_eq!(res.perms().unwrap(), "/etc/hosts:10");
}

#[test]
fn test_create_resource_deduplicates_instances() {
    let runtime = runtime();
    let first = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let second = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let other = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/passwd"))]))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn test_dropped_instances_are_not_reused() {
    let runtime = runtime();
    let first = runtime
        .create_resource("demo.file", args([("path", Value::from("/etc/hosts"))]))
        .unwrap();
    let key = first.mql_resource().key();
    drop(first);
    assert!(runtime.lookup(&key).is_none());
}

#[test]
fn test_init_hook_rewrites_arguments() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.user", args([("login", Value::from("alice"))]))
        .unwrap();
    assert_eq!(user(&res).name().unwrap(), "alice");
    assert_eq!(res.mql_resource().id(), "alice");
}

#[test]
fn test_init_hook_returns_existing_instance() {
    let runtime = runtime();
    let first = runtime
        .create_resource("demo.user", args([("name", Value::from("bob"))]))
        .unwrap();
    let factory = runtime.registry().factory("demo.user").unwrap();
    let second = factory(&runtime, args([("login", Value::from("bob"))])).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_resource_typed_field() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.user", args([("name", Value::from("carol"))]))
        .unwrap();
    let home = user(&res).home().unwrap();
    assert_eq!(home.path().unwrap(), "/home/carol");

    let value = res.field("home").unwrap();
    assert!(value.conforms_to(&lrc_core::Type::resource("demo.file")));
    assert!(!value.conforms_to(&lrc_core::Type::resource("demo.user")));
}

#[test]
fn test_resource_typed_argument_is_checked() {
    let runtime = runtime();
    let home = runtime
        .create_resource("demo.file", args([("path", Value::from("/x"))]))
        .unwrap();
    let err = runtime
        .create_resource(
            "demo.user",
            args([("name", Value::from("dave")), ("home", Value::from("/x"))]),
        )
        .err()
        .unwrap();
    assert!(matches!(err, FieldError::TypeMismatch { .. }));

    let res = runtime
        .create_resource(
            "demo.user",
            args([("name", Value::from("erin")), ("home", Value::Resource(home))]),
        )
        .unwrap();
    assert_eq!(user(&res).home().unwrap().path().unwrap(), "/x");
}

#[test]
fn test_unknown_field_dispatch() {
    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/a"))]))
        .unwrap();
    for result in [
        res.field("owner").map(|_| ()),
        res.compute("owner"),
        res.register("owner"),
    ] {
        assert!(matches!(
            result.unwrap_err(),
            FieldError::FieldNotFound { field, .. } if field == "owner"
        ));
    }
}

#[test]
fn test_concurrent_readers_share_one_computation() {
    const READERS: usize = 8;

    let runtime = runtime();
    let res = runtime
        .create_resource("demo.file", args([("path", Value::from("/tmp/slow"))]))
        .unwrap();
    let res = file(&res);
    let returned = AtomicUsize::new(0);

    let results: Vec<Result<i64, FieldError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                scope.spawn(|| {
                    let result = res.size();
                    returned.fetch_add(1, Ordering::SeqCst);
                    result
                })
            })
            .collect();

        // Every reader but the one holding the claim returns without blocking.
        let deadline = Instant::now() + Duration::from_secs(10);
        while returned.load(Ordering::SeqCst) < READERS - 1 || fixture::slow_fetches() == 0 {
            assert!(Instant::now() < deadline, "readers blocked on an in-flight field");
            thread::yield_now();
        }
        fixture::release_slow_fetches();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(fixture::slow_fetches(), 1);
    let values: Vec<i64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(values, [9]);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(FieldError::is_not_ready)
    );
    assert_eq!(res.size().unwrap(), 9);
    assert_eq!(fixture::slow_fetches(), 1);
}
