use chat_digest::setup_logging;

#[test]
fn test_logging_setup() {
    let result = std::panic::catch_unwind(|| {
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}

#[test]
fn test_logging_setup_twice() {
    // A second call must leave the first subscriber alone rather than panic.
    setup_logging();
    setup_logging();
}
