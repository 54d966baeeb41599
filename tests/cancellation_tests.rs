// tests/cancellation_tests.rs

use std::time::{Duration, Instant};

use jqg::{
    Builder, Context, ContextError, Driver, Lexer, ParseError, ParseOptions, Token, TokenStream,
    parse_with,
};

const LONG_QUERY: &str = ".a.b.c.d.e.f.g.h | .[1:2], .[] | .x?";

// ============================================================================
// Threaded Lexer
// ============================================================================

#[test]
fn test_cancel_before_first_advance() {
    let (ctx, cancel) = Context::with_cancel();
    let mut iter = Lexer::new().spawn(&ctx, LONG_QUERY).unwrap();
    cancel.cancel();

    assert!(!iter.advance(&ctx));
    assert!(iter.current().is_none());
}

#[test]
fn test_cancel_mid_lex() {
    let (ctx, cancel) = Context::with_cancel();
    let mut iter = Lexer::new().spawn(&ctx, LONG_QUERY).unwrap();

    assert!(iter.advance(&ctx));
    assert!(iter.advance(&ctx));
    assert_eq!(iter.current().map(|i| &i.token), Some(&Token::String("a".to_string())));

    cancel.cancel();
    for _ in 0..8 {
        assert!(!iter.advance(&ctx));
    }
    assert_eq!(ctx.err(), Some(ContextError::Canceled));
}

#[test]
fn test_producer_closes_stream_after_cancel() {
    let (ctx, cancel) = Context::with_cancel();
    let mut iter = Lexer::new().spawn(&ctx, LONG_QUERY).unwrap();
    assert!(iter.advance(&ctx));
    cancel.cancel();

    // Keep pulling with a context that is never done: the lexer still sees
    // its own cancellation and closes the channel after at most one handoff.
    let observer = Context::background();
    let mut extra = 0;
    while iter.advance(&observer) {
        extra += 1;
        assert!(extra <= 1, "lexer kept producing after cancel");
    }
}

#[test]
fn test_deadline_exceeded() {
    let (ctx, _cancel) = Context::with_deadline(Instant::now());
    let mut iter = Lexer::new().spawn(&ctx, ".foo").unwrap();

    assert!(!iter.advance(&ctx));
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
}

#[test]
fn test_cancelling_twice_is_harmless() {
    let (ctx, cancel) = Context::with_cancel();
    cancel.cancel();
    cancel.cancel();
    assert!(ctx.is_done());
    assert_eq!(ctx.err(), Some(ContextError::Canceled));
}

#[test]
fn test_derived_iterator_stops_on_cancel() {
    let (ctx, cancel) = Context::with_cancel();
    let mut iter = Lexer::new().spawn(&ctx, LONG_QUERY).unwrap();
    let first: Vec<Token> = iter.by_ref().take(3).map(|i| i.token).collect();
    assert_eq!(first.len(), 3);

    cancel.cancel();
    assert_eq!(iter.next(), None);
}

// ============================================================================
// Inline Lexer
// ============================================================================

#[test]
fn test_inline_cancel_mid_lex() {
    let (ctx, cancel) = Context::with_cancel();
    let mut iter = Lexer::new().pull(&ctx, LONG_QUERY);

    assert!(iter.advance(&ctx));
    cancel.cancel();
    for _ in 0..8 {
        assert!(!iter.advance(&ctx));
    }
}

#[test]
fn test_inline_deadline_exceeded() {
    let (ctx, _cancel) = Context::with_timeout(Duration::ZERO);
    let mut iter = Lexer::new().pull(&ctx, ".foo");
    assert!(!iter.advance(&ctx));
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_reports_cancellation() {
    for driver in [Driver::Thread, Driver::Inline] {
        let (ctx, cancel) = Context::with_cancel();
        cancel.cancel();
        let builder = Builder::with_options(ParseOptions::default().driver(driver));
        let err = builder.run(&ctx, LONG_QUERY).unwrap_err();
        assert!(
            matches!(err, ParseError::Context(ContextError::Canceled)),
            "Failed for driver: {:?}: {:?}",
            driver,
            err
        );
    }
}

#[test]
fn test_parse_with_zero_timeout() {
    for driver in [Driver::Thread, Driver::Inline] {
        let options = ParseOptions::default()
            .driver(driver)
            .timeout(Duration::ZERO);
        let err = parse_with(LONG_QUERY, &options).unwrap_err();
        assert!(
            matches!(err, ParseError::Context(ContextError::DeadlineExceeded)),
            "Failed for driver: {:?}: {:?}",
            driver,
            err
        );
        assert_eq!(err.to_string(), "context deadline exceeded");
    }
}

#[test]
fn test_parse_with_generous_timeout() {
    let options = ParseOptions::default().timeout(Duration::from_secs(30));
    let ast = parse_with(LONG_QUERY, &options).unwrap();
    assert_eq!(ast.len(), 1);
}
