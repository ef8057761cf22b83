//! Integration tests for rolling sequences back on demand.

use runner_core::mocks::{Journal, MockCommand};
use runner_core::{Command, CommandError, Context, Rollback, RollbackFailures, SequenceBuilder};
use runner_printer::{Level, StdPrinter};

#[test]
fn rollback_of_empty_sequence_keeps_existing_error_and_prints_nothing() {
    let (printer, out) = StdPrinter::capture(Level::All);
    let ctx = Context::new(0);
    let seq = SequenceBuilder::new().build();
    let err = CommandError::msg("foobar");

    seq.run(&ctx, &printer).expect("empty run succeeds");
    out.clear();
    ctx.set_err(err.clone());
    seq.rollback(&ctx, &printer).expect("rollback succeeds");

    assert_eq!(ctx.err(), Some(err));
    assert!(out.is_empty());
}

#[test]
fn rollback_of_never_run_sequence_is_a_silent_no_op() {
    let journal = Journal::new();
    let (printer, out) = StdPrinter::capture(Level::All);
    let ctx = Context::new(2);
    let err = CommandError::msg("external failure");
    ctx.set_err(err.clone());
    let seq = SequenceBuilder::new()
        .then(MockCommand::new("A").with_journal(&journal))
        .then(MockCommand::new("B").with_journal(&journal))
        .build();

    seq.rollback(&ctx, &printer).expect("rollback succeeds");

    assert_eq!(ctx.err(), Some(err));
    assert!(journal.entries().is_empty());
    assert!(out.is_empty());
}

#[test]
fn rollback_after_success_unwinds_everything_in_reverse() {
    let journal = Journal::new();
    let a = MockCommand::new("A").with_journal(&journal);
    let b = MockCommand::new("B").with_journal(&journal);
    let c = MockCommand::new("C").with_journal(&journal);
    let handles = [a.handle(), b.handle(), c.handle()];
    let printer = StdPrinter::capture(Level::Off).0;
    let ctx = Context::new(3);
    let seq = SequenceBuilder::new().then(a).then(b).then(c).build();

    seq.run(&ctx, &printer).expect("run succeeds");
    seq.rollback(&ctx, &printer).expect("rollback succeeds");

    assert!(ctx.err().is_none());
    for handle in &handles {
        assert!(handle.ran());
        assert!(!handle.failed());
        assert!(handle.rolled_back());
    }
    assert_eq!(
        journal.entries(),
        vec![
            "run A",
            "run B",
            "run C",
            "rollback C",
            "rollback B",
            "rollback A"
        ]
    );
}

#[test]
fn second_rollback_is_a_no_op() {
    let journal = Journal::new();
    let printer = StdPrinter::capture(Level::Off).0;
    let ctx = Context::new(1);
    let seq = SequenceBuilder::new()
        .then(MockCommand::new("A").with_journal(&journal))
        .build();

    seq.run(&ctx, &printer).expect("run succeeds");
    seq.rollback(&ctx, &printer).expect("first rollback succeeds");
    seq.rollback(&ctx, &printer).expect("second rollback succeeds");

    assert_eq!(journal.entries(), vec!["run A", "rollback A"]);
}

#[test]
fn failed_run_is_not_unwound_twice() {
    let journal = Journal::new();
    let printer = StdPrinter::capture(Level::Off).0;
    let ctx = Context::new(2);
    let seq = SequenceBuilder::new()
        .then(MockCommand::new("A").with_journal(&journal))
        .then(
            MockCommand::new("B")
                .with_journal(&journal)
                .fails_with(CommandError::msg("boom")),
        )
        .build();

    let _ = seq.run(&ctx, &printer);
    seq.rollback(&ctx, &printer).expect("nothing left to roll back");

    assert_eq!(journal.entries(), vec!["run A", "run B", "rollback A"]);
}

#[test]
fn rollback_failures_are_collected_and_unwinding_continues() {
    let journal = Journal::new();
    let (printer, out) = StdPrinter::capture(Level::Warn);
    let ctx = Context::new(3);
    let seq = SequenceBuilder::new()
        .then(
            MockCommand::new("A")
                .with_journal(&journal)
                .rollback_fails_with(CommandError::msg("a stuck")),
        )
        .then(MockCommand::new("B").with_journal(&journal))
        .then(
            MockCommand::new("C")
                .with_journal(&journal)
                .rollback_fails_with(CommandError::msg("c stuck")),
        )
        .build();
    seq.run(&ctx, &printer).expect("run succeeds");

    let err = seq.rollback(&ctx, &printer).expect_err("rollback fails");

    assert!(ctx.err().is_none());
    let failures = err
        .downcast_ref::<RollbackFailures>()
        .expect("rollback failures");
    assert_eq!(failures.commands(), vec!["C", "A"]);
    assert_eq!(
        journal.entries(),
        vec![
            "run A",
            "run B",
            "run C",
            "rollback C",
            "rollback B",
            "rollback A"
        ]
    );
    assert_eq!(
        out.lines(),
        vec![
            "rollback of C failed: c stuck",
            "rollback of A failed: a stuck"
        ]
    );
}
