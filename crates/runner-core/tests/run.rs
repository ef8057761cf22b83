//! Integration tests for running sequences forward and rolling back on failure.

use runner_core::mocks::{Journal, MockCommand, MockHandle};
use runner_core::{Command, CommandError, Context, Sequence, SequenceBuilder};
use runner_printer::{Level, StdPrinter};

fn quiet() -> StdPrinter {
    StdPrinter::capture(Level::Off).0
}

fn mocks(names: &[&str], journal: &Journal) -> (Vec<MockCommand>, Vec<MockHandle>) {
    let commands: Vec<MockCommand> = names
        .iter()
        .map(|name| MockCommand::new(*name).with_journal(journal))
        .collect();
    let handles = commands.iter().map(MockCommand::handle).collect();
    (commands, handles)
}

fn boxed(commands: Vec<MockCommand>) -> Vec<Box<dyn Command>> {
    commands
        .into_iter()
        .map(|command| Box::new(command) as Box<dyn Command>)
        .collect()
}

#[test]
fn empty_sequence_is_silent_success() {
    let (printer, out) = StdPrinter::capture(Level::All);
    let ctx = Context::new(0);
    let seq = Sequence::empty();

    let result = seq.run(&ctx, &printer);

    assert!(result.is_ok());
    assert!(ctx.err().is_none());
    assert!(out.is_empty());
}

#[test]
fn all_commands_succeed() {
    let journal = Journal::new();
    let (commands, handles) = mocks(&["A", "B", "C"], &journal);
    let ctx = Context::new(3);
    let seq = Sequence::new(boxed(commands));

    seq.run(&ctx, &quiet()).expect("run succeeds");

    assert!(ctx.err().is_none());
    for handle in &handles {
        assert!(handle.ran());
        assert!(!handle.failed());
        assert!(!handle.rolled_back());
    }
    assert_eq!(journal.entries(), vec!["run A", "run B", "run C"]);
}

#[test]
fn failure_rolls_back_earlier_commands_and_skips_later_ones() {
    let journal = Journal::new();
    let err = CommandError::msg("foobar");

    let a = MockCommand::new("A").with_journal(&journal);
    let b = MockCommand::new("B").with_journal(&journal);
    let c = MockCommand::new("C")
        .with_journal(&journal)
        .fails_with(err.clone());
    let d = MockCommand::new("D").with_journal(&journal);
    let (ha, hb, hc, hd) = (a.handle(), b.handle(), c.handle(), d.handle());

    let ctx = Context::new(3);
    let seq = SequenceBuilder::new().then(a).then(b).then(c).then(d).build();

    let result = seq.run(&ctx, &quiet());

    assert_eq!(ctx.err(), Some(err.clone()));
    assert_eq!(result, Err(err));
    assert!(ha.ran());
    assert!(ha.rolled_back());
    assert!(hb.ran());
    assert!(hb.rolled_back());
    assert!(hc.ran());
    assert!(hc.failed());
    assert!(!hc.rolled_back());
    assert!(!hd.ran());
    assert_eq!(
        journal.entries(),
        vec!["run A", "run B", "run C", "rollback B", "rollback A"]
    );
}

#[test]
fn failure_at_each_position_unwinds_exactly_the_prefix() {
    let names = ["A", "B", "C", "D", "E"];

    for failing in 0..names.len() {
        let journal = Journal::new();
        let err = CommandError::msg(format!("{} broke", names[failing]));
        let commands: Vec<MockCommand> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let command = MockCommand::new(*name).with_journal(&journal);
                if index == failing {
                    command.fails_with(err.clone())
                } else {
                    command
                }
            })
            .collect();
        let handles: Vec<MockHandle> = commands.iter().map(MockCommand::handle).collect();
        let ctx = Context::new(names.len());

        let _ = Sequence::new(boxed(commands)).run(&ctx, &quiet());

        assert_eq!(ctx.err(), Some(err), "failing at {failing}");
        for (index, handle) in handles.iter().enumerate() {
            assert_eq!(handle.ran(), index <= failing, "ran {index}");
            assert_eq!(handle.failed(), index == failing, "failed {index}");
            assert_eq!(handle.rolled_back(), index < failing, "rolled back {index}");
        }
        let rollbacks: Vec<String> = journal
            .entries()
            .into_iter()
            .filter(|entry| entry.starts_with("rollback"))
            .collect();
        let expected: Vec<String> = names[..failing]
            .iter()
            .rev()
            .map(|name| format!("rollback {name}"))
            .collect();
        assert_eq!(rollbacks, expected, "failing at {failing}");
    }
}

#[test]
fn rollback_failure_does_not_replace_run_error_or_stop_unwinding() {
    let journal = Journal::new();
    let run_err = CommandError::msg("run failed");

    let a = MockCommand::new("A").with_journal(&journal);
    let b = MockCommand::new("B")
        .with_journal(&journal)
        .rollback_fails_with(CommandError::msg("cannot undo B"));
    let c = MockCommand::new("C")
        .with_journal(&journal)
        .fails_with(run_err.clone());
    let (ha, hb) = (a.handle(), b.handle());
    let (printer, out) = StdPrinter::capture(Level::Error);
    let ctx = Context::new(3);
    let seq = SequenceBuilder::new().then(a).then(b).then(c).build();

    let result = seq.run(&ctx, &printer);

    assert_eq!(result, Err(run_err.clone()));
    assert_eq!(ctx.err(), Some(run_err));
    assert!(ha.rolled_back());
    assert!(!hb.rolled_back());
    assert_eq!(
        journal.entries(),
        vec!["run A", "run B", "run C", "rollback B", "rollback A"]
    );
    assert_eq!(out.lines(), vec!["rollback of B failed: cannot undo B"]);
}

#[test]
fn commands_without_rollback_are_skipped_during_unwind() {
    let journal = Journal::new();
    let a = MockCommand::new("A").with_journal(&journal);
    let b = MockCommand::new("B").with_journal(&journal).without_rollback();
    let c = MockCommand::new("C")
        .with_journal(&journal)
        .fails_with(CommandError::msg("boom"));
    let (printer, out) = StdPrinter::capture(Level::Info);
    let seq = SequenceBuilder::new().then(a).then(b).then(c).build();

    let _ = seq.run(&Context::new(3), &printer);

    assert_eq!(
        journal.entries(),
        vec!["run A", "run B", "run C", "rollback A"]
    );
    let runs: Vec<String> = out
        .lines()
        .into_iter()
        .filter(|line| line.starts_with("=== RUN"))
        .collect();
    assert_eq!(runs, vec!["=== RUN A", "=== RUN B", "=== RUN C", "=== RUN A"]);
}

#[test]
fn nested_failure_unwinds_inner_then_outer() {
    let journal = Journal::new();
    let inner = SequenceBuilder::new()
        .then(MockCommand::new("B1").with_journal(&journal))
        .then(
            MockCommand::new("B2")
                .with_journal(&journal)
                .fails_with(CommandError::msg("inner broke")),
        )
        .then(MockCommand::new("B3").with_journal(&journal))
        .build();
    let seq = SequenceBuilder::new()
        .then(MockCommand::new("A").with_journal(&journal))
        .then(inner)
        .then(MockCommand::new("C").with_journal(&journal))
        .build();
    let ctx = Context::new(seq.steps());

    let result = seq.run(&ctx, &quiet());

    assert_eq!(result.expect_err("run fails").to_string(), "inner broke");
    assert_eq!(
        journal.entries(),
        vec!["run A", "run B1", "run B2", "rollback B1", "rollback A"]
    );
}

#[test]
fn nested_success_is_unwound_when_a_later_sibling_fails() {
    let journal = Journal::new();
    let inner = SequenceBuilder::new()
        .then(MockCommand::new("B1").with_journal(&journal))
        .then(MockCommand::new("B2").with_journal(&journal))
        .build();
    let seq = SequenceBuilder::new()
        .then(MockCommand::new("A").with_journal(&journal))
        .then(inner)
        .then(
            MockCommand::new("C")
                .with_journal(&journal)
                .fails_with(CommandError::msg("late")),
        )
        .build();

    let _ = seq.run(&Context::new(seq.steps()), &quiet());

    assert_eq!(
        journal.entries(),
        vec![
            "run A",
            "run B1",
            "run B2",
            "run C",
            "rollback B2",
            "rollback B1",
            "rollback A"
        ]
    );
}

#[test]
fn nested_output_is_indented_under_its_parent() {
    let (printer, out) = StdPrinter::capture(Level::Info);
    let seq = SequenceBuilder::new()
        .group(|inner| inner.then(MockCommand::new("leaf")))
        .build();

    seq.run(&Context::new(1), &printer).expect("run succeeds");

    let lines = out.lines();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "=== RUN sequence of 1 command");
    assert_eq!(lines[1], "   === RUN leaf");
    assert!(lines[2].starts_with("   --- END leaf ("));
    assert!(lines[3].starts_with("--- END sequence of 1 command ("));
}

#[test]
fn nested_rollback_failures_are_reported_but_not_returned() {
    let inner = SequenceBuilder::new()
        .then(MockCommand::new("B").rollback_fails_with(CommandError::msg("stuck")))
        .build();
    let run_err = CommandError::msg("C failed");
    let seq = SequenceBuilder::new()
        .then(inner)
        .then(MockCommand::new("C").fails_with(run_err.clone()))
        .build();
    let (printer, out) = StdPrinter::capture(Level::Error);
    let ctx = Context::new(2);

    let result = seq.run(&ctx, &printer);

    assert_eq!(result, Err(run_err));
    let lines = out.lines();
    assert_eq!(lines[0], "   rollback of B failed: stuck");
    assert_eq!(
        lines[1],
        "rollback of sequence of 1 command failed: 1 rollback(s) failed"
    );
}
