//! Integration tests for the IrrigationController: telemetry in, valve
//! commands and journal rows out.

use irrigator::app::commands::ControlCommand;
use irrigator::app::events::{AppEvent, Origin};
use irrigator::app::service::{CommandOutcome, IrrigationController, TickOutcome};
use irrigator::control::{Polarity, PolicyEvent, Thresholds, ValvePosition};

use crate::mock_hw::{FixedClock, MemoryJournal, RecordingSink, ScriptedChannel, Step};

fn make_controller() -> (IrrigationController, MemoryJournal, RecordingSink) {
    let thresholds = Thresholds::new(900, 600, Polarity::HighIsDry).unwrap();
    let mut controller = IrrigationController::new(thresholds, FixedClock::default());
    let mut sink = RecordingSink::new();
    controller.start(&mut sink);
    (controller, MemoryJournal::new(), sink)
}

fn tick_n(
    controller: &mut IrrigationController,
    channel: &mut ScriptedChannel,
    journal: &MemoryJournal,
    sink: &mut RecordingSink,
    n: usize,
) -> Vec<TickOutcome> {
    (0..n)
        .map(|_| controller.tick(channel, journal, sink))
        .collect()
}

// ── Automatic control ─────────────────────────────────────────

#[test]
fn dry_then_wet_cycle_opens_and_closes_once() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[500, 950, 700, 550]);

    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 4);

    assert_eq!(journal.valves(), ["OFF", "ON", "ON", "OFF"]);
    assert_eq!(channel.sent(), ["VALVULA ON", "VALVULA OFF"]);
    assert_eq!(
        journal.observations(),
        [
            "auto: reading normal",
            "auto: valve activated, soil dry",
            "auto: reading normal",
            "auto: valve deactivated, soil wet",
        ]
    );
    let moistures: Vec<_> = journal.rows.borrow().iter().map(|r| r.moisture_raw).collect();
    assert_eq!(moistures, [Some(500), Some(950), Some(700), Some(550)]);
    assert_eq!(ctl.valve(), ValvePosition::Off);
}

#[test]
fn dead_band_readings_never_command_the_device() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[600, 750, 900, 601, 899]);

    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 5);

    assert!(channel.sent().is_empty());
    assert_eq!(journal.len(), 5);
    assert!(journal.valves().iter().all(|v| *v == "OFF"));
}

#[test]
fn non_telemetry_lines_are_skipped_without_a_record() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::lines(&[
        "Sistema listo\r\n",
        "Humedad: abc | Válvula: ON\r\n",
        "Humedad: 512 | Válvula: MAYBE\r\n",
    ]);

    let outcomes = tick_n(&mut ctl, &mut channel, &journal, &mut sink, 3);

    assert!(outcomes.iter().all(|o| *o == TickOutcome::Skipped));
    assert_eq!(journal.len(), 0);
    assert!(channel.sent().is_empty());
    assert_eq!(ctl.last_moisture(), None);
}

#[test]
fn timeout_is_idle_and_read_error_is_reported() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::new([Step::Timeout, Step::ReadError]);

    let outcomes = tick_n(&mut ctl, &mut channel, &journal, &mut sink, 2);

    assert_eq!(outcomes, [TickOutcome::Idle, TickOutcome::ReadFailed]);
    assert_eq!(journal.len(), 0);
    assert_eq!(ctl.tick_count(), 2);
}

#[test]
fn device_reported_valve_does_not_override_controller_state() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::lines(&["Humedad: 700 | Válvula: ON\r\n"]);

    let outcome = ctl.tick(&mut channel, &journal, &mut sink);

    let TickOutcome::Recorded(decision) = outcome else {
        panic!("expected a recorded tick, got {outcome:?}");
    };
    assert_eq!(decision.event, PolicyEvent::Normal);
    assert_eq!(ctl.valve(), ValvePosition::Off);
    assert_eq!(journal.valves(), ["OFF"]);
}

#[test]
fn moisture_only_frames_are_evaluated() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::lines(&["Humedad: 990\n"]);

    ctl.tick(&mut channel, &journal, &mut sink);

    assert_eq!(ctl.valve(), ValvePosition::On);
    assert_eq!(channel.sent(), ["VALVULA ON"]);
}

#[test]
fn transition_emits_reading_then_valve_event() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[950]);

    ctl.tick(&mut channel, &journal, &mut sink);

    assert_eq!(sink.events[0], AppEvent::Started(ValvePosition::Off));
    assert!(matches!(
        sink.events[1],
        AppEvent::Reading {
            moisture_raw: 950,
            ..
        }
    ));
    assert_eq!(
        sink.events[2],
        AppEvent::ValveCommanded {
            from: ValvePosition::Off,
            to: ValvePosition::On,
            origin: Origin::Auto,
        }
    );
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn failed_send_leaves_state_and_journals_the_failure() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[950, 960]).failing_sends();

    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 2);

    assert_eq!(ctl.valve(), ValvePosition::Off);
    assert_eq!(journal.valves(), ["OFF", "OFF"]);
    assert_eq!(
        journal.observations(),
        [
            "auto: VALVULA ON command failed",
            "auto: VALVULA ON command failed"
        ]
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ActuationFailed { .. })),
        2
    );
}

#[test]
fn journal_failure_does_not_stop_control() {
    let (mut ctl, journal, mut sink) = make_controller();
    journal.fail_appends.set(true);
    let mut channel = ScriptedChannel::readings(&[950, 500]);

    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 2);

    assert_eq!(channel.sent(), ["VALVULA ON", "VALVULA OFF"]);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::JournalFailed(_))), 2);
    assert_eq!(journal.len(), 0);
}

// ── Manual commands ───────────────────────────────────────────

#[test]
fn manual_on_while_on_resends_and_records() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[950]);
    ctl.tick(&mut channel, &journal, &mut sink);

    let outcome = ctl.handle_command(
        ControlCommand::SetValve(ValvePosition::On),
        &mut channel,
        &journal,
        &mut sink,
    );

    assert_eq!(outcome, CommandOutcome::Continue);
    assert_eq!(channel.sent(), ["VALVULA ON", "VALVULA ON"]);
    assert_eq!(ctl.valve(), ValvePosition::On);
    let last = journal.rows.borrow().last().cloned().unwrap();
    assert_eq!(last.observations, "manual: valve ON");
    assert_eq!(last.moisture_raw, Some(950));
    assert_eq!(last.valve, ValvePosition::On);
}

#[test]
fn manual_override_before_any_reading_has_no_moisture() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::empty();

    ctl.handle_command(
        ControlCommand::SetValve(ValvePosition::On),
        &mut channel,
        &journal,
        &mut sink,
    );

    let rows = journal.rows.borrow();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].moisture_raw, None);
    assert_eq!(rows[0].valve, ValvePosition::On);
}

#[test]
fn manual_override_is_then_subject_to_hysteresis() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[700, 550]);

    ctl.handle_command(
        ControlCommand::SetValve(ValvePosition::On),
        &mut channel,
        &journal,
        &mut sink,
    );
    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 2);

    assert_eq!(journal.valves(), ["ON", "ON", "OFF"]);
    assert_eq!(channel.sent(), ["VALVULA ON", "VALVULA OFF"]);
}

#[test]
fn failed_manual_send_keeps_previous_state() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::empty().failing_sends();

    ctl.handle_command(
        ControlCommand::SetValve(ValvePosition::On),
        &mut channel,
        &journal,
        &mut sink,
    );

    assert_eq!(ctl.valve(), ValvePosition::Off);
    assert_eq!(journal.observations(), ["manual: VALVULA ON command failed"]);
}

// ── Visual state ──────────────────────────────────────────────

#[test]
fn amend_on_empty_journal_is_a_no_op() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::empty();

    ctl.handle_command(
        ControlCommand::AmendVisualState("sana".into()),
        &mut channel,
        &journal,
        &mut sink,
    );

    assert_eq!(journal.len(), 0);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::VisualStateAmended {
            label: "sana".into(),
            amended: false
        })
    );
}

#[test]
fn amend_labels_only_the_latest_row() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::readings(&[500, 510]);
    tick_n(&mut ctl, &mut channel, &journal, &mut sink, 2);

    ctl.handle_command(
        ControlCommand::AmendVisualState("seca".into()),
        &mut channel,
        &journal,
        &mut sink,
    );

    let labels: Vec<_> = journal
        .rows
        .borrow()
        .iter()
        .map(|r| r.visual_state.clone())
        .collect();
    assert_eq!(labels, [None, Some("seca".to_string())]);
}

#[test]
fn shutdown_command_asks_loop_to_stop() {
    let (mut ctl, journal, mut sink) = make_controller();
    let mut channel = ScriptedChannel::empty();
    assert_eq!(
        ctl.handle_command(ControlCommand::Shutdown, &mut channel, &journal, &mut sink),
        CommandOutcome::Shutdown
    );
    assert_eq!(journal.len(), 0);
}
