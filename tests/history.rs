use proptest::prelude::*;
use raster_paint::command::{ColorEffect, CommandContext, CommandError, EffectCommand, HistoryLimits};
use raster_paint::event::{EditorEvent, EventLog, HistoryEvent};
use raster_paint::{Color, CommandHistory, Document};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn clear(level: u8) -> EffectCommand {
    EffectCommand::new(ColorEffect::Clear(Color::rgb(level, level, level)), false)
}

fn count_limits(limit: usize) -> HistoryLimits {
    HistoryLimits {
        undo_min_limit: 1,
        undo_max_limit: limit,
        undo_max_limit_size_bytes: usize::MAX,
    }
}

proptest! {
    #[test]
    fn undo_stack_never_exceeds_limit(limit in 1usize..12, pushes in 0usize..40) {
        let mut doc = Document::new(2, 2, Color::WHITE).unwrap();
        let mut history = CommandHistory::with_limits(count_limits(limit));

        for i in 0..pushes {
            history.execute(clear(i as u8), &mut doc).unwrap();
            prop_assert!(history.undo_count() <= limit);
        }
        prop_assert_eq!(history.undo_count(), pushes.min(limit));

        // The retained commands are the most recent ones.
        let retained = history.undo_count();
        let undone = history.undo_times(retained, &mut CommandContext::new(&mut doc));
        prop_assert_eq!(undone, retained);
        let expected = if retained == pushes {
            Color::WHITE
        } else {
            let level = (pushes - retained - 1) as u8;
            Color::rgb(level, level, level)
        };
        prop_assert_eq!(doc.buffer().pixel(0, 0), Some(expected));
    }

    #[test]
    fn redo_is_empty_after_new_command(pushes in 1usize..10, undos in 1usize..10) {
        let mut doc = Document::new(2, 2, Color::WHITE).unwrap();
        let mut history = CommandHistory::new();
        for i in 0..pushes {
            history.execute(clear(i as u8), &mut doc).unwrap();
        }
        history.undo_times(undos, &mut CommandContext::new(&mut doc));
        history.execute(clear(200), &mut doc).unwrap();
        prop_assert_eq!(history.redo_count(), 0);
        prop_assert!(!history.can_redo());
    }
}

#[test]
fn undo_and_redo_walk_the_stacks() {
    init();
    let mut doc = Document::new(4, 4, Color::WHITE).unwrap();
    let mut history = CommandHistory::new();
    for level in [10, 20, 30] {
        history.execute(clear(level), &mut doc).unwrap();
    }
    assert_eq!(history.undo_names(), vec!["Clear", "Clear", "Clear"]);

    let mut ctx = CommandContext::new(&mut doc);
    assert_eq!(history.undo_times(2, &mut ctx), 2);
    assert_eq!(ctx.document.buffer().pixel(0, 0), Some(Color::rgb(10, 10, 10)));
    assert_eq!(history.redo_times(5, &mut ctx), 2);
    assert_eq!(ctx.document.buffer().pixel(0, 0), Some(Color::rgb(30, 30, 30)));
    assert!(matches!(history.redo(&mut ctx), Err(CommandError::NothingToRedo)));
}

#[test]
fn history_changes_are_announced() {
    init();
    let mut doc = Document::new(2, 2, Color::WHITE).unwrap();
    let log = EventLog::new();
    doc.event_bus().subscribe(Box::new(log.clone()));
    let mut history = CommandHistory::new();

    history.execute(EffectCommand::new(ColorEffect::Grayscale, false), &mut doc).unwrap();
    history.undo(&mut CommandContext::new(&mut doc)).unwrap();

    let history_events: Vec<_> = log
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::History(HistoryEvent::Changed { undo_name, redo_name }) => Some((undo_name, redo_name)),
            _ => None,
        })
        .collect();
    assert_eq!(
        history_events,
        vec![
            (Some("Reduce to Grayscale".to_owned()), None),
            (None, Some("Reduce to Grayscale".to_owned())),
        ]
    );
}

#[test]
fn memory_usage_tracks_held_snapshots() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    let mut history = CommandHistory::new();
    history.execute(clear(1), &mut doc).unwrap();
    history.execute(clear(2), &mut doc).unwrap();
    history.undo(&mut CommandContext::new(&mut doc)).unwrap();

    // The undone command released its snapshot; only the first one still holds pixels.
    assert_eq!(history.memory_usage(), 100 * std::mem::size_of::<Color>());
    history.clear(&mut doc);
    assert_eq!(history.memory_usage(), 0);
    assert!(!history.can_undo());
}
