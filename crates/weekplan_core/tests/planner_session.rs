use chrono::NaiveDate;
use weekplan_core::{
    CellState, DeleteDecision, DeleteOutcome, MemoryKvStore, PlannerSession, PlannerStore,
    SessionError, Slot, Task, TaskColor, TaskForm, TaskValidationError, GOAL_PLACEHOLDER,
};

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
}

fn session(kv: &MemoryKvStore) -> PlannerSession<&MemoryKvStore> {
    PlannerSession::new(PlannerStore::open(kv), wednesday())
}

fn slot(day: u8, hour: u8, minute: u8) -> Slot {
    Slot::new(day, hour, minute).unwrap()
}

#[test]
fn submit_adds_task_with_selected_color_and_clears_form() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    session.select_color(TaskColor::Lavender);
    session.select_slot(slot(1, 9, 0));
    *session.task_form_mut() = TaskForm::new("1", "standup");

    let id = session.submit_task().unwrap();

    let tasks = session.store().tasks(session.week());
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].color, TaskColor::Lavender);
    assert_eq!(session.task_form(), &TaskForm::default());
    assert_eq!(session.selected_slot(), None);
    assert_eq!(session.grid().cell(slot(1, 9, 30)), CellState::Hidden(0));
}

#[test]
fn missing_field_blocks_add_and_keeps_partial_input() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    session.select_slot(slot(2, 14, 30));
    *session.task_form_mut() = TaskForm::new("", "half typed");

    let err = session.submit_task().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(TaskValidationError::MissingFields)
    ));
    assert_eq!(err.to_string(), "Please fill in all fields.");
    assert_eq!(session.task_form().text, "half typed");
    assert_eq!(session.selected_slot(), Some(slot(2, 14, 30)));
    assert!(session.store().tasks(session.week()).is_empty());
}

#[test]
fn submit_without_slot_is_rejected() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    *session.task_form_mut() = TaskForm::new("1", "orphan");

    assert!(matches!(
        session.submit_task(),
        Err(SessionError::NoSlotSelected)
    ));
}

#[test]
fn cancelled_delete_keeps_task_and_confirmed_delete_removes_it() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    session.select_slot(slot(4, 18, 0));
    *session.task_form_mut() = TaskForm::new("1.5", "climbing");
    let id = session.submit_task().unwrap();

    let mut prompts = 0;
    let mut cancel = |_: &Task| {
        prompts += 1;
        DeleteDecision::Cancelled
    };
    assert_eq!(
        session.request_delete(id, &mut cancel).unwrap(),
        DeleteOutcome::Kept
    );
    assert_eq!(prompts, 1);
    assert_eq!(session.store().tasks(session.week()).len(), 1);

    let mut confirm = |_: &Task| DeleteDecision::Confirmed;
    let outcome = session
        .request_delete_at(slot(4, 19, 0), &mut confirm)
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted(task) if task.id == id));
    assert_eq!(session.grid().cell(slot(4, 18, 0)), CellState::Empty);
}

#[test]
fn delete_on_empty_slot_never_prompts() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    let mut unreachable = |_: &Task| -> DeleteDecision { panic!("must not prompt") };

    assert!(matches!(
        session.request_delete_at(slot(0, 0, 0), &mut unreachable),
        Err(SessionError::TaskNotFound)
    ));
}

#[test]
fn changing_week_moves_seven_days_and_reprojects_state() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    session.set_goal("this week").unwrap();
    session.select_slot(slot(1, 9, 0));
    *session.task_form_mut() = TaskForm::new("1", "only here");
    session.submit_task().unwrap();

    assert_eq!(session.week_label(), "2024-03-10 - 2024-03-16");
    session.change_week(1);
    assert_eq!(session.current_date(), NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    assert_eq!(session.week_label(), "2024-03-17 - 2024-03-23");
    assert_eq!(session.goal_text(), GOAL_PLACEHOLDER);
    assert_eq!(session.grid().visible_blocks().count(), 0);

    session.change_week(-1);
    assert_eq!(session.goal_text(), "this week");
    assert_eq!(session.grid().visible_blocks().count(), 1);
}

#[test]
fn habit_form_reaches_store_only_on_save() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    let week = session.week();

    session.habit_form_mut().set_name(0, "journal").unwrap();
    session.habit_form_mut().set_day(0, 3, true).unwrap();
    assert!(session.store().habits(week)[0].is_blank());

    session.save_habit_form().unwrap();
    let stored = session.store().habits(week);
    assert_eq!(stored[0].name, "journal");
    assert!(stored[0].days[3]);

    assert!(matches!(
        session.habit_form_mut().set_day(5, 0, true),
        Err(SessionError::InvalidHabitCell { row: 5, .. })
    ));
    assert!(session.habit_form_mut().set_day(0, 7, true).is_err());
}

#[test]
fn unsaved_habit_edits_are_dropped_on_week_change() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);

    session.habit_form_mut().set_name(1, "draft").unwrap();
    session.change_week(1);
    session.change_week(-1);

    assert!(session.habit_form().rows()[1].is_blank());
}

#[test]
fn tuple_delete_prompts_once_and_removes_all_matches() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    for hours in ["1", "2"] {
        session.select_slot(slot(6, 11, 0));
        *session.task_form_mut() = TaskForm::new(hours, "market");
        session.submit_task().unwrap();
    }
    let key = session.store().tasks(session.week())[0].key();

    let mut prompts = 0;
    let mut confirm = |_: &Task| {
        prompts += 1;
        DeleteDecision::Confirmed
    };
    assert_eq!(session.request_delete_matching(&key, &mut confirm).unwrap(), 2);
    assert_eq!(prompts, 1);
    assert!(session.store().tasks(session.week()).is_empty());
    assert_eq!(session.grid().blocks().len(), 0);
}

#[test]
fn delete_on_a_cell_of_a_hidden_block_never_prompts() {
    let kv = MemoryKvStore::new();
    let mut session = session(&kv);
    for (hours, text) in [("2", "under"), ("0.5", "over")] {
        session.select_slot(slot(3, 15, 0));
        *session.task_form_mut() = TaskForm::new(hours, text);
        session.submit_task().unwrap();
    }
    let mut unreachable = |_: &Task| -> DeleteDecision { panic!("must not prompt") };

    assert!(matches!(
        session.request_delete_at(slot(3, 16, 0), &mut unreachable),
        Err(SessionError::TaskNotFound)
    ));
    assert_eq!(session.store().tasks(session.week()).len(), 2);
}
