use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use weekplan_core::{
    build_workbook, export_week_image, render_week, Habit, ImageLayout, Slot, Task, TaskColor,
    WeekKey, XlsxWorkbookWriter,
};

fn sample_week() -> WeekKey {
    WeekKey::containing(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
}

fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn spreadsheet_export_writes_one_workbook_with_both_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let week = sample_week();
    let tasks = vec![Task::new(
        Slot::new(1, 9, 0).unwrap(),
        1.0,
        "standup, daily",
        TaskColor::Mint,
    )
    .unwrap()];
    let habits = vec![Habit::new("meditate", [true; 7])];

    let path = XlsxWorkbookWriter::new(dir.path().join("out"))
        .write(&build_workbook(week, &tasks, &habits))
        .unwrap();

    assert_eq!(path.file_name().unwrap(), "schedule_2024-03-10.xlsx");
    let files: Vec<_> = std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1);

    let book = read_entry(&path, "xl/workbook.xml");
    let schedule_at = book.find("name=\"schedule\"").unwrap();
    let habits_at = book.find("name=\"habits\"").unwrap();
    assert!(schedule_at < habits_at);

    let strings = read_entry(&path, "xl/sharedStrings.xml");
    for expected in ["Day", "Duration", "Monday", "09:00", "1 hours", "standup, daily"] {
        assert!(strings.contains(expected), "missing {expected}");
    }
    for expected in ["Habit", "Saturday", "meditate", "Yes"] {
        assert!(strings.contains(expected), "missing {expected}");
    }
}

#[test]
fn image_export_writes_png_named_by_week() {
    let dir = tempfile::tempdir().unwrap();
    let week = sample_week();
    let tasks =
        vec![Task::new(Slot::new(0, 7, 0).unwrap(), 2.0, "run", TaskColor::Rose).unwrap()];

    let path = export_week_image(
        &render_week(week, &tasks),
        dir.path().join("out"),
        ImageLayout::default(),
    )
    .unwrap();

    assert_eq!(path.file_name().unwrap(), "schedule_2024-03-10.png");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}
