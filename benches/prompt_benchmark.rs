use criterion::{Criterion, black_box, criterion_group, criterion_main};
use specs_report::PromptGenerator;
use specs_report::reporter::{PromptBundle, TestResultRecord, TestStatus};
use specs_report::tags::process_tags;

fn failed_record() -> TestResultRecord {
    TestResultRecord {
        num: 1,
        title: "Guest can book a double room".to_string(),
        file_name: "booking/rooms.spec.ts".to_string(),
        line: 42,
        column: 7,
        time_duration: 31_250.0,
        duration: "31s 250ms".to_string(),
        description: Some("Books a room for two nights".to_string()),
        status: TestStatus::Failed,
        status_icon: "cancel".to_string(),
        browser: "rbp-chromium".to_string(),
        tags: vec!["smoke".to_string(), "p1".to_string(), "booking".to_string()],
        tag_meta: process_tags(&["@smoke", "@p1", "@booking"]),
        pre_conditions: vec!["Room 101 is free".to_string()],
        steps: (1..=12).map(|i| format!("Step {}", i)).collect(),
        post_conditions: vec!["Booking is cancelled".to_string()],
        attachments: vec![],
        video_path: Some("video.webm".to_string()),
        screenshot_paths: vec!["a.png".to_string(), "b.png".to_string()],
        errors: vec![
            "<span style=\"color: red;\">Error: timeout 30000ms exceeded</span><br><br>  waiting for locator('#book')"
                .to_string(),
        ],
        prompts: None::<PromptBundle>,
    }
}

fn benchmark_prompts(c: &mut Criterion) {
    let record = failed_record();
    let generator = PromptGenerator::new();

    c.bench_function("prompt_bundle", |b| {
        b.iter(|| generator.bundle(black_box(&record)))
    });
}

fn benchmark_tags(c: &mut Criterion) {
    let tags = [
        "@smoke", "@regression", "@p1", "@booking", "@api", "@flaky", "@staging", "@x", "@bad tag",
    ];

    c.bench_function("process_tags", |b| b.iter(|| process_tags(black_box(&tags))));
}

criterion_group!(benches, benchmark_prompts, benchmark_tags);
criterion_main!(benches);
