use criterion::{black_box, criterion_group, criterion_main, Criterion};

use edumate_core::importer::{parse_csv_line, QuestionImporter};
use edumate_core::model::{Difficulty, Subject, Topic};
use uuid::Uuid;

fn bench_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv_line");

    let plain = "Mathematics,Fractions,What is 1/2 + 1/4?,1/4,3/4,1/2,1,B,Easy,Add quarters";
    let quoted = r#"Mathematics,Fractions,"If a pizza has 8 slices, and you eat 3, what fraction is left?","3/8","5/8","1/2","1/8",B,Medium,"8 - 3 = 5, so 5/8""#;

    group.bench_function("plain", |b| b.iter(|| parse_csv_line(black_box(plain))));
    group.bench_function("quoted", |b| b.iter(|| parse_csv_line(black_box(quoted))));

    group.finish();
}

fn bench_prepare_batch(c: &mut Criterion) {
    let subject = Subject {
        id: Uuid::new_v4(),
        name: "Mathematics".into(),
        order: 1,
        difficulty: Difficulty::Medium,
    };
    let topic = Topic {
        id: Uuid::new_v4(),
        subject_id: subject.id,
        name: "Fractions".into(),
        order: 1,
        difficulty: Difficulty::Easy,
        description: String::new(),
    };

    let rows: Vec<Vec<String>> = (0..500)
        .map(|i| parse_csv_line(&format!("Mathematics,Fractions,Question {i}?,a,b,c,d,{}", i % 4 + 1)))
        .collect();

    c.bench_function("prepare_500_rows", |b| {
        b.iter(|| {
            let mut importer =
                QuestionImporter::new(vec![subject.clone()], vec![topic.clone()], &[]);
            for row in &rows {
                if let Ok(item) = importer.prepare(black_box(row)) {
                    importer.accept(&item);
                }
            }
        })
    });
}

criterion_group!(benches, bench_parse_line, bench_prepare_batch);
criterion_main!(benches);
