//! Full analysis walkthrough: configure the engine, cluster a small batch
//! of survey responses, and inspect every artifact it exposes.

use cohort::{AnalysisEngine, AnswerValue, Question, ResponseRecord, Schema};

fn main() {
    let schema = Schema::new(vec![
        Question::numeric("hours_per_week", 0, 40),
        Question::choice("tools", 4, false),
        Question::choice("satisfaction", 5, true),
        Question::free_text("team"),
    ]);

    // Two obvious respondent groups: light users on the core team,
    // heavy users on infra.
    let records = vec![
        ResponseRecord::new("ana", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(4))
            .with_answer("tools", AnswerValue::selection([0]))
            .with_answer("satisfaction", AnswerValue::selection([1]))
            .with_answer("team", AnswerValue::text("core")),
        ResponseRecord::new("ben", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(6))
            .with_answer("tools", AnswerValue::selection([0, 1]))
            .with_answer("satisfaction", AnswerValue::selection([2]))
            .with_answer("team", AnswerValue::text("core")),
        ResponseRecord::new("cleo", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(5))
            .with_answer("tools", AnswerValue::selection([0]))
            .with_answer("satisfaction", AnswerValue::selection([1]))
            .with_answer("team", AnswerValue::text("core")),
        ResponseRecord::new("dan", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(35))
            .with_answer("tools", AnswerValue::selection([2, 3]))
            .with_answer("satisfaction", AnswerValue::selection([4]))
            .with_answer("team", AnswerValue::text("infra")),
        ResponseRecord::new("eve", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(38))
            .with_answer("tools", AnswerValue::selection([2]))
            .with_answer("satisfaction", AnswerValue::selection([3]))
            .with_answer("team", AnswerValue::text("infra")),
        ResponseRecord::new("finn", "dev-survey")
            .with_answer("hours_per_week", AnswerValue::number(36))
            .with_answer("tools", AnswerValue::selection([2, 3]))
            .with_answer("satisfaction", AnswerValue::selection([4]))
            .with_answer("team", AnswerValue::text("infra")),
    ];

    let mut engine = AnalysisEngine::new().with_seed(42);
    engine
        .set_algorithm_and_initializer("kmeans", "kmeans++")
        .unwrap();
    engine.set_evaluator("silhouette").unwrap();

    let k = engine.auto_select_k(&records, &schema).unwrap();
    println!("=== Elbow-selected K: {k} ===\n");

    engine.analyze(&records, &schema).unwrap();

    println!("=== Cluster members ===");
    for (id, members) in engine.cluster_members().unwrap().iter().enumerate() {
        println!("  cluster {id}: {}", members.join(", "));
    }

    let score = engine.quality_score().unwrap();
    println!(
        "\n=== Quality ===\n  {} = {:.3} ({:?})",
        score.metric.name(),
        score.value,
        score.direction
    );

    println!("\n=== MDS projection ===");
    for point in engine.project().unwrap() {
        println!(
            "  record {:2} => ({:6.3}, {:6.3}) cluster {}",
            point.record, point.x, point.y, point.cluster
        );
    }

    // The same batch through k-medoids, scored with Davies-Bouldin.
    let mut engine = AnalysisEngine::new().with_seed(42);
    engine
        .set_algorithm_and_initializer("kmedoids", "greedy")
        .unwrap();
    engine.set_evaluator("davies-bouldin").unwrap();
    engine.set_k(2).unwrap();
    engine.analyze(&records, &schema).unwrap();

    let score = engine.quality_score().unwrap();
    println!(
        "\n=== K-medoids ===\n  {} = {:.3} ({:?})",
        score.metric.name(),
        score.value,
        score.direction
    );
    for (id, members) in engine.cluster_members().unwrap().iter().enumerate() {
        println!("  cluster {id}: {}", members.join(", "));
    }
}
