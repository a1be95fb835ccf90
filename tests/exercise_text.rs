use remedia::{
    remediation::{GeneratedExercise, TeacherEdit},
    types::Language,
};

const GENERATED: &str = "Here is a new exercise on the same idea.\n\n**Question:** A bag holds 3 \
                         red and 5 blue marbles. What fraction is red?\n**Expected answer:** \
                         3/8\n**Hint:** count every marble first.\n**Explanation:** red over \
                         total.";

#[test]
fn teacher_text_keeps_question_and_answer_verbatim() {
    let generated = GeneratedExercise::parse(GENERATED).unwrap();
    assert_eq!(
        generated.question,
        "A bag holds 3 red and 5 blue marbles. What fraction is red?"
    );
    assert_eq!(generated.expected_answer, "3/8");

    for language in [Language::En, Language::Fr] {
        let text = generated.to_teacher_text(language);
        let reread = GeneratedExercise::parse(&text).unwrap();
        assert_eq!(reread, generated, "{language}");
    }
}

#[test]
fn french_layout() {
    let exercise = GeneratedExercise {
        question:        "Combien font 7 × 8 ?".into(),
        expected_answer: "56".into(),
        hint:            None,
        explanation:     Some("Table de 7.".into()),
    };

    assert_eq!(
        exercise.to_teacher_text(Language::Fr),
        "Remédiation :\n- Question : Combien font 7 × 8 ?\n- Réponse attendue : 56\n- \
         Explication : Table de 7."
    );
}

#[test]
fn edits_replace_only_given_fields() {
    let generated = GeneratedExercise::parse(GENERATED).unwrap();
    let edit = TeacherEdit::builder()
        .expected_answer("3 out of 8")
        .build();

    let edited = generated.edited(&edit);
    assert_eq!(edited.question, generated.question);
    assert_eq!(edited.expected_answer, "3 out of 8");
    assert_eq!(edited.hint, generated.hint);
    assert_eq!(edited.explanation, generated.explanation);
}
