use chrono::Utc;
use parley::fingerprint::{FingerprintIndex, fingerprint_message};
use parley::learning::LearnedPatterns;
use parley::session::{ContextData, ResponseType, SessionLogEntry};
use parley::similarity::similarity;
use parley::text::normalize;
use proptest::prelude::*;

fn qa_entry(question: &str, answer: &str) -> SessionLogEntry {
    SessionLogEntry {
        timestamp: Utc::now(),
        user: "Bob".into(),
        user_message: format!("Bob: {question}?"),
        bot_responses: vec![answer.to_owned()],
        response_type: ResponseType::QuestionAnswer,
        fallback: false,
        topic: "careers".into(),
        context_data: ContextData::default(),
    }
}

proptest! {
    #[test]
    fn similarity_is_bounded(a in ".{0,60}", b in ".{0,60}") {
        let score = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {score} out of range");
    }

    #[test]
    fn similarity_is_symmetric(a in "[a-z ]{0,40}", b in "[a-z ]{0,40}") {
        prop_assert!((similarity(&a, &b) - similarity(&b, &a)).abs() < f64::EPSILON);
    }

    #[test]
    fn self_similarity_is_one(a in "[a-z]{1,8}( [a-z]{1,8}){0,6}") {
        prop_assert!((similarity(&a, &a) - 1.0).abs() < f64::EPSILON);
        prop_assert_eq!(similarity(&a, ""), 0.0);
    }

    #[test]
    fn normalize_is_deterministic_and_clean(raw in ".{0,80}") {
        let once = normalize(&raw);
        prop_assert_eq!(&once, &normalize(&raw));
        prop_assert_eq!(fingerprint_message(&raw), fingerprint_message(&raw));
        prop_assert!(once.chars().all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace()));
    }

    #[test]
    fn first_sighting_is_never_a_repeat(raw in "[A-Za-z]{1,8}: [a-z ?!]{1,40}") {
        let mut index = FingerprintIndex::new();
        prop_assert!(!index.is_repeat(&raw));
        prop_assert!(index.is_repeat(&raw));
    }

    #[test]
    fn learning_never_shrinks_and_answers_only_get_shorter(
        answers in proptest::collection::vec("[a-z]{4,12}( [a-z]{1,8}){0,5}", 1..8),
    ) {
        let mut patterns = LearnedPatterns::new();
        let mut kept = 0;
        let mut best: Option<String> = None;
        for answer in &answers {
            patterns.learn_from_session(&[qa_entry("what is a career ladder", answer)]);

            let now_kept = patterns.topic_responses("careers").len();
            prop_assert!(now_kept >= kept);
            kept = now_kept;

            let stored = patterns.answer_for_question("what is a career ladder?").map(str::to_owned);
            if let (Some(prev), Some(cur)) = (&best, &stored) {
                prop_assert!(cur.chars().count() <= prev.chars().count());
            }
            best = stored;
        }
    }
}
