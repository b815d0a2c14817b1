use ulpan::{
    core::{
        CardId,
        LessonSource,
        LessonWord,
        MatchingConfig,
        Orchestrator,
        SourceFailure,
        SourceId,
        VocabularyEntry,
        VocabularyIndex,
    },
    matching::{
        CandidateSelector,
        Confidence,
    },
    normalize,
    persistence::{
        Approval,
        MatchStore,
    },
    segmentation::LessonBatch,
    tags,
};

fn morning_vocabulary() -> VocabularyIndex {
    vec![
        VocabularyEntry::new("בָּקָר", "cattle", CardId(20)),
        VocabularyEntry::new("בֹּקֶר", "morning", CardId(10)),
        VocabularyEntry::new("עֶרֶב", "evening", CardId(30)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn pointed_lesson_word_finds_its_exact_entry_first() {
    let word = LessonWord::new("בּוֹקֶר", SourceId::section(1, "S02"), "בּוֹקֶר טוֹב");
    assert_eq!(word.normalized_form(), "בוקר");

    // בֹּקֶר is spelled without the vav
    let mut index = morning_vocabulary();
    index.insert(VocabularyEntry::new("בוקר", "morning", CardId(11)));

    let matches = CandidateSelector::new().select(&word, &index, 5, 3).unwrap();

    assert_eq!(matches[0].entry.card_id(), CardId(11));
    assert_eq!(matches[0].distance, 0);
    assert_eq!(matches[0].confidence, Confidence::Exact);
    assert_eq!(normalize(matches[1].entry.surface_form()), "בקר");
    assert_eq!(matches[1].distance, 1);
}

#[test]
fn word_without_candidates_is_logged_as_unmatched() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();
    let orchestrator = Orchestrator::new(MatchingConfig::default()).unwrap();
    let index: VocabularyIndex = vec![VocabularyEntry::new("אבגדהוחטיכ", "", CardId(1))].into_iter().collect();
    let batch = LessonBatch::from_words(vec![LessonWord::new("זָזָז", SourceId::lesson(9), "זָזָז")]);

    let report = orchestrator.match_batch(&batch, &index, Some(&mut store)).unwrap();

    let source = report.source(&SourceId::lesson(9)).unwrap();
    assert!(source.matched.is_empty());
    assert_eq!(source.unmatched[0].normalized_form(), "זזז");

    let logged: Vec<_> = store.unmatched_words().collect();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].lesson_word, "זזז");
    assert_eq!(store.statistics().unmatched_count, 1);
}

#[test]
fn lesson_tags_are_generated_and_parsed_back() {
    let first = tags::generate("Hebrew Course", 1);
    assert_eq!(first.lesson_tag, "hebrew course::L01");
    assert_eq!(tags::generate("Hebrew Course", 100).lesson_tag, "hebrew course::L100");
    assert_eq!(tags::parse([first.lesson_tag.as_str()], "Hebrew Course").unwrap(), Some(1));
}

#[test]
fn approvals_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("matches.json");
    let lesson = SourceId::lesson(3);

    {
        let mut store = MatchStore::open(&path).unwrap();
        store.record_approved(&lesson, "תּוֹדָה", CardId(4), Confidence::High).unwrap();
        store.record_approved(&lesson, "תודה", CardId(5), Confidence::Exact).unwrap();
    }

    let store = MatchStore::open(&path).unwrap();
    let stored = store.lookup(&lesson, "תודה").unwrap();
    assert_eq!(stored.card_id, CardId(5));
    assert_eq!(stored.confidence, Confidence::Exact);
    assert_eq!(store.matches().count(), 1);
}

#[test]
fn broken_sources_do_not_stop_the_batch() {
    let orchestrator = Orchestrator::new(MatchingConfig { parallel: false, ..Default::default() }).unwrap();
    let batch = orchestrator.extractor().extract_batch(vec![
        Err(SourceFailure::new("lesson-01.mp3", "missing lyrics tag")),
        Ok(LessonSource::new(SourceId::lesson(2), vec!["עֶרֶב טוֹב".to_string()])),
    ]);
    let index = morning_vocabulary();

    let report = orchestrator.match_batch(&batch, &index, None).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "lesson-01.mp3");
    let lesson = report.source(&SourceId::lesson(2)).unwrap();
    assert_eq!(lesson.matched[0].lesson_word.normalized_form(), "ערב");
    assert_eq!(lesson.matched[0].candidates[0].entry.card_id(), CardId(30));
}

#[test]
fn suggest_approve_tag_round() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MatchStore::open(dir.path().join("matches.json")).unwrap();
    let orchestrator = Orchestrator::new(MatchingConfig { deck_name: "Hebrew Course".to_string(), ..Default::default() })
        .unwrap();
    let index = morning_vocabulary();
    let batch = orchestrator
        .extractor()
        .extract_batch(vec![Ok(LessonSource::new(SourceId::lesson(5), vec!["עֶרֶב".to_string()]))]);

    let report = orchestrator.match_batch(&batch, &index, Some(&mut store)).unwrap();
    let best = &report.sources[0].matched[0].candidates[0];
    let mut approval = Approval::new(
        best.lesson_word.source_id().clone(),
        best.lesson_word.surface_form(),
        best.entry.card_id(),
        best.confidence,
    );
    approval.distance = Some(best.distance);

    let plan = orchestrator.apply_approvals(&[approval], &mut store, Some(&index)).unwrap();
    assert_eq!(plan.updates.len(), 1);
    assert_eq!(plan.updates[0].card_id, CardId(30));
    assert_eq!(plan.updates[0].tags, vec!["hebrew course", "hebrew course::L05"]);

    // a second pass skips the approved word
    let again = orchestrator.match_batch(&batch, &index, Some(&mut store)).unwrap();
    assert_eq!(again.summary.skipped, 1);
    assert_eq!(again.summary.matched, 0);
}
