mod common;
use common::{at, channels, label, label_with_stimulus, source, SRATE};
use chrono::NaiveDate;
use neuroepoch::{LabelBundle, LabelOrganizer, Operation};

fn organizer() -> LabelOrganizer {
    LabelOrganizer::new(SRATE, channels())
}

fn add_promoted(org: &mut LabelOrganizer, labels: Vec<neuroepoch::Label>) {
    let date = NaiveDate::from_ymd_opt(2019, 10, 9).unwrap();
    let mut bundle = LabelBundle::promoted("audio", date, labels);
    org.add_labels(&mut bundle);
}

#[test]
fn contained_label_gets_exactly_the_lagged_slice() {
    let mut org = organizer();
    let l = label("a", 0, 2, 4);
    add_promoted(&mut org, vec![l.clone()]);

    // Two sources; the label sits fully inside the first.
    org.assign_target_data(&[source(0, 10), source(10, 10)], 1.0, 1.0);

    let data = org.payload(&l).expect("payload assigned");
    // [2 s, 4 s] with 1 s lags → [1 s, 5 s] → 40 samples from the first file.
    assert_eq!(data.ncols(), 40);
    assert_eq!(data[[0, 0]], 10.0); // global sample index at 1 s
    assert_eq!(data[[1, 0]], 1010.0);
}

#[test]
fn cursor_does_not_advance_past_a_matching_source() {
    let mut org = organizer();
    let first = label("a", 0, 2, 4);
    let second = label("b", 1, 6, 8);
    add_promoted(&mut org, vec![first.clone(), second.clone()]);

    org.assign_target_data(&[source(0, 10), source(10, 10)], 1.0, 1.0);

    // Both labels resolve from the first file: values stay on its ramp.
    assert_eq!(org.payload(&first).unwrap()[[0, 0]], 10.0);
    assert_eq!(org.payload(&second).unwrap()[[0, 0]], 50.0);
}

#[test]
fn label_spanning_two_files_concatenates_in_time_order() {
    let mut org = organizer();
    let l = label("span", 0, 8, 12);
    add_promoted(&mut org, vec![l.clone()]);

    org.assign_target_data(&[source(0, 10), source(10, 10)], 1.0, 1.0);

    let data = org.payload(&l).unwrap();
    // [7 s, 10 s) from file one (30 samples) + [10 s, 13 s) from file two
    // (30 samples), in time order.
    assert_eq!(data.ncols(), 60);
    for t in 0..60 {
        assert_eq!(data[[0, t]], 70.0 + t as f64);
    }
}

#[test]
fn label_fragmented_across_three_files_is_merged() {
    let mut org = organizer();
    let l = label("long", 0, 5, 25);
    add_promoted(&mut org, vec![l.clone()]);

    org.assign_target_data(&[source(0, 10), source(10, 10), source(20, 10)], 1.0, 1.0);

    let data = org.payload(&l).unwrap();
    // [4 s, 26 s) stitched from all three files.
    assert_eq!(data.ncols(), 220);
    for t in 0..220 {
        assert_eq!(data[[0, t]], 40.0 + t as f64);
    }
}

#[test]
fn unfindable_label_is_dropped_and_cursor_restored() {
    let mut org = organizer();
    let found = label("found", 0, 2, 4);
    let missing = label("missing", 1, 50, 55);
    let later = label("later", 2, 6, 8);
    add_promoted(&mut org, vec![found.clone(), missing.clone(), later.clone()]);

    org.assign_target_data(&[source(0, 10)], 1.0, 1.0);

    // The unfindable label is removed in the post-pass batch; the cursor
    // restore lets the following label still resolve from the same file.
    assert_eq!(org.len(), 2);
    assert!(org.payload(&missing).is_none());
    assert!(org.labels().all(|l| l.name != "missing"));
    assert!(org.payload(&later).is_some());
}

#[test]
fn partial_tail_is_accepted_truncated() {
    let mut org = organizer();
    let l = label("cutoff", 0, 8, 15);
    add_promoted(&mut org, vec![l.clone()]);

    org.assign_target_data(&[source(0, 10)], 1.0, 1.0);

    // [7 s, 16 s] wanted, only [7 s, 10 s) exists; label survives with
    // the truncated payload.
    assert_eq!(org.len(), 1);
    assert_eq!(org.payload(&l).unwrap().ncols(), 30);
}

#[test]
fn epoch_dataset_counts_and_lengths() {
    let mut org = organizer();
    let l = label_with_stimulus("story", 0, 5, 25, 200);
    add_promoted(&mut org, vec![l.clone()]);
    org.assign_target_data(&[source(0, 10), source(10, 10), source(20, 10)], 1.0, 1.0);

    let set = org.get_epoch_dataset(5.0).unwrap();

    // 20 s / 5 s → 4 epochs of 50 samples each.
    assert_eq!(set.len(), 4);
    for (i, rec) in set.records.iter().enumerate() {
        assert_eq!(rec.n_samples(), 50, "epoch {i}");
        assert_eq!(rec.n_channels(), 2);
        assert_eq!(rec.stimuli.nrows(), 1);
        assert_eq!(rec.stimuli_des[0], "story");
    }
    // Epochs tile the payload contiguously from its first sample.
    assert_eq!(set.records[0].data[[0, 0]], 40.0);
    assert_eq!(set.records[1].data[[0, 0]], 90.0);
}

#[test]
fn epoch_dataset_name_and_op_log() {
    let mut org = organizer();
    let l = label_with_stimulus("story", 0, 2, 12, 100);
    add_promoted(&mut org, vec![l]);
    org.log_op("C3", Operation::HighPass, vec![0.5]);
    org.log_op("C3", Operation::Resample, vec![10.0]);
    org.assign_target_data(&[source(0, 20)], 1.0, 1.0);

    let set = org.get_epoch_dataset(5.0).unwrap();
    assert_eq!(set.name, format!("audio{}", at(2)));

    assert_eq!(set.len(), 2);
    for rec in &set.records {
        let ops: Vec<_> = rec.op_log.entries().iter().map(|e| e.op).collect();
        assert_eq!(ops, [Operation::HighPass, Operation::Resample]);
    }
}

#[test]
fn short_final_epoch_is_dropped() {
    let mut org = organizer();
    // 12 s label but only 8 s of data exist → second 5 s epoch would be
    // 30 samples short and is dropped.
    let l = label_with_stimulus("short", 0, 1, 13, 120);
    add_promoted(&mut org, vec![l.clone()]);
    org.assign_target_data(&[source(0, 8)], 1.0, 1.0);
    assert_eq!(org.payload(&l).unwrap().ncols(), 80);

    let set = org.get_epoch_dataset(5.0).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.records[0].n_samples(), 50);
}

#[test]
fn add_labels_promotes_unpromoted_bundle() {
    let date = NaiveDate::from_ymd_opt(2019, 10, 9).unwrap();
    // Clock-only times on a placeholder date.
    let placeholder = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let l = neuroepoch::Label::new(
        "clock",
        0,
        placeholder.and_hms_opt(15, 0, 2).unwrap(),
        placeholder.and_hms_opt(15, 0, 4).unwrap(),
    );
    let mut bundle = LabelBundle::new("audio", date, vec![l]);

    let mut org = organizer();
    org.add_labels(&mut bundle);
    assert!(bundle.is_promoted());
    assert_eq!(org.labels().next().unwrap().start, at(2));
    assert_eq!(org.kind(), "audio");

    // Promoted labels resolve against absolute-time sources.
    let promoted = org.labels().next().unwrap().clone();
    org.assign_target_data(&[source(0, 10)], 1.0, 1.0);
    assert_eq!(org.payload(&promoted).unwrap().ncols(), 40);
}
