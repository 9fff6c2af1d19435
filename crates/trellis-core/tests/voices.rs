mod common;

use std::sync::atomic::Ordering;

use common::*;
use trellis_core::{Event, EventBody, OutputEvents, VoicePool};

fn pool(voices: usize) -> VoicePool<TestVoice> {
    VoicePool::new(voices, voices, TestVoice::default)
}

#[test]
fn test_one_more_note_than_voices_steals_once() {
    let mut pool = pool(4);
    let mut out = OutputEvents::with_capacity(16);
    for i in 0..5 {
        pool.note_on(note(i + 1, 60 + i as u16), 1.0, &mut out);
    }
    assert_eq!(note_ends(&out), vec![note(1, 60)]);
    assert_eq!(pool.active_voice_count(), 4);
}

#[test]
fn test_retrigger_reuses_slot() {
    let mut pool = pool(4);
    let mut out = OutputEvents::with_capacity(16);
    pool.note_on(note(1, 60), 1.0, &mut out);
    pool.note_on(note(2, 64), 1.0, &mut out);
    assert!(out.is_empty());

    pool.note_on(note(1, 60), 0.5, &mut out);
    assert_eq!(note_ends(&out), vec![note(1, 60)]);
    assert_eq!(pool.active_note(0), Some(note(1, 60)));
    assert_eq!(pool.active_voice_count(), 2);
    assert_eq!(pool.voice(0).map(|v| v.velocity), Some(0.5));
}

#[test]
fn test_three_notes_two_voices() {
    let mut pool = pool(2);
    let mut out = OutputEvents::with_capacity(16);
    pool.note_on(note(1, 60), 1.0, &mut out);
    pool.note_on(note(2, 64), 1.0, &mut out);
    assert!(note_ends(&out).is_empty());
    pool.note_on(note(3, 67), 1.0, &mut out);

    assert_eq!(note_ends(&out), vec![note(1, 60)]);
    let mut active: Vec<_> = pool.active_notes().collect();
    active.sort_by_key(|n| n.id);
    assert_eq!(active, vec![note(2, 64), note(3, 67)]);
}

#[test]
fn test_three_notes_two_voices_through_instance() {
    let Running { mut audio, .. } = processing(TestPlugin::default());
    let events = [
        note_on(0, note(1, 60)),
        note_on(0, note(2, 64)),
        note_on(0, note(3, 67)),
    ];
    let (_, out) = run_block(&mut audio, &events, 16);
    assert_eq!(note_ends(&out), vec![note(1, 60)]);
    assert_eq!(audio.active_voice_count(), 2);
}

#[test]
fn test_release_ends_note_at_event_frame() {
    let Running { mut audio, .. } = processing(TestPlugin::default());
    let events = [note_on(0, note(1, 60)), note_off(2, note(1, 60))];
    let (samples, out) = run_block(&mut audio, &events, 8);

    assert_eq!(&samples[..2], &[0.5, 0.5]);
    assert!(samples[2..].iter().all(|s| *s == 0.0));
    assert_eq!(
        out.as_slice(),
        &[Event::new(2, EventBody::NoteEnd { note: note(1, 60) })]
    );
    assert_eq!(audio.active_voice_count(), 0);
}

#[test]
fn test_wildcard_release_matches_by_key() {
    let Running { mut audio, .. } = processing(TestPlugin::default());
    run_block(&mut audio, &[note_on(0, note(9, 62))], 4);
    let off = Event::new(
        0,
        EventBody::NoteOff {
            note: trellis_core::NoteId::with_key(62),
            velocity: 0.0,
        },
    );
    let (_, out) = run_block(&mut audio, &[off], 4);
    assert_eq!(note_ends(&out), vec![note(9, 62)]);
}

#[test]
fn test_choke_frees_immediately() {
    let Running { mut audio, .. } = processing(TestPlugin::default());
    let events = [
        note_on(0, note(1, 60)),
        Event::new(1, EventBody::NoteChoke { note: note(1, 60) }),
    ];
    let (samples, out) = run_block(&mut audio, &events, 4);
    assert_eq!(samples, vec![0.5, 0.0, 0.0, 0.0]);
    assert_eq!(
        out.as_slice(),
        &[Event::new(1, EventBody::NoteEnd { note: note(1, 60) })]
    );
}

#[test]
fn test_reset_chokes_voices_and_reports_next_block() {
    let plugin = TestPlugin::default();
    let resets = plugin.resets.clone();
    let Running {
        mut instance,
        mut audio,
        ..
    } = processing(plugin);
    run_block(&mut audio, &[note_on(0, note(1, 60))], 4);
    assert_eq!(audio.active_voice_count(), 1);
    // the audio half is out on the audio thread
    assert_eq!(instance.active_voice_count(), 0);

    instance.stop_processing(audio).unwrap();
    assert_eq!(instance.active_voice_count(), 1);
    instance.reset().unwrap();
    assert_eq!(resets.load(Ordering::Relaxed), 1);
    assert_eq!(instance.active_voice_count(), 0);

    let mut audio = instance.start_processing().unwrap();
    let (samples, out) = run_block(&mut audio, &[], 4);
    assert!(samples.iter().all(|s| *s == 0.0));
    assert_eq!(
        out.as_slice(),
        &[Event::new(0, EventBody::NoteEnd { note: note(1, 60) })]
    );
}
