use std::sync::Arc;
use tokio::time::{timeout, Duration};
use voxdeck_core::audio::{PcmFormat, RawAudio};
use voxdeck_core::composition::{Clip, SegmentId};
use voxdeck_core::events::{EventSender, StudioEvent};
use voxdeck_core::playback::{
    MockOutput, MockPlayback, OutputEvent, PlaybackOutcome, PlaybackSequencer, SequencerState,
};
use voxdeck_core::StudioError;

fn clip(frames: usize) -> Clip {
    Clip {
        segment_id: SegmentId::new(),
        audio: RawAudio::from(vec![0u8; frames * 2]),
    }
}

fn setup(mode: MockPlayback) -> (PlaybackSequencer, MockOutput, EventSender) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let output = MockOutput::new(mode);
    let events = EventSender::detached();
    let sequencer =
        PlaybackSequencer::new(Arc::new(output.clone()), PcmFormat::default(), events.clone());
    (sequencer, output, events)
}

async fn wait_until_idle(sequencer: &PlaybackSequencer) {
    timeout(Duration::from_secs(5), async {
        while sequencer.state() != SequencerState::Idle {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("sequencer never returned to Idle");
}

fn playback_events(events: &EventSender) -> Vec<StudioEvent> {
    events
        .event_history()
        .into_iter()
        .map(|event| match event {
            StudioEvent::PlaybackStarted { segment_id, .. } => StudioEvent::PlaybackStarted {
                segment_id,
                timestamp: 0,
            },
            other => other,
        })
        .collect()
}

#[tokio::test]
async fn test_starting_new_clip_stops_previous_first() {
    let (sequencer, output, events) = setup(MockPlayback::Manual);
    let first = clip(10);
    let second = clip(20);
    let (x, y) = (first.segment_id, second.segment_id);

    sequencer.play_one(first).await.unwrap();
    sequencer.play_one(second).await.unwrap();

    assert_eq!(
        output.events(),
        vec![
            OutputEvent::Started {
                clip: 0,
                frames: 10,
                sample_rate: 24000
            },
            OutputEvent::Stopped { clip: 0 },
            OutputEvent::Started {
                clip: 1,
                frames: 20,
                sample_rate: 24000
            },
        ]
    );
    assert_eq!(
        playback_events(&events),
        vec![
            StudioEvent::PlaybackStarted {
                segment_id: x,
                timestamp: 0
            },
            StudioEvent::PlaybackStopped { segment_id: x },
            StudioEvent::PlaybackStarted {
                segment_id: y,
                timestamp: 0
            },
        ]
    );
    assert_eq!(sequencer.state(), SequencerState::PlayingOne(y));
    assert!(!sequencer.is_playing(x));
}

#[tokio::test]
async fn test_natural_end_of_single_clip_returns_to_idle() {
    let (sequencer, output, events) = setup(MockPlayback::Manual);
    let clip = clip(4);
    let id = clip.segment_id;

    sequencer.play_one(clip).await.unwrap();
    output.finish(0);
    wait_until_idle(&sequencer).await;

    assert_eq!(sequencer.playing_segment(), None);
    assert!(events
        .event_history()
        .contains(&StudioEvent::PlaybackFinished { segment_id: id }));
}

#[tokio::test]
async fn test_sequence_plays_each_clip_after_the_previous_ends() {
    let (sequencer, output, _events) = setup(MockPlayback::Manual);
    let clips = vec![clip(1), clip(2), clip(3)];
    let ids: Vec<SegmentId> = clips.iter().map(|c| c.segment_id).collect();

    let task = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_all(clips).await }
    });

    for index in 0..3 {
        output.wait_for_starts(index + 1).await;
        assert_eq!(sequencer.state(), SequencerState::PlayingAll(index));
        assert_eq!(sequencer.playing_segment(), Some(ids[index]));
        assert_eq!(output.started_count(), index + 1);
        output.finish(index);
    }

    assert_eq!(task.await.unwrap().unwrap(), PlaybackOutcome::Completed);
    assert_eq!(sequencer.state(), SequencerState::Idle);

    let frames: Vec<usize> = output
        .events()
        .into_iter()
        .filter_map(|e| match e {
            OutputEvent::Started { frames, .. } => Some(frames),
            _ => None,
        })
        .collect();
    assert_eq!(frames, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_stop_all_during_sequence_prevents_later_clips() {
    let (sequencer, output, _events) = setup(MockPlayback::Manual);
    let clips = vec![clip(1), clip(2), clip(3)];

    let task = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_all(clips).await }
    });

    output.wait_for_starts(1).await;
    sequencer.stop_all();

    assert_eq!(task.await.unwrap().unwrap(), PlaybackOutcome::Stopped);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(output.started_count(), 1);
    assert_eq!(sequencer.state(), SequencerState::Idle);
    assert_eq!(
        output.events()[1..],
        [OutputEvent::Stopped { clip: 0 }]
    );
}

#[tokio::test]
async fn test_play_all_while_playing_all_toggles_off() {
    let (sequencer, output, _events) = setup(MockPlayback::Manual);
    let clips = vec![clip(1), clip(2)];

    let task = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_all(clips).await }
    });
    output.wait_for_starts(1).await;

    let toggled = sequencer.play_all(vec![clip(5)]).await.unwrap();

    assert_eq!(toggled, PlaybackOutcome::Stopped);
    assert_eq!(task.await.unwrap().unwrap(), PlaybackOutcome::Stopped);
    assert_eq!(output.started_count(), 1);
    assert_eq!(sequencer.state(), SequencerState::Idle);
}

#[tokio::test]
async fn test_play_one_supersedes_running_sequence() {
    let (sequencer, output, _events) = setup(MockPlayback::Manual);
    let clips = vec![clip(1), clip(2), clip(3)];
    let single = clip(9);
    let single_id = single.segment_id;

    let task = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_all(clips).await }
    });
    output.wait_for_starts(1).await;

    sequencer.play_one(single).await.unwrap();

    assert_eq!(task.await.unwrap().unwrap(), PlaybackOutcome::Stopped);
    assert_eq!(output.started_count(), 2);
    assert_eq!(sequencer.state(), SequencerState::PlayingOne(single_id));
}

#[tokio::test]
async fn test_immediate_output_completes_sequence() {
    let (sequencer, output, events) = setup(MockPlayback::Immediate);

    let outcome = sequencer
        .play_all(vec![clip(1), clip(1), clip(1)])
        .await
        .unwrap();

    assert_eq!(outcome, PlaybackOutcome::Completed);
    assert_eq!(output.started_count(), 3);
    let finished = events
        .event_history()
        .iter()
        .filter(|e| matches!(e, StudioEvent::PlaybackFinished { .. }))
        .count();
    assert_eq!(finished, 3);
}

#[tokio::test]
async fn test_output_failure_mid_sequence_propagates() {
    let (sequencer, output, _events) = setup(MockPlayback::Immediate);
    output.fail_next_start();

    let result = sequencer.play_all(vec![clip(1), clip(1)]).await;

    assert!(matches!(result, Err(StudioError::Playback(_))));
    assert_eq!(sequencer.state(), SequencerState::Idle);
    assert_eq!(output.started_count(), 0);
}

async fn wait_for_state(sequencer: &PlaybackSequencer, expected: SequencerState) {
    timeout(Duration::from_secs(5), async {
        while sequencer.state() != expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("sequencer never reached expected state");
}

#[tokio::test]
async fn test_latest_request_wins_over_slower_decode() {
    let (sequencer, output, _events) = setup(MockPlayback::Manual);
    let slow = clip(2_000_000);
    let fast = clip(2);
    let (x, y) = (slow.segment_id, fast.segment_id);

    let first = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_one(slow).await }
    });
    wait_for_state(&sequencer, SequencerState::PlayingOne(x)).await;

    sequencer.play_one(fast).await.unwrap();
    first.await.unwrap().unwrap();

    assert_eq!(sequencer.state(), SequencerState::PlayingOne(y));
    assert_eq!(sequencer.playing_segment(), Some(y));
    assert_eq!(
        output.events(),
        vec![OutputEvent::Started {
            clip: 0,
            frames: 2,
            sample_rate: 24000
        }]
    );
}

#[tokio::test]
async fn test_stop_all_cancels_request_still_decoding() {
    let (sequencer, output, events) = setup(MockPlayback::Manual);
    let pending = clip(2_000_000);
    let id = pending.segment_id;

    let task = tokio::spawn({
        let sequencer = sequencer.clone();
        async move { sequencer.play_one(pending).await }
    });
    wait_for_state(&sequencer, SequencerState::PlayingOne(id)).await;

    sequencer.stop_all();
    task.await.unwrap().unwrap();

    assert_eq!(sequencer.state(), SequencerState::Idle);
    assert_eq!(sequencer.playing_segment(), None);
    assert_eq!(output.started_count(), 0);
    assert!(!events
        .event_history()
        .iter()
        .any(|e| matches!(e, StudioEvent::PlaybackStarted { .. })));
}
