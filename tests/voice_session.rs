//! End-to-end session tests: frames in, playback and events out.
//!
//! Time is split in two: the session clock is a `ManualClock` driven by the
//! test, while tokio time runs paused so background scans fire on demand.

use std::sync::Arc;
use std::time::Duration;
use voicedj::audio::frame::{PcmFrame, SpeakerId};
use voicedj::media::TrackSummary;
use voicedj::pipeline::{ControlAction, WindowCloseReason};
use voicedj::testing::{
    CollectingReporter, CollectorEventSink, MockMediaSearch, MockPlaybackSink,
    MockPlaylistExpander, MockRecognizer, candidate,
};
use voicedj::{
    Config, FrameConsumer, ManualClock, Providers, SessionEvent, VoiceDjError, VoiceSession,
    VoiceSessionHandle,
};

struct Session {
    handle: VoiceSessionHandle,
    clock: ManualClock,
    events: CollectorEventSink,
    sink: MockPlaybackSink,
    search: MockMediaSearch,
    reporter: CollectingReporter,
}

fn songs() -> MockMediaSearch {
    MockMediaSearch::new()
        .with_results(
            "believer",
            vec![candidate("Believer", "Imagine Dragons - Topic", Some(204))],
        )
        .with_results(
            "closer",
            vec![candidate("Closer", "The Chainsmokers - Topic", Some(245))],
        )
}

fn start(recognizer: MockRecognizer, search: MockMediaSearch) -> Session {
    start_with(recognizer, search, MockPlaylistExpander::new(), MockPlaybackSink::new())
}

fn start_with(
    recognizer: MockRecognizer,
    search: MockMediaSearch,
    playlists: MockPlaylistExpander,
    sink: MockPlaybackSink,
) -> Session {
    let clock = ManualClock::new();
    let events = CollectorEventSink::new();
    let reporter = CollectingReporter::new();
    let providers = Providers::new(
        Arc::new(recognizer),
        Arc::new(search.clone()),
        Arc::new(sink.clone()),
    )
    .with_playlists(Arc::new(playlists))
    .with_clock(Arc::new(clock.clone()))
    .with_reporter(Arc::new(reporter.clone()));

    let handle = VoiceSession::start(&Config::default(), providers, Arc::new(events.clone()))
        .expect("default config starts");
    Session {
        handle,
        clock,
        events,
        sink,
        search,
        reporter,
    }
}

fn loud_frame() -> PcmFrame {
    PcmFrame::new(vec![3000; 1920], 48_000, 2)
}

/// One second of speech from each speaker, then enough silence to flush.
fn speak(session: &Session, speakers: &[SpeakerId]) {
    let consumer = session.handle.frame_consumer();
    for _ in 0..50 {
        for &speaker in speakers {
            consumer.consume(speaker, loud_frame());
        }
        session.clock.advance_ms(20);
    }
    session.clock.advance_ms(1_600);
}

fn reported(session: &Session, task: &str) -> bool {
    session.reporter.reports().iter().any(|(t, _)| t == task)
}

async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}

#[tokio::test(start_paused = true)]
async fn wake_and_song_in_one_utterance_starts_playback() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna mở bài believer");
    let s = start(recognizer, songs());

    speak(&s, &[1]);
    assert!(wait_for(|| !s.sink.played().is_empty()).await);

    assert_eq!(s.sink.played(), vec!["stream:page:Believer"]);
    assert_eq!(s.handle.now_playing().unwrap().title, "Believer");
    let events = s.events.events();
    assert!(events.contains(&SessionEvent::ListeningStarted { speaker: 1 }));
    assert!(wait_for(|| s.events.events().contains(&SessionEvent::WindowClosed {
        reason: WindowCloseReason::Completed
    }))
    .await);
    assert_eq!(s.handle.snapshot().lock_owner, None);

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn same_phrase_from_two_speakers_is_delivered_once() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna mở bài believer");
    let s = start(recognizer, songs());

    speak(&s, &[1, 2]);
    assert!(wait_for(|| !s.sink.played().is_empty()).await);
    // Give the second utterance time to finish recognition.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let recognized = s
        .events
        .count(|e| matches!(e, SessionEvent::PhraseRecognized { .. }));
    assert_eq!(recognized, 1);
    assert_eq!(
        s.events
            .count(|e| matches!(e, SessionEvent::TrackEnqueued { .. })),
        1
    );
    assert_eq!(s.sink.played().len(), 1);

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn voice_disconnect_clears_everything_at_once() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna disconnect");
    let s = start(recognizer, songs());

    s.handle.play_text("believer").await.unwrap();
    s.handle.play_text("closer").await.unwrap();
    assert_eq!(s.handle.queue_listing(), vec!["Closer"]);

    speak(&s, &[3]);
    assert!(wait_for(|| !s.handle.is_running()).await);

    let snapshot = s.handle.snapshot();
    assert!(!snapshot.connected);
    assert_eq!(snapshot.lock_owner, None);
    assert_eq!(snapshot.queued, 0);
    assert!(snapshot.current.is_none());
    assert!(s.sink.stops() >= 1);
    assert!(s.events.events().contains(&SessionEvent::Control {
        action: ControlAction::Disconnect,
        speaker: 3,
    }));

    assert!(s.handle.play_text("believer").await.is_err());
    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn handle_disconnect_during_open_window() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna");
    let s = start(recognizer, songs());

    s.handle.play_text("believer").await.unwrap();
    speak(&s, &[5]);
    assert!(wait_for(|| s.handle.snapshot().lock_owner == Some(5)).await);

    s.handle.disconnect();
    let snapshot = s.handle.snapshot();
    assert_eq!(snapshot.lock_owner, None);
    assert_eq!(snapshot.queued, 0);
    assert!(snapshot.current.is_none());
    assert!(!s.handle.is_running());
    assert!(wait_for(|| s.events.events().contains(&SessionEvent::WindowClosed {
        reason: WindowCloseReason::Disconnected
    }))
    .await);

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn finished_track_continues_with_queue() {
    let s = start(MockRecognizer::new(), songs());

    s.handle.play_text("believer").await.unwrap();
    s.handle.play_text("closer").await.unwrap();
    assert!(s.sink.finish_current());

    assert!(
        wait_for(|| s
            .handle
            .now_playing()
            .is_some_and(|entry| entry.title == "Closer"))
        .await
    );
    assert!(s.sink.finish_current());
    assert!(wait_for(|| s.events.events().contains(&SessionEvent::QueueFinished)).await);
    assert!(s.handle.now_playing().is_none());

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn playlist_with_broken_first_entry_plays_the_second() {
    let search = MockMediaSearch::new().with_resolve_failure("bad-id");
    let playlists = MockPlaylistExpander::new().with_playlist(
        "road-trip",
        vec![
            TrackSummary::new("Broken", "Nobody").with_media_id("bad-id"),
            TrackSummary::new("Works", "Somebody").with_media_id("good-id"),
            TrackSummary::new("Later", "Somebody").with_media_id("later-id"),
        ],
    );
    let s = start_with(MockRecognizer::new(), search, playlists, MockPlaybackSink::new());

    assert_eq!(s.handle.import_playlist("road-trip").await.unwrap(), 3);
    assert_eq!(s.handle.now_playing().unwrap().title, "Works");
    assert_eq!(s.handle.queue_listing(), vec!["Later"]);
    assert_eq!(s.search.resolved(), vec!["bad-id", "good-id"]);
    assert!(s.events.events().contains(&SessionEvent::PlaylistImported {
        playlist: "road-trip".into(),
        count: 3,
    }));

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn crashed_search_does_not_stop_later_requests() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna mở bài believer");
    let s = start(recognizer, songs().with_search_panics(1));

    speak(&s, &[1]);
    assert!(wait_for(|| reported(&s, "resolution")).await);
    assert!(wait_for(|| s.handle.snapshot().lock_owner.is_none()).await);
    assert!(s.sink.played().is_empty());

    s.clock.advance_ms(60_000);
    speak(&s, &[1]);
    assert!(wait_for(|| !s.sink.played().is_empty()).await);
    assert_eq!(s.sink.played(), vec!["stream:page:Believer"]);
    assert!(s.handle.is_running());

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn crashed_sink_does_not_stop_later_requests() {
    let recognizer = MockRecognizer::new().with_response("vi-VN", "luna mở bài believer");
    let sink = MockPlaybackSink::new().with_play_panic("stream:page:Believer");
    let s = start_with(recognizer, songs(), MockPlaylistExpander::new(), sink);

    speak(&s, &[1]);
    assert!(wait_for(|| reported(&s, "playback")).await);
    assert!(wait_for(|| s.handle.snapshot().lock_owner.is_none()).await);
    assert!(s.handle.now_playing().is_none());

    s.clock.advance_ms(60_000);
    speak(&s, &[1]);
    assert!(wait_for(|| !s.sink.played().is_empty()).await);
    assert_eq!(s.sink.played(), vec!["stream:page:Believer"]);

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn crashed_sink_during_continuation_keeps_the_queue_alive() {
    let sink = MockPlaybackSink::new().with_play_panic("stream:page:Closer");
    let s = start_with(MockRecognizer::new(), songs(), MockPlaylistExpander::new(), sink);

    s.handle.play_text("believer").await.unwrap();
    s.handle.play_text("closer").await.unwrap();
    assert!(s.sink.finish_current());
    assert!(wait_for(|| reported(&s, "playback")).await);
    assert!(wait_for(|| s.handle.now_playing().is_none()).await);

    s.handle.play_text("closer").await.unwrap();
    assert_eq!(
        s.sink.played(),
        vec!["stream:page:Believer", "stream:page:Closer"]
    );

    s.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn text_request_goes_through_the_filter() {
    let s = start(MockRecognizer::new(), songs());

    let result = s.handle.play_text("aaaaaaaaaa").await;
    assert!(matches!(result, Err(VoiceDjError::Rejected { .. })));
    assert_eq!(
        s.events
            .count(|e| matches!(e, SessionEvent::RequestRejected { .. })),
        1
    );
    assert!(s.sink.played().is_empty());

    assert_eq!(s.handle.play_text("play believer").await.unwrap(), 1);
    assert_eq!(s.sink.played(), vec!["stream:page:Believer"]);

    s.handle.shutdown().await;
}

#[tokio::test]
async fn invalid_config_refuses_to_start() {
    let mut config = Config::default();
    config.commands.window_secs = 0;
    let providers = Providers::new(
        Arc::new(MockRecognizer::new()),
        Arc::new(MockMediaSearch::new()),
        Arc::new(MockPlaybackSink::new()),
    );
    let result = VoiceSession::start(&config, providers, Arc::new(CollectorEventSink::new()));
    assert!(matches!(
        result,
        Err(VoiceDjError::ConfigInvalidValue { .. })
    ));
}
