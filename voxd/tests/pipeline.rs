mod support;

use fx::Board;
use notify::Notifier;
use support::{CollectingOut, FakeSynth, RecordingSink, CHUNK_SAMPLES};
use tokio::sync::mpsc;
use tokio::task;
use voxd::pipeline::{playback_stage, synthesis_stage, AudioCommand, TextCommand, TAIL_SECONDS};

const RATE: u32 = 44100;

fn tail_bytes() -> usize {
    (RATE as f64 * TAIL_SECONDS) as usize * 2
}

#[tokio::test(flavor = "multi_thread")]
async fn every_chunk_is_followed_by_one_tail_in_order() {
    let (texts_tx, texts_rx) = mpsc::unbounded_channel();
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let sink = RecordingSink::default();
    let notifier = Notifier::spawn(sink.clone());
    let notify_handle = notifier.handle();
    let out = CollectingOut::default();
    let play_out = out.clone();

    texts_tx
        .send(TextCommand::Speak("one two".to_string()))
        .unwrap();
    texts_tx
        .send(TextCommand::Speak("three".to_string()))
        .unwrap();
    texts_tx.send(TextCommand::Stop).unwrap();

    let synth_worker = task::spawn_blocking(move || {
        synthesis_stage(
            FakeSynth { rate: RATE },
            Board::new(vec![]),
            1.0,
            texts_rx,
            audio_tx,
            notify_handle,
        )
    });
    let play_worker = task::spawn_blocking(move || playback_stage(play_out, audio_rx));

    synth_worker.await.unwrap();
    play_worker.await.unwrap().unwrap();
    notifier.shutdown().await;

    let buffers = out.buffers();
    // 2 chunks + tail, then 1 chunk + tail, never interleaved
    assert_eq!(buffers.len(), 5);
    assert_eq!(buffers[0].len(), CHUNK_SAMPLES * 2);
    assert_eq!(buffers[1].len(), CHUNK_SAMPLES * 2);
    assert_eq!(buffers[2].len(), tail_bytes());
    assert_eq!(buffers[3].len(), CHUNK_SAMPLES * 2);
    assert_eq!(buffers[4].len(), tail_bytes());

    // one notification per chunk, each carrying the full utterance text
    assert_eq!(sink.creates(), 3);
    let full_reveals: Vec<_> = sink
        .updates()
        .into_iter()
        .filter(|u| *u == "one two" || *u == "three")
        .collect();
    assert_eq!(full_reveals, vec!["one two", "one two", "three"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_synthesis_skips_the_utterance_only() {
    let (texts_tx, texts_rx) = mpsc::unbounded_channel();
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let sink = RecordingSink::default();
    let notifier = Notifier::spawn(sink.clone());
    let notify_handle = notifier.handle();
    let out = CollectingOut::default();
    let play_out = out.clone();

    texts_tx
        .send(TextCommand::Speak("bad text".to_string()))
        .unwrap();
    texts_tx
        .send(TextCommand::Speak("good".to_string()))
        .unwrap();
    texts_tx.send(TextCommand::Stop).unwrap();

    let synth_worker = task::spawn_blocking(move || {
        synthesis_stage(
            FakeSynth { rate: RATE },
            Board::new(vec![]),
            1.0,
            texts_rx,
            audio_tx,
            notify_handle,
        )
    });
    let play_worker = task::spawn_blocking(move || playback_stage(play_out, audio_rx));

    synth_worker.await.unwrap();
    play_worker.await.unwrap().unwrap();
    notifier.shutdown().await;

    // nothing attributable to the bad utterance, the good one is intact
    let buffers = out.buffers();
    assert_eq!(buffers.len(), 2);
    assert_eq!(buffers[0].len(), CHUNK_SAMPLES * 2);
    assert_eq!(buffers[1].len(), tail_bytes());
    assert_eq!(sink.creates(), 1);
    assert!(sink.updates().contains(&"good".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_sentinel_is_forwarded_to_playback() {
    let (texts_tx, texts_rx) = mpsc::unbounded_channel();
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let notifier = Notifier::spawn(RecordingSink::default());
    let notify_handle = notifier.handle();

    texts_tx.send(TextCommand::Stop).unwrap();
    let synth_worker = task::spawn_blocking(move || {
        synthesis_stage(
            FakeSynth { rate: RATE },
            Board::new(vec![]),
            1.0,
            texts_rx,
            audio_tx,
            notify_handle,
        )
    });
    synth_worker.await.unwrap();

    // the playback queue ends with the forwarded sentinel even though the
    // coordinator never touched it
    let play_worker =
        task::spawn_blocking(move || playback_stage(CollectingOut::default(), audio_rx));
    play_worker.await.unwrap().unwrap();
    notifier.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn device_error_ends_the_playback_stage() {
    let (audio_tx, audio_rx) = mpsc::unbounded_channel::<AudioCommand>();
    audio_tx
        .send(AudioCommand::Play(vec![0u8; 64]))
        .unwrap();

    let out = CollectingOut::failing();
    let play_worker = task::spawn_blocking(move || playback_stage(out, audio_rx));
    let result = play_worker.await.unwrap();
    assert!(result.is_err());
}
