//! End-to-end reassembly scenarios driven through raw wire messages.

use std::sync::{Arc, Mutex};

use voxrelay::client::codec::encode_base64;
use voxrelay::client::{
    AudioClip, AudioParams, MessageKind, PlaybackSink, RenderSink, StreamReassembler,
};
use voxrelay::config::DeltaEncoding;

/// Records every render call for later assertions.
#[derive(Debug, Default)]
struct Recorded {
    updates: Vec<String>,
    messages: Vec<(String, String)>,
    transcripts: Vec<String>,
    audio_entries: usize,
    closes: usize,
}

#[derive(Clone, Default)]
struct RecordingRender(Arc<Mutex<Recorded>>);

impl RenderSink for RecordingRender {
    fn append_message(&mut self, sender: &str, text: &str, _kind: MessageKind) {
        let mut r = self.0.lock().unwrap();
        r.messages.push((sender.to_string(), text.to_string()));
    }

    fn update_last_message(&mut self, text: &str) {
        self.0.lock().unwrap().updates.push(text.to_string());
    }

    fn append_audio_message(&mut self, _sender: &str, _clip: &AudioClip) {
        self.0.lock().unwrap().audio_entries += 1;
    }

    fn update_transcript(&mut self, text: &str) {
        self.0.lock().unwrap().transcripts.push(text.to_string());
    }

    fn close_last_message(&mut self) {
        self.0.lock().unwrap().closes += 1;
    }
}

#[derive(Clone, Default)]
struct RecordingPlayback(Arc<Mutex<Vec<AudioClip>>>);

impl PlaybackSink for RecordingPlayback {
    fn play(&mut self, clip: AudioClip) {
        self.0.lock().unwrap().push(clip);
    }
}

fn reassembler(
    encoding: DeltaEncoding,
) -> (StreamReassembler, Arc<Mutex<Recorded>>, Arc<Mutex<Vec<AudioClip>>>) {
    let render = RecordingRender::default();
    let playback = RecordingPlayback::default();
    let recorded = render.0.clone();
    let clips = playback.0.clone();
    let r = StreamReassembler::new(
        encoding,
        AudioParams::default(),
        Box::new(render),
        Box::new(playback),
    );
    (r, recorded, clips)
}

fn text_delta(delta: &str) -> String {
    format!(r#"{{"type":"response.text.delta","delta":{}}}"#, serde_json::to_string(delta).unwrap())
}

fn audio_delta(payload: &[u8]) -> String {
    format!(r#"{{"type":"response.audio.delta","delta":"{}"}}"#, encode_base64(payload))
}

#[test]
fn test_text_updates_grow_by_prefix() {
    let (mut r, recorded, _) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(&text_delta("Hel"));
    r.handle_raw(&text_delta("lo, "));
    r.handle_raw(&text_delta("world"));

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.updates, vec!["Hel", "Hello, ", "Hello, world"]);
    for pair in recorded.updates.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }
}

#[test]
fn test_text_done_closes_message_and_resets() {
    let (mut r, recorded, _) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(&text_delta("first"));
    r.handle_raw(r#"{"type":"response.text.done","text":"first"}"#);
    r.handle_raw(&text_delta("second"));

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.closes, 1);
    // After done the accumulator restarts from empty
    assert_eq!(recorded.updates.last().unwrap(), "second");
}

#[test]
fn test_response_done_resets_text_without_text_done() {
    let (mut r, recorded, _) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(&text_delta("abandoned"));
    r.handle_raw(r#"{"type":"response.done","response":{}}"#);
    r.handle_raw(&text_delta("fresh"));

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.updates.last().unwrap(), "fresh");
}

#[test]
fn test_transcript_and_text_are_independent() {
    let (mut r, recorded, _) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(&text_delta("typed"));
    r.handle_raw(r#"{"type":"response.audio_transcript.delta","delta":"spoken"}"#);
    r.handle_raw(r#"{"type":"response.audio_transcript.delta","delta":" words"}"#);
    r.handle_raw(r#"{"type":"response.audio_transcript.done","transcript":"spoken words"}"#);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.transcripts, vec!["spoken", "spoken words"]);
    assert_eq!(recorded.messages, vec![("assistant".to_string(), "spoken words".to_string())]);
    // Text projection untouched by transcript traffic
    assert_eq!(recorded.updates, vec!["typed"]);
}

#[test]
fn test_interleaved_text_and_audio_deltas_do_not_interfere() {
    let (mut r, recorded, clips) = reassembler(DeltaEncoding::Pcm16);

    // One response interleaving the two kinds; neither accumulator may see
    // the other's deltas.
    r.handle_raw(&text_delta("he"));
    r.handle_raw(&audio_delta(&[1, 0, 2, 0]));
    r.handle_raw(&text_delta("llo"));
    r.handle_raw(&audio_delta(&[3, 0, 4, 0]));
    r.handle_raw(r#"{"type":"response.text.done","text":"hello"}"#);
    r.handle_raw(r#"{"type":"response.audio.done"}"#);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.updates, vec!["he", "hello", "hello"]);
    for pair in recorded.updates.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }

    let clips = clips.lock().unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(&clips[0].wav[44..], &[1, 0, 2, 0, 3, 0, 4, 0]);
}

#[test]
fn test_unknown_event_is_a_no_op() {
    let (mut r, recorded, clips) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(r#"{"type":"response.future_thing.delta","delta":"??"}"#);
    r.handle_raw(&text_delta("still fine"));

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.updates, vec!["still fine"]);
    assert!(clips.lock().unwrap().is_empty());
}

#[test]
fn test_pcm16_audio_pipeline_preserves_order() {
    let (mut r, recorded, clips) = reassembler(DeltaEncoding::Pcm16);

    // Two fragments of little-endian PCM16: [1, 2] then [3, 4]
    r.handle_raw(&audio_delta(&[1, 0, 2, 0]));
    r.handle_raw(&audio_delta(&[3, 0, 4, 0]));
    r.handle_raw(r#"{"type":"response.audio.done"}"#);

    let clips = clips.lock().unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(recorded.lock().unwrap().audio_entries, 1);

    let wav = &clips[0].wav;
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(wav.len(), 44 + 8);

    // Payload order matches delta arrival order
    let payload = &wav[44..];
    assert_eq!(payload, &[1, 0, 2, 0, 3, 0, 4, 0]);
}

#[test]
fn test_float32_encoding_decodes_fragments() {
    let (mut r, _, clips) = reassembler(DeltaEncoding::Float32);

    let mut bytes = Vec::new();
    for sample in [0.0f32, 0.5, -0.5] {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    r.handle_raw(&audio_delta(&bytes));
    r.handle_raw(r#"{"type":"response.audio.done"}"#);

    let clips = clips.lock().unwrap();
    assert_eq!(clips.len(), 1);
    // 3 samples of PCM16 payload
    assert_eq!(clips[0].payload_len(), 6);
}

#[test]
fn test_empty_text_done_creates_nothing() {
    let (mut r, recorded, _) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(r#"{"type":"response.text.done","text":""}"#);

    let recorded = recorded.lock().unwrap();
    assert!(recorded.updates.is_empty());
    assert!(recorded.messages.is_empty());
    assert_eq!(recorded.closes, 0);
}

#[test]
fn test_partial_audio_is_discarded_on_drop() {
    let (mut r, recorded, clips) = reassembler(DeltaEncoding::Pcm16);

    r.handle_raw(&audio_delta(&[1, 0, 2, 0]));
    drop(r);

    assert!(clips.lock().unwrap().is_empty());
    assert_eq!(recorded.lock().unwrap().audio_entries, 0);
}
