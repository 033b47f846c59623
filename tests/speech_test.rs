//! Speak controller integration tests
//!
//! Drives the controller with an in-memory engine, sink and notifier so the
//! full synthesis-to-playback cycle can be checked without audio hardware.

use speakpad::audio::{AudioFormat, DeviceHandle, OutputDeviceRegistry, OutputSink, PcmBuffer};
use speakpad::audio::PCM_FORMAT;
use speakpad::notify::Notifier;
use speakpad::speech::{
    create_backend, BackendOptions, EngineKind, EngineOutput, SpeakController, SpeakOutcome,
    SpeakRequest, SynthesisEngine,
};
use speakpad::{Result, SpeakpadError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

/// Everything the fakes observed, in order
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    notifications: Mutex<Vec<String>>,
    frees: AtomicUsize,
    sinks_opened: AtomicUsize,
    sinks_alive: AtomicUsize,
}

impl Recorder {
    fn event(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
enum Reply {
    Pcm(Vec<u8>),
    NullBuffer,
    Fail,
}

struct FakeOutput {
    data: Option<Vec<u8>>,
    recorder: Arc<Recorder>,
}

impl EngineOutput for FakeOutput {
    fn bytes(&self) -> Option<&[u8]> {
        self.recorder.event("read");
        self.data.as_deref()
    }

    fn free(self: Box<Self>) {
        self.recorder.frees.fetch_add(1, Ordering::SeqCst);
        self.recorder.event("free");
    }
}

/// Blocks synthesis until the test lets it continue
struct Gate {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

struct FakeEngine {
    reply: Reply,
    recorder: Arc<Recorder>,
    gate: Option<Gate>,
}

impl SynthesisEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Box<dyn EngineOutput>> {
        self.recorder
            .calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice.map(str::to_string)));

        if let Some(gate) = &self.gate {
            gate.entered.lock().unwrap().send(()).unwrap();
            gate.release.lock().unwrap().recv().unwrap();
        }

        let data = match self.reply.clone() {
            Reply::Pcm(data) => Some(data),
            Reply::NullBuffer => None,
            Reply::Fail => return Err(SpeakpadError::Speech("engine crashed".to_string())),
        };
        Ok(Box::new(FakeOutput {
            data,
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakeSink {
    format: AudioFormat,
    recorder: Arc<Recorder>,
}

impl OutputSink for FakeSink {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn start(&mut self, pcm: &PcmBuffer) -> Result<()> {
        self.recorder.event(format!("start {}", pcm.len()));
        Ok(())
    }

    fn release(&mut self) {
        self.recorder.event("release");
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        self.recorder.sinks_alive.fetch_sub(1, Ordering::SeqCst);
        self.recorder.event("drop sink");
    }
}

struct FakeRegistry {
    recorder: Arc<Recorder>,
    broken: Option<&'static str>,
}

impl OutputDeviceRegistry for FakeRegistry {
    fn list_output_devices(&self) -> Result<Vec<DeviceHandle>> {
        Ok(vec![speakers(), DeviceHandle::new("Headphones")])
    }

    fn default_device(&self) -> Option<DeviceHandle> {
        Some(speakers())
    }

    fn open_sink(&self, device: &DeviceHandle, format: AudioFormat) -> Result<Box<dyn OutputSink>> {
        if self.broken == Some(device.name.as_str()) {
            return Err(SpeakpadError::DeviceUnavailable(format!(
                "{} is unplugged",
                device.name
            )));
        }
        assert_eq!(format, PCM_FORMAT);
        self.recorder.sinks_opened.fetch_add(1, Ordering::SeqCst);
        self.recorder.sinks_alive.fetch_add(1, Ordering::SeqCst);
        self.recorder.event(format!("open {}", device.name));
        Ok(Box::new(FakeSink {
            format,
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakeNotifier {
    recorder: Arc<Recorder>,
}

impl Notifier for FakeNotifier {
    fn notify_error(&self, title: &str, _message: &str) {
        self.recorder.notifications.lock().unwrap().push(title.to_string());
    }
}

fn speakers() -> DeviceHandle {
    DeviceHandle {
        name: "Speakers".to_string(),
        is_default: true,
    }
}

fn build(recorder: &Arc<Recorder>, engine: FakeEngine, broken: Option<&'static str>) -> SpeakController {
    SpeakController::new(
        Box::new(engine),
        Box::new(FakeRegistry {
            recorder: recorder.clone(),
            broken,
        }),
        Box::new(FakeNotifier {
            recorder: recorder.clone(),
        }),
    )
}

fn engine(recorder: &Arc<Recorder>, reply: Reply) -> FakeEngine {
    FakeEngine {
        reply,
        recorder: recorder.clone(),
        gate: None,
    }
}

/// Controller with the default device already selected
fn ready_controller(recorder: &Arc<Recorder>, reply: Reply) -> SpeakController {
    let controller = build(recorder, engine(recorder, reply), None);
    controller.select_device(&speakers()).unwrap();
    controller
}

#[test]
fn test_speak_with_default_voice() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Pcm(vec![1, 0, 2, 0]));

    let outcome = controller.speak(SpeakRequest::new("Hello", ""));

    match outcome {
        SpeakOutcome::Playing { bytes, .. } => assert_eq!(bytes, 4),
        other => panic!("expected playback, got {:?}", other),
    }
    assert_eq!(recorder.calls(), vec![("Hello".to_string(), None)]);
    assert_eq!(recorder.frees(), 1);
    // Copied before the engine memory is freed, freed before playback starts
    assert_eq!(
        recorder.events(),
        vec!["open Speakers", "read", "free", "release", "start 4"]
    );
    assert!(recorder.notifications().is_empty());
    assert!(controller.is_ready());
}

#[test]
fn test_named_voice_is_passed_through() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Pcm(vec![0; 8]));

    assert!(controller
        .speak(SpeakRequest::new("Hi there", "en-us"))
        .is_playing());
    assert_eq!(
        recorder.calls(),
        vec![("Hi there".to_string(), Some("en-us".to_string()))]
    );
}

#[test]
fn test_empty_text_is_skipped() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Pcm(vec![0; 4]));

    let outcome = controller.speak(SpeakRequest::new("", "en-us"));

    assert!(matches!(outcome, SpeakOutcome::Skipped));
    assert!(recorder.calls().is_empty());
    assert_eq!(recorder.events(), vec!["open Speakers"]);
    assert!(recorder.notifications().is_empty());
    assert!(controller.is_ready());
}

#[test]
fn test_engine_failure_is_reported() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Fail);

    let outcome = controller.speak(SpeakRequest::new("Hello", ""));

    assert!(matches!(
        outcome,
        SpeakOutcome::Failed(SpeakpadError::SynthesisFailed(_))
    ));
    assert_eq!(recorder.notifications(), vec!["Failed to create speech"]);
    assert_eq!(recorder.frees(), 0);
    assert!(!recorder.events().iter().any(|e| e.starts_with("start")));
    assert!(controller.is_ready());
}

#[test]
fn test_empty_engine_output_is_freed_and_reported() {
    for reply in [Reply::Pcm(Vec::new()), Reply::NullBuffer, Reply::Pcm(vec![1, 2, 3])] {
        let recorder = Arc::new(Recorder::default());
        let controller = ready_controller(&recorder, reply);

        let outcome = controller.speak(SpeakRequest::new("Hello", ""));

        assert!(matches!(
            outcome,
            SpeakOutcome::Failed(SpeakpadError::SynthesisFailed(_))
        ));
        assert_eq!(recorder.frees(), 1);
        assert_eq!(recorder.notifications(), vec!["Failed to create speech"]);
        assert_eq!(recorder.events(), vec!["open Speakers", "read", "free"]);
        assert!(controller.is_ready());
    }
}

#[test]
fn test_each_speak_replaces_the_previous_buffer() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Pcm(vec![0; 6]));

    assert!(controller.speak(SpeakRequest::new("one", "")).is_playing());
    assert!(controller.speak(SpeakRequest::new("two", "")).is_playing());

    let events = recorder.events();
    assert_eq!(
        &events[1..],
        &["read", "free", "release", "start 6", "read", "free", "release", "start 6"]
    );
    assert_eq!(recorder.frees(), 2);
}

#[test]
fn test_device_change_during_playback() {
    let recorder = Arc::new(Recorder::default());
    let controller = ready_controller(&recorder, Reply::Pcm(vec![0; 4]));
    assert!(controller.speak(SpeakRequest::new("Hello", "")).is_playing());

    controller
        .select_device(&DeviceHandle::new("Headphones"))
        .unwrap();

    assert_eq!(recorder.sinks_opened.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.sinks_alive.load(Ordering::SeqCst), 1);
    let events = recorder.events();
    let dropped = events.iter().position(|e| e == "drop sink").unwrap();
    let reopened = events.iter().position(|e| e == "open Headphones").unwrap();
    assert!(dropped < reopened);

    // The next speak plays through the new sink
    assert!(controller.speak(SpeakRequest::new("Again", "")).is_playing());
    assert_eq!(recorder.events().last().unwrap(), "start 4");
}

#[test]
fn test_failed_device_leaves_no_output() {
    let recorder = Arc::new(Recorder::default());
    let controller = build(&recorder, engine(&recorder, Reply::Pcm(vec![0; 4])), Some("Headphones"));
    controller.select_device(&speakers()).unwrap();

    let result = controller.select_device(&DeviceHandle::new("Headphones"));
    assert!(matches!(result, Err(SpeakpadError::DeviceUnavailable(_))));
    assert_eq!(recorder.sinks_alive.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.notifications(), vec!["Failed to open audio output"]);

    let outcome = controller.speak(SpeakRequest::new("Hello", ""));
    assert!(matches!(
        outcome,
        SpeakOutcome::Failed(SpeakpadError::DeviceUnavailable(_))
    ));
    assert_eq!(
        recorder.notifications(),
        vec!["Failed to open audio output", "Failed to play speech"]
    );
    // Engine output was still copied and freed
    assert_eq!(recorder.frees(), 1);
    assert!(controller.is_ready());
}

#[test]
fn test_no_device_selected() {
    let recorder = Arc::new(Recorder::default());
    let controller = build(&recorder, engine(&recorder, Reply::Pcm(vec![0; 4])), None);

    let outcome = controller.speak(SpeakRequest::new("Hello", ""));

    assert!(matches!(
        outcome,
        SpeakOutcome::Failed(SpeakpadError::DeviceUnavailable(_))
    ));
    assert_eq!(recorder.notifications(), vec!["Failed to play speech"]);
}

#[test]
fn test_second_speak_is_rejected_while_busy() {
    let recorder = Arc::new(Recorder::default());
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let engine = FakeEngine {
        reply: Reply::Pcm(vec![0; 4]),
        recorder: recorder.clone(),
        gate: Some(Gate {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }),
    };
    let controller = Arc::new(build(&recorder, engine, None));
    controller.select_device(&speakers()).unwrap();

    let first = {
        let controller = controller.clone();
        thread::spawn(move || controller.speak(SpeakRequest::new("first", "")))
    };

    // Wait until the first request is inside the engine
    entered_rx.recv().unwrap();
    assert!(!controller.is_ready());

    let second = controller.speak(SpeakRequest::new("second", ""));
    assert!(matches!(second, SpeakOutcome::Rejected));

    release_tx.send(()).unwrap();
    assert!(first.join().unwrap().is_playing());

    assert_eq!(recorder.calls(), vec![("first".to_string(), None)]);
    assert!(controller.is_ready());
}

#[test]
fn test_backend_detection() {
    // Depends on what is installed; may fail in CI
    match create_backend(EngineKind::Auto, &BackendOptions::default()) {
        Ok(backend) => println!("✓ Speech backend available: {}", backend.name()),
        Err(e) => println!("⚠ No speech backend (may be expected): {}", e),
    }
}
