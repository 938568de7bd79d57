//! Silence Monitor
//!
//! Überwacht die Sprachaktivität aller Tracks eines Anrufs und meldet
//! einmalig, wenn der gesamte Anruf länger als die konfigurierte
//! Stilledauer ruhig war.
//!
//! Es gibt genau zwei Timer: den Stille-Timer und den Debounce-Timer.
//! Jeder Re-Arm bricht den vorherigen Timer ab, bevor ein neuer geplant
//! wird. Alle Zustandsänderungen laufen unter einem Lock.

use super::config::{ConfigError, MonitorConfig};
use super::track::TrackHandle;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ============================================================================
// MONITOR STATE
// ============================================================================

/// Betriebszustand des Monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Keine Überwachung, keine Timer
    Idle,
    /// Anruf verbunden, Stille wird gemessen
    Monitoring,
}

/// Events die vom SilenceMonitor ausgelöst werden
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    StateChanged(MonitorState),
    /// Aktivitäts-Uhr wurde zurückgesetzt
    ActivityReset { at: Instant },
    /// Stille-Fenster ist ohne Aktivität abgelaufen
    SilenceExceeded { silent_for: Duration },
}

/// Callback für das Stille-Event
pub type SilenceCallback = Arc<dyn Fn(Duration) + Send + Sync>;

// ============================================================================
// TIMER SLOTS
// ============================================================================

/// Ein geplanter, abbrechbarer Callback
struct PendingTimer {
    id: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl PendingTimer {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Clone, Copy)]
enum TimerKind {
    Silence,
    Debounce,
}

struct MonitorInner {
    state: MonitorState,
    tracks: HashSet<TrackHandle>,
    last_activity_at: Option<Instant>,
    silence_timer: Option<PendingTimer>,
    debounce_timer: Option<PendingTimer>,
    next_timer_id: u64,
}

impl MonitorInner {
    fn new() -> Self {
        Self {
            state: MonitorState::Idle,
            tracks: HashSet::new(),
            last_activity_at: None,
            silence_timer: None,
            debounce_timer: None,
            next_timer_id: 0,
        }
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<PendingTimer> {
        match kind {
            TimerKind::Silence => &mut self.silence_timer,
            TimerKind::Debounce => &mut self.debounce_timer,
        }
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(timer) = self.slot(kind).take() {
            timer.cancel();
        }
    }

    fn cancel_all_timers(&mut self) {
        self.cancel_timer(TimerKind::Silence);
        self.cancel_timer(TimerKind::Debounce);
    }

    /// Entfernt den Timer aus seinem Slot, falls er noch der aktuelle ist
    fn claim_timer(&mut self, kind: TimerKind, id: u64) -> bool {
        let slot = self.slot(kind);
        if slot.as_ref().is_some_and(|timer| timer.id == id) {
            // Der Task läuft gerade selbst, daher nur lösen, nicht abbrechen
            *slot = None;
            true
        } else {
            false
        }
    }
}

struct Shared {
    config: MonitorConfig,
    inner: Mutex<MonitorInner>,
    event_tx: broadcast::Sender<MonitorEvent>,
    on_silence: Mutex<Option<SilenceCallback>>,
}

impl Shared {
    /// Plant einen Timer und ersetzt den bisherigen im gleichen Slot
    fn arm(self: &Arc<Self>, inner: &mut MonitorInner, kind: TimerKind, deadline: Instant) {
        inner.cancel_timer(kind);

        inner.next_timer_id += 1;
        let id = inner.next_timer_id;
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(shared) = weak.upgrade() {
                match kind {
                    TimerKind::Silence => shared.on_silence_timer(id),
                    TimerKind::Debounce => shared.on_debounce_timer(id, deadline),
                }
            }
        });

        *inner.slot(kind) = Some(PendingTimer {
            id,
            deadline,
            handle,
        });
    }

    /// Setzt die Aktivitäts-Uhr auf `at` und startet ein neues Stille-Fenster
    fn reset_activity(self: &Arc<Self>, inner: &mut MonitorInner, at: Instant) -> Instant {
        inner.last_activity_at = Some(at);
        self.arm(inner, TimerKind::Silence, at + self.config.silence_threshold());
        at
    }

    /// Der Reset gilt zum geplanten Zeitpunkt, nicht zum Aufwachzeitpunkt des Tasks
    fn on_debounce_timer(self: &Arc<Self>, id: u64, deadline: Instant) {
        let mut inner = self.inner.lock();
        if !inner.claim_timer(TimerKind::Debounce, id) || inner.state != MonitorState::Monitoring {
            return;
        }

        let at = self.reset_activity(&mut inner, deadline);
        tracing::debug!("Debounced activity reset");
        let _ = self.event_tx.send(MonitorEvent::ActivityReset { at });
    }

    fn on_silence_timer(self: &Arc<Self>, id: u64) {
        let silent_for = {
            let mut inner = self.inner.lock();
            if !inner.claim_timer(TimerKind::Silence, id)
                || inner.state != MonitorState::Monitoring
            {
                return;
            }

            let silent_for = inner
                .last_activity_at
                .map(|at| at.elapsed())
                .unwrap_or_default();
            let _ = self
                .event_tx
                .send(MonitorEvent::SilenceExceeded { silent_for });
            silent_for
        };

        tracing::warn!("Silence exceeded after {:?}", silent_for);

        // Callback ohne Lock aufrufen, er darf stop() aufrufen
        let callback = self.on_silence.lock().clone();
        if let Some(callback) = callback {
            callback(silent_for);
        }
    }
}

// ============================================================================
// SILENCE MONITOR
// ============================================================================

/// Stille-Erkennung für einen einzelnen Anruf
///
/// Muss innerhalb einer Tokio-Runtime benutzt werden, da Timer als
/// Tasks geplant werden.
pub struct SilenceMonitor {
    shared: Arc<Shared>,
}

impl SilenceMonitor {
    /// Erstellt einen neuen Monitor im Zustand `Idle`
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Monitor mit den Standardwerten (30s Stille, 0.05 Pegel, 500ms Debounce)
    pub fn with_defaults() -> Self {
        Self::from_validated(MonitorConfig::default())
    }

    fn from_validated(config: MonitorConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(MonitorInner::new()),
                event_tx,
                on_silence: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Gibt einen Event-Receiver zurück
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Registriert den Callback für das Stille-Event (ersetzt einen vorherigen)
    pub fn on_silence<F>(&self, callback: F)
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        *self.shared.on_silence.lock() = Some(Arc::new(callback));
    }

    /// Startet die Überwachung
    ///
    /// Läuft die Überwachung bereits, startet das Stille-Fenster neu.
    pub fn start(&self) {
        let mut inner = self.shared.inner.lock();
        let was_idle = inner.state == MonitorState::Idle;
        inner.state = MonitorState::Monitoring;

        let at = self.shared.reset_activity(&mut inner, Instant::now());

        if was_idle {
            tracing::info!(
                "Silence monitoring started ({}ms threshold)",
                self.shared.config.silence_threshold_ms
            );
            let _ = self
                .shared
                .event_tx
                .send(MonitorEvent::StateChanged(MonitorState::Monitoring));
        } else {
            let _ = self.shared.event_tx.send(MonitorEvent::ActivityReset { at });
        }
    }

    /// Beendet die Überwachung, bricht alle Timer ab und vergisst alle Tracks
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        inner.cancel_all_timers();
        inner.tracks.clear();
        inner.last_activity_at = None;

        if inner.state == MonitorState::Monitoring {
            inner.state = MonitorState::Idle;
            tracing::info!("Silence monitoring stopped");
            let _ = self
                .shared
                .event_tx
                .send(MonitorEvent::StateChanged(MonitorState::Idle));
        }
    }

    /// Fügt einen Track hinzu
    ///
    /// Ein neuer Track zählt während der Überwachung sofort als Aktivität.
    /// Gibt `false` zurück wenn der Track bereits bekannt war.
    pub fn add_track(&self, track: TrackHandle) -> bool {
        let mut inner = self.shared.inner.lock();
        if inner.tracks.contains(&track) {
            return false;
        }

        tracing::debug!("Track added: {}", track);
        inner.tracks.insert(track);

        if inner.state == MonitorState::Monitoring {
            let at = self.shared.reset_activity(&mut inner, Instant::now());
            let _ = self.shared.event_tx.send(MonitorEvent::ActivityReset { at });
        }
        true
    }

    /// Entfernt einen Track; Timer bleiben unverändert
    pub fn remove_track(&self, track: &TrackHandle) -> bool {
        let removed = self.shared.inner.lock().tracks.remove(track);
        if removed {
            tracing::debug!("Track removed: {}", track);
        }
        removed
    }

    /// Meldet einen Pegel-Sample eines Tracks
    ///
    /// Samples über dem Schwellwert planen einen Reset nach Ablauf des
    /// Debounce. Weitere Samples ersetzen den Timer, behalten aber die Frist
    /// des ersten ausstehenden Samples: ein Burst ergibt genau einen Reset,
    /// spätestens `debounce_ms` nach seinem Beginn. Dadurch darf der Takt
    /// des Aufrufers auch kürzer als der Debounce sein. Unbekannte Tracks
    /// werden implizit aufgenommen. Im Zustand `Idle` wirkungslos.
    pub fn report_level(&self, track: &TrackHandle, level: f32) {
        let mut inner = self.shared.inner.lock();
        if inner.state != MonitorState::Monitoring {
            return;
        }

        if !inner.tracks.contains(track) {
            tracing::debug!("Implicitly tracking {}", track);
            inner.tracks.insert(track.clone());
        }

        // NaN zählt als Stille
        if level.is_nan() || level <= self.shared.config.activity_level_threshold {
            return;
        }

        let deadline = match &inner.debounce_timer {
            Some(pending) => pending.deadline,
            None => Instant::now() + self.shared.config.debounce(),
        };
        self.shared.arm(&mut inner, TimerKind::Debounce, deadline);
    }

    /// Sofortiger Reset ohne Debounce (z.B. lokaler Nutzer entstummt sich)
    pub fn record_activity(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.state != MonitorState::Monitoring {
            return;
        }

        // Ein ausstehender Debounce darf danach keinen zweiten Reset mehr auslösen
        inner.cancel_timer(TimerKind::Debounce);
        let at = self.shared.reset_activity(&mut inner, Instant::now());
        let _ = self.shared.event_tx.send(MonitorEvent::ActivityReset { at });
    }

    pub fn state(&self) -> MonitorState {
        self.shared.inner.lock().state
    }

    pub fn is_monitoring(&self) -> bool {
        self.state() == MonitorState::Monitoring
    }

    pub fn tracked_track_count(&self) -> usize {
        self.shared.inner.lock().tracks.len()
    }

    pub fn is_tracking(&self, track: &TrackHandle) -> bool {
        self.shared.inner.lock().tracks.contains(track)
    }

    pub fn last_activity_at(&self) -> Option<Instant> {
        self.shared.inner.lock().last_activity_at
    }

    /// Zeit seit der letzten Aktivität
    pub fn silence_elapsed(&self) -> Option<Duration> {
        self.last_activity_at().map(|at| at.elapsed())
    }

    /// Verbleibende Zeit bis zum Stille-Event, falls ein Fenster läuft
    pub fn time_until_silence(&self) -> Option<Duration> {
        let inner = self.shared.inner.lock();
        inner.silence_timer.as_ref()?;
        let at = inner.last_activity_at?;
        Some(
            self.shared
                .config
                .silence_threshold()
                .saturating_sub(at.elapsed()),
        )
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.shared.inner.lock().debounce_timer.is_some()
    }
}

impl Drop for SilenceMonitor {
    fn drop(&mut self) {
        self.shared.inner.lock().cancel_all_timers();
    }
}

impl std::fmt::Debug for SilenceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SilenceMonitor")
            .field("state", &self.state())
            .field("tracks", &self.tracked_track_count())
            .field("config", &self.shared.config)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> MonitorConfig {
        MonitorConfig::new(10_000, 0.05, 500)
    }

    /// Monitor plus Zähler für Stille-Events
    fn monitor_with_counter() -> (SilenceMonitor, Arc<AtomicUsize>) {
        let monitor = SilenceMonitor::new(test_config()).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        monitor.on_silence(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        (monitor, fired)
    }

    /// Virtuelle Zeit vorspulen und fällige Timer-Tasks laufen lassen
    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn count_resets(rx: &mut broadcast::Receiver<MonitorEvent>) -> usize {
        let mut resets = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, MonitorEvent::ActivityReset { .. }) {
                resets += 1;
            }
        }
        resets
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_at_threshold() {
        let (monitor, fired) = monitor_with_counter();
        monitor.start();

        advance_ms(9_999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.silence_elapsed(), Some(Duration::from_millis(9_999)));
        assert_eq!(monitor.time_until_silence(), Some(Duration::from_millis(1)));

        advance_ms(1).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Kein automatisches Re-Arm
        advance_ms(30_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(monitor.is_monitoring());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_restarts_window() {
        let (monitor, fired) = monitor_with_counter();
        let track_a = TrackHandle::new("a");
        let started = Instant::now();
        monitor.start();

        advance_ms(5_000).await;
        monitor.report_level(&track_a, 0.1);
        advance_ms(500).await;

        let reset_at = started + Duration::from_millis(5_500);
        assert_eq!(monitor.last_activity_at(), Some(reset_at));

        advance_ms(9_999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        advance_ms(1).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_below_threshold_is_ignored() {
        let (monitor, fired) = monitor_with_counter();
        let track_a = TrackHandle::new("a");
        let started = Instant::now();
        monitor.start();

        advance_ms(5_000).await;
        monitor.report_level(&track_a, 0.02);
        monitor.report_level(&track_a, f32::NAN);
        assert!(!monitor.has_pending_debounce());

        advance_ms(4_999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.last_activity_at(), Some(started));

        advance_ms(1).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_single_reset() {
        let (monitor, _fired) = monitor_with_counter();
        let track_a = TrackHandle::new("a");
        monitor.start();
        let mut rx = monitor.subscribe();
        let burst_start = Instant::now();

        monitor.report_level(&track_a, 0.3);
        advance_ms(100).await;
        monitor.report_level(&track_a, 0.4);
        advance_ms(100).await;
        monitor.report_level(&track_a, 0.3);
        advance_ms(2_000).await;

        assert_eq!(count_resets(&mut rx), 1);
        assert_eq!(
            monitor.last_activity_at(),
            Some(burst_start + Duration::from_millis(500))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_uses_scheduled_time_after_clock_jump() {
        let (monitor, _fired) = monitor_with_counter();
        let track = TrackHandle::new("a");
        monitor.start();
        let reported_at = Instant::now();

        // Debounce-Task wurde noch nicht gepollt, die Uhr springt weit darüber
        monitor.report_level(&track, 0.4);
        advance_ms(2_000).await;

        assert_eq!(
            monitor.last_activity_at(),
            Some(reported_at + Duration::from_millis(500))
        );
        assert_eq!(
            monitor.time_until_silence(),
            Some(Duration::from_millis(8_500))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_speech_faster_than_debounce() {
        let (monitor, fired) = monitor_with_counter();
        let talker = TrackHandle::new("talker");
        monitor.start();
        let mut rx = monitor.subscribe();

        // Sample alle 300ms bei 500ms Debounce
        for _ in 0..40 {
            monitor.report_level(&talker, 0.5);
            advance_ms(300).await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        // Spätestens debounce_ms nach dem ersten Sample eines Bursts
        assert!(count_resets(&mut rx) >= 15);
        let elapsed = monitor.silence_elapsed().unwrap();
        assert!(elapsed < Duration::from_millis(1_000), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_silence_timer() {
        let (monitor, fired) = monitor_with_counter();
        let track = TrackHandle::new("a");
        monitor.start();
        monitor.add_track(track);

        advance_ms(5_000).await;
        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert_eq!(monitor.tracked_track_count(), 0);

        advance_ms(6_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_debounce_prevents_resurrection() {
        let (monitor, fired) = monitor_with_counter();
        let track = TrackHandle::new("a");
        monitor.start();
        let mut rx = monitor.subscribe();

        advance_ms(1_000).await;
        monitor.report_level(&track, 0.9);
        advance_ms(200).await;
        monitor.stop();
        assert!(!monitor.has_pending_debounce());

        advance_ms(30_000).await;
        assert_eq!(count_resets(&mut rx), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.last_activity_at(), None);
        assert_eq!(monitor.time_until_silence(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_active_track_keeps_call_alive() {
        let (monitor, fired) = monitor_with_counter();
        let quiet = TrackHandle::new("pstn-caller");
        let talker = TrackHandle::new("browser-agent");
        monitor.start();
        monitor.add_track(quiet.clone());
        monitor.add_track(talker.clone());

        for _ in 0..10 {
            advance_ms(4_000).await;
            monitor.report_level(&quiet, 0.0);
            monitor.report_level(&talker, 0.3);
        }
        advance_ms(500).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.tracked_track_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_joining_track_resets() {
        let (monitor, fired) = monitor_with_counter();
        let started = Instant::now();
        monitor.start();

        advance_ms(8_000).await;
        let late = TrackHandle::new("browser");
        assert!(monitor.add_track(late.clone()));
        monitor.report_level(&late, 0.2);
        advance_ms(500).await;

        assert_eq!(
            monitor.last_activity_at(),
            Some(started + Duration::from_millis(8_500))
        );

        advance_ms(9_999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        advance_ms(1).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_track_is_idempotent() {
        let (monitor, _fired) = monitor_with_counter();
        let track = TrackHandle::new("a");

        assert!(monitor.add_track(track.clone()));
        assert!(!monitor.add_track(track.clone()));
        assert_eq!(monitor.tracked_track_count(), 1);

        assert!(monitor.remove_track(&track));
        assert!(!monitor.remove_track(&track));
        assert_eq!(monitor.tracked_track_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_track_keeps_timer() {
        let (monitor, fired) = monitor_with_counter();
        let track = TrackHandle::new("a");
        monitor.start();
        monitor.add_track(track.clone());

        advance_ms(3_000).await;
        monitor.remove_track(&track);
        advance_ms(6_999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        advance_ms(1).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_rearms_from_now() {
        let (monitor, fired) = monitor_with_counter();
        let mut rx = monitor.subscribe();
        monitor.start();

        advance_ms(6_000).await;
        monitor.start();
        advance_ms(6_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        advance_ms(4_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let mut transitions = 0;
        while let Ok(event) = rx.try_recv() {
            if let MonitorEvent::StateChanged(state) = event {
                assert_eq!(state, MonitorState::Monitoring);
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ignores_activity() {
        let (monitor, fired) = monitor_with_counter();
        let track = TrackHandle::new("a");

        monitor.stop();
        monitor.report_level(&track, 0.9);
        monitor.record_activity();
        assert!(!monitor.has_pending_debounce());
        assert!(!monitor.is_tracking(&track));

        // add_track wirkt im Idle nur auf die Menge
        monitor.add_track(track.clone());
        assert_eq!(monitor.time_until_silence(), None);

        advance_ms(20_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_level_tracks_unknown_handle() {
        let (monitor, _fired) = monitor_with_counter();
        let track = TrackHandle::new("unannounced");
        monitor.start();

        monitor.report_level(&track, 0.0);
        assert!(monitor.is_tracking(&track));
        assert_eq!(monitor.tracked_track_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_activity_supersedes_pending_debounce() {
        let (monitor, _fired) = monitor_with_counter();
        let track = TrackHandle::new("a");
        monitor.start();
        let mut rx = monitor.subscribe();

        advance_ms(1_000).await;
        monitor.report_level(&track, 0.5);
        advance_ms(100).await;
        let unmuted_at = Instant::now();
        monitor.record_activity();
        assert!(!monitor.has_pending_debounce());

        advance_ms(1_000).await;
        assert_eq!(monitor.last_activity_at(), Some(unmuted_at));
        assert_eq!(count_resets(&mut rx), 1);
        assert_eq!(
            monitor.time_until_silence(),
            Some(Duration::from_millis(9_000))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_stop_monitor() {
        let monitor = Arc::new(SilenceMonitor::new(test_config()).unwrap());
        let weak = Arc::downgrade(&monitor);
        monitor.on_silence(move |_| {
            if let Some(monitor) = weak.upgrade() {
                monitor.stop();
            }
        });
        let mut rx = monitor.subscribe();

        monitor.start();
        advance_ms(10_000).await;

        assert_eq!(monitor.state(), MonitorState::Idle);

        let mut silent_for = None;
        while let Ok(event) = rx.try_recv() {
            if let MonitorEvent::SilenceExceeded { silent_for: d } = event {
                silent_for = Some(d);
            }
        }
        assert_eq!(silent_for, Some(Duration::from_millis(10_000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timers() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let monitor = SilenceMonitor::new(test_config()).unwrap();
            let fired_clone = Arc::clone(&fired);
            monitor.on_silence(move |_| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            });
            monitor.start();
        }

        advance_ms(20_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = SilenceMonitor::new(MonitorConfig::new(500, 0.05, 500));
        assert!(result.is_err());
    }
}
