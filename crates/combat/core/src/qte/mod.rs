//! Quick-time-event engine.
//!
//! A single-instance timing-bar state machine. The host drives time with
//! [`QteEngine::advance`] (one call per frame or scheduler tick) and forwards
//! the player's confirm signal to [`QteEngine::handle_input`]. When a session
//! finishes, `advance` returns the [`QteOutcome`] and the optional callback
//! passed at start receives the same value.
//!
//! # Lifecycle
//!
//! ```text
//! start ─► Waiting ──start delay──► Running ──confirm──► Input ──┐
//!                                      │                          ├─► Result ──result delay──► Idle
//!                                      └───────timeout──► Timeout ┘
//! ```
//!
//! At most one session exists; starting another while one is in flight is
//! refused with [`QteError::AlreadyActive`]. [`QteEngine::cancel`] drops the
//! session at any point without invoking its callback.

mod modifiers;
mod session;
mod zone;

use std::f64::consts::TAU;

pub use modifiers::{
    AccuracyModifiers, ChainModifiers, DefendModifiers, DefenseAdjust, DodgeModifiers,
    GuardBreakModifiers, MAX_CHAIN_HITS, OffenseAdjust, ParryModifiers, QteModifiers,
    SkillModifiers, accuracy_modifiers, defend_modifiers, dodge_modifiers, guard_break_modifiers,
    parry_modifiers, skill_modifiers,
};
pub use session::{
    Difficulty, MarkerMotion, QteCallback, QteError, QteKind, QteOutcome, QtePhase, QteRequest,
    QteView,
};
pub use zone::{CENTER, QteRuleset, Zone, ZoneThresholds};

use session::{ChainProgress, Session};

use crate::config::QteConfig;

/// Marker updates are integrated in steps no longer than one frame.
const FRAME_MS: u32 = 16;

/// The timing-bar state machine.
pub struct QteEngine {
    config: QteConfig,
    /// Base thresholds for the configured ruleset. Narrowed while a parry or
    /// guard-break session runs.
    thresholds: ZoneThresholds,
    session: Option<Session>,
}

impl QteEngine {
    pub fn new(config: QteConfig) -> Self {
        let thresholds = ZoneThresholds::for_ruleset(&config, config.ruleset);
        Self {
            config,
            thresholds,
            session: None,
        }
    }

    pub fn config(&self) -> &QteConfig {
        &self.config
    }

    pub fn ruleset(&self) -> QteRuleset {
        self.config.ruleset
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn phase(&self) -> QtePhase {
        self.session
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(QtePhase::Idle)
    }

    pub fn marker(&self) -> Option<f32> {
        self.session.as_ref().map(|s| s.marker)
    }

    /// Current base thresholds (narrowed while a shrinking kind runs).
    pub fn thresholds(&self) -> ZoneThresholds {
        self.thresholds
    }

    /// Tier a marker position would score against the base thresholds.
    pub fn zone_for_position(&self, position: f32) -> Zone {
        self.thresholds.zone_for_position(position)
    }

    /// Modifiers for a single-shot kind at the given tier.
    ///
    /// Chain combos carry per-hit data and are built at completion instead;
    /// asking for one here yields an aggregate with no recorded hits.
    pub fn modifiers_for(kind: QteKind, zone: Zone) -> QteModifiers {
        match kind {
            QteKind::Accuracy => QteModifiers::Accuracy(accuracy_modifiers(zone)),
            QteKind::Dodge => QteModifiers::Dodge(dodge_modifiers(zone)),
            QteKind::Skill => QteModifiers::Skill(skill_modifiers(zone)),
            QteKind::Defend => QteModifiers::Defend(defend_modifiers(zone)),
            QteKind::Parry => QteModifiers::Parry(parry_modifiers(zone)),
            QteKind::GuardBreak => QteModifiers::GuardBreak(guard_break_modifiers(zone)),
            QteKind::ChainCombo => QteModifiers::Chain(ChainModifiers {
                hits: Default::default(),
                landed: 0,
                aggregate: zone,
            }),
        }
    }

    // ========================================================================
    // Starting sessions
    // ========================================================================

    pub fn start(&mut self, request: QteRequest) -> Result<(), QteError> {
        self.begin(request, None)
    }

    pub fn start_with_callback(
        &mut self,
        request: QteRequest,
        callback: impl FnOnce(&QteOutcome) + 'static,
    ) -> Result<(), QteError> {
        self.begin(request, Some(Box::new(callback)))
    }

    pub fn start_accuracy(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::Accuracy, difficulty))
    }

    pub fn start_dodge(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::Dodge, difficulty))
    }

    pub fn start_skill(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::Skill, difficulty))
    }

    pub fn start_defend(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::Defend, difficulty))
    }

    pub fn start_parry(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::Parry, difficulty))
    }

    pub fn start_guard_break(&mut self, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::new(QteKind::GuardBreak, difficulty))
    }

    pub fn start_chain_combo(&mut self, hits: u32, difficulty: Difficulty) -> Result<(), QteError> {
        self.start(QteRequest::chain_combo(hits, difficulty))
    }

    fn begin(&mut self, request: QteRequest, callback: Option<QteCallback>) -> Result<(), QteError> {
        if let Some(active) = &self.session {
            tracing::warn!(
                "refusing to start {} challenge: {} challenge already in {} phase",
                request.kind,
                active.request.kind,
                active.phase
            );
            return Err(QteError::AlreadyActive);
        }

        let chain = if request.kind == QteKind::ChainCombo {
            if request.hits == 0 {
                return Err(QteError::NoHits);
            }
            if request.hits as usize > MAX_CHAIN_HITS {
                return Err(QteError::ChainTooLong(request.hits));
            }
            Some(ChainProgress {
                total: request.hits as usize,
                results: Default::default(),
            })
        } else {
            None
        };

        let saved_thresholds = request.kind.shrinks_zones().then(|| {
            let factor = match request.kind {
                QteKind::Parry => self.config.parry_shrink,
                _ => self.config.guard_break_shrink,
            };
            self.narrow_thresholds(factor)
        });

        let scale = self.config.scale(request.difficulty);
        tracing::debug!(
            kind = %request.kind,
            difficulty = %request.difficulty,
            "qte session started"
        );

        self.session = Some(Session {
            request,
            phase: QtePhase::Waiting,
            phase_ms: 0,
            wait_ms: self.config.start_delay_ms,
            marker: 0.0,
            angle: 0.0,
            speed: scale.speed,
            zone: None,
            timed_out: false,
            chain,
            callback,
            saved_thresholds,
        });
        Ok(())
    }

    /// Narrow the base thresholds and return the originals for later restore.
    fn narrow_thresholds(&mut self, factor: f32) -> ZoneThresholds {
        let saved = self.thresholds;
        self.thresholds = saved.scaled(factor);
        saved
    }

    // ========================================================================
    // Input and time
    // ========================================================================

    /// Confirm signal. Returns true when it was accepted (marker running).
    pub fn handle_input(&mut self) -> bool {
        let Self {
            config,
            thresholds,
            session,
        } = self;
        let Some(active) = session.as_mut() else {
            return false;
        };
        if active.phase != QtePhase::Running {
            tracing::trace!(phase = %active.phase, "ignoring confirm outside running phase");
            return false;
        }

        let effective = thresholds.scaled(config.scale(active.request.difficulty).zone);
        let zone = effective.zone_for_position(active.marker);
        tracing::debug!(marker = active.marker, ?zone, "qte input");
        if Self::record_hit(config, active, zone, false) {
            Self::restore_thresholds(thresholds, active);
        }
        true
    }

    /// Advance the session clock. Returns the outcome when the session completes.
    pub fn advance(&mut self, dt_ms: u32) -> Option<QteOutcome> {
        let mut remaining = dt_ms;
        loop {
            let Self {
                config,
                thresholds,
                session,
            } = self;
            let active = session.as_mut()?;

            match active.phase {
                QtePhase::Idle => return None,
                QtePhase::Waiting => {
                    let left = active.wait_ms.saturating_sub(active.phase_ms);
                    if remaining < left {
                        active.phase_ms += remaining;
                        return None;
                    }
                    remaining -= left;
                    active.phase = QtePhase::Running;
                    active.phase_ms = 0;
                    tracing::trace!("qte marker running");
                }
                QtePhase::Running => {
                    let left = config.timeout_ms.saturating_sub(active.phase_ms);
                    let step = remaining.min(left);
                    Self::move_marker(config, active, step);
                    remaining -= step;
                    if active.phase_ms >= config.timeout_ms {
                        tracing::debug!(kind = %active.request.kind, "qte timed out");
                        if Self::record_hit(config, active, Zone::Bad, true) {
                            Self::restore_thresholds(thresholds, active);
                        }
                        continue;
                    }
                    return None;
                }
                QtePhase::Input | QtePhase::Timeout => {
                    active.phase = QtePhase::Result;
                    active.phase_ms = 0;
                }
                QtePhase::Result => {
                    active.phase_ms = active.phase_ms.saturating_add(remaining);
                    if active.phase_ms >= config.result_delay_ms {
                        return self.complete();
                    }
                    return None;
                }
            }
        }
    }

    /// Drop the active session without invoking its callback.
    ///
    /// Returns true when a session was cancelled.
    pub fn cancel(&mut self) -> bool {
        let Some(mut active) = self.session.take() else {
            return false;
        };
        Self::restore_thresholds(&mut self.thresholds, &mut active);
        tracing::debug!(kind = %active.request.kind, phase = %active.phase, "qte cancelled");
        true
    }

    /// Display snapshot of the active session.
    pub fn view(&self) -> Option<QteView> {
        let active = self.session.as_ref()?;
        let thresholds = self
            .thresholds
            .scaled(self.config.scale(active.request.difficulty).zone);
        Some(QteView {
            kind: active.request.kind,
            phase: active.phase,
            marker: active.marker,
            thresholds,
            zone: active.zone,
            label: active.request.label.clone(),
            chain_progress: active
                .chain
                .as_ref()
                .map(|c| ((c.results.len() + 1).min(c.total), c.total)),
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn move_marker(config: &QteConfig, active: &mut Session, step_ms: u32) {
        let period = config.base_period_ms.max(1) as f64;
        let omega = TAU / period * active.speed.max(0.01) as f64;
        let mut left = step_ms;
        while left > 0 {
            let frame = left.min(FRAME_MS);
            let rate = match config.motion {
                MarkerMotion::Sinusoidal => 1.0,
                MarkerMotion::OscillatingSpeed => {
                    let t = active.phase_ms as f64 / 1000.0;
                    let swing = (TAU * config.oscillation_hz as f64 * t).sin();
                    (1.0 + config.oscillation_amplitude as f64 * swing).max(0.1)
                }
            };
            active.angle += omega * frame as f64 * rate;
            active.phase_ms += frame;
            left -= frame;
        }
        active.marker = (CENTER as f64 - CENTER as f64 * active.angle.cos()) as f32;
    }

    /// Record one resolved input. Returns true when the whole session resolved.
    fn record_hit(config: &QteConfig, active: &mut Session, zone: Zone, timed_out: bool) -> bool {
        active.zone = Some(zone);

        if let Some(chain) = active.chain.as_mut() {
            // Capacity is checked at start, so this cannot overflow.
            let _ = chain.results.try_push(zone);
            if chain.results.len() < chain.total {
                let base = config.scale(active.request.difficulty).speed;
                active.speed =
                    base * (1.0 + config.chain.speed_step * chain.results.len() as f32);
                active.phase = QtePhase::Waiting;
                active.phase_ms = 0;
                active.wait_ms = config.chain.hit_gap_ms;
                active.angle = 0.0;
                active.marker = 0.0;
                tracing::trace!(hit = chain.results.len(), "chain combo next hit");
                return false;
            }
            let landed = chain.results.iter().filter(|z| z.landed()).count();
            active.zone = Some(Self::aggregate(config, landed, chain.total));
        }

        active.timed_out = timed_out;
        active.phase = if timed_out {
            QtePhase::Timeout
        } else {
            QtePhase::Input
        };
        active.phase_ms = 0;
        true
    }

    fn aggregate(config: &QteConfig, landed: usize, total: usize) -> Zone {
        if total == 0 {
            return Zone::Bad;
        }
        let ratio = landed as f32 / total as f32;
        if landed == total {
            Zone::Perfect
        } else if ratio >= config.chain.good_ratio {
            Zone::Good
        } else if ratio >= config.chain.normal_ratio {
            Zone::Normal
        } else {
            Zone::Bad
        }
    }

    fn restore_thresholds(thresholds: &mut ZoneThresholds, active: &mut Session) {
        if let Some(saved) = active.saved_thresholds.take() {
            *thresholds = saved;
        }
    }

    fn complete(&mut self) -> Option<QteOutcome> {
        let mut active = self.session.take()?;
        Self::restore_thresholds(&mut self.thresholds, &mut active);

        let zone = active.zone.unwrap_or(Zone::Bad);
        let modifiers = match active.chain.take() {
            Some(chain) => {
                let landed = chain.results.iter().filter(|z| z.landed()).count() as u32;
                QteModifiers::Chain(ChainModifiers {
                    hits: chain.results,
                    landed,
                    aggregate: zone,
                })
            }
            None => Self::modifiers_for(active.request.kind, zone),
        };

        let outcome = QteOutcome {
            kind: active.request.kind,
            zone,
            tier: zone.label(self.config.ruleset),
            position: active.marker,
            timed_out: active.timed_out,
            modifiers,
        };
        tracing::debug!(kind = %outcome.kind, tier = outcome.tier, "qte complete");

        if let Some(callback) = active.callback.take() {
            callback(&outcome);
        }
        Some(outcome)
    }
}

impl Default for QteEngine {
    fn default() -> Self {
        Self::new(QteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Milliseconds from running start until the marker reaches the center at speed 1.
    fn quarter_period(config: &QteConfig) -> u32 {
        config.base_period_ms / 4
    }

    fn engine() -> QteEngine {
        QteEngine::new(QteConfig::default())
    }

    #[test]
    fn confirm_at_center_is_perfect() {
        let mut qte = engine();
        let config = qte.config().clone();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        qte.start_with_callback(QteRequest::new(QteKind::Skill, Difficulty::Normal), move |o| {
            *sink.borrow_mut() = Some(o.clone());
        })
        .unwrap();

        assert_eq!(qte.phase(), QtePhase::Waiting);
        assert!(qte.advance(config.start_delay_ms).is_none());
        assert_eq!(qte.phase(), QtePhase::Running);
        assert!(qte.advance(quarter_period(&config)).is_none());
        let marker = qte.marker().unwrap();
        assert!((marker - 50.0).abs() < 0.5, "marker at {marker}");

        assert!(qte.handle_input());
        assert_eq!(qte.phase(), QtePhase::Input);
        assert!(qte.advance(1).is_none());
        assert_eq!(qte.phase(), QtePhase::Result);

        let outcome = qte.advance(config.result_delay_ms).unwrap();
        assert_eq!(outcome.zone, Zone::Perfect);
        assert_eq!(outcome.tier, "perfect");
        match outcome.modifiers {
            QteModifiers::Skill(m) => {
                assert!(m.advantage);
                assert_eq!(m.bonus_damage, 0.25);
            }
            other => panic!("unexpected modifiers {other:?}"),
        }
        assert_eq!(qte.phase(), QtePhase::Idle);
        assert_eq!(seen.borrow().as_ref(), Some(&outcome));
    }

    #[test]
    fn second_start_is_rejected() {
        let mut qte = engine();
        qte.start_skill(Difficulty::Normal).unwrap();
        assert_eq!(qte.start_defend(Difficulty::Normal), Err(QteError::AlreadyActive));
        assert_eq!(qte.phase(), QtePhase::Waiting);
    }

    #[test]
    fn no_input_times_out_to_worst_tier() {
        let mut qte = engine();
        let config = qte.config().clone();
        qte.start_defend(Difficulty::Normal).unwrap();
        let total = config.start_delay_ms + config.timeout_ms + config.result_delay_ms;
        let outcome = qte.advance(total).unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.zone, Zone::Bad);
        match outcome.modifiers {
            QteModifiers::Defend(m) => assert!(m.defend_ends),
            other => panic!("unexpected modifiers {other:?}"),
        }
    }

    #[test]
    fn input_before_running_is_ignored() {
        let mut qte = engine();
        qte.start_accuracy(Difficulty::Easy).unwrap();
        assert!(!qte.handle_input());
        assert_eq!(qte.phase(), QtePhase::Waiting);
    }

    #[test]
    fn cancel_skips_callback_and_resets() {
        let mut qte = engine();
        let fired = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&fired);
        qte.start_with_callback(QteRequest::new(QteKind::Dodge, Difficulty::Hard), move |_| {
            *sink.borrow_mut() = true;
        })
        .unwrap();
        qte.advance(700);
        assert!(qte.cancel());
        assert!(!qte.cancel());
        assert_eq!(qte.phase(), QtePhase::Idle);
        assert!(qte.advance(10_000).is_none());
        assert!(!*fired.borrow());
        assert!(qte.start_skill(Difficulty::Normal).is_ok());
    }

    #[test]
    fn parry_restores_thresholds_exactly() {
        let mut qte = engine();
        let original = qte.thresholds();
        qte.start_parry(Difficulty::Normal).unwrap();
        assert!(qte.thresholds().good < original.good);
        let config = qte.config().clone();
        qte.advance(config.start_delay_ms + config.timeout_ms);
        assert_eq!(qte.thresholds(), original);
        let outcome = qte.advance(config.result_delay_ms).unwrap();
        assert!(matches!(outcome.modifiers, QteModifiers::Parry(p) if !p.parried));
        assert_eq!(qte.thresholds(), original);
    }

    #[test]
    fn guard_break_restores_on_cancel() {
        let mut qte = engine();
        let original = qte.thresholds();
        qte.start_guard_break(Difficulty::Normal).unwrap();
        assert_ne!(qte.thresholds(), original);
        qte.cancel();
        assert_eq!(qte.thresholds(), original);
    }

    #[test]
    fn chain_combo_collects_each_hit() {
        let mut qte = engine();
        let config = qte.config().clone();
        qte.start_chain_combo(3, Difficulty::Normal).unwrap();

        // First hit: confirm at center.
        qte.advance(config.start_delay_ms + quarter_period(&config));
        assert!(qte.handle_input());
        assert_eq!(qte.phase(), QtePhase::Waiting);
        assert_eq!(qte.view().unwrap().chain_progress, Some((2, 3)));

        // Second and third hits time out.
        qte.advance(config.chain.hit_gap_ms + config.timeout_ms);
        assert_eq!(qte.phase(), QtePhase::Waiting);
        qte.advance(config.chain.hit_gap_ms + config.timeout_ms);
        assert_eq!(qte.phase(), QtePhase::Result);

        let outcome = qte.advance(config.result_delay_ms).unwrap();
        match outcome.modifiers {
            QteModifiers::Chain(chain) => {
                assert_eq!(chain.hits.as_slice(), &[Zone::Perfect, Zone::Bad, Zone::Bad]);
                assert_eq!(chain.landed, 1);
                assert_eq!(chain.aggregate, Zone::Bad);
            }
            other => panic!("unexpected modifiers {other:?}"),
        }
    }

    #[test]
    fn chain_rejects_bad_lengths() {
        let mut qte = engine();
        assert_eq!(qte.start_chain_combo(0, Difficulty::Normal), Err(QteError::NoHits));
        assert_eq!(
            qte.start_chain_combo(MAX_CHAIN_HITS as u32 + 1, Difficulty::Normal),
            Err(QteError::ChainTooLong(MAX_CHAIN_HITS as u32 + 1))
        );
        assert!(!qte.is_active());
    }

    #[test]
    fn legacy_ruleset_uses_legacy_names() {
        let config = QteConfig {
            ruleset: QteRuleset::Legacy,
            ..QteConfig::default()
        };
        let mut qte = QteEngine::new(config.clone());
        qte.start_accuracy(Difficulty::Normal).unwrap();
        let outcome = qte
            .advance(config.start_delay_ms + config.timeout_ms + config.result_delay_ms)
            .unwrap();
        assert_eq!(outcome.tier, "miss");
        assert!(matches!(outcome.modifiers, QteModifiers::Accuracy(m) if m.hit_bonus < 0));
    }

    #[test]
    fn oscillating_motion_stays_on_bar() {
        let config = QteConfig {
            motion: MarkerMotion::OscillatingSpeed,
            ..QteConfig::default()
        };
        let mut qte = QteEngine::new(config.clone());
        qte.start_skill(Difficulty::Hard).unwrap();
        qte.advance(config.start_delay_ms);
        for _ in 0..100 {
            qte.advance(16);
            let marker = qte.marker().unwrap();
            assert!((0.0..=100.0).contains(&marker));
        }
    }
}
