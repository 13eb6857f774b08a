//! Motion sampler.
//!
//! Once per tick while active, snapshots every observable entity in the
//! target world, compares each position against the one sampled on the
//! immediately preceding tick, and classifies the delta as moved or still.
//! A movement inside the region by an entity that is not cooling down is a
//! violation; the sampler records its detection time and hands it back to
//! the caller, which runs the elimination protocol.

use std::collections::HashMap;

use tracing::debug;

use crate::host::{EntityId, Host, Timestamp};
use crate::region::{Position, Region, WorldId};

use super::cooldown::CooldownGate;

/// Default horizontal threshold, squared (0.02 units).
pub const HORIZONTAL_THRESHOLD_SQ: f64 = 0.0004;

/// Default vertical threshold (0.1 units).
pub const VERTICAL_THRESHOLD: f64 = 0.1;

/// Independent horizontal and vertical movement thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementThresholds {
    /// Squared horizontal distance that must be exceeded
    pub horizontal_sq: f64,
    /// Absolute vertical distance that must be exceeded
    pub vertical: f64,
}

impl MovementThresholds {
    /// Builds thresholds from plain (not squared) distances.
    #[must_use]
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal_sq: horizontal * horizontal,
            vertical,
        }
    }

    /// Classifies a delta.
    #[must_use]
    pub fn is_movement(&self, delta: Delta) -> bool {
        delta.horizontal_sq > self.horizontal_sq || delta.vertical > self.vertical
    }
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            horizontal_sq: HORIZONTAL_THRESHOLD_SQ,
            vertical: VERTICAL_THRESHOLD,
        }
    }
}

/// Position change between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    /// `dx² + dz²`
    pub horizontal_sq: f64,
    /// `|dy|`
    pub vertical: f64,
}

impl Delta {
    /// Measures the change from `last` to `current`; `None` when the two
    /// positions are in different worlds.
    #[must_use]
    pub fn between(last: &Position, current: &Position) -> Option<Self> {
        if last.world != current.world {
            return None;
        }
        let dx = current.point.x - last.point.x;
        let dz = current.point.z - last.point.z;
        Some(Self {
            horizontal_sq: dx.mul_add(dx, dz * dz),
            vertical: (current.point.y - last.point.y).abs(),
        })
    }
}

/// Where the sampler looks while active.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingTarget {
    /// World whose entities are sampled
    pub world: WorldId,
    /// Region where movement is penalized; `None` penalizes nowhere
    pub region: Option<Region>,
}

/// One classified movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Entity that moved
    pub entity: EntityId,
    /// Position read this tick
    pub position: Position,
    /// Measured change
    pub delta: Delta,
    /// Whether the position is inside the region
    pub in_region: bool,
    /// Whether the entity was still inside its cooldown window
    pub cooling_down: bool,
    /// Whether this movement counts as a violation
    pub violation: bool,
}

#[derive(Debug, Clone, Default)]
struct TrackedEntity {
    last_position: Option<Position>,
    last_seen_tick: u64,
    last_detection: Option<Timestamp>,
}

/// Per-tick motion sampler.
///
/// Owns the per-entity position and detection maps; both are cleared
/// whenever sampling starts or stops.
#[derive(Debug)]
pub struct MotionSampler {
    active: bool,
    ticks: u64,
    target: Option<SamplingTarget>,
    thresholds: MovementThresholds,
    cooldown: CooldownGate,
    tracked: HashMap<EntityId, TrackedEntity>,
}

impl MotionSampler {
    /// Creates an inactive sampler.
    #[must_use]
    pub fn new(thresholds: MovementThresholds, cooldown: CooldownGate) -> Self {
        Self {
            active: false,
            ticks: 0,
            target: None,
            thresholds,
            cooldown,
            tracked: HashMap::new(),
        }
    }

    /// Starts sampling `target`.
    ///
    /// Returns `false` without touching any state if already active, so a
    /// second start can never leak a second sampling task.
    pub fn start(&mut self, target: SamplingTarget) -> bool {
        if self.active {
            return false;
        }
        debug!(world = %target.world, "motion sampler started");
        self.active = true;
        self.ticks = 0;
        self.tracked.clear();
        self.target = Some(target);
        true
    }

    /// Stops sampling and clears all per-entity state.
    ///
    /// Idempotent: returns `false` if the sampler was not active.
    pub fn stop(&mut self) -> bool {
        if !self.active {
            return false;
        }
        debug!(ticks = self.ticks, "motion sampler stopped");
        self.active = false;
        self.tracked.clear();
        self.target = None;
        true
    }

    /// Whether the sampler is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks sampled since the last start.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current target, if active.
    #[must_use]
    pub const fn target(&self) -> Option<&SamplingTarget> {
        self.target.as_ref()
    }

    /// Movement thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> MovementThresholds {
        self.thresholds
    }

    /// Number of entities with tracked state.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Position sampled for `id` on the most recent tick it was observed.
    #[must_use]
    pub fn last_position(&self, id: EntityId) -> Option<&Position> {
        self.tracked.get(&id).and_then(|t| t.last_position.as_ref())
    }

    /// Time of the last counted violation for `id`.
    #[must_use]
    pub fn last_detection(&self, id: EntityId) -> Option<Timestamp> {
        self.tracked.get(&id).and_then(|t| t.last_detection)
    }

    /// Cooldown predicate for one entity.
    #[must_use]
    pub fn is_cooling_down(&self, id: EntityId, now: Timestamp) -> bool {
        self.cooldown.is_cooling_down(self.last_detection(id), now)
    }

    /// Samples every observable entity once.
    ///
    /// All entities are judged against the same `now`. Every observed
    /// entity's last position is overwritten whatever the outcome; an
    /// entity seen for the first time, or not seen on the previous tick,
    /// only establishes a baseline.
    pub fn sample<H: Host + ?Sized>(&mut self, host: &H, now: Timestamp) -> Vec<Detection> {
        if !self.active {
            return Vec::new();
        }
        let Some(target) = self.target.as_ref() else {
            return Vec::new();
        };

        self.ticks += 1;
        let tick = self.ticks;
        let mut detections = Vec::new();

        for snapshot in host.list_observable_entities(&target.world) {
            let record = self.tracked.entry(snapshot.id).or_default();
            let current = snapshot.position;

            let baseline = if record.last_seen_tick + 1 == tick {
                record.last_position.as_ref()
            } else {
                None
            };

            if let Some(delta) = baseline.and_then(|last| Delta::between(last, &current)) {
                if self.thresholds.is_movement(delta) {
                    let cooling_down = self.cooldown.is_cooling_down(record.last_detection, now);
                    let in_region = target
                        .region
                        .as_ref()
                        .is_some_and(|region| region.contains(&current));
                    let violation = in_region && !cooling_down && !snapshot.incapacitated;
                    if violation {
                        record.last_detection = Some(now);
                    }
                    detections.push(Detection {
                        entity: snapshot.id,
                        position: current.clone(),
                        delta,
                        in_region,
                        cooling_down,
                        violation,
                    });
                }
            }

            record.last_position = Some(current);
            record.last_seen_tick = tick;
        }

        detections
    }
}

impl Default for MotionSampler {
    fn default() -> Self {
        Self::new(MovementThresholds::default(), CooldownGate::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Cue, EntitySnapshot};
    use crate::region::Vec3;

    /// Minimal host: a fixed roster whose positions tests move by hand.
    struct Roster {
        world: WorldId,
        entities: Vec<EntitySnapshot>,
    }

    impl Roster {
        fn new() -> Self {
            Self {
                world: WorldId::new("arena"),
                entities: Vec::new(),
            }
        }

        fn add(&mut self, id: u128, point: Vec3) -> EntityId {
            let id = EntityId::from_u128(id);
            self.entities.push(EntitySnapshot {
                id,
                position: Position::new(self.world.clone(), point),
                incapacitated: false,
            });
            id
        }

        fn shift(&mut self, id: EntityId, dx: f64, dy: f64, dz: f64) {
            let e = self.entities.iter_mut().find(|e| e.id == id).unwrap();
            e.position.point.x += dx;
            e.position.point.y += dy;
            e.position.point.z += dz;
        }

        fn remove(&mut self, id: EntityId) {
            self.entities.retain(|e| e.id != id);
        }
    }

    impl Host for Roster {
        fn default_world(&self) -> Option<WorldId> {
            Some(self.world.clone())
        }
        fn resolve_world(&self, name: &str) -> Option<WorldId> {
            (name == self.world.as_str()).then(|| self.world.clone())
        }
        fn list_observable_entities(&self, world: &WorldId) -> Vec<EntitySnapshot> {
            self.entities
                .iter()
                .filter(|e| &e.position.world == world)
                .cloned()
                .collect()
        }
        fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
            self.entities.iter().find(|e| e.id == id).cloned()
        }
        fn send_feedback(&mut self, _id: EntityId, _cue: Cue) {}
        fn send_notice(&mut self, _id: EntityId, _text: &str) {}
        fn set_vitality(&mut self, _id: EntityId, _value: f64) {}
        fn now(&self) -> Timestamp {
            Timestamp::from_millis(0)
        }
    }

    fn target(host: &Roster) -> SamplingTarget {
        SamplingTarget {
            world: host.world.clone(),
            region: Some(Region::from_corners(
                host.world.clone(),
                Vec3::new(-50.0, 0.0, -50.0),
                Vec3::new(50.0, 100.0, 50.0),
            )),
        }
    }

    fn ms(v: u64) -> Timestamp {
        Timestamp::from_millis(v)
    }

    #[test]
    fn test_threshold_classification() {
        let t = MovementThresholds::default();
        let w = WorldId::new("arena");
        let at = |x, y, z| Position::new(w.clone(), Vec3::new(x, y, z));

        let moved = Delta::between(&at(0.0, 64.0, 0.0), &at(0.03, 64.0, 0.0)).unwrap();
        assert!((moved.horizontal_sq - 0.0009).abs() < 1e-12);
        assert!(t.is_movement(moved));

        let still = Delta::between(&at(0.0, 64.0, 0.0), &at(0.01, 64.0, 0.01)).unwrap();
        assert!((still.horizontal_sq - 0.0002).abs() < 1e-12);
        assert!(still.vertical.abs() < f64::EPSILON);
        assert!(!t.is_movement(still));

        let hop = Delta::between(&at(0.0, 64.0, 0.0), &at(0.0, 64.2, 0.0)).unwrap();
        assert!(t.is_movement(hop));

        let sink = Delta::between(&at(0.0, 64.0, 0.0), &at(0.0, 63.95, 0.0)).unwrap();
        assert!(!t.is_movement(sink));
    }

    #[test]
    fn test_delta_across_worlds_is_none() {
        let a = Position::new(WorldId::new("arena"), Vec3::ORIGIN);
        let b = Position::new(WorldId::new("lobby"), Vec3::ORIGIN);
        assert!(Delta::between(&a, &b).is_none());
    }

    #[test]
    fn test_thresholds_from_plain_distances() {
        let t = MovementThresholds::new(0.5, 1.0);
        assert!((t.horizontal_sq - 0.25).abs() < f64::EPSILON);
        assert!((t.vertical - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inactive_sampler_does_nothing() {
        let mut host = Roster::new();
        host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        assert!(sampler.sample(&host, ms(0)).is_empty());
        assert_eq!(sampler.tracked_count(), 0);
        assert_eq!(sampler.ticks(), 0);
    }

    #[test]
    fn test_first_sighting_only_sets_baseline() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        assert!(sampler.start(target(&host)));

        assert!(sampler.sample(&host, ms(0)).is_empty());
        assert_eq!(
            sampler.last_position(id).unwrap().point,
            Vec3::new(0.0, 64.0, 0.0)
        );
    }

    #[test]
    fn test_position_overwritten_every_tick() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));

        host.shift(id, 0.5, 0.0, 0.0);
        let d = sampler.sample(&host, ms(50));
        assert_eq!(d.len(), 1);
        assert!(d[0].violation);
        assert_eq!(sampler.last_position(id).unwrap().point.x, 0.5);

        // Cooling down: detected, not a violation, baseline still advances.
        host.shift(id, 0.5, 0.0, 0.0);
        let d = sampler.sample(&host, ms(100));
        assert_eq!(d.len(), 1);
        assert!(d[0].cooling_down);
        assert!(!d[0].violation);
        assert_eq!(sampler.last_position(id).unwrap().point.x, 1.0);

        // Standing still after a jump is not movement.
        assert!(sampler.sample(&host, ms(150)).is_empty());
    }

    #[test]
    fn test_one_violation_per_cooldown_window() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));

        let mut violations = 0;
        for tick in 1..=20u64 {
            host.shift(id, 0.1, 0.0, 0.0);
            violations += sampler
                .sample(&host, ms(tick * 50))
                .iter()
                .filter(|d| d.violation)
                .count();
        }
        // Moves at 50ms .. 1000ms: violations at 50ms and 1050ms would be
        // needed for two; 1000ms is still inside the first window.
        assert_eq!(violations, 1);
        assert!(sampler.is_cooling_down(id, ms(1_000)));
        assert!(!sampler.is_cooling_down(id, ms(1_050)));

        host.shift(id, 0.1, 0.0, 0.0);
        let d = sampler.sample(&host, ms(1_050));
        assert!(d[0].violation);
    }

    #[test]
    fn test_outside_region_is_not_violation() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(200.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));

        host.shift(id, 1.0, 0.0, 0.0);
        let d = sampler.sample(&host, ms(50));
        assert_eq!(d.len(), 1);
        assert!(!d[0].in_region);
        assert!(!d[0].violation);
        assert!(sampler.last_detection(id).is_none());
    }

    #[test]
    fn test_no_region_penalizes_nowhere() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(SamplingTarget {
            world: host.world.clone(),
            region: None,
        });
        sampler.sample(&host, ms(0));
        host.shift(id, 1.0, 0.0, 0.0);
        let d = sampler.sample(&host, ms(50));
        assert!(!d[0].violation);
    }

    #[test]
    fn test_incapacitated_entity_is_not_violation() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));

        host.entities[0].incapacitated = true;
        host.shift(id, 0.0, -1.0, 0.0);
        let d = sampler.sample(&host, ms(50));
        assert_eq!(d.len(), 1);
        assert!(!d[0].violation);
    }

    #[test]
    fn test_missed_tick_re_establishes_baseline() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));

        let saved = host.entity(id).unwrap();
        host.remove(id);
        sampler.sample(&host, ms(50));

        let mut back = saved;
        back.position.point.x += 5.0;
        host.entities.push(back);
        assert!(sampler.sample(&host, ms(100)).is_empty());
        assert_eq!(sampler.last_position(id).unwrap().point.x, 5.0);
    }

    #[test]
    fn test_start_is_check_and_set() {
        let host = Roster::new();
        let mut sampler = MotionSampler::default();
        assert!(sampler.start(target(&host)));
        assert!(!sampler.start(target(&host)));
        assert!(sampler.is_active());
    }

    #[test]
    fn test_stop_is_idempotent_and_clears_state() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        assert!(!sampler.stop());

        sampler.start(target(&host));
        sampler.sample(&host, ms(0));
        host.shift(id, 1.0, 0.0, 0.0);
        sampler.sample(&host, ms(50));
        assert!(sampler.last_detection(id).is_some());

        assert!(sampler.stop());
        assert!(!sampler.stop());
        assert_eq!(sampler.tracked_count(), 0);
        assert!(sampler.target().is_none());
        assert!(!sampler.is_cooling_down(id, ms(60)));
    }

    #[test]
    fn test_restart_resets_tick_counter_and_baselines() {
        let mut host = Roster::new();
        let id = host.add(1, Vec3::new(0.0, 64.0, 0.0));
        let mut sampler = MotionSampler::default();
        sampler.start(target(&host));
        sampler.sample(&host, ms(0));
        sampler.sample(&host, ms(50));
        assert_eq!(sampler.ticks(), 2);
        sampler.stop();

        host.shift(id, 3.0, 0.0, 0.0);
        sampler.start(target(&host));
        assert_eq!(sampler.ticks(), 0);
        assert!(sampler.sample(&host, ms(100)).is_empty());
    }
}
