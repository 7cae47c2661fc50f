//! Extol entry point
//!
//! The browser build is driven from JS through `platform::web::WebGame`.
//! Natively this runs headless sessions with an autopilot steering the
//! board, which is handy for balancing tuning files and for soak testing.

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use extol::consts::LANES;
    use extol::haptics::{self, LogHaptics};
    use extol::persistence::{JsonFileStore, KvStore, MemoryStore};
    use extol::platform::{Clock, init_logging, parse_level, random_seed};
    use extol::sim::{FinishStage, Frame, Game, GameEvent, GamePhase, PanEnd, SensorSample};
    use extol::tuning::Tuning;

    // --- Command Line Arguments ---
    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    pub struct Args {
        /// Spawn seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of runs to play back to back
        #[arg(long, default_value_t = 3)]
        runs: u32,

        /// Simulated display frame rate
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Identity (wallet address) that owns the persisted total
        #[arg(long)]
        identity: Option<String>,

        /// JSON store file; scores are kept in memory if omitted
        #[arg(long)]
        store: Option<PathBuf>,

        /// Tuning override (JSON)
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Log level (off, error, warn, info, debug, trace)
        #[arg(long, default_value = "info")]
        log_level: String,
    }

    /// Portrait phone viewport
    const VIEWPORT: Vec2 = Vec2::new(390.0, 844.0);
    /// Obstacles deeper than this are close enough to dodge
    const LOOKAHEAD_DEPTH: f32 = 0.45;

    struct RunSummary {
        points: u64,
        wiped_out: bool,
        loot: u32,
    }

    pub fn main() {
        let args = Args::parse();
        init_logging(parse_level(&args.log_level));

        if let Err(e) = run(args) {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }

    fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
        let tuning = match &args.tuning {
            Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
            None => Tuning::default(),
        };
        let store: Box<dyn KvStore> = match &args.store {
            Some(path) => Box::new(JsonFileStore::open_or_empty(path)),
            None => Box::new(MemoryStore::new()),
        };
        let seed = args.seed.unwrap_or_else(random_seed);
        let frame_ms = u64::from((1000 / args.fps.max(1)).max(1));

        log::info!("Extol (native) starting with seed: {}", seed);
        let wall = Clock::new();
        let mut game = Game::new(tuning, VIEWPORT, seed, store)?;
        game.connect_identity(args.identity.as_deref());

        let mut now = 0;
        let mut summaries = Vec::new();
        for run in 0..args.runs {
            let started = if run == 0 {
                game.start(now)
            } else {
                game.drop_again(now)
            };
            if !started {
                return Err(format!("could not start run {} from {:?}", run + 1, game.phase()).into());
            }
            let summary = play_run(&mut game, &mut now, frame_ms);
            log::info!(
                "Run {}: {} points, {} loot{}",
                run + 1,
                summary.points,
                summary.loot,
                if summary.wiped_out { ", wiped out" } else { "" }
            );
            summaries.push(summary);
        }
        game.exit(now);
        log::info!("Simulated {} ms in {} ms", now, wall.now_ms());

        let best = summaries.iter().map(|s| s.points).max().unwrap_or(0);
        let wipeouts = summaries.iter().filter(|s| s.wiped_out).count();
        println!(
            "{} runs, best {} points, {} wipeouts, total {}",
            summaries.len(),
            best,
            wipeouts,
            game.ledger().total_points()
        );
        Ok(())
    }

    /// Drive one run from the countdown to the finish menu
    fn play_run(game: &mut Game, now: &mut u64, frame_ms: u64) -> RunSummary {
        let tuning = game.tuning().clone();
        let deadline = *now
            + tuning.countdown_ms
            + tuning.run_duration_ms
            + tuning.wipeout_ms
            + tuning.finish_banner_ms
            + 1000;
        let mut sink = LogHaptics;
        let mut summary = RunSummary {
            points: 0,
            wiped_out: false,
            loot: 0,
        };
        let mut next_sample = *now;
        let mut target = 0.0;

        while *now < deadline {
            // Sensor stream runs independently of the display
            while next_sample <= *now {
                if let Some(interval) = game.sensor_interval_ms() {
                    let raw = target / tuning.tilt_sensitivity;
                    game.sensor_sample(next_sample, SensorSample { x: raw });
                    next_sample += u64::from(interval);
                } else {
                    next_sample = *now + 1;
                }
            }

            let frame = game.advance(*now);
            let events = game.drain_events();
            haptics::dispatch(&events, &mut sink, game.settings().haptics);
            for event in &events {
                match event {
                    GameEvent::LootCollected { value, .. } => {
                        summary.loot += 1;
                        log::debug!("loot +{}", value);
                        // Celebrate with a hop
                        game.pan_end(
                            *now,
                            PanEnd {
                                velocity_x: 0.0,
                                velocity_y: -1200.0,
                            },
                        );
                    }
                    GameEvent::Crashed { .. } => summary.wiped_out = true,
                    _ => {}
                }
            }

            if frame.phase == GamePhase::Playing {
                summary.points = frame.run_points;
            }
            if frame.finish.is_some_and(|f| f.stage == FinishStage::Menu) {
                break;
            }
            if frame.phase == GamePhase::Countdown || frame.phase == GamePhase::Playing {
                target = steer(&frame, tuning.collision_threshold);
            }
            *now += frame_ms;
        }
        summary
    }

    /// Pick the lane to lean toward: away from close hazards, toward loot,
    /// and preferring small moves.
    fn steer(frame: &Frame, threshold: f32) -> f32 {
        let cost = |lane: f32| {
            let mut cost = (lane - frame.tilt).abs() * 0.5;
            for view in &frame.obstacles {
                let o = view.obstacle;
                if o.depth < LOOKAHEAD_DEPTH || o.depth >= 1.0 {
                    continue;
                }
                if (o.lane - lane).abs() >= threshold * 1.5 {
                    continue;
                }
                if o.is_loot() {
                    cost -= o.loot.unwrap_or(0) as f32 / 250.0;
                } else {
                    cost += 10.0 * o.depth;
                }
            }
            cost
        };
        LANES
            .iter()
            .copied()
            .min_by(|a, b| cost(*a).total_cmp(&cost(*b)))
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use extol::sim::{Obstacle, ObstacleView, ScreenPlacement, TubeGeometry};

        fn frame_with(obstacles: &[Obstacle]) -> Frame {
            let geometry = TubeGeometry::new(VIEWPORT.x, VIEWPORT.y);
            Frame {
                now_ms: 0,
                phase: GamePhase::Playing,
                time_left_ms: 10_000,
                finish: None,
                tilt: 0.0,
                player: geometry.tilt_to_position(0.0),
                gesture: Default::default(),
                obstacles: obstacles
                    .iter()
                    .map(|o| ObstacleView {
                        obstacle: *o,
                        screen: ScreenPlacement {
                            pos: Vec2::ZERO,
                            scale: 1.0,
                        },
                    })
                    .collect(),
                run_points: 0,
                total_points: 0,
            }
        }

        fn obstacle(lane: f32, depth: f32, loot: Option<u32>) -> Obstacle {
            Obstacle {
                id: 0,
                lane,
                depth,
                kind: 0,
                loot,
            }
        }

        #[test]
        fn test_steer_stays_put_when_clear() {
            assert_eq!(steer(&frame_with(&[]), 0.2), 0.0);
        }

        #[test]
        fn test_steer_dodges_hazard() {
            let lane = steer(&frame_with(&[obstacle(0.0, 0.8, None)]), 0.2);
            assert!(lane.abs() >= 0.3);
        }

        #[test]
        fn test_steer_chases_loot() {
            let lane = steer(&frame_with(&[obstacle(0.5, 0.7, Some(500))]), 0.1);
            assert_eq!(lane, 0.5);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    autopilot::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main, this is just to satisfy the compiler
}
