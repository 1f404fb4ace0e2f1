//! Plinko Physics demo
//!
//! Headless peg-board drop: balls fall through staggered pegs into sensor bins
//! and the landing counts are logged. Usage:
//!
//! `plinko-physics [config.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use plinko_physics::{BodyConfig, EngineConfig, PhysicsEngine, Shape, Vector2};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const ROWS: usize = 10;
    const PEG_SPACING: f32 = 40.0;
    const PEG_RADIUS: f32 = 4.0;
    const BALL_RADIUS: f32 = 7.0;
    const BALLS: usize = 60;
    const BALL_GROUP: i32 = -1;
    const BOARD_TOP: f32 = 80.0;
    const CENTER_X: f32 = 400.0;

    /// Per-body tag read by the demo, never by the engine
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum Tag {
        #[default]
        Scenery,
        Ball,
        Bin(usize),
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Plinko Physics demo starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    log::info!("Seed: {}", seed);

    let fixed_dt = config.fixed_delta_time;
    let mut engine: PhysicsEngine<Tag> = PhysicsEngine::with_config(config);

    // Staggered peg triangle
    for row in 0..ROWS {
        let count = row + 3;
        let y = BOARD_TOP + row as f32 * PEG_SPACING;
        let start_x = CENTER_X - (count - 1) as f32 * PEG_SPACING / 2.0;
        for i in 0..count {
            engine.add_body(
                Shape::circle(PEG_RADIUS),
                Vector2::new(start_x + i as f32 * PEG_SPACING, y),
                BodyConfig::default().fixed().restitution(0.5).label("peg"),
            );
        }
    }

    // Bins under the last row, separated by dividers
    let bins = ROWS + 3;
    let bin_top = BOARD_TOP + ROWS as f32 * PEG_SPACING;
    let bin_height = 60.0;
    let first_x = CENTER_X - bins as f32 * PEG_SPACING / 2.0;
    for i in 0..=bins {
        engine.add_body(
            Shape::rectangle(4.0, bin_height),
            Vector2::new(first_x + i as f32 * PEG_SPACING, bin_top + bin_height / 2.0),
            BodyConfig::default().fixed().label("divider"),
        );
    }
    for i in 0..bins {
        engine.add_body(
            Shape::rectangle(PEG_SPACING - 8.0, 10.0),
            Vector2::new(
                first_x + (i as f32 + 0.5) * PEG_SPACING,
                bin_top + bin_height - 5.0,
            ),
            BodyConfig::with_metadata(Tag::Bin(i)).fixed().sensor().label("bin"),
        );
    }

    let landed = Rc::new(RefCell::new(vec![0u32; bins]));
    let impacts = Rc::new(RefCell::new(0u32));

    {
        let landed = Rc::clone(&landed);
        let impacts = Rc::clone(&impacts);
        engine.on_collision(move |ctx| {
            let (ball, bin) = match (ctx.a.metadata, ctx.b.metadata) {
                (Tag::Ball, Tag::Bin(bin)) => (ctx.key_a, bin),
                (Tag::Bin(bin), Tag::Ball) => (ctx.key_b, bin),
                _ => {
                    // Audio layer would key its volume off this
                    if ctx.impact_speed() > 50.0 {
                        *impacts.borrow_mut() += 1;
                    }
                    return;
                }
            };
            landed.borrow_mut()[bin] += 1;
            ctx.remove(ball);
        });
    }

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut dropped = 0;
    let mut elapsed = 0.0f32;
    let frame_dt = 1.0 / 50.0; // deliberately not the physics rate
    let mut deepest = f32::MIN;
    let mut peak_in_flight = 0;

    while elapsed < 30.0 {
        if dropped < BALLS && (elapsed * 4.0) as usize >= dropped {
            let x = CENTER_X + rng.random_range(-6.0..6.0);
            engine.add_body(
                Shape::circle(BALL_RADIUS),
                Vector2::new(x, BOARD_TOP - 50.0),
                BodyConfig::with_metadata(Tag::Ball)
                    .density(0.008)
                    .restitution(0.35)
                    .friction(0.05)
                    .collision_group(BALL_GROUP)
                    .label("ball"),
            );
            dropped += 1;
        }

        let alpha = engine.update(frame_dt);
        elapsed += frame_dt;

        // Stand-in for a renderer: sample interpolated transforms
        let mut in_flight = 0;
        for (_, body) in engine.bodies().filter(|(_, b)| b.metadata == Tag::Ball) {
            let transform = body.interpolated_transform(alpha);
            deepest = deepest.max(transform.position.y);
            in_flight += 1;
        }
        peak_in_flight = peak_in_flight.max(in_flight);
    }

    let landed = landed.borrow();
    log::info!(
        "{} steps at {:.4}s, {} hard impacts",
        engine.step_count(),
        fixed_dt,
        impacts.borrow()
    );
    for (bin, count) in landed.iter().enumerate() {
        log::info!("bin {:2}: {:3} {}", bin, count, "#".repeat(*count as usize));
    }
    let total: u32 = landed.iter().sum();
    log::info!("{} of {} balls landed", total, dropped);
    log::info!(
        "Peak {} balls in flight, deepest rendered ball at y = {:.1}",
        peak_in_flight,
        deepest
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; the host page drives PhysicsEngine directly
}
